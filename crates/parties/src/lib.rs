//! Read-only directory of clients, salesmen and companies.
//!
//! Directory CRUD lives elsewhere; the reconciliation core only resolves
//! references and freezes display details onto invoices.

pub mod directory;

pub use directory::{
    ClientProfile, CompanyProfile, ContactInfo, Directory, PartySnapshot, PartyStatus,
    SalesmanProfile,
};
