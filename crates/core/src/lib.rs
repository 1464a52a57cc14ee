//! `stockcert-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! share class codes, grant denials, certificates and the aggregate contract
//! the inventory ledger implements.

pub mod aggregate;
pub mod certificate;
pub mod error;
pub mod share_class;

pub use aggregate::Aggregate;
pub use certificate::{Certificate, CertificateId};
pub use error::{DomainError, GrantDenial};
pub use share_class::ShareClassCode;
