use serde::Deserialize;

use stockcert_core::ShareClassCode;

// -------------------------
// Request DTOs
// -------------------------

/// `{"name": "Salt Bae", "amount": 10, "class": "CS"}`
#[derive(Debug, Deserialize)]
pub struct CertificateRequest {
    pub name: String,
    pub amount: u64,
    pub class: ShareClassCode,
}
