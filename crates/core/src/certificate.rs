//! Display-only stock certificate.

use serde::{Deserialize, Serialize};

use crate::share_class::ShareClassCode;

/// Certificate identifier: `<share_class>-<sequence_number>` (e.g. `CS-32`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CertificateId {
    share_class: ShareClassCode,
    sequence: u64,
}

impl CertificateId {
    pub fn new(share_class: ShareClassCode, sequence: u64) -> Self {
        Self {
            share_class,
            sequence,
        }
    }

    pub fn share_class(&self) -> &ShareClassCode {
        &self.share_class
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl core::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}", self.share_class, self.sequence)
    }
}

impl Serialize for CertificateId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CertificateId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let (class, seq) = raw
            .rsplit_once('-')
            .ok_or_else(|| serde::de::Error::custom(format!("malformed certificate id: {raw}")))?;
        let share_class = ShareClassCode::new(class).map_err(serde::de::Error::custom)?;
        let sequence = seq.parse::<u64>().map_err(serde::de::Error::custom)?;
        Ok(Self::new(share_class, sequence))
    }
}

/// A certificate issued for one committed grant.
///
/// Nothing here is persisted; the ledger only stores the sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub cert_id: CertificateId,
    pub company: String,
    pub stakeholder: String,
    pub amount: u64,
}

impl Certificate {
    pub fn issue(
        company: impl Into<String>,
        stakeholder: impl Into<String>,
        share_class: ShareClassCode,
        sequence: u64,
        amount: u64,
    ) -> Self {
        Self {
            cert_id: CertificateId::new(share_class, sequence),
            company: company.into(),
            stakeholder: stakeholder.into(),
            amount,
        }
    }
}
