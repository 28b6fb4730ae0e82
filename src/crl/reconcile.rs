//! Merges the revoked entries of several CRLs into one set.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::warn;

use super::{CanonicalSerial, InputRevocationList, RevokedCertificate, truncate_to_seconds};

/// Revoked entries keyed by serial value, at most one per serial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciledRevocationSet {
    entries: BTreeMap<CanonicalSerial, RevokedCertificate>,
    warnings: Vec<String>,
}

impl ReconciledRevocationSet {
    /// Folds one entry into the set.
    ///
    /// Extensions are dropped. A serial already present keeps the earlier of
    /// the two revocation times; when the times differ a warning is recorded.
    /// Times are compared at whole-second precision, the precision a CRL can
    /// carry.
    pub fn insert(&mut self, entry: &RevokedCertificate) {
        let candidate = RevokedCertificate {
            extensions: Vec::new(),
            ..entry.clone()
        };

        match self.entries.entry(candidate.canonical_serial()) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
            Entry::Occupied(mut slot) => {
                let existing = truncate_to_seconds(slot.get().revocation_time);
                let incoming = truncate_to_seconds(candidate.revocation_time);
                if existing == incoming {
                    return;
                }

                let serial = slot.key().to_string();
                warn!(%serial, %existing, %incoming, "conflicting revocation times");
                self.warnings.push(format!(
                    "Duplicate serial {serial} with different revocation times detected, using oldest revocation time"
                ));

                if incoming < existing {
                    slot.insert(candidate);
                }
            }
        }
    }

    pub fn get(&self, serial: &CanonicalSerial) -> Option<&RevokedCertificate> {
        self.entries.get(serial)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Entries in ascending serial order.
    pub fn entries(&self) -> impl Iterator<Item = &RevokedCertificate> {
        self.entries.values()
    }

    pub fn into_parts(self) -> (Vec<RevokedCertificate>, Vec<String>) {
        (self.entries.into_values().collect(), self.warnings)
    }
}

/// Merges all entries of `crls`, visiting CRLs and their entries in order.
pub fn reconcile(crls: &[InputRevocationList]) -> ReconciledRevocationSet {
    let mut set = ReconciledRevocationSet::default();
    crls.iter()
        .flat_map(|crl| crl.revoked.iter())
        .for_each(|entry| set.insert(entry));
    set
}
