use crate::deduplication::DedupStore;
use crate::error::Result;
use crate::instruments::canonical_key;
use crate::reference::ReferenceParser;
use crate::types::{ChartReference, ParsedReference};
use tracing::{debug, info};

/// Decision for one incoming chart link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Not seen before; `reference` carries canonical symbol and interval.
    Fresh { key: String, reference: ChartReference },
    Duplicate { key: String },
    Invalid { raw_url: String, error: String },
}

impl Admission {
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Fresh { key, .. } | Self::Duplicate { key } => Some(key),
            Self::Invalid { .. } => None,
        }
    }
}

/// Parses links, canonicalizes them into fingerprints and checks them
/// against the dedup store. Owns the store, so one tracker per file.
pub struct ReferenceTracker {
    parser: ReferenceParser,
    store: DedupStore,
}

impl ReferenceTracker {
    pub fn new(parser: ReferenceParser, store: DedupStore) -> Self {
        Self { parser, store }
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    /// Read-only: nothing is recorded until [`Self::record`] is called.
    pub fn check(&self, url: &str) -> Result<Admission> {
        let reference = match self.parser.parse(url) {
            ParsedReference::Resolved(reference) => reference,
            ParsedReference::Invalid { raw_url, error } => {
                debug!("[Tracker] Rejected {}: {}", raw_url, error);
                return Ok(Admission::Invalid { raw_url, error });
            }
        };

        let key = canonical_key(&reference);
        if self.store.contains(&key)? {
            debug!("[Tracker] Duplicate {}", key);
            return Ok(Admission::Duplicate { key });
        }

        Ok(Admission::Fresh {
            key,
            reference: reference.canonical(),
        })
    }

    /// Call once the downstream action for `key` succeeded.
    pub fn record(&self, key: &str) -> Result<bool> {
        let added = self.store.add(key)?;
        if added {
            info!("[Tracker] Recorded {}", key);
        }
        Ok(added)
    }

    pub fn forget(&self, key: &str) -> Result<bool> {
        let removed = self.store.remove(key)?;
        if removed {
            info!("[Tracker] Forgot {}", key);
        }
        Ok(removed)
    }
}
