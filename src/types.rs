use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;

/// A chart link resolved into symbol, interval and exchange tokens.
///
/// Tokens are kept exactly as found in the link (or as the configured
/// fallback); canonical forms come from [`crate::instruments`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartReference {
    pub raw_url: String,
    pub symbol: String,
    pub interval: String,
    pub exchange: String,
}

impl ChartReference {
    /// Copy with symbol and interval replaced by their canonical forms.
    pub fn canonical(&self) -> Self {
        Self {
            raw_url: self.raw_url.clone(),
            symbol: crate::instruments::normalize_symbol(&self.symbol),
            interval: crate::instruments::normalize_interval(&self.interval),
            exchange: self.exchange.clone(),
        }
    }
}

/// Outcome of parsing a chart link. Parsing never fails across the API
/// boundary; problems land in `Invalid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedReference {
    Resolved(ChartReference),
    Invalid { raw_url: String, error: String },
}

impl ParsedReference {
    pub fn raw_url(&self) -> &str {
        match self {
            Self::Resolved(r) => &r.raw_url,
            Self::Invalid { raw_url, .. } => raw_url,
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        self.reference().map(|r| r.symbol.as_str())
    }

    pub fn interval(&self) -> Option<&str> {
        self.reference().map(|r| r.interval.as_str())
    }

    pub fn exchange(&self) -> Option<&str> {
        self.reference().map(|r| r.exchange.as_str())
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Resolved(_) => None,
            Self::Invalid { error, .. } => Some(error),
        }
    }

    pub fn reference(&self) -> Option<&ChartReference> {
        match self {
            Self::Resolved(r) => Some(r),
            Self::Invalid { .. } => None,
        }
    }

    pub fn into_reference(self) -> Option<ChartReference> {
        match self {
            Self::Resolved(r) => Some(r),
            Self::Invalid { .. } => None,
        }
    }
}

#[derive(Serialize)]
struct FlatReference<'a> {
    raw_url: &'a str,
    symbol: Option<&'a str>,
    interval: Option<&'a str>,
    exchange: Option<&'a str>,
    valid: bool,
    error: Option<&'a str>,
}

// Downstream consumers (content generator, notifier) read the flat shape.
impl Serialize for ParsedReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FlatReference {
            raw_url: self.raw_url(),
            symbol: self.symbol(),
            interval: self.interval(),
            exchange: self.exchange(),
            valid: self.is_valid(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

/// Persisted set of processed entity identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupRecord {
    #[serde(rename = "total_projects", default)]
    pub total_count: usize,
    #[serde(default, with = "timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(rename = "analyzed_projects")]
    pub members: Vec<String>,
}

impl DedupRecord {
    pub fn empty() -> Self {
        Self {
            total_count: 0,
            last_updated: None,
            members: Vec::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }

    /// Appends `name` unless already present.
    pub fn insert(&mut self, name: &str, now: DateTime<Utc>) -> bool {
        if self.contains(name) {
            return false;
        }
        self.members.push(name.to_string());
        self.touch(now);
        true
    }

    pub fn remove(&mut self, name: &str, now: DateTime<Utc>) -> bool {
        let Some(idx) = self.members.iter().position(|m| m == name) else {
            return false;
        };
        self.members.remove(idx);
        self.touch(now);
        true
    }

    /// Case-insensitive substring match, in insertion order.
    pub fn search(&self, query: &str) -> Vec<String> {
        let needle = query.to_lowercase();
        self.members
            .iter()
            .filter(|m| m.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_count: self.total_count,
            last_updated: self.last_updated,
        }
    }

    /// Drops duplicate members (first occurrence kept) and recomputes the
    /// count. `None` when the record was already consistent.
    pub fn repair(&mut self) -> Option<RecordRepair> {
        let before = self.members.len();
        let stated_count = self.total_count;
        let mut seen = HashSet::with_capacity(before);
        self.members.retain(|m| seen.insert(m.clone()));
        self.total_count = self.members.len();

        let duplicates_dropped = before - self.members.len();
        (duplicates_dropped > 0 || stated_count != self.total_count).then_some(RecordRepair {
            duplicates_dropped,
            stated_count,
        })
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.total_count = self.members.len();
        self.last_updated = Some(now);
    }
}

impl Default for DedupRecord {
    fn default() -> Self {
        Self::empty()
    }
}

/// What [`DedupRecord::repair`] had to fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRepair {
    pub duplicates_dropped: usize,
    /// Count as persisted, before recomputation.
    pub stated_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

/// RFC 3339 on write. Reads also accept naive ISO-8601 timestamps (no
/// offset), which are taken as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(t) => serializer.serialize_some(&t.to_rfc3339_opts(SecondsFormat::Micros, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| parse(&s).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {s}"))))
            .transpose()
    }

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|n| n.and_utc())
            })
    }
}
