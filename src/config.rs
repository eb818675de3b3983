use std::env;
use std::path::PathBuf;

pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_INTERVAL: &str = "4h";
pub const DEFAULT_EXCHANGE: &str = "BINANCE";
pub const DEFAULT_STORE_PATH: &str = "analyzed_projects.json";

/// Fallback tokens used when a chart link does not carry a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserDefaults {
    /// `None` disables the symbol fallback, so links without a symbol
    /// come back invalid.
    pub symbol: Option<String>,
    pub interval: String,
    pub exchange: String,
}

impl Default for ParserDefaults {
    fn default() -> Self {
        Self {
            symbol: Some(DEFAULT_SYMBOL.to_string()),
            interval: DEFAULT_INTERVAL.to_string(),
            exchange: DEFAULT_EXCHANGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

/// Configuration derived from environment variables (after `.env` loading).
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub parser: ParserDefaults,
    pub store: StoreConfig,
}

fn trimmed<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).map(|s| s.trim().to_string())
}

fn str_or<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    trimmed(lookup, name)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source. Blank values fall
    /// back to the defaults, except `CHART_DEFAULT_SYMBOL`: set-but-blank
    /// disables the symbol fallback, unset keeps `BTCUSDT`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let symbol = match trimmed(&lookup, "CHART_DEFAULT_SYMBOL") {
            Some(s) if s.is_empty() => None,
            Some(s) => Some(s),
            None => Some(DEFAULT_SYMBOL.to_string()),
        };

        Self {
            parser: ParserDefaults {
                symbol,
                interval: str_or(&lookup, "CHART_DEFAULT_INTERVAL", DEFAULT_INTERVAL),
                exchange: str_or(&lookup, "CHART_DEFAULT_EXCHANGE", DEFAULT_EXCHANGE),
            },
            store: StoreConfig {
                path: PathBuf::from(str_or(&lookup, "ANALYZED_PROJECTS_PATH", DEFAULT_STORE_PATH)),
            },
        }
    }
}
