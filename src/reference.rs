use crate::config::ParserDefaults;
use crate::types::{ChartReference, ParsedReference};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

pub const SYMBOL_NOT_FOUND: &str = "Symbol not found";

const REFERENCE_FIELDS: [&str; 3] = ["symbol", "interval", "exchange"];

lazy_static! {
    // Applied to the raw link, so they also catch query strings the
    // structured decoding misses (e.g. parameters after a fragment).
    static ref SYMBOL_PATTERN: Regex = Regex::new(r"symbol=([^&]+)").expect("Invalid regex pattern");
    static ref INTERVAL_PATTERN: Regex = Regex::new(r"interval=([^&]+)").expect("Invalid regex pattern");
    static ref EXCHANGE_PATTERN: Regex = Regex::new(r"exchange=([^&]+)").expect("Invalid regex pattern");
}

/// Extracts chart references from arbitrary third-party links.
///
/// Each field is resolved from the decoded query string first, then from a
/// pattern match over the raw link, then from the configured fallback.
#[derive(Debug, Clone, Default)]
pub struct ReferenceParser {
    defaults: ParserDefaults,
}

impl ReferenceParser {
    pub fn new(defaults: ParserDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &ParserDefaults {
        &self.defaults
    }

    pub fn parse(&self, url: &str) -> ParsedReference {
        let params = match query_params(url) {
            Ok(params) => params,
            Err(error) => {
                debug!("Unparseable chart link {:?}: {}", url, error);
                return ParsedReference::Invalid {
                    raw_url: url.to_string(),
                    error,
                };
            }
        };

        let symbol = resolve(&params, url, "symbol", &SYMBOL_PATTERN)
            .or_else(|| self.fallback("symbol", self.defaults.symbol.as_deref()));
        let interval = resolve(&params, url, "interval", &INTERVAL_PATTERN)
            .unwrap_or_else(|| self.fallback_str("interval", &self.defaults.interval));
        let exchange = resolve(&params, url, "exchange", &EXCHANGE_PATTERN)
            .unwrap_or_else(|| self.fallback_str("exchange", &self.defaults.exchange));

        // Only reachable when the symbol fallback is disabled.
        let Some(symbol) = symbol else {
            return ParsedReference::Invalid {
                raw_url: url.to_string(),
                error: SYMBOL_NOT_FOUND.to_string(),
            };
        };

        ParsedReference::Resolved(ChartReference {
            raw_url: url.to_string(),
            symbol,
            interval,
            exchange,
        })
    }

    fn fallback(&self, field: &str, value: Option<&str>) -> Option<String> {
        debug!("No {} in link, falling back to {:?}", field, value);
        value.map(str::to_string)
    }

    fn fallback_str(&self, field: &str, value: &str) -> String {
        debug!("No {} in link, falling back to {:?}", field, value);
        value.to_string()
    }
}

/// Parses with the stock fallbacks (`BTCUSDT`, `4h`, `BINANCE`).
pub fn parse(url: &str) -> ParsedReference {
    ReferenceParser::default().parse(url)
}

fn resolve(
    params: &HashMap<String, String>,
    raw: &str,
    key: &str,
    pattern: &Regex,
) -> Option<String> {
    if let Some(value) = params.get(key) {
        return Some(value.clone());
    }
    let value = pattern
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())?;
    debug!("{} recovered by pattern match: {:?}", key, value);
    Some(value)
}

/// Decodes `key=value&...` pairs from the query part of `url`. Pairs with an
/// empty value are skipped and the first occurrence of a key wins.
///
/// Only the reference fields must decode to valid UTF-8; anything else
/// (tracking tags and the like) is decoded lossily.
fn query_params(url: &str) -> Result<HashMap<String, String>, String> {
    let mut params = HashMap::new();

    let without_fragment = url.split('#').next().unwrap_or_default();
    let Some((_, query)) = without_fragment.split_once('?') else {
        return Ok(params);
    };

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if value.is_empty() {
            continue;
        }
        let key = decode_lossy(key);
        if params.contains_key(&key) {
            continue;
        }
        let value = if REFERENCE_FIELDS.contains(&key.as_str()) {
            decode_component(value)?
        } else {
            decode_lossy(value)
        };
        params.insert(key, value);
    }

    Ok(params)
}

fn decode_component(token: &str) -> Result<String, String> {
    urlencoding::decode(&token.replace('+', " "))
        .map(|s| s.into_owned())
        .map_err(|e| format!("invalid percent-encoding in {:?}: {}", token, e))
}

fn decode_lossy(token: &str) -> String {
    let bytes = urlencoding::decode_binary(token.replace('+', " ").as_bytes()).into_owned();
    String::from_utf8_lossy(&bytes).into_owned()
}
