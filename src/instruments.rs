use crate::types::ChartReference;
use lazy_static::lazy_static;
use std::collections::HashMap;

const BTC: &str = "BTC";
const USDT: &str = "USDT";

lazy_static! {
    /// Chart-widget interval codes to unit-suffixed tokens.
    static ref INTERVALS: HashMap<&'static str, &'static str> = HashMap::from([
        ("1", "1m"),
        ("3", "3m"),
        ("5", "5m"),
        ("15", "15m"),
        ("30", "30m"),
        ("60", "1h"),
        ("120", "2h"),
        ("240", "4h"),
        ("360", "6h"),
        ("480", "8h"),
        ("720", "12h"),
        ("D", "1d"),
        ("1D", "1d"),
        ("W", "1w"),
        ("1W", "1w"),
    ]);
}

/// Upper-cases `symbol`, drops an `EXCHANGE:` prefix and quotes bare BTC
/// pairs in USDT.
///
/// Only BTC gets the USDT suffix; `ETH` stays `ETH`.
pub fn normalize_symbol(symbol: &str) -> String {
    let upper = symbol.to_uppercase();

    // Segment after the first colon, cut at any further colon so the
    // output never carries one.
    let bare = match upper.split_once(':') {
        Some((_, rest)) => rest.split(':').next().unwrap_or_default(),
        None => upper.as_str(),
    };

    if bare.contains(BTC) && !bare.contains(USDT) {
        format!("{}{}", bare, USDT)
    } else {
        bare.to_string()
    }
}

/// Maps short interval codes (`240`, `D`, ...) to canonical tokens;
/// anything not in the table is assumed canonical already.
pub fn normalize_interval(interval: &str) -> String {
    INTERVALS
        .get(interval)
        .map(|s| s.to_string())
        .unwrap_or_else(|| interval.to_string())
}

/// Fingerprint of a reference, `EXCHANGE:SYMBOL:INTERVAL` in canonical form.
pub fn canonical_key(reference: &ChartReference) -> String {
    format!(
        "{}:{}:{}",
        reference.exchange.trim().to_uppercase(),
        normalize_symbol(&reference.symbol),
        normalize_interval(&reference.interval)
    )
}
