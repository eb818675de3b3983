use chart_signals::config::ParserDefaults;
use chart_signals::reference::{parse, ReferenceParser, SYMBOL_NOT_FOUND};
use chart_signals::types::{ChartReference, ParsedReference};

#[test]
fn test_missing_symbol_falls_back_to_defaults() {
    for url in [
        "https://www.tradingview.com/chart/",
        "https://www.tradingview.com/chart/?theme=dark",
        "not even a url",
        "",
    ] {
        let parsed = parse(url);
        assert!(parsed.is_valid(), "{url} should be valid");
        assert_eq!(parsed.symbol(), Some("BTCUSDT"));
        assert_eq!(parsed.interval(), Some("4h"));
        assert_eq!(parsed.exchange(), Some("BINANCE"));
        assert_eq!(parsed.error(), None);
        assert_eq!(parsed.raw_url(), url);
    }
}

#[test]
fn test_all_fields_from_query() {
    let url = "https://www.tradingview.com/chart/?symbol=ETHUSDT&interval=240&exchange=OKX";
    assert_eq!(
        parse(url),
        ParsedReference::Resolved(ChartReference {
            raw_url: url.to_string(),
            symbol: "ETHUSDT".to_string(),
            interval: "240".to_string(),
            exchange: "OKX".to_string(),
        })
    );
}

#[test]
fn test_query_values_are_decoded() {
    let parsed = parse("https://www.tradingview.com/chart/?symbol=BINANCE%3ASOLUSDT&exchange=Bybit+Spot");
    assert_eq!(parsed.symbol(), Some("BINANCE:SOLUSDT"));
    assert_eq!(parsed.exchange(), Some("Bybit Spot"));
}

#[test]
fn test_first_occurrence_wins() {
    let parsed = parse("https://example.com/?symbol=AAAUSDT&symbol=BBBUSDT");
    assert_eq!(parsed.symbol(), Some("AAAUSDT"));
}

#[test]
fn test_pattern_fallback_covers_fragment_parameters() {
    // Parameters after '#' are not part of the query string.
    let parsed = parse("https://example.com/chart#symbol=SOLUSDT&interval=60");
    assert_eq!(parsed.symbol(), Some("SOLUSDT"));
    assert_eq!(parsed.interval(), Some("60"));
    assert_eq!(parsed.exchange(), Some("BINANCE"));
}

#[test]
fn test_pattern_fallback_keeps_raw_text() {
    let parsed = parse("https://example.com/c?x=1#ref&symbol=BTC%2FUSDT");
    assert_eq!(parsed.symbol(), Some("BTC%2FUSDT"));
}

#[test]
fn test_blank_value_uses_default() {
    let parsed = parse("https://example.com/chart?symbol=&interval=15");
    assert_eq!(parsed.symbol(), Some("BTCUSDT"));
    assert_eq!(parsed.interval(), Some("15"));
}

#[test]
fn test_undecodable_query_is_invalid() {
    let url = "https://example.com/chart?symbol=%FF%FE";
    let parsed = parse(url);
    assert!(!parsed.is_valid());
    assert_eq!(parsed.raw_url(), url);
    assert_eq!(parsed.symbol(), None);
    assert_eq!(parsed.interval(), None);
    assert_eq!(parsed.exchange(), None);
    assert!(parsed.error().is_some_and(|e| !e.is_empty()));
}

#[test]
fn test_undecodable_unrelated_parameter_is_tolerated() {
    let url = "https://www.tradingview.com/chart/?symbol=ETHUSDT&interval=240&utm_campaign=caf%E9";
    let parsed = parse(url);
    assert!(parsed.is_valid(), "got {parsed:?}");
    assert_eq!(parsed.symbol(), Some("ETHUSDT"));
    assert_eq!(parsed.interval(), Some("240"));
    assert_eq!(parsed.exchange(), Some("BINANCE"));
}

#[test]
fn test_undecodable_repeated_field_is_ignored() {
    let parsed = parse("https://example.com/chart?symbol=ETHUSDT&symbol=%FF");
    assert_eq!(parsed.symbol(), Some("ETHUSDT"));
}

#[test]
fn test_undecodable_interval_is_invalid() {
    let parsed = parse("https://example.com/chart?symbol=ETHUSDT&interval=%E9");
    assert!(!parsed.is_valid());
    assert!(parsed.error().is_some());
}

#[test]
fn test_symbol_not_found_without_symbol_fallback() {
    let parser = ReferenceParser::new(ParserDefaults {
        symbol: None,
        ..ParserDefaults::default()
    });

    let parsed = parser.parse("https://example.com/chart?interval=60");
    assert!(!parsed.is_valid());
    assert_eq!(parsed.error(), Some(SYMBOL_NOT_FOUND));

    let parsed = parser.parse("https://example.com/chart?symbol=ETHUSDT");
    assert!(parsed.is_valid());
    assert_eq!(parsed.interval(), Some("4h"));
}

#[test]
fn test_custom_defaults() {
    let parser = ReferenceParser::new(ParserDefaults {
        symbol: Some("ETHUSDT".into()),
        interval: "1h".into(),
        exchange: "OKX".into(),
    });
    let parsed = parser.parse("https://example.com/");
    assert_eq!(parsed.symbol(), Some("ETHUSDT"));
    assert_eq!(parsed.interval(), Some("1h"));
    assert_eq!(parsed.exchange(), Some("OKX"));
}

#[test]
fn test_parse_is_deterministic() {
    let url = "https://example.com/chart?symbol=XRPUSDT#interval=D";
    assert_eq!(parse(url), parse(url));
}

#[test]
fn test_flat_json_shape() {
    let valid = serde_json::to_value(parse("https://example.com/?symbol=ETHUSDT")).unwrap();
    assert_eq!(
        valid,
        serde_json::json!({
            "raw_url": "https://example.com/?symbol=ETHUSDT",
            "symbol": "ETHUSDT",
            "interval": "4h",
            "exchange": "BINANCE",
            "valid": true,
            "error": null
        })
    );

    let invalid = serde_json::to_value(parse("https://example.com/?symbol=%FF")).unwrap();
    assert_eq!(invalid["valid"], false);
    assert!(invalid["symbol"].is_null());
    assert!(invalid["error"].is_string());
}
