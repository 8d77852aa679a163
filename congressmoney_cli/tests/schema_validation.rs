use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use congressmoney_lib::{
    build_snapshot, evaluate_legislator, index_series, load_legislators, AggregateSettings,
    Benchmark, ExclusionSet, FileFeed, PriceOracle, StaticPriceSource,
};
use serde_json::Value;

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("CLI crate should be inside workspace")
        .to_path_buf()
}

fn load_schema(name: &str) -> Value {
    let path = workspace_root().join("schema").join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read schema {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("schema is valid JSON")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Builds a snapshot from the feed fixture with flat in-memory prices.
async fn fixture_snapshot() -> Value {
    let feed = FileFeed::new(
        workspace_root().join("congressmoney_api/tests/fixtures/senators.json"),
    );
    let legislators = load_legislators(&feed).await.expect("fixture feed loads");

    let (start, end) = (date(2020, 1, 1), date(2020, 2, 29));
    let source = StaticPriceSource::new()
        .with_flat_price("AAPL", start, end, 80.0)
        .with_flat_price("MSFT", start, end, 160.0)
        .with_flat_price("SPY", date(2020, 1, 2), end, 320.0);
    let oracle = PriceOracle::with_ttl(source, std::time::Duration::from_secs(60));

    let settings = AggregateSettings {
        start,
        end,
        top_n: 4,
        recent_limit: 10,
        min_activity: 1,
    };
    let mut evaluations = Vec::new();
    for legislator in legislators {
        evaluations.push(
            evaluate_legislator(legislator, &oracle, &settings)
                .await
                .expect("fixture evaluates"),
        );
    }
    let benchmark = Benchmark {
        ticker: "SPY".into(),
        returns: index_series(&oracle, "SPY", start, end).await,
    };
    let exclusions =
        ExclusionSet::parse("exclusions:\n  - id: doe-john\n    reason: test exclusion\n")
            .expect("exclusions parse");
    let snapshot = build_snapshot(evaluations, &exclusions, benchmark, &settings, Utc::now());
    serde_json::to_value(&snapshot).expect("snapshot serializes")
}

fn validator() -> jsonschema::Validator {
    let schema = load_schema("snapshot.schema.json");
    jsonschema::draft202012::new(&schema).expect("snapshot schema compiles")
}

// ---------------------------------------------------------------------------
// Positive validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_built_snapshot_conforms_to_schema() {
    let data = fixture_snapshot().await;
    if let Err(e) = validator().validate(&data) {
        panic!("snapshot failed validation: {e}");
    }

    assert_eq!(data["senators"].as_object().unwrap().len(), 1);
    let jane = &data["senators"]["smith-jane"];
    assert_eq!(jane["purchases"], 1);
    assert_eq!(jane["unaccounted"].as_array().unwrap().len(), 1);
    assert_eq!(jane["ignored"][0]["reason"], "no_ticker");
    assert_eq!(data["senator_names"][0]["status"], "excluded");
    assert_eq!(data["daily_summary"]["senator_count"], 1);
}

// ---------------------------------------------------------------------------
// Negative validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_schema_rejects_missing_daily_summary_field() {
    let mut data = fixture_snapshot().await;
    data["daily_summary"]
        .as_object_mut()
        .expect("daily_summary is an object")
        .remove("index_returns");
    assert!(
        validator().validate(&data).is_err(),
        "schema should reject daily_summary without index_returns"
    );
}

#[tokio::test]
async fn test_schema_rejects_unknown_ignore_reason() {
    let mut data = fixture_snapshot().await;
    data["senators"]["smith-jane"]["ignored"][0]["reason"] = Value::String("bogus".into());
    assert!(
        validator().validate(&data).is_err(),
        "schema should reject an unknown ignore reason"
    );
}

#[tokio::test]
async fn test_schema_rejects_excluded_name_without_reason() {
    let mut data = fixture_snapshot().await;
    data["senator_names"][0]
        .as_object_mut()
        .expect("name is an object")
        .remove("reason");
    assert!(
        validator().validate(&data).is_err(),
        "schema should require a reason for excluded names"
    );
}

#[tokio::test]
async fn test_schema_rejects_additional_properties() {
    let mut data = fixture_snapshot().await;
    data["senators"]["smith-jane"]
        .as_object_mut()
        .expect("senator is an object")
        .insert("bogusField".to_string(), Value::Number(123.into()));
    assert!(
        validator().validate(&data).is_err(),
        "schema should reject additional properties"
    );
}
