//! End-to-end scoring scenarios: artifacts on disk, CSV in, report out

use fraud_batch_scorer::config::{ModelsConfig, ScoringConfig};
use fraud_batch_scorer::export::report_to_string;
use fraud_batch_scorer::features::build_matrix;
use fraud_batch_scorer::ingest::read_batch;
use fraud_batch_scorer::{BatchScorer, ModelBundle, ScoringError, TransactionBatch, Verdict};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Schema Time, Amount, V1, V2; fraud iff V1 > 0
fn write_artifacts(dir: &Path) {
    fs::write(dir.join("features.json"), r#"["Time", "Amount", "V1", "V2"]"#).unwrap();
    fs::write(
        dir.join("scaler.json"),
        r#"{"kind": "standard", "columns": ["Time", "Amount"], "mean": [100.0, 50.0], "scale": [10.0, 25.0]}"#,
    )
    .unwrap();
    fs::write(
        dir.join("fraud_model.json"),
        r#"{"kind": "logistic", "coefficients": [0.0, 0.0, 10.0, 0.0], "intercept": 0.0}"#,
    )
    .unwrap();
}

fn models_config(dir: &Path) -> ModelsConfig {
    ModelsConfig {
        models_dir: dir.to_string_lossy().into_owned(),
        ..ModelsConfig::default()
    }
}

fn setup() -> (TempDir, BatchScorer) {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let bundle = ModelBundle::load(&models_config(dir.path())).unwrap();
    (dir, BatchScorer::new(Arc::new(bundle), ScoringConfig::default()))
}

fn parse(csv: &str) -> TransactionBatch {
    read_batch(csv.as_bytes()).unwrap()
}

/// Report rows, header first
fn report_rows(report: &str) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(report.as_bytes())
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn test_label_column_excluded_but_passed_through() {
    let (_dir, scorer) = setup();
    let batch = parse(
        "Time,Amount,V1,V2,Class\n\
         0,149.62,-1.36,-0.07,0\n\
         406,0.0,2.5,1.1,1\n",
    );

    let outcome = scorer.scan(&batch).unwrap();
    assert_eq!(outcome.summary.reconciliation.excluded_label.as_deref(), Some("Class"));
    assert!(outcome.summary.reconciliation.scaling_applied);

    let rows = report_rows(&report_to_string(&outcome.scored).unwrap());
    assert_eq!(
        rows[0],
        ["Time", "Amount", "V1", "V2", "Class", "Fraud_Prediction", "Fraud_Probability (%)"]
    );
    for row in &rows[1..] {
        let pct: f64 = row[6].parse().unwrap();
        assert!((0.0..=100.0).contains(&pct));
    }
    assert_eq!(rows[1][..5], ["0", "149.62", "-1.36", "-0.07", "0"]);
    assert_eq!(rows[2][4..6], ["1", "1"]);
}

#[test]
fn test_missing_scaler_column_skips_scaling_and_zero_fills() {
    let (_dir, scorer) = setup();
    let batch = parse("Time,V1,V2\n120,0.5,0.1\n80,-0.5,0.2\n");

    let bundle = scorer.bundle();
    let (matrix, reconciliation) =
        build_matrix(&batch, bundle.schema(), bundle.scaler(), scorer.options()).unwrap();

    assert!(!reconciliation.scaling_applied);
    assert_eq!(reconciliation.synthesized, ["Amount"]);
    assert_eq!(matrix.column("Amount").unwrap(), vec![0.0, 0.0]);
    // Time left raw
    assert_eq!(matrix.column("Time").unwrap(), vec![120.0, 80.0]);

    let (scored, _) = scorer.score(&batch).unwrap();
    assert_eq!(scored.len(), 2);
}

#[test]
fn test_empty_rows_are_dropped_before_scoring() {
    let (_dir, scorer) = setup();
    let batch = parse("Time,Amount,V1,V2\n1,2,3,4\n,,,\n5,6,-7,8\n");

    let outcome = scorer.scan(&batch).unwrap();
    assert_eq!(outcome.scored.len(), 2);
    assert_eq!(outcome.summary.dropped_empty_rows, 1);

    let rows = report_rows(&report_to_string(&outcome.scored).unwrap());
    assert_eq!(rows.len(), 3);
}

#[test]
fn test_three_frauds_in_a_hundred() {
    let (_dir, scorer) = setup();
    let mut csv = String::from("Time,Amount,V1,V2,Class\n");
    for i in 0..100 {
        let v1 = if [7, 42, 99].contains(&i) { "1.0" } else { "-1.0" };
        csv.push_str(&format!("{},{}.5,{},0.3,0\n", i, i, v1));
    }
    let batch = parse(&csv);

    let outcome = scorer.scan(&batch).unwrap();
    assert_eq!(outcome.summary.verdict, Verdict::FraudDetected(3));
    assert_eq!(outcome.summary.message, "3 fraudulent transactions detected!");

    let flagged: Vec<&str> = outcome
        .scored
        .frauds()
        .map(|r| r.record.get(0).unwrap())
        .collect();
    assert_eq!(flagged, ["7", "42", "99"]);

    let rows = report_rows(&report_to_string(&outcome.scored).unwrap());
    assert_eq!(rows.len(), 101);
}

#[test]
fn test_batch_of_only_empty_rows_is_all_clear() {
    let (_dir, scorer) = setup();
    let batch = parse("Time,Amount,V1,V2\n,,,\nNaN,,,\n");

    let outcome = scorer.scan(&batch).unwrap();
    assert!(outcome.scored.is_empty());
    assert_eq!(outcome.summary.verdict, Verdict::AllClear);
    assert_eq!(
        outcome.summary.message,
        "No fraudulent transactions detected in this batch. All clear!"
    );
}

#[test]
fn test_passthrough_keeps_original_text() {
    let (_dir, scorer) = setup();
    let batch = parse("Merchant,V1,Time,Note\n\"ACME, Inc.\",NaN,1e2,  spaced\n");

    let (scored, _) = scorer.score(&batch).unwrap();
    let rows = report_rows(&report_to_string(&scored).unwrap());

    assert_eq!(rows[1][..4], ["ACME, Inc.", "NaN", "1e2", "  spaced"]);
}

#[test]
fn test_column_order_does_not_matter() {
    let (_dir, scorer) = setup();
    let ordered = parse("Time,Amount,V1,V2\n10,20,0.3,-0.4\n");
    let shuffled = parse("V2,Class,V1,Amount,Time\n-0.4,1,0.3,20,10\n");

    let (a, _) = scorer.score(&ordered).unwrap();
    let (b, _) = scorer.score(&shuffled).unwrap();
    assert_eq!(a.records()[0].probability_pct, b.records()[0].probability_pct);
    assert_eq!(a.records()[0].label, b.records()[0].label);
}

#[test]
fn test_missing_artifacts_are_all_named() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("features.json"), r#"["V1"]"#).unwrap();

    match ModelBundle::load(&models_config(dir.path())) {
        Err(ScoringError::MissingArtifact { missing }) => {
            assert_eq!(missing, ["fraud_model.json", "scaler.json"]);
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("bundle loaded without its artifacts"),
    }
}

#[test]
fn test_malformed_batch_leaves_scorer_usable() {
    let (_dir, scorer) = setup();

    let err = read_batch("Time,Amount\n1,2,3\n".as_bytes()).unwrap_err();
    assert!(matches!(err, ScoringError::MalformedInput(_)));

    let bad = parse("Time,Amount,V1,V2\n1,2,abc,4\n");
    assert!(matches!(scorer.score(&bad), Err(ScoringError::MalformedInput(_))));

    let good = parse("Time,Amount,V1,V2\n1,2,3,4\n");
    assert_eq!(scorer.score(&good).unwrap().0.fraud_count(), 1);
}

#[test]
fn test_reject_policies_raise_schema_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let bundle = Arc::new(ModelBundle::load(&models_config(dir.path())).unwrap());

    let strict = ScoringConfig {
        missing_features: fraud_batch_scorer::config::MissingFeaturePolicy::Reject,
        extra_columns: fraud_batch_scorer::config::ExtraColumnPolicy::Reject,
        ..ScoringConfig::default()
    };
    let scorer = BatchScorer::new(bundle, strict);

    let missing = parse("Time,Amount,V1\n1,2,3\n");
    assert!(matches!(scorer.score(&missing), Err(ScoringError::SchemaMismatch(_))));

    let extra = parse("Time,Amount,V1,V2,Merchant\n1,2,3,4,x\n");
    assert!(matches!(scorer.score(&extra), Err(ScoringError::SchemaMismatch(_))));

    let exact = parse("Time,Amount,V1,V2,Class\n1,2,3,4,1\n");
    assert!(scorer.score(&exact).is_ok());
}
