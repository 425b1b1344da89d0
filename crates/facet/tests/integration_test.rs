//! Integration tests for Facet.

use std::io::Write;
use tempfile::NamedTempFile;

use facet::{Parser, Profiler, ProfilerConfig, SemanticType, StorageType, classify};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn quiet_config() -> ProfilerConfig {
    ProfilerConfig {
        quiet: true,
        ..ProfilerConfig::default()
    }
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_parse_basic_csv() {
    let content = "id,name,age,active\n\
                   1,Alice,30,true\n\
                   2,Bob,25,false\n\
                   3,Carol,28,true\n";
    let file = create_test_file(content);

    let parser = Parser::new();
    let (dataset, source) = parser.parse_file(file.path()).expect("Parse failed");

    assert_eq!(source.row_count, 3);
    assert_eq!(source.column_count, 4);
    assert_eq!(source.format, "csv");
    assert_eq!(dataset.column("age").unwrap().storage_type(), StorageType::Int);
    assert_eq!(
        dataset.column("active").unwrap().storage_type(),
        StorageType::Bool
    );
}

#[test]
fn test_parse_tsv_auto_detect() {
    let content = "sample_id\tgroup\tage\n\
                   S001\tcontrol\t25\n\
                   S002\ttreated\t30\n\
                   S003\tcontrol\t28\n";
    let file = create_test_file(content);

    let parser = Parser::new();
    let (dataset, source) = parser.parse_file(file.path()).expect("Parse failed");

    assert_eq!(source.format, "tsv");
    assert_eq!(dataset.column_count(), 3);
}

#[test]
fn test_parse_missing_markers() {
    let content = "metric\n5.1\nNA\n4.7\n\n5.0\n";
    let file = create_test_file(content);

    let parser = Parser::new();
    let (dataset, _) = parser.parse_file(file.path()).expect("Parse failed");

    let col = dataset.column("metric").unwrap();
    assert_eq!(col.storage_type(), StorageType::Float);
    assert_eq!(col.missing_count(), 2);
}

// =============================================================================
// Classification through the full pipeline
// =============================================================================

#[test]
fn test_classification_from_file() {
    let content = "reading,rating,flag,label,joined\n\
                   10.5,1,0,alpha,2023-01-05\n\
                   11.2,2,1,beta,2023-02-06\n\
                   12.9,3,0,alpha,2023-03-07\n\
                   9.8,4,1,gamma,2023-04-08\n\
                   10.1,5,0,beta,2023-05-09\n\
                   11.7,1,1,alpha,2023-06-10\n\
                   12.3,2,0,gamma,2023-07-11\n\
                   9.4,3,1,beta,2023-08-12\n\
                   10.9,4,0,alpha,2023-09-13\n\
                   11.5,5,1,gamma,2023-10-14\n\
                   12.1,1,0,beta,2023-11-15\n";
    let file = create_test_file(content);

    let parser = Parser::new();
    let (dataset, _) = parser.parse_file(file.path()).expect("Parse failed");

    assert_eq!(
        classify(dataset.column("reading").unwrap()),
        SemanticType::Numeric
    );
    assert_eq!(
        classify(dataset.column("rating").unwrap()),
        SemanticType::NumericCondensed
    );
    // A numeric column holding exactly {0, 1} is boolean.
    assert_eq!(
        classify(dataset.column("flag").unwrap()),
        SemanticType::Bool
    );
    assert_eq!(
        classify(dataset.column("label").unwrap()),
        SemanticType::Text
    );
    assert_eq!(
        classify(dataset.column("joined").unwrap()),
        SemanticType::Unsupported
    );
}

// =============================================================================
// Full profiling runs
// =============================================================================

fn wide_csv(rows: usize) -> String {
    let mut content = String::from("metric,score,grade,flag\n");
    for i in 0..rows {
        content.push_str(&format!(
            "{:.2},{},{},{}\n",
            3.0 + (i as f64) * 0.37 + ((i * 5) % 11) as f64 * 0.83,
            (i % 17) as f64 * 1.5,
            ["a", "b", "c", "d", "e"][i % 5],
            i % 2 == 0,
        ));
    }
    content
}

#[test]
fn test_full_report_run() {
    let file = create_test_file(&wide_csv(120));
    let out = tempfile::tempdir().unwrap();

    let config = ProfilerConfig {
        output: Some(out.path().to_path_buf()),
        ..quiet_config()
    };
    let summary = Profiler::with_config(config)
        .profile_file(file.path())
        .expect("Profile failed");

    assert_eq!(summary.columns_profiled.len(), 4);
    assert!(summary.columns_skipped.is_empty());
    // C(4, 2) pairs, all visualizable.
    assert_eq!(summary.pairs_rendered, 6);

    // The report and every referenced asset exist on disk.
    let report_path = summary.report_path.expect("report path");
    assert!(report_path.exists());
    let html = std::fs::read_to_string(&report_path).unwrap();
    let asset_dir = report_path.parent().unwrap().join("assets");
    for piece in html.split("assets/").skip(1) {
        let name = &piece[..piece.find('"').unwrap()];
        assert!(asset_dir.join(name).exists(), "missing asset {}", name);
    }
}

#[test]
fn test_report_with_target_column() {
    let file = create_test_file(&wide_csv(150));
    let out = tempfile::tempdir().unwrap();

    let config = ProfilerConfig {
        output: Some(out.path().to_path_buf()),
        target: Some("metric".to_string()),
        target_buckets: 3,
        ..quiet_config()
    };
    let summary = Profiler::with_config(config)
        .profile_file(file.path())
        .expect("Profile failed");

    // The derived grouping column is not itself profiled.
    assert_eq!(summary.columns_profiled.len(), 4);
    assert!(summary.report_path.is_some());
}

#[test]
fn test_console_only_run_writes_nothing() {
    let file = create_test_file(&wide_csv(40));
    let summary = Profiler::with_config(quiet_config())
        .profile_file(file.path())
        .expect("Profile failed");

    assert!(summary.report_path.is_none());
    assert_eq!(summary.pairs_rendered, 0);
    assert_eq!(summary.columns_profiled.len(), 4);
}

#[test]
fn test_date_column_skipped_not_fatal() {
    let mut content = String::from("metric,when\n");
    for i in 0..30 {
        content.push_str(&format!("{:.1},2023-01-{:02}\n", i as f64 * 1.3, i % 28 + 1));
    }
    let file = create_test_file(&content);

    let summary = Profiler::with_config(quiet_config())
        .profile_file(file.path())
        .expect("Profile failed");

    assert_eq!(summary.columns_profiled, vec!["metric"]);
    assert_eq!(summary.columns_skipped.len(), 1);
    let (name, reason) = &summary.columns_skipped[0];
    assert_eq!(name, "when");
    assert!(reason.contains("cannot be parsed"));
}

#[test]
fn test_empty_file_is_error() {
    let file = create_test_file("");
    let result = Profiler::with_config(quiet_config()).profile_file(file.path());
    assert!(result.is_err());
}

#[test]
fn test_column_allow_list_limits_pairs() {
    let file = create_test_file(&wide_csv(60));
    let out = tempfile::tempdir().unwrap();

    let config = ProfilerConfig {
        columns: Some(vec!["metric".to_string(), "grade".to_string()]),
        output: Some(out.path().to_path_buf()),
        ..quiet_config()
    };
    let summary = Profiler::with_config(config)
        .profile_file(file.path())
        .expect("Profile failed");

    assert_eq!(summary.columns_profiled.len(), 2);
    assert_eq!(summary.pairs_rendered, 1);
}

#[test]
fn test_charts_disabled() {
    let file = create_test_file(&wide_csv(60));
    let out = tempfile::tempdir().unwrap();

    let config = ProfilerConfig {
        output: Some(out.path().to_path_buf()),
        render_charts: false,
        ..quiet_config()
    };
    let summary = Profiler::with_config(config)
        .profile_file(file.path())
        .expect("Profile failed");

    assert_eq!(summary.pairs_rendered, 0);
    let report_path = summary.report_path.unwrap();
    let asset_dir = report_path.parent().unwrap().join("assets");
    let assets: Vec<_> = std::fs::read_dir(&asset_dir).unwrap().collect();
    assert!(assets.is_empty());
}
