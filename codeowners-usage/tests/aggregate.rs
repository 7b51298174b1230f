use std::io::Write;

use codeowners_usage::{
    aggregate, build_index, Aggregator, Error, IndexCell, IndexOptions, ManifestFile,
    OwnershipIndex, UsageReport,
};

const SAMPLE_MANIFEST: &str = "\
design-system/ @acme/design-system-team
src/components/ @acme/app-team
";

const SAMPLE_REPORT: &str = r#"{
    "Button": {"instances": [
        {"location": {"file": "src/design-system/Button.jsx"}},
        {"location": {"file": "src/components/CustomButton.jsx"}},
        {"location": {"file": "src/components/UserProfile.jsx"}}
    ]}
}"#;

#[test]
fn sample_codebase_usage() {
    let index = build_index(SAMPLE_MANIFEST).unwrap();
    let report = UsageReport::from_json_str(SAMPLE_REPORT).unwrap();

    let table = aggregate(&report, &index);
    assert_eq!(
        serde_json::to_value(&table).unwrap(),
        serde_json::json!({
            "Button": {
                "@acme/design-system-team": 1,
                "@acme/app-team": 2
            }
        })
    );
}

#[test]
fn parsing_is_idempotent() {
    let manifest = "# owners\n*.js @js\n/src/ @app @js\nsrc/ @app\ndocs/ @docs\n";
    let first = build_index(manifest).unwrap();
    let second = build_index(manifest).unwrap();

    assert_eq!(first.all_owners(), second.all_owners());
    for owner in first.all_owners() {
        assert_eq!(
            first.patterns_for(owner),
            second.patterns_for(owner),
            "patterns mismatch for `{}`",
            owner
        );
    }
}

#[test]
fn later_duplicate_pattern_wins() {
    let index = build_index("lib/ @first\nsrc/ @app\nlib/ @second @third\n").unwrap();

    assert!(index.patterns_for("@first").is_empty());
    assert_eq!(index.patterns_for("@second"), vec!["lib/"]);
    assert_eq!(index.patterns_for("@third"), vec!["lib/"]);

    let report = UsageReport::from_json_str(
        r#"{"Table": {"instances": [{"location": {"file": "lib/table.js"}}]}}"#,
    )
    .unwrap();
    let table = aggregate(&report, &index);
    assert_eq!(table.count("Table", "@first"), 0);
    assert_eq!(table.count("Table", "@second"), 1);
    assert_eq!(table.count("Table", "@third"), 1);
}

#[test]
fn instance_counts_for_every_matching_owner() {
    let index = build_index("src/ @app\n*.jsx @react\n").unwrap();
    let report = UsageReport::from_json_str(
        r#"{"Card": {"instances": [{"location": {"file": "src/Card.jsx"}}]}}"#,
    )
    .unwrap();

    let table = aggregate(&report, &index);
    assert_eq!(table.count("Card", "@app"), 1);
    assert_eq!(table.count("Card", "@react"), 1);
}

#[test]
fn counts_are_conserved() {
    let index = build_index("src/ @app\nsrc/shared/ @platform @app\n*.test.js @qa\nlib/ @lib\n")
        .unwrap();
    let report = UsageReport::from_json_str(
        r#"{
            "Button": {"instances": [
                {"location": {"file": "src/a.js"}},
                {"location": {"file": "src/shared/b.test.js"}},
                {"location": {"file": "vendor/c.js"}},
                {"location": {"file": "lib/d.test.js"}},
                {"location": {}}
            ]},
            "Icon": {"instances": [
                {"location": {"file": "lib/icon.js"}},
                {"location": {"file": "/src/shared/icon.js"}}
            ]}
        }"#,
    )
    .unwrap();

    let table = aggregate(&report, &index);
    for (component, instances) in report.components() {
        let expected: usize = instances
            .iter()
            .filter_map(|instance| instance.file.as_deref())
            .map(|path| index.owners_for(path).len())
            .sum();
        assert_eq!(
            table.total(component),
            expected as u64,
            "total mismatch for `{}`",
            component
        );
    }
    assert_eq!(table.total("Button"), 6);
    assert_eq!(table.total("Icon"), 3);
}

#[test]
fn unattributed_usage_is_not_an_error() {
    let index = build_index("src/ @app\n").unwrap();
    let report = UsageReport::from_json_str(
        r#"{"Badge": {"instances": [
            {"location": {"file": "vendor/badge.js"}},
            {"location": {"file": ""}}
        ]}}"#,
    )
    .unwrap();

    let aggregation = Aggregator::new(&index).run(&report);
    assert!(aggregation.table.owners("Badge").unwrap().is_empty());
    assert_eq!(aggregation.unattributed.len(), 2);
}

#[test]
fn empty_manifest_attributes_nothing() {
    let index = build_index("# just a comment\n\n   \n").unwrap();
    assert!(index.all_owners().is_empty());

    let report = UsageReport::from_json_str(SAMPLE_REPORT).unwrap();
    let table = aggregate(&report, &index);
    assert_eq!(table.len(), 1);
    assert!(table.owners("Button").unwrap().is_empty());
}

#[test]
fn anchored_matching_is_opt_in() {
    let manifest = "a.js @a\n";
    let path = "src/a.jsx";

    let substring = build_index(manifest).unwrap();
    assert_eq!(substring.owners_for(path).len(), 1);

    let anchored = OwnershipIndex::build(
        manifest,
        IndexOptions {
            match_mode: codeowners_usage::MatchMode::Anchored,
        },
    )
    .unwrap();
    assert!(anchored.owners_for(path).is_empty());
}

#[test]
fn manifest_file_source() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE_MANIFEST.as_bytes()).unwrap();

    let cell = IndexCell::new(ManifestFile::new(file.path()), IndexOptions::default());
    let index = cell.get().unwrap();
    assert_eq!(
        index.patterns_for("@acme/app-team"),
        vec!["src/components/"]
    );
}

#[test]
fn missing_manifest_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("CODEOWNERS");

    match build_index(ManifestFile::new(&path)) {
        Err(err @ Error::ManifestUnavailable { .. }) => {
            assert!(err.to_string().contains("CODEOWNERS"), "{}", err);
        }
        Err(err) => panic!("unexpected error: {}", err),
        Ok(_) => panic!("expected missing manifest to fail"),
    }
}
