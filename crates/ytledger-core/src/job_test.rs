use std::path::Path;

use rust_decimal::Decimal;

use super::*;

#[test]
fn parses_numeric_and_string_cost_values() {
    let yaml = r#"
channel: "  @somecreator "
costs:
  long_form:
    - { role: Editor, value: 150 }
    - { role: Thumbnail, value: "35.50" }
  short_form:
    - { role: Editor, value: 20.25 }
"#;
    let job = parse_job_config(yaml).expect("parse");
    assert_eq!(job.channel, "@somecreator");
    assert_eq!(job.costs.long_form.len(), 2);
    assert_eq!(job.costs.long_form[0].value, Decimal::new(150, 0));
    assert_eq!(job.costs.long_form[1].value, Decimal::new(3550, 2));
    assert_eq!(job.costs.short_form[0].value, Decimal::new(2025, 2));
}

#[test]
fn sheet_names_default_when_omitted() {
    let job = parse_job_config("channel: UC123\n").expect("parse");
    assert_eq!(job.sheets, SheetNames::default());
    assert_eq!(job.sheets.ledger(Category::LongForm), "Videos_Longos");
    assert_eq!(job.sheets.ledger(Category::ShortForm), "Shorts");
    assert!(job.costs.rules(Category::LongForm).is_empty());
}

#[test]
fn rejects_empty_channel() {
    let err = parse_job_config("channel: '   '\n").unwrap_err();
    assert!(err.to_string().contains("channel must be non-empty"));
}

#[test]
fn rejects_blank_role() {
    let yaml = r#"
channel: UC123
costs:
  short_form:
    - { role: " ", value: 1 }
"#;
    let err = parse_job_config(yaml).unwrap_err();
    assert!(err.to_string().contains("short-form cost role"));
}

#[test]
fn rejects_negative_cost() {
    let yaml = r#"
channel: UC123
costs:
  long_form:
    - { role: Editor, value: -1 }
"#;
    let err = parse_job_config(yaml).unwrap_err();
    assert!(err.to_string().contains("negative value"));
}

#[test]
fn accepts_zero_cost() {
    let yaml = r#"
channel: UC123
costs:
  long_form:
    - { role: Volunteer, value: 0 }
"#;
    assert!(parse_job_config(yaml).is_ok());
}

#[test]
fn rejects_duplicate_sheet_names() {
    let yaml = r#"
channel: UC123
sheets:
  long_form: Videos
  short_form: Videos
"#;
    let err = parse_job_config(yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate sheet name"));
}

#[test]
fn missing_file_is_io_error() {
    let err = load_job_config(Path::new("/definitely/not/here.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::JobFileIo { .. }));
}

#[test]
fn load_job_config_from_example_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("job.example.yaml");
    assert!(path.exists(), "job.example.yaml missing at {path:?}");
    let job = load_job_config(&path).expect("failed to load job.example.yaml");
    assert!(job.channel.starts_with('@'));
    assert!(!job.costs.long_form.is_empty());
    assert!(!job.costs.short_form.is_empty());
}
