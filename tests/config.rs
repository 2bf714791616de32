use assert_matches::assert_matches;

use dex_export::config::{Config, ConfigLoader};
use dex_export::error::DexError;

#[test]
fn explicit_missing_file_is_an_error() {
    let result = ConfigLoader::resolve(Some("/nonexistent/dex-export.json"));
    assert_matches!(result, Err(DexError::ConfigRead(_)));
}

#[test]
fn parses_json_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("dex-export.json");
    std::fs::write(
        &path,
        r#"{"language": "de", "window_size": 4, "window_delay_ms": 250, "output": "x.csv"}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.language, "de");
    assert_eq!(resolved.window_size, 4);
    assert_eq!(resolved.window_delay.as_millis(), 250);
    assert_eq!(resolved.output.as_str(), "x.csv");
}

#[test]
fn malformed_file_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("dex-export.json");
    std::fs::write(&path, "{ window_size: ").unwrap();
    let result = ConfigLoader::resolve(path.to_str());
    assert_matches!(result, Err(DexError::ConfigParse(_)));
}

#[test]
fn zero_window_is_rejected() {
    let config = Config {
        window_size: Some(0),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(DexError::InvalidConfig(_))
    );
}
