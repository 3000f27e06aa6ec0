//! Integration tests for job file loading across all file formats.

use infraharvest::cli::ConfigFormat;
use infraharvest::cmd::init::template;
use infraharvest::config::model::{Config, Job};
use infraharvest::config::sources::parse_config_str;
use infraharvest::config::validation::validate;

#[test]
fn yaml_template_loads_and_validates() {
    let config = parse_config_str("yaml", template(&ConfigFormat::Yaml), "infraharvest.yaml")
        .unwrap();
    validate(&config).unwrap();
    assert_eq!(config.job_names(), vec!["osm-power", "peeringdb", "submarine-cables"]);
    assert_eq!(config.jobs[0].unit_count(), 15);
    assert_eq!(config.jobs[1].unit_count(), 9);
}

#[test]
fn yaml_template_keeps_endpoint_order() {
    let config = parse_config_str("yaml", template(&ConfigFormat::Yaml), "infraharvest.yaml")
        .unwrap();
    let Job::Overpass(ref osm) = config.jobs[0] else {
        panic!("first job should be overpass");
    };
    assert_eq!(osm.endpoints[0], "https://overpass.private.coffee/api/interpreter");
    assert_eq!(osm.endpoints[3], "https://overpass.osm.jp/api/interpreter");
    assert_eq!(osm.max_retries, Some(2));
}

#[cfg(feature = "json")]
#[test]
fn json_template_loads_and_validates() {
    let config =
        parse_config_str("json", template(&ConfigFormat::Json), "infraharvest.json").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.jobs.len(), 3);
}

#[cfg(feature = "toml")]
#[test]
fn toml_template_loads_and_validates() {
    let config =
        parse_config_str("toml", template(&ConfigFormat::Toml), "infraharvest.toml").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.jobs.len(), 3);
}

#[cfg(all(feature = "json", feature = "toml"))]
#[test]
fn all_formats_produce_equivalent_configs() {
    let yaml = parse_config_str("yaml", template(&ConfigFormat::Yaml), "yaml").unwrap();
    let json = parse_config_str("json", template(&ConfigFormat::Json), "json").unwrap();
    let toml = parse_config_str("toml", template(&ConfigFormat::Toml), "toml").unwrap();

    assert_eq!(yaml.job_names(), json.job_names());
    assert_eq!(yaml.job_names(), toml.job_names());
    assert_eq!(yaml.total_endpoints(), json.total_endpoints());
    assert_eq!(yaml.total_endpoints(), toml.total_endpoints());
    assert_eq!(yaml.defaults, json.defaults);
    assert_eq!(yaml.defaults, toml.defaults);
}

#[test]
fn unsupported_format_returns_error() {
    let result = parse_config_str("xml", "{}", "jobs.xml");
    assert!(result.is_err());
}

#[test]
fn unknown_fields_are_rejected() {
    let content = r#"{"jobs": [], "retries": 3}"#;
    assert!(serde_json::from_str::<Config>(content).is_err());
}

#[test]
fn invalid_config_fails_validation() {
    let empty = r#"{"jobs": []}"#;
    let config: Config = serde_json::from_str(empty).unwrap();
    assert!(validate(&config).is_err());
}

#[test]
fn detail_path_without_placeholder_is_reported() {
    let content = r#"{
        "jobs": [{
            "kind": "cables",
            "name": "cables",
            "endpoints": ["https://cables.example/api/v3"],
            "base_path": "cable/cable-geo.json",
            "detail_path": "cable",
            "detail_keys": ["length"],
            "output": "out.json"
        }]
    }"#;
    let config: Config = serde_json::from_str(content).unwrap();
    let errors = validate(&config).unwrap_err();
    assert!(errors.iter().any(|e| e.field == "detail_path"));
}
