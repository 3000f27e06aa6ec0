//! `infraharvest init`: generate a starter job file.
//!
//! Writes a YAML, JSON, or TOML job file covering the three bundled job
//! kinds: Overpass power infrastructure, PeeringDB datasets, and the
//! enriched submarine cable map.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::HarvestError;

pub fn execute(args: &InitArgs) -> Result<(), HarvestError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("infraharvest.{}", args.format.extension())));

    if output.exists() {
        return Err(HarvestError::FileExists { path: output });
    }

    std::fs::write(&output, template(&args.format))?;
    println!("Created {}", output.display());
    Ok(())
}

#[must_use]
pub const fn template(format: &ConfigFormat) -> &'static str {
    match format {
        ConfigFormat::Yaml => YAML_TEMPLATE,
        ConfigFormat::Json => JSON_TEMPLATE,
        ConfigFormat::Toml => TOML_TEMPLATE,
    }
}

const YAML_TEMPLATE: &str = r#"# infraharvest job file
#
# Endpoints are tried in the order listed. Each endpoint gets
# `max_retries` attempts with exponential backoff before the next one.

output_dir: downloads

defaults:
  max_retries: 3              # Attempts per endpoint
  base_backoff_ms: 1500       # Delay after attempt n is (base/1000)^n seconds
  jitter_ceiling_ms: 400      # Plus uniform jitter in [0, ceiling)
  timeout: 30000              # Per-attempt timeout in ms
  concurrency_limit: 50       # In-flight detail lookups during enrichment
  progress_every: 20          # Log enrichment progress every N items

jobs:
  - kind: overpass
    name: osm-power
    endpoints:
      - "https://overpass.private.coffee/api/interpreter"
      - "https://maps.mail.ru/osm/tools/overpass/api/interpreter"
      - "http://overpass-api.de/api/interpreter"
      - "https://overpass.osm.jp/api/interpreter"
    method: post
    tag_key: power
    query_timeout_secs: 3600
    timeout: 3600000
    max_retries: 2
    node_tags:
      - transformer
      - switch
      - terminal
      - converter
      - connection
      - transition
      - compensator
      - inverter
      - cable_distribution
      - cable_distribution_cabinet
    way_tags:
      - line
      - minor_line
      - cable
      - switchgear
      - substation

  - kind: peeringdb
    name: peeringdb
    endpoints:
      - "https://peeringdb.com/api"
    api_key_env: PEERINGDB
    max_retries: 5
    datasets: [org, fac, net, ix, campus, carrier, netfac, ixfac, carrierfac]

  - kind: cables
    name: submarine-cables
    endpoints:
      - "https://www.submarinecablemap.com/api/v3"
    base_path: cable/cable-geo.json
    detail_path: "cable/:id.json"
    id_field: id
    detail_keys:
      - length
      - landing_points
      - owners
      - suppliers
      - rfs
      - rfs_year
      - is_planned
      - notes
      - url
    output: cable-geo-enriched.json
    timeout: 20000
"#;

const JSON_TEMPLATE: &str = r#"{
  "output_dir": "downloads",
  "defaults": {
    "max_retries": 3,
    "base_backoff_ms": 1500,
    "jitter_ceiling_ms": 400,
    "timeout": 30000,
    "concurrency_limit": 50,
    "progress_every": 20
  },
  "jobs": [
    {
      "kind": "overpass",
      "name": "osm-power",
      "endpoints": [
        "https://overpass.private.coffee/api/interpreter",
        "https://maps.mail.ru/osm/tools/overpass/api/interpreter",
        "http://overpass-api.de/api/interpreter",
        "https://overpass.osm.jp/api/interpreter"
      ],
      "method": "post",
      "tag_key": "power",
      "query_timeout_secs": 3600,
      "timeout": 3600000,
      "max_retries": 2,
      "node_tags": [
        "transformer", "switch", "terminal", "converter", "connection",
        "transition", "compensator", "inverter", "cable_distribution",
        "cable_distribution_cabinet"
      ],
      "way_tags": ["line", "minor_line", "cable", "switchgear", "substation"]
    },
    {
      "kind": "peeringdb",
      "name": "peeringdb",
      "endpoints": ["https://peeringdb.com/api"],
      "api_key_env": "PEERINGDB",
      "max_retries": 5,
      "datasets": ["org", "fac", "net", "ix", "campus", "carrier", "netfac", "ixfac", "carrierfac"]
    },
    {
      "kind": "cables",
      "name": "submarine-cables",
      "endpoints": ["https://www.submarinecablemap.com/api/v3"],
      "base_path": "cable/cable-geo.json",
      "detail_path": "cable/:id.json",
      "id_field": "id",
      "detail_keys": [
        "length", "landing_points", "owners", "suppliers", "rfs",
        "rfs_year", "is_planned", "notes", "url"
      ],
      "output": "cable-geo-enriched.json",
      "timeout": 20000
    }
  ]
}
"#;

const TOML_TEMPLATE: &str = r#"# infraharvest job file
#
# Endpoints are tried in the order listed. Each endpoint gets
# `max_retries` attempts with exponential backoff before the next one.

output_dir = "downloads"

[defaults]
max_retries = 3
base_backoff_ms = 1500
jitter_ceiling_ms = 400
timeout = 30000
concurrency_limit = 50
progress_every = 20

[[jobs]]
kind = "overpass"
name = "osm-power"
endpoints = [
  "https://overpass.private.coffee/api/interpreter",
  "https://maps.mail.ru/osm/tools/overpass/api/interpreter",
  "http://overpass-api.de/api/interpreter",
  "https://overpass.osm.jp/api/interpreter",
]
method = "post"
tag_key = "power"
query_timeout_secs = 3600
timeout = 3600000
max_retries = 2
node_tags = [
  "transformer", "switch", "terminal", "converter", "connection",
  "transition", "compensator", "inverter", "cable_distribution",
  "cable_distribution_cabinet",
]
way_tags = ["line", "minor_line", "cable", "switchgear", "substation"]

[[jobs]]
kind = "peeringdb"
name = "peeringdb"
endpoints = ["https://peeringdb.com/api"]
api_key_env = "PEERINGDB"
max_retries = 5
datasets = ["org", "fac", "net", "ix", "campus", "carrier", "netfac", "ixfac", "carrierfac"]

[[jobs]]
kind = "cables"
name = "submarine-cables"
endpoints = ["https://www.submarinecablemap.com/api/v3"]
base_path = "cable/cable-geo.json"
detail_path = "cable/:id.json"
id_field = "id"
detail_keys = [
  "length", "landing_points", "owners", "suppliers", "rfs",
  "rfs_year", "is_planned", "notes", "url",
]
output = "cable-geo-enriched.json"
timeout = 20000
"#;
