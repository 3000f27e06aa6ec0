//! Serde data structures for the infraharvest job file.
//!
//! Contains [`Config`] (the root), [`Defaults`], and the [`Job`] enum
//! with one struct per job kind. All types derive `Serialize` and
//! `Deserialize` with `deny_unknown_fields` for strict parsing.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fetch::{Method, RetryPolicy};

const fn default_max_retries() -> u32 {
    3
}

const fn default_base_backoff_ms() -> u64 {
    1500
}

const fn default_jitter_ceiling_ms() -> u64 {
    400
}

const fn default_timeout() -> u64 {
    30_000
}

const fn default_concurrency_limit() -> usize {
    50
}

const fn default_progress_every() -> usize {
    20
}

const fn default_query_timeout_secs() -> u64 {
    3600
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_tag_key() -> String {
    "power".to_string()
}

fn default_api_key_env() -> String {
    "PEERINGDB".to_string()
}

fn default_id_field() -> String {
    "id".to_string()
}

fn is_default_defaults(v: &Defaults) -> bool {
    *v == Defaults::default()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default, skip_serializing_if = "is_default_defaults")]
    pub defaults: Defaults,

    pub jobs: Vec<Job>,
}

impl Config {
    #[must_use]
    pub fn total_endpoints(&self) -> usize {
        self.jobs.iter().map(|j| j.endpoints().len()).sum()
    }

    #[must_use]
    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(Job::name).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    #[serde(default = "default_jitter_ceiling_ms")]
    pub jitter_ceiling_ms: u64,

    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            jitter_ceiling_ms: default_jitter_ceiling_ms(),
            timeout: default_timeout(),
            concurrency_limit: default_concurrency_limit(),
            progress_every: default_progress_every(),
        }
    }
}

impl Defaults {
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_backoff: Duration::from_millis(self.base_backoff_ms),
            jitter_ceiling: Duration::from_millis(self.jitter_ceiling_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    Overpass(OverpassJob),
    Peeringdb(PeeringDbJob),
    Cables(CableJob),
}

impl Job {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Overpass(j) => &j.name,
            Self::Peeringdb(j) => &j.name,
            Self::Cables(j) => &j.name,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Overpass(_) => "overpass",
            Self::Peeringdb(_) => "peeringdb",
            Self::Cables(_) => "cables",
        }
    }

    #[must_use]
    pub fn endpoints(&self) -> &[String] {
        match self {
            Self::Overpass(j) => &j.endpoints,
            Self::Peeringdb(j) => &j.endpoints,
            Self::Cables(j) => &j.endpoints,
        }
    }

    #[must_use]
    pub const fn max_retries(&self) -> Option<u32> {
        match self {
            Self::Overpass(j) => j.max_retries,
            Self::Peeringdb(j) => j.max_retries,
            Self::Cables(j) => j.max_retries,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Option<u64> {
        match self {
            Self::Overpass(j) => j.timeout,
            Self::Peeringdb(j) => j.timeout,
            Self::Cables(j) => j.timeout,
        }
    }

    /// Number of independent units of work this job produces.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        match self {
            Self::Overpass(j) => j.node_tags.len() + j.way_tags.len(),
            Self::Peeringdb(j) => j.datasets.len(),
            Self::Cables(_) => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMethod {
    Get,
    #[default]
    Post,
}

impl From<RequestMethod> for Method {
    fn from(m: RequestMethod) -> Self {
        match m {
            RequestMethod::Get => Self::Get,
            RequestMethod::Post => Self::Post,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OverpassJob {
    pub name: String,

    pub endpoints: Vec<String>,

    #[serde(default = "default_tag_key")]
    pub tag_key: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub way_tags: Vec<String>,

    #[serde(default)]
    pub method: RequestMethod,

    /// Server-side `[timeout:N]` embedded in the query, in seconds.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PeeringDbJob {
    pub name: String,

    pub endpoints: Vec<String>,

    pub datasets: Vec<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CableJob {
    pub name: String,

    pub endpoints: Vec<String>,

    pub base_path: String,

    /// Detail path template; `:id` is replaced by each item's identity.
    pub detail_path: String,

    #[serde(default = "default_id_field")]
    pub id_field: String,

    pub detail_keys: Vec<String>,

    /// Output file name, relative to `output_dir`.
    pub output: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_limit: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}
