//! infraharvest fetches public infrastructure datasets from unreliable
//! upstream APIs.
//!
//! Every request goes through a failover fetcher that walks an ordered
//! list of equivalent endpoints, retrying each with exponential backoff
//! before moving on. Large collections can then be enriched item by item
//! through a bounded-concurrency pipeline that tolerates per-item
//! failures.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate).
//! - [`config`] -- Job file loading and validation via the
//!   [`ConfigSource`](config::ConfigSource) trait.
//! - [`enrich`] -- Bounded enrichment pipeline and detail-record merging.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`fetch`] -- Failover fetcher, retry policy, and the hyper transport.
//! - [`jobs`] -- Overpass, PeeringDB, and submarine cable jobs.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML job file support _(enabled by default)_ |
//! | `json` | JSON job file support |
//! | `toml` | TOML job file support |
//! | `file-backends` | All file format backends |

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod jobs;
pub mod logging;
