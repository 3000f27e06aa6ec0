//! Dataset jobs built on the fetcher and the enrichment pipeline.
//!
//! Each job kind turns its configuration into fetch requests, hands the
//! payloads to a format-specific transformation, and persists the
//! result under the output directory. Jobs are split into units of work
//! (one per tag, dataset, or enriched document); a unit that fails is
//! recorded in the [`RunSummary`] and the run moves on.

pub mod cables;
pub mod geojson;
pub mod output;
pub mod overpass;
pub mod peeringdb;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::model::{Defaults, Job};
use crate::error::HarvestError;
use crate::fetch::{Endpoint, Fetcher};

pub struct JobContext {
    pub fetcher: Arc<Fetcher>,
    pub defaults: Defaults,
    pub output_dir: PathBuf,
}

impl JobContext {
    /// Fetcher honouring the job's retry override, if any.
    #[must_use]
    pub fn fetcher_for(&self, job: &Job) -> Arc<Fetcher> {
        match job.max_retries() {
            Some(n) if n != self.fetcher.policy().max_retries => {
                Arc::new(self.fetcher.with_max_retries(n))
            }
            _ => Arc::clone(&self.fetcher),
        }
    }

    #[must_use]
    pub fn timeout_for(&self, job: &Job) -> Duration {
        Duration::from_millis(job.timeout().unwrap_or(self.defaults.timeout))
    }
}

/// Everything a job needs once its overrides are resolved.
pub struct JobRuntime<'a> {
    pub job_name: &'a str,
    pub endpoints: Vec<Endpoint>,
    pub fetcher: Arc<Fetcher>,
    /// Per-attempt timeout.
    pub timeout: Duration,
    pub defaults: &'a Defaults,
    pub output_dir: &'a Path,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn record_success(&mut self, unit: impl Into<String>) {
        self.succeeded.push(unit.into());
    }

    pub fn record_failure(&mut self, unit: impl Into<String>, reason: impl ToString) {
        self.failed.push((unit.into(), reason.to_string()));
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && !self.failed.is_empty()
    }

    pub fn log(&self) {
        tracing::info!(
            succeeded = self.succeeded.len(),
            failed = self.failed.len(),
            total = self.total(),
            "run summary"
        );
        for (unit, reason) in &self.failed {
            tracing::warn!(unit = %unit, reason = %reason, "unit failed");
        }
    }
}

/// Run one job to completion, recording every unit in `summary`.
pub async fn run_job(job: &Job, ctx: &JobContext, summary: &mut RunSummary) {
    tracing::info!(job = %job.name(), kind = job.kind(), units = job.unit_count(), "job started");

    let endpoints = match Endpoint::parse_all(job.endpoints()) {
        Ok(e) => e,
        Err(e) => {
            fail_all_units(job, &e, summary);
            return;
        }
    };

    let runtime = JobRuntime {
        job_name: job.name(),
        endpoints,
        fetcher: ctx.fetcher_for(job),
        timeout: ctx.timeout_for(job),
        defaults: &ctx.defaults,
        output_dir: &ctx.output_dir,
    };

    match job {
        Job::Overpass(j) => overpass::run(j, &runtime, summary).await,
        Job::Peeringdb(j) => peeringdb::run(j, &runtime, summary).await,
        Job::Cables(j) => cables::run(j, &runtime, summary).await,
    }

    tracing::info!(job = %job.name(), "job finished");
}

fn fail_all_units(job: &Job, error: &HarvestError, summary: &mut RunSummary) {
    tracing::error!(job = %job.name(), error = %error, "job cannot start");
    for unit in unit_labels(job) {
        summary.record_failure(unit, error);
    }
}

/// `job:unit` labels for every unit of work in `job`.
#[must_use]
pub fn unit_labels(job: &Job) -> Vec<String> {
    let name = job.name();
    match job {
        Job::Overpass(j) => j
            .node_tags
            .iter()
            .map(|t| format!("{name}:node:{t}"))
            .chain(j.way_tags.iter().map(|t| format!("{name}:way:{t}")))
            .collect(),
        Job::Peeringdb(j) => j.datasets.iter().map(|d| format!("{name}:{d}")).collect(),
        Job::Cables(_) => vec![name.to_string()],
    }
}
