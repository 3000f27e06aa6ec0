//! Submarine cable map with per-cable detail enrichment.
//!
//! Fetches the base FeatureCollection, runs every feature through the
//! enrichment pipeline against the per-cable detail endpoint, and writes
//! the enriched document in one piece.

use std::sync::Arc;

use serde_json::Value;

use crate::config::model::CableJob;
use crate::enrich::{enrich, DetailSpec, FetcherDetail, PipelineOptions};
use crate::error::HarvestError;
use crate::fetch::{FetchOutcome, FetchRequest};

use super::output::{write_json, JsonStyle};
use super::{JobRuntime, RunSummary};

pub async fn run(job: &CableJob, rt: &JobRuntime<'_>, summary: &mut RunSummary) {
    let unit = rt.job_name.to_string();
    match process(job, rt).await {
        Ok(features) => {
            tracing::info!(unit = %unit, features, "unit done");
            summary.record_success(unit);
        }
        Err(e) => {
            tracing::error!(unit = %unit, error = %e, "unit failed, skipping");
            summary.record_failure(unit, e);
        }
    }
}

async fn process(job: &CableJob, rt: &JobRuntime<'_>) -> Result<usize, HarvestError> {
    let resource = format!("{}:base", rt.job_name);
    let request = FetchRequest::get(resource.as_str(), job.base_path.as_str())
        .with_timeout(rt.timeout)
        .expect_non_empty("features");

    let mut document = match rt.fetcher.fetch(&request, &rt.endpoints).await {
        FetchOutcome::Success { payload, .. } => payload,
        FetchOutcome::Failure(failure) => {
            return Err(HarvestError::FetchExhausted {
                resource,
                attempts: failure.attempts,
                reason: failure.reason,
            });
        }
    };

    let features = take_features(&mut document).ok_or_else(|| HarvestError::UnexpectedPayload {
        resource: resource.clone(),
        message: "'features' is not an array".into(),
    })?;

    let detail = FetcherDetail::new(
        Arc::clone(&rt.fetcher),
        rt.endpoints.clone(),
        job.detail_path.as_str(),
        DetailSpec {
            id_field: job.id_field.clone(),
            detail_keys: job.detail_keys.clone(),
        },
        rt.timeout,
    );
    let options = PipelineOptions {
        concurrency_limit: job
            .concurrency_limit
            .unwrap_or(rt.defaults.concurrency_limit),
        progress_every: rt.defaults.progress_every,
        status_field: job.status_field.clone(),
    };

    let report = enrich(features, &detail, &options).await;
    let count = report.items.len();
    let enriched = report.enriched();
    if let Some(object) = document.as_object_mut() {
        object.insert("features".to_string(), Value::Array(report.items));
    }

    let path = rt.output_dir.join(&job.output);
    let bytes = write_json(&path, &document, JsonStyle::Pretty).await?;
    tracing::info!(
        path = %path.display(),
        features = count,
        enriched,
        bytes,
        "saved"
    );
    Ok(count)
}

/// Move the `features` array out of `document`, leaving an empty array.
fn take_features(document: &mut Value) -> Option<Vec<Value>> {
    match document.get_mut("features")? {
        Value::Array(items) => Some(std::mem::take(items)),
        _ => None,
    }
}
