//! PeeringDB registry datasets.
//!
//! One unit per dataset (`org`, `fac`, `net`, ...). The API key is read
//! from the environment variable named in the job and sent as an
//! already-assembled `Authorization: Api-Key <key>` header; the fetcher
//! never looks inside it.

use crate::config::model::PeeringDbJob;
use crate::error::HarvestError;
use crate::fetch::{FetchOutcome, FetchRequest};

use super::output::{write_json, JsonStyle};
use super::{JobRuntime, RunSummary};

#[must_use]
pub fn output_file_name(dataset: &str) -> String {
    format!("peeringdb_{dataset}.json")
}

#[must_use]
pub fn authorization_value(api_key: &str) -> String {
    format!("Api-Key {api_key}")
}

pub async fn run(job: &PeeringDbJob, rt: &JobRuntime<'_>, summary: &mut RunSummary) {
    let authorization = match std::env::var(&job.api_key_env) {
        Ok(key) if !key.is_empty() => authorization_value(&key),
        _ => {
            let err = HarvestError::MissingCredential {
                job: rt.job_name.to_string(),
                var: job.api_key_env.clone(),
            };
            tracing::error!(job = %rt.job_name, error = %err, "job cannot start");
            for dataset in &job.datasets {
                summary.record_failure(format!("{}:{dataset}", rt.job_name), &err);
            }
            return;
        }
    };

    tracing::info!(datasets = job.datasets.len(), "downloading PeeringDB datasets");

    for dataset in &job.datasets {
        let unit = format!("{}:{dataset}", rt.job_name);
        match process_dataset(dataset, &authorization, rt).await {
            Ok(records) => {
                tracing::info!(unit = %unit, records, "unit done");
                summary.record_success(unit);
            }
            Err(e) => {
                tracing::error!(unit = %unit, error = %e, "unit failed, skipping");
                summary.record_failure(unit, e);
            }
        }
    }
}

async fn process_dataset(
    dataset: &str,
    authorization: &str,
    rt: &JobRuntime<'_>,
) -> Result<usize, HarvestError> {
    let request = FetchRequest::get(dataset, dataset)
        .with_header("Authorization", authorization)?
        .with_timeout(rt.timeout)
        .expect_non_empty("data");

    let payload = match rt.fetcher.fetch(&request, &rt.endpoints).await {
        FetchOutcome::Success { payload, .. } => payload,
        FetchOutcome::Failure(failure) => {
            return Err(HarvestError::FetchExhausted {
                resource: dataset.to_string(),
                attempts: failure.attempts,
                reason: failure.reason,
            });
        }
    };

    let records = payload
        .get("data")
        .and_then(serde_json::Value::as_array)
        .map_or(0, Vec::len);
    let path = rt.output_dir.join(output_file_name(dataset));
    let bytes = write_json(&path, &payload, JsonStyle::Pretty).await?;
    tracing::info!(path = %path.display(), records, bytes, "saved");
    Ok(records)
}
