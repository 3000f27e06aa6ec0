//! OpenStreetMap infrastructure extracts via the Overpass API.
//!
//! One unit of work per tag value: node tags are processed first (they
//! are the smaller datasets), then way tags. Each unit is fetched with a
//! non-empty `elements` expectation, converted to GeoJSON, and written
//! compactly as `osm_<key>_<element>_<value>.geojson`.

use crate::config::model::OverpassJob;
use crate::error::HarvestError;
use crate::fetch::{FetchOutcome, FetchRequest};

use super::geojson::{feature_count, osm_to_geojson, strip_way_properties};
use super::output::{write_json, JsonStyle};
use super::{JobRuntime, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Way,
}

impl ElementKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
        }
    }

    /// Ways need inline geometry; nodes carry coordinates already.
    const fn output_mode(self) -> &'static str {
        match self {
            Self::Node => "meta",
            Self::Way => "geom",
        }
    }
}

#[must_use]
pub fn build_query(kind: ElementKind, key: &str, value: &str, timeout_secs: u64) -> String {
    format!(
        r#"[out:json][timeout:{timeout_secs}];{}["{key}"="{value}"];out {};"#,
        kind.as_str(),
        kind.output_mode()
    )
}

#[must_use]
pub fn output_file_name(key: &str, kind: ElementKind, value: &str) -> String {
    format!("osm_{key}_{}_{value}.geojson", kind.as_str())
}

pub async fn run(job: &OverpassJob, rt: &JobRuntime<'_>, summary: &mut RunSummary) {
    let phases = [
        (ElementKind::Node, &job.node_tags),
        (ElementKind::Way, &job.way_tags),
    ];

    for (kind, tags) in phases {
        for tag in tags {
            let unit = format!("{}:{}:{tag}", rt.job_name, kind.as_str());
            match process_tag(job, rt, kind, tag).await {
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
    }
}

async fn process_tag(
    job: &OverpassJob,
    rt: &JobRuntime<'_>,
    kind: ElementKind,
    tag: &str,
) -> Result<usize, HarvestError> {
    let resource = format!("{}:{tag}", kind.as_str());
    let request = FetchRequest::new(resource.as_str(), "", job.method.into())
        .with_param(
            "data",
            build_query(kind, &job.tag_key, tag, job.query_timeout_secs),
        )
        .with_timeout(rt.timeout)
        .expect_non_empty("elements");

    let osm = match rt.fetcher.fetch(&request, &rt.endpoints).await {
        FetchOutcome::Success { payload, .. } => payload,
        FetchOutcome::Failure(failure) => {
            return Err(HarvestError::FetchExhausted {
                resource,
                attempts: failure.attempts,
                reason: failure.reason,
            });
        }
    };

    let mut collection = osm_to_geojson(&osm);
    drop(osm);
    if kind == ElementKind::Way {
        collection = strip_way_properties(collection);
    }

    let features = feature_count(&collection);
    let path = rt
        .output_dir
        .join(output_file_name(&job.tag_key, kind, tag));
    let bytes = write_json(&path, &collection, JsonStyle::Compact).await?;
    tracing::info!(path = %path.display(), features, bytes, "saved");
    Ok(features)
}
