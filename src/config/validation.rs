//! Job file validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors such as an empty job list, duplicate job names, missing or
//! malformed endpoints, retry settings that would never attempt a fetch,
//! and job-kind specific mistakes. Returns every problem found as a list
//! of [`ValidationError`] values with per-field suggestions.

use std::collections::HashSet;

use url::Url;

use super::model::{CableJob, Config, Defaults, Job, OverpassJob, PeeringDbJob};
use crate::error::ValidationError;

/// Validate a single endpoint URL. Returns `Ok(())` or a human-readable error.
pub fn validate_endpoint_url(url: &str) -> Result<(), String> {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

fn error(job: &str, field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        job: job.to_string(),
        field: field.to_string(),
        message: message.into(),
        suggestion: None,
    }
}

fn validate_defaults(defaults: &Defaults, errors: &mut Vec<ValidationError>) {
    if defaults.max_retries == 0 {
        errors.push(error(
            "(root)",
            "defaults.max_retries",
            "must be at least 1",
        ));
    }
    if defaults.base_backoff_ms < 1000 {
        errors.push(ValidationError {
            suggestion: Some("use 1500 for the usual 1.5^n growth".into()),
            ..error(
                "(root)",
                "defaults.base_backoff_ms",
                "must be at least 1000 or delays shrink between attempts",
            )
        });
    }
    if defaults.timeout == 0 {
        errors.push(error("(root)", "defaults.timeout", "must be greater than 0"));
    }
    if defaults.concurrency_limit == 0 {
        errors.push(error(
            "(root)",
            "defaults.concurrency_limit",
            "must be at least 1",
        ));
    }
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_defaults(&config.defaults, &mut errors);

    if config.jobs.is_empty() {
        errors.push(error(
            "(root)",
            "jobs",
            "at least one job must be defined",
        ));
        return Err(errors);
    }

    let mut seen_names = HashSet::new();

    for (i, job) in config.jobs.iter().enumerate() {
        let job_id = if job.name().is_empty() {
            format!("jobs[{i}]")
        } else {
            job.name().to_string()
        };

        if job.name().is_empty() {
            errors.push(error(&job_id, "name", "name cannot be empty"));
        } else if !seen_names.insert(job.name()) {
            errors.push(error(&job_id, "name", "duplicate job name"));
        }

        if job.endpoints().is_empty() {
            errors.push(error(
                &job_id,
                "endpoints",
                "at least one endpoint must be defined",
            ));
        }
        for endpoint in job.endpoints() {
            if let Err(msg) = validate_endpoint_url(endpoint) {
                errors.push(error(&job_id, "endpoints", msg));
            }
        }

        if job.max_retries() == Some(0) {
            errors.push(error(&job_id, "max_retries", "must be at least 1"));
        }
        if job.timeout() == Some(0) {
            errors.push(error(&job_id, "timeout", "must be greater than 0"));
        }

        match job {
            Job::Overpass(j) => validate_overpass(&job_id, j, &mut errors),
            Job::Peeringdb(j) => validate_peeringdb(&job_id, j, &mut errors),
            Job::Cables(j) => validate_cables(&job_id, j, &mut errors),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_overpass(job_id: &str, job: &OverpassJob, errors: &mut Vec<ValidationError>) {
    if job.node_tags.is_empty() && job.way_tags.is_empty() {
        errors.push(error(
            job_id,
            "node_tags",
            "at least one node or way tag must be defined",
        ));
    }
    if job.tag_key.is_empty() {
        errors.push(error(job_id, "tag_key", "tag key cannot be empty"));
    }
    for tag in job.node_tags.iter().chain(&job.way_tags) {
        if tag.is_empty() || tag.contains('"') {
            errors.push(error(
                job_id,
                "tags",
                format!("'{tag}' is not a usable tag value"),
            ));
        }
    }
}

fn validate_peeringdb(job_id: &str, job: &PeeringDbJob, errors: &mut Vec<ValidationError>) {
    if job.datasets.is_empty() {
        errors.push(error(
            job_id,
            "datasets",
            "at least one dataset must be defined",
        ));
    }
    if job.api_key_env.is_empty() {
        errors.push(error(
            job_id,
            "api_key_env",
            "environment variable name cannot be empty",
        ));
    }
}

fn validate_cables(job_id: &str, job: &CableJob, errors: &mut Vec<ValidationError>) {
    if job.base_path.is_empty() {
        errors.push(error(job_id, "base_path", "base path cannot be empty"));
    }
    if !job.detail_path.contains(":id") {
        errors.push(ValidationError {
            suggestion: Some(format!("did you mean '{}/:id'?", job.detail_path)),
            ..error(
                job_id,
                "detail_path",
                "detail path must contain the ':id' placeholder",
            )
        });
    }
    if job.id_field.is_empty() {
        errors.push(error(job_id, "id_field", "id field cannot be empty"));
    }
    if job.detail_keys.is_empty() {
        errors.push(error(
            job_id,
            "detail_keys",
            "at least one detail key must be defined",
        ));
    }
    if job.detail_keys.contains(&job.id_field) {
        errors.push(ValidationError {
            suggestion: Some(format!("remove '{}' from detail_keys", job.id_field)),
            ..error(
                job_id,
                "detail_keys",
                "the id field cannot be overwritten by detail records",
            )
        });
    }
    if let Some(ref status) = job.status_field {
        if *status == job.id_field || job.detail_keys.contains(status) {
            errors.push(error(
                job_id,
                "status_field",
                format!("'{status}' collides with the id field or a detail key"),
            ));
        }
    }
    if job.output.is_empty() {
        errors.push(error(job_id, "output", "output file name cannot be empty"));
    }
    if job.concurrency_limit == Some(0) {
        errors.push(error(job_id, "concurrency_limit", "must be at least 1"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::RequestMethod;

    fn overpass_job() -> OverpassJob {
        OverpassJob {
            name: "osm-power".into(),
            endpoints: vec!["https://overpass.example/api/interpreter".into()],
            tag_key: "power".into(),
            node_tags: vec!["transformer".into()],
            way_tags: vec!["line".into()],
            method: RequestMethod::Post,
            query_timeout_secs: 3600,
            max_retries: None,
            timeout: None,
        }
    }

    fn cable_job() -> CableJob {
        CableJob {
            name: "cables".into(),
            endpoints: vec!["https://cables.example/api/v3".into()],
            base_path: "cable/cable-geo.json".into(),
            detail_path: "cable/:id.json".into(),
            id_field: "id".into(),
            detail_keys: vec!["length".into()],
            output: "cable-geo-enriched.json".into(),
            concurrency_limit: None,
            status_field: None,
            max_retries: None,
            timeout: None,
        }
    }

    fn config_with(jobs: Vec<Job>) -> Config {
        Config {
            output_dir: "downloads".into(),
            defaults: Defaults::default(),
            jobs,
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = config_with(vec![
            Job::Overpass(overpass_job()),
            Job::Cables(cable_job()),
        ]);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn empty_jobs_fails() {
        let errors = validate(&config_with(vec![])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("at least one job"));
    }

    #[test]
    fn duplicate_names_fail() {
        let config = config_with(vec![
            Job::Overpass(overpass_job()),
            Job::Overpass(overpass_job()),
        ]);
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("duplicate")));
    }

    #[test]
    fn empty_endpoints_fail() {
        let mut job = overpass_job();
        job.endpoints.clear();
        let errors = validate(&config_with(vec![Job::Overpass(job)])).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("at least one endpoint")));
    }

    #[test]
    fn non_http_endpoint_fails() {
        let mut job = overpass_job();
        job.endpoints = vec!["ftp://overpass.example".into()];
        let errors = validate(&config_with(vec![Job::Overpass(job)])).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("unsupported scheme")));
    }

    #[test]
    fn zero_retries_fail() {
        let mut job = overpass_job();
        job.max_retries = Some(0);
        let errors = validate(&config_with(vec![Job::Overpass(job)])).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "max_retries"));
    }

    #[test]
    fn shrinking_backoff_fails() {
        let mut config = config_with(vec![Job::Overpass(overpass_job())]);
        config.defaults.base_backoff_ms = 500;
        let errors = validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "defaults.base_backoff_ms" && e.suggestion.is_some()));
    }

    #[test]
    fn quoted_tag_fails() {
        let mut job = overpass_job();
        job.node_tags.push("bad\"tag".into());
        let errors = validate(&config_with(vec![Job::Overpass(job)])).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "tags"));
    }

    #[test]
    fn detail_path_without_placeholder_fails() {
        let mut job = cable_job();
        job.detail_path = "cable".into();
        let errors = validate(&config_with(vec![Job::Cables(job)])).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.suggestion.as_deref() == Some("did you mean 'cable/:id'?")));
    }

    #[test]
    fn detail_keys_cannot_include_id_field() {
        let mut job = cable_job();
        job.detail_keys.push("id".into());
        let errors = validate(&config_with(vec![Job::Cables(job)])).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "detail_keys" && e.suggestion.is_some()));
    }

    #[test]
    fn status_field_cannot_shadow_id_or_detail_keys() {
        for field in ["id", "length"] {
            let mut job = cable_job();
            job.status_field = Some(field.into());
            let errors = validate(&config_with(vec![Job::Cables(job)])).unwrap_err();
            assert!(errors.iter().any(|e| e.field == "status_field"), "{field}");
        }

        let mut job = cable_job();
        job.status_field = Some("enrichment".into());
        assert!(validate(&config_with(vec![Job::Cables(job)])).is_ok());
    }
}
