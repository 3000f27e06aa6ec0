//! `infraharvest validate`: check a job file and show what `run` would do.
//!
//! Loads the file through the same [`ConfigSource`] path as `run`, then
//! prints either every validation problem or a plan per job: its units
//! of work and the retry budget and timeout each request will get once
//! defaults are applied.

use std::fmt::Write;

use serde::Serialize;

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::model::{Config, Job};
use crate::config::{sources, ConfigSource, ConfigVersion};
use crate::error::{HarvestError, ValidationError};
use crate::jobs::unit_labels;

/// What `run` will do for one job.
#[derive(Debug, Serialize)]
pub struct JobPlan {
    pub name: String,
    pub kind: &'static str,
    pub endpoints: usize,
    pub max_retries: u32,
    pub timeout_ms: u64,
    /// Worst-case requests per unit before the unit fails.
    pub attempts_per_unit: u32,
    pub units: Vec<String>,
}

impl JobPlan {
    #[must_use]
    pub fn resolve(job: &Job, config: &Config) -> Self {
        let max_retries = job.max_retries().unwrap_or(config.defaults.max_retries);
        let endpoints = job.endpoints().len();
        Self {
            name: job.name().to_string(),
            kind: job.kind(),
            endpoints,
            max_retries,
            timeout_ms: job.timeout().unwrap_or(config.defaults.timeout),
            attempts_per_unit: u32::try_from(endpoints)
                .unwrap_or(u32::MAX)
                .saturating_mul(max_retries),
            units: unit_labels(job),
        }
    }
}

pub async fn execute(args: &ValidateArgs) -> Result<(), HarvestError> {
    let source = sources::for_path(&args.config)?;
    let display = args.config.display().to_string();

    match source.load().await {
        Ok((config, version)) => {
            let plans: Vec<JobPlan> = config
                .jobs
                .iter()
                .map(|job| JobPlan::resolve(job, &config))
                .collect();
            match args.format {
                ValidateFormat::Text => println!("{}", render_plans(&display, &version, &plans)),
                ValidateFormat::Json => println!(
                    "{}",
                    serde_json::json!({
                        "valid": true,
                        "version": version.short(),
                        "output_dir": config.output_dir,
                        "jobs": plans,
                    })
                ),
            }
            Ok(())
        }
        Err(HarvestError::ConfigValidation { errors }) => {
            match args.format {
                ValidateFormat::Text => eprintln!("{}", render_errors(&display, &errors)),
                ValidateFormat::Json => println!(
                    "{}",
                    serde_json::json!({"valid": false, "errors": errors_json(&errors)})
                ),
            }
            Err(HarvestError::ConfigValidation { errors })
        }
        Err(e) => Err(e),
    }
}

fn errors_json(errors: &[ValidationError]) -> Vec<serde_json::Value> {
    errors
        .iter()
        .map(|e| {
            serde_json::json!({
                "job": e.job,
                "field": e.field,
                "message": e.message,
                "suggestion": e.suggestion,
            })
        })
        .collect()
}

fn render_errors(path: &str, errors: &[ValidationError]) -> String {
    let mut out = format!("\u{2717} {path} has {} errors\n", errors.len());
    for error in errors {
        out.push('\n');
        out.push_str(&error.to_string());
    }
    out
}

#[must_use]
pub fn render_plans(path: &str, version: &ConfigVersion, plans: &[JobPlan]) -> String {
    let units: usize = plans.iter().map(|p| p.units.len()).sum();
    let mut out = format!(
        "\u{2713} {path} is valid (version {})\n  {} jobs, {units} units of work\n",
        version.short(),
        plans.len(),
    );
    for plan in plans {
        // write! to String is infallible
        let _ = writeln!(
            out,
            "\n  {} [{}]: {} endpoints x {} retries, {}ms per attempt",
            plan.name, plan.kind, plan.endpoints, plan.max_retries, plan.timeout_ms
        );
        for unit in &plan.units {
            let _ = writeln!(out, "    - {unit}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        serde_json::from_value(serde_json::json!({
            "defaults": {"max_retries": 4, "timeout": 9000},
            "jobs": [
                {"kind": "overpass", "name": "osm-power",
                 "endpoints": ["https://a.example/api", "https://b.example/api"],
                 "node_tags": ["switch"], "way_tags": ["line"], "max_retries": 2},
                {"kind": "peeringdb", "name": "pdb", "endpoints": ["https://c.example/api"],
                 "datasets": ["org", "fac", "net"], "timeout": 60000}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn plan_applies_job_overrides_over_defaults() {
        let config = config();
        let osm = JobPlan::resolve(&config.jobs[0], &config);
        assert_eq!(osm.max_retries, 2);
        assert_eq!(osm.timeout_ms, 9000);
        assert_eq!(osm.attempts_per_unit, 4);
        assert_eq!(osm.units, vec!["osm-power:node:switch", "osm-power:way:line"]);

        let pdb = JobPlan::resolve(&config.jobs[1], &config);
        assert_eq!(pdb.max_retries, 4);
        assert_eq!(pdb.timeout_ms, 60000);
        assert_eq!(pdb.units.len(), 3);
    }

    #[test]
    fn text_report_lists_units_per_job() {
        let config = config();
        let plans: Vec<JobPlan> = config
            .jobs
            .iter()
            .map(|j| JobPlan::resolve(j, &config))
            .collect();
        let report = render_plans(
            "infraharvest.yaml",
            &ConfigVersion::Hash("0123456789abcdef".into()),
            &plans,
        );
        assert!(report.contains("infraharvest.yaml is valid (version 01234567)"));
        assert!(report.contains("2 jobs, 5 units of work"));
        assert!(report.contains("osm-power [overpass]: 2 endpoints x 2 retries, 9000ms"));
        assert!(report.contains("    - pdb:fac\n"));
    }

    #[test]
    fn error_report_counts_problems() {
        let errors = vec![ValidationError {
            job: "cables".into(),
            field: "detail_path".into(),
            message: "detail path must contain the ':id' placeholder".into(),
            suggestion: None,
        }];
        let report = render_errors("jobs.yaml", &errors);
        assert!(report.starts_with("\u{2717} jobs.yaml has 1 errors"));
        assert!(report.contains("job cables: detail_path"));
    }
}
