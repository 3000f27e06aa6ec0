//! `infraharvest run`: fetch every configured dataset.
//!
//! Loads the job file, applies CLI overrides, and runs the selected jobs
//! one after another over a shared hyper transport. A failing unit of
//! work never aborts the run; the command only fails when every unit
//! failed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Instrument;

use crate::cli::RunArgs;
use crate::config::model::{Config, Job};
use crate::config::sources;
use crate::config::validation::validate;
use crate::config::ConfigSource;
use crate::error::HarvestError;
use crate::fetch::{HyperTransport, Transport};
use crate::jobs;
use crate::logging;

pub async fn execute(args: RunArgs) -> Result<(), HarvestError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let source = resolve_config_source(args.config.as_deref()).await?;
    let (mut config, version) = source.load().await?;

    apply_overrides(&mut config, &args);
    if let Err(errors) = validate(&config) {
        return Err(HarvestError::ConfigValidation { errors });
    }

    let run_id = uuid::Uuid::new_v4();
    tracing::info!(
        run_id = %run_id,
        source = source.name(),
        version = version.short(),
        jobs = config.jobs.len(),
        output_dir = %config.output_dir.display(),
        "infraharvest started"
    );

    let transport: Arc<dyn Transport> = Arc::new(HyperTransport::new());
    let summary = run_jobs(&config, &args.only, transport)
        .instrument(tracing::info_span!("run", run_id = %run_id))
        .await?;

    summary.log();
    if summary.all_failed() {
        return Err(HarvestError::RunFailed(summary.failed.len()));
    }

    tracing::info!(run_id = %run_id, "infraharvest finished");
    Ok(())
}

/// Run the jobs named in `only` (all jobs when empty) over `transport`.
pub async fn run_jobs(
    config: &Config,
    only: &[String],
    transport: Arc<dyn Transport>,
) -> Result<jobs::RunSummary, HarvestError> {
    let selected = select_jobs(config, only)?;

    let ctx = jobs::JobContext {
        fetcher: Arc::new(crate::fetch::Fetcher::new(
            transport,
            config.defaults.retry_policy(),
        )),
        defaults: config.defaults.clone(),
        output_dir: config.output_dir.clone(),
    };

    let mut summary = jobs::RunSummary::default();
    for job in selected {
        jobs::run_job(job, &ctx, &mut summary).await;
    }
    Ok(summary)
}

pub fn select_jobs<'a>(config: &'a Config, only: &[String]) -> Result<Vec<&'a Job>, HarvestError> {
    if only.is_empty() {
        return Ok(config.jobs.iter().collect());
    }

    only.iter()
        .map(|name| {
            config
                .jobs
                .iter()
                .find(|j| j.name() == name.as_str())
                .ok_or_else(|| HarvestError::UnknownJob {
                    name: name.clone(),
                    available: config.job_names().join(", "),
                })
        })
        .collect()
}

/// Explicit CLI flags win over both the defaults and per-job settings.
pub fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(ref dir) = args.output_dir {
        config.output_dir.clone_from(dir);
    }

    if let Some(retries) = args.max_retries {
        config.defaults.max_retries = retries;
        for job in &mut config.jobs {
            match job {
                Job::Overpass(j) => j.max_retries = None,
                Job::Peeringdb(j) => j.max_retries = None,
                Job::Cables(j) => j.max_retries = None,
            }
        }
    }

    if let Some(timeout) = args.timeout {
        config.defaults.timeout = timeout;
        for job in &mut config.jobs {
            match job {
                Job::Overpass(j) => j.timeout = None,
                Job::Peeringdb(j) => j.timeout = None,
                Job::Cables(j) => j.timeout = None,
            }
        }
    }

    if let Some(limit) = args.concurrency {
        config.defaults.concurrency_limit = limit;
        for job in &mut config.jobs {
            if let Job::Cables(j) = job {
                j.concurrency_limit = None;
            }
        }
    }
}

async fn resolve_config_source(
    explicit: Option<&Path>,
) -> Result<Box<dyn ConfigSource>, HarvestError> {
    if let Some(path) = explicit {
        return sources::for_path(path);
    }

    // Auto-detect in current directory
    let candidates = [
        "infraharvest.yaml",
        "infraharvest.yml",
        "infraharvest.json",
        "infraharvest.toml",
    ];

    for name in &candidates {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected job file");
            return sources::for_path(&path);
        }
    }

    Err(HarvestError::NoConfigSource {
        hint: "Provide --config <file> or create ./infraharvest.yaml.\n  \
               Run 'infraharvest init' to create a job file."
            .into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn config() -> Config {
        serde_json::from_value(serde_json::json!({
            "jobs": [
                {"kind": "peeringdb", "name": "pdb", "endpoints": ["https://a.example/api"],
                 "datasets": ["org"], "max_retries": 5},
                {"kind": "cables", "name": "cables", "endpoints": ["https://b.example/v3"],
                 "base_path": "cable/cable-geo.json", "detail_path": "cable/:id.json",
                 "detail_keys": ["length"], "output": "out.json", "concurrency_limit": 4}
            ]
        }))
        .unwrap()
    }

    fn run_args(extra: &[&str]) -> RunArgs {
        let argv = ["infraharvest", "run"].iter().chain(extra).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Commands::Run(args)) => *args,
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn empty_filter_selects_every_job() {
        let config = config();
        let jobs = select_jobs(&config, &[]).unwrap();
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn filter_keeps_requested_order() {
        let config = config();
        let only = vec!["cables".to_string(), "pdb".to_string()];
        let names: Vec<&str> = select_jobs(&config, &only)
            .unwrap()
            .into_iter()
            .map(Job::name)
            .collect();
        assert_eq!(names, vec!["cables", "pdb"]);
    }

    #[test]
    fn unknown_job_lists_available_names() {
        let config = config();
        let err = select_jobs(&config, &["osm".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            HarvestError::UnknownJob { ref available, .. } if available == "pdb, cables"
        ));
    }

    #[test]
    fn cli_flags_override_job_settings() {
        let mut config = config();
        let args = run_args(&["--max-retries", "7", "--concurrency", "9", "-o", "/tmp/out"]);

        apply_overrides(&mut config, &args);

        assert_eq!(config.defaults.max_retries, 7);
        assert_eq!(config.defaults.concurrency_limit, 9);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert!(config.jobs.iter().all(|j| j.max_retries().is_none()));
        let Job::Cables(ref cables) = config.jobs[1] else {
            panic!("second job should be cables");
        };
        assert_eq!(cables.concurrency_limit, None);
    }

    #[test]
    fn absent_flags_leave_job_file_alone() {
        let mut config = config();
        apply_overrides(&mut config, &run_args(&[]));
        assert_eq!(config.jobs[0].max_retries(), Some(5));
        assert_eq!(config.output_dir, PathBuf::from("downloads"));
    }
}
