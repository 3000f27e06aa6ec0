//! Unified error types for infraharvest.
//!
//! Defines [`HarvestError`] (the main crate error enum) and
//! [`ValidationError`] for job file validation failures. Both use
//! `thiserror` for `Display` and `Error` derives. Per-attempt fetch
//! errors live in [`crate::fetch::FetchError`] and never escape the
//! fetcher except inside a terminal failure.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub job: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  job {}: {}: {}", self.job, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HarvestError {
    #[error("No job file found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Job file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Job file parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Job file validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported job file format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Unknown job '{name}' (available: {available})")]
    UnknownJob { name: String, available: String },

    #[error("Environment variable {var} is not set (required by job '{job}')")]
    MissingCredential { job: String, var: String },

    #[error("Invalid URL '{url}': {source}")]
    UrlParse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    #[error("All endpoints failed for '{resource}' after {attempts} attempts: {reason}")]
    FetchExhausted {
        resource: String,
        attempts: u32,
        reason: String,
    },

    #[error("Unexpected payload for '{resource}': {message}")]
    UnexpectedPayload { resource: String, message: String },

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("All {0} units of work failed")]
    RunFailed(usize),
}
