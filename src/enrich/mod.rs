//! Bounded enrichment pipeline.
//!
//! [`enrich`] fans a collection of base items out into per-item detail
//! lookups, keeping at most `concurrency_limit` lookups in flight, and
//! merges each detail record back into the item it came from. Results
//! are slotted by their original index, so output order always equals
//! input order no matter how lookups complete.
//!
//! A failed lookup only affects its own item, which is emitted with its
//! original fields. Each item carries an [`ItemStatus`] in the report so
//! callers can tell a failed lookup from an item that had no identity.

pub mod detail;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;

pub use detail::{item_identity, merge, set_property, DetailRecord, DetailSpec};

use crate::fetch::{Endpoint, FetchOutcome, FetchRequest, Fetcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Enriched,
    /// No identity field, so no lookup was made.
    Skipped,
    /// Lookup attempted and exhausted every endpoint.
    Failed,
}

impl ItemStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enriched => "enriched",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub concurrency_limit: usize,
    /// Log progress after every Nth completion; 0 disables it.
    pub progress_every: usize,
    /// When set, each item's status is written into this property.
    pub status_field: Option<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: 50,
            progress_every: 20,
            status_field: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichReport {
    pub items: Vec<Value>,
    pub statuses: Vec<ItemStatus>,
}

impl EnrichReport {
    fn count(&self, status: ItemStatus) -> usize {
        self.statuses.iter().filter(|s| **s == status).count()
    }

    #[must_use]
    pub fn enriched(&self) -> usize {
        self.count(ItemStatus::Enriched)
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(ItemStatus::Skipped)
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(ItemStatus::Failed)
    }
}

/// Per-item detail lookup.
// async_trait keeps DetailFetch usable behind `&dyn DetailFetch`.
#[async_trait]
pub trait DetailFetch: Send + Sync {
    /// Identity used to build the lookup, or `None` to skip the item.
    fn identity(&self, item: &Value) -> Option<String>;

    /// Fetch and project the detail record. `None` means the lookup failed.
    async fn fetch_detail(&self, id: &str) -> Option<DetailRecord>;
}

pub async fn enrich<D>(items: Vec<Value>, detail: &D, options: &PipelineOptions) -> EnrichReport
where
    D: DetailFetch + ?Sized,
{
    let total = items.len();
    let limit = options.concurrency_limit.max(1);

    tracing::info!(items = total, concurrency = limit, "enrichment started");

    let mut slots: Vec<Option<(Value, ItemStatus)>> = (0..total).map(|_| None).collect();
    let mut completions = stream::iter(items.into_iter().enumerate())
        .map(|(index, mut item)| async move {
            let status = match detail.identity(&item) {
                None => ItemStatus::Skipped,
                Some(id) => match detail.fetch_detail(&id).await {
                    Some(record) => {
                        merge(&mut item, &record);
                        ItemStatus::Enriched
                    }
                    None => {
                        tracing::warn!(id = %id, "detail lookup failed, keeping base item");
                        ItemStatus::Failed
                    }
                },
            };
            (index, item, status)
        })
        .buffer_unordered(limit);

    let mut done = 0usize;
    while let Some((index, mut item, status)) = completions.next().await {
        done += 1;
        if let Some(ref field) = options.status_field {
            set_property(&mut item, field, Value::String(status.as_str().to_string()));
        }
        slots[index] = Some((item, status));

        if options.progress_every > 0 && done % options.progress_every == 0 {
            tracing::info!(done, total, "enrichment progress");
        }
    }

    let (items, statuses): (Vec<Value>, Vec<ItemStatus>) = slots.into_iter().flatten().unzip();
    let report = EnrichReport { items, statuses };

    tracing::info!(
        items = total,
        enriched = report.enriched(),
        skipped = report.skipped(),
        failed = report.failed(),
        "enrichment finished"
    );
    report
}

/// [`DetailFetch`] backed by the failover fetcher.
///
/// The detail path is a template; `:id` is replaced by the item identity.
pub struct FetcherDetail {
    fetcher: Arc<Fetcher>,
    endpoints: Vec<Endpoint>,
    path_template: String,
    spec: DetailSpec,
    timeout: Duration,
}

impl FetcherDetail {
    #[must_use]
    pub fn new(
        fetcher: Arc<Fetcher>,
        endpoints: Vec<Endpoint>,
        path_template: impl Into<String>,
        spec: DetailSpec,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            path_template: path_template.into(),
            spec,
            timeout,
        }
    }
}

#[async_trait]
impl DetailFetch for FetcherDetail {
    fn identity(&self, item: &Value) -> Option<String> {
        item_identity(item, &self.spec.id_field)
    }

    async fn fetch_detail(&self, id: &str) -> Option<DetailRecord> {
        let params = HashMap::from([("id".to_string(), id.to_string())]);
        let path = substitute_params(&self.path_template, &params);
        let request = FetchRequest::get(format!("detail:{id}"), path).with_timeout(self.timeout);

        match self.fetcher.fetch(&request, &self.endpoints).await {
            FetchOutcome::Success { payload, .. } => Some(self.spec.project(&payload)),
            FetchOutcome::Failure(_) => None,
        }
    }
}

/// Substitute `:param` placeholders in path templates.
/// Longer keys go first so `:id` never clobbers part of `:item_id`.
#[must_use]
pub fn substitute_params(template: &str, params: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    let mut sorted_entries: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    sorted_entries.sort_by_key(|(k, _)| std::cmp::Reverse(k.len()));

    for (key, value) in sorted_entries {
        result = result.replace(&format!(":{key}"), value);
    }
    result
}
