//! Shared test doubles for the integration suites.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use infraharvest::fetch::{FetchError, PreparedRequest, RawResponse, Transport};

/// What the scripted transport does for one attempt.
#[derive(Debug, Clone)]
pub enum Step {
    Respond(u16, &'static str),
    Refuse,
    /// Never completes; only the fetcher's timeout ends it.
    Hang,
}

/// Transport that replays a fixed script and records every URL it saw.
#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn hosts(&self) -> Vec<String> {
        self.seen()
            .iter()
            .map(|u| {
                url::Url::parse(u)
                    .unwrap()
                    .host_str()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, FetchError> {
        self.seen.lock().unwrap().push(request.url.to_string());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Refuse);
        match step {
            Step::Respond(status, body) => Ok(RawResponse {
                status,
                body: Bytes::from_static(body.as_bytes()),
            }),
            Step::Refuse => Err(FetchError::Transport("connection refused".into())),
            Step::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}
