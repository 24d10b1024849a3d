use crate::classify::{Classifier, FileKind};
use crate::error::ProbeError;
use crate::filename::derive_filename;
use ferrylink_core::{NormalizedUrl, RelayConfig};
use http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use http::{HeaderMap, Method};
use reqwest::{Client, Response};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Requests only the first byte when a `HEAD` is not good enough.
const PROBE_RANGE: &str = "bytes=0-0";

/// Descriptive metadata for a download target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: FileKind,
}

/// Resolves [`ProbeResult`]s without downloading response bodies.
///
/// Each probe issues a `HEAD` and, if that is not conclusive, a ranged `GET`.
/// Both attempts run under the configured probe deadline.
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    client: Client,
    config: Arc<RelayConfig>,
    classifier: Classifier,
}

impl MetadataResolver {
    pub fn new(client: Client, config: Arc<RelayConfig>) -> Self {
        Self::with_classifier(client, config, Classifier::default())
    }

    pub fn with_classifier(client: Client, config: Arc<RelayConfig>, classifier: Classifier) -> Self {
        Self {
            client,
            config,
            classifier,
        }
    }

    pub async fn probe(&self, raw_url: &str) -> Result<ProbeResult, ProbeError> {
        self.probe_with_cancel(raw_url, &CancellationToken::new())
            .await
    }

    /// Like [`probe`](Self::probe), but both attempts also stop as soon as
    /// `cancel` fires.
    pub async fn probe_with_cancel(
        &self,
        raw_url: &str,
        cancel: &CancellationToken,
    ) -> Result<ProbeResult, ProbeError> {
        let target = NormalizedUrl::parse(raw_url, &self.config.allow_list)?;
        trace!(url = %target, "probing metadata");

        let head = self.attempt(Method::HEAD, &target, cancel).await;
        let response = match head {
            Ok(response) if response.headers().contains_key(CONTENT_LENGTH) => response,
            head => match self.attempt(Method::GET, &target, cancel).await {
                Ok(response) => response,
                Err(ranged) => {
                    // A HEAD without a length still names and classifies the file.
                    head.map_err(|_| ranged)?
                }
            },
        };

        let headers = response.headers();
        let disposition = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok());
        let result = ProbeResult {
            name: derive_filename(disposition, &target),
            size: content_size(headers),
            kind: self.classifier.classify(&target),
        };
        debug!(url = %target, name = %result.name, size = result.size, "probe complete");
        Ok(result)
    }

    /// One upstream request under the probe deadline.
    ///
    /// The deadline is a child token of `parent`, cancelled by a timer task;
    /// cancellation drops the in-flight request. A non-2xx status counts as a
    /// failed attempt.
    async fn attempt(
        &self,
        method: Method,
        target: &NormalizedUrl,
        parent: &CancellationToken,
    ) -> Result<Response, ProbeError> {
        let deadline = parent.child_token();
        let timer = {
            let deadline = deadline.clone();
            let timeout = self.config.probe_timeout;
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                deadline.cancel();
            })
        };

        let mut request = self.client.request(method.clone(), target.as_str());
        if method == Method::GET {
            request = request.header(RANGE, PROBE_RANGE);
        }

        let outcome = tokio::select! {
            biased;
            _ = deadline.cancelled() => {
                let reason = if parent.is_cancelled() { "cancelled" } else { "timed out" };
                Err(ProbeError::Unreachable(reason.to_string()))
            }
            response = request.send() => response
                .map_err(|e| ProbeError::Unreachable(e.to_string()))
                .and_then(|response| {
                    if response.status().is_success() {
                        Ok(response)
                    } else {
                        Err(ProbeError::Unreachable(format!("status {}", response.status())))
                    }
                }),
        };
        timer.abort();

        if let Err(e) = &outcome {
            warn!(url = %target, method = %method, error = %e, "probe attempt failed");
        }
        outcome
    }
}

/// Total size of the resource: the `Content-Range` total when present,
/// otherwise `Content-Length`, otherwise 0.
fn content_size(headers: &HeaderMap) -> u64 {
    let range_total = headers
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit_once('/'))
        .and_then(|(_, total)| total.trim().parse::<u64>().ok());

    range_total
        .or_else(|| {
            headers
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
        })
        .unwrap_or(0)
}
