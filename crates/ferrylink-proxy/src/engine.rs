use crate::filename::{attachment_disposition, derive_filename};
use crate::headers::{
    apply_cors, strip_upstream_headers, upstream_request_headers, CacheStatus, CACHE_STATUS,
    SERVED_BY,
};
use axum::body::Body;
use bytes::{Bytes, BytesMut};
use ferrylink_core::{CacheKey, CachedResponse, NormalizedUrl, RelayConfig, ResponseCache};
use futures::stream::{BoxStream, Stream, StreamExt};
use http::header::{AGE, CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, RANGE};
use http::{HeaderMap, HeaderValue, Method, Response, StatusCode};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// The data plane: serves a target from the edge cache or streams it from
/// upstream, rewriting headers on the way through.
///
/// Cacheable responses (status 200 to a non-range `GET`) are copied into the
/// cache by a detached task while the body streams to the client. The
/// response never waits on that task and its failures are only logged.
#[derive(Clone)]
pub struct ProxyEngine {
    client: reqwest::Client,
    cache: Arc<dyn ResponseCache>,
    config: Arc<RelayConfig>,
}

impl ProxyEngine {
    pub fn new(
        client: reqwest::Client,
        cache: Arc<dyn ResponseCache>,
        config: Arc<RelayConfig>,
    ) -> Self {
        Self {
            client,
            cache,
            config,
        }
    }

    pub async fn serve(
        &self,
        method: &Method,
        headers: &HeaderMap,
        target: &NormalizedUrl,
    ) -> Response<Body> {
        let is_range = headers.contains_key(RANGE);
        let cacheable = *method == Method::GET && !is_range;
        let status = if cacheable {
            CacheStatus::Miss
        } else {
            CacheStatus::Bypass
        };

        if cacheable {
            let key = CacheKey::get(target);
            match self.cache.get_response(&key).await {
                Ok(Some(entry)) => {
                    debug!(url = %target, "serving from cache");
                    return self.cached(entry);
                }
                Ok(None) => trace!(url = %target, "cache miss"),
                Err(e) => warn!(url = %target, error = %e, "cache lookup failed, treating as miss"),
            }
        }

        let upstream = self
            .client
            .request(method.clone(), target.as_str())
            .headers(upstream_request_headers(headers, &self.config.user_agent))
            .send()
            .await;

        let upstream = match upstream {
            Ok(upstream) => upstream,
            Err(e) => {
                warn!(url = %target, error = %e, "upstream fetch failed");
                return self.bad_gateway(e.to_string(), status, target);
            }
        };

        let upstream_status = upstream.status();
        let store = cacheable && upstream_status == StatusCode::OK;
        debug!(
            url = %target,
            status = %upstream_status,
            cache_status = status.as_str(),
            store,
            "upstream responded"
        );

        let mut response_headers = upstream.headers().clone();
        let name = derive_filename(
            response_headers
                .get(CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok()),
            target,
        );
        strip_upstream_headers(&mut response_headers);
        self.decorate(&mut response_headers, status);
        if let Ok(disposition) = HeaderValue::from_str(&attachment_disposition(&name)) {
            response_headers.insert(CONTENT_DISPOSITION, disposition);
        }
        let cache_control = if store {
            HeaderValue::from_str(&self.config.immutable_cache_control())
                .unwrap_or_else(|_| HeaderValue::from_static("no-store"))
        } else {
            HeaderValue::from_static("no-store")
        };
        response_headers.insert(CACHE_CONTROL, cache_control);

        let expected_len = upstream.content_length();
        let chunks = upstream.bytes_stream().boxed();
        let oversized = matches!(expected_len, Some(n) if n > self.config.max_cacheable_bytes);
        let body = if store && !oversized {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(store_when_complete(
                rx,
                StoreJob {
                    cache: Arc::clone(&self.cache),
                    key: CacheKey::get(target),
                    status: upstream_status,
                    headers: response_headers.clone(),
                    expected_len,
                    limit: self.config.max_cacheable_bytes,
                },
            ));
            Body::from_stream(TeeStream {
                inner: chunks,
                sink: Some(tx),
            })
        } else {
            if store {
                debug!(url = %target, "response exceeds cacheable size, streaming only");
            }
            Body::from_stream(chunks)
        };

        let mut response = Response::new(body);
        *response.status_mut() = upstream_status;
        *response.headers_mut() = response_headers;
        response
    }

    fn cached(&self, entry: CachedResponse) -> Response<Body> {
        let age = entry.age_secs();
        let mut headers = entry.headers;
        self.decorate(&mut headers, CacheStatus::Hit);
        headers.insert(AGE, HeaderValue::from(age));

        let mut response = Response::new(Body::from(entry.body));
        *response.status_mut() = entry.status;
        *response.headers_mut() = headers;
        response
    }

    fn bad_gateway(
        &self,
        message: String,
        status: CacheStatus,
        target: &NormalizedUrl,
    ) -> Response<Body> {
        let mut headers = HeaderMap::new();
        self.decorate(&mut headers, status);
        if let Ok(disposition) =
            HeaderValue::from_str(&attachment_disposition(&derive_filename(None, target)))
        {
            headers.insert(CONTENT_DISPOSITION, disposition);
        }
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let mut response = Response::new(Body::from(message));
        *response.status_mut() = StatusCode::BAD_GATEWAY;
        *response.headers_mut() = headers;
        response
    }

    /// CORS, cache marker and product header, common to every outcome.
    fn decorate(&self, headers: &mut HeaderMap, status: CacheStatus) {
        apply_cors(headers);
        headers.insert(CACHE_STATUS, status.header_value());
        if let Ok(product) = HeaderValue::from_str(&self.config.product) {
            headers.insert(SERVED_BY, product);
        }
    }
}

#[derive(Debug)]
enum TeeEvent {
    Chunk(Bytes),
    End,
    Abort,
}

/// Passes upstream chunks through unchanged while copying them to a sink.
///
/// Once the sink is gone (collector gave up, or the stream ended or failed)
/// chunks are no longer copied.
struct TeeStream {
    inner: BoxStream<'static, reqwest::Result<Bytes>>,
    sink: Option<mpsc::UnboundedSender<TeeEvent>>,
}

impl Stream for TeeStream {
    type Item = reqwest::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let item = ready!(this.inner.poll_next_unpin(cx));

        if let Some(sink) = &this.sink {
            let (event, done) = match &item {
                Some(Ok(chunk)) => (TeeEvent::Chunk(chunk.clone()), false),
                Some(Err(_)) => (TeeEvent::Abort, true),
                None => (TeeEvent::End, true),
            };
            if sink.send(event).is_err() || done {
                this.sink = None;
            }
        }

        Poll::Ready(item)
    }
}

struct StoreJob {
    cache: Arc<dyn ResponseCache>,
    key: CacheKey,
    status: StatusCode,
    headers: HeaderMap,
    expected_len: Option<u64>,
    limit: u64,
}

/// Assembles the teed body and stores it once it is known to be complete.
///
/// The server may stop polling the body as soon as `Content-Length` bytes
/// were written, so a closed channel after exactly that many bytes counts as
/// complete. Without a length only an explicit end of stream does.
async fn store_when_complete(mut events: mpsc::UnboundedReceiver<TeeEvent>, job: StoreJob) {
    let mut body = BytesMut::new();

    let ended = loop {
        match events.recv().await {
            Some(TeeEvent::Chunk(chunk)) => {
                if (body.len() + chunk.len()) as u64 > job.limit {
                    debug!(key = %job.key, limit = job.limit, "body exceeds cacheable size, not storing");
                    return;
                }
                body.extend_from_slice(&chunk);
            }
            Some(TeeEvent::End) => break true,
            Some(TeeEvent::Abort) => break false,
            None => break false,
        }
    };

    let received = body.len() as u64;
    let complete = match job.expected_len {
        Some(expected) => received == expected,
        None => ended,
    };
    if !complete {
        debug!(key = %job.key, received, expected = ?job.expected_len, "incomplete body, not storing");
        return;
    }

    let entry = CachedResponse::new(job.status, job.headers, body.freeze());
    match job.cache.put_response(job.key.clone(), entry).await {
        Ok(()) => debug!(key = %job.key, bytes = received, "stored response"),
        Err(e) => warn!(key = %job.key, error = %e, "failed to store response"),
    }
}
