use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use ferrylink_core::NormalizedUrl;
use ferrylink_proxy::headers::apply_cors;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Treats the request path as the target URL and proxies it.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response> {
    let raw = target_from_uri(&uri).ok_or(AppError::MissingTarget)?;
    let target = NormalizedUrl::parse(&raw, &state.config().allow_list)?;

    Ok(state.engine().serve(&method, &headers, &target).await)
}

/// Answers preflight requests on every path and puts the CORS headers on
/// every other response.
pub async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors(response.headers_mut());
    response
}

/// Recovers the target from a direct proxy path such as
/// `/https://github.com/o/r/archive/main.zip?x=1`.
///
/// Intermediaries often collapse `//` in paths, so `https:/github.com` is
/// repaired to `https://github.com`. Returns `None` for an empty path.
fn target_from_uri(uri: &Uri) -> Option<String> {
    let path = uri.path().trim_start_matches('/');
    if path.is_empty() {
        return None;
    }

    let mut target = repair_scheme(path);
    if let Some(query) = uri.query() {
        target.push('?');
        target.push_str(query);
    }
    Some(target)
}

fn repair_scheme(path: &str) -> String {
    for scheme in ["https:", "http:"] {
        let Some(rest) = strip_prefix_ignore_case(path, scheme) else {
            continue;
        };
        let rest = rest.trim_start_matches('/');
        return format!("{scheme}//{rest}");
    }
    path.to_string()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}
