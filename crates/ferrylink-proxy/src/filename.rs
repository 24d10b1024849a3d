//! Filename derivation from `Content-Disposition` and the target URL.

use ferrylink_core::NormalizedUrl;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Used when neither the headers nor the URL yield a name.
pub const PLACEHOLDER: &str = "download";

/// Everything but unreserved characters is escaped in `filename*`.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Picks the download name for `target`.
///
/// Preference order: RFC 5987 `filename*`, plain `filename`, the last URL
/// path segment, then [`PLACEHOLDER`].
pub fn derive_filename(content_disposition: Option<&str>, target: &NormalizedUrl) -> String {
    content_disposition
        .and_then(from_content_disposition)
        .or_else(|| from_url(target))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Extracts the filename parameter of a `Content-Disposition` value.
pub fn from_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;

    for param in split_params(value) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let raw = raw.trim();

        if key.eq_ignore_ascii_case("filename*") {
            if let Some(name) = decode_extended(raw).as_deref().and_then(sanitize) {
                return Some(name);
            }
        } else if key.eq_ignore_ascii_case("filename") && plain.is_none() {
            plain = sanitize(unquote(raw));
        }
    }

    plain
}

/// `Content-Disposition` value sent to clients.
pub fn attachment_disposition(name: &str) -> String {
    format!(
        "attachment; filename*=UTF-8''{}",
        utf8_percent_encode(name, FILENAME_ENCODE_SET)
    )
}

fn from_url(target: &NormalizedUrl) -> Option<String> {
    let segment = target.last_segment()?;
    sanitize(&percent_decode_str(segment).decode_utf8_lossy())
}

/// Decodes `charset'language'value`; the charset and language are ignored
/// and the value is read as percent-encoded UTF-8.
fn decode_extended(raw: &str) -> Option<String> {
    let raw = unquote(raw);
    let encoded = match raw.splitn(3, '\'').collect::<Vec<_>>().as_slice() {
        [_charset, _language, value] => *value,
        _ => raw,
    };
    Some(percent_decode_str(encoded).decode_utf8_lossy().into_owned())
}

fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw)
}

/// Drops any directory part and rejects empty names.
fn sanitize(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Splits on `;` outside of double quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}
