use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    /// Full short URL, e.g. `https://relay.example/d/3xYz9Q`.
    pub short: String,
    /// The normalized target.
    pub long: String,
    pub code: String,
}
