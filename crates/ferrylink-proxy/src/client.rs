use ferrylink_core::RelayConfig;
use reqwest::redirect::Policy;

const MAX_REDIRECTS: usize = 10;

/// Builds the outbound client shared by the engine and the resolver.
///
/// No request timeout is configured: proxied downloads may legitimately run
/// for a long time, and probes carry their own deadline.
pub fn build_client(config: &RelayConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()
}
