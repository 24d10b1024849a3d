use crate::error::Result;
use crate::generator::Generator;
use crate::shortener::{ShortLink, Shortener};
use async_trait::async_trait;
use ferrylink_core::{KvStore, NormalizedUrl, RelayConfig, ShortCode};
use sha1::{Digest, Sha1};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Key of the `code → target` index.
pub fn code_key(code: &ShortCode) -> String {
    format!("c:{code}")
}

/// Key of the `content hash → code` index.
pub fn hash_key(hash: &str) -> String {
    format!("u:{hash}")
}

/// Lowercase hex SHA-1 of the normalized target.
pub fn content_hash(target: &NormalizedUrl) -> String {
    format!("{:x}", Sha1::digest(target.as_str().as_bytes()))
}

/// Issues and resolves short links on top of a [`KvStore`].
///
/// Two indexes are maintained side by side: `c:{code}` holds the target and
/// `u:{sha1(target)}` holds the code already issued for it, which makes
/// [`Shortener::shorten`] idempotent per target.
///
/// The store offers no compare-and-swap, so two concurrent first requests for
/// the same target can both miss the hash index and each persist their own
/// code. Both codes resolve correctly; only deduplication is weakened. The
/// registry is append-only and never updates or deletes entries.
#[derive(Debug, Clone)]
pub struct ShortLinkRegistry<K, G> {
    kv: Arc<K>,
    generator: Arc<G>,
    config: Arc<RelayConfig>,
}

impl<K: KvStore, G: Generator> ShortLinkRegistry<K, G> {
    pub fn new(kv: K, generator: G, config: Arc<RelayConfig>) -> Self {
        Self {
            kv: Arc::new(kv),
            generator: Arc::new(generator),
            config,
        }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Looks up the code previously issued for `hash`, if any.
    async fn existing_code(&self, hash: &str) -> Result<Option<ShortCode>> {
        let Some(raw) = self.kv.get(&hash_key(hash)).await? else {
            return Ok(None);
        };

        match ShortCode::parse(&raw) {
            Ok(code) => Ok(Some(code)),
            Err(e) => {
                warn!(hash = %hash, value = %raw, error = %e, "ignoring malformed hash index entry");
                Ok(None)
            }
        }
    }

    /// Draws candidates until one is unoccupied or the attempt budget runs out,
    /// in which case the last candidate is accepted as is.
    async fn allocate_code(&self) -> Result<ShortCode> {
        let attempts = self.config.max_code_attempts.max(1);
        let mut candidate = self.generator.generate();

        for attempt in 1..=attempts {
            if self.kv.get(&code_key(&candidate)).await?.is_none() {
                return Ok(candidate);
            }

            debug!(code = %candidate, attempt, "short code collision");
            if attempt < attempts {
                candidate = self.generator.generate();
            }
        }

        warn!(code = %candidate, attempts, "accepting short code after exhausting collision retries");
        Ok(candidate)
    }
}

#[async_trait]
impl<K: KvStore, G: Generator> Shortener for ShortLinkRegistry<K, G> {
    async fn shorten(&self, url: &str) -> Result<ShortLink> {
        let target = NormalizedUrl::parse(url, &self.config.allow_list)?;
        let hash = content_hash(&target);

        if let Some(code) = self.existing_code(&hash).await? {
            trace!(code = %code, target = %target, "reusing existing short code");
            return Ok(ShortLink { code, target });
        }

        let code = self.allocate_code().await?;

        // The target index goes first so a code is never published by the
        // hash index before it resolves.
        self.kv.put(&code_key(&code), target.as_str()).await?;
        self.kv.put(&hash_key(&hash), code.as_str()).await?;

        debug!(code = %code, target = %target, "issued short code");
        Ok(ShortLink { code, target })
    }

    async fn resolve(&self, code: &str) -> Result<Option<NormalizedUrl>> {
        let Ok(code) = ShortCode::parse(code) else {
            trace!(code = %code, "not a well-formed short code");
            return Ok(None);
        };

        let Some(raw) = self.kv.get(&code_key(&code)).await? else {
            trace!(code = %code, "short code not found");
            return Ok(None);
        };

        match NormalizedUrl::parse(&raw, &self.config.allow_list) {
            Ok(target) => Ok(Some(target)),
            Err(e) => {
                warn!(code = %code, target = %raw, error = %e, "stored target no longer passes validation");
                Ok(None)
            }
        }
    }
}
