//! Upstream-facing half of the relay.
//!
//! [`ProxyEngine`] serves file downloads through the edge cache and
//! [`MetadataResolver`] probes targets for name, size and kind without
//! downloading their bodies. Both share the filename derivation in
//! [`filename`] and the response header policy in [`headers`].

pub mod classify;
pub mod client;
pub mod engine;
pub mod error;
pub mod filename;
pub mod headers;
pub mod metadata;

pub use classify::{Classifier, FileKind};
pub use client::build_client;
pub use engine::ProxyEngine;
pub use error::ProbeError;
pub use metadata::{MetadataResolver, ProbeResult};
