pub mod meta;
pub mod proxy;
pub mod resolve;
pub mod shorten;
pub mod ui;

pub use meta::meta_handler;
pub use proxy::{cors_middleware, proxy_handler};
pub use resolve::resolve_handler;
pub use shorten::shorten_handler;
pub use ui::{index_handler, missing_target_handler};
