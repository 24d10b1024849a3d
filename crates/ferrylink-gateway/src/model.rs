mod error;
mod meta;
mod shorten;

pub use error::ErrorBody;
pub use meta::{MetaQuery, MetaResponse};
pub use shorten::{ShortenRequest, ShortenResponse};
