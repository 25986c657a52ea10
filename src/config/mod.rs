//! Configuration module

mod site;

pub use site::CommentsConfig;
pub use site::NavigationMode;
pub use site::PrismicConfig;
pub use site::ReadingConfig;
pub use site::SiteConfig;
pub use site::{ACCESS_TOKEN_ENV, ENDPOINT_ENV};
