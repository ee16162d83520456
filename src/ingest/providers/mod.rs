mod fixture;
mod http;

pub use fixture::FixtureFeedSource;
pub use http::HttpFeedSource;
