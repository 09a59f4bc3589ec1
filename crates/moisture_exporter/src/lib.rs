pub mod api;
pub mod config;
pub mod fetch;
pub mod metrics;
pub mod resources;
pub mod scrape;

pub use config::Config;
pub use config::LogLevel;
pub use fetch::FetchError;
pub use fetch::HttpFetcher;
pub use fetch::ResourceSource;
pub use metrics::Metrics;
pub use resources::decode;
pub use resources::DecodeError;
pub use resources::MoistureSensor;
pub use resources::PumpState;
pub use resources::ResourceSnapshot;
pub use scrape::scrape;
pub use scrape::ScrapeError;
