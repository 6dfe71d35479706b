//! External service integrations

pub mod http_client;
pub mod imdb;
pub mod logging;
pub mod notion;
pub mod sync;
#[cfg(test)]
mod test_server;
pub mod traits;

pub use imdb::ImdbScraper;
pub use logging::{LogFormat, init_tracing};
pub use notion::NotionClient;
pub use sync::SyncOrchestrator;
pub use traits::MetadataSource;
