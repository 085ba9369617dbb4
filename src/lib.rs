pub mod batch;
pub mod config;
pub mod db;
pub mod errors;
pub mod ingestor;
pub mod oracle;
pub mod queue;
pub mod routing;
pub mod source;
pub mod telemetry;

pub use config::IngestConfig;
pub use db::{BindValue, ConnectParams, ConnectionProvider, QueueConnection};
pub use errors::{IngestError, Result};
pub use ingestor::{IngestOutcome, IngestRequest, QueueIngestor};
pub use queue::DateRange;
pub use routing::{RoutingKey, RoutingTable, SenderId};
