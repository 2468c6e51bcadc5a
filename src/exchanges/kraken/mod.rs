pub mod conversions;
pub mod endpoints;
pub mod signer;
pub mod symbols;

pub mod builder;
pub mod connector;
pub mod resolver;

// Re-export main components
pub use builder::{build_connector, KrakenBuilder};
pub use connector::KrakenConnector;
pub use conversions::KrakenFlattener;
pub use endpoints::{PayloadShape, RowKind, EXCHANGE_NAME};
pub use resolver::KrakenResolver;
pub use signer::KrakenSigner;
pub use symbols::KrakenSymbolTable;
