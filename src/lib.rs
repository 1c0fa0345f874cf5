//! REST to SOAP bridge for the central bank exchange-rate service.

pub mod bridge;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use bridge::{BridgeError, BridgeHandler};
pub use config::schema::BridgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
