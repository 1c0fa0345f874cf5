//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → deadline.rs (inbound backstop timeout)
//!     → request.rs (request ID assigned and propagated)
//!     → currency.rs (query extraction → bridge pipeline)
//!     → response.rs (JSON error mapping)
//!     → Send to client
//! ```

pub mod currency;
pub mod deadline;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
