//! REST → SOAP translation pipeline.
//!
//! # Data Flow
//! ```text
//! GET /api/currency?date=…
//!     → date.rs (resolve On_date, default today)
//!     → envelope.rs (render GetCursOnDate SOAP request)
//!     → upstream.rs (POST to DailyInfo.asmx, bounded by timeout)
//!     → translate.rs (SOAP XML → JSON rate records)
//!     → handler.rs (orchestration, stage tracking, error mapping)
//! ```
//!
//! # Design Decisions
//! - Stateless: every request is independent; the only shared value is the
//!   pooled HTTP client
//! - Failures never produce partial JSON

pub mod date;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod translate;
pub mod upstream;

pub use error::BridgeError;
pub use handler::{BridgeHandler, Failure, RequestParameters, Stage, Translated};
pub use upstream::UpstreamClient;
