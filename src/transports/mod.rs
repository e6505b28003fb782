//! Transport implementations for the Tap the Goose API.
//!
//! Concrete [`Transport`](crate::Transport) implementations live behind
//! feature gates:
//!
//! | Feature          | Transport         |
//! |------------------|-------------------|
//! | `transport-http` | [`HttpTransport`] |
//!
//! # Example
//!
//! ```rust,ignore
//! # async fn example() -> Result<(), goose_tap_client::GooseError> {
//! use goose_tap_client::{ApiRequest, HttpTransport, Method, Transport};
//!
//! let http = HttpTransport::new("http://localhost:3000/api", std::time::Duration::from_secs(10))?;
//! let response = http.execute(ApiRequest::new(Method::Get, "/rounds")).await?;
//! println!("{} {}", response.status, response.body);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "transport-http")]
pub mod http;

#[cfg(feature = "transport-http")]
pub use http::HttpTransport;
