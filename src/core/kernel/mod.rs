//! Request kernel - signing, encoding, transport and async job handling
//!
//! This module turns a logical operation (name + parameters) into an
//! authenticated GET request, runs it, and strips the provider's response
//! envelope. Nothing here knows about individual resources; any operation
//! name works.
//!
//! # Architecture
//!
//! ## Authentication
//! - `Signer`: pluggable signing interface
//! - `HmacSha1Signer`: HMAC-SHA1 over the lower-cased canonical query
//!
//! ## Requests
//! - `RequestEncoder`: injects `apikey`/`command`/`response`, signs, and
//!   builds the final URL
//! - `Transport`: one GET, JSON body out
//! - `ReqwestTransport`: the HTTP implementation
//!
//! ## Responses
//! - `envelope::unwrap`: removes `<operation>response` and maps
//!   `errorcode`/`errortext` to `CloudError::Api`
//! - `AsyncPoller`: fixed-interval `queryAsyncJobResult` loop
//!
//! # Example
//! ```rust,no_run
//! use stackctl::core::config::Credentials;
//! use stackctl::core::kernel::*;
//! use stackctl::core::types::ParameterSet;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::new("api_key".to_string(), "secret_key".to_string());
//! let encoder = RequestEncoder::new("https://cloud.example.com/client/api", credentials)?;
//! let transport = TransportConfig::default().build()?;
//!
//! let url = encoder.encode("listZones", &ParameterSet::new())?;
//! let _zones = envelope::unwrap(transport.execute(&url).await?, "listZones")?;
//! # Ok(())
//! # }
//! ```
pub mod encoder;
pub mod envelope;
#[cfg(test)]
pub mod mock;
pub mod poller;
pub mod signer;
pub mod transport;

// Re-export key types for convenience
pub use encoder::RequestEncoder;
pub use envelope::Payload;
pub use poller::{AsyncPoller, QUERY_ASYNC_JOB_RESULT};
pub use signer::{HmacSha1Signer, Signer};
pub use transport::{execute_cancellable, ReqwestTransport, Transport, TransportConfig};
