//! NTLM authentication for reqwest.
//!
//! [`NtlmTransport`] wraps a request executor (by default a [`reqwest::Client`]) and performs the
//! NTLM handshake whenever a server answers with 401: it probes the URL with a Negotiate message,
//! answers the server's Challenge with an Authenticate message computed from the credentials, and
//! replays the original request with that message attached.
//!
//! Sample usage:
//! ```no_run
//! use ntlm_transport::{Credentials, NtlmTransport};
//!
//! async fn fetch_report() -> Result<String, Box<dyn std::error::Error>> {
//!     let transport = NtlmTransport::builder(Credentials::new("dt", "testuser", "fish"))
//!         .workstation("WS01")
//!         .build()?;
//!
//!     let request = reqwest::Request::new(
//!         reqwest::Method::GET,
//!         "https://intranet.example.com/reports".parse()?,
//!     );
//!     let response = transport.execute(request).await?
//!         .error_for_status()?;
//!     Ok(response.text().await?)
//! }
//! ```


mod config;
mod engine;
mod error;
mod executor;
mod header;
mod negotiate;
mod transport;


pub use crate::config::{Config, ConfigError};
pub use crate::engine::{
    ClientSession, EngineError, Mode, NtlmClientEngine, NtlmClientSession, ProtocolEngine, Version,
};
pub use crate::error::{BoxError, Error};
pub use crate::executor::RequestExecutor;
pub use crate::header::{ChallengeToken, NTLM_SCHEME, authorization_value, decode_token, encode_token, find_challenge};
pub use crate::negotiate::{NEGOTIATE_MESSAGE_LENGTH, negotiate_flags, negotiate_message};
pub use crate::transport::{Builder, Credentials, NtlmTransport};
