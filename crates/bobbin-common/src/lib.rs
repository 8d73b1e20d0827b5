//! Common runtime for bobbin-generated AT Protocol clients
//!
//! Generated bindings depend on this crate for three things:
//!
//! - the Lexicon string-format types ([`types`]) that fields are mapped onto,
//! - the transport boundary ([`xrpc::XrpcTransport`]) every generated client
//!   is constructed with, along with [`xrpc::Response`], and
//! - the error values ([`error::ClientError`], [`error::XrpcError`]) that
//!   generated methods return.
//!
//! A reference transport over plain HTTP lives in [`xrpc::HttpTransport`].

#![warn(missing_docs)]
pub use bytes;
pub use serde_json;
pub use smol_str;
pub use url;

pub mod error;
/// HTTP client abstraction used by [`xrpc::HttpTransport`].
pub mod http_client;
/// Baseline Lexicon data types.
pub mod types;
pub mod xrpc;

pub use error::{ClientError, XrpcError, XrpcResult};
pub use xrpc::{Response, XrpcTransport};
