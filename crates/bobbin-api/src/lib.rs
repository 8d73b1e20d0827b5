//! Typed clients for the Lexicon schemas under `lexicons/`
//!
//! The module tree is generated by the build script: one module per
//! document, nested by NSID, so `com.example.getProfile` lives at
//! [`com_example::get_profile`]. Each module with XRPC methods carries a
//! client generic over [`bobbin_common::XrpcTransport`].
//!
//! ```no_run
//! use bobbin_api::com_example::get_profile::{GetProfileClient, GetProfileParams};
//! use bobbin_common::{XrpcResult, XrpcTransport};
//!
//! async fn display_name(transport: impl XrpcTransport) -> XrpcResult<Option<String>> {
//!     let client = GetProfileClient::new(transport);
//!     let params = GetProfileParams {
//!         actor: "alice.example.com".into(),
//!         include_labels: None,
//!         fields: None,
//!     };
//!     let profile = client.get_profile(&params, None).await?;
//!     Ok(profile.body.and_then(|p| p.display_name))
//! }
//! ```

include!(concat!(env!("OUT_DIR"), "/generated.rs"));
