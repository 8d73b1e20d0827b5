//! # The transport boundary consumed by generated clients
//!
//! A generated client owns exactly one value implementing [`XrpcTransport`]
//! and calls it once per RPC method. The transport works at the byte level:
//! it returns a [`Response<Bytes>`], and the generated method turns that
//! into the typed response with [`Response::decode_json`] or
//! [`Response::into_void`].
//!
//! Mapping overview for [`HttpTransport`]:
//! - queries are sent as `GET <base>/xrpc/<method>?<params>`, with array
//!   parameters repeated once per element
//! - procedures are sent as `POST <base>/xrpc/<method>` with the encoded
//!   input and its `Content-Type`
//! - a non-2xx status becomes [`XrpcError`], decoded from the XRPC error
//!   body when there is one

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smol_str::SmolStr;
use url::Url;

use crate::error::{ClientError, DecodeError, EncodeError, TransportError, XrpcError, XrpcResult};
use crate::http_client::HttpClient;

/// Encoded query parameters for one call
pub type Params = BTreeMap<String, Value>;

/// Extra request headers for one call
pub type Headers = BTreeMap<String, String>;

/// Response body marker for methods that declare no output schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Void;

/// Request body handed to [`XrpcTransport::send_procedure`]
#[derive(Debug, Clone, PartialEq)]
pub enum ProcedureInput {
    /// No body
    Empty,
    /// JSON body, sent as `application/json`
    Json(Value),
    /// Raw bytes with an explicit encoding
    Bytes {
        /// MIME type declared for the input
        encoding: SmolStr,
        /// Payload
        data: Bytes,
    },
}

impl ProcedureInput {
    /// Serialize a typed input aggregate as a JSON body
    pub fn json<T: Serialize + ?Sized>(input: &T) -> Result<Self, EncodeError> {
        Ok(Self::Json(serde_json::to_value(input)?))
    }

    /// Raw payload with the given encoding
    pub fn bytes(encoding: impl Into<SmolStr>, data: impl Into<Bytes>) -> Self {
        Self::Bytes {
            encoding: encoding.into(),
            data: data.into(),
        }
    }

    /// The `Content-Type` this body should be sent with.
    ///
    /// Wildcard encodings (`*/*`) are sent as `application/octet-stream`.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Json(_) => Some("application/json"),
            Self::Bytes { encoding, .. } if encoding.contains('*') => {
                Some("application/octet-stream")
            }
            Self::Bytes { encoding, .. } => Some(encoding.as_str()),
        }
    }

    /// Encode the body into bytes for the wire
    pub fn into_body(self) -> Result<Vec<u8>, EncodeError> {
        match self {
            Self::Empty => Ok(Vec::new()),
            Self::Json(value) => Ok(serde_json::to_vec(&value)?),
            Self::Bytes { data, .. } => Ok(data.to_vec()),
        }
    }
}

/// Encode a typed parameter aggregate into [`Params`].
///
/// Absent optional fields and explicit nulls are dropped.
pub fn encode_params<T: Serialize + ?Sized>(params: &T) -> Result<Params, EncodeError> {
    match serde_json::to_value(params)? {
        Value::Object(map) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        Value::Null => Ok(Params::new()),
        Value::Bool(_) => Err(EncodeError::NotAnObject("a boolean")),
        Value::Number(_) => Err(EncodeError::NotAnObject("a number")),
        Value::String(_) => Err(EncodeError::NotAnObject("a string")),
        Value::Array(_) => Err(EncodeError::NotAnObject("an array")),
    }
}

/// Response returned by a transport and by generated client methods
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    /// HTTP status code
    pub status_code: u16,
    /// Decoded body, `None` when the response carried no body
    pub body: Option<T>,
    /// Response headers, names lowercased, one entry per value
    pub headers: BTreeMap<String, Vec<String>>,
}

impl<T> Response<T> {
    /// Create a response with no headers
    pub fn new(status_code: u16, body: Option<T>) -> Self {
        Self {
            status_code,
            body,
            headers: BTreeMap::new(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// First value of a header, looked up case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Transform the body, keeping status and headers
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status_code: self.status_code,
            body: self.body.map(f),
            headers: self.headers,
        }
    }
}

impl Response<Bytes> {
    /// Decode the body as JSON into `T`.
    ///
    /// A missing or empty body decodes to `body: None`.
    pub fn decode_json<T: DeserializeOwned>(self) -> XrpcResult<Response<T>> {
        let body = match self.body {
            Some(raw) if !raw.is_empty() => {
                Some(serde_json::from_slice(&raw).map_err(DecodeError::Json)?)
            }
            _ => None,
        };
        Ok(Response {
            status_code: self.status_code,
            body,
            headers: self.headers,
        })
    }

    /// Discard the body
    pub fn into_void(self) -> Response<Void> {
        Response {
            status_code: self.status_code,
            body: None,
            headers: self.headers,
        }
    }
}

/// Transport collaborator that performs XRPC calls for generated clients.
///
/// Errors produced here are returned to the caller of the generated method
/// unchanged.
#[cfg_attr(not(target_arch = "wasm32"), trait_variant::make(Send))]
pub trait XrpcTransport {
    /// Perform a query (read) call
    fn send_query(
        &self,
        method: &str,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = XrpcResult<Response<Bytes>>>;

    /// Perform a procedure (write) call
    fn send_procedure(
        &self,
        method: &str,
        params: Option<Params>,
        input: ProcedureInput,
        headers: Option<Headers>,
    ) -> impl Future<Output = XrpcResult<Response<Bytes>>>;
}

#[cfg(not(target_arch = "wasm32"))]
impl<T: XrpcTransport + Sync> XrpcTransport for Arc<T> {
    fn send_query(
        &self,
        method: &str,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = XrpcResult<Response<Bytes>>> + Send {
        self.as_ref().send_query(method, params, headers)
    }

    fn send_procedure(
        &self,
        method: &str,
        params: Option<Params>,
        input: ProcedureInput,
        headers: Option<Headers>,
    ) -> impl Future<Output = XrpcResult<Response<Bytes>>> + Send {
        self.as_ref().send_procedure(method, params, input, headers)
    }
}

#[cfg(target_arch = "wasm32")]
impl<T: XrpcTransport> XrpcTransport for Arc<T> {
    fn send_query(
        &self,
        method: &str,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = XrpcResult<Response<Bytes>>> {
        self.as_ref().send_query(method, params, headers)
    }

    fn send_procedure(
        &self,
        method: &str,
        params: Option<Params>,
        input: ProcedureInput,
        headers: Option<Headers>,
    ) -> impl Future<Output = XrpcResult<Response<Bytes>>> {
        self.as_ref().send_procedure(method, params, input, headers)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl<T: XrpcTransport + Sync> XrpcTransport for &T {
    fn send_query(
        &self,
        method: &str,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = XrpcResult<Response<Bytes>>> + Send {
        (**self).send_query(method, params, headers)
    }

    fn send_procedure(
        &self,
        method: &str,
        params: Option<Params>,
        input: ProcedureInput,
        headers: Option<Headers>,
    ) -> impl Future<Output = XrpcResult<Response<Bytes>>> + Send {
        (**self).send_procedure(method, params, input, headers)
    }
}

#[cfg(target_arch = "wasm32")]
impl<T: XrpcTransport> XrpcTransport for &T {
    fn send_query(
        &self,
        method: &str,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = XrpcResult<Response<Bytes>>> {
        (**self).send_query(method, params, headers)
    }

    fn send_procedure(
        &self,
        method: &str,
        params: Option<Params>,
        input: ProcedureInput,
        headers: Option<Headers>,
    ) -> impl Future<Output = XrpcResult<Response<Bytes>>> {
        (**self).send_procedure(method, params, input, headers)
    }
}

/// Reference [`XrpcTransport`] over any [`HttpClient`].
///
/// Methods are sent to `/xrpc/<method>`. Ids of non-`main` definitions
/// (`nsid#name`) are percent-encoded into that path, where XRPC servers
/// have no route for them.
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use bobbin_common::xrpc::{HttpTransport, XrpcTransport};
///
/// let transport = HttpTransport::new(
///     reqwest::Client::new(),
///     url::Url::parse("https://public.api.bsky.app")?,
/// );
/// let resp = transport
///     .send_query("com.example.simpleQuery", None, None)
///     .await?;
/// println!("{}", resp.status_code);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport<C> {
    client: C,
    base: Url,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Create a transport sending requests to the service at `base`
    pub fn new(client: C, base: Url) -> Self {
        Self { client, base }
    }

    /// Service base URL
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Underlying HTTP client
    pub fn client(&self) -> &C {
        &self.client
    }

    fn endpoint(&self, method: &str, params: Option<&Params>) -> XrpcResult<Url> {
        let mut url = self.base.clone();
        let mut path = url.path().trim_end_matches('/').to_owned();
        path.push_str("/xrpc/");
        path.push_str(method);
        url.set_path(&path);

        let pairs = params.map(query_pairs).unwrap_or_default();
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            let qs = serde_html_form::to_string(&pairs).map_err(EncodeError::from)?;
            url.set_query(Some(&qs));
        }
        Ok(url)
    }

    fn build_request(
        &self,
        method: http::Method,
        url: &Url,
        content_type: Option<&str>,
        headers: Option<Headers>,
        body: Vec<u8>,
    ) -> XrpcResult<http::Request<Vec<u8>>> {
        let mut builder = http::Request::builder().method(method).uri(url.as_str());
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        for (name, value) in headers.iter().flatten() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .body(body)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()).into())
    }

    async fn dispatch(&self, request: http::Request<Vec<u8>>) -> XrpcResult<Response<Bytes>> {
        let http_response = self
            .client
            .send_http(request)
            .await
            .map_err(|e| TransportError::Other(Box::new(e)))?;
        process_response(http_response)
    }
}

/// Convert a raw HTTP response into a [`Response<Bytes>`].
///
/// Non-2xx statuses are turned into [`XrpcError`].
pub fn process_response(http_response: http::Response<Vec<u8>>) -> XrpcResult<Response<Bytes>> {
    let status = http_response.status().as_u16();
    let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in http_response.headers() {
        headers
            .entry(name.as_str().to_owned())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    let body = http_response.into_body();

    if !http_response_is_success(status) {
        let err = XrpcError::from_body(status, &body);
        tracing::debug!(status, error = %err.error_code, "XRPC call failed");
        return Err(ClientError::Xrpc(err));
    }

    Ok(Response {
        status_code: status,
        body: if body.is_empty() {
            None
        } else {
            Some(Bytes::from(body))
        },
        headers,
    })
}

fn http_response_is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Flatten parameters into query-string pairs; arrays repeat their key.
fn query_pairs(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    pairs.push((key.clone(), scalar_string(item)));
                }
            }
            other => pairs.push((key.clone(), scalar_string(other))),
        }
    }
    pairs
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl<C: HttpClient + Sync> XrpcTransport for HttpTransport<C> {
    async fn send_query(
        &self,
        method: &str,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> XrpcResult<Response<Bytes>> {
        let url = self.endpoint(method, params.as_ref())?;
        tracing::debug!(method, url = %url, "sending XRPC query");
        let request = self.build_request(http::Method::GET, &url, None, headers, Vec::new())?;
        self.dispatch(request).await
    }

    async fn send_procedure(
        &self,
        method: &str,
        params: Option<Params>,
        input: ProcedureInput,
        headers: Option<Headers>,
    ) -> XrpcResult<Response<Bytes>> {
        let url = self.endpoint(method, params.as_ref())?;
        tracing::debug!(method, url = %url, "sending XRPC procedure");
        let content_type = input.content_type().map(str::to_owned);
        let body = input.into_body()?;
        let request = self.build_request(
            http::Method::POST,
            &url,
            content_type.as_deref(),
            headers,
            body,
        )?;
        self.dispatch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::Mutex;

    struct MockClient {
        status: u16,
        body: Vec<u8>,
        seen: Mutex<Vec<http::Request<Vec<u8>>>>,
    }

    impl MockClient {
        fn new(status: u16, body: &[u8]) -> Self {
            Self {
                status,
                body: body.to_vec(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last_request(&self) -> http::Request<Vec<u8>> {
            self.seen.lock().unwrap().pop().expect("no request sent")
        }
    }

    impl HttpClient for MockClient {
        type Error = Infallible;

        async fn send_http(
            &self,
            request: http::Request<Vec<u8>>,
        ) -> Result<http::Response<Vec<u8>>, Self::Error> {
            self.seen.lock().unwrap().push(request);
            Ok(http::Response::builder()
                .status(self.status)
                .header("Content-Type", "application/json")
                .body(self.body.clone())
                .unwrap())
        }
    }

    #[tokio::test]
    async fn query_builds_get_with_repeated_array_keys() {
        let client = Arc::new(MockClient::new(200, br#"{"ok":true}"#));
        let transport = HttpTransport::new(client.clone(), Url::parse("https://pds/").unwrap());
        let mut params = Params::new();
        params.insert("actor".into(), Value::from("alice.test"));
        params.insert("tags".into(), serde_json::json!(["a", "b"]));
        params.insert("limit".into(), Value::from(10));

        let resp = transport
            .send_query("com.example.getProfile", Some(params), None)
            .await
            .unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.header("content-type"), Some("application/json"));

        let req = client.last_request();
        assert_eq!(req.method(), http::Method::GET);
        assert_eq!(
            req.uri().to_string(),
            "https://pds/xrpc/com.example.getProfile?actor=alice.test&limit=10&tags=a&tags=b"
        );
    }

    #[tokio::test]
    async fn no_double_slash_in_path() {
        for base in ["https://pds", "https://pds/", "https://pds/base/"] {
            let client = Arc::new(MockClient::new(200, b""));
            let transport = HttpTransport::new(client.clone(), Url::parse(base).unwrap());
            transport
                .send_query("com.example.test", None, None)
                .await
                .unwrap();
            let uri = client.last_request().uri().to_string();
            assert!(uri.contains("/xrpc/com.example.test"));
            assert!(!uri.contains("//xrpc"));
        }
    }

    #[tokio::test]
    async fn procedure_sends_json_body() {
        let client = Arc::new(MockClient::new(200, b""));
        let transport = HttpTransport::new(client.clone(), Url::parse("https://pds").unwrap());
        let input = ProcedureInput::json(&serde_json::json!({ "message": "hi" })).unwrap();
        let mut headers = Headers::new();
        headers.insert("atproto-proxy".into(), "did:web:example.com#svc".into());

        let resp = transport
            .send_procedure("com.example.createPost", None, input, Some(headers))
            .await
            .unwrap();
        assert!(resp.body.is_none());

        let req = client.last_request();
        assert_eq!(req.method(), http::Method::POST);
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(req.headers()["atproto-proxy"], "did:web:example.com#svc");
        let body: Value = serde_json::from_slice(req.body()).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "hi" }));
    }

    #[tokio::test]
    async fn wildcard_encoding_is_sent_as_octet_stream() {
        let client = Arc::new(MockClient::new(200, b""));
        let transport = HttpTransport::new(client.clone(), Url::parse("https://pds").unwrap());
        let input = ProcedureInput::bytes("*/*", vec![1u8, 2, 3]);
        transport
            .send_procedure("com.example.uploadBlob", None, input, None)
            .await
            .unwrap();

        let req = client.last_request();
        assert_eq!(req.headers()[CONTENT_TYPE], "application/octet-stream");
        assert_eq!(req.body(), &vec![1u8, 2, 3]);
    }

    #[tokio::test]
    async fn error_status_becomes_xrpc_error() {
        let client = MockClient::new(400, br#"{"error":"InvalidRequest","message":"bad actor"}"#);
        let transport = HttpTransport::new(client, Url::parse("https://pds").unwrap());
        let err = transport
            .send_query("com.example.getProfile", None, None)
            .await
            .unwrap_err();
        let xrpc = err.as_xrpc().expect("xrpc error");
        assert_eq!(xrpc.status_code, 400);
        assert_eq!(xrpc.error_code, "InvalidRequest");
        assert_eq!(xrpc.message, "bad actor");
    }

    #[test]
    fn decode_json_empty_body_is_none() {
        let resp: Response<Bytes> = Response::new(200, Some(Bytes::new()));
        let decoded = resp.decode_json::<Value>().unwrap();
        assert_eq!(decoded.status_code, 200);
        assert!(decoded.body.is_none());
    }

    #[test]
    fn decode_json_reports_bad_body() {
        let resp: Response<Bytes> = Response::new(200, Some(Bytes::from_static(b"{not json")));
        assert!(matches!(
            resp.decode_json::<Value>(),
            Err(ClientError::Decode(DecodeError::Json(_)))
        ));
    }

    #[test]
    fn encode_params_drops_nulls_and_rejects_scalars() {
        #[derive(Serialize)]
        struct P {
            actor: String,
            cursor: Option<String>,
        }
        let params = encode_params(&P {
            actor: "alice.test".into(),
            cursor: None,
        })
        .unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params["actor"], "alice.test");

        assert!(matches!(
            encode_params(&5),
            Err(EncodeError::NotAnObject("a number"))
        ));
    }
}
