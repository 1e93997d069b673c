//! Per-request state consumed by every chain unit.
//!
//! A [`RequestContext`] is populated once per inbound request by an external
//! HTTP-adaptation layer (wire parsing is outside this crate) and destroyed
//! when the response completes. It is exclusively owned by one in-flight
//! dispatch; nothing here is shared across requests.

use crate::matcher::PathParams;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::collections::HashMap;
use tracing::debug;

/// A file received with the request, as handed over by the adaptation layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    filename: String,
    content_type: Option<mime::Mime>,
    data: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: Option<mime::Mime>, data: Bytes) -> Self {
        Self { filename: filename.into(), content_type, data }
    }

    /// The client-supplied file name.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.content_type.as_ref()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// Read surface of one inbound request plus the parameters bound by the
/// current route attempt.
///
/// Everything is read-only from the engine's perspective except parameter
/// injection after a structural match: the dispatch loop binds a fresh
/// [`PathParams`] per attempt and discards it when the attempt declines.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    body_data: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
    headers: HeaderMap,
    env: HashMap<String, String>,
    args: Vec<String>,
    raw_body: Bytes,
    params: PathParams,
}

impl RequestContext {
    /// Starts building a context; the builder is meant to be driven by the
    /// adaptation layer that owns the raw request.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Gets a decoded query-string value.
    pub fn query(&self, name: impl AsRef<str>) -> Option<&str> {
        self.query.get(name.as_ref()).map(String::as_str)
    }

    pub fn query_map(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Gets a decoded form-body field. Populated only when the request
    /// carried a urlencoded body.
    pub fn form(&self, name: impl AsRef<str>) -> Option<&str> {
        self.body_data.get(name.as_ref()).map(String::as_str)
    }

    pub fn form_map(&self) -> &HashMap<String, String> {
        &self.body_data
    }

    pub fn file(&self, field: impl AsRef<str>) -> Option<&UploadedFile> {
        self.files.get(field.as_ref())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a raw environment value from the adaptation layer
    /// (e.g. `REMOTE_ADDR`).
    pub fn env(&self, name: impl AsRef<str>) -> Option<&str> {
        self.env.get(name.as_ref()).map(String::as_str)
    }

    /// Positional argument tokens for command-line routed invocations.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    /// Parameters bound by the current route attempt.
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Shorthand for [`PathParams::get`] on the bound parameters.
    pub fn param(&self, name: impl AsRef<str>) -> Option<&str> {
        self.params.get(name)
    }

    pub(crate) fn bind_params(&mut self, params: PathParams) {
        self.params = params;
    }

    pub(crate) fn clear_params(&mut self) {
        self.params = PathParams::empty();
    }

    pub(crate) fn push_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.push(Some(name.into()), value.into());
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    raw_query: Option<String>,
    files: HashMap<String, UploadedFile>,
    headers: HeaderMap,
    env: HashMap<String, String>,
    args: Vec<String>,
    raw_body: Bytes,
}

impl RequestBuilder {
    fn new() -> Self {
        Self { method: Method::GET, path: "/".to_owned(), ..Self::default() }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Raw query string, without the leading `?`. Decoded at build time.
    pub fn query(mut self, raw: impl Into<String>) -> Self {
        self.raw_query = Some(raw.into());
        self
    }

    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        let name: Result<HeaderName, http::Error> = <HeaderName as TryFrom<K>>::try_from(name).map_err(Into::into);
        let value: Result<HeaderValue, http::Error> = <HeaderValue as TryFrom<V>>::try_from(value).map_err(Into::into);
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            (name, value) => {
                debug!(name_ok = name.is_ok(), value_ok = value.is_ok(), "dropped invalid header");
            }
        }
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    pub fn arg(mut self, token: impl Into<String>) -> Self {
        self.args.push(token.into());
        self
    }

    pub fn args<I, T>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.args.extend(tokens.into_iter().map(Into::into));
        self
    }

    pub fn file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(field.into(), file);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.raw_body = body.into();
        self
    }

    /// Finalizes the context, decoding the query string and, when the
    /// content type says so, the urlencoded body.
    pub fn build(self) -> RequestContext {
        let query = self.raw_query.as_deref().map(decode_urlencoded).unwrap_or_default();

        let body_data = if is_form_content_type(&self.headers) {
            match std::str::from_utf8(&self.raw_body) {
                Ok(text) => decode_urlencoded(text),
                Err(_) => {
                    debug!("form body is not valid utf-8, skipping decode");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        RequestContext {
            method: self.method,
            path: self.path,
            query,
            body_data,
            files: self.files,
            headers: self.headers,
            env: self.env,
            args: self.args,
            raw_body: self.raw_body,
            params: PathParams::empty(),
        }
    }
}

fn decode_urlencoded(raw: &str) -> HashMap<String, String> {
    match serde_urlencoded::from_str::<Vec<(String, String)>>(raw) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(cause) => {
            debug!(%cause, "failed to decode urlencoded data");
            HashMap::new()
        }
    }
}

fn is_form_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
}
