//! Buffered per-request response state.
//!
//! The body is accumulated in memory and only emitted atomically once the
//! dispatch is over: an outer recovery layer can discard a half-written
//! attempt with [`ResponseContext::reset`] and the transport never sees
//! partial output mixed with a later error page.

use crate::flow::Flow;
use bytes::Bytes;
use http::{HeaderName, HeaderValue, Response, StatusCode};
use std::fmt::Write as _;
use tracing::debug;

/// Write surface of the response being assembled for one request.
///
/// Status starts unset; a finished response without an explicit status is
/// emitted as `200 OK`. Headers and cookies are queued and only applied to
/// the wire-level response in [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct ResponseContext {
    status: Option<StatusCode>,
    body: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    cookies: Vec<Cookie>,
    finalized: bool,
}

impl ResponseContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The status set so far, `None` while unset.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        if self.finalized {
            debug!("status change after end() ignored");
            return;
        }
        self.status = Some(status);
    }

    /// Appends to the body buffer. Writes after [`end`](Self::end) are
    /// ignored.
    pub fn write(&mut self, chunk: impl AsRef<str>) {
        if self.finalized {
            debug!("body write after end() ignored");
            return;
        }
        self.body.push_str(chunk.as_ref());
    }

    /// The body accumulated so far.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Queues a header for the finished response.
    pub fn header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.finalized {
            debug!(header = %name, "header after end() ignored");
            return;
        }
        self.headers.push((name, value));
    }

    /// Queues a cookie for the finished response.
    pub fn cookie(&mut self, cookie: Cookie) {
        if self.finalized {
            debug!(cookie = %cookie.name, "cookie after end() ignored");
            return;
        }
        self.cookies.push(cookie);
    }

    /// Marks the response final and returns the halt signal.
    ///
    /// The caller must return the signal up its chain:
    ///
    /// ```
    /// # use routeflow::{FlowResult, ResponseContext};
    /// # fn unit(res: &mut ResponseContext) -> FlowResult {
    /// res.write("done");
    /// return Ok(res.end());
    /// # }
    /// ```
    ///
    /// Everything written after this point is ignored, and no downstream
    /// or upstream post-`next` work runs once the signal propagates.
    #[must_use = "return the halt signal up the chain, or the dispatch keeps running"]
    pub fn end(&mut self) -> Flow {
        self.finalized = true;
        Flow::Halt
    }

    /// Sets a redirect status (302 unless one was already set), queues the
    /// `Location` header and halts.
    #[must_use = "return the halt signal up the chain, or the dispatch keeps running"]
    pub fn redirect(&mut self, location: &str) -> Flow {
        if self.finalized {
            debug!("redirect after end() ignored");
            return Flow::Halt;
        }
        if self.status.is_none() {
            self.status = Some(StatusCode::FOUND);
        }
        match HeaderValue::try_from(location) {
            Ok(value) => self.headers.push((http::header::LOCATION, value)),
            Err(cause) => debug!(%cause, "redirect location is not a valid header value"),
        }
        self.end()
    }

    /// True once [`end`](Self::end) has been invoked.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Discards all partial state, leaving the context as freshly created.
    ///
    /// The rollback hook for an outer layer recovering from a handler
    /// fault.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Atomically snapshots the buffered state into a wire-level response
    /// for the sending layer.
    pub fn finish(self) -> Response<Bytes> {
        let mut builder = Response::builder().status(self.status.unwrap_or(StatusCode::OK));

        if let Some(headers) = builder.headers_mut() {
            headers.reserve(self.headers.len() + self.cookies.len());
            for (name, value) in self.headers {
                headers.append(name, value);
            }
            for cookie in &self.cookies {
                match HeaderValue::try_from(cookie.render()) {
                    Ok(value) => {
                        headers.append(http::header::SET_COOKIE, value);
                    }
                    Err(cause) => debug!(cookie = %cookie.name, %cause, "dropped unrenderable cookie"),
                }
            }
        }

        // infallible: status and all header values were validated above
        builder.body(Bytes::from(self.body)).unwrap_or_default()
    }
}

/// A pending `Set-Cookie` entry.
#[derive(Debug, Clone)]
pub struct Cookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    max_age: Option<u64>,
    secure: bool,
    http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
            secure: false,
            http_only: false,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Lifetime in seconds.
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn render(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(path) = &self.path {
            let _ = write!(out, "; Path={path}");
        }
        if let Some(domain) = &self.domain {
            let _ = write!(out, "; Domain={domain}");
        }
        if let Some(max_age) = self.max_age {
            let _ = write!(out, "; Max-Age={max_age}");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }
}
