//! Request representations
//!
//! [`HttpInput`] is what a handler receives from the router: URI, headers,
//! path parameters and an optional decoded body. The handler turns it into a
//! [`CanonicalRequest`], the protocol-neutral value a [`Store`](crate::store::Store)
//! sees.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Uri};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::options::Options;

/// A JSON object record
pub type Record = Map<String, Value>;

/// Protocol a request arrived through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Plain HTTP
    Http,
}

/// Opaque session data
///
/// Insert it into the request extensions (from an auth or session layer) and
/// it is passed through to the store untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Session(pub Value);

/// Transport details kept alongside a canonical request
///
/// The response formatter needs the request URL to build `Location` headers.
#[derive(Debug, Clone, Default)]
pub struct HttpContext {
    /// Request URI as the client sent it
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
}

impl HttpContext {
    /// The request URL without its query string
    #[must_use]
    pub fn url(&self) -> String {
        match (self.uri.scheme_str(), self.uri.authority()) {
            (Some(scheme), Some(authority)) => {
                format!("{scheme}://{authority}{}", self.uri.path())
            }
            _ => self.uri.path().to_string(),
        }
    }
}

/// Raw input handed to a [`RequestHandler`](crate::handler::RequestHandler)
#[derive(Debug, Clone, Default)]
pub struct HttpInput {
    /// Request URI
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Path parameters matched by the router
    pub params: BTreeMap<String, String>,
    /// Decoded JSON body, if any
    pub body: Option<Value>,
    /// Session data, if any
    pub session: Option<Session>,
}

impl HttpInput {
    /// Create an input for a URI
    pub fn new(uri: Uri) -> Self {
        Self {
            uri,
            ..Self::default()
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a path parameter
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the session
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }
}

/// Turn an optional body into a record
///
/// A missing body or JSON `null` becomes an empty record; anything other than
/// a JSON object is rejected.
pub fn normalize_body(body: Option<Value>) -> Result<Record> {
    match body {
        None | Some(Value::Null) => Ok(Record::new()),
        Some(Value::Object(record)) => Ok(record),
        Some(_) => Err(Error::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// Protocol-neutral request handed to a store
#[derive(Debug, Clone)]
pub struct CanonicalRequest {
    /// Whether the request came from a remote client
    pub remote: bool,
    /// Protocol tag
    pub protocol: Protocol,
    /// Operation being served
    pub operation: Operation,
    /// Path parameters
    pub params: BTreeMap<String, String>,
    /// Request body
    pub body: Record,
    /// Session data
    pub session: Option<Session>,
    /// Parsed options
    pub options: Options,
    /// Transport details
    pub http: HttpContext,
}

impl CanonicalRequest {
    /// Create a remote HTTP request with empty params, body and options
    pub fn new(operation: Operation, http: HttpContext) -> Self {
        Self {
            remote: true,
            protocol: Protocol::Http,
            operation,
            params: BTreeMap::new(),
            body: Record::new(),
            session: None,
            options: Options::default(),
            http,
        }
    }

    /// Add a path parameter
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: Record) -> Self {
        self.body = body;
        self
    }

    /// Set the options
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// A path parameter by name
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}
