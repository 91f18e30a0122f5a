//! Mapping operation outcomes to HTTP responses
//!
//! | operation | status | extra headers                              |
//! |-----------|--------|--------------------------------------------|
//! | get       | 200    |                                            |
//! | getQuery  | 200    | `Content-Range` when a range was requested |
//! | put       | 201    | `Location` (request URL) if get is handled |
//! | post      | 201    | `Location` (URL + new id) if get is handled |
//! | delete    | 200    |                                            |
//!
//! Bodies are always JSON, encoded exactly once.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::operation::Operation;
use crate::options::Options;
use crate::request::CanonicalRequest;
use crate::store::{OperationError, QueryOutcome, Store, StoreDescriptor};

/// What a store operation produced
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    /// A single record (get, put, post, delete)
    Record(Value),
    /// A page of records (getQuery)
    Query(QueryOutcome),
}

impl OperationOutput {
    fn into_body(self) -> Value {
        match self {
            Self::Record(record) => record,
            Self::Query(outcome) => Value::Array(outcome.records),
        }
    }
}

/// Build the success response for an operation
pub fn format_success(
    descriptor: &StoreDescriptor,
    request: &CanonicalRequest,
    output: OperationOutput,
) -> Response {
    let operation = request.operation;
    let mut location = None;
    let mut content_range = None;

    let status = match operation {
        Operation::Post => {
            if descriptor.handles.get {
                location = match &output {
                    OperationOutput::Record(record) => record
                        .get(&descriptor.id_field)
                        .map(|id| format!("{}{}", request.http.url(), id_string(id))),
                    OperationOutput::Query(_) => None,
                };
            }
            StatusCode::CREATED
        }
        Operation::Put => {
            if descriptor.handles.get {
                location = Some(request.http.url());
            }
            StatusCode::CREATED
        }
        Operation::GetQuery => {
            if let OperationOutput::Query(outcome) = &output {
                content_range = content_range_header(&request.options, outcome);
            }
            StatusCode::OK
        }
        Operation::Get | Operation::Delete => StatusCode::OK,
    };

    let mut response = (status, Json(output.into_body())).into_response();
    let headers = response.headers_mut();

    if let Some(value) = location.and_then(|l| HeaderValue::from_str(&l).ok()) {
        headers.insert(header::LOCATION, value);
    }
    if let Some(value) = content_range.and_then(|r| HeaderValue::from_str(&r).ok()) {
        headers.insert(header::CONTENT_RANGE, value);
    }

    response
}

/// Build a direct error response using the store's error formatter
pub fn format_error(store: &dyn Store, error: &OperationError) -> Response {
    (error.status_code(), Json(store.format_error(error))).into_response()
}

/// `items <from>-<to>/<total>` for a ranged query with a known total
///
/// An empty page reports `items 0-0/<total>`.
#[must_use]
pub fn content_range_header(options: &Options, outcome: &QueryOutcome) -> Option<String> {
    if !options.has_range() {
        return None;
    }
    let grand_total = outcome.grand_total?;
    let total = outcome.total();

    let (from, to) = if total == 0 {
        (0, 0)
    } else {
        let from = options.skip();
        (from, from.saturating_add(total - 1))
    };

    Some(format!("items {from}-{to}/{grand_total}"))
}

fn id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
