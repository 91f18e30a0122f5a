//! Per-operation request handlers
//!
//! A [`RequestHandler`] serves one operation of one store:
//!
//! 1. normalize the body into a record
//! 2. build the [`CanonicalRequest`]
//! 3. assemble options (a parse failure is forwarded, never sent directly)
//! 4. wait out the store's artificial delay, if any
//! 5. call the store
//! 6. format the result, or log and route the store error per its chain mode

use std::sync::Arc;

use axum::response::Response;
use tracing::{debug, instrument};

use crate::chain::ErrorRoute;
use crate::error::{ForwardedError, Result};
use crate::operation::Operation;
use crate::options::{assemble_options, QueryParams};
use crate::request::{normalize_body, CanonicalRequest, HttpContext, HttpInput};
use crate::response::{format_error, format_success, OperationOutput};
use crate::store::Store;

/// Builds handlers bound to one store
#[derive(Clone)]
pub struct HandlerFactory {
    store: Arc<dyn Store>,
}

impl HandlerFactory {
    /// Create a factory for a store
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Handler for an operation named by its wire name (`get`, `getQuery`...)
    ///
    /// Unknown names fail here, at construction time.
    pub fn make_handler(&self, operation: &str) -> Result<RequestHandler> {
        let operation: Operation = operation.parse()?;
        Ok(self.handler(operation))
    }

    /// Handler for an operation
    pub fn handler(&self, operation: Operation) -> RequestHandler {
        RequestHandler {
            operation,
            store: Arc::clone(&self.store),
        }
    }
}

/// Serves a single operation against a store
#[derive(Clone)]
pub struct RequestHandler {
    operation: Operation,
    store: Arc<dyn Store>,
}

impl RequestHandler {
    /// The operation this handler serves
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Serve one request
    ///
    /// `Ok` is a response to send as is (success or a direct error);
    /// `Err` is an error for the router's error pipeline.
    #[instrument(
        skip_all,
        fields(store = %self.store.descriptor().name, operation = %self.operation)
    )]
    pub async fn handle(&self, input: HttpInput) -> std::result::Result<Response, ForwardedError> {
        let descriptor = self.store.descriptor();
        let HttpInput {
            uri,
            headers,
            params,
            body,
            session,
        } = input;

        let body = normalize_body(body)?;
        let query = QueryParams::from_uri(&uri)?;

        let mut request = CanonicalRequest::new(self.operation, HttpContext { uri, headers });
        request.params = params;
        request.body = body;
        request.session = session;
        request.options =
            assemble_options(self.operation, &request.http.headers, &query, descriptor)?;

        if !descriptor.artificial_delay.is_zero() {
            debug!(delay = ?descriptor.artificial_delay, "Applying artificial delay");
            tokio::time::sleep(descriptor.artificial_delay).await;
        }

        let result = match self.operation {
            Operation::Get => self.store.get(&request).await.map(OperationOutput::Record),
            Operation::GetQuery => self
                .store
                .get_query(&request)
                .await
                .map(OperationOutput::Query),
            Operation::Put => self.store.put(&request).await.map(OperationOutput::Record),
            Operation::Post => self.store.post(&request).await.map(OperationOutput::Record),
            Operation::Delete => self
                .store
                .delete(&request)
                .await
                .map(OperationOutput::Record),
        };

        match result {
            Ok(output) => Ok(format_success(descriptor, &request, output)),
            Err(error) => {
                self.store.log_error(&request, &error);
                match descriptor.chain_errors.route(&error) {
                    ErrorRoute::Respond => Ok(format_error(self.store.as_ref(), &error)),
                    ErrorRoute::Forward => {
                        debug!(status = ?error.status, "Forwarding store error");
                        Err(ForwardedError::Store(error))
                    }
                }
            }
        }
    }
}
