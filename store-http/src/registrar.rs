//! Route registration
//!
//! A store's public URL (`/people/:id`) yields two paths:
//!
//! - the base path `/people/` serving `GET` (getQuery) and `POST` (post)
//! - the id path `/people/:id` serving `GET` (get), `PUT` (put) and `DELETE` (delete)
//!
//! Each route runs the pre hook, the handler and the post hook in order;
//! forwarded errors go to the error pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use store_http::prelude::*;
//!
//! let store = MemoryStore::new(StoreDescriptor::new("people", "/people/:id"));
//! let app = RouteRegistrar::new(Arc::new(store))?.into_router();
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, OriginalUri, Path, Request},
    http::{request::Parts, StatusCode},
    response::Response,
    routing::{on, MethodFilter, MethodRouter},
    RequestPartsExt, Router,
};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::handler::{HandlerFactory, RequestHandler};
use crate::hooks::{
    DefaultErrorPipeline, ErrorPipeline, PassThrough, PostHook, PreHook, PreHookOutcome,
};
use crate::operation::Operation;
use crate::request::{HttpInput, Session};
use crate::store::Store;

/// Trailing `:token` naming the id segment
static ID_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\w+$").expect("id token regex is valid"));

/// Any `:token` segment, rewritten to axum's `{token}` form
static PATH_PARAM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\w+)").expect("path param regex is valid"));

/// Paths derived from a store's public URL, in `:token` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePaths {
    /// Collection path, e.g. `/people/`
    pub base_path: String,
    /// Item path, e.g. `/people/:id`
    pub id_path: String,
}

impl RoutePaths {
    /// Derive the paths from a public URL
    pub fn from_public_url(public_url: &str) -> Result<Self> {
        let token = ID_TOKEN_REGEX
            .find(public_url)
            .ok_or_else(|| Error::InvalidPublicUrl(public_url.to_string()))?;

        let base_path = &public_url[..token.start()];
        if !base_path.starts_with('/') {
            return Err(Error::InvalidPublicUrl(public_url.to_string()));
        }

        Ok(Self {
            base_path: base_path.to_string(),
            id_path: format!("{base_path}{}", token.as_str()),
        })
    }
}

/// Rewrite `:name` segments into axum's `{name}` syntax
fn axum_path(path: &str) -> String {
    PATH_PARAM_REGEX.replace_all(path, "{$1}").into_owned()
}

/// Mounts a store's five operations on a router
pub struct RouteRegistrar {
    factory: HandlerFactory,
    paths: RoutePaths,
    name: String,
    pre_hook: Arc<dyn PreHook>,
    post_hook: Arc<dyn PostHook>,
    error_pipeline: Arc<dyn ErrorPipeline>,
}

impl RouteRegistrar {
    /// Create a registrar, validating the store's public URL
    pub fn new(store: Arc<dyn Store>) -> Result<Self> {
        let descriptor = store.descriptor();
        let public_url = descriptor
            .public_url
            .as_deref()
            .ok_or(Error::MissingPublicUrl)?;
        let paths = RoutePaths::from_public_url(public_url)?;
        let name = descriptor.name.clone();

        Ok(Self {
            factory: HandlerFactory::new(store),
            paths,
            name,
            pre_hook: Arc::new(PassThrough),
            post_hook: Arc::new(PassThrough),
            error_pipeline: Arc::new(DefaultErrorPipeline),
        })
    }

    /// Run a hook before every handler
    #[must_use]
    pub fn with_pre_hook(mut self, hook: impl PreHook + 'static) -> Self {
        self.pre_hook = Arc::new(hook);
        self
    }

    /// Run a hook after every handler response
    #[must_use]
    pub fn with_post_hook(mut self, hook: impl PostHook + 'static) -> Self {
        self.post_hook = Arc::new(hook);
        self
    }

    /// Render forwarded errors with a custom pipeline
    #[must_use]
    pub fn with_error_pipeline(mut self, pipeline: impl ErrorPipeline + 'static) -> Self {
        self.error_pipeline = Arc::new(pipeline);
        self
    }

    /// The derived paths
    #[must_use]
    pub fn paths(&self) -> &RoutePaths {
        &self.paths
    }

    /// Add this store's routes to a router
    pub fn register<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let base_path = axum_path(&self.paths.base_path);
        let id_path = axum_path(&self.paths.id_path);

        info!(
            store = %self.name,
            base_path = %base_path,
            id_path = %id_path,
            "Registering store routes"
        );

        // Nested URLs (`/workspaces/:workspaceId/users/`) carry params on the base path too
        let base_params = PATH_PARAM_REGEX.is_match(&self.paths.base_path);

        let mut base_routes = MethodRouter::new();
        let mut id_routes = MethodRouter::new();
        for operation in Operation::ALL {
            if operation.targets_item() {
                id_routes = id_routes.merge(self.endpoint(operation, true));
            } else {
                base_routes = base_routes.merge(self.endpoint(operation, base_params));
            }
        }

        router
            .route(&base_path, base_routes)
            .route(&id_path, id_routes)
    }

    /// A fresh router holding only this store's routes
    pub fn into_router(self) -> Router {
        self.register(Router::new())
    }

    fn endpoint<S>(&self, operation: Operation, has_params: bool) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let route = Arc::new(Route {
            handler: self.factory.handler(operation),
            has_params,
            pre_hook: Arc::clone(&self.pre_hook),
            post_hook: Arc::clone(&self.post_hook),
            error_pipeline: Arc::clone(&self.error_pipeline),
        });

        debug!(method = %operation.method(), %operation, "Mounting handler");

        let filter = match operation {
            Operation::Get | Operation::GetQuery => MethodFilter::GET,
            Operation::Put => MethodFilter::PUT,
            Operation::Post => MethodFilter::POST,
            Operation::Delete => MethodFilter::DELETE,
        };

        on(filter, move |request: Request| {
            let route = Arc::clone(&route);
            async move { route.serve(request).await }
        })
    }
}

/// One registered route: hooks around a handler
struct Route {
    handler: RequestHandler,
    has_params: bool,
    pre_hook: Arc<dyn PreHook>,
    post_hook: Arc<dyn PostHook>,
    error_pipeline: Arc<dyn ErrorPipeline>,
}

impl Route {
    async fn serve(&self, request: Request) -> Response {
        let operation = self.handler.operation();
        let (mut parts, body) = request.into_parts();

        // Nested routers strip their prefix from the URI; keep what the client sent
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.clone(), |original| original.0.clone());

        let mut input = HttpInput {
            uri,
            headers: parts.headers.clone(),
            params: BTreeMap::new(),
            body: None,
            session: parts.extensions.remove::<Session>(),
        };

        // Path params and the body are only decoded once the hook lets the request through
        if let PreHookOutcome::Respond(response) = self.pre_hook.before(operation, &mut input).await
        {
            return response;
        }

        if let Err(error) = self.decode(parts, body, &mut input).await {
            return self.error_pipeline.handle(operation, error.into()).await;
        }

        match self.handler.handle(input).await {
            Ok(mut response) => {
                self.post_hook.after(operation, &mut response).await;
                response
            }
            Err(error) => self.error_pipeline.handle(operation, error).await,
        }
    }

    /// Fill in path params and the JSON body, keeping anything the pre hook set
    async fn decode(&self, mut parts: Parts, body: Body, input: &mut HttpInput) -> Result<()> {
        if self.has_params {
            let Path(params) = parts
                .extract::<Path<HashMap<String, String>>>()
                .await
                .map_err(|rejection| Error::BadRequest(rejection.body_text()))?;
            for (name, value) in params {
                input.params.entry(name).or_insert(value);
            }
        }

        if input.body.is_some() {
            return Ok(());
        }

        // The extractor honours `DefaultBodyLimit`
        let bytes = Bytes::from_request(Request::from_parts(parts, body), &())
            .await
            .map_err(|rejection| {
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    Error::PayloadTooLarge(rejection.body_text())
                } else {
                    let reason = rejection.body_text();
                    Error::BadRequest(format!("Failed to read request body: {reason}"))
                }
            })?;

        if !bytes.is_empty() {
            let value = serde_json::from_slice::<Value>(&bytes)
                .map_err(|e| Error::BadRequest(format!("Request body is not valid JSON: {e}")))?;
            input.body = Some(value);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_public_url() {
        let paths = RoutePaths::from_public_url("/people/:id").unwrap();
        assert_eq!(paths.base_path, "/people/");
        assert_eq!(paths.id_path, "/people/:id");
    }

    #[test]
    fn test_nested_public_url() {
        let paths = RoutePaths::from_public_url("/workspaces/:workspaceId/users/:id").unwrap();
        assert_eq!(paths.base_path, "/workspaces/:workspaceId/users/");
        assert_eq!(
            axum_path(&paths.id_path),
            "/workspaces/{workspaceId}/users/{id}"
        );
        assert_eq!(axum_path(&paths.base_path), "/workspaces/{workspaceId}/users/");
    }

    #[test]
    fn test_public_url_without_token() {
        assert!(matches!(
            RoutePaths::from_public_url("/people"),
            Err(Error::InvalidPublicUrl(ref url)) if url == "/people"
        ));
        assert!(matches!(
            RoutePaths::from_public_url("/people/:"),
            Err(Error::InvalidPublicUrl(_))
        ));
        assert!(matches!(
            RoutePaths::from_public_url(":id"),
            Err(Error::InvalidPublicUrl(_))
        ));
    }
}
