//! # store-http
//!
//! HTTP adapter exposing a CRUD-plus-query store as a REST resource.
//!
//! A [`Store`](store::Store) offers five operations (get, getQuery, put, post,
//! delete). This crate maps them onto HTTP:
//!
//! | method   | path          | operation |
//! |----------|---------------|-----------|
//! | `GET`    | `/people/:id` | get       |
//! | `GET`    | `/people/`    | getQuery  |
//! | `PUT`    | `/people/:id` | put       |
//! | `POST`   | `/people/`    | post      |
//! | `DELETE` | `/people/:id` | delete    |
//!
//! Query strings and headers (`sortBy`, `Range`, `If-Match`, `If-None-Match`,
//! `Placement`) become canonical [`Options`](options::Options); results become
//! JSON responses with `Location` and `Content-Range` where they apply.
//! Store errors are either written directly or forwarded to an error
//! pipeline, per the store's [`ChainMode`](chain::ChainMode).
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use store_http::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let descriptor = StoreDescriptor::from_config("people", "/people/:id", &config.http)
//!         .with_sortable_fields(["name", "surname"]);
//!     let store = Arc::new(MemoryStore::new(descriptor));
//!
//!     let app = RouteRegistrar::new(store)?.into_router();
//!
//!     Server::new(config).serve(app).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod handler;
pub mod hooks;
pub mod observability;
pub mod operation;
pub mod options;
pub mod registrar;
pub mod request;
pub mod response;
#[cfg(feature = "server")]
pub mod server;
pub mod store;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::chain::{ChainMode, ErrorRoute};
    pub use crate::config::{Config, HttpConfig, ServiceConfig};
    pub use crate::error::{Error, ErrorResponse, ForwardedError, Result};
    pub use crate::handler::{HandlerFactory, RequestHandler};
    pub use crate::hooks::{
        DefaultErrorPipeline, ErrorPipeline, PassThrough, PostHook, PreHook, PreHookOutcome,
    };
    pub use crate::observability::init_tracing;
    pub use crate::operation::Operation;
    pub use crate::options::{
        Conditions, Options, Placement, PlacementMode, Range, SortDirection, SortSpec,
    };
    pub use crate::registrar::{RoutePaths, RouteRegistrar};
    pub use crate::request::{CanonicalRequest, HttpContext, HttpInput, Protocol, Record, Session};
    pub use crate::response::OperationOutput;
    #[cfg(feature = "server")]
    pub use crate::server::Server;
    #[cfg(feature = "memory-store")]
    pub use crate::store::MemoryStore;
    pub use crate::store::{
        FieldError, HandledOperations, OperationError, QueryOutcome, Store, StoreDescriptor,
    };

    pub use async_trait::async_trait;
    pub use axum::{
        response::{IntoResponse, Response},
        Router,
    };
    pub use serde_json::{json, Value};
}
