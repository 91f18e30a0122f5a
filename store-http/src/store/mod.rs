//! Backing store capability interface
//!
//! The adapter never persists, validates or authorizes anything itself. It
//! talks to a [`Store`]: an object exposing the five operations, the metadata
//! in its [`StoreDescriptor`], and two hooks (error logging and error body
//! formatting).
//!
//! # Example
//!
//! ```rust,ignore
//! use store_http::store::{OperationError, QueryOutcome, Store, StoreDescriptor};
//! use store_http::request::CanonicalRequest;
//! use serde_json::Value;
//!
//! struct People {
//!     descriptor: StoreDescriptor,
//! }
//!
//! #[async_trait::async_trait]
//! impl Store for People {
//!     fn descriptor(&self) -> &StoreDescriptor {
//!         &self.descriptor
//!     }
//!
//!     async fn get(&self, request: &CanonicalRequest) -> Result<Value, OperationError> {
//!         // look up request.params["id"]
//!         todo!()
//!     }
//!
//!     // ... get_query, put, post, delete
//! }
//! ```

mod error;
#[cfg(feature = "memory-store")]
mod memory;

pub use error::{FieldError, OperationError};
#[cfg(feature = "memory-store")]
pub use memory::MemoryStore;

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::chain::ChainMode;
use crate::config::HttpConfig;
use crate::operation::Operation;
use crate::options::SortSpec;
use crate::request::CanonicalRequest;

/// Default page size when neither config nor store sets one
pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Which operations a store offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandledOperations {
    /// Single record retrieval
    pub get: bool,
    /// Collection queries
    pub get_query: bool,
    /// Create-or-replace by id
    pub put: bool,
    /// Create in collection
    pub post: bool,
    /// Delete by id
    pub delete: bool,
}

impl Default for HandledOperations {
    fn default() -> Self {
        Self {
            get: true,
            get_query: true,
            put: true,
            post: true,
            delete: true,
        }
    }
}

impl HandledOperations {
    /// Whether an operation is offered
    #[must_use]
    pub const fn handles(&self, operation: Operation) -> bool {
        match operation {
            Operation::Get => self.get,
            Operation::GetQuery => self.get_query,
            Operation::Put => self.put,
            Operation::Post => self.post,
            Operation::Delete => self.delete,
        }
    }

    /// Disable one operation
    #[must_use]
    pub fn without(mut self, operation: Operation) -> Self {
        match operation {
            Operation::Get => self.get = false,
            Operation::GetQuery => self.get_query = false,
            Operation::Put => self.put = false,
            Operation::Post => self.post = false,
            Operation::Delete => self.delete = false,
        }
        self
    }
}

/// Read-only description of a store
///
/// Built once per store instance. Deriving a new descriptor with struct
/// update syntax (`..base.clone()`) carries every setting over, including
/// the chain mode.
#[derive(Debug, Clone)]
pub struct StoreDescriptor {
    /// Store name, used in logs
    pub name: String,
    /// Field holding a record's id
    pub id_field: String,
    /// Fields a query may sort on
    pub sortable_fields: BTreeSet<String>,
    /// Sort applied when a request doesn't specify one
    pub default_sort: Option<SortSpec>,
    /// Page size for queries without a usable `Range` header
    pub default_page_limit: u64,
    /// Remove queried records once returned
    pub delete_after_get_query: bool,
    /// Public URL pattern, ending in the `:id` token
    pub public_url: Option<String>,
    /// How errors are routed
    pub chain_errors: ChainMode,
    /// Which operations are offered
    pub handles: HandledOperations,
    /// Delay before each store call (zero disables it)
    pub artificial_delay: Duration,
}

impl StoreDescriptor {
    /// Create a descriptor with defaults for everything but name and URL
    pub fn new(name: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_field: "id".to_string(),
            sortable_fields: BTreeSet::new(),
            default_sort: None,
            default_page_limit: DEFAULT_PAGE_LIMIT,
            delete_after_get_query: false,
            public_url: Some(public_url.into()),
            chain_errors: ChainMode::default(),
            handles: HandledOperations::default(),
            artificial_delay: Duration::ZERO,
        }
    }

    /// Create a descriptor seeded from the service's HTTP configuration
    pub fn from_config(
        name: impl Into<String>,
        public_url: impl Into<String>,
        config: &HttpConfig,
    ) -> Self {
        Self::new(name, public_url)
            .with_default_page_limit(config.default_page_limit)
            .with_chain_errors(config.chain_errors)
            .with_artificial_delay(config.artificial_delay())
    }

    /// Set the id field
    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Set the sortable fields
    #[must_use]
    pub fn with_sortable_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sortable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the default sort
    #[must_use]
    pub fn with_default_sort(mut self, sort: SortSpec) -> Self {
        self.default_sort = Some(sort);
        self
    }

    /// Set the default page size
    #[must_use]
    pub fn with_default_page_limit(mut self, limit: u64) -> Self {
        self.default_page_limit = limit;
        self
    }

    /// Remove queried records after returning them
    #[must_use]
    pub fn with_delete_after_get_query(mut self, enabled: bool) -> Self {
        self.delete_after_get_query = enabled;
        self
    }

    /// Set the error chain mode
    #[must_use]
    pub fn with_chain_errors(mut self, mode: ChainMode) -> Self {
        self.chain_errors = mode;
        self
    }

    /// Set the offered operations
    #[must_use]
    pub fn with_handles(mut self, handles: HandledOperations) -> Self {
        self.handles = handles;
        self
    }

    /// Set the artificial delay
    #[must_use]
    pub fn with_artificial_delay(mut self, delay: Duration) -> Self {
        self.artificial_delay = delay;
        self
    }

    /// Drop the public URL; such a store can't be registered on a router
    #[must_use]
    pub fn without_public_url(mut self) -> Self {
        self.public_url = None;
        self
    }
}

/// Result of a collection query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOutcome {
    /// Records in this page
    pub records: Vec<Value>,
    /// Matching records ignoring pagination, when the store knows it
    pub grand_total: Option<u64>,
}

impl QueryOutcome {
    /// Create a query outcome
    pub fn new(records: Vec<Value>, grand_total: Option<u64>) -> Self {
        Self {
            records,
            grand_total,
        }
    }

    /// Number of records returned by this call
    #[must_use]
    pub fn total(&self) -> u64 {
        self.records.len() as u64
    }
}

/// A CRUD-plus-query store the adapter can front
#[async_trait]
pub trait Store: Send + Sync {
    /// Static description of the store
    fn descriptor(&self) -> &StoreDescriptor;

    /// Fetch one record
    async fn get(&self, request: &CanonicalRequest) -> Result<Value, OperationError>;

    /// Query the collection
    async fn get_query(&self, request: &CanonicalRequest) -> Result<QueryOutcome, OperationError>;

    /// Create or replace one record
    async fn put(&self, request: &CanonicalRequest) -> Result<Value, OperationError>;

    /// Create a record
    async fn post(&self, request: &CanonicalRequest) -> Result<Value, OperationError>;

    /// Delete one record, returning it
    async fn delete(&self, request: &CanonicalRequest) -> Result<Value, OperationError>;

    /// Called for every failed operation before it is routed
    fn log_error(&self, request: &CanonicalRequest, error: &OperationError) {
        tracing::warn!(
            store = %self.descriptor().name,
            operation = %request.operation,
            status = ?error.status,
            "Store operation failed: {}",
            error.message
        );
    }

    /// JSON body for an error written directly as a response
    fn format_error(&self, error: &OperationError) -> Value {
        error.to_body()
    }
}
