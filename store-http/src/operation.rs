//! Operation kinds served over HTTP

use std::fmt;
use std::str::FromStr;

use axum::http::Method;

use crate::error::Error;

/// The five operations a store exposes over HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Fetch one record by id
    Get,
    /// Query the collection
    GetQuery,
    /// Create or replace one record by id
    Put,
    /// Create a record in the collection
    Post,
    /// Delete one record by id
    Delete,
}

impl Operation {
    /// All operations, in route registration order
    pub const ALL: [Operation; 5] = [
        Operation::Get,
        Operation::GetQuery,
        Operation::Put,
        Operation::Post,
        Operation::Delete,
    ];

    /// Wire name of the operation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::GetQuery => "getQuery",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
        }
    }

    /// HTTP method the operation is routed on
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::Get | Self::GetQuery => Method::GET,
            Self::Put => Method::PUT,
            Self::Post => Method::POST,
            Self::Delete => Method::DELETE,
        }
    }

    /// Whether the route carries the id token (as opposed to the collection path)
    #[must_use]
    pub const fn targets_item(&self) -> bool {
        matches!(self, Self::Get | Self::Put | Self::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(Self::Get),
            "getQuery" => Ok(Self::GetQuery),
            "put" => Ok(Self::Put),
            "post" => Ok(Self::Post),
            "delete" => Ok(Self::Delete),
            other => Err(Error::UnknownOperation(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_operation() {
        let err = "getField".parse::<Operation>().unwrap_err();
        assert!(matches!(err, Error::UnknownOperation(ref name) if name == "getField"));
        // Names are case sensitive
        assert!("GetQuery".parse::<Operation>().is_err());
    }

    #[test]
    fn test_methods_and_targets() {
        assert_eq!(Operation::GetQuery.method(), Method::GET);
        assert_eq!(Operation::Delete.method(), Method::DELETE);
        assert!(Operation::Put.targets_item());
        assert!(!Operation::Post.targets_item());
        assert!(!Operation::GetQuery.targets_item());
    }
}
