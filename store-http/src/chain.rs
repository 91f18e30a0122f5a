//! Error escalation policy
//!
//! Decides, per store error, whether the adapter writes the HTTP response
//! itself or hands the error to the external error pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::OperationError;

/// How store errors are routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainMode {
    /// Every error is forwarded; nothing is written directly
    All,
    /// Errors carrying an HTTP status are written directly, the rest are forwarded
    #[default]
    NonHttp,
    /// Every error is written directly
    None,
}

impl fmt::Display for ChainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::NonHttp => write!(f, "nonhttp"),
            Self::None => write!(f, "none"),
        }
    }
}

impl FromStr for ChainMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "nonhttp" => Ok(Self::NonHttp),
            "none" => Ok(Self::None),
            other => Err(format!("unknown chain mode: {other}")),
        }
    }
}

/// Where a caught store error goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRoute {
    /// Format the error and send it as this request's response
    Respond,
    /// Pass the error to the upstream error pipeline
    Forward,
}

impl ChainMode {
    /// Route an error according to this mode
    #[must_use]
    pub fn route(self, error: &OperationError) -> ErrorRoute {
        match self {
            Self::All => ErrorRoute::Forward,
            Self::NonHttp if error.has_status() => ErrorRoute::Respond,
            Self::NonHttp => ErrorRoute::Forward,
            Self::None => ErrorRoute::Respond,
        }
    }
}
