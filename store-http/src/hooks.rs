//! Per-route extension points
//!
//! Every registered route runs `pre hook -> handler -> post hook`. Errors the
//! handler forwards skip the post hook and go to the [`ErrorPipeline`]
//! instead. All three default to pass-through behavior.

use async_trait::async_trait;
use axum::response::{IntoResponse, Response};

use crate::error::ForwardedError;
use crate::operation::Operation;
use crate::request::HttpInput;

/// What a pre hook decided
#[derive(Debug)]
pub enum PreHookOutcome {
    /// Run the handler
    Continue,
    /// Send this response and skip the handler
    Respond(Response),
}

/// Runs before the handler and may rewrite the input or answer directly
///
/// The hook sees the URI, headers and session. Path params and the body are
/// decoded after it continues; values it sets in `params` or `body` are kept.
#[async_trait]
pub trait PreHook: Send + Sync {
    /// Inspect or modify the input
    async fn before(&self, operation: Operation, input: &mut HttpInput) -> PreHookOutcome;
}

/// Runs after the handler produced a response
#[async_trait]
pub trait PostHook: Send + Sync {
    /// Inspect or modify the response
    async fn after(&self, operation: Operation, response: &mut Response);
}

/// Turns forwarded errors into responses
#[async_trait]
pub trait ErrorPipeline: Send + Sync {
    /// Produce the response for a forwarded error
    async fn handle(&self, operation: Operation, error: ForwardedError) -> Response;
}

/// Hook that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

#[async_trait]
impl PreHook for PassThrough {
    async fn before(&self, _operation: Operation, _input: &mut HttpInput) -> PreHookOutcome {
        PreHookOutcome::Continue
    }
}

#[async_trait]
impl PostHook for PassThrough {
    async fn after(&self, _operation: Operation, _response: &mut Response) {}
}

/// Renders forwarded errors with their default response
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorPipeline;

#[async_trait]
impl ErrorPipeline for DefaultErrorPipeline {
    async fn handle(&self, operation: Operation, error: ForwardedError) -> Response {
        tracing::debug!(%operation, error = %error, "Rendering forwarded error");
        error.into_response()
    }
}
