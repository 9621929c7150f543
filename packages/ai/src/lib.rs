#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! LLM provider abstraction for narrative report generation.
//!
//! The analysis core treats report writing as a black box: anonymized
//! summary text in, narrative text out. This crate provides that box for
//! Anthropic Claude and `OpenAI`, selected via environment variables,
//! with request timeouts and bounded retry for transient failures.
//! Permanent failures (authentication, bad requests) are surfaced
//! immediately and never retried.

pub mod providers;
pub mod retry;

use thiserror::Error;

/// System prompt given to every narrative generation request.
///
/// The summary it accompanies is already anonymized; the model only ever
/// sees opaque location codes and a vehicle code.
pub const REPORT_SYSTEM_PROMPT: &str = "You are an intelligence analyst. From the following \
vehicle activity summary, write a professional, well-structured analysis report. Describe the \
vehicle's routine (home bases, recurring movements), then highlight anomalies and what they \
might indicate. Refer to locations and the vehicle strictly by the codes used in the summary. \
Do not invent facts that are not in the summary.";

/// Errors that can occur during narrative generation.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to the LLM provider failed after retries.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider returned an error response (non-retryable).
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Provider credentials or selection are misconfigured.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_their_context() {
        let err = AiError::Config {
            message: "ANTHROPIC_API_KEY environment variable not set".to_string(),
        };
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }
}
