// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the reporting client.

use thiserror::Error;

/// Boxed error returned by middleware hooks and custom collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for reporting operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Errors that can occur while reporting.
#[derive(Debug, Error)]
pub enum NotifyError {
	/// `notify` was called without an error to report.
	#[error("attempted to notify without supplying an error; nothing was sent")]
	MissingError,

	/// The configured release stage is not in the notify allow-list.
	#[error("not notifying in release stage {stage:?}")]
	ReleaseStageSuppressed {
		/// The release stage that was suppressed.
		stage: String,
	},

	/// A before-notify hook rejected the event.
	#[error("middleware rejected the event: {0}")]
	Middleware(#[source] BoxError),

	/// Missing API key.
	#[error("API key is required")]
	InvalidApiKey,

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Server returned an error.
	#[error("server error (status {status}): {message}")]
	ServerError {
		/// HTTP status code.
		status: u16,
		/// Error message from server.
		message: String,
	},

	/// Rate limited by server.
	#[error("rate limited, retry after {retry_after_secs:?} seconds")]
	RateLimited {
		/// Optional retry-after header value.
		retry_after_secs: Option<u64>,
	},

	/// Failed to serialize the payload.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// The delivery collaborator panicked instead of returning.
	#[error("delivery panicked: {0}")]
	DeliveryPanicked(String),

	/// The session tracker failed to flush before a repanic.
	#[error("failed to flush sessions: {0}")]
	SessionFlush(String),
}

impl NotifyError {
	/// Returns true for errors that only mean "nothing was sent on purpose".
	pub fn is_suppression(&self) -> bool {
		matches!(self, NotifyError::ReleaseStageSuppressed { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_suppression_is_not_a_failure() {
		let err = NotifyError::ReleaseStageSuppressed {
			stage: "development".to_string(),
		};
		assert!(err.is_suppression());
		assert_eq!(err.to_string(), "not notifying in release stage \"development\"");
	}

	#[test]
	fn test_middleware_error_keeps_source() {
		let err = NotifyError::Middleware("ignored by hook".into());
		assert_eq!(
			std::error::Error::source(&err).map(|e| e.to_string()),
			Some("ignored by hook".to_string())
		);
		assert!(!err.is_suppression());
	}
}
