// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Severity levels and the handled/unhandled state of a report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// How serious a reported fault is.
///
/// An explicit severity is always optional at the call site: "unset" is
/// expressed as `Option<Severity>::None`, never as a fourth variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	Error,
	Warning,
	Info,
}

impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Error => write!(f, "error"),
			Self::Warning => write!(f, "warning"),
			Self::Info => write!(f, "info"),
		}
	}
}

impl FromStr for Severity {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"error" => Ok(Self::Error),
			"warning" => Ok(Self::Warning),
			"info" => Ok(Self::Info),
			_ => Err(CoreError::InvalidSeverity(s.to_string())),
		}
	}
}

/// Why a report carries its current severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeverityReason {
	#[serde(rename = "unhandledError")]
	UnhandledError,
	#[serde(rename = "unhandledErrorMiddleware")]
	UnhandledMiddlewareError,
	#[serde(rename = "unhandledPanic")]
	UnhandledPanic,
	#[serde(rename = "handledError")]
	HandledError,
	#[serde(rename = "handledPanic")]
	HandledPanic,
	#[serde(rename = "userSpecifiedSeverity")]
	UserSpecified,
	#[serde(rename = "userCallbackSetSeverity")]
	CallbackSpecified,
}

impl SeverityReason {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::UnhandledError => "unhandledError",
			Self::UnhandledMiddlewareError => "unhandledErrorMiddleware",
			Self::UnhandledPanic => "unhandledPanic",
			Self::HandledError => "handledError",
			Self::HandledPanic => "handledPanic",
			Self::UserSpecified => "userSpecifiedSeverity",
			Self::CallbackSpecified => "userCallbackSetSeverity",
		}
	}
}

impl fmt::Display for SeverityReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SeverityReason {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"unhandledError" => Ok(Self::UnhandledError),
			"unhandledErrorMiddleware" => Ok(Self::UnhandledMiddlewareError),
			"unhandledPanic" => Ok(Self::UnhandledPanic),
			"handledError" => Ok(Self::HandledError),
			"handledPanic" => Ok(Self::HandledPanic),
			"userSpecifiedSeverity" => Ok(Self::UserSpecified),
			"userCallbackSetSeverity" => Ok(Self::CallbackSpecified),
			_ => Err(CoreError::InvalidSeverityReason(s.to_string())),
		}
	}
}

/// Whether a fault was handled by the application, and the severity it was
/// originally reported with.
///
/// A report carries exactly one handled state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandledState {
	pub severity_reason: SeverityReason,
	pub original_severity: Severity,
	pub unhandled: bool,
	/// Name of the framework that caught the fault, if any.
	pub framework: String,
}

impl HandledState {
	pub fn new(severity_reason: SeverityReason, original_severity: Severity, unhandled: bool) -> Self {
		Self {
			severity_reason,
			original_severity,
			unhandled,
			framework: String::new(),
		}
	}

	pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
		self.framework = framework.into();
		self
	}
}

impl Default for HandledState {
	fn default() -> Self {
		Self::new(SeverityReason::HandledError, Severity::Warning, false)
	}
}
