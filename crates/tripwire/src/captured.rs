// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The error being reported, captured together with its stack.

use std::any::Any;

use tripwire_core::StackFrame;

use crate::backtrace::capture_stacktrace;
use crate::panic_hook::take_panic_stacktrace;

/// Error class used for reports raised from a panic.
pub const PANIC_ERROR_CLASS: &str = "panic";

/// An error captured for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedError {
	pub error_class: String,
	pub message: String,
	pub stacktrace: Vec<StackFrame>,
}

impl CapturedError {
	/// Captures an error with an explicit class and message at the current
	/// call site.
	pub fn new(error_class: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			error_class: error_class.into(),
			message: message.into(),
			stacktrace: capture_stacktrace(),
		}
	}

	/// Captures a typed error at the current call site. The class is the
	/// error's type name.
	pub fn from_error<E: std::error::Error>(error: &E) -> Self {
		Self::new(std::any::type_name::<E>(), error.to_string())
	}

	/// Captures the payload of a caught panic.
	///
	/// Uses the stack recorded at the panic site by the panic hook when one is
	/// available on this thread, and the current stack otherwise.
	pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
		let message = panic_message(payload);
		let stacktrace = take_panic_stacktrace(&message).unwrap_or_else(capture_stacktrace);
		Self {
			error_class: PANIC_ERROR_CLASS.to_string(),
			message,
			stacktrace,
		}
	}

	/// Replaces the captured stack.
	pub fn with_stacktrace(mut self, stacktrace: Vec<StackFrame>) -> Self {
		self.stacktrace = stacktrace;
		self
	}
}

impl<E: std::error::Error> From<&E> for CapturedError {
	fn from(error: &E) -> Self {
		Self::from_error(error)
	}
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&'static str>() {
		return (*s).to_string();
	}
	if let Some(s) = payload.downcast_ref::<String>() {
		return s.clone();
	}
	"Box<dyn Any>".to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fmt;

	#[derive(Debug)]
	struct LedgerError;

	impl fmt::Display for LedgerError {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "ledger out of balance")
		}
	}

	impl std::error::Error for LedgerError {}

	#[test]
	fn test_from_error_uses_type_name() {
		let captured = CapturedError::from(&LedgerError);
		assert!(captured.error_class.ends_with("LedgerError"));
		assert_eq!(captured.message, "ledger out of balance");
	}

	#[test]
	fn test_panic_message_from_str_and_string() {
		let literal: Box<dyn Any + Send> = Box::new("boom");
		let formatted: Box<dyn Any + Send> = Box::new(format!("boom {}", 2));
		let other: Box<dyn Any + Send> = Box::new(42u8);

		assert_eq!(panic_message(literal.as_ref()), "boom");
		assert_eq!(panic_message(formatted.as_ref()), "boom 2");
		assert_eq!(panic_message(other.as_ref()), "Box<dyn Any>");
	}

	#[test]
	fn test_from_panic() {
		let payload: Box<dyn Any + Send> = Box::new("boom");
		let captured = CapturedError::from_panic(payload.as_ref());
		assert_eq!(captured.error_class, PANIC_ERROR_CLASS);
		assert_eq!(captured.message, "boom");
	}
}
