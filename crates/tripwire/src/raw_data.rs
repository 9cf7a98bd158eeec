// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Extra data passed alongside a report.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tripwire_core::{ExecutionContext, HandledState, MetaData, RequestContext, Severity, User};

use crate::config::ConfigOverride;

/// One piece of enrichment data supplied to a notifier or to a single report.
///
/// Data attached to the notifier is appended after the data given with each
/// call, so where a single value is expected (user, context, severity, ...)
/// the call's value takes precedence. `Custom` values are never interpreted by
/// the notifier itself; they are kept on the event for middleware to inspect.
#[derive(Clone)]
pub enum RawDatum {
	Severity(Severity),
	HandledState(HandledState),
	Config(ConfigOverride),
	User(User),
	MetaData(MetaData),
	/// Short description of where the fault happened, e.g. a route.
	Context(String),
	/// Overrides the error class derived from the error itself.
	ErrorClass(String),
	Request(RequestContext),
	ExecutionContext(ExecutionContext),
	Custom(Arc<dyn Any + Send + Sync>),
}

impl RawDatum {
	pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
		Self::Custom(Arc::new(value))
	}

	/// Returns the custom value if it has type `T`.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		match self {
			Self::Custom(value) => value.downcast_ref::<T>(),
			_ => None,
		}
	}
}

impl fmt::Debug for RawDatum {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Severity(v) => f.debug_tuple("Severity").field(v).finish(),
			Self::HandledState(v) => f.debug_tuple("HandledState").field(v).finish(),
			Self::Config(v) => f.debug_tuple("Config").field(v).finish(),
			Self::User(v) => f.debug_tuple("User").field(v).finish(),
			Self::MetaData(v) => f.debug_tuple("MetaData").field(v).finish(),
			Self::Context(v) => f.debug_tuple("Context").field(v).finish(),
			Self::ErrorClass(v) => f.debug_tuple("ErrorClass").field(v).finish(),
			Self::Request(v) => f.debug_tuple("Request").field(v).finish(),
			Self::ExecutionContext(v) => f.debug_tuple("ExecutionContext").field(v).finish(),
			Self::Custom(_) => f.write_str("Custom(..)"),
		}
	}
}

impl From<Severity> for RawDatum {
	fn from(value: Severity) -> Self {
		Self::Severity(value)
	}
}

impl From<HandledState> for RawDatum {
	fn from(value: HandledState) -> Self {
		Self::HandledState(value)
	}
}

impl From<ConfigOverride> for RawDatum {
	fn from(value: ConfigOverride) -> Self {
		Self::Config(value)
	}
}

impl From<User> for RawDatum {
	fn from(value: User) -> Self {
		Self::User(value)
	}
}

impl From<MetaData> for RawDatum {
	fn from(value: MetaData) -> Self {
		Self::MetaData(value)
	}
}

impl From<RequestContext> for RawDatum {
	fn from(value: RequestContext) -> Self {
		Self::Request(value)
	}
}

impl From<ExecutionContext> for RawDatum {
	fn from(value: ExecutionContext) -> Self {
		Self::ExecutionContext(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, PartialEq)]
	struct TenantId(u32);

	#[test]
	fn test_custom_downcast() {
		let datum = RawDatum::custom(TenantId(7));
		assert_eq!(datum.downcast_ref::<TenantId>(), Some(&TenantId(7)));
		assert_eq!(datum.downcast_ref::<String>(), None);
	}

	#[test]
	fn test_typed_variants_do_not_downcast() {
		let datum = RawDatum::from(Severity::Info);
		assert!(datum.downcast_ref::<Severity>().is_none());
		assert_eq!(format!("{datum:?}"), "Severity(Info)");
	}
}
