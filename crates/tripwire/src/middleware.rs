// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Before-notify middleware.
//!
//! Hooks run in reverse registration order: the most recently registered hook
//! sees the event first, like wrapping middleware from the outside in. A hook
//! that returns an error stops the chain and the event is not delivered. A
//! hook that panics is logged and skipped.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::warn;
use tripwire_core::SeverityReason;

use crate::captured::panic_message;
use crate::config::Configuration;
use crate::error::{BoxError, NotifyError, Result};
use crate::event::Event;
use crate::raw_data::RawDatum;

/// Metadata tab written by the built-in request middleware.
pub const REQUEST_TAB: &str = "request";

/// A hook that may inspect or change an event before it is delivered.
pub type BeforeNotify =
	dyn Fn(&mut Event, &Configuration) -> std::result::Result<(), BoxError> + Send + Sync;

/// Ordered set of before-notify hooks.
///
/// Registration is expected during startup; the stack is shared read-only by
/// every report afterwards.
#[derive(Default)]
pub struct MiddlewareStack {
	before: RwLock<Vec<Arc<BeforeNotify>>>,
}

impl MiddlewareStack {
	/// Creates an empty stack.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a stack with the built-in request middleware registered.
	pub fn with_defaults() -> Self {
		let stack = Self::new();
		stack.on_before_notify(http_request_middleware);
		stack.on_before_notify(http_request_body_middleware);
		stack
	}

	/// Registers a hook. It will run before every hook registered earlier.
	pub fn on_before_notify<F>(&self, hook: F)
	where
		F: Fn(&mut Event, &Configuration) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
	{
		self
			.before
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.push(Arc::new(hook));
	}

	pub fn len(&self) -> usize {
		self.before.read().unwrap_or_else(PoisonError::into_inner).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Runs every hook over `event`, then hands the event to `next`.
	///
	/// `next` is not called if a hook returns an error.
	pub async fn run<F, Fut>(&self, mut event: Event, config: &Configuration, next: F) -> Result<()>
	where
		F: FnOnce(Event) -> Fut,
		Fut: Future<Output = Result<()>>,
	{
		let hooks: Vec<Arc<BeforeNotify>> = self
			.before
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone();

		for hook in hooks.iter().rev() {
			let severity = event.severity;
			run_before_filter(hook.as_ref(), &mut event, config).map_err(NotifyError::Middleware)?;
			if event.severity != severity {
				event.handled_state.severity_reason = SeverityReason::CallbackSpecified;
			}
		}

		next(event).await
	}
}

fn run_before_filter(
	hook: &BeforeNotify,
	event: &mut Event,
	config: &Configuration,
) -> std::result::Result<(), BoxError> {
	match panic::catch_unwind(AssertUnwindSafe(|| hook(event, config))) {
		Ok(result) => result,
		Err(payload) => {
			warn!(panic = %panic_message(payload.as_ref()), "Middleware hook panicked");
			Ok(())
		}
	}
}

/// Adds the query parameters of every request in the raw data to the
/// `request.params` metadata.
pub fn http_request_middleware(
	event: &mut Event,
	_config: &Configuration,
) -> std::result::Result<(), BoxError> {
	for datum in &event.raw_data {
		if let RawDatum::Request(request) = datum {
			let params = request
				.query_params()
				.into_iter()
				.map(|(key, values)| (key, Value::from(values)))
				.collect();
			event.meta_data.add(REQUEST_TAB, "params", Value::Object(params));
		}
	}
	Ok(())
}

/// Adds the request body of every execution context in the raw data to the
/// `request.body` metadata, as JSON when it parses and as text otherwise.
pub fn http_request_body_middleware(
	event: &mut Event,
	_config: &Configuration,
) -> std::result::Result<(), BoxError> {
	for datum in &event.raw_data {
		if let RawDatum::ExecutionContext(ctx) = datum {
			if let Some(body) = ctx.request_body() {
				let value = serde_json::from_slice::<Value>(body)
					.unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()));
				event.meta_data.add(REQUEST_TAB, "body", value);
			}
		}
	}
	Ok(())
}
