// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notifier: builds events, runs middleware and dispatches delivery.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, error, info, warn, Instrument, Span};
use tripwire_core::{HandledState, Severity, SeverityReason};

use crate::captured::{panic_message, CapturedError};
use crate::config::Configuration;
use crate::delivery::{Delivery, HttpDelivery};
use crate::error::{NotifyError, Result};
use crate::event::{append_state_if_needed, default_severity, Event};
use crate::middleware::MiddlewareStack;
use crate::panic_hook::{install_panic_hook, take_panic_stacktrace};
use crate::raw_data::RawDatum;
use crate::session::SessionTracker;

/// Builder for constructing a [`Notifier`].
pub struct NotifierBuilder {
	config: Configuration,
	raw_data: Vec<RawDatum>,
	middleware: Option<Arc<MiddlewareStack>>,
	delivery: Option<Arc<dyn Delivery>>,
	session_tracker: Option<Arc<dyn SessionTracker>>,
}

impl NotifierBuilder {
	/// Creates a new builder with default settings.
	pub fn new() -> Self {
		Self {
			config: Configuration::default(),
			raw_data: Vec::new(),
			middleware: None,
			delivery: None,
			session_tracker: None,
		}
	}

	/// Replaces the whole configuration.
	pub fn configuration(mut self, config: Configuration) -> Self {
		self.config = config;
		self
	}

	/// Sets the project API key.
	pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
		self.config.api_key = api_key.into();
		self
	}

	/// Sets the URL events are posted to.
	pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.config.endpoint = endpoint.into();
		self
	}

	/// Sets the release stage.
	///
	/// Example: `production`, `staging`, `development`
	pub fn release_stage(mut self, stage: impl Into<String>) -> Self {
		self.config.release_stage = stage.into();
		self
	}

	/// Restricts reporting to the given release stages.
	pub fn notify_release_stages<I, S>(mut self, stages: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.config.notify_release_stages = Some(stages.into_iter().map(Into::into).collect());
		self
	}

	/// Sets the application type, e.g. the framework in use.
	pub fn app_type(mut self, app_type: impl Into<String>) -> Self {
		self.config.app_type = Some(app_type.into());
		self
	}

	/// Sets the application version.
	///
	/// Example: `1.2.3` or `git commit SHA`
	pub fn app_version(mut self, version: impl Into<String>) -> Self {
		self.config.app_version = Some(version.into());
		self
	}

	/// Sets the hostname reported as the device.
	pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
		self.config.hostname = Some(hostname.into());
		self
	}

	/// Makes `notify` wait for delivery by default.
	pub fn synchronous(mut self, synchronous: bool) -> Self {
		self.config.synchronous = synchronous;
		self
	}

	/// Sets the module prefixes treated as application code.
	pub fn project_packages<I, S>(mut self, packages: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.config.project_packages = packages.into_iter().map(Into::into).collect();
		self
	}

	/// Sets the HTTP request timeout of the default delivery.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	/// Sets whether sessions are flushed before `auto_notify` re-raises.
	pub fn flush_sessions_on_repanic(mut self, flush: bool) -> Self {
		self.config.flush_sessions_on_repanic = flush;
		self
	}

	/// Attaches data to every report sent by this notifier.
	///
	/// [`RawDatum::Config`] values are applied to the configuration at build
	/// time instead.
	pub fn raw_data(mut self, datum: impl Into<RawDatum>) -> Self {
		self.raw_data.push(datum.into());
		self
	}

	/// Uses a shared middleware stack instead of the default one.
	pub fn middleware(mut self, stack: Arc<MiddlewareStack>) -> Self {
		self.middleware = Some(stack);
		self
	}

	/// Uses a custom delivery instead of HTTP.
	pub fn delivery(mut self, delivery: Arc<dyn Delivery>) -> Self {
		self.delivery = Some(delivery);
		self
	}

	/// Sets the session tracker flushed before a repanic.
	pub fn session_tracker(mut self, tracker: Arc<dyn SessionTracker>) -> Self {
		self.session_tracker = Some(tracker);
		self
	}

	/// Builds the Notifier.
	pub fn build(self) -> Result<Notifier> {
		let mut config = self.config;
		let mut raw_data = Vec::with_capacity(self.raw_data.len());
		for datum in self.raw_data {
			match datum {
				RawDatum::Config(overrides) => config.update(&overrides),
				other => raw_data.push(other),
			}
		}

		if config.api_key.trim().is_empty() {
			return Err(NotifyError::InvalidApiKey);
		}

		let delivery: Arc<dyn Delivery> = match self.delivery {
			Some(delivery) => delivery,
			None => Arc::new(HttpDelivery::new(config.request_timeout)?),
		};
		let middleware = self
			.middleware
			.unwrap_or_else(|| Arc::new(MiddlewareStack::with_defaults()));

		info!(
			endpoint = %config.endpoint,
			release_stage = %config.release_stage,
			synchronous = config.synchronous,
			"Notifier initialized"
		);

		Ok(Notifier {
			inner: Arc::new(NotifierInner {
				flush_sessions_on_repanic: AtomicBool::new(config.flush_sessions_on_repanic),
				config: Arc::new(config),
				raw_data,
				middleware,
				delivery,
				session_tracker: self.session_tracker,
			}),
		})
	}
}

impl Default for NotifierBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct NotifierInner {
	config: Arc<Configuration>,
	raw_data: Vec<RawDatum>,
	middleware: Arc<MiddlewareStack>,
	delivery: Arc<dyn Delivery>,
	session_tracker: Option<Arc<dyn SessionTracker>>,
	flush_sessions_on_repanic: AtomicBool,
}

/// Reports errors and panics.
///
/// # Example
///
/// ```ignore
/// use tripwire::{CapturedError, Notifier, RawDatum, Severity};
///
/// let notifier = Notifier::builder()
///     .api_key("your_api_key")
///     .release_stage("production")
///     .notify_release_stages(["production", "staging"])
///     .app_version(env!("CARGO_PKG_VERSION"))
///     .build()?;
///
/// // Manual report
/// if let Err(e) = load_invoice(id).await {
///     notifier
///         .notify(CapturedError::from(&e), vec![RawDatum::Severity(Severity::Error)])
///         .await?;
/// }
///
/// // Report a panic and let it continue unwinding
/// notifier.auto_notify(Vec::new(), async { crashy_job().await }).await;
///
/// // Report a panic and swallow it
/// let outcome = notifier.recover(Vec::new(), async { crashy_job().await }).await;
/// ```
#[derive(Clone)]
pub struct Notifier {
	inner: Arc<NotifierInner>,
}

impl Notifier {
	/// Creates a new builder for constructing a Notifier.
	pub fn builder() -> NotifierBuilder {
		NotifierBuilder::new()
	}

	pub fn config(&self) -> &Configuration {
		&self.inner.config
	}

	pub fn middleware(&self) -> &MiddlewareStack {
		&self.inner.middleware
	}

	/// Sets whether sessions are flushed before `auto_notify` re-raises a
	/// panic. Applications whose framework survives the re-raised panic can
	/// turn this off and let sessions go out on the normal schedule.
	///
	/// This takes precedence over `config().flush_sessions_on_repanic`, which
	/// only holds the value the notifier was built with.
	pub fn set_flush_sessions_on_repanic(&self, flush: bool) {
		self.inner.flush_sessions_on_repanic.store(flush, Ordering::SeqCst);
	}

	/// Returns whether sessions are currently flushed before a repanic.
	pub fn flush_sessions_on_repanic(&self) -> bool {
		self.inner.flush_sessions_on_repanic.load(Ordering::SeqCst)
	}

	/// Reports an error, waiting for delivery only if the notifier is
	/// configured as synchronous.
	pub async fn notify(
		&self,
		error: impl Into<Option<CapturedError>>,
		raw_data: Vec<RawDatum>,
	) -> Result<()> {
		self.notify_sync(error, self.inner.config.synchronous, raw_data).await
	}

	/// Reports an error.
	///
	/// With `sync` the delivery result is returned. Without it delivery runs
	/// on a detached task, this returns as soon as the task is started, and a
	/// delivery failure is only logged.
	pub async fn notify_sync(
		&self,
		error: impl Into<Option<CapturedError>>,
		sync: bool,
		raw_data: Vec<RawDatum>,
	) -> Result<()> {
		let Some(error) = error.into() else {
			error!("Attempted to notify without supplying an error; nothing was sent");
			return Err(NotifyError::MissingError);
		};

		let mut all_data = raw_data;
		all_data.extend(self.inner.raw_data.iter().cloned());

		let (event, config) = Event::build(error, all_data, &self.inner.config);
		let config = Arc::new(config);
		let delivery = Arc::clone(&self.inner.delivery);

		let result = self
			.inner
			.middleware
			.run(event, &config, |event| {
				dispatch(event, Arc::clone(&config), delivery, sync)
			})
			.await;

		match &result {
			Err(e) if e.is_suppression() => debug!(reason = %e, "Event not sent"),
			Err(e) => warn!(error = %e, "Notify failed"),
			Ok(()) => {}
		}
		result
	}

	/// Runs `future`, reporting any panic as unhandled and then resuming it.
	///
	/// Severity defaults to error unless the raw data says otherwise.
	pub async fn auto_notify<F>(&self, raw_data: Vec<RawDatum>, future: F) -> F::Output
	where
		F: Future,
	{
		install_panic_hook();

		match AssertUnwindSafe(future).catch_unwind().await {
			Ok(output) => output,
			Err(payload) => {
				let error = CapturedError::from_panic(payload.as_ref());
				self.report_panic(error, raw_data, Severity::Error, true).await;

				if self.flush_sessions_on_repanic() {
					self.flush_sessions().await;
				}

				panic::resume_unwind(payload)
			}
		}
	}

	/// Runs `future`, reporting any panic as handled and swallowing it.
	///
	/// Returns `None` if the future panicked. Severity defaults to warning
	/// unless the raw data says otherwise.
	pub async fn recover<F>(&self, raw_data: Vec<RawDatum>, future: F) -> Option<F::Output>
	where
		F: Future,
	{
		install_panic_hook();

		match AssertUnwindSafe(future).catch_unwind().await {
			Ok(output) => Some(output),
			Err(payload) => {
				let error = CapturedError::from_panic(payload.as_ref());
				self.report_panic(error, raw_data, Severity::Warning, false).await;
				None
			}
		}
	}

	async fn report_panic(
		&self,
		error: CapturedError,
		raw_data: Vec<RawDatum>,
		fallback: Severity,
		unhandled: bool,
	) {
		let severity = default_severity(&raw_data, &self.inner.raw_data, fallback);
		let state = HandledState::new(SeverityReason::HandledPanic, severity, unhandled);
		let raw_data = append_state_if_needed(raw_data, &self.inner.raw_data, state);

		// Failures are already logged by notify.
		let _ = self.notify(error, raw_data).await;
	}

	async fn flush_sessions(&self) {
		let Some(tracker) = &self.inner.session_tracker else {
			return;
		};
		match AssertUnwindSafe(tracker.flush_sessions()).catch_unwind().await {
			Ok(Ok(())) => {}
			Ok(Err(e)) => error!(error = %e, "Failed to flush sessions before repanic"),
			Err(payload) => {
				let message = panic_message(payload.as_ref());
				discard_panic_site(&message);
				error!(panic = %message, "Session tracker panicked while flushing");
			}
		}
	}
}

/// The final middleware step: release-stage gate, then inline or detached
/// delivery.
async fn dispatch(
	event: Event,
	config: Arc<Configuration>,
	delivery: Arc<dyn Delivery>,
	sync: bool,
) -> Result<()> {
	debug!(message = %event.message, "Notifying");

	if !config.notify_in_release_stage() {
		return Err(NotifyError::ReleaseStageSuppressed {
			stage: config.release_stage.clone(),
		});
	}

	if sync {
		return deliver_guarded(delivery.as_ref(), &event, &config).await;
	}

	let task = async move {
		if let Err(e) = deliver_guarded(delivery.as_ref(), &event, &config).await {
			error!(error = %e, "Asynchronous delivery failed");
		}
	}
	.instrument(Span::current());

	match tokio::runtime::Handle::try_current() {
		Ok(handle) => {
			handle.spawn(task);
		}
		Err(_) => {
			debug!("No async runtime available; delivering on a background thread");
			let spawned = thread::Builder::new()
				.name("tripwire-delivery".to_string())
				.spawn(move || {
					match tokio::runtime::Builder::new_current_thread().enable_all().build() {
						Ok(runtime) => runtime.block_on(task),
						Err(e) => error!(error = %e, "Failed to start delivery runtime"),
					}
				});
			if let Err(e) = spawned {
				error!(error = %e, "Failed to spawn delivery thread");
			}
		}
	}

	Ok(())
}

/// Runs one delivery, turning a panic in the collaborator into an error.
async fn deliver_guarded(
	delivery: &dyn Delivery,
	event: &Event,
	config: &Configuration,
) -> Result<()> {
	match AssertUnwindSafe(delivery.deliver(event, config)).catch_unwind().await {
		Ok(result) => result,
		Err(payload) => {
			let message = panic_message(payload.as_ref());
			discard_panic_site(&message);
			error!(panic = %message, "Delivery panicked");
			Err(NotifyError::DeliveryPanicked(message))
		}
	}
}

/// Drops the stack the panic hook recorded for a panic that is not reported.
fn discard_panic_site(message: &str) {
	let _ = take_panic_stacktrace(message);
}
