// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notifier configuration and per-call overrides.

use std::time::Duration;

use crate::backtrace::is_in_app_frame;

/// Default ingestion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://notify.tripwire.dev";
/// Default release stage.
pub const DEFAULT_RELEASE_STAGE: &str = "production";

/// Settings shared by every report sent through a notifier.
#[derive(Debug, Clone)]
pub struct Configuration {
	/// Project API key sent with every payload.
	pub api_key: String,
	/// URL reports are posted to.
	pub endpoint: String,
	/// Deployment stage of this process, e.g. `production`.
	pub release_stage: String,
	/// Stages that are allowed to send reports. `None` allows every stage.
	pub notify_release_stages: Option<Vec<String>>,
	/// Application type, e.g. the web framework in use.
	pub app_type: Option<String>,
	/// Application version.
	pub app_version: Option<String>,
	/// Hostname reported as the device.
	pub hostname: Option<String>,
	/// Whether `notify` waits for delivery by default.
	pub synchronous: bool,
	/// Module path prefixes treated as application code in stack traces.
	///
	/// A trailing `*` matches any continuation, otherwise the prefix must be a
	/// whole module path (`my_app` matches `my_app::handlers::load`).
	pub project_packages: Vec<String>,
	/// Timeout for HTTP delivery.
	pub request_timeout: Duration,
	/// Whether sessions are flushed before `auto_notify` re-raises a panic.
	pub flush_sessions_on_repanic: bool,
}

impl Default for Configuration {
	fn default() -> Self {
		Self {
			api_key: String::new(),
			endpoint: DEFAULT_ENDPOINT.to_string(),
			release_stage: DEFAULT_RELEASE_STAGE.to_string(),
			notify_release_stages: None,
			app_type: None,
			app_version: None,
			hostname: hostname::get().ok().and_then(|h| h.into_string().ok()),
			synchronous: false,
			project_packages: Vec::new(),
			request_timeout: Duration::from_secs(30),
			flush_sessions_on_repanic: true,
		}
	}
}

impl Configuration {
	/// Returns true if reports may be sent from the current release stage.
	///
	/// An unset allow-list or an empty release stage always notifies.
	pub fn notify_in_release_stage(&self) -> bool {
		let Some(stages) = &self.notify_release_stages else {
			return true;
		};
		if self.release_stage.is_empty() {
			return true;
		}
		stages.iter().any(|stage| *stage == self.release_stage)
	}

	/// Applies every field set in `other`.
	pub fn update(&mut self, other: &ConfigOverride) {
		if let Some(api_key) = &other.api_key {
			self.api_key = api_key.clone();
		}
		if let Some(endpoint) = &other.endpoint {
			self.endpoint = endpoint.clone();
		}
		if let Some(release_stage) = &other.release_stage {
			self.release_stage = release_stage.clone();
		}
		if let Some(stages) = &other.notify_release_stages {
			self.notify_release_stages = Some(stages.clone());
		}
		if let Some(app_type) = &other.app_type {
			self.app_type = Some(app_type.clone());
		}
		if let Some(app_version) = &other.app_version {
			self.app_version = Some(app_version.clone());
		}
		if let Some(hostname) = &other.hostname {
			self.hostname = Some(hostname.clone());
		}
		if let Some(packages) = &other.project_packages {
			self.project_packages = packages.clone();
		}
	}

	/// Returns a copy of this configuration with `other` applied.
	pub fn merge(&self, other: &ConfigOverride) -> Configuration {
		let mut merged = self.clone();
		merged.update(other);
		merged
	}

	/// Decides whether a frame's method belongs to the application.
	pub fn is_project_frame(&self, method: &str) -> bool {
		if self.project_packages.is_empty() {
			return is_in_app_frame(method);
		}

		let method = method.trim_start_matches('<');
		self.project_packages.iter().any(|package| match package.strip_suffix('*') {
			Some(prefix) => method.starts_with(prefix),
			None => {
				method == package
					|| method
						.strip_prefix(package.as_str())
						.is_some_and(|rest| rest.starts_with("::"))
			}
		})
	}
}

/// A partial configuration, applied on top of the notifier's settings.
///
/// Passed at build time it changes the notifier for good; passed with a
/// single report it only affects that report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverride {
	pub api_key: Option<String>,
	pub endpoint: Option<String>,
	pub release_stage: Option<String>,
	pub notify_release_stages: Option<Vec<String>>,
	pub app_type: Option<String>,
	pub app_version: Option<String>,
	pub hostname: Option<String>,
	pub project_packages: Option<Vec<String>>,
}
