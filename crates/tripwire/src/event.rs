// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The in-flight report and the rules that build it from raw data.

use tripwire_core::{
	ExecutionContext, HandledState, MetaData, Severity, SeverityReason, StackFrame, User,
};

use crate::captured::CapturedError;
use crate::config::Configuration;
use crate::raw_data::RawDatum;

/// One report on its way through middleware to delivery.
///
/// Middleware may change any public field. The handled state is read-only
/// outside the crate; changing `severity` in a hook is recorded on it.
#[derive(Debug, Clone)]
pub struct Event {
	pub error_class: String,
	pub message: String,
	pub stacktrace: Vec<StackFrame>,
	pub context: Option<String>,
	pub severity: Severity,
	pub grouping_hash: Option<String>,
	pub user: Option<User>,
	pub meta_data: MetaData,
	pub ctx: ExecutionContext,
	/// Every datum supplied for this report: call data first, then notifier
	/// data.
	pub raw_data: Vec<RawDatum>,
	pub(crate) handled_state: HandledState,
}

impl Event {
	/// Builds an event from a captured error and its raw data, returning the
	/// configuration that applies to this report.
	pub(crate) fn build(
		error: CapturedError,
		raw_data: Vec<RawDatum>,
		base: &Configuration,
	) -> (Event, Configuration) {
		let mut config = base.clone();
		let mut event = Event {
			error_class: error.error_class,
			message: error.message,
			stacktrace: error.stacktrace,
			context: None,
			severity: Severity::Warning,
			grouping_hash: None,
			user: None,
			meta_data: MetaData::new(),
			ctx: ExecutionContext::default(),
			raw_data: Vec::new(),
			handled_state: HandledState::default(),
		};

		let mut explicit_severity = None;
		let mut supplied_state = None;

		// Walk backwards so that the first datum of a kind is the one that sticks.
		for datum in raw_data.iter().rev() {
			match datum {
				RawDatum::Severity(severity) => explicit_severity = Some(*severity),
				RawDatum::HandledState(state) => supplied_state = Some(state.clone()),
				RawDatum::Config(overrides) => config.update(overrides),
				RawDatum::User(user) => event.user = Some(user.clone()),
				RawDatum::MetaData(meta_data) => event.meta_data.update(meta_data),
				RawDatum::Context(context) => event.context = Some(context.clone()),
				RawDatum::ErrorClass(class) => event.error_class = class.clone(),
				RawDatum::ExecutionContext(ctx) => event.ctx = ctx.clone(),
				RawDatum::Request(_) | RawDatum::Custom(_) => {}
			}
		}

		if let Some(state) = supplied_state.clone() {
			event.severity = state.original_severity;
			event.handled_state = state;
		}

		if let Some(severity) = explicit_severity {
			let agrees_with_state = supplied_state
				.as_ref()
				.is_some_and(|state| state.original_severity == severity);
			if !agrees_with_state {
				event.handled_state.severity_reason = SeverityReason::UserSpecified;
				event.handled_state.original_severity = severity;
			}
			event.severity = severity;
		}

		for frame in &mut event.stacktrace {
			frame.in_project = config.is_project_frame(&frame.method);
		}

		let unhandled = event.handled_state.unhandled;
		if let Some(session) = event.ctx.session_mut() {
			session.record(unhandled);
		}

		event.raw_data = raw_data;
		(event, config)
	}

	pub fn handled_state(&self) -> &HandledState {
		&self.handled_state
	}

	pub fn unhandled(&self) -> bool {
		self.handled_state.unhandled
	}

	pub fn severity_reason(&self) -> SeverityReason {
		self.handled_state.severity_reason
	}
}

/// Picks the severity a panic report should default to: an explicit severity
/// first, then the original severity of a supplied handled state, then
/// `fallback`. Call data is searched before notifier data.
pub(crate) fn default_severity(
	call_data: &[RawDatum],
	notifier_data: &[RawDatum],
	fallback: Severity,
) -> Severity {
	let all = || call_data.iter().chain(notifier_data);

	all()
		.find_map(|datum| match datum {
			RawDatum::Severity(severity) => Some(*severity),
			_ => None,
		})
		.or_else(|| {
			all().find_map(|datum| match datum {
				RawDatum::HandledState(state) => Some(state.original_severity),
				_ => None,
			})
		})
		.unwrap_or(fallback)
}

/// Appends `state` unless a handled state is already present in either list.
pub(crate) fn append_state_if_needed(
	mut call_data: Vec<RawDatum>,
	notifier_data: &[RawDatum],
	state: HandledState,
) -> Vec<RawDatum> {
	let present = call_data
		.iter()
		.chain(notifier_data)
		.any(|datum| matches!(datum, RawDatum::HandledState(_)));

	if !present {
		call_data.push(RawDatum::HandledState(state));
	}
	call_data
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ConfigOverride;
	use proptest::prelude::*;
	use serde_json::json;

	fn captured() -> CapturedError {
		CapturedError {
			error_class: "io::Error".to_string(),
			message: "connection reset".to_string(),
			stacktrace: vec![
				StackFrame::new("std::io::copy", "io.rs", 10),
				StackFrame::new("my_app::sync::run", "src/sync.rs", 42),
			],
		}
	}

	fn any_severity() -> impl Strategy<Value = Severity> {
		prop_oneof![
			Just(Severity::Error),
			Just(Severity::Warning),
			Just(Severity::Info),
		]
	}

	fn any_state() -> impl Strategy<Value = HandledState> {
		(any_severity(), any::<bool>()).prop_map(|(severity, unhandled)| {
			HandledState::new(SeverityReason::HandledPanic, severity, unhandled)
		})
	}

	#[test]
	fn test_plain_event_is_handled_warning() {
		let (event, _) = Event::build(captured(), Vec::new(), &Configuration::default());

		assert_eq!(event.severity, Severity::Warning);
		assert_eq!(event.severity_reason(), SeverityReason::HandledError);
		assert!(!event.unhandled());
		assert_eq!(event.error_class, "io::Error");
		assert_eq!(event.message, "connection reset");
	}

	#[test]
	fn test_handled_state_sets_severity() {
		let state = HandledState::new(SeverityReason::HandledPanic, Severity::Error, true);
		let (event, _) = Event::build(
			captured(),
			vec![RawDatum::HandledState(state.clone())],
			&Configuration::default(),
		);

		assert_eq!(event.severity, Severity::Error);
		assert_eq!(event.handled_state(), &state);
	}

	#[test]
	fn test_explicit_severity_matching_state_keeps_reason() {
		let state = HandledState::new(SeverityReason::HandledPanic, Severity::Info, true);
		let (event, _) = Event::build(
			captured(),
			vec![RawDatum::Severity(Severity::Info), RawDatum::HandledState(state)],
			&Configuration::default(),
		);

		assert_eq!(event.severity, Severity::Info);
		assert_eq!(event.severity_reason(), SeverityReason::HandledPanic);
	}

	#[test]
	fn test_call_data_takes_precedence_over_notifier_data() {
		let call = RawDatum::User(User {
			id: Some("call".to_string()),
			..Default::default()
		});
		let notifier = RawDatum::User(User {
			id: Some("notifier".to_string()),
			..Default::default()
		});
		let (event, _) = Event::build(
			captured(),
			vec![
				RawDatum::Context("/checkout".to_string()),
				call,
				RawDatum::Context("/".to_string()),
				notifier,
			],
			&Configuration::default(),
		);

		assert_eq!(event.user.unwrap().id.as_deref(), Some("call"));
		assert_eq!(event.context.as_deref(), Some("/checkout"));
		assert_eq!(event.raw_data.len(), 4);
	}

	#[test]
	fn test_metadata_merges_with_call_values_winning() {
		let mut call = MetaData::new();
		call.add("account", "plan", "pro");
		let mut notifier = MetaData::new();
		notifier.add("account", "plan", "free");
		notifier.add("account", "region", "eu");

		let (event, _) = Event::build(
			captured(),
			vec![RawDatum::MetaData(call), RawDatum::MetaData(notifier)],
			&Configuration::default(),
		);

		assert_eq!(event.meta_data.get("account", "plan"), Some(&json!("pro")));
		assert_eq!(event.meta_data.get("account", "region"), Some(&json!("eu")));
	}

	#[test]
	fn test_config_override_and_error_class() {
		let (event, config) = Event::build(
			captured(),
			vec![
				RawDatum::Config(ConfigOverride {
					release_stage: Some("staging".to_string()),
					project_packages: Some(vec!["my_app".to_string()]),
					..Default::default()
				}),
				RawDatum::ErrorClass("SyncFailure".to_string()),
			],
			&Configuration::default(),
		);

		assert_eq!(config.release_stage, "staging");
		assert_eq!(event.error_class, "SyncFailure");
		assert!(!event.stacktrace[0].in_project);
		assert!(event.stacktrace[1].in_project);
	}

	#[test]
	fn test_execution_context_is_attached() {
		let ctx = ExecutionContext::new().with_request_body(b"{}".to_vec());
		let (event, _) = Event::build(
			captured(),
			vec![RawDatum::ExecutionContext(ctx.clone())],
			&Configuration::default(),
		);

		assert_eq!(event.ctx, ctx);
	}

	#[test]
	fn test_report_is_counted_against_its_session() {
		let session = tripwire_core::Session::start();
		let ctx = ExecutionContext::new().with_session(session.clone());

		let (handled, _) = Event::build(
			captured(),
			vec![RawDatum::ExecutionContext(ctx.clone())],
			&Configuration::default(),
		);
		let (unhandled, _) = Event::build(
			captured(),
			vec![
				RawDatum::ExecutionContext(ctx),
				RawDatum::HandledState(HandledState::new(
					SeverityReason::UnhandledError,
					Severity::Error,
					true,
				)),
			],
			&Configuration::default(),
		);

		let handled = handled.ctx.session().unwrap();
		assert_eq!(handled.id, session.id);
		assert_eq!((handled.handled, handled.unhandled), (1, 0));
		let unhandled = unhandled.ctx.session().unwrap();
		assert_eq!((unhandled.handled, unhandled.unhandled), (0, 1));
	}

	#[test]
	fn test_default_severity_prefers_call_data() {
		let call = vec![RawDatum::Severity(Severity::Info)];
		let notifier = vec![RawDatum::Severity(Severity::Error)];

		assert_eq!(default_severity(&call, &notifier, Severity::Warning), Severity::Info);
		assert_eq!(default_severity(&[], &notifier, Severity::Warning), Severity::Error);
		assert_eq!(default_severity(&[], &[], Severity::Warning), Severity::Warning);
	}

	#[test]
	fn test_default_severity_falls_back_to_handled_state() {
		let notifier = vec![RawDatum::HandledState(HandledState::new(
			SeverityReason::UnhandledError,
			Severity::Info,
			true,
		))];

		assert_eq!(default_severity(&[], &notifier, Severity::Error), Severity::Info);
	}

	#[test]
	fn test_append_state_is_idempotent() {
		let state = HandledState::new(SeverityReason::HandledPanic, Severity::Error, true);

		let once = append_state_if_needed(Vec::new(), &[], state.clone());
		let twice = append_state_if_needed(once, &[], state.clone());
		assert_eq!(twice.len(), 1);

		let notifier = vec![RawDatum::HandledState(state.clone())];
		assert!(append_state_if_needed(Vec::new(), &notifier, state).is_empty());
	}

	proptest! {
		#[test]
		fn explicit_severity_always_wins(
			severity in any_severity(),
			state in any_state(),
			severity_first in any::<bool>(),
		) {
			let raw_data = if severity_first {
				vec![RawDatum::Severity(severity), RawDatum::HandledState(state)]
			} else {
				vec![RawDatum::HandledState(state), RawDatum::Severity(severity)]
			};
			let (event, _) = Event::build(captured(), raw_data, &Configuration::default());

			prop_assert_eq!(event.severity, severity);
			prop_assert_eq!(event.handled_state().original_severity, severity);
		}

		#[test]
		fn at_most_one_handled_state(states in proptest::collection::vec(any_state(), 0..4)) {
			let mut raw_data: Vec<RawDatum> = Vec::new();
			for state in states {
				raw_data = append_state_if_needed(raw_data, &[], state);
			}
			let count = raw_data
				.iter()
				.filter(|datum| matches!(datum, RawDatum::HandledState(_)))
				.count();
			prop_assert!(count <= 1);
		}
	}
}
