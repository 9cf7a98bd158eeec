// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire format sent to the ingestion endpoint.

use serde::Serialize;
use std::collections::BTreeMap;
use tripwire_core::{MetaData, Session, Severity, SeverityReason, StackFrame, User};

use crate::config::Configuration;
use crate::error::Result;
use crate::event::Event;

/// Version of the event schema this client emits.
pub const PAYLOAD_VERSION: &str = "4";
/// Notifier name for identification.
pub const NOTIFIER_NAME: &str = "Tripwire Rust";
/// Notifier homepage.
pub const NOTIFIER_URL: &str = "https://github.com/ghuntley/tripwire";
/// Notifier version for identification.
pub const NOTIFIER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A single event together with the configuration it is sent under.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload<'a> {
	api_key: &'a str,
	events: Vec<EventPayload<'a>>,
	notifier: NotifierPayload,
}

impl<'a> Payload<'a> {
	pub fn new(event: &'a Event, config: &'a Configuration) -> Self {
		Self {
			api_key: &config.api_key,
			events: vec![EventPayload::new(event, config)],
			notifier: NotifierPayload {
				name: NOTIFIER_NAME,
				url: NOTIFIER_URL,
				version: NOTIFIER_VERSION,
			},
		}
	}

	pub fn to_json(&self) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(self)?)
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventPayload<'a> {
	app: AppPayload<'a>,
	#[serde(skip_serializing_if = "Option::is_none")]
	context: Option<&'a str>,
	device: DevicePayload<'a>,
	exceptions: Vec<ExceptionPayload<'a>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	grouping_hash: Option<&'a str>,
	meta_data: &'a MetaData,
	payload_version: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	session: Option<SessionPayload>,
	severity: Severity,
	severity_reason: SeverityReasonPayload,
	unhandled: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	user: Option<&'a User>,
}

impl<'a> EventPayload<'a> {
	fn new(event: &'a Event, config: &'a Configuration) -> Self {
		let handled_state = event.handled_state();
		Self {
			app: AppPayload {
				release_stage: &config.release_stage,
				app_type: config.app_type.as_deref(),
				version: config.app_version.as_deref(),
			},
			context: event.context.as_deref(),
			device: DevicePayload {
				hostname: config.hostname.as_deref(),
			},
			exceptions: vec![ExceptionPayload {
				error_class: &event.error_class,
				message: &event.message,
				stacktrace: &event.stacktrace,
			}],
			grouping_hash: event.grouping_hash.as_deref(),
			meta_data: &event.meta_data,
			payload_version: PAYLOAD_VERSION,
			session: event.ctx.session().map(SessionPayload::from_session),
			severity: event.severity,
			severity_reason: SeverityReasonPayload {
				reason: handled_state.severity_reason,
			},
			unhandled: handled_state.unhandled,
			user: event.user.as_ref(),
		}
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppPayload<'a> {
	release_stage: &'a str,
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	app_type: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	version: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DevicePayload<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	hostname: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExceptionPayload<'a> {
	error_class: &'a str,
	message: &'a str,
	stacktrace: &'a [StackFrame],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionPayload {
	id: String,
	started_at: String,
	events: BTreeMap<&'static str, u32>,
}

impl SessionPayload {
	fn from_session(session: &Session) -> Self {
		Self {
			id: session.id.to_string(),
			started_at: session.started_at.to_rfc3339(),
			events: BTreeMap::from([("handled", session.handled), ("unhandled", session.unhandled)]),
		}
	}
}

#[derive(Debug, Serialize)]
struct SeverityReasonPayload {
	#[serde(rename = "type")]
	reason: SeverityReason,
}

#[derive(Debug, Serialize)]
struct NotifierPayload {
	name: &'static str,
	url: &'static str,
	version: &'static str,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::captured::CapturedError;
	use crate::raw_data::RawDatum;
	use serde_json::{json, Value};
	use tripwire_core::{ExecutionContext, HandledState};

	fn to_value(event: &Event, config: &Configuration) -> Value {
		let bytes = Payload::new(event, config).to_json().unwrap();
		serde_json::from_slice(&bytes).unwrap()
	}

	fn empty_config() -> Configuration {
		Configuration {
			hostname: None,
			release_stage: String::new(),
			..Default::default()
		}
	}

	#[test]
	fn test_small_payload() {
		let error = CapturedError {
			error_class: String::new(),
			message: String::new(),
			stacktrace: Vec::new(),
		};
		let (event, config) = Event::build(error, Vec::new(), &empty_config());

		assert_eq!(
			to_value(&event, &config),
			json!({
				"apiKey": "",
				"events": [{
					"app": {"releaseStage": ""},
					"device": {},
					"exceptions": [{"errorClass": "", "message": "", "stacktrace": []}],
					"metaData": {},
					"payloadVersion": "4",
					"severity": "warning",
					"severityReason": {"type": "handledError"},
					"unhandled": false
				}],
				"notifier": {
					"name": NOTIFIER_NAME,
					"url": NOTIFIER_URL,
					"version": NOTIFIER_VERSION
				}
			})
		);
	}

	#[test]
	fn test_large_payload() {
		let mut in_project = StackFrame::new("fetch_b", "b.rs", 99);
		in_project.in_project = true;
		let error = CapturedError {
			error_class: "error class".to_string(),
			message: "error message goes here".to_string(),
			stacktrace: vec![
				StackFrame::new("do_a", "a.rs", 65),
				in_project,
				StackFrame::new("increment_i", "i.rs", 651),
			],
		};
		let config = Configuration {
			api_key: "166f5ad3590596f9aa8d601ea89af845".to_string(),
			release_stage: "mega-production".to_string(),
			app_type: Some("axum".to_string()),
			app_version: Some("1.5.2".to_string()),
			hostname: Some("super.duper.site".to_string()),
			project_packages: vec!["fetch_b".to_string()],
			..Default::default()
		};
		let mut meta_data = MetaData::new();
		meta_data.add("custom tab", "my key", "my value");
		let session = tripwire_core::Session::start();

		let (mut event, config) = Event::build(
			error,
			vec![
				RawDatum::Context("/api/v2/albums".to_string()),
				RawDatum::Severity(Severity::Info),
				RawDatum::HandledState(
					HandledState::new(SeverityReason::UnhandledError, Severity::Info, true)
						.with_framework("axum"),
				),
				RawDatum::User(User {
					id: Some("1234baerg134".to_string()),
					name: Some("Kool Kidz on da bus".to_string()),
					email: Some("typo@busgang.com".to_string()),
				}),
				RawDatum::MetaData(meta_data),
				RawDatum::ExecutionContext(ExecutionContext::new().with_session(session.clone())),
			],
			&config,
		);
		event.grouping_hash = Some("custom grouping hash".to_string());

		let value = to_value(&event, &config);
		let sent = &value["events"][0];

		assert_eq!(value["apiKey"], "166f5ad3590596f9aa8d601ea89af845");
		assert_eq!(
			sent["app"],
			json!({"releaseStage": "mega-production", "type": "axum", "version": "1.5.2"})
		);
		assert_eq!(sent["context"], "/api/v2/albums");
		assert_eq!(sent["device"], json!({"hostname": "super.duper.site"}));
		assert_eq!(
			sent["exceptions"],
			json!([{
				"errorClass": "error class",
				"message": "error message goes here",
				"stacktrace": [
					{"method": "do_a", "file": "a.rs", "lineNumber": 65},
					{"method": "fetch_b", "file": "b.rs", "lineNumber": 99, "inProject": true},
					{"method": "increment_i", "file": "i.rs", "lineNumber": 651}
				]
			}])
		);
		assert_eq!(sent["groupingHash"], "custom grouping hash");
		assert_eq!(sent["metaData"], json!({"custom tab": {"my key": "my value"}}));
		assert_eq!(sent["payloadVersion"], "4");
		assert_eq!(sent["session"]["id"], session.id.to_string());
		assert_eq!(sent["session"]["events"], json!({"handled": 0, "unhandled": 1}));
		assert!(sent["session"]["startedAt"].is_string());
		assert_eq!(sent["severity"], "info");
		assert_eq!(sent["severityReason"], json!({"type": "unhandledError"}));
		assert_eq!(sent["unhandled"], true);
		assert_eq!(
			sent["user"],
			json!({"id": "1234baerg134", "name": "Kool Kidz on da bus", "email": "typo@busgang.com"})
		);
	}

	#[test]
	fn test_partial_user_omits_missing_fields() {
		let error = CapturedError {
			error_class: "e".to_string(),
			message: "m".to_string(),
			stacktrace: Vec::new(),
		};
		let user = User {
			email: Some("ops@example.com".to_string()),
			..Default::default()
		};
		let (event, config) = Event::build(error, vec![RawDatum::User(user)], &empty_config());

		let value = to_value(&event, &config);

		assert_eq!(value["events"][0]["user"], json!({"email": "ops@example.com"}));
		assert!(value["events"][0].get("session").is_none());
		assert!(value["events"][0].get("groupingHash").is_none());
	}
}
