// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Context types for reports (user, request, execution scope).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use url::Url;

use crate::error::{CoreError, Result};
use crate::session::Session;

/// The user affected by a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
}

/// HTTP request that was being served when the fault occurred.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
	pub url: Option<String>,
	pub method: Option<String>,
	pub headers: HashMap<String, String>,
	/// Raw query string, without the leading `?`.
	pub query_string: Option<String>,
}

impl RequestContext {
	/// Builds a request context from a method and an absolute URL.
	pub fn from_url(method: impl Into<String>, url: &str) -> Result<Self> {
		let parsed = Url::parse(url).map_err(|e| CoreError::InvalidRequestUrl(format!("{url}: {e}")))?;
		Ok(Self {
			url: Some(url.to_string()),
			method: Some(method.into()),
			headers: HashMap::new(),
			query_string: parsed.query().map(str::to_string),
		})
	}

	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());
		self
	}

	/// Decodes the query string into `key -> [values]`, preserving the order in
	/// which repeated keys appear.
	pub fn query_params(&self) -> BTreeMap<String, Vec<String>> {
		let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
		if let Some(query) = self.query_string.as_deref() {
			for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
				params.entry(key.into_owned()).or_default().push(value.into_owned());
			}
		}
		params
	}
}

impl<B> From<&http::Request<B>> for RequestContext {
	fn from(request: &http::Request<B>) -> Self {
		let headers = request
			.headers()
			.iter()
			.filter_map(|(name, value)| {
				value
					.to_str()
					.ok()
					.map(|value| (name.as_str().to_string(), value.to_string()))
			})
			.collect();

		Self {
			url: Some(request.uri().to_string()),
			method: Some(request.method().as_str().to_string()),
			headers,
			query_string: request.uri().query().map(str::to_string),
		}
	}
}

/// Request-scoped values that travel with a report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
	request_body: Option<Vec<u8>>,
	session: Option<Session>,
}

impl ExecutionContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_request_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.request_body = Some(body.into());
		self
	}

	pub fn with_session(mut self, session: Session) -> Self {
		self.session = Some(session);
		self
	}

	pub fn request_body(&self) -> Option<&[u8]> {
		self.request_body.as_deref()
	}

	pub fn session(&self) -> Option<&Session> {
		self.session.as_ref()
	}

	pub fn session_mut(&mut self) -> Option<&mut Session> {
		self.session.as_mut()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_query_params_groups_repeated_keys() {
		let request = RequestContext::from_url("GET", "https://example.com/albums?id=1&tag=a&tag=b").unwrap();
		let params = request.query_params();

		assert_eq!(params["id"], vec!["1"]);
		assert_eq!(params["tag"], vec!["a", "b"]);
	}

	#[test]
	fn test_query_params_decodes_percent_encoding() {
		let request = RequestContext {
			query_string: Some("q=hello%20world&empty=".to_string()),
			..Default::default()
		};
		let params = request.query_params();

		assert_eq!(params["q"], vec!["hello world"]);
		assert_eq!(params["empty"], vec![""]);
	}

	#[test]
	fn test_query_params_empty_without_query() {
		let request = RequestContext::from_url("GET", "https://example.com/albums").unwrap();
		assert!(request.query_params().is_empty());
	}

	#[test]
	fn test_from_url_rejects_relative_url() {
		let result = RequestContext::from_url("GET", "/albums?id=1");
		assert!(matches!(result, Err(CoreError::InvalidRequestUrl(_))));
	}

	#[test]
	fn test_from_http_request() {
		let request = http::Request::builder()
			.method("POST")
			.uri("https://example.com/api/v2/albums?page=2")
			.header("content-type", "application/json")
			.body(())
			.unwrap();

		let context = RequestContext::from(&request);

		assert_eq!(context.method.as_deref(), Some("POST"));
		assert_eq!(context.query_string.as_deref(), Some("page=2"));
		assert_eq!(context.headers["content-type"], "application/json");
		assert_eq!(context.query_params()["page"], vec!["2"]);
	}

	#[test]
	fn test_user_omits_missing_fields() {
		let user = User {
			id: Some("1234".to_string()),
			..Default::default()
		};

		assert_eq!(serde_json::to_string(&user).unwrap(), r#"{"id":"1234"}"#);
	}

	#[test]
	fn test_execution_context_carries_body() {
		let ctx = ExecutionContext::new().with_request_body(b"{}".to_vec());
		assert_eq!(ctx.request_body(), Some(&b"{}"[..]));
		assert!(ctx.session().is_none());
	}
}
