// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of serialized events to the ingestion endpoint.

use std::time::Duration;

use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::config::Configuration;
use crate::error::{NotifyError, Result};
use crate::event::Event;
use crate::payload::{Payload, NOTIFIER_VERSION, PAYLOAD_VERSION};

/// SDK name for identification.
const SDK_NAME: &str = "tripwire-rust";

/// Header carrying the project API key.
pub const API_KEY_HEADER: &str = "Tripwire-Api-Key";
/// Header carrying the payload schema version.
pub const PAYLOAD_VERSION_HEADER: &str = "Tripwire-Payload-Version";
/// Header carrying the time the payload was sent.
pub const SENT_AT_HEADER: &str = "Tripwire-Sent-At";

/// Sends a finished event somewhere.
///
/// Implementations serialize and transmit; they do not retry. An error means
/// the event was not accepted.
#[async_trait::async_trait]
pub trait Delivery: Send + Sync {
	async fn deliver(&self, event: &Event, config: &Configuration) -> Result<()>;
}

/// Returns the User-Agent string sent with every delivery.
///
/// Format: `tripwire-rust/{version}`
pub fn user_agent() -> String {
	format!("{SDK_NAME}/{NOTIFIER_VERSION}")
}

/// Delivers events as JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDelivery {
	client: Client,
}

impl HttpDelivery {
	/// Creates a delivery with its own HTTP client.
	pub fn new(request_timeout: Duration) -> Result<Self> {
		let client = Client::builder()
			.user_agent(user_agent())
			.timeout(request_timeout)
			.build()?;
		Ok(Self { client })
	}

	/// Creates a delivery that reuses an existing HTTP client.
	pub fn with_client(client: Client) -> Self {
		Self { client }
	}
}

#[async_trait::async_trait]
impl Delivery for HttpDelivery {
	async fn deliver(&self, event: &Event, config: &Configuration) -> Result<()> {
		let body = Payload::new(event, config).to_json()?;

		debug!(endpoint = %config.endpoint, bytes = body.len(), "Sending event");

		let response = self
			.client
			.post(&config.endpoint)
			.header(CONTENT_TYPE, "application/json")
			.header(API_KEY_HEADER, &config.api_key)
			.header(PAYLOAD_VERSION_HEADER, PAYLOAD_VERSION)
			.header(SENT_AT_HEADER, Utc::now().to_rfc3339())
			.body(body)
			.send()
			.await?;

		if response.status() == StatusCode::TOO_MANY_REQUESTS {
			let retry_after = response
				.headers()
				.get("Retry-After")
				.and_then(|v| v.to_str().ok())
				.and_then(|s| s.parse().ok());
			return Err(NotifyError::RateLimited {
				retry_after_secs: retry_after,
			});
		}

		if !response.status().is_success() {
			let status = response.status().as_u16();
			let message = response.text().await.unwrap_or_default();
			return Err(NotifyError::ServerError { status, message });
		}

		info!(
			error_class = %event.error_class,
			severity = %event.severity,
			"Event delivered"
		);

		Ok(())
	}
}
