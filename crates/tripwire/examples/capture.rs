// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: Report an error and a panic using the tripwire SDK.
//!
//! Run with:
//!   TRIPWIRE_API_KEY=... cargo run --example capture -p tripwire

use tracing_subscriber::EnvFilter;
use tripwire::{CapturedError, MetaData, Notifier, RawDatum, RequestContext, Severity, User};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let api_key =
		std::env::var("TRIPWIRE_API_KEY").expect("TRIPWIRE_API_KEY environment variable required");
	let endpoint = std::env::var("TRIPWIRE_ENDPOINT")
		.unwrap_or_else(|_| tripwire::config::DEFAULT_ENDPOINT.to_string());

	println!("Initializing notifier...");
	println!("  Endpoint: {}", endpoint);

	let notifier = Notifier::builder()
		.api_key(&api_key)
		.endpoint(&endpoint)
		.release_stage("development")
		.app_version("0.1.0-example")
		.synchronous(true)
		.project_packages(["capture"])
		.raw_data(User {
			id: Some("user_example_123".to_string()),
			email: Some("example@example.com".to_string()),
			name: None,
		})
		.build()?;

	notifier.middleware().on_before_notify(|event, _config| {
		event.meta_data.add("example", "middleware", true);
		Ok(())
	});

	let mut meta_data = MetaData::new();
	meta_data.add("job", "attempt", 3);

	println!("\nReporting an error...");
	let io_error = std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timed out");
	notifier
		.notify(
			CapturedError::from(&io_error),
			vec![
				RawDatum::Severity(Severity::Error),
				RawDatum::Context("sync-job".to_string()),
				RawDatum::MetaData(meta_data),
				RawDatum::Request(RequestContext::from_url(
					"GET",
					"https://example.com/albums?id=1",
				)?),
			],
		)
		.await?;

	println!("\nReporting a recovered panic...");
	let outcome = notifier
		.recover(Vec::new(), async {
			let values: Vec<u32> = Vec::new();
			values[1]
		})
		.await;
	println!("  Recovered: {}", outcome.is_none());

	Ok(())
}
