// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error and panic reporting client.
//!
//! A [`Notifier`] turns an error plus a list of [`RawDatum`] values into an
//! [`Event`], runs it through the [`MiddlewareStack`], checks the release
//! stage and hands it to a [`Delivery`]. Delivery is either awaited or run on
//! a detached task depending on the notifier's `synchronous` setting.
//!
//! # Example
//!
//! ```ignore
//! use tripwire::{CapturedError, Notifier, RawDatum, Severity, User};
//!
//! let notifier = Notifier::builder()
//!     .api_key("your_api_key")
//!     .app_version("1.2.3")
//!     .project_packages(["my_app::*"])
//!     .build()?;
//!
//! notifier
//!     .notify(
//!         CapturedError::new("PaymentDeclined", "card expired"),
//!         vec![
//!             RawDatum::Severity(Severity::Info),
//!             RawDatum::Context("/checkout".to_string()),
//!             RawDatum::User(User { id: Some("42".into()), ..Default::default() }),
//!         ],
//!     )
//!     .await?;
//! ```

pub mod backtrace;
pub mod captured;
pub mod config;
pub mod delivery;
pub mod error;
pub mod event;
pub mod middleware;
pub mod notifier;
pub mod panic_hook;
pub mod payload;
pub mod raw_data;
pub mod session;

pub use captured::CapturedError;
pub use config::{ConfigOverride, Configuration};
pub use delivery::{Delivery, HttpDelivery};
pub use error::{BoxError, NotifyError, Result};
pub use event::Event;
pub use middleware::{BeforeNotify, MiddlewareStack};
pub use notifier::{Notifier, NotifierBuilder};
pub use panic_hook::install_panic_hook;
pub use raw_data::RawDatum;
pub use session::SessionTracker;

pub use tripwire_core::{
	ExecutionContext, HandledState, MetaData, RequestContext, Session, Severity, SeverityReason,
	StackFrame, User,
};
