// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Tripwire error reporting client.
//!
//! This crate provides the value types shared by the client SDK (`tripwire`)
//! and anything that consumes its wire format: severities and the provenance
//! of a severity, handled/unhandled state, user and request context, report
//! metadata, stack frames and session summaries.
//!
//! # Overview
//!
//! - [`Severity`] and [`SeverityReason`] describe how serious a report is and
//!   why it holds that severity
//! - [`HandledState`] records whether the application recovered the fault
//! - [`MetaData`] is the tab → key → value bag attached to every report
//! - [`RequestContext`] and [`ExecutionContext`] carry request-scoped data
//!   that middleware turns into metadata

pub mod context;
pub mod error;
pub mod metadata;
pub mod session;
pub mod severity;
pub mod stacktrace;

pub use context::{ExecutionContext, RequestContext, User};
pub use error::{CoreError, Result};
pub use metadata::MetaData;
pub use session::Session;
pub use severity::{HandledState, Severity, SeverityReason};
pub use stacktrace::StackFrame;
