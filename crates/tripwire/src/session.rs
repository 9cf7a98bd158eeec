// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Boundary to an external session tracker.

use crate::error::Result;

/// Session tracking collaborator.
///
/// The notifier only needs to flush buffered sessions before `auto_notify`
/// re-raises a panic that may take the process down.
#[async_trait::async_trait]
pub trait SessionTracker: Send + Sync {
	/// Sends every buffered session now.
	async fn flush_sessions(&self) -> Result<()>;
}
