// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.

use thiserror::Error;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Image errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Detection errors --
    #[error("detection pass failed: {0}")]
    Processing(String),

    #[error("invalid detection config: {0}")]
    InvalidConfig(String),

    // -- Capture --
    #[error("video source is unavailable")]
    SourceUnavailable,

    #[error("detection session error: {0}")]
    Session(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
