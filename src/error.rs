// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Error type shared by every public operation in this crate. Platform
// errors are wrapped rather than discarded; everything else is one of the
// kinds a caller can act on without inspecting an OS error code.

use std::fmt;
use std::io;

/// Convenience alias used throughout the public API.
pub type IpcResult<T> = Result<T, IpcError>;

/// Every error a route, channel, or underlying primitive can produce.
#[derive(Debug)]
pub enum IpcError {
    /// A caller-supplied argument was invalid (empty name, zero size, ...).
    InvalidArgument(String),
    /// A platform call failed; the original `io::Error` is preserved.
    OsError(io::Error),
    /// `ShmOpenMode::Create` was used but the resource already existed.
    AlreadyExists(String),
    /// `ShmOpenMode::Open` was used but the resource did not exist.
    NotFound(String),
    /// A receiver tried to connect but all 32 connection bits are taken.
    NoBitAvailable,
    /// A send was attempted with no reader connected.
    NoReader,
    /// A receive was attempted with no sender connected.
    NoSender,
    /// A blocking operation exceeded its deadline.
    TimedOut,
    /// A sender called `recv`, or a receiver called `send`.
    PermissionDenied(String),
}

impl fmt::Display for IpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::OsError(e) => write!(f, "os error: {e}"),
            Self::AlreadyExists(name) => write!(f, "already exists: {name}"),
            Self::NotFound(name) => write!(f, "not found: {name}"),
            Self::NoBitAvailable => write!(f, "no connection bit available (max 32 readers)"),
            Self::NoReader => write!(f, "no reader connected"),
            Self::NoSender => write!(f, "no sender connected"),
            Self::TimedOut => write!(f, "operation timed out"),
            Self::PermissionDenied(msg) => write!(f, "permission denied: {msg}"),
        }
    }
}

impl std::error::Error for IpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::OsError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for IpcError {
    fn from(e: io::Error) -> Self {
        Self::OsError(e)
    }
}
