// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Pure Rust implementation of cpp-ipc shared memory and named mutex primitives.
// Binary-compatible with the C++ libipc library — same memory layout, same naming
// conventions, same POSIX/Win32 syscalls.
//
// `route` (single-writer, multi-reader) and `channel` (multi-writer,
// multi-reader) broadcast primitives live in [`channel`]. The lower-level
// building blocks (shared memory, named mutex/condition/semaphore, spin-lock,
// ring buffer slot layout) are exposed for callers that need to compose their
// own synchronization on top of the same shared-memory ABI.

pub mod shm_name;

mod platform;

mod shm;
pub use shm::{ShmHandle, ShmOpenMode};

mod error;
pub use error::{IpcError, IpcResult};

mod mutex;
pub use mutex::IpcMutex;

mod condition;
pub use condition::IpcCondition;

mod semaphore;
pub use semaphore::IpcSemaphore;

mod waiter;
pub use waiter::Waiter;

mod buffer;
pub use buffer::IpcBuffer;

mod spin_lock;
pub use spin_lock::SpinLock;

mod chunk_storage;

pub mod channel;
pub use channel::{Channel, Mode, Route};
