// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Cross-platform named counting semaphore.
// POSIX: a named sem_t via sem_open. Windows: a kernel semaphore via
// CreateSemaphoreW. Used internally by the Windows condition variable
// emulation, and available as a building block in its own right.

use crate::error::IpcResult;
use crate::platform::PlatformSemaphore;

/// A named, inter-process counting semaphore.
pub struct IpcSemaphore {
    inner: PlatformSemaphore,
}

impl IpcSemaphore {
    /// Open (or create) a named semaphore with an initial count.
    pub fn open(name: &str, initial: u32) -> IpcResult<Self> {
        let inner = PlatformSemaphore::open(name, initial)?;
        Ok(Self { inner })
    }

    /// Increment the count `n` times, waking up to `n` waiters.
    pub fn post(&self, n: u32) -> IpcResult<()> {
        self.inner.post(n)
    }

    /// Decrement the count by one, blocking until it is positive.
    /// `None` blocks indefinitely, `Some(0)` never blocks.
    /// Returns `Ok(false)` on timeout.
    pub fn wait(&self, timeout_ms: Option<u64>) -> IpcResult<bool> {
        self.inner.wait(timeout_ms)
    }

    /// Drain any pending count and wake every waiter.
    pub fn clear(&self) -> IpcResult<()> {
        self.inner.clear()
    }

    /// Remove the backing storage for a named semaphore.
    pub fn clear_storage(name: &str) {
        PlatformSemaphore::clear_storage(name);
    }
}
