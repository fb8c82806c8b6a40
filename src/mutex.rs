// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Cross-platform named inter-process mutex.
// Delegates to platform::PlatformMutex (POSIX or Windows).

use crate::error::IpcResult;
use crate::platform::PlatformMutex;

/// A named, inter-process mutex.
///
/// On POSIX this is a `pthread_mutex_t` stored in shared memory with
/// `PTHREAD_PROCESS_SHARED` and `PTHREAD_MUTEX_ROBUST` attributes.
/// On Windows this is a kernel named mutex via `CreateMutex`.
///
/// Binary-compatible with `ipc::sync::mutex` from the C++ libipc library.
pub struct IpcMutex {
    inner: PlatformMutex,
}

impl IpcMutex {
    /// Open (or create) a named inter-process mutex.
    pub fn open(name: &str) -> IpcResult<Self> {
        let inner = PlatformMutex::open(name)?;
        Ok(Self { inner })
    }

    /// Lock the mutex (blocking, infinite timeout).
    ///
    /// On POSIX, handles `EOWNERDEAD` (previous owner died) by calling
    /// `pthread_mutex_consistent` and returning success. On platforms
    /// without a robust-mutex facility, dead-owner recovery instead happens
    /// inside `lock_timeout`/`try_lock`, which can observe contention.
    pub fn lock(&self) -> IpcResult<()> {
        self.inner.lock()
    }

    /// Lock with a timeout in milliseconds. Returns `Ok(false)` on timeout.
    pub fn lock_timeout(&self, timeout_ms: u64) -> IpcResult<bool> {
        self.inner.lock_timeout(timeout_ms)
    }

    /// Try to lock without blocking.
    pub fn try_lock(&self) -> IpcResult<bool> {
        self.inner.try_lock()
    }

    /// Unlock the mutex.
    pub fn unlock(&self) -> IpcResult<()> {
        self.inner.unlock()
    }

    /// Raw pointer to the underlying native mutex object, used by
    /// `IpcCondition`'s POSIX implementation to call `pthread_cond_wait`.
    #[cfg(unix)]
    pub(crate) fn native_mutex_ptr(&self) -> *mut u8 {
        self.inner.native_ptr()
    }

    /// Remove the backing storage for a named mutex (static helper).
    pub fn clear_storage(name: &str) {
        PlatformMutex::clear_storage(name);
    }
}
