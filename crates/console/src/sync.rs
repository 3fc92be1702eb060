//! Lock helpers.
//!
//! Critical sections in this crate never span an `.await` and never panic
//! while holding a guard, so a poisoned lock still guards consistent data.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
