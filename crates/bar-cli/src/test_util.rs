use std::sync::{Mutex, MutexGuard};

/// Serializes tests that read or write process environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}
