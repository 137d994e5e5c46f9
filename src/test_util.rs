//! Shared helpers for unit tests.

/// Serializes environment-variable manipulation across parallel test
/// threads.
pub(crate) static TEST_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run `body` with the given variables set (`Some`) or removed (`None`),
/// restoring the previous values before returning.
pub(crate) fn with_env<R>(vars: &[(&str, Option<&str>)], body: impl FnOnce() -> R) -> R {
    let lock = TEST_ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(name, _)| ((*name).to_string(), std::env::var(*name).ok()))
        .collect();
    // SAFETY: Protected by TEST_ENV_MUTEX; restored before lock is released.
    #[allow(unsafe_code)]
    unsafe {
        for (name, value) in vars {
            match value {
                Some(v) => std::env::set_var(name, v),
                None => std::env::remove_var(name),
            }
        }
    }
    let result = body();
    // SAFETY: Protected by TEST_ENV_MUTEX; restores the saved values.
    #[allow(unsafe_code)]
    unsafe {
        for (name, value) in saved {
            match value {
                Some(v) => std::env::set_var(&name, v),
                None => std::env::remove_var(&name),
            }
        }
    }
    drop(lock);
    result
}
