use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Runs a widget callback, turning a panic into `fallback`.
///
/// One misbehaving widget must not take the whole form down, so the fault
/// is logged and the caller carries on with a neutral result.
pub fn isolate<T>(what: &str, name: &str, fallback: T, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => v,
        Err(err) => {
            log::error!("{what} on widget '{name}' faulted: {}", panic_message(&*err));
            fallback
        }
    }
}

pub fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}
