//! Hooks that observe failed casts.
//!
//! Every typed access on an [`AnonPtr`] that names the wrong type produces an
//! [`InvalidCast`]. Before the error is returned to the caller, each installed
//! [`InvalidCastHook`] is called with it, in registration order. This is the
//! place to count, log or assert on type confusion across a whole program
//! without touching every call site.
//!
//! Hooks are called synchronously on the thread performing the cast. They
//! cannot change the outcome of the cast.
//!
//! # Examples
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use anonptr::{AnonPtr, hooks::Hooks};
//!
//! static FAILED_CASTS: AtomicUsize = AtomicUsize::new(0);
//!
//! Hooks::new()
//!     .invalid_cast_hook(|_: &anonptr::InvalidCast| {
//!         FAILED_CASTS.fetch_add(1, Ordering::Relaxed);
//!     })
//!     .install()
//!     .expect("failed to install hooks");
//!
//! let handle: AnonPtr = AnonPtr::new(1u8);
//! assert!(handle.get::<&u16>().is_err());
//! assert!(handle.cloned::<i8>().is_err());
//! assert_eq!(FAILED_CASTS.load(Ordering::Relaxed), 2);
//! ```
//!
//! [`AnonPtr`]: crate::AnonPtr

use crate::{InvalidCast, hooks::HookData};

/// A hook called for every failed cast.
///
/// Implemented automatically for closures taking `&InvalidCast`.
///
/// # Examples
///
/// ```
/// use anonptr::{InvalidCast, hooks::{Hooks, invalid_cast::InvalidCastHook}};
///
/// struct PanicOnConfusion;
///
/// impl InvalidCastHook for PanicOnConfusion {
///     fn on_invalid_cast(&self, error: &InvalidCast) {
///         if error.stored().name().contains("Secret") {
///             panic!("{error}");
///         }
///     }
/// }
///
/// let hooks = Hooks::new().invalid_cast_hook(PanicOnConfusion);
/// ```
pub trait InvalidCastHook: Send + Sync + 'static {
    /// Called with the error of a failed cast, before it is returned.
    fn on_invalid_cast(&self, error: &InvalidCast);
}

impl<F> InvalidCastHook for F
where
    F: Fn(&InvalidCast) + Send + Sync + 'static,
{
    fn on_invalid_cast(&self, error: &InvalidCast) {
        self(error);
    }
}

/// Runs the globally installed invalid-cast hooks.
pub(crate) fn run_invalid_cast_hooks(error: &InvalidCast) {
    if let Some(hooks) = HookData::fetch() {
        run_invalid_cast_hooks_with(hooks, error);
    }
}

fn run_invalid_cast_hooks_with(hooks: &HookData, error: &InvalidCast) {
    for hook in &hooks.invalid_cast_hooks {
        hook.on_invalid_cast(error);
    }
}
