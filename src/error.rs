use core::ops::Deref;

use crate::{AnonPtr, TypeIdentity};

/// Error returned when a handle is accessed as a type other than the one it
/// stores.
///
/// Matching is exact: no conversion, coercion or upcasting is attempted, so
/// asking for a `f64` when an `f32` is stored fails just like asking for a
/// `String` would.
///
/// # Examples
///
/// ```
/// use anonptr::{AnonPtr, InvalidCast};
///
/// let handle: AnonPtr = AnonPtr::new(3.7f32);
/// let error: InvalidCast = handle.get::<&i32>().unwrap_err();
///
/// assert!(error.requested().is::<i32>());
/// assert!(error.stored().is::<f32>());
/// assert_eq!(
///     error.to_string(),
///     "invalid cast to `i32`: underlying object is `f32`"
/// );
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InvalidCast {
    requested: TypeIdentity,
    stored: TypeIdentity,
    pointer_rebind: bool,
}

impl InvalidCast {
    #[inline]
    pub(crate) fn new(requested: TypeIdentity, stored: TypeIdentity) -> Self {
        Self {
            requested,
            stored,
            pointer_rebind: false,
        }
    }

    /// The error for an exclusive access to a raw pointer the handle does not
    /// own. The stored type matches; the access shape does not.
    #[inline]
    pub(crate) fn pointer_rebind(requested: TypeIdentity, stored: TypeIdentity) -> Self {
        Self {
            requested,
            stored,
            pointer_rebind: true,
        }
    }

    /// Reports the error to the installed invalid-cast hooks and, with the
    /// `tracing` feature, as a `debug` event.
    #[cold]
    pub(crate) fn observed(self) -> Self {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "anonptr::cast",
            requested = self.requested.name(),
            stored = self.stored.name(),
            pointer_rebind = self.pointer_rebind,
            "invalid cast"
        );

        crate::hooks::invalid_cast::run_invalid_cast_hooks(&self);
        self
    }

    /// Returns the identity of the type that was asked for.
    #[must_use]
    #[inline]
    pub fn requested(&self) -> TypeIdentity {
        self.requested
    }

    /// Returns the identity of the type that the handle actually stores.
    #[must_use]
    #[inline]
    pub fn stored(&self) -> TypeIdentity {
        self.stored
    }

    /// Returns `true` if the requested type matched, but the access asked
    /// for a `&mut` or `*mut` into a raw pointer the handle does not own.
    ///
    /// A handle holding a raw pointer hands it out by value or by shared
    /// reference only, so the stored address can never be rebound.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let value = 1u8;
    /// let mut handle: AnonPtr = AnonPtr::new(&raw const value);
    ///
    /// let error = handle.get_mut::<&mut *const u8>().unwrap_err();
    /// assert!(error.is_pointer_rebind());
    /// assert_eq!(
    ///     error.to_string(),
    ///     "invalid exclusive cast to `*const u8`: underlying pointer `*const u8` is not owned by the handle"
    /// );
    /// ```
    #[must_use]
    #[inline]
    pub fn is_pointer_rebind(&self) -> bool {
        self.pointer_rebind
    }
}

impl core::fmt::Display for InvalidCast {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.pointer_rebind {
            write!(
                f,
                "invalid exclusive cast to `{}`: underlying pointer `{}` is not owned by the handle",
                self.requested, self.stored
            )
        } else {
            write!(
                f,
                "invalid cast to `{}`: underlying object is `{}`",
                self.requested, self.stored
            )
        }
    }
}

impl core::error::Error for InvalidCast {}

/// Error returned by [`AnonPtr::take`] when the handle stores a different
/// type than the one requested.
///
/// The handle is moved into the error untouched, so nothing is lost on a
/// failed take: recover it with [`into_inner`](Self::into_inner). The error
/// dereferences to the underlying [`InvalidCast`], which is also reported as
/// its [`source`](core::error::Error::source).
///
/// # Examples
///
/// ```
/// use anonptr::AnonPtr;
///
/// let handle: AnonPtr = AnonPtr::new(String::from("kept"));
/// let error = handle.take::<Vec<u8>>().unwrap_err();
/// assert!(error.requested().is::<Vec<u8>>());
///
/// let handle = error.into_inner();
/// assert_eq!(handle.take::<String>().unwrap(), "kept");
/// ```
pub struct TakeError<ThreadSafety: 'static> {
    handle: AnonPtr<ThreadSafety>,
    error: InvalidCast,
}

impl<T> TakeError<T> {
    #[inline]
    pub(crate) fn new(handle: AnonPtr<T>, error: InvalidCast) -> Self {
        Self { handle, error }
    }

    /// Returns the [`InvalidCast`] describing the mismatch.
    #[must_use]
    #[inline]
    pub fn error(&self) -> &InvalidCast {
        &self.error
    }

    /// Returns a reference to the handle that could not be taken apart.
    #[must_use]
    #[inline]
    pub fn handle(&self) -> &AnonPtr<T> {
        &self.handle
    }

    /// Returns the handle, discarding the error.
    #[must_use]
    #[inline]
    pub fn into_inner(self) -> AnonPtr<T> {
        self.handle
    }

    /// Returns both the handle and the error.
    #[must_use]
    #[inline]
    pub fn into_parts(self) -> (AnonPtr<T>, InvalidCast) {
        (self.handle, self.error)
    }
}

impl<T> Deref for TakeError<T> {
    type Target = InvalidCast;

    fn deref(&self) -> &InvalidCast {
        &self.error
    }
}

impl<T> From<TakeError<T>> for InvalidCast {
    fn from(error: TakeError<T>) -> Self {
        error.error
    }
}

impl<T> core::fmt::Debug for TakeError<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TakeError")
            .field("handle", &self.handle)
            .field("error", &self.error)
            .finish()
    }
}

impl<T> core::fmt::Display for TakeError<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "cannot take the payload out of the handle: {}", self.error)
    }
}

impl<T> core::error::Error for TakeError<T> {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.error)
    }
}
