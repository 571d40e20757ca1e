use crate::{
    AnonPtr,
    markers::{Local, ObjectMarkerFor, Payload},
};

/// Extension trait for converting values into an [`AnonPtr`] with method
/// syntax.
///
/// This is the same as calling [`AnonPtr::new`], including returning a handle
/// of the same type unchanged instead of nesting it.
///
/// # Examples
///
/// ```
/// use anonptr::{AnonPtr, IntoAnonPtr, markers::SendSync};
///
/// let local: AnonPtr = 42u32.into_anon();
/// assert!(local.is::<u32>());
///
/// let shared: AnonPtr<SendSync> = String::from("shared").into_anon();
/// assert!(shared.is::<String>());
///
/// // Converting a handle into its own type is a no-op
/// let again: AnonPtr = local.into_anon();
/// assert!(again.is::<u32>());
/// ```
pub trait IntoAnonPtr<ThreadSafety: 'static = Local>: Sized {
    /// Converts `self` into a handle.
    #[must_use]
    fn into_anon(self) -> AnonPtr<ThreadSafety>;
}

impl<P, T> IntoAnonPtr<T> for P
where
    P: Payload + ObjectMarkerFor<T>,
    T: 'static,
{
    #[inline]
    fn into_anon(self) -> AnonPtr<T> {
        AnonPtr::new(self)
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;

    use super::*;
    use crate::markers::SendSync;

    #[test]
    fn test_into_anon_uses_marker_from_target() {
        let local: AnonPtr<Local> = Rc::new(1u8).into_anon();
        assert!(local.is::<Rc<u8>>());

        let shared: AnonPtr<SendSync> = 1u8.into_anon();
        assert!(shared.is::<u8>());
    }

    #[test]
    fn test_into_anon_does_not_nest() {
        let handle: AnonPtr = 'x'.into_anon();
        let same: AnonPtr = handle.into_anon();
        assert_eq!(same.cloned::<char>(), Ok('x'));
    }

    #[test]
    fn test_into_anon_keeps_pointers_unowned() {
        let value = 3i32;
        let mut handle: AnonPtr = (&raw const value).into_anon();
        assert!(!handle.owns_payload());
        assert!(handle.is::<*const i32>());
        assert_eq!(handle.pointer::<*const i32>(), Ok(&raw const value));
        assert!(handle.get_mut::<&mut *const i32>().unwrap_err().is_pointer_rebind());
    }
}
