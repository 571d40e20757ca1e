//! Ownership policies for the value stored inside a cell.
//!
//! Whether a cell owns its value is fixed by the slot type written into it,
//! and recorded in its vtable:
//!
//! - [`Owned<T>`]: the value is moved into a [`Box`] that the cell owns. The
//!   value is cloned into a fresh allocation when the cell is copied and is
//!   dropped exactly once when the cell is destroyed.
//! - [`Pointer<P>`]: a raw pointer is stored directly inside the cell. Copying
//!   the cell copies the pointer value; destroying the cell leaves the pointee
//!   untouched. The payload seen by callers is the pointer `P` itself.
//!
//! [`RawCell::from_value`](crate::RawCell::from_value) picks the policy from
//! the type of the value: raw pointers get a [`Pointer`] slot, everything else
//! an [`Owned`] one.
//!
//! Both policies are sealed: the vtable relies on the guarantees documented on
//! [`Slot`], so no other implementations can exist.
//!
//! [`Box`]: alloc::boxed::Box

use alloc::boxed::Box;
use core::ptr::NonNull;

/// Sealing module for the traits of this module.
mod sealed {
    /// Prevents implementations of [`Slot`](super::Slot) and
    /// [`RawPointer`](super::RawPointer) outside of this crate.
    pub trait Sealed {}
}

/// An ownership policy for the value stored in a cell.
///
/// # Guarantees
///
/// Implementations guarantee that:
///
/// 1. [`payload`](Slot::payload) and [`payload_mut`](Slot::payload_mut) return
///    pointers to an initialized `Self::Payload` that stays valid for as long
///    as the slot is borrowed, with the same aliasing rules as the borrow.
/// 2. [`duplicate`](Slot::duplicate) produces a slot that is independent of
///    `self` when [`OWNS_PAYLOAD`](Slot::OWNS_PAYLOAD) is `true`.
pub trait Slot: sealed::Sealed + Sized + 'static {
    /// The type of the value exposed to callers.
    type Payload: 'static;

    /// Whether destroying the slot destroys the payload.
    const OWNS_PAYLOAD: bool;

    /// Returns a pointer to the payload, valid for shared access.
    fn payload(&self) -> NonNull<Self::Payload>;

    /// Returns a pointer to the payload, valid for exclusive access.
    fn payload_mut(&mut self) -> NonNull<Self::Payload>;

    /// Creates a copy of the slot according to its ownership policy.
    fn duplicate(&self) -> Self;

    /// Consumes the slot and returns the payload.
    fn into_payload(self) -> Self::Payload;
}

/// A slot owning a heap-allocated value.
///
/// # Examples
///
/// ```
/// use anonptr_internals::{RawCell, slot::Owned};
///
/// let cell = RawCell::new(Owned::new(String::from("owned")));
/// assert!(cell.as_ref().owns_payload());
/// ```
pub struct Owned<T: 'static>(Box<T>);

impl<T: Clone + 'static> Owned<T> {
    /// Moves `value` into a new heap allocation owned by the slot.
    #[inline]
    pub fn new(value: T) -> Self {
        Self(Box::new(value))
    }
}

impl<T: 'static> sealed::Sealed for Owned<T> {}

impl<T: Clone + 'static> Slot for Owned<T> {
    type Payload = T;

    const OWNS_PAYLOAD: bool = true;

    #[inline]
    fn payload(&self) -> NonNull<T> {
        NonNull::from(&*self.0)
    }

    #[inline]
    fn payload_mut(&mut self) -> NonNull<T> {
        NonNull::from(&mut *self.0)
    }

    #[inline]
    fn duplicate(&self) -> Self {
        Self(Box::new(T::clone(&self.0)))
    }

    #[inline]
    fn into_payload(self) -> T {
        *self.0
    }
}

/// Raw pointer types that can be stored in a [`Pointer`] slot.
///
/// Implemented for `*const T` and `*mut T`, including pointers to unsized
/// types such as `*const str` or `*mut [u8]`.
pub trait RawPointer: sealed::Sealed + Copy + core::fmt::Debug + 'static {}

impl<T: ?Sized + 'static> sealed::Sealed for *const T {}

impl<T: ?Sized + 'static> RawPointer for *const T {}

impl<T: ?Sized + 'static> sealed::Sealed for *mut T {}

impl<T: ?Sized + 'static> RawPointer for *mut T {}

/// Returns `true` if `T` is a `*const U` or a `*mut U`.
///
/// Decided from the [`type_name`](core::any::type_name) of `T`. Only the
/// ownership policy of a cell depends on the answer; a [`Pointer`] slot still
/// clones and drops its value the way an [`Owned`] slot would.
#[inline]
pub(crate) fn is_raw_pointer<T: ?Sized>() -> bool {
    let name = core::any::type_name::<T>();
    name.starts_with("*const ") || name.starts_with("*mut ")
}

/// A slot storing a raw pointer inline.
///
/// The payload is the pointer itself, so a cell holding a `Pointer<*const T>`
/// reports `*const T` as its payload type.
///
/// # Examples
///
/// ```
/// use anonptr_internals::{RawCell, slot::Pointer};
///
/// let value = 7u32;
/// let cell = RawCell::new(Pointer::new(&raw const value));
/// assert!(!cell.as_ref().owns_payload());
///
/// // SAFETY: the cell was created from a `Pointer<*const u32>`
/// let stored = unsafe { cell.as_ref().payload_unchecked::<*const u32>() };
/// assert_eq!(*stored, &raw const value);
/// ```
pub struct Pointer<P: 'static>(P);

impl<P: RawPointer> Pointer<P> {
    /// Creates a slot holding `ptr` without taking ownership of the pointee.
    #[inline]
    pub fn new(ptr: P) -> Self {
        Self(ptr)
    }
}

impl<P: Clone + 'static> Pointer<P> {
    /// Wraps a value already known to be a raw pointer through
    /// [`is_raw_pointer`].
    #[inline]
    pub(crate) fn from_value(value: P) -> Self {
        debug_assert!(is_raw_pointer::<P>());
        Self(value)
    }
}

impl<P: 'static> sealed::Sealed for Pointer<P> {}

impl<P: Clone + 'static> Slot for Pointer<P> {
    type Payload = P;

    const OWNS_PAYLOAD: bool = false;

    #[inline]
    fn payload(&self) -> NonNull<P> {
        NonNull::from(&self.0)
    }

    #[inline]
    fn payload_mut(&mut self) -> NonNull<P> {
        NonNull::from(&mut self.0)
    }

    #[inline]
    fn duplicate(&self) -> Self {
        Self(self.0.clone())
    }

    #[inline]
    fn into_payload(self) -> P {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec, vec::Vec};

    use super::*;

    #[test]
    fn test_owned_duplicate_is_independent() {
        let original = Owned::new(vec![1, 2, 3]);
        let mut copy = original.duplicate();

        // SAFETY: `copy` is exclusively borrowed for the duration of the write
        unsafe { copy.payload_mut().as_mut() }.push(4);

        // SAFETY: `original` is borrowed for the duration of the read
        let original_payload: &Vec<i32> = unsafe { original.payload().as_ref() };
        assert_eq!(original_payload, &[1, 2, 3]);
        assert_ne!(original.payload(), copy.payload());
        assert_eq!(copy.into_payload(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_pointer_duplicate_copies_address() {
        let mut target = String::from("target");
        let ptr: *mut String = &raw mut target;

        let slot = Pointer::new(ptr);
        let copy = slot.duplicate();

        assert_eq!(slot.into_payload(), ptr);
        assert_eq!(copy.into_payload(), ptr);
        assert_eq!(target, "target");
    }

    #[test]
    fn test_pointer_payload_is_inline() {
        let slot = Pointer::new(core::ptr::null::<u8>());
        let slot_addr = (&raw const slot).cast::<u8>();
        assert_eq!(slot.payload().as_ptr().cast::<u8>().cast_const(), slot_addr);
        assert!(slot.into_payload().is_null());
    }

    #[test]
    fn test_unsized_pointers() {
        let text: &'static str = "borrowed";
        let slot = Pointer::new(text as *const str);
        let stored = slot.into_payload();
        assert!(!stored.is_null());
        assert_eq!(stored.cast::<u8>(), text.as_ptr());
    }

    #[test]
    fn test_is_raw_pointer() {
        assert!(is_raw_pointer::<*const u8>());
        assert!(is_raw_pointer::<*mut String>());
        assert!(is_raw_pointer::<*const str>());
        assert!(is_raw_pointer::<*mut [u8]>());
        assert!(is_raw_pointer::<*const *mut u8>());

        assert!(!is_raw_pointer::<u8>());
        assert!(!is_raw_pointer::<&'static u8>());
        assert!(!is_raw_pointer::<Option<*const u8>>());
        assert!(!is_raw_pointer::<(*const u8, u8)>());
        assert!(!is_raw_pointer::<core::ptr::NonNull<u8>>());
        assert!(!is_raw_pointer::<Box<u8>>());
    }

    #[test]
    fn test_ownership_flags() {
        const { assert!(<Owned<u8> as Slot>::OWNS_PAYLOAD) };
        const { assert!(!<Pointer<*const u8> as Slot>::OWNS_PAYLOAD) };
    }
}
