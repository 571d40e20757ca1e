//! Request shapes for typed access to a handle.
//!
//! A typed access names both the stored type and the *shape* in which the
//! caller wants it. The shape decides whether the access is shared or
//! exclusive; the stored type is matched exactly, by [`TypeId`], in every
//! shape.
//!
//! | Shape        | Method                          | Access    |
//! |--------------|---------------------------------|-----------|
//! | `&T`         | [`get`](crate::AnonPtr::get)         | shared    |
//! | `*const T`   | [`get`](crate::AnonPtr::get)         | shared    |
//! | `&mut T`     | [`get_mut`](crate::AnonPtr::get_mut) | exclusive |
//! | `*mut T`     | [`get_mut`](crate::AnonPtr::get_mut) | exclusive |
//! | `T` (copy)   | [`cloned`](crate::AnonPtr::cloned)   | shared    |
//! | `T` (move)   | [`take`](crate::AnonPtr::take)       | consuming |
//!
//! Exclusive shapes require the stored type to be a [`Payload`]. A handle
//! holding a raw pointer refuses them as well, with an [`InvalidCast`] for
//! which [`is_pointer_rebind`] holds. The stored address can be read but never
//! rebound through a reference into the handle:
//!
//! ```
//! use anonptr::AnonPtr;
//!
//! let value = 1u8;
//! let mut handle: AnonPtr = AnonPtr::new(&raw const value);
//!
//! assert_eq!(handle.get::<&*const u8>().copied(), Ok(&raw const value));
//! assert!(handle.get_mut::<&mut *const u8>().unwrap_err().is_pointer_rebind());
//! ```
//!
//! Raw pointers are neither `Send` nor `Sync`, so a thread-safe handle cannot
//! hold one at all:
//!
//! ```compile_fail
//! use anonptr::{AnonPtr, markers::SendSync};
//!
//! let value = 1u8;
//! let mut handle: AnonPtr<SendSync> = AnonPtr::new(&raw const value);
//! let _ = handle.get_mut::<&mut *const u8>();
//! ```
//!
//! [`TypeId`]: core::any::TypeId
//! [`Payload`]: crate::markers::Payload
//! [`InvalidCast`]: crate::InvalidCast
//! [`is_pointer_rebind`]: crate::InvalidCast::is_pointer_rebind

use core::ptr::NonNull;

use crate::markers::Payload;

mod sealed {
    /// Prevents implementations of the shape traits outside of this crate.
    pub trait Sealed {}
}

/// A shape for shared access to the payload of a handle.
///
/// Implemented for `&'a T` and `*const T`. This trait is sealed.
pub trait Cast<'a>: sealed::Sealed + Sized {
    /// The stored type this shape asks for.
    type Target: 'static;

    /// Builds the shape from the address of the payload.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live `Self::Target`.
    /// 2. The pointee stays valid for shared access for the lifetime `'a`.
    #[doc(hidden)]
    unsafe fn from_payload(ptr: NonNull<()>) -> Self;
}

/// A shape for exclusive access to the payload of a handle.
///
/// Implemented for `&'a mut T` and `*mut T`, where `T` is a [`Payload`]. This
/// trait is sealed.
pub trait CastMut<'a>: sealed::Sealed + Sized {
    /// The stored type this shape asks for.
    type Target: Payload;

    /// Builds the shape from the address of the payload.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live `Self::Target`.
    /// 2. The pointee stays valid for exclusive access for the lifetime `'a`.
    #[doc(hidden)]
    unsafe fn from_payload_mut(ptr: NonNull<()>) -> Self;
}

impl<T: 'static> sealed::Sealed for &T {}

impl<'a, T: 'static> Cast<'a> for &'a T {
    type Target = T;

    #[inline]
    unsafe fn from_payload(ptr: NonNull<()>) -> Self {
        // SAFETY:
        // 1. The pointer points to a live `T` (guaranteed by the caller)
        // 2. Shared access is valid for 'a (guaranteed by the caller)
        unsafe { ptr.cast::<T>().as_ref() }
    }
}

impl<T: 'static> sealed::Sealed for *const T {}

impl<T: 'static> Cast<'_> for *const T {
    type Target = T;

    #[inline]
    unsafe fn from_payload(ptr: NonNull<()>) -> Self {
        ptr.cast::<T>().as_ptr().cast_const()
    }
}

impl<T: 'static> sealed::Sealed for &mut T {}

impl<'a, T: Payload> CastMut<'a> for &'a mut T {
    type Target = T;

    #[inline]
    unsafe fn from_payload_mut(ptr: NonNull<()>) -> Self {
        // SAFETY:
        // 1. The pointer points to a live `T` (guaranteed by the caller)
        // 2. Exclusive access is valid for 'a (guaranteed by the caller)
        unsafe { ptr.cast::<T>().as_mut() }
    }
}

impl<T: 'static> sealed::Sealed for *mut T {}

impl<T: Payload> CastMut<'_> for *mut T {
    type Target = T;

    #[inline]
    unsafe fn from_payload_mut(ptr: NonNull<()>) -> Self {
        ptr.cast::<T>().as_ptr()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use core::any::TypeId;

    use super::*;

    fn target<'a, S: Cast<'a>>() -> TypeId {
        TypeId::of::<S::Target>()
    }

    fn target_mut<'a, S: CastMut<'a>>() -> TypeId {
        TypeId::of::<S::Target>()
    }

    #[test]
    fn test_const_qualification_maps_to_same_target() {
        assert_eq!(target::<&String>(), TypeId::of::<String>());
        assert_eq!(target::<*const String>(), TypeId::of::<String>());
        assert_eq!(target_mut::<&mut String>(), TypeId::of::<String>());
        assert_eq!(target_mut::<*mut String>(), TypeId::of::<String>());
        assert_eq!(target::<&*mut u8>(), TypeId::of::<*mut u8>());
        assert_eq!(target::<*const *mut u8>(), TypeId::of::<*mut u8>());
    }

    #[test]
    fn test_shapes_view_the_same_address() {
        let mut value = String::from("shape");
        let ptr = NonNull::from(&mut value).cast::<()>();

        // SAFETY: `ptr` points to a live `String` that outlives the shared views
        let shared: &String = unsafe { <&String>::from_payload(ptr) };
        // SAFETY: `ptr` points to a live `String`
        let raw_const: *const String = unsafe { <*const String>::from_payload(ptr) };
        assert!(core::ptr::eq(shared, raw_const));

        // SAFETY: `ptr` points to a live `String` and no other view is used
        // while the exclusive one is alive
        let exclusive: &mut String = unsafe { <&mut String>::from_payload_mut(ptr) };
        exclusive.push('s');
        assert_eq!(value, "shapes");
    }

    #[test]
    fn test_exclusive_shapes_require_payload() {
        struct Unique;

        static_assertions::assert_not_impl_any!(&'static mut Unique: CastMut<'static>);
        static_assertions::assert_not_impl_any!(*mut Unique: CastMut<'static>);
        static_assertions::assert_impl_all!(&'static Unique: Cast<'static>);
        static_assertions::assert_impl_all!(*const Unique: Cast<'static>);
    }
}
