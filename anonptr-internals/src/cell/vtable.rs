//! Vtable for type-erased cell operations.
//!
//! This module contains the [`CellVtable`] which enables operating on a cell
//! when its concrete slot type `S` has been erased. The vtable stores function
//! pointers that dispatch to the correct typed implementations.
//!
//! This module encapsulates the fields of [`CellVtable`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameter must match the actual slot type
//! stored in the [`CellData`]**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`CellVtable::new`], which pairs the function pointers with
//! a specific slot type `S` at compile time.

use core::{any::TypeId, ptr::NonNull};

use crate::{
    cell::{
        data::CellData,
        raw::{RawCellMut, RawCellRef, StorageWords},
    },
    slot::Slot,
    util::Erased,
};

/// Vtable for type-erased cell operations.
///
/// Contains function pointers for performing operations on cells without
/// knowing their concrete slot type at compile time.
///
/// # Safety Invariant
///
/// The fields `payload`, `payload_mut`, `clone_into`, `move_out` and `drop`
/// are guaranteed to point to the functions defined below instantiated with
/// the slot type `S` that was used to create this [`CellVtable`].
pub(crate) struct CellVtable {
    /// Gets the [`TypeId`] of the payload of the slot type that was used to
    /// create this [`CellVtable`].
    type_id: fn() -> TypeId,
    /// Gets the name of the payload type.
    type_name: fn() -> &'static str,
    /// Whether the slot owns its payload.
    owns_payload: bool,
    /// Gets the address of the payload for shared access.
    payload: unsafe fn(RawCellRef<'_>) -> NonNull<()>,
    /// Gets the address of the payload for exclusive access.
    payload_mut: unsafe fn(RawCellMut<'_>) -> NonNull<()>,
    /// Writes a copy of the cell into the given storage.
    clone_into: unsafe fn(RawCellRef<'_>, &mut StorageWords),
    /// Moves the payload out of the cell into the given memory.
    move_out: unsafe fn(NonNull<CellData<Erased>>, NonNull<()>),
    /// Drops the [`CellData<S>`] in place.
    drop: unsafe fn(NonNull<CellData<Erased>>),
}

impl CellVtable {
    /// Creates a new [`CellVtable`] for the slot type `S`.
    pub(super) const fn new<S: Slot>() -> &'static Self {
        const {
            &Self {
                type_id: TypeId::of::<S::Payload>,
                type_name: core::any::type_name::<S::Payload>,
                owns_payload: S::OWNS_PAYLOAD,
                payload: payload::<S>,
                payload_mut: payload_mut::<S>,
                clone_into: clone_into::<S>,
                move_out: move_out::<S>,
                drop: drop::<S>,
            }
        }
    }

    /// Gets the [`TypeId`] of the payload of the slot type that was used to
    /// create this [`CellVtable`].
    #[inline]
    pub(super) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the name of the payload type.
    #[inline]
    pub(super) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Whether destroying the cell destroys its payload.
    #[inline]
    pub(super) fn owns_payload(&self) -> bool {
        self.owns_payload
    }

    /// Gets the address of the payload for shared access.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`CellVtable`] must be a vtable for the slot type stored in the
    ///    [`RawCellRef`].
    #[inline]
    pub(super) unsafe fn payload(&self, ptr: RawCellRef<'_>) -> NonNull<()> {
        // SAFETY: We know that the `self.payload` field points to the function
        // `payload::<S>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe {
            // @add-unsafe-context: payload
            (self.payload)(ptr)
        }
    }

    /// Gets the address of the payload for exclusive access.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`CellVtable`] must be a vtable for the slot type stored in the
    ///    [`RawCellMut`].
    #[inline]
    pub(super) unsafe fn payload_mut(&self, ptr: RawCellMut<'_>) -> NonNull<()> {
        // SAFETY: We know that the `self.payload_mut` field points to the function
        // `payload_mut::<S>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe {
            // @add-unsafe-context: payload_mut
            (self.payload_mut)(ptr)
        }
    }

    /// Writes a copy of the cell pointed to by `ptr` into `storage`.
    ///
    /// Whatever `storage` held before is overwritten without being dropped.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`CellVtable`] must be a vtable for the slot type stored in the
    ///    [`RawCellRef`].
    #[inline]
    pub(super) unsafe fn clone_into(&self, ptr: RawCellRef<'_>, storage: &mut StorageWords) {
        // SAFETY: We know that the `self.clone_into` field points to the function
        // `clone_into::<S>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe {
            // @add-unsafe-context: clone_into
            (self.clone_into)(ptr, storage);
        }
    }

    /// Moves the payload of the cell pointed to by `ptr` into `out`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer points to an initialized [`CellData`] that was written
    ///    by [`CellData::emplace_unchecked`].
    /// 2. This [`CellVtable`] must be a vtable for the slot type stored in the
    ///    [`CellData`].
    /// 3. `out` is valid for a write of the payload type of the slot.
    /// 4. This method takes ownership of the [`CellData`], so the caller must
    ///    ensure that it has not previously been dropped or moved out of, and
    ///    that it will not be used or dropped after calling this method.
    #[inline]
    pub(super) unsafe fn move_out(&self, ptr: NonNull<CellData<Erased>>, out: NonNull<()>) {
        // SAFETY: We know that the `self.move_out` field points to the function
        // `move_out::<S>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        // 4. Guaranteed by the caller
        unsafe {
            // @add-unsafe-context: move_out
            (self.move_out)(ptr, out);
        }
    }

    /// Drops the [`CellData<S>`] pointed to by this pointer in place.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer points to an initialized [`CellData`] that was written
    ///    by [`CellData::emplace_unchecked`].
    /// 2. This [`CellVtable`] must be a vtable for the slot type stored in the
    ///    [`CellData`].
    /// 3. This method drops the [`CellData<S>`], so the caller must ensure that
    ///    it has not previously been dropped or moved out of, and that it will
    ///    not be used after calling this method.
    #[inline]
    pub(super) unsafe fn drop(&self, ptr: NonNull<CellData<Erased>>) {
        // SAFETY: We know that `self.drop` points to the function `drop::<S>` below.
        // That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe {
            // @add-unsafe-context: drop
            (self.drop)(ptr);
        }
    }
}

/// Gets the address of the payload for shared access.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `S` matches the actual slot type stored in the [`CellData`]
unsafe fn payload<S: Slot>(ptr: RawCellRef<'_>) -> NonNull<()> {
    // SAFETY:
    // 1. Guaranteed by the caller
    let slot: &S = unsafe { ptr.slot_unchecked::<S>() };
    slot.payload().cast::<()>()
}

/// Gets the address of the payload for exclusive access.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `S` matches the actual slot type stored in the [`CellData`]
unsafe fn payload_mut<S: Slot>(ptr: RawCellMut<'_>) -> NonNull<()> {
    // SAFETY:
    // 1. Guaranteed by the caller
    let slot: &mut S = unsafe { ptr.slot_unchecked_mut::<S>() };
    slot.payload_mut().cast::<()>()
}

/// Writes a duplicate of the slot into `storage`, paired with the same
/// vtable.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `S` matches the actual slot type stored in the [`CellData`]
unsafe fn clone_into<S: Slot>(ptr: RawCellRef<'_>, storage: &mut StorageWords) {
    // SAFETY:
    // 1. Guaranteed by the caller
    let slot: &S = unsafe { ptr.slot_unchecked::<S>() };
    let data = CellData::new(slot.duplicate());

    // SAFETY:
    // 1. A `CellData<S>` already lives in a storage of the same type, so it fits
    unsafe {
        // @add-unsafe-context: CellData
        data.emplace_unchecked(storage);
    }
}

/// Reads the [`CellData<S>`] out of its storage and writes its payload to
/// `out`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer points to an initialized [`CellData`] that was written by
///    [`CellData::emplace_unchecked`].
/// 2. The type `S` matches the actual slot type stored in the [`CellData`]
/// 3. `out` is valid for a write of `S::Payload`.
/// 4. The [`CellData`] is not used or dropped after calling this method.
unsafe fn move_out<S: Slot>(ptr: NonNull<CellData<Erased>>, out: NonNull<()>) {
    let ptr: NonNull<CellData<S>> = ptr.cast();
    // SAFETY: The pointer is valid for reads and has the correct type as
    // guaranteed by the caller. Ownership is transferred out, since the caller
    // promises not to use or drop the original.
    let data: CellData<S> = unsafe {
        // @add-unsafe-context: CellData
        ptr.read()
    };
    let payload = data.into_slot().into_payload();

    // SAFETY: `out` is valid for a write of `S::Payload` as guaranteed by the
    // caller
    unsafe {
        out.cast::<S::Payload>().write(payload);
    }
}

/// Drops the [`CellData<S>`] pointed to by this pointer in place.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer points to an initialized [`CellData`] that was written by
///    [`CellData::emplace_unchecked`].
/// 2. The type `S` matches the actual slot type stored in the [`CellData`]
/// 3. The [`CellData`] has not previously been dropped and will not be used
///    after calling this method.
unsafe fn drop<S: Slot>(ptr: NonNull<CellData<Erased>>) {
    let ptr: NonNull<CellData<S>> = ptr.cast();
    // SAFETY: The pointer is valid, properly aligned and points to an
    // initialized `CellData<S>` as guaranteed by our caller, who also
    // guarantees it is dropped exactly once.
    unsafe {
        // @add-unsafe-context: CellData
        ptr.drop_in_place();
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::slot::{Owned, Pointer};

    #[test]
    fn test_cell_vtable_type_id() {
        let vtable = CellVtable::new::<Owned<i32>>();
        assert_eq!(vtable.type_id(), TypeId::of::<i32>());
        assert_eq!(vtable.type_name(), "i32");

        let vtable = CellVtable::new::<Pointer<*const str>>();
        assert_eq!(vtable.type_id(), TypeId::of::<*const str>());
        assert_eq!(vtable.type_name(), "*const str");
    }

    #[test]
    fn test_cell_vtable_ownership() {
        assert!(CellVtable::new::<Owned<String>>().owns_payload());
        assert!(!CellVtable::new::<Pointer<*mut String>>().owns_payload());
    }

    #[test]
    fn test_cell_vtable_is_per_slot_type() {
        let owned = CellVtable::new::<Owned<*const u8>>();
        let pointer = CellVtable::new::<Pointer<*const u8>>();
        assert_eq!(owned.type_id(), pointer.type_id());
        assert_ne!(owned.owns_payload(), pointer.owns_payload());
        assert!(!core::ptr::eq(owned, pointer));
    }
}
