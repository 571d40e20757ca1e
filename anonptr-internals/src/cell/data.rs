//! This module encapsulates the fields of the [`CellData`]. Since this is the
//! only place they are visible, this means that the type of the
//! [`CellVtable`] is guaranteed to always be in sync with the type of the
//! actual slot. This follows from the fact that they are in sync when created
//! and that the API offers no way to change the [`CellVtable`] or slot type
//! after creation.

use crate::{
    cell::{
        raw::{RawCellMut, RawCellRef, StorageWords},
        vtable::CellVtable,
    },
    slot::Slot,
};

/// Type-erased cell data structure with vtable-based dispatch.
///
/// This struct uses `#[repr(C)]` to enable safe field access in type-erased
/// contexts, allowing access to the vtable field even when the concrete slot
/// type `S` is unknown.
#[repr(C)]
pub(super) struct CellData<S: 'static> {
    /// The Vtable of this cell
    vtable: &'static CellVtable,
    /// The slot holding or pointing to the payload
    slot: S,
}

impl<S: Slot> CellData<S> {
    /// Whether a `CellData<S>` fits the inline storage in size and alignment.
    pub(super) const FITS: bool = core::mem::size_of::<CellData<S>>()
        <= core::mem::size_of::<StorageWords>()
        && core::mem::align_of::<CellData<S>>() <= core::mem::align_of::<StorageWords>();

    /// Creates a new [`CellData`] for the specified slot.
    ///
    /// This method creates the vtable for type-erased dispatch and pairs it
    /// with the slot.
    #[inline]
    pub(super) fn new(slot: S) -> Self {
        Self {
            vtable: CellVtable::new::<S>(),
            slot,
        }
    }

    /// Consumes the [`CellData`] and returns the slot.
    #[inline]
    pub(super) fn into_slot(self) -> S {
        self.slot
    }

    /// Writes this [`CellData`] into `storage`, overwriting whatever was
    /// there without dropping it.
    ///
    /// Fails to compile if a `CellData<S>` does not fit the storage.
    #[inline]
    pub(super) fn emplace(self, storage: &mut StorageWords) {
        const {
            assert!(Self::FITS, "the cell does not fit in the inline storage");
        }

        // SAFETY:
        // 1. The const block above proves that `CellData<S>` fits the storage
        unsafe {
            // @add-unsafe-context: CellData
            self.emplace_unchecked(storage);
        }
    }

    /// Writes this [`CellData`] into `storage` without checking that it
    /// fits.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. [`CellData::FITS`] is `true` for `S`.
    #[inline]
    pub(super) unsafe fn emplace_unchecked(self, storage: &mut StorageWords) {
        debug_assert!(Self::FITS);

        let ptr: *mut CellData<S> = storage.as_mut_ptr().cast::<CellData<S>>();

        // SAFETY:
        // - `ptr` comes from a live `&mut` borrow, so it is valid for writes.
        // - `CellData<S>` fits the storage both in size and in alignment, as
        //   guaranteed by the caller.
        unsafe {
            // @add-unsafe-context: CellData
            ptr.write(self);
        }
    }
}

impl<'a> RawCellRef<'a> {
    /// Returns a reference to the [`CellVtable`] of the [`CellData`] instance.
    #[inline]
    pub(super) fn vtable(self) -> &'static CellVtable {
        let ptr = self.as_ptr();
        // SAFETY: We don't know the actual inner slot type, but we do know that it
        // points to an instance of `CellData<S>` for some specific `S`. Since
        // `CellData<S>` is `#[repr(C)]`, that means that it's safe to create
        // pointers to the fields before the actual slot.
        //
        // We need to take care to avoid creating an actual reference to
        // the `CellData` itself though, as that would still be undefined behavior
        // since we don't have the right type.
        let vtable_ptr: *const &'static CellVtable = unsafe { &raw const (*ptr).vtable };

        // SAFETY: Deferencing the pointer and getting out the `&'static CellVtable`
        // is valid for the same reasons
        unsafe { *vtable_ptr }
    }

    /// Accesses the slot of the [`CellData`] instance as a reference to the
    /// specified slot type.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the type `S` matches the actual slot type
    /// stored in the [`CellData`].
    #[inline]
    pub(super) unsafe fn slot_unchecked<S: Slot>(self) -> &'a S {
        // SAFETY: The inner function requires that `S` matches the type stored, but
        // that is guaranteed by our caller.
        let this = unsafe { self.cast_inner::<S>() };
        &this.slot
    }
}

impl<'a> RawCellMut<'a> {
    /// Accesses the slot of the [`CellData`] instance as a mutable reference
    /// to the specified slot type.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the type `S` matches the actual slot type
    /// stored in the [`CellData`].
    #[inline]
    pub(super) unsafe fn slot_unchecked_mut<S: Slot>(self) -> &'a mut S {
        // SAFETY: The inner function requires that `S` matches the type stored, but
        // that is guaranteed by our caller.
        let this = unsafe { self.cast_inner::<S>() };
        &mut this.slot
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::slot::{Owned, Pointer};

    #[test]
    fn test_cell_field_offsets() {
        use core::mem::{offset_of, size_of};

        assert_eq!(offset_of!(CellData<Owned<u8>>, vtable), 0);
        assert_eq!(offset_of!(CellData<Owned<String>>, vtable), 0);
        assert_eq!(offset_of!(CellData<Pointer<*const u64>>, vtable), 0);
        assert_eq!(offset_of!(CellData<Pointer<*mut [u8]>>, vtable), 0);

        assert!(offset_of!(CellData<Owned<u8>>, slot) >= size_of::<&'static CellVtable>());
        assert!(
            offset_of!(CellData<Pointer<*mut [u8]>>, slot) >= size_of::<&'static CellVtable>()
        );
    }

    #[test]
    fn test_largest_pointer_cell_fills_storage() {
        use core::mem::size_of;

        assert_eq!(
            size_of::<CellData<Pointer<*const dyn core::any::Any>>>(),
            size_of::<StorageWords>()
        );
        assert!(size_of::<CellData<Owned<[u64; 64]>>>() < size_of::<StorageWords>());
    }

    #[test]
    fn test_fits() {
        const { assert!(CellData::<Owned<[u64; 64]>>::FITS) };
        const { assert!(CellData::<Pointer<*const str>>::FITS) };
        const { assert!(!CellData::<Pointer<[u64; 8]>>::FITS) };
        const { assert!(!CellData::<Pointer<(u64, u64, u64)>>::FITS) };
    }
}
