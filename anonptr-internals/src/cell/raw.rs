//! Type-erased cell storage and pointer types.
//!
//! This module encapsulates the `storage` field of [`RawCell`] and the `ptr`
//! field of [`RawCellRef`] and [`RawCellMut`], ensuring they are only visible
//! within this module. This visibility restriction guarantees the safety
//! invariant: **the storage of a [`RawCell`] always holds an initialized
//! `CellData<S>` written by [`CellData::emplace_unchecked`]**.
//!
//! # Safety Invariant
//!
//! The storage can only be filled by [`RawCell::new`], [`RawCell::from_value`]
//! and [`RawCell::clone`], each of which checks that the `CellData<S>` fits
//! before writing it. It cannot be modified
//! afterward (no `pub` or `pub(crate)` fields), so the vtable in the first word
//! always matches the slot type that was written.
//!
//! The [`RawCell::drop`] implementation and
//! [`RawCell::into_payload_unchecked`] rely on this invariant to destroy the
//! cell exactly once.
//!
//! # Relocation
//!
//! A cell contains no pointers into itself: owned payloads live in a separate
//! heap allocation and pointer payloads are plain addresses. Moving a
//! [`RawCell`] is therefore a plain bitwise copy, after which the compiler
//! forbids any further use of the source.

use core::{any::TypeId, marker::PhantomData, mem::MaybeUninit, ptr::NonNull};

use crate::{
    cell::data::CellData,
    slot::{Owned, Pointer, Slot, is_raw_pointer},
    util::Erased,
};

/// Number of machine words in the inline storage.
///
/// Sized after the largest pointer-shaped cell: a vtable reference followed
/// by a fat pointer.
const INLINE_WORDS: usize =
    core::mem::size_of::<CellData<Pointer<*mut [()]>>>().div_ceil(core::mem::size_of::<usize>());

/// Size in bytes of the inline storage of a [`RawCell`].
pub const INLINE_CAPACITY: usize = INLINE_WORDS * core::mem::size_of::<usize>();

/// The raw bytes backing a [`RawCell`], aligned to `usize`.
pub(super) type StorageWords = MaybeUninit<[usize; INLINE_WORDS]>;

/// A fixed-capacity, in-place storage slot holding a [`CellData<S>`] for some
/// specific slot type `S`, though we do not know which actual `S` it is.
///
/// However, the storage is allowed to transition into a non-initialized state
/// inside the [`RawCell::drop`] method and inside
/// [`RawCell::into_payload_unchecked`].
///
/// We cannot use a `Box<dyn Trait>` for this, because the cell itself must
/// live inside the value that owns it without a separate allocation.
pub struct RawCell {
    /// In-place storage of the cell
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The storage holds a `CellData<S>` for some `S: Slot`, written by
    ///    [`CellData::emplace_unchecked`].
    /// 2. The storage holds the same `CellData<S>` for the entire lifetime of
    ///    this object.
    /// 3. The `CellData<S>` is properly initialized for the entire lifetime of
    ///    this object, except during the execution of the `Drop`
    ///    implementation and of [`RawCell::into_payload_unchecked`].
    storage: StorageWords,

    /// Keeps the cell `!Send` and `!Sync`: the payload may be either.
    _marker: PhantomData<*mut ()>,
}

impl RawCell {
    /// Creates a new [`RawCell`] holding the specified slot.
    ///
    /// Fails to compile if the cell for `S` does not fit in
    /// [`INLINE_CAPACITY`] bytes.
    #[inline]
    pub fn new<S: Slot>(slot: S) -> Self {
        let mut storage: StorageWords = MaybeUninit::uninit();
        CellData::new(slot).emplace(&mut storage);

        Self {
            storage,
            _marker: PhantomData,
        }
    }

    /// Creates a new [`RawCell`] holding `value` under the ownership policy
    /// of its type.
    ///
    /// Raw pointers are stored inline in a [`Pointer`] slot and are never
    /// freed by the cell. Every other value is moved into an [`Owned`] slot.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr_internals::RawCell;
    ///
    /// let value = 3u8;
    /// assert!(!RawCell::from_value(&raw const value).as_ref().owns_payload());
    /// assert!(RawCell::from_value(value).as_ref().owns_payload());
    /// ```
    #[inline]
    pub fn from_value<T: Clone + 'static>(value: T) -> Self {
        if !(is_raw_pointer::<T>() && CellData::<Pointer<T>>::FITS) {
            return Self::new(Owned::new(value));
        }

        let mut storage: StorageWords = MaybeUninit::uninit();

        // SAFETY:
        // 1. `CellData::<Pointer<T>>::FITS` was checked just above
        unsafe {
            // @add-unsafe-context: CellData
            CellData::new(Pointer::from_value(value)).emplace_unchecked(&mut storage);
        }

        Self {
            storage,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the [`CellData`] instance.
    #[inline]
    pub fn as_ref(&self) -> RawCellRef<'_> {
        RawCellRef {
            ptr: NonNull::from(&self.storage).cast::<CellData<Erased>>(),
            _marker: PhantomData,
        }
    }

    /// Returns a mutable reference to the [`CellData`] instance.
    #[inline]
    pub fn as_mut(&mut self) -> RawCellMut<'_> {
        RawCellMut {
            ptr: NonNull::from(&mut self.storage).cast::<CellData<Erased>>(),
            _marker: PhantomData,
        }
    }

    /// Consumes the cell and moves its payload out.
    ///
    /// If the cell owns a heap allocation, the allocation is freed without
    /// dropping the payload.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The type `T` matches the payload type of the slot stored in the
    ///    cell.
    #[inline]
    pub unsafe fn into_payload_unchecked<T: 'static>(self) -> T {
        debug_assert_eq!(self.as_ref().type_id(), TypeId::of::<T>());

        let mut this = core::mem::ManuallyDrop::new(self);
        let vtable = this.as_ref().vtable();
        let ptr = NonNull::from(&mut this.storage).cast::<CellData<Erased>>();
        let mut out: MaybeUninit<T> = MaybeUninit::uninit();

        // SAFETY:
        // 1. The vtable returned by `this.as_ref().vtable()` is guaranteed to match the
        //    data in the `CellData`.
        // 2. The type `T` matches the payload type as guaranteed by our caller, so
        //    `out` is valid for a write of the payload.
        // 3. The cell is wrapped in `ManuallyDrop` and is not used after this call, so
        //    the moved-from storage is never observed or dropped again.
        unsafe {
            // @add-unsafe-context: CellData
            vtable.move_out(ptr, NonNull::from(&mut out).cast::<()>());
        }

        // SAFETY: `move_out` has initialized `out` with the payload
        unsafe { out.assume_init() }
    }
}

impl Clone for RawCell {
    /// Copy-constructs the cell into fresh storage, following the ownership
    /// policy of its slot.
    #[inline]
    fn clone(&self) -> Self {
        let mut storage: StorageWords = MaybeUninit::uninit();
        let vtable = self.as_ref().vtable();

        // SAFETY:
        // 1. The vtable returned by `self.as_ref().vtable()` is guaranteed to match the
        //    data in the `CellData`.
        unsafe {
            // @add-unsafe-context: CellData
            vtable.clone_into(self.as_ref(), &mut storage);
        }

        Self {
            storage,
            _marker: PhantomData,
        }
    }
}

impl core::ops::Drop for RawCell {
    #[inline]
    fn drop(&mut self) {
        let vtable = self.as_ref().vtable();
        let ptr = NonNull::from(&mut self.storage).cast::<CellData<Erased>>();

        // SAFETY:
        // 1. The storage was filled by `CellData::emplace_unchecked` (guaranteed by the
        //    invariants on this type)
        // 2. The vtable returned by `self.as_ref().vtable()` is guaranteed to match the
        //    data in the `CellData`.
        // 3. The cell is initialized and has not been previously dropped as guaranteed
        //    by the invariants on this type. The storage is not used afterwards, as we
        //    are in the drop function.
        unsafe {
            // @add-unsafe-context: CellData
            vtable.drop(ptr);
        }
    }
}

/// A lifetime-bound pointer to a [`CellData`] that is guaranteed to point to
/// an initialized instance of a [`CellData<S>`] for some specific `S`, though
/// we do not know which actual `S` it is.
///
/// We cannot use a [`&'a CellData<S>`] directly, because that would require us
/// to know the actual slot type, which we do not.
///
/// [`&'a CellData<S>`]: CellData
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct RawCellRef<'a> {
    /// Pointer to the inner cell data
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer points into the storage of a [`RawCell`].
    /// 2. The pointer will point to the same initialized `CellData<S>` for the
    ///    entire lifetime of this object.
    ptr: NonNull<CellData<Erased>>,

    /// Marker to tell the compiler that we should
    /// behave the same as a `&'a CellData<Erased>`
    _marker: PhantomData<&'a CellData<Erased>>,
}

impl<'a> RawCellRef<'a> {
    /// Casts the [`RawCellRef`] to a [`CellData<S>`] reference.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The type `S` matches the actual slot type stored in the
    ///    [`CellData`].
    #[inline]
    pub(super) unsafe fn cast_inner<S: Slot>(self) -> &'a CellData<S> {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.vtable().type_id(), TypeId::of::<S::Payload>());

        let this = self.ptr.cast::<CellData<S>>();
        // SAFETY: Converting the NonNull pointer to a reference is sound because:
        // - The pointer is non-null, properly aligned, and dereferenceable (guaranteed
        //   by RawCellRef's type invariants and the size checks before `emplace_unchecked`)
        // - The pointee is properly initialized (RawCellRef's doc comment guarantees it
        //   points to an initialized CellData<S> for some S)
        // - The type `S` matches the actual slot type (guaranteed by caller)
        // - Shared access is allowed
        // - The reference lifetime 'a is valid (tied to RawCellRef<'a>'s lifetime)
        unsafe { this.as_ref() }
    }

    /// Returns a raw pointer to the [`CellData`] instance.
    #[inline]
    pub(super) fn as_ptr(self) -> *const CellData<Erased> {
        self.ptr.as_ptr()
    }

    /// Returns the [`TypeId`] of the payload.
    #[inline]
    pub fn type_id(self) -> TypeId {
        self.vtable().type_id()
    }

    /// Returns the [`core::any::type_name`] of the payload.
    #[inline]
    pub fn type_name(self) -> &'static str {
        self.vtable().type_name()
    }

    /// Returns whether destroying the cell destroys the payload.
    #[inline]
    pub fn owns_payload(self) -> bool {
        self.vtable().owns_payload()
    }

    /// Returns the address of the payload, valid for shared access for the
    /// lifetime `'a`.
    #[inline]
    pub fn payload_ptr(self) -> NonNull<()> {
        let vtable = self.vtable();

        // SAFETY:
        // 1. The vtable returned by `self.vtable()` is guaranteed to match the data in
        //    the `CellData`.
        unsafe {
            // @add-unsafe-context: CellData
            vtable.payload(self)
        }
    }

    /// Accesses the payload of the cell as a reference to the specified type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The type `T` matches the payload type of the slot stored in the
    ///    cell.
    #[inline]
    pub unsafe fn payload_unchecked<T: 'static>(self) -> &'a T {
        debug_assert_eq!(self.type_id(), TypeId::of::<T>());

        let ptr = self.payload_ptr().cast::<T>();

        // SAFETY:
        // - The pointer is valid for shared access for 'a (guaranteed by
        //   `Slot::payload`)
        // - The type `T` matches the payload type (guaranteed by the caller)
        unsafe { ptr.as_ref() }
    }
}

/// A mutable lifetime-bound pointer to a [`CellData`] that is guaranteed to
/// point to an initialized instance of a [`CellData<S>`] for some specific
/// `S`, though we do not know which actual `S` it is.
///
/// We cannot use a [`&'a mut CellData<S>`] directly, because that would
/// require us to know the actual slot type, which we do not.
///
/// [`&'a mut CellData<S>`]: CellData
#[repr(transparent)]
pub struct RawCellMut<'a> {
    /// Pointer to the inner cell data
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer points into the storage of a [`RawCell`].
    /// 2. The pointer will point to the same initialized `CellData<S>` for the
    ///    entire lifetime of this object.
    /// 3. This pointer is valid for exclusive mutable access to the `CellData`
    ///    with the same semantics as a `&'a mut CellData<S>`.
    ptr: NonNull<CellData<Erased>>,

    /// Marker to tell the compiler that we should
    /// behave the same as a `&'a mut CellData<Erased>`
    _marker: PhantomData<&'a mut CellData<Erased>>,
}

impl<'a> RawCellMut<'a> {
    /// Casts the [`RawCellMut`] to a mutable [`CellData<S>`] reference.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The type `S` matches the actual slot type stored in the
    ///    [`CellData`].
    #[inline]
    pub(super) unsafe fn cast_inner<S: Slot>(self) -> &'a mut CellData<S> {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.as_ref().type_id(), TypeId::of::<S::Payload>());

        let mut this = self.ptr.cast::<CellData<S>>();

        // SAFETY: Converting the NonNull pointer to a mutable reference is sound
        // because:
        // - The pointer is non-null, properly aligned, and dereferenceable (guaranteed
        //   by RawCellMut's type invariants and the size checks before `emplace_unchecked`)
        // - The pointee is properly initialized (RawCellMut's doc comment guarantees it
        //   points to an initialized CellData<S> for some S)
        // - The type `S` matches the actual slot type (guaranteed by caller)
        // - Exclusive access is guaranteed
        // - The reference lifetime 'a is valid (tied to RawCellMut<'a>'s lifetime)
        unsafe { this.as_mut() }
    }

    /// Reborrows the mutable reference to the [`CellData`] with a shorter
    /// lifetime.
    #[inline]
    pub fn reborrow<'b>(&'b mut self) -> RawCellMut<'b> {
        RawCellMut {
            // SAFETY:
            // 1. Guaranteed by invariant on `self`
            // 2. We are creating the `RawCellMut` here, and we are
            //    not changing the pointer
            // 3. Upheld by mutable borrow of `self`
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the [`CellData`] instance.
    #[inline]
    pub fn as_ref(&self) -> RawCellRef<'_> {
        RawCellRef {
            // SAFETY:
            // 1. Guaranteed by the invariants on `RawCellMut`
            // 2. Guaranteed by the invariants on `RawCellMut` and
            //    the fact that we are taking a shared reference to `self`
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }

    /// Consumes the mutable reference and returns an immutable one with the
    /// same lifetime.
    #[inline]
    pub fn into_ref(self) -> RawCellRef<'a> {
        RawCellRef {
            // SAFETY:
            // 1. Guaranteed by the invariants on `RawCellMut`
            // 2. Guaranteed by the invariants on `RawCellMut` and
            //    the fact that we are consuming `self`
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }

    /// Returns the address of the payload, valid for exclusive access for the
    /// lifetime `'a`.
    #[inline]
    pub fn payload_ptr_mut(self) -> NonNull<()> {
        let vtable = self.as_ref().vtable();

        // SAFETY:
        // 1. The vtable returned by `self.as_ref().vtable()` is guaranteed to match the
        //    data in the `CellData`.
        unsafe {
            // @add-unsafe-context: CellData
            vtable.payload_mut(self)
        }
    }

    /// Accesses the payload of the cell as a mutable reference to the
    /// specified type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The type `T` matches the payload type of the slot stored in the
    ///    cell.
    #[inline]
    pub unsafe fn payload_unchecked_mut<T: 'static>(self) -> &'a mut T {
        debug_assert_eq!(self.as_ref().type_id(), TypeId::of::<T>());

        let mut ptr = self.payload_ptr_mut().cast::<T>();

        // SAFETY:
        // - The pointer is valid for exclusive access for 'a (guaranteed by
        //   `Slot::payload_mut`)
        // - The type `T` matches the payload type (guaranteed by the caller)
        unsafe { ptr.as_mut() }
    }
}
