use core::any::TypeId;

use anonptr_internals::{
    RawCell,
    slot::{Pointer, RawPointer},
};

use crate::{
    InvalidCast, TakeError, TypeIdentity, TypeSet,
    cast::{Cast, CastMut},
    markers::{Local, ObjectMarkerFor, Payload, SendSync},
};

/// Module hiding the raw cell of [`AnonPtr`].
mod limit_field_access {
    use core::marker::PhantomData;

    use anonptr_internals::{RawCell, RawCellMut, RawCellRef};

    use crate::markers::Local;

    /// A type-erased holder for a single value of any type.
    ///
    /// An `AnonPtr` stores one value whose concrete type is chosen when the
    /// handle is created. The type is remembered at runtime and the value is
    /// only handed back to callers that ask for exactly that type.
    ///
    /// The handle has a fixed size of
    /// [`INLINE_CAPACITY`](crate::INLINE_CAPACITY) bytes. Values moved into
    /// it are kept in a heap allocation owned by the handle; raw pointers
    /// live directly inside the handle and their pointees are never freed by
    /// it.
    ///
    /// The type parameter is a thread-safety marker, see
    /// [`markers`](crate::markers). `AnonPtr<SendSync>` can only hold
    /// `Send + Sync` values and is itself `Send + Sync`.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let mut handle: AnonPtr = AnonPtr::new(3.7f32);
    /// assert!(handle.is::<f32>());
    /// assert_eq!(*handle.get::<&f32>().unwrap(), 3.7);
    ///
    /// *handle.get_mut::<&mut f32>().unwrap() += 1.0;
    /// assert_eq!(handle.cloned::<f32>().unwrap(), 4.7);
    ///
    /// // Only the exact stored type matches
    /// assert!(handle.get::<&f64>().is_err());
    ///
    /// // Reassignment drops the old value
    /// handle = AnonPtr::new(String::from("now a string"));
    /// assert_eq!(handle.take::<String>().unwrap(), "now a string");
    /// ```
    #[repr(transparent)]
    pub struct AnonPtr<ThreadSafety: 'static = Local> {
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. If `ThreadSafety = SendSync`, then the payload of the cell is
        ///    `Send + Sync`.
        raw: RawCell,
        _thread_safety: PhantomData<ThreadSafety>,
    }

    impl<T> AnonPtr<T> {
        /// Creates a new [`AnonPtr`] from a [`RawCell`].
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. If `T = SendSync`, then the payload of the cell is
        ///    `Send + Sync`.
        #[must_use]
        pub(crate) unsafe fn from_raw(raw: RawCell) -> Self {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. Guaranteed by the caller
            Self {
                raw,
                _thread_safety: PhantomData,
            }
        }

        /// Consumes the [`AnonPtr`] and returns the inner [`RawCell`].
        #[must_use]
        pub(crate) fn into_raw(self) -> RawCell {
            // SAFETY: We are destroying `self`, so we no longer
            // need to uphold any safety invariants.
            self.raw
        }

        /// Returns the inner cell.
        #[must_use]
        pub(crate) fn as_raw(&self) -> &RawCell {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. The payload type cannot change through a shared reference
            &self.raw
        }

        /// Returns a reference to the inner cell.
        #[must_use]
        pub(crate) fn as_raw_ref(&self) -> RawCellRef<'_> {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. The payload type cannot change through a `RawCellRef`
            let raw = &self.raw;

            raw.as_ref()
        }

        /// Returns a mutable reference to the inner cell.
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. The payload is not replaced by a value of a different type
        ///    through the returned [`RawCellMut`].
        #[must_use]
        pub(crate) unsafe fn as_raw_mut(&mut self) -> RawCellMut<'_> {
            // SAFETY: We must uphold the safety invariants of the raw field:
            // 1. The payload keeps its type, as guaranteed by the caller
            let raw = &mut self.raw;

            raw.as_mut()
        }
    }
}
pub use limit_field_access::AnonPtr;

impl<T> AnonPtr<T> {
    /// Creates a handle holding `value`.
    ///
    /// The value is moved into a heap allocation owned by the handle. It is
    /// cloned when the handle is cloned and dropped exactly once when the
    /// handle is dropped.
    ///
    /// Raw pointers are the exception: they are stored inside the handle
    /// exactly as [`from_ptr`](Self::from_ptr) stores them, without a heap
    /// allocation and without taking ownership of the pointee.
    ///
    /// Passing a handle of the same type returns it unchanged, so a handle is
    /// never wrapped inside another handle of its own type.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let handle: AnonPtr = AnonPtr::new(vec![1, 2, 3]);
    /// assert!(handle.is::<Vec<i32>>());
    ///
    /// let same: AnonPtr = AnonPtr::new(handle);
    /// assert!(same.is::<Vec<i32>>());
    ///
    /// let value = 5u8;
    /// let pointer: AnonPtr = AnonPtr::new(&raw const value);
    /// assert!(pointer.is::<*const u8>());
    /// assert!(!pointer.owns_payload());
    /// ```
    #[must_use]
    pub fn new<P>(value: P) -> Self
    where
        P: Payload + ObjectMarkerFor<T>,
    {
        if TypeId::of::<P>() == TypeId::of::<Self>() {
            let value = core::mem::ManuallyDrop::new(value);
            let ptr = core::ptr::from_ref::<P>(&value).cast::<Self>();

            // SAFETY: `P` and `Self` are the same type, so `ptr` points to a valid
            // `Self`. The original is wrapped in `ManuallyDrop`, so ownership moves to
            // the copy.
            return unsafe { ptr.read() };
        }

        let raw = RawCell::from_value(value);

        // SAFETY:
        // 1. If `T = SendSync`, the bound `P: ObjectMarkerFor<SendSync>` guarantees
        //    that the payload is `Send + Sync`.
        unsafe {
            // @add-unsafe-context: markers::ObjectMarkerFor
            Self::from_raw(raw)
        }
    }

    /// Creates a handle owning a `P` built from `args`.
    ///
    /// This is the factory form of [`new`](Self::new): the target type is
    /// named explicitly and constructed through its [`From`] implementation.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let handle: AnonPtr = AnonPtr::make::<String, _>("built in place");
    /// assert_eq!(handle.get::<&String>().unwrap(), "built in place");
    ///
    /// let wide: AnonPtr = AnonPtr::make::<u64, u8>(7);
    /// assert!(wide.is::<u64>());
    /// ```
    #[must_use]
    pub fn make<P, A>(args: A) -> Self
    where
        P: Payload + ObjectMarkerFor<T> + From<A>,
    {
        Self::new(P::from(args))
    }

    /// Creates a handle owning the value returned by `f`.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let handle: AnonPtr = AnonPtr::new_with(|| (1..=4).collect::<Vec<u32>>());
    /// assert_eq!(handle.get::<&Vec<u32>>().unwrap().len(), 4);
    /// ```
    #[must_use]
    pub fn new_with<P, F>(f: F) -> Self
    where
        P: Payload + ObjectMarkerFor<T>,
        F: FnOnce() -> P,
    {
        Self::new(f())
    }

    /// Creates a handle storing the raw pointer `ptr` without taking
    /// ownership of what it points to.
    ///
    /// The pointer value is stored directly inside the handle. Cloning the
    /// handle copies the pointer and dropping the handle leaves the pointee
    /// untouched. Null pointers are accepted.
    ///
    /// The stored type of the handle is `P` itself. Read the pointer back
    /// with [`pointer`](Self::pointer) or [`get`](Self::get) in the `&P`
    /// shape. Exclusive shapes are refused, so the stored address cannot be
    /// rebound through the handle.
    ///
    /// Raw pointers are neither `Send` nor `Sync`, so only
    /// [`Local`] handles can store them.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let greeting = "hello";
    /// let handle: AnonPtr = AnonPtr::from_ptr(greeting as *const str);
    ///
    /// assert!(!handle.owns_payload());
    /// assert!(handle.is::<*const str>());
    /// assert_eq!(handle.pointer::<*const str>().unwrap(), greeting as *const str);
    /// ```
    #[must_use]
    pub fn from_ptr<P>(ptr: P) -> Self
    where
        P: RawPointer + ObjectMarkerFor<T>,
    {
        let raw = RawCell::new(Pointer::new(ptr));

        // SAFETY:
        // 1. If `T = SendSync`, the bound `P: ObjectMarkerFor<SendSync>` guarantees
        //    that the payload is `Send + Sync`.
        unsafe {
            // @add-unsafe-context: markers::ObjectMarkerFor
            Self::from_raw(raw)
        }
    }

    /// Returns the identity of the stored type.
    #[must_use]
    pub fn type_identity(&self) -> TypeIdentity {
        let raw = self.as_raw_ref();
        TypeIdentity::from_parts(raw.type_id(), raw.type_name())
    }

    /// Returns the [`TypeId`] of the stored type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.as_raw_ref().type_id()
    }

    /// Returns the unprocessed name of the stored type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.as_raw_ref().type_name()
    }

    /// Returns `true` if the stored type is exactly `P`.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let handle: AnonPtr = AnonPtr::new(1u8);
    /// assert!(handle.is::<u8>());
    /// assert!(!handle.is::<u16>());
    /// assert!(!handle.is::<i8>());
    /// ```
    #[must_use]
    pub fn is<P: 'static>(&self) -> bool {
        self.type_id() == TypeId::of::<P>()
    }

    /// Returns `true` if the stored type is any of the types in the tuple
    /// `S`.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let handle: AnonPtr = AnonPtr::new(2.0f32);
    /// assert!(handle.is_any::<(i32, f64, f32)>());
    /// assert!(!handle.is_any::<(i32, f64)>());
    /// ```
    #[must_use]
    pub fn is_any<S: TypeSet>(&self) -> bool {
        S::contains(self.type_id())
    }

    /// Returns `true` if dropping the handle drops its payload.
    ///
    /// This is `false` exactly for handles holding a raw pointer.
    #[must_use]
    pub fn owns_payload(&self) -> bool {
        self.as_raw_ref().owns_payload()
    }

    /// Accesses the payload in the shared shape `S`: `&P` or `*const P`.
    ///
    /// Returns an [`InvalidCast`] if the stored type is not exactly `P`.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let handle: AnonPtr = AnonPtr::new(String::from("text"));
    ///
    /// let text: &String = handle.get::<&String>().unwrap();
    /// let ptr: *const String = handle.get::<*const String>().unwrap();
    /// assert!(core::ptr::eq(text, ptr));
    ///
    /// let error = handle.get::<&&str>().unwrap_err();
    /// assert_eq!(
    ///     error.to_string(),
    ///     "invalid cast to `&str`: underlying object is `alloc::string::String`"
    /// );
    /// ```
    pub fn get<'a, S>(&'a self) -> Result<S, InvalidCast>
    where
        S: Cast<'a>,
    {
        let raw = self.as_raw_ref();
        if raw.type_id() != TypeId::of::<S::Target>() {
            return Err(self.mismatch::<S::Target>());
        }

        // SAFETY:
        // 1. The payload is a live `S::Target`, as we just checked its `TypeId`
        // 2. The payload is borrowed through `&'a self`, so it stays valid for shared
        //    access for 'a
        let shape = unsafe {
            // @add-unsafe-context: Cast
            S::from_payload(raw.payload_ptr())
        };
        Ok(shape)
    }

    /// Accesses the payload in the exclusive shape `S`: `&mut P` or `*mut P`.
    ///
    /// Returns an [`InvalidCast`] if the stored type is not exactly `P`, or
    /// if the handle holds a raw pointer: the stored address is read-only
    /// (see [`InvalidCast::is_pointer_rebind`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let mut handle: AnonPtr = AnonPtr::new(vec![1u8]);
    /// handle.get_mut::<&mut Vec<u8>>().unwrap().push(2);
    ///
    /// let ptr: *mut Vec<u8> = handle.get_mut::<*mut Vec<u8>>().unwrap();
    /// // SAFETY: the handle is alive and not otherwise borrowed
    /// unsafe { (*ptr).push(3) };
    ///
    /// assert_eq!(handle.get::<&Vec<u8>>().unwrap(), &[1, 2, 3]);
    /// assert!(handle.get_mut::<&mut Vec<i8>>().is_err());
    /// ```
    pub fn get_mut<'a, S>(&'a mut self) -> Result<S, InvalidCast>
    where
        S: CastMut<'a>,
    {
        if self.type_id() != TypeId::of::<S::Target>() {
            return Err(self.mismatch::<S::Target>());
        }
        if !self.owns_payload() {
            let requested = TypeIdentity::of::<S::Target>();
            return Err(InvalidCast::pointer_rebind(requested, self.type_identity()).observed());
        }

        // SAFETY:
        // 1. The returned shape only exposes a `S::Target`, which has the same type as
        //    the payload, so the payload cannot be replaced by a different type
        let raw = unsafe { self.as_raw_mut() };

        // SAFETY:
        // 1. The payload is a live `S::Target`, as we just checked its `TypeId`
        // 2. The payload is borrowed through `&'a mut self`, so it stays valid for
        //    exclusive access for 'a
        let shape = unsafe {
            // @add-unsafe-context: CastMut
            S::from_payload_mut(raw.payload_ptr_mut())
        };
        Ok(shape)
    }

    /// Returns a clone of the payload.
    ///
    /// Returns an [`InvalidCast`] if the stored type is not exactly `P`.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let handle: AnonPtr = AnonPtr::new(42i32);
    /// assert_eq!(handle.cloned::<i32>(), Ok(42));
    /// assert!(handle.cloned::<u32>().is_err());
    /// ```
    pub fn cloned<P: Payload>(&self) -> Result<P, InvalidCast> {
        self.get::<&P>().map(P::clone)
    }

    /// Moves the payload out of the handle, consuming it.
    ///
    /// If the stored type is not exactly `P`, the handle is returned
    /// untouched inside the [`TakeError`].
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let handle: AnonPtr = AnonPtr::new(String::from("moved out"));
    /// let handle = handle.take::<&str>().unwrap_err().into_inner();
    /// assert_eq!(handle.take::<String>().unwrap(), "moved out");
    /// ```
    pub fn take<P: 'static>(self) -> Result<P, TakeError<T>> {
        if !self.is::<P>() {
            let error = self.mismatch::<P>();
            return Err(TakeError::new(self, error));
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(target: "anonptr::cell", payload = self.type_name(), "payload taken");

        let raw = self.into_raw();

        // SAFETY:
        // 1. The payload has type `P`, as we just checked its `TypeId`
        let payload = unsafe { raw.into_payload_unchecked::<P>() };
        Ok(payload)
    }

    /// Returns the stored raw pointer.
    ///
    /// The pointer type must match exactly, including its mutability and
    /// pointee type. This is the same as `get::<&P>()` followed by a copy.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::AnonPtr;
    ///
    /// let mut value = 5u32;
    /// let ptr: *mut u32 = &raw mut value;
    /// let handle: AnonPtr = AnonPtr::from_ptr(ptr);
    ///
    /// assert_eq!(handle.pointer::<*mut u32>().unwrap(), ptr);
    /// assert!(handle.pointer::<*const u32>().is_err());
    /// ```
    pub fn pointer<P: RawPointer>(&self) -> Result<P, InvalidCast> {
        self.get::<&P>().copied()
    }

    /// Creates the error for a failed cast to `P`.
    #[cold]
    fn mismatch<P: 'static>(&self) -> InvalidCast {
        InvalidCast::new(TypeIdentity::of::<P>(), self.type_identity()).observed()
    }
}

impl<T> AnonPtr<T> {
    /// Converts the handle into a [`Local`] one.
    ///
    /// # Examples
    ///
    /// ```
    /// use anonptr::{AnonPtr, markers::SendSync};
    ///
    /// let handle: AnonPtr<SendSync> = AnonPtr::new(1u8);
    /// let local: AnonPtr = handle.into_local();
    /// assert!(local.is::<u8>());
    /// ```
    #[must_use]
    pub fn into_local(self) -> AnonPtr<Local> {
        let raw = self.into_raw();

        // SAFETY:
        // 1. `T = Local`, so this is trivially true.
        unsafe { AnonPtr::from_raw(raw) }
    }
}

impl<T> Clone for AnonPtr<T> {
    /// Copies the handle, following the ownership policy of its payload: an
    /// owned payload is cloned into a fresh allocation, a stored pointer is
    /// copied as is.
    fn clone(&self) -> Self {
        #[cfg(feature = "tracing")]
        tracing::trace!(target: "anonptr::cell", payload = self.type_name(), "handle cloned");

        let raw = self.as_raw().clone();

        // SAFETY:
        // 1. The clone holds a payload of the same type as `self`, so this is
        //    guaranteed by the invariants of `self`.
        unsafe { Self::from_raw(raw) }
    }

    /// Replaces the payload of `self` with a copy of the payload of `source`.
    ///
    /// The copy is made before the old payload is dropped, so `self` is left
    /// untouched if cloning the payload panics. Assigning a handle to itself
    /// is rejected by the borrow checker:
    ///
    /// ```compile_fail
    /// use anonptr::AnonPtr;
    ///
    /// let mut handle: AnonPtr = AnonPtr::new(1);
    /// handle.clone_from(&handle);
    /// ```
    fn clone_from(&mut self, source: &Self) {
        let fresh = source.clone();
        *self = fresh;
    }
}

impl<T> core::fmt::Debug for AnonPtr<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AnonPtr")
            .field("type", &format_args!("{}", self.type_identity()))
            .finish()
    }
}

// SAFETY: The `SendSync` marker indicates that the payload is `Send + Sync`.
// Therefore it is safe to implement `Send` for the handle itself.
unsafe impl Send for AnonPtr<SendSync> {}

// SAFETY: The `SendSync` marker indicates that the payload is `Send + Sync`.
// Therefore it is safe to implement `Sync` for the handle itself.
unsafe impl Sync for AnonPtr<SendSync> {}

impl From<AnonPtr<SendSync>> for AnonPtr<Local> {
    fn from(handle: AnonPtr<SendSync>) -> Self {
        handle.into_local()
    }
}
