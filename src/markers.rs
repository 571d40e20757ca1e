//! Marker types and traits for defining the thread-safety semantics of a
//! handle.
//!
//! An [`AnonPtr`] carries a thread-safety marker as its only type parameter.
//! The marker is checked when the handle is constructed: it is impossible to
//! build an `AnonPtr<SendSync>` around a value that is not `Send + Sync`. This
//! means you can trust that an `AnonPtr<SendSync>` truly is `Send + Sync`.
//!
//! - [`Local`] (the default): any value can be stored, including `Rc`, raw
//!   pointers and other thread-local data. The handle is `!Send + !Sync`.
//! - [`SendSync`]: only `Send + Sync` values can be stored, and the handle can
//!   cross thread boundaries.
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//!
//! use anonptr::{AnonPtr, markers::SendSync};
//!
//! // String is Send + Sync, so it can live in a thread-safe handle
//! let shared: AnonPtr<SendSync> = AnonPtr::new(String::from("hello"));
//! std::thread::spawn(move || {
//!     assert_eq!(shared.get::<&String>().unwrap(), "hello");
//! })
//! .join()
//! .unwrap();
//!
//! // Rc is not, so it needs the default local handle
//! let local: AnonPtr = AnonPtr::new(Rc::new(5));
//! assert!(local.is::<Rc<i32>>());
//! ```
//!
//! ```compile_fail
//! use std::rc::Rc;
//!
//! use anonptr::{AnonPtr, markers::SendSync};
//!
//! let handle: AnonPtr<SendSync> = AnonPtr::new(Rc::new(5));
//! ```
//!
//! [`AnonPtr`]: crate::AnonPtr

/// Marker type indicating that a handle and its payload are `Send + Sync`.
///
/// Handles with this marker can only be created from payloads that are
/// `Send + Sync`. Raw pointers are neither, so pointer handles are always
/// [`Local`].
///
/// # Examples
///
/// ```
/// use anonptr::{AnonPtr, markers::SendSync};
///
/// fn assert_send_sync<T: Send + Sync>(_: &T) {}
///
/// let handle: AnonPtr<SendSync> = AnonPtr::new(vec![1, 2, 3]);
/// assert_send_sync(&handle);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct SendSync;

/// Marker type indicating that a handle is not `Send` or `Sync`.
///
/// This is the default marker. It is needed when the payload is thread-local
/// data such as `Rc<T>`, `Cell<T>` or a raw pointer.
///
/// A thread-safe handle can be converted to a local one with
/// [`into_local`](crate::AnonPtr::into_local).
///
/// # Examples
///
/// ```
/// use std::cell::Cell;
///
/// use anonptr::{AnonPtr, markers::Local};
///
/// let handle: AnonPtr<Local> = AnonPtr::new(Cell::new(1u8));
/// assert!(handle.is::<Cell<u8>>());
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Local;

/// Marker trait combining the requirements of a payload stored by value.
///
/// Every value moved into a handle is copied when the handle is cloned, so
/// payloads must be [`Clone`]. They must also be `'static` so that their
/// [`TypeId`](core::any::TypeId) is available for exact-type matching.
///
/// This trait is implemented automatically for every type that meets the
/// requirements.
pub trait Payload: Clone + 'static {}

impl<T: Clone + 'static> Payload for T {}

/// Marker trait tying a payload type to the thread-safety markers it may be
/// stored under.
///
/// Implemented for every `Sized + 'static` type with [`Local`], and for every
/// `Send + Sync` type with [`SendSync`].
pub trait ObjectMarkerFor<T>: Sized + 'static {}

impl<O: Sized + 'static> ObjectMarkerFor<Local> for O {}

impl<O: Sized + 'static> ObjectMarkerFor<SendSync> for O where O: Send + Sync {}
