#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Extra checks on nightly
#![cfg_attr(nightly_extra_checks, feature(rustdoc_missing_doc_code_examples))]
#![cfg_attr(nightly_extra_checks, forbid(rustdoc::missing_doc_code_examples))]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A type-erased value holder with in-place storage and exact-type access.
//!
//! ## Overview
//!
//! [`AnonPtr`] holds a single value of any type chosen when the handle is
//! created. The handle remembers that type at runtime and only gives the value
//! back to callers that ask for exactly the same type. Asking for anything
//! else, even a type the value could be converted to, returns an
//! [`InvalidCast`] naming both the requested and the stored type.
//!
//! Every handle has the same fixed size, [`INLINE_CAPACITY`] bytes, no matter
//! what it holds. Values moved into a handle live in a heap allocation the
//! handle owns; raw pointers live directly inside the handle and are never
//! freed by it.
//!
//! ## Quick Example
//!
//! ```
//! use anonptr::AnonPtr;
//!
//! let mut handle: AnonPtr = AnonPtr::new(3.7f32);
//!
//! // Read it back in any shape, as long as the type is exactly `f32`
//! let value: f32 = handle.cloned::<f32>().unwrap();
//! let shared: &f32 = handle.get::<&f32>().unwrap();
//! assert_eq!(value, *shared);
//!
//! // Any other type is rejected
//! let error = handle.get::<&i32>().unwrap_err();
//! assert_eq!(
//!     error.to_string(),
//!     "invalid cast to `i32`: underlying object is `f32`"
//! );
//!
//! // Reassigning drops the float and stores a string instead
//! handle = AnonPtr::new(String::from("hello"));
//! assert!(handle.is_any::<(i32, String)>());
//! ```
//!
//! ## Ownership
//!
//! The way a handle treats its payload follows from the type of the payload,
//! whichever of [`AnonPtr::new`], [`AnonPtr::make`], [`AnonPtr::new_with`] or
//! [`IntoAnonPtr::into_anon`] created it:
//!
//! - **Owned values**: the value is cloned into a fresh allocation when the
//!   handle is cloned and dropped exactly once when the handle is dropped.
//!   Owned values must be [`Clone`] and `'static`.
//! - **Raw pointers** (`*const T` and `*mut T`, also accepted by
//!   [`AnonPtr::from_ptr`]): the pointer is stored in the handle itself,
//!   copied when the handle is cloned, and the pointee is never touched. The
//!   pointer can be read back with [`AnonPtr::pointer`] but never rebound
//!   through the handle.
//!
//! Moving a handle moves its storage; the moved-from handle can no longer be
//! used. [`AnonPtr::take`] moves the payload itself out of the handle.
//!
//! ## Access Shapes
//!
//! | Want                | Call                              |
//! |---------------------|-----------------------------------|
//! | a copy of the value | [`cloned::<T>()`](AnonPtr::cloned) |
//! | `&T` / `*const T`   | [`get::<&T>()`](AnonPtr::get), [`get::<*const T>()`](AnonPtr::get) |
//! | `&mut T` / `*mut T` | [`get_mut::<&mut T>()`](AnonPtr::get_mut), [`get_mut::<*mut T>()`](AnonPtr::get_mut) |
//! | the value itself    | [`take::<T>()`](AnonPtr::take) |
//!
//! See the [`cast`] module for details.
//!
//! ## Thread Safety
//!
//! The handle is generic over a thread-safety marker, see [`markers`]. The
//! default `AnonPtr<Local>` accepts any payload and stays on its thread.
//! `AnonPtr<SendSync>` only accepts `Send + Sync` payloads and can be shared
//! across threads.
//!
//! ## Customization
//!
//! Global [`hooks`] can give types friendlier names in error messages and
//! observe every failed cast. With the `tracing` feature enabled, failed casts
//! are also emitted as `debug` events under the `anonptr::cast` target.
//!
//! For implementation details, see the [`anonptr-internals`] crate.
//!
//! [`anonptr-internals`]: anonptr_internals

extern crate alloc;

mod anon_ptr;
pub mod cast;
mod error;
pub mod hooks;
mod identity;
mod into_anon;
pub mod markers;
pub mod prelude;
mod type_set;

pub use anonptr_internals::{INLINE_CAPACITY, slot::RawPointer};

pub use self::{
    anon_ptr::AnonPtr,
    error::{InvalidCast, TakeError},
    identity::TypeIdentity,
    into_anon::IntoAnonPtr,
    type_set::TypeSet,
};
