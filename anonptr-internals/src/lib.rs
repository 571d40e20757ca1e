#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`anonptr`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased storage and the unsafe
//! operations that power the [`anonptr`] value holder. It provides a single
//! fixed-capacity cell that can hold a value of any type, dispatching every
//! operation on that value through a per-type vtable.
//!
//! **This crate is an implementation detail.** No semantic versioning
//! guarantees are provided. Users should depend on the [`anonptr`] crate, not
//! this one.
//!
//! # Architecture
//!
//! - **[`cell`]**: Type-erased in-place storage
//!   - [`RawCell`]: Owned cell living inside a fixed-size word array
//!   - [`RawCellRef`]/[`RawCellMut`]: Borrowed references (shared/mutable)
//!   - [`CellData`]: `#[repr(C)]` wrapper enabling field access on erased types
//!   - [`CellVtable`]: Function pointers for type-erased dispatch
//!
//! - **[`slot`]**: Ownership policies for the value inside a cell
//!   - [`Owned`]: The value lives in a `Box` owned by the cell
//!   - [`Pointer`]: A raw pointer stored directly in the cell, never freed
//!   - [`RawCell::from_value`] picks between the two from the type of the
//!     value
//!
//! # Safety Strategy
//!
//! When a `CellData<Owned<f32>>` is written into the storage of a
//! [`RawCell`], the storage is from then on only ever viewed as
//! `CellData<Erased>`. All operations go through the vtable stored in the
//! first field, and the vtable function pointers must match the slot type
//! that was actually written.
//!
//! This crate maintains that through:
//!
//! - **Module-based encapsulation**: The fields of [`CellData`] and the
//!   storage of [`RawCell`] are only visible inside their own modules, so
//!   the vtable can never be swapped out from under the slot.
//! - **`#[repr(C)]` layout**: The vtable is always at offset zero and can be
//!   read without knowing the slot type.
//! - **Capacity checks**: Writing a `CellData<S>` into the storage is guarded
//!   by a `const` assertion on its size and alignment, or by a check of the
//!   same condition on the one path that picks the slot type at runtime.
//!
//! [`anonptr`]: https://docs.rs/anonptr/latest/anonptr/
//! [`CellData`]: cell::data::CellData
//! [`CellVtable`]: cell::vtable::CellVtable
//! [`Owned`]: slot::Owned
//! [`Pointer`]: slot::Pointer

extern crate alloc;

mod cell;
pub mod slot;
mod util;

pub use cell::{INLINE_CAPACITY, RawCell, RawCellMut, RawCellRef};
