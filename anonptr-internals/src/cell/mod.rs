//! Module containing the type-erased cell

mod data;
mod raw;
mod vtable;

pub use self::raw::{INLINE_CAPACITY, RawCell, RawCellMut, RawCellRef};
