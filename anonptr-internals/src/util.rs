//! Internal utility types.

/// Stand-in for the slot type of a cell once it has been erased.
///
/// The storage of a [`RawCell`](crate::RawCell) is only ever viewed as
/// `CellData<Erased>`; the real slot type is known to the vtable alone.
pub(crate) struct Erased;
