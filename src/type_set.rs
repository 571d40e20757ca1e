use core::any::TypeId;

/// A set of types, written as a tuple, for use with
/// [`AnonPtr::is_any`](crate::AnonPtr::is_any).
///
/// Implemented for the empty tuple and for tuples of up to 12 `'static`
/// types. Membership is exact [`TypeId`] equality, checked left to right and
/// stopping at the first match.
///
/// # Examples
///
/// ```
/// use anonptr::{AnonPtr, TypeSet};
///
/// let handle: AnonPtr = AnonPtr::new(1.5f32);
/// assert!(handle.is_any::<(i32, f64, f32)>());
/// assert!(!handle.is_any::<(i32, f64)>());
/// assert!(!handle.is_any::<()>());
///
/// assert!(<(u8, f32)>::contains(handle.type_id()));
/// ```
pub trait TypeSet {
    /// Returns `true` if `type_id` is the [`TypeId`] of one of the types in
    /// the set.
    fn contains(type_id: TypeId) -> bool;
}

impl TypeSet for () {
    #[inline]
    fn contains(_type_id: TypeId) -> bool {
        false
    }
}

macro_rules! impl_type_set {
    () => {};
    ($head:ident $(, $tail:ident)*) => {
        impl<$head: 'static $(, $tail: 'static)*> TypeSet for ($head, $($tail,)*) {
            #[inline]
            fn contains(type_id: TypeId) -> bool {
                type_id == TypeId::of::<$head>() $(|| type_id == TypeId::of::<$tail>())*
            }
        }

        impl_type_set!($($tail),*);
    };
}

impl_type_set!(A, B, C, D, E, F, G, H, I, J, K, L);

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};

    use super::*;

    #[test]
    fn test_membership() {
        assert!(<(u8,)>::contains(TypeId::of::<u8>()));
        assert!(!<(u8,)>::contains(TypeId::of::<i8>()));
        assert!(<(i32, f64, f32)>::contains(TypeId::of::<f32>()));
        assert!(!<(i32, f64, f32)>::contains(TypeId::of::<u32>()));
        assert!(!<()>::contains(TypeId::of::<()>()));
    }

    #[test]
    fn test_twelve_types() {
        type Twelve = (u8, u16, u32, u64, i8, i16, i32, i64, f32, f64, String, Vec<u8>);
        assert!(Twelve::contains(TypeId::of::<u8>()));
        assert!(Twelve::contains(TypeId::of::<Vec<u8>>()));
        assert!(!Twelve::contains(TypeId::of::<Vec<u16>>()));
    }

    #[test]
    fn test_exact_matching_only() {
        assert!(!<(&'static str,)>::contains(TypeId::of::<String>()));
        assert!(!<(String,)>::contains(TypeId::of::<&'static String>()));
    }
}
