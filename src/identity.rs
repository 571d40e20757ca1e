use core::{
    any::TypeId,
    hash::{Hash, Hasher},
};

/// The runtime identity of a type: a comparable [`TypeId`] together with a
/// printable name.
///
/// Equality and hashing only look at the [`TypeId`]. The name is the one
/// reported by [`core::any::type_name`], which is meant for diagnostics and is
/// not guaranteed to be unique or stable.
///
/// The [`Display`](core::fmt::Display) implementation goes through the
/// installed [hooks](crate::hooks): a registered alias wins, otherwise the
/// name is rendered using the configured
/// [`TypeNameStyle`](crate::hooks::type_names::TypeNameStyle). The
/// [`Debug`](core::fmt::Debug) implementation always shows the raw name.
///
/// # Examples
///
/// ```
/// use anonptr::{AnonPtr, TypeIdentity};
///
/// let handle: AnonPtr = AnonPtr::new(2.5f32);
/// assert_eq!(handle.type_identity(), TypeIdentity::of::<f32>());
/// assert_ne!(handle.type_identity(), TypeIdentity::of::<f64>());
/// assert_eq!(handle.type_identity().to_string(), "f32");
/// ```
#[derive(Copy, Clone)]
pub struct TypeIdentity {
    id: TypeId,
    name: &'static str,
}

impl TypeIdentity {
    /// Returns the identity of `T`.
    #[must_use]
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    #[inline]
    pub(crate) fn from_parts(id: TypeId, name: &'static str) -> Self {
        Self { id, name }
    }

    /// Returns the [`TypeId`] of the type.
    #[must_use]
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the unprocessed name of the type, ignoring any hooks.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this is the identity of `T`.
    #[must_use]
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeIdentity {}

impl PartialEq<TypeId> for TypeIdentity {
    fn eq(&self, other: &TypeId) -> bool {
        self.id == *other
    }
}

impl Hash for TypeIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl core::fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        crate::hooks::type_names::write_type_name(*self, f)
    }
}

impl core::fmt::Debug for TypeIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("TypeIdentity").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, string::String, vec::Vec};

    use hashbrown::HashSet;

    use super::*;

    #[test]
    fn test_identity_equality_ignores_name() {
        let real = TypeIdentity::of::<u16>();
        let renamed = TypeIdentity::from_parts(TypeId::of::<u16>(), "renamed");
        assert_eq!(real, renamed);
        assert_eq!(real, TypeId::of::<u16>());
        assert!(real.is::<u16>());
        assert!(!real.is::<i16>());
    }

    #[test]
    fn test_identity_hash_ignores_name() {
        let mut set: HashSet<TypeIdentity, rustc_hash::FxBuildHasher> = HashSet::default();
        set.insert(TypeIdentity::of::<String>());
        set.insert(TypeIdentity::from_parts(TypeId::of::<String>(), "text"));
        set.insert(TypeIdentity::of::<Vec<u8>>());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_identity_debug_shows_raw_name() {
        let identity = TypeIdentity::of::<String>();
        assert_eq!(identity.name(), "alloc::string::String");
        assert_eq!(format!("{identity:?}"), r#"TypeIdentity("alloc::string::String")"#);
    }

    #[test]
    fn test_unsized_identity() {
        let identity = TypeIdentity::of::<str>();
        assert_eq!(identity.name(), "str");
        assert_ne!(identity, TypeIdentity::of::<&'static str>());
    }
}
