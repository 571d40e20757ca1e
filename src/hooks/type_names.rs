//! Type name hooks for controlling how type identities are printed.
//!
//! Type names show up in [`TypeIdentity`]'s `Display` output, in the
//! `Debug` output of [`AnonPtr`] and in every [`InvalidCast`] message. By
//! default the full path reported by [`core::any::type_name`] is printed,
//! which can get noisy for deeply nested generic types.
//!
//! Two knobs are available on the [`Hooks`] builder:
//!
//! - [`Hooks::type_name`] registers a fixed alias for one specific type. An
//!   alias always wins over the style.
//! - [`Hooks::type_name_style`] selects a [`TypeNameStyle`] for every other
//!   type.
//!
//! # Examples
//!
//! ```
//! use anonptr::{
//!     AnonPtr,
//!     hooks::{Hooks, type_names::TypeNameStyle},
//! };
//!
//! struct Celsius(f32);
//!
//! Hooks::new()
//!     .type_name::<f32>("float")
//!     .type_name_style(TypeNameStyle::Short)
//!     .install()
//!     .expect("failed to install hooks");
//!
//! let handle: AnonPtr = AnonPtr::new(vec![String::from("a")]);
//! assert_eq!(handle.type_identity().to_string(), "Vec<String>");
//!
//! let error = handle.get::<&f32>().unwrap_err();
//! assert_eq!(
//!     error.to_string(),
//!     "invalid cast to `float`: underlying object is `Vec<String>`"
//! );
//! ```
//!
//! [`TypeIdentity`]: crate::TypeIdentity
//! [`AnonPtr`]: crate::AnonPtr
//! [`InvalidCast`]: crate::InvalidCast
//! [`Hooks`]: crate::hooks::Hooks
//! [`Hooks::type_name`]: crate::hooks::Hooks::type_name
//! [`Hooks::type_name_style`]: crate::hooks::Hooks::type_name_style

use core::{any::TypeId, fmt};

use hashbrown::HashMap;

use crate::{TypeIdentity, hooks::HookData};

/// How type names are rendered when no alias is registered.
///
/// # Examples
///
/// ```
/// use anonptr::hooks::type_names::TypeNameStyle;
///
/// let name = core::any::type_name::<Vec<Option<String>>>();
/// assert_eq!(
///     TypeNameStyle::Full.render(name).to_string(),
///     "alloc::vec::Vec<core::option::Option<alloc::string::String>>"
/// );
/// assert_eq!(
///     TypeNameStyle::Short.render(name).to_string(),
///     "Vec<Option<String>>"
/// );
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub enum TypeNameStyle {
    /// The name exactly as reported by [`core::any::type_name`].
    #[default]
    Full,
    /// The name with every module path stripped, keeping only the last
    /// segment of each path.
    Short,
}

impl TypeNameStyle {
    /// Returns a value that renders `name` in this style when displayed.
    #[must_use]
    pub fn render(self, name: &str) -> impl fmt::Display + '_ {
        Rendered { style: self, name }
    }

    fn write(self, name: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNameStyle::Full => f.write_str(name),
            TypeNameStyle::Short => write_short(name, f),
        }
    }
}

struct Rendered<'a> {
    style: TypeNameStyle,
    name: &'a str,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.style.write(self.name, f)
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(
        c,
        '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' | '*' | '{' | '}'
    )
}

/// Writes `name` with the module path of every path segment removed.
fn write_short(name: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut rest = name;
    while !rest.is_empty() {
        let end = rest.find(is_delimiter).unwrap_or(rest.len());
        let (path, tail) = rest.split_at(end);
        let last_segment = path.rfind("::").map_or(path, |index| &path[index + 2..]);
        f.write_str(last_segment)?;

        let delimiter_len = tail.chars().next().map_or(0, char::len_utf8);
        let (delimiter, tail) = tail.split_at(delimiter_len);
        f.write_str(delimiter)?;
        rest = tail;
    }
    Ok(())
}

/// Aliases registered through [`Hooks::type_name`](crate::hooks::Hooks::type_name).
#[derive(Default)]
pub(crate) struct AliasMap {
    map: HashMap<TypeId, &'static str, rustc_hash::FxBuildHasher>,
}

impl fmt::Debug for AliasMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.values()).finish()
    }
}

impl AliasMap {
    pub(crate) fn insert(&mut self, type_id: TypeId, alias: &'static str) {
        self.map.insert(type_id, alias);
    }

    pub(crate) fn get(&self, type_id: TypeId) -> Option<&'static str> {
        self.map.get(&type_id).copied()
    }
}

/// Writes the name of `identity` using the globally installed hooks.
pub(crate) fn write_type_name(identity: TypeIdentity, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write_type_name_with(HookData::fetch(), identity, f)
}

fn write_type_name_with(
    hooks: Option<&HookData>,
    identity: TypeIdentity,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let Some(hooks) = hooks else {
        return f.write_str(identity.name());
    };

    if let Some(alias) = hooks.type_names.get(identity.id()) {
        f.write_str(alias)
    } else {
        hooks.type_name_style.write(identity.name(), f)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{
        boxed::Box,
        collections::BTreeMap,
        format,
        rc::Rc,
        string::{String, ToString},
        vec::Vec,
    };

    use super::*;
    use crate::hooks::Hooks;

    fn short<T: ?Sized + 'static>() -> String {
        TypeNameStyle::Short
            .render(core::any::type_name::<T>())
            .to_string()
    }

    struct WithHooks<'a>(&'a HookData, TypeIdentity);

    impl fmt::Display for WithHooks<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write_type_name_with(Some(self.0), self.1, f)
        }
    }

    #[test]
    fn test_short_names() {
        assert_eq!(short::<u8>(), "u8");
        assert_eq!(short::<String>(), "String");
        assert_eq!(short::<Vec<Option<String>>>(), "Vec<Option<String>>");
        assert_eq!(short::<BTreeMap<u8, Rc<str>>>(), "BTreeMap<u8, Rc<str>>");
        assert_eq!(short::<(String, &'static [u8])>(), "(String, &[u8])");
        assert_eq!(short::<[Box<u16>; 4]>(), "[Box<u16>; 4]");
        assert_eq!(short::<*const String>(), "*const String");
        assert_eq!(short::<dyn core::any::Any>(), "dyn Any");
    }

    #[test]
    fn test_full_names_are_untouched() {
        let name = core::any::type_name::<Vec<String>>();
        assert_eq!(TypeNameStyle::Full.render(name).to_string(), name);
        assert_eq!(TypeNameStyle::default(), TypeNameStyle::Full);
    }

    #[test]
    fn test_alias_wins_over_style() {
        let hooks = Hooks::new()
            .type_name::<f32>("float")
            .type_name_style(TypeNameStyle::Short);
        let hook_data: &HookData = &hooks.0;

        let float = WithHooks(hook_data, TypeIdentity::of::<f32>());
        let text = WithHooks(hook_data, TypeIdentity::of::<String>());
        assert_eq!(format!("{float}"), "float");
        assert_eq!(format!("{text}"), "String");
    }

    #[test]
    fn test_later_alias_replaces_earlier() {
        let hooks = Hooks::new()
            .type_name::<u8>("byte")
            .type_name::<u8>("octet");
        assert_eq!(hooks.0.type_names.get(TypeId::of::<u8>()), Some("octet"));
        assert_eq!(hooks.0.type_names.get(TypeId::of::<u16>()), None);
    }

    #[test]
    fn test_no_hooks_prints_full_name() {
        struct NoHooks(TypeIdentity);

        impl fmt::Display for NoHooks {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_type_name_with(None, self.0, f)
            }
        }

        let identity = TypeIdentity::of::<String>();
        assert_eq!(format!("{}", NoHooks(identity)), "alloc::string::String");
    }
}
