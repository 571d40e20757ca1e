//! Hooks system for customizing how handles report types and failed casts.
//!
//! # Quick Start
//!
//! ```rust
//! use anonptr::hooks::{Hooks, type_names::TypeNameStyle};
//!
//! // Print `Vec<String>` instead of `alloc::vec::Vec<alloc::string::String>`
//! Hooks::new()
//!     .type_name_style(TypeNameStyle::Short)
//!     .install()
//!     .expect("failed to install hooks");
//! ```
//!
//! # When to Use Hooks
//!
//! **Most users don't need hooks** - the defaults work well. Use hooks when you
//! need to:
//! - Make type names in error messages shorter or friendlier
//! - Count or log every failed cast in a program
//!
//! # Hook Types
//!
//! - **[`type_names`]**: Aliases for specific types and the rendering style for
//!   all other type names
//! - **[`invalid_cast`]**: Observers called for every failed cast
//!
//! Hooks are installed once, globally. Reading them never takes a lock.

pub mod invalid_cast;
pub mod type_names;

use alloc::{boxed::Box, vec::Vec};
use core::{
    any::TypeId,
    ptr::NonNull,
    sync::atomic::{AtomicPtr, Ordering},
};

use self::{
    invalid_cast::InvalidCastHook,
    type_names::{AliasMap, TypeNameStyle},
};

/// Builder for configuring and installing hooks globally.
///
/// The builder pattern lets you chain multiple hook configurations together
/// before installing them globally.
///
/// # Examples
///
/// ```rust
/// use anonptr::hooks::{Hooks, type_names::TypeNameStyle};
///
/// Hooks::new()
///     .type_name::<String>("text")
///     .type_name_style(TypeNameStyle::Short)
///     .invalid_cast_hook(|error: &anonptr::InvalidCast| eprintln!("{error}"))
///     .install()
///     .expect("failed to install hooks");
/// ```
///
/// See also:
/// - [`type_names`] - Control how type names are printed
/// - [`invalid_cast`] - Observe failed casts
#[derive(Debug)]
pub struct Hooks(Box<HookData>);

impl Default for Hooks {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct HookData {
    pub(crate) type_names: AliasMap,
    pub(crate) type_name_style: TypeNameStyle,
    pub(crate) invalid_cast_hooks: Vec<Box<dyn InvalidCastHook>>,
}

impl core::fmt::Debug for HookData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HookData")
            .field("type_names", &self.type_names)
            .field("type_name_style", &self.type_name_style)
            .field("invalid_cast_hooks", &self.invalid_cast_hooks.len())
            .finish()
    }
}

/// Error returned when attempting to install hooks when they're already
/// installed.
///
/// Contains the hooks that were attempted to be installed, allowing you to
/// recover them if needed.
pub struct HooksAlreadyInstalledError(pub Hooks);

impl core::fmt::Debug for HooksAlreadyInstalledError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HooksAlreadyInstalledError").finish()
    }
}

impl core::fmt::Display for HooksAlreadyInstalledError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "hooks are already installed globally")
    }
}

impl core::error::Error for HooksAlreadyInstalledError {}

impl Hooks {
    /// Creates a new `Hooks` builder with no aliases, the
    /// [`Full`](TypeNameStyle::Full) type name style and no invalid-cast
    /// hooks.
    ///
    /// Installing the result is equivalent to not installing any hooks.
    pub fn new() -> Self {
        Self(Box::new(HookData {
            type_names: AliasMap::default(),
            type_name_style: TypeNameStyle::Full,
            invalid_cast_hooks: Vec::new(),
        }))
    }

    /// Registers an alias printed instead of the name of `T`.
    ///
    /// Registering a second alias for the same type replaces the first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anonptr::{AnonPtr, hooks::Hooks};
    ///
    /// Hooks::new()
    ///     .type_name::<String>("text")
    ///     .install()
    ///     .expect("failed to install hooks");
    ///
    /// let handle: AnonPtr = AnonPtr::new(String::from("hi"));
    /// assert_eq!(format!("{handle:?}"), "AnonPtr { type: text }");
    /// ```
    pub fn type_name<T: ?Sized + 'static>(mut self, alias: &'static str) -> Self {
        self.0.type_names.insert(TypeId::of::<T>(), alias);
        self
    }

    /// Sets the style used to print type names that have no alias.
    pub fn type_name_style(mut self, style: TypeNameStyle) -> Self {
        self.0.type_name_style = style;
        self
    }

    /// Registers a hook called for every failed cast.
    ///
    /// Hooks are called in the order they were registered.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anonptr::{InvalidCast, hooks::Hooks};
    ///
    /// Hooks::new()
    ///     .invalid_cast_hook(|error: &InvalidCast| eprintln!("type confusion: {error}"))
    ///     .install()
    ///     .expect("failed to install hooks");
    /// ```
    pub fn invalid_cast_hook<H>(mut self, hook: H) -> Self
    where
        H: InvalidCastHook,
    {
        self.0.invalid_cast_hooks.push(Box::new(hook));
        self
    }

    /// Makes these hooks the ones every handle in the program consults.
    ///
    /// Only the first installation succeeds. Later calls get their hooks back
    /// inside a [`HooksAlreadyInstalledError`]; use [`replace`](Self::replace)
    /// to swap out hooks that are already active.
    ///
    /// Installed hooks are never freed: a failed cast on another thread may be
    /// running them at any moment, so they stay in memory until the process
    /// exits, even after being replaced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anonptr::hooks::Hooks;
    ///
    /// Hooks::new().install().expect("failed to install hooks");
    ///
    /// let refused = Hooks::new().type_name::<u8>("byte").install().unwrap_err();
    /// let _hooks_returned_to_caller: Hooks = refused.0;
    /// ```
    pub fn install(self) -> Result<(), HooksAlreadyInstalledError> {
        let candidate = NonNull::from(Box::leak(self.0));

        match ACTIVE_HOOKS.set_if_empty(candidate) {
            Ok(()) => Ok(()),
            Err(candidate) => {
                // SAFETY: `candidate` was leaked from a `Box` a few lines above and was
                // never published, so this is the only pointer to it.
                let data = unsafe { Box::from_raw(candidate.as_ptr()) };
                Err(HooksAlreadyInstalledError(Hooks(data)))
            }
        }
    }

    /// Makes these hooks the active ones, whether or not hooks were
    /// installed before.
    ///
    /// The hooks that were active until now are handed back as a
    /// [`LeakedHooks`], so they can be activated again later.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anonptr::hooks::{Hooks, type_names::TypeNameStyle};
    ///
    /// Hooks::new().install().expect("failed to install hooks");
    ///
    /// let previous = Hooks::new().type_name_style(TypeNameStyle::Short).replace();
    /// assert!(previous.is_some());
    /// # unsafe { previous.unwrap().reclaim() }; // Miri doesn't like leaking memory
    /// ```
    pub fn replace(self) -> Option<LeakedHooks> {
        self.leak().replace()
    }

    /// Moves the hooks into static memory without activating them.
    ///
    /// The result can be activated later, or several times, with
    /// [`LeakedHooks::replace`].
    pub fn leak(self) -> LeakedHooks {
        LeakedHooks {
            hook_data: NonNull::from(Box::leak(self.0)),
        }
    }
}

/// A set of hooks living in static memory.
///
/// Obtained from [`Hooks::leak`], from [`Hooks::replace`] or from the
/// currently active hooks. It is a plain pointer, so switching between a few
/// configurations (for example a short type name style in tests and the full
/// one elsewhere) costs nothing.
#[derive(Copy, Clone, Debug)]
pub struct LeakedHooks {
    /// # Safety
    ///
    /// 1. Points to a `HookData` leaked from a `Box<HookData>`.
    /// 2. The `HookData` is never freed, except through
    ///    [`LeakedHooks::reclaim`].
    hook_data: NonNull<HookData>,
}

impl LeakedHooks {
    /// Returns the hooks that type names and failed casts currently consult,
    /// or `None` when no hooks were ever installed.
    pub fn fetch_current_hooks() -> Option<Self> {
        let hook_data = ACTIVE_HOOKS.get()?;
        Some(Self { hook_data })
    }

    /// Activates these hooks and returns the ones they displace.
    pub fn replace(self) -> Option<LeakedHooks> {
        let hook_data = ACTIVE_HOOKS.swap(self.hook_data)?;
        Some(Self { hook_data })
    }

    /// Turns the leaked hooks back into an owned [`Hooks`] so their memory is
    /// freed when it is dropped.
    ///
    /// This is rarely sound outside of single-threaded tests. A handle may be
    /// reading the hooks from any thread whenever it prints a type name or
    /// reports a failed cast, and nothing tracks those readers.
    ///
    /// # Safety
    ///
    /// The caller must ensure that, from now on, nothing else reads these
    /// hooks. In particular:
    ///
    /// 1. They are not the active hooks, and no thread is still running a type
    ///    name lookup or an invalid-cast hook that started while they were.
    /// 2. No copy of this [`LeakedHooks`] is used afterwards, including copies
    ///    returned by [`LeakedHooks::fetch_current_hooks`].
    /// 3. No reference handed out by these hooks outlives the call, such as an
    ///    alias string held on to by an invalid-cast hook.
    pub unsafe fn reclaim(self) -> Hooks {
        // SAFETY: `hook_data` came from a leaked `Box<HookData>`, and the caller
        // guarantees that nothing else will read it again.
        let data = unsafe { Box::from_raw(self.hook_data.as_ptr()) };
        Hooks(data)
    }
}

/// The process-wide pointer to the active hooks.
struct ActiveHooks {
    /// # Safety
    ///
    /// 1. Null until the first installation, then a `HookData` leaked from a
    ///    `Box<HookData>` that is only freed through [`LeakedHooks::reclaim`].
    /// 2. Stores use release ordering and loads use acquire ordering, so a
    ///    reader sees a fully built `HookData`.
    current: AtomicPtr<HookData>,
}

impl ActiveHooks {
    const fn empty() -> Self {
        Self {
            current: AtomicPtr::new(core::ptr::null_mut()),
        }
    }

    /// Returns the active hooks, if any.
    fn get(&self) -> Option<NonNull<HookData>> {
        NonNull::new(self.current.load(Ordering::Acquire))
    }

    /// Publishes `candidate` unless hooks are already active, in which case
    /// `candidate` is returned untouched.
    ///
    /// `candidate` must have been leaked from a `Box<HookData>`.
    fn set_if_empty(&self, candidate: NonNull<HookData>) -> Result<(), NonNull<HookData>> {
        self.current
            .compare_exchange(
                core::ptr::null_mut(),
                candidate.as_ptr(),
                Ordering::Release,
                Ordering::Relaxed,
            )
            .map(|_| ())
            .map_err(|_| candidate)
    }

    /// Publishes `replacement` and returns the hooks it displaces.
    ///
    /// `replacement` must have been leaked from a `Box<HookData>`.
    fn swap(&self, replacement: NonNull<HookData>) -> Option<NonNull<HookData>> {
        NonNull::new(self.current.swap(replacement.as_ptr(), Ordering::AcqRel))
    }
}

static ACTIVE_HOOKS: ActiveHooks = ActiveHooks::empty();

impl HookData {
    /// Returns the active hooks for a type name lookup or a failed cast.
    pub(crate) fn fetch() -> Option<&'static HookData> {
        let ptr = ACTIVE_HOOKS.get()?;

        // SAFETY: The active hooks were leaked from a `Box` and are only freed
        // through `LeakedHooks::reclaim`, whose caller guarantees that no lookup
        // like this one is still using them.
        Some(unsafe { ptr.as_ref() })
    }
}
