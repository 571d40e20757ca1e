//! Commonly used items for convenient importing.
//!
//! The prelude module re-exports the most frequently used types and traits
//! from the anonptr library. This allows you to import everything you need with
//! a single use statement.
//!
//! # Usage
//!
//! ```rust
//! use anonptr::prelude::*;
//!
//! fn describe(handle: &AnonPtr) -> Result<String, InvalidCast> {
//!     let count = handle.get::<&u32>()?;
//!     Ok(format!("{count} items"))
//! }
//!
//! assert_eq!(describe(&3u32.into_anon()).unwrap(), "3 items");
//! assert!(describe(&"three".into_anon()).is_err());
//! ```

pub use crate::{AnonPtr, IntoAnonPtr, InvalidCast, TakeError, TypeIdentity, markers};
