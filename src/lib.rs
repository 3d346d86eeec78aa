//! # sovran-typearray
//!
//! A packed, one-value-per-type heterogeneous container.
//!
//! `sovran-typearray` stores at most one value of each type, looked up by type
//! rather than by key. The main store, [`TypeArray`], packs every value into a
//! single contiguous arena whose base is aligned to [`ARENA_ALIGN`] bytes, and
//! remembers only where each type starts. This suits entity components,
//! plugin data bags and extension slots: a small set of disjoint types,
//! stored compactly and fetched in constant time.
//!
//! ## Key Features
//!
//! - **Packed**: values share one allocation, placed to satisfy each type's alignment
//! - **Two-stage**: reserve a slot first, construct into it later, destruct and reuse it
//! - **Batch packing**: reserving several types at once orders them to minimise padding
//! - **Fail-fast**: misuse panics at the call site, with `try_*` variants for recovery
//! - **Pluggable**: [`BoxedTypeMap`] and [`SparseTypeMap`] offer the same contract
//!   through [`TypeStore`] with different storage trade-offs
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use sovran_typearray::TypeArray;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! let mut store = TypeArray::new();
//! store.insert(Position { x: 1.0, y: 2.0 });
//! store.insert(String::from("player"));
//!
//! store.get_mut::<Position>().x += 0.5;
//! assert_eq!(store.get::<Position>(), &Position { x: 1.5, y: 2.0 });
//! assert_eq!(store.get::<String>(), "player");
//!
//! // `has` is the lookup to use when a type may be missing.
//! assert!(store.has::<u64>().is_none());
//! ```
//!
//! ### Reserving Before Constructing
//!
//! ```rust
//! use sovran_typearray::TypeArray;
//!
//! let mut store = TypeArray::new();
//! let offset = store.reserve::<Vec<u8>>();
//! assert!(store.is_reserved::<Vec<u8>>());
//! assert!(!store.contains::<Vec<u8>>());
//!
//! store.construct(vec![1u8, 2, 3]);
//! assert_eq!(store.get_at::<Vec<u8>>(offset).len(), 3);
//!
//! // Destructing keeps the slot; assigning puts a value back in the same place.
//! store.destruct::<Vec<u8>>();
//! store.assign(vec![9u8]);
//! assert_eq!(store.offset_of::<Vec<u8>>(), offset);
//! ```
//!
//! ### Several Types At Once
//!
//! ```rust
//! use sovran_typearray::TypeArray;
//!
//! let mut store = TypeArray::new();
//! let (_, health, _) = store.insert_bundle((7u32, 100.0f64, String::from("orc")));
//! *health -= 12.5;
//!
//! let (health, id) = store.get_many::<(f64, u32)>();
//! assert_eq!((*health, *id), (87.5, 7));
//! ```
//!
//! ### Recovering From Misuse
//!
//! ```rust
//! use sovran_typearray::{StoreError, TypeArray};
//!
//! let mut store = TypeArray::new();
//! store.insert(1i32);
//!
//! match store.try_insert(2i32) {
//!     Ok(_) => unreachable!(),
//!     Err(StoreError::AlreadyReserved(name)) => assert_eq!(name, "i32"),
//!     Err(e) => panic!("unexpected error: {}", e),
//! }
//! assert!(matches!(store.try_get::<u8>(), Err(StoreError::NotConstructed(_))));
//! ```

mod any_value;
mod arena;
mod array;
mod boxed;
mod bundle;
mod config;
mod destructor;
mod error;
pub mod packing;
mod sparse;
mod store;
mod type_key;

pub use arena::{RawArena, ARENA_ALIGN};
pub use array::TypeArray;
pub use boxed::BoxedTypeMap;
pub use bundle::Bundle;
pub use config::ArrayConfig;
pub use error::StoreError;
pub use sparse::SparseTypeMap;
pub use store::TypeStore;
pub use type_key::{registered_types, type_key, TypeKey};
