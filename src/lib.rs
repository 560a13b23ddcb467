//! A classic multiway B-tree for Rust.
//!
//! This crate provides [`BTree`], an ordered key-value map whose minimum degree `t`
//! is chosen at runtime and whose key order comes from a pluggable [`Comparator`]:
//!
//! - Every node holds between `t - 1` and `2t - 1` keys (the root at least one)
//! - Keys and values live in every node, internal or leaf
//! - Inserts split full nodes on the way down and deletes top up thin nodes on the
//!   way down, so neither ever walks back up the tree
//! - Mutations reserve all the memory they could need before touching the tree,
//!   so an allocation failure leaves it unchanged
//!
//! # Example
//!
//! ```
//! use multiway::{BTree, Error};
//!
//! let mut scores = BTree::new(2).unwrap();
//! scores.insert("Alice", 100).unwrap();
//! scores.insert("Bob", 85).unwrap();
//! scores.insert("Carol", 92).unwrap();
//!
//! assert_eq!(scores.get(&"Bob"), Some(&85));
//! assert_eq!(scores.len(), 3);
//! assert_eq!(scores.min_key(), Some(&"Alice"));
//!
//! // Inclusive bounds, capped at two results.
//! let first_two = scores.range_query(&"A", &"Z", 2);
//! assert_eq!(first_two, [(&"Alice", &100), (&"Bob", &85)]);
//!
//! assert_eq!(scores.delete(&"Dave"), Err(Error::NotFound));
//! assert!(scores.validate().is_ok());
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Fallible allocation** - Inserts report [`Error::AllocationFailure`] instead of aborting
//! - **Structural checks** - [`BTree::validate`] reports the first broken invariant as a [`Violation`]
//!
//! # Implementation
//!
//! Nodes and values are kept in separate slot arenas and addressed by compact
//! handles. Splits draw from a pool of pre-reserved nodes and merges return
//! nodes to it, so a steady mix of inserts and deletes rarely allocates.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod raw;

pub mod btree;
pub mod comparator;
pub mod config;
pub mod error;

pub use btree::{BTree, Iter, Keys, Range, Values};
pub use comparator::{Comparator, NaturalOrder, Reversed};
pub use config::{DEFAULT_MIN_DEGREE, TreeConfig};
pub use error::{Error, Result, Violation};
