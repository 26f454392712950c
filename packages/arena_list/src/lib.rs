#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A doubly-linked list with pluggable node allocation, plus a fixed-capacity bump arena that
//! lets lists of unrelated element types share one region of memory.
//!
//! This is part of the [Folo project](https://github.com/folo-rs/folo) that provides mechanisms for
//! high-performance hardware-aware programming in Rust.
//!
//! # Components
//!
//! * [`Arena`] - a fixed-capacity region that hands out aligned, non-overlapping byte ranges
//!   in increasing address order and never reclaims them individually.
//! * [`TypedAllocator`] - the contract between a container and its memory provider. The
//!   [`Heap`] provider allocates from the global allocator, the [`ArenaHandle`] provider from
//!   a borrowed [`Arena`].
//! * [`List`] - a ring of nodes around a payload-less sentinel. Positions are expressed as
//!   [`Cursor`]s and [`CursorMut`]s, with [`RevCursor`] adapting either for back-to-front
//!   traversal.
//!
//! # Example
//!
//! Two lists with different element types sharing one arena:
//!
//! ```
//! use arena_list::{Arena, ArenaHandle, List};
//!
//! let arena = Arena::<4096>::new();
//!
//! let mut ints = List::from_elem_in(3, &7_i32, ArenaHandle::new(&arena)).unwrap();
//! let floats = List::from_elem_in(2, &0.5_f64, ArenaHandle::new(&arena)).unwrap();
//!
//! ints.begin_mut().insert_before(5).unwrap();
//!
//! assert!(ints.iter().eq(&[5, 7, 7, 7]));
//! assert_eq!(floats.iter().sum::<f64>(), 1.0);
//! assert_eq!(*ints.allocator(), *floats.allocator());
//! ```
//!
//! # Running out of space
//!
//! Every operation that allocates is fallible. When an arena cannot satisfy a request it
//! returns [`Error::CapacityExceeded`] without consuming any space, and a list that was being
//! built releases every node it created before passing the error on:
//!
//! ```
//! use arena_list::{Arena, ArenaHandle, Error, List};
//!
//! let arena = Arena::<256>::new();
//!
//! let result = List::from_elem_in(1000, &0_u64, ArenaHandle::new(&arena));
//! assert!(matches!(result, Err(Error::CapacityExceeded { .. })));
//!
//! // The nodes were released, but an arena never reclaims space.
//! assert!(arena.used() > 0);
//! ```
//!
//! # Thread safety
//!
//! [`Arena`] uses interior mutability without synchronization. It can be moved to another
//! thread but not shared, so lists backed by an arena are confined to the thread that owns the
//! arena. Lists using [`Heap`] are [`Send`] and [`Sync`] whenever their elements are.

mod allocator;
mod arena;
mod arena_handle;
mod cursor;
mod error;
mod iter;
mod list;
mod node;
mod rev_cursor;

pub use allocator::*;
pub use arena::*;
pub use arena_handle::*;
pub use cursor::*;
pub use error::Error;
pub(crate) use error::Result;
pub use iter::*;
pub use list::*;
pub use rev_cursor::*;
