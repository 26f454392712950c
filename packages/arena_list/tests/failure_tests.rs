//! Integration tests for partial-failure cleanup.
//!
//! These use an allocator that counts live allocations and can be told to fail after a given
//! number of successful allocations, which lets us verify that every failure path releases all
//! the nodes it created.

#![allow(
    clippy::arithmetic_side_effects,
    reason = "integration tests operate on small known values"
)]

use std::cell::Cell;
use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr::NonNull;
use std::rc::Rc;

use arena_list::{Error, Heap, List, TypedAllocator};

#[derive(Debug, Default)]
struct Ledger {
    live: Cell<usize>,

    /// Number of allocations still allowed before requests start failing.
    budget: Cell<Option<usize>>,
}

/// Forwards to [`Heap`] while keeping count of live allocations in a ledger shared by every
/// clone and rebound copy.
#[derive(Debug)]
struct Counting<T> {
    ledger: Rc<Ledger>,
    _element: PhantomData<fn() -> T>,
}

impl<T> Counting<T> {
    fn new(ledger: &Rc<Ledger>) -> Self {
        Self {
            ledger: Rc::clone(ledger),
            _element: PhantomData,
        }
    }
}

impl<T> Clone for Counting<T> {
    fn clone(&self) -> Self {
        Self::new(&self.ledger)
    }
}

// SAFETY: All memory comes from `Heap`, which upholds the contract.
unsafe impl<T> TypedAllocator<T> for Counting<T> {
    type Rebind<U> = Counting<U>;

    fn rebind<U>(&self) -> Counting<U> {
        Counting::new(&self.ledger)
    }

    fn allocate(&self, count: usize) -> Result<NonNull<T>, Error> {
        if let Some(budget) = self.ledger.budget.get() {
            if budget == 0 {
                return Err(Error::CapacityExceeded {
                    requested: count * size_of::<T>(),
                    align: align_of::<T>(),
                    available: 0,
                });
            }

            self.ledger.budget.set(Some(budget - 1));
        }

        let ptr = Heap::<T>::new().allocate(count)?;
        self.ledger.live.set(self.ledger.live.get() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        self.ledger.live.set(self.ledger.live.get() - 1);

        // SAFETY: Forwarding the caller's guarantee; the pointer came from `Heap`.
        unsafe {
            Heap::<T>::new().deallocate(ptr, count);
        }
    }
}

#[test]
fn successful_build_and_drop_releases_everything() {
    let ledger = Rc::new(Ledger::default());

    let list = List::from_elem_in(8, &3_u32, Counting::new(&ledger)).unwrap();
    assert_eq!(ledger.live.get(), 8);

    drop(list);
    assert_eq!(ledger.live.get(), 0);
}

#[test]
fn build_failing_at_any_element_leaves_no_nodes() {
    for fail_at in 0..10 {
        let ledger = Rc::new(Ledger::default());
        ledger.budget.set(Some(fail_at));

        let result = List::from_elem_in(10, &String::from("x"), Counting::new(&ledger));

        assert!(matches!(result, Err(Error::CapacityExceeded { .. })));
        assert_eq!(ledger.live.get(), 0, "leaked nodes when failing at {fail_at}");
    }
}

#[test]
fn construction_error_at_any_element_leaves_no_nodes() {
    for fail_at in 0..6 {
        let ledger = Rc::new(Ledger::default());

        let result = List::try_from_fn_in(6, Counting::new(&ledger), |index| {
            if index == fail_at {
                Err("refused")
            } else {
                Ok(index)
            }
        });

        let Err(Error::ElementConstruction { index, .. }) = result else {
            panic!("expected construction failure at {fail_at}");
        };

        assert_eq!(index, fail_at);
        assert_eq!(ledger.live.get(), 0);
    }
}

#[test]
fn failed_copy_leaves_source_and_target_untouched() {
    let ledger = Rc::new(Ledger::default());

    let source = List::from_elem_in(5, &1_u8, Counting::new(&ledger)).unwrap();
    let mut target = List::from_elem_in(2, &9_u8, Counting::new(&ledger)).unwrap();

    ledger.budget.set(Some(3));

    assert!(source.try_clone().is_err());
    assert!(target.assign_from(&source).is_err());

    assert!(source.iter().eq(&[1, 1, 1, 1, 1]));
    assert!(target.iter().eq(&[9, 9]));
    assert_eq!(ledger.live.get(), 7);

    ledger.budget.set(None);
    target.assign_from(&source).unwrap();

    assert_eq!(target, source);
    assert_eq!(ledger.live.get(), 10);
}

#[test]
fn failed_insert_leaves_the_list_unchanged() {
    let ledger = Rc::new(Ledger::default());

    let mut list = List::from_elem_in(3, &0_i64, Counting::new(&ledger)).unwrap();
    ledger.budget.set(Some(0));

    assert!(list.push_front(1).is_err());
    assert!(list.push_back(1).is_err());

    let mut cursor = list.begin_mut();
    cursor.move_next();
    assert!(cursor.insert_before(1).is_err());
    assert_eq!(cursor.get(), Some(&0));

    assert_eq!(list.len(), 3);
    assert!(list.iter().eq(&[0, 0, 0]));
    assert_eq!(ledger.live.get(), 3);
}

/// Panics when cloned once the shared countdown reaches zero, and counts its own drops.
#[derive(Debug)]
struct Fragile {
    clones_left: Rc<Cell<usize>>,
    drops: Rc<Cell<usize>>,
}

impl Clone for Fragile {
    fn clone(&self) -> Self {
        let left = self.clones_left.get();
        assert!(left > 0, "clone budget exhausted");
        self.clones_left.set(left - 1);

        Self {
            clones_left: Rc::clone(&self.clones_left),
            drops: Rc::clone(&self.drops),
        }
    }
}

impl Drop for Fragile {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

#[test]
fn panicking_clone_releases_partial_copy() {
    let ledger = Rc::new(Ledger::default());
    let clones_left = Rc::new(Cell::new(usize::MAX));
    let drops = Rc::new(Cell::new(0));

    let prototype = Fragile {
        clones_left: Rc::clone(&clones_left),
        drops: Rc::clone(&drops),
    };

    let source = List::from_elem_in(6, &prototype, Counting::new(&ledger)).unwrap();
    assert_eq!(ledger.live.get(), 6);

    clones_left.set(4);

    let result = catch_unwind(AssertUnwindSafe(|| source.try_clone()));
    assert!(result.is_err());

    // The four clones that succeeded were dropped again and their nodes released, including
    // the node reserved for the clone that panicked.
    assert_eq!(drops.get(), 4);
    assert_eq!(ledger.live.get(), 6);
    assert_eq!(source.len(), 6);

    drop(source);
    drop(prototype);

    assert_eq!(drops.get(), 4 + 6 + 1);
    assert_eq!(ledger.live.get(), 0);
}
