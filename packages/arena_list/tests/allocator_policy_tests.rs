//! Integration tests for the copy policies an allocator can choose through
//! `TypedAllocator::select_on_copy()` and `TypedAllocator::PROPAGATE_ON_COPY_ASSIGNMENT`.

#![allow(
    clippy::arithmetic_side_effects,
    reason = "integration tests operate on small known values"
)]

use std::cell::Cell;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::rc::Rc;

use arena_list::{Arena, ArenaHandle, Error, Heap, List, TypedAllocator};

/// Offset added to the tag of an allocator selected for a copy.
const COPY_TAG_OFFSET: u32 = 100;

/// Forwards to [`Heap`], counting live allocations per tagged resource. Copies select a fresh
/// resource and assignment adopts the source's resource.
#[derive(Debug)]
struct Tagged<T> {
    tag: u32,
    live: Rc<Cell<usize>>,
    _element: PhantomData<fn() -> T>,
}

impl<T> Tagged<T> {
    fn new(tag: u32) -> Self {
        Self::sharing(tag, &Rc::new(Cell::new(0)))
    }

    fn sharing(tag: u32, live: &Rc<Cell<usize>>) -> Self {
        Self {
            tag,
            live: Rc::clone(live),
            _element: PhantomData,
        }
    }
}

impl<T> Clone for Tagged<T> {
    fn clone(&self) -> Self {
        Self::sharing(self.tag, &self.live)
    }
}

// SAFETY: All memory comes from `Heap`, which upholds the contract.
unsafe impl<T> TypedAllocator<T> for Tagged<T> {
    type Rebind<U> = Tagged<U>;

    const PROPAGATE_ON_COPY_ASSIGNMENT: bool = true;

    fn rebind<U>(&self) -> Tagged<U> {
        Tagged::sharing(self.tag, &self.live)
    }

    fn allocate(&self, count: usize) -> Result<NonNull<T>, Error> {
        let ptr = Heap::<T>::new().allocate(count)?;
        self.live.set(self.live.get() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        self.live.set(self.live.get() - 1);

        // SAFETY: Forwarding the caller's guarantee; the pointer came from `Heap`.
        unsafe {
            Heap::<T>::new().deallocate(ptr, count);
        }
    }

    fn select_on_copy(&self) -> Self {
        Self::new(self.tag + COPY_TAG_OFFSET)
    }
}

#[test]
fn clone_uses_the_selected_allocator() {
    let source = List::from_elem_in(3, &5_u32, Tagged::new(1)).unwrap();

    let copy = source.try_clone().unwrap();

    assert_eq!(copy.allocator().tag, 1 + COPY_TAG_OFFSET);
    assert_eq!(copy.allocator().live.get(), 3);
    assert_eq!(source.allocator().tag, 1);
    assert_eq!(source.allocator().live.get(), 3);
    assert_eq!(copy, source);

    let via_trait = source.clone();
    assert_eq!(via_trait.allocator().tag, 1 + COPY_TAG_OFFSET);
}

#[test]
fn assignment_adopts_the_source_allocator() {
    let source = List::from_elem_in(4, &2_u8, Tagged::new(1)).unwrap();
    let mut target = List::from_elem_in(2, &9_u8, Tagged::new(2)).unwrap();

    let target_live = Rc::clone(&target.allocator().live);

    target.assign_from(&source).unwrap();

    assert_eq!(target.allocator().tag, 1);
    assert!(target.iter().eq(&[2, 2, 2, 2]));

    // The new nodes come from the source's resource and the old ones have been released.
    assert_eq!(source.allocator().live.get(), 8);
    assert_eq!(target_live.get(), 0);

    drop(target);
    assert_eq!(source.allocator().live.get(), 4);
}

#[test]
fn clone_from_adopts_the_source_allocator() {
    let source = List::from_elem_in(1, &'s', Tagged::new(7)).unwrap();
    let mut target = List::from_elem_in(3, &'t', Tagged::new(8)).unwrap();

    target.clone_from(&source);

    assert_eq!(target.allocator().tag, 7);
    assert!(target.iter().eq(&['s']));
}

#[test]
fn arena_lists_keep_their_nodes_after_swap() {
    let first_arena = Arena::<1024>::new();
    let second_arena = Arena::<1024>::new();

    let mut first = List::from_elem_in(2, &1_u64, ArenaHandle::new(&first_arena)).unwrap();
    let mut second = List::from_elem_in(2, &2_u64, ArenaHandle::new(&second_arena)).unwrap();

    first.swap(&mut second);

    let first_used = first_arena.used();
    let second_used = second_arena.used();

    // After the swap, `first` owns the nodes of the second arena and grows there only.
    first.push_back(3).unwrap();

    assert_eq!(first_arena.used(), first_used);
    assert!(second_arena.used() > second_used);

    let second_used = second_arena.used();

    second.push_front(0).unwrap();

    assert!(first_arena.used() > first_used);
    assert_eq!(second_arena.used(), second_used);

    assert!(first.iter().eq(&[2, 2, 3]));
    assert!(second.iter().eq(&[0, 1, 1]));
}
