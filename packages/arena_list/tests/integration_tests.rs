//! Integration tests for `arena_list` exercising lists, cursors and arenas through the public API.

#![allow(
    clippy::arithmetic_side_effects,
    reason = "integration tests operate on small known values"
)]

use std::alloc::Layout;

use arena_list::{Arena, ArenaHandle, Error, Heap, List, Traverse, TypedAllocator};

#[test]
fn sized_construction_repeats_the_value() {
    let list = List::from_elem(3, &7).unwrap();

    assert_eq!(list.len(), 3);
    assert!(list.iter().eq(&[7, 7, 7]));
}

#[test]
fn insert_at_begin_then_erase_at_begin() {
    let mut list = List::from_elem(3, &7).unwrap();

    list.begin_mut().insert_before(5).unwrap();
    assert!(list.iter().eq(&[5, 7, 7, 7]));

    assert_eq!(list.begin_mut().remove_current(), Some(5));
    assert!(list.iter().eq(&[7, 7, 7]));
    assert_eq!(list.len(), 3);
}

#[test]
fn arena_allocations_are_aligned_and_disjoint() {
    let arena = Arena::<64>::new();
    let layout = Layout::from_size_align(4, 4).unwrap();

    let first = arena.allocate(layout).unwrap().as_ptr().addr();
    let second = arena.allocate(layout).unwrap().as_ptr().addr();

    assert!(second >= first + 4);
    assert_eq!(first % 4, 0);
    assert_eq!(second % 4, 0);
}

#[test]
fn lists_of_different_types_share_an_arena() {
    let arena = Arena::<4096>::new();

    let ints = List::from_elem_in(4, &1_i32, ArenaHandle::new(&arena)).unwrap();
    let floats = List::from_elem_in(4, &1.0_f64, ArenaHandle::new(&arena)).unwrap();

    assert_eq!(*ints.allocator(), *floats.allocator());

    let other_arena = Arena::<4096>::new();
    let elsewhere = List::from_elem_in(1, &1_i32, ArenaHandle::new(&other_arena)).unwrap();

    assert_ne!(*ints.allocator(), *elsewhere.allocator());
}

#[test]
fn ring_is_closed_for_every_length() {
    for len in 0..=32 {
        let list = List::<u32>::with_len(len).unwrap();
        assert_eq!(list.len(), len);

        let mut cursor = list.begin();
        let mut visited = 0;

        while !cursor.is_end() {
            visited += 1;
            cursor.move_next();
        }

        assert_eq!(visited, len);

        cursor.move_next();
        assert_eq!(cursor, list.begin());

        let mut cursor = list.end();
        for _ in 0..len {
            cursor.move_prev();
        }
        assert_eq!(cursor, list.begin());
    }
}

#[test]
fn copies_are_independent() {
    let original = List::from_iter(["a", "b", "c"]);

    let mut copy = original.clone();
    assert_eq!(copy, original);

    *copy.front_mut().unwrap() = "z";
    copy.push_back("d").unwrap();

    assert!(original.iter().eq(&["a", "b", "c"]));
    assert!(copy.iter().eq(&["z", "b", "c", "d"]));
}

#[test]
fn push_then_pop_restores_the_sequence() {
    let mut list = List::from_iter(0..5);

    list.push_back(99).unwrap();
    assert_eq!(list.pop_back(), Some(99));

    list.push_front(-1).unwrap();
    assert_eq!(list.pop_front(), Some(-1));

    assert!(list.iter().copied().eq(0..5));
}

#[test]
fn insert_then_erase_in_the_middle_restores_the_sequence() {
    let mut list = List::from_iter(0..6);

    for position in 0..=6 {
        let mut cursor = list.begin_mut();
        for _ in 0..position {
            cursor.move_next();
        }

        cursor.insert_before(100).unwrap();
        cursor.move_prev();
        assert_eq!(cursor.remove_current(), Some(100));

        assert!(list.iter().copied().eq(0..6));
        assert_eq!(list.len(), 6);
    }
}

#[test]
fn reverse_traversal_matches_reversed_iteration() {
    let list = List::from_iter(1..=10);

    let mut cursor = list.rbegin();
    let mut reversed = Vec::new();

    while !cursor.is_end() {
        reversed.push(*cursor.get().unwrap());
        cursor.move_next();
    }

    assert_eq!(reversed, list.iter().rev().copied().collect::<Vec<_>>());
}

#[test]
fn removing_every_other_element_with_a_cursor() {
    let mut list = List::from_iter(0..10);

    let mut cursor = list.begin_mut();
    while !cursor.is_end() {
        cursor.remove_current();
        cursor.move_next();
    }

    assert!(list.iter().copied().eq([1, 3, 5, 7, 9]));
}

#[test]
fn arena_backed_list_reports_capacity_exceeded() {
    let arena = Arena::<512>::new();
    let mut list = List::new_in(ArenaHandle::new(&arena));

    let error = loop {
        if let Err(error) = list.push_back([0_u8; 16]) {
            break error;
        }
    };

    assert!(matches!(error, Error::CapacityExceeded { .. }));
    assert!(!list.is_empty());

    // The list is intact and still usable for reading and removal.
    let len = list.len();
    assert_eq!(list.iter().count(), len);
    assert!(list.pop_front().is_some());
    assert_eq!(list.len(), len - 1);
}

#[test]
fn swap_exchanges_contents_and_allocators() {
    let first_arena = Arena::<1024>::new();
    let second_arena = Arena::<1024>::new();

    let mut first = List::from_elem_in(2, &1_u8, ArenaHandle::new(&first_arena)).unwrap();
    let mut second = List::from_elem_in(3, &2_u8, ArenaHandle::new(&second_arena)).unwrap();

    first.swap(&mut second);

    assert!(first.iter().eq(&[2, 2, 2]));
    assert!(second.iter().eq(&[1, 1]));
    assert!(std::ptr::eq(first.allocator().arena(), &second_arena));
    assert!(std::ptr::eq(second.allocator().arena(), &first_arena));

    // Each list keeps allocating from the arena its nodes came from.
    let used = second_arena.used();
    first.push_back(3).unwrap();
    assert!(second_arena.used() > used);
}

#[test]
fn generic_code_over_any_allocator() {
    fn fill<A: TypedAllocator<usize>>(alloc: A) -> Result<usize, Error> {
        let list = List::try_from_fn_in(10, alloc, Ok::<_, Error>)?;
        Ok(list.iter().sum())
    }

    let arena = Arena::<1024>::new();

    assert_eq!(fill(Heap::new()).unwrap(), 45);
    assert_eq!(fill(ArenaHandle::new(&arena)).unwrap(), 45);
}

#[test]
fn generic_traversal_counts_to_end() {
    fn steps_to_end(mut cursor: impl Traverse) -> usize {
        let mut steps = 0;
        while !cursor.is_end() {
            cursor.move_next();
            steps += 1;
        }
        steps
    }

    let list = List::from_iter(0..7);

    assert_eq!(steps_to_end(list.begin()), 7);
    assert_eq!(steps_to_end(list.rbegin()), 7);
    assert_eq!(steps_to_end(list.end()), 0);
}
