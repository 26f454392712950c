//! Basic usage of the `arena_list` crate:
//!
//! * Creating lists on the heap and in an arena.
//! * Inserting and removing elements at cursor positions.
//! * Walking a list in both directions.
//! * Handling arena exhaustion.

use arena_list::{Arena, ArenaHandle, Error, List};

fn main() {
    // Lists allocate from the global allocator unless told otherwise.
    let mut names = List::new();
    names.push_back("Bob").unwrap();
    names.push_back("Charlie").unwrap();
    names.push_front("Alice").unwrap();

    println!("Heap list: {names:?}");

    // Cursors mark positions. Inserting places the new element in front of the cursor.
    let mut cursor = names.begin_mut();
    cursor.move_next();
    cursor.insert_before("Alex").unwrap();

    // Removing the element at the cursor moves the cursor to the next element.
    let removed = cursor.remove_current();
    println!("Removed {removed:?}, cursor now at {:?}", cursor.get());

    print!("Back to front:");
    let mut reverse = names.rbegin();
    while !reverse.is_end() {
        print!(" {}", reverse.get().unwrap());
        reverse.move_next();
    }
    println!();

    // An arena is a fixed block of memory that many lists can share, whatever their element
    // types. The handles of lists sharing an arena compare equal.
    let arena = Arena::<2048>::new();

    let ints = List::from_elem_in(4, &7_i32, ArenaHandle::new(&arena)).unwrap();
    let floats = List::from_elem_in(4, &0.25_f64, ArenaHandle::new(&arena)).unwrap();

    println!(
        "Arena lists {ints:?} and {floats:?} share an allocator: {}",
        *ints.allocator() == *floats.allocator()
    );
    println!(
        "Arena has used {} of {} bytes",
        arena.used(),
        arena.capacity()
    );

    // When the arena runs out, the error says so and the partial list is cleaned up.
    match List::from_elem_in(1000, &0_u64, ArenaHandle::new(&arena)) {
        Ok(list) => println!("Unexpectedly fit {} elements", list.len()),
        Err(error @ Error::CapacityExceeded { .. }) => println!("Arena exhausted: {error}"),
        Err(error) => println!("Unexpected error: {error}"),
    }
}
