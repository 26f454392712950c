use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use crate::{Arena, Error, Result, TypedAllocator};

/// A lightweight handle that allocates values of type `T` from a borrowed [`Arena`].
///
/// The handle carries no allocation state of its own - it only binds the size and alignment
/// requirements of `T` to one arena. Handles are `Copy` and can be [rebound][Self::rebind] to
/// other element types, which is how containers with different element types (and the
/// internal node types of those containers) share a single arena.
///
/// Deallocation is a no-op, as the arena never reclaims individual allocations.
///
/// # Equality
///
/// Two handles are equal if and only if they refer to the same arena instance. The element
/// type plays no part in the comparison.
///
/// # Examples
///
/// ```
/// use arena_list::{Arena, ArenaHandle, List};
///
/// let arena = Arena::<4096>::new();
///
/// let ints = List::from_elem_in(3, &7_i32, ArenaHandle::new(&arena)).unwrap();
/// let floats = List::from_elem_in(2, &1.5_f64, ArenaHandle::new(&arena)).unwrap();
///
/// assert_eq!(*ints.allocator(), *floats.allocator());
/// ```
pub struct ArenaHandle<'arena, T, const CAPACITY: usize> {
    arena: &'arena Arena<CAPACITY>,

    _element: PhantomData<fn() -> T>,
}

impl<'arena, T, const CAPACITY: usize> ArenaHandle<'arena, T, CAPACITY> {
    /// Creates a handle that allocates values of type `T` from `arena`.
    #[must_use]
    pub const fn new(arena: &'arena Arena<CAPACITY>) -> Self {
        Self {
            arena,
            _element: PhantomData,
        }
    }

    /// The arena this handle allocates from.
    #[must_use]
    pub const fn arena(&self) -> &'arena Arena<CAPACITY> {
        self.arena
    }

    /// Creates a handle for values of type `U` that allocates from the same arena.
    #[must_use]
    pub const fn rebind<U>(&self) -> ArenaHandle<'arena, U, CAPACITY> {
        ArenaHandle::new(self.arena)
    }

    fn layout(count: usize) -> Result<Layout> {
        Layout::array::<T>(count).map_err(|_overflow| Error::SizeOverflow {
            count,
            element_size: size_of::<T>(),
        })
    }
}

// SAFETY: The arena hands out each byte at most once and keeps it valid until the arena is
// dropped. The `'arena` borrow guarantees that happens only after every handle is gone. The
// layout we request is valid for `count` values of `T`.
unsafe impl<'arena, T, const CAPACITY: usize> TypedAllocator<T>
    for ArenaHandle<'arena, T, CAPACITY>
{
    type Rebind<U> = ArenaHandle<'arena, U, CAPACITY>;

    fn rebind<U>(&self) -> ArenaHandle<'arena, U, CAPACITY> {
        Self::rebind(self)
    }

    fn allocate(&self, count: usize) -> Result<NonNull<T>> {
        let layout = Self::layout(count)?;

        self.arena.allocate(layout).map(NonNull::cast)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        if let Ok(layout) = Self::layout(count) {
            self.arena.deallocate(ptr.cast(), layout);
        }
    }
}

impl<T, const CAPACITY: usize> Clone for ArenaHandle<'_, T, CAPACITY> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const CAPACITY: usize> Copy for ArenaHandle<'_, T, CAPACITY> {}

impl<T, U, const CAPACITY: usize, const OTHER_CAPACITY: usize>
    PartialEq<ArenaHandle<'_, U, OTHER_CAPACITY>> for ArenaHandle<'_, T, CAPACITY>
{
    fn eq(&self, other: &ArenaHandle<'_, U, OTHER_CAPACITY>) -> bool {
        ptr::addr_eq(self.arena, other.arena)
    }
}

impl<T, const CAPACITY: usize> Eq for ArenaHandle<'_, T, CAPACITY> {}

impl<T, const CAPACITY: usize> fmt::Debug for ArenaHandle<'_, T, CAPACITY> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaHandle")
            .field("arena", &ptr::from_ref(self.arena))
            .field("element", &std::any::type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(
    clippy::arithmetic_side_effects,
    reason = "test code doesn't need the same rigor as production code"
)]
mod tests {
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(ArenaHandle<'static, u32, 64>: Copy);
    assert_not_impl_any!(ArenaHandle<'static, u32, 64>: Send, Sync);

    #[test]
    fn same_arena_compares_equal() {
        let arena = Arena::<64>::new();

        let a = ArenaHandle::<i32, 64>::new(&arena);
        let b = ArenaHandle::<i32, 64>::new(&arena);

        assert_eq!(a, b);
    }

    #[test]
    fn different_arenas_compare_unequal() {
        let first = Arena::<64>::new();
        let second = Arena::<64>::new();

        let a = ArenaHandle::<i32, 64>::new(&first);
        let b = ArenaHandle::<i32, 64>::new(&second);

        assert_ne!(a, b);
    }

    #[test]
    fn equality_ignores_element_type() {
        let arena = Arena::<64>::new();

        let ints = ArenaHandle::<i32, 64>::new(&arena);
        let doubles = ArenaHandle::<f64, 64>::new(&arena);

        assert_eq!(ints, doubles);
        assert_eq!(doubles, ints);
    }

    #[test]
    fn rebind_keeps_the_arena() {
        let arena = Arena::<64>::new();

        let bytes = ArenaHandle::<u8, 64>::new(&arena);
        let words: ArenaHandle<'_, u64, 64> = bytes.rebind();

        assert_eq!(bytes, words);
        assert!(ptr::eq(words.arena(), &arena));
    }

    #[test]
    fn allocate_uses_element_size_and_alignment() {
        let arena = Arena::<128>::new();
        let bytes = ArenaHandle::<u8, 128>::new(&arena);
        let words = bytes.rebind::<u64>();

        bytes.allocate(1).unwrap();
        let word = words.allocate(2).unwrap();

        assert_eq!(word.as_ptr().addr() % align_of::<u64>(), 0);
        assert!(arena.used() >= 1 + 2 * size_of::<u64>());
    }

    #[test]
    fn allocate_fails_when_arena_is_full() {
        let arena = Arena::<16>::new();
        let handle = ArenaHandle::<u64, 16>::new(&arena);

        handle.allocate(2).unwrap();

        assert!(matches!(
            handle.allocate(1),
            Err(Error::CapacityExceeded { requested: 8, .. })
        ));
    }

    #[test]
    fn size_overflow_is_reported() {
        let arena = Arena::<16>::new();
        let handle = ArenaHandle::<u64, 16>::new(&arena);

        assert!(matches!(
            handle.allocate(usize::MAX),
            Err(Error::SizeOverflow { .. })
        ));
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn deallocate_is_noop() {
        let arena = Arena::<64>::new();
        let handle = ArenaHandle::<u32, 64>::new(&arena);

        let ptr = handle.allocate(4).unwrap();
        let used = arena.used();

        // SAFETY: Came from allocate(4) on this handle and holds no values.
        unsafe {
            handle.deallocate(ptr, 4);
        }

        assert_eq!(arena.used(), used);
    }
}
