use std::alloc::Layout;
use std::cell::{Cell, UnsafeCell};
use std::fmt;
use std::mem::MaybeUninit;
use std::ptr::NonNull;

use tracing::trace;

use crate::{Error, Result};

/// A fixed-capacity bump allocator over an inline buffer of `CAPACITY` bytes.
///
/// Each allocation is carved out of the buffer directly after the previous one, padded as
/// needed to satisfy the requested alignment. Individual allocations are never reclaimed;
/// the memory is only released when the arena itself is dropped. This makes the arena a good
/// fit for many short-lived small objects whose total size is known up front, such as the
/// nodes of a [`List`][crate::List] that lives as long as the arena does.
///
/// The arena is not used directly by containers. Instead, you create one or more
/// [`ArenaHandle`][crate::ArenaHandle]s that borrow the arena and size their allocations for
/// a specific element type. The borrow ensures the arena outlives every handle and every
/// container that allocates through it.
///
/// # Capacity
///
/// When a request does not fit into the remaining space, [`allocate()`][Self::allocate]
/// returns [`Error::CapacityExceeded`] and the arena is left unchanged.
///
/// # Examples
///
/// ```
/// use std::alloc::Layout;
///
/// use arena_list::Arena;
///
/// let arena = Arena::<64>::new();
///
/// let layout = Layout::from_size_align(4, 4).unwrap();
/// let first = arena.allocate(layout).unwrap();
/// let second = arena.allocate(layout).unwrap();
///
/// assert!(second.as_ptr().addr() >= first.as_ptr().addr() + 4);
/// assert_eq!(second.as_ptr().addr() % 4, 0);
/// ```
///
/// # Thread safety
///
/// The arena is thread-mobile ([`Send`]) but not thread-safe ([`Sync`]) because the bump
/// cursor is unsynchronized interior mutable state.
pub struct Arena<const CAPACITY: usize> {
    buffer: UnsafeCell<[MaybeUninit<u8>; CAPACITY]>,

    /// Offset of the first byte that has not yet been handed out. Only ever grows.
    cursor: Cell<usize>,
}

impl<const CAPACITY: usize> Arena<CAPACITY> {
    /// Creates an empty arena with all `CAPACITY` bytes available.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: UnsafeCell::new([MaybeUninit::uninit(); CAPACITY]),
            cursor: Cell::new(0),
        }
    }

    /// Total number of bytes the arena can hand out over its lifetime.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        CAPACITY
    }

    /// Number of bytes consumed so far, including alignment padding.
    #[must_use]
    pub fn used(&self) -> usize {
        self.cursor.get()
    }

    /// Number of bytes not yet consumed. Alignment padding may make the usable amount smaller.
    #[must_use]
    pub fn remaining(&self) -> usize {
        CAPACITY
            .checked_sub(self.cursor.get())
            .expect("cursor never advances past the capacity")
    }

    /// Reserves a region of `layout.size()` bytes aligned to `layout.align()`.
    ///
    /// The returned memory is uninitialized and remains valid for as long as the arena is
    /// not dropped. The arena never hands out the same bytes twice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if the padded request does not fit into the
    /// remaining space. The arena is not modified in that case.
    pub fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        let cursor = self.cursor.get();
        let base = NonNull::from(&self.buffer).cast::<u8>();

        let start = base
            .as_ptr()
            .addr()
            .checked_add(cursor)
            .and_then(|address| {
                let aligned = address.checked_next_multiple_of(layout.align())?;
                let padding = aligned.checked_sub(address)?;
                cursor.checked_add(padding)
            });

        let end = start.and_then(|start| start.checked_add(layout.size()));

        let (Some(start), Some(end)) = (start, end) else {
            return Err(self.capacity_exceeded(layout));
        };

        if end > CAPACITY {
            return Err(self.capacity_exceeded(layout));
        }

        self.cursor.set(end);

        // SAFETY: `start <= end <= CAPACITY`, so the offset stays within the buffer or points
        // one past its end (only possible for zero-sized requests).
        Ok(unsafe { base.add(start) })
    }

    /// Releasing memory back to the arena is a no-op. The memory is reclaimed only when the
    /// arena is dropped.
    #[expect(
        clippy::unused_self,
        reason = "part of the allocator contract even though the arena never reclaims"
    )]
    pub fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        _ = (ptr, layout);
    }

    fn capacity_exceeded(&self, layout: Layout) -> Error {
        let available = self.remaining();

        trace!(
            requested = layout.size(),
            align = layout.align(),
            available,
            capacity = CAPACITY,
            "arena capacity exceeded"
        );

        Error::CapacityExceeded {
            requested: layout.size(),
            align: layout.align(),
            available,
        }
    }
}

impl<const CAPACITY: usize> Default for Arena<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAPACITY: usize> fmt::Debug for Arena<CAPACITY> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &CAPACITY)
            .field("used", &self.cursor.get())
            .finish_non_exhaustive()
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

    assert_impl_all!(Arena<64>: Send);
    assert_not_impl_any!(Arena<64>: Sync, Clone, Copy);

    fn layout(size: usize, align: usize) -> Layout {
        Layout::from_size_align(size, align).unwrap()
    }

    #[test]
    fn consecutive_allocations_do_not_overlap() {
        let arena = Arena::<64>::new();

        let first = arena.allocate(layout(4, 4)).unwrap();
        let second = arena.allocate(layout(4, 4)).unwrap();

        assert!(second.as_ptr().addr() >= first.as_ptr().addr() + 4);
        assert_eq!(first.as_ptr().addr() % 4, 0);
        assert_eq!(second.as_ptr().addr() % 4, 0);
    }

    #[test]
    fn padding_satisfies_alignment() {
        let arena = Arena::<128>::new();

        let byte = arena.allocate(layout(1, 1)).unwrap();
        let word = arena.allocate(layout(8, 8)).unwrap();

        assert_eq!(word.as_ptr().addr() % 8, 0);
        assert!(word.as_ptr().addr() > byte.as_ptr().addr());

        // The padding is counted as used space.
        assert!(arena.used() >= 9);
        assert!(arena.used() <= 16);
    }

    #[test]
    fn exhaustion_is_reported_and_leaves_cursor_alone() {
        let arena = Arena::<16>::new();

        arena.allocate(layout(12, 1)).unwrap();
        let used = arena.used();

        let error = arena.allocate(layout(8, 1)).unwrap_err();
        assert!(matches!(
            error,
            Error::CapacityExceeded {
                requested: 8,
                align: 1,
                available: 4,
            }
        ));
        assert_eq!(arena.used(), used);

        // A request that still fits succeeds afterwards.
        arena.allocate(layout(4, 1)).unwrap();
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn exact_fit_succeeds() {
        let arena = Arena::<32>::new();

        arena.allocate(layout(32, 1)).unwrap();

        assert_eq!(arena.used(), 32);
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn zero_sized_request_consumes_nothing() {
        let arena = Arena::<8>::new();

        let ptr = arena.allocate(layout(0, 1)).unwrap();

        assert_eq!(arena.used(), 0);
        assert_eq!(
            ptr.as_ptr().addr(),
            NonNull::from(&arena.buffer).cast::<u8>().as_ptr().addr()
        );
    }

    #[test]
    fn zero_capacity_rejects_everything_but_zero_size() {
        let arena = Arena::<0>::new();

        arena.allocate(layout(0, 1)).unwrap();
        assert!(arena.allocate(layout(1, 1)).is_err());
    }

    #[test]
    fn memory_is_writable() {
        let arena = Arena::<64>::new();

        let ptr = arena.allocate(Layout::new::<u64>()).unwrap().cast::<u64>();

        // SAFETY: The region is properly sized and aligned for a u64 and exclusively ours.
        unsafe {
            ptr.as_ptr().write(0xdead_beef);
        }

        // SAFETY: We just initialized it.
        assert_eq!(unsafe { ptr.as_ptr().read() }, 0xdead_beef);
    }

    #[test]
    fn deallocate_does_not_reclaim() {
        let arena = Arena::<64>::new();

        let ptr = arena.allocate(layout(16, 8)).unwrap();
        let used = arena.used();

        arena.deallocate(ptr, layout(16, 8));

        assert_eq!(arena.used(), used);
    }

    #[test]
    fn debug_output_mentions_usage() {
        let arena = Arena::<64>::new();
        arena.allocate(layout(3, 1)).unwrap();

        let output = format!("{arena:?}");
        assert!(output.contains("capacity: 64"));
        assert!(output.contains("used: 3"));
    }
}
