use std::alloc::{Layout, alloc, dealloc};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::{Error, Result};

/// A memory provider that hands out storage for values of type `T`.
///
/// [`List`][crate::List] never owns memory directly. It delegates every node allocation to an
/// implementation of this trait, first [rebinding][Self::rebind] it from the user-visible
/// element type to the list's internal node type.
///
/// Two implementations are provided:
///
/// * [`Heap`] - allocates from the global allocator. This is the default.
/// * [`ArenaHandle`][crate::ArenaHandle] - allocates from a borrowed
///   [`Arena`][crate::Arena], allowing lists of unrelated element types to share one arena.
///
/// # Safety
///
/// Implementations must guarantee that a successful [`allocate(count)`][Self::allocate]
/// returns a pointer that is aligned for `T`, valid for reads and writes of `count` values of
/// `T` and not handed out again until it is passed to [`deallocate()`][Self::deallocate].
/// The memory must remain valid for as long as any clone or rebound copy of the allocator is
/// alive.
pub unsafe trait TypedAllocator<T>: Clone {
    /// The same kind of allocator, sized for values of type `U` and backed by the same
    /// memory resource.
    type Rebind<U>: TypedAllocator<U>;

    /// Whether assigning one container to another makes the target adopt the source's
    /// allocator. If `false`, the target keeps its own allocator and copies the source's
    /// elements into it.
    const PROPAGATE_ON_COPY_ASSIGNMENT: bool = false;

    /// Creates an allocator for values of type `U` that shares this allocator's backing
    /// memory resource.
    #[must_use]
    fn rebind<U>(&self) -> Self::Rebind<U>;

    /// Allocates uninitialized storage for `count` consecutive values of type `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing resource cannot satisfy the request or if the total
    /// size overflows `usize`.
    fn allocate(&self, count: usize) -> Result<NonNull<T>>;

    /// Releases storage previously obtained from [`allocate()`][Self::allocate].
    ///
    /// # Safety
    ///
    /// The caller must pass a pointer obtained from `allocate(count)` on this allocator or on
    /// an allocator that compares equal to it (including rebound copies), with the same
    /// `count`. Any values stored in the memory must already have been dropped or moved out.
    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize);

    /// Selects the allocator used by a copy of a container that uses this allocator.
    #[must_use]
    fn select_on_copy(&self) -> Self {
        self.clone()
    }
}

/// The default memory provider, allocating from the global allocator.
///
/// All `Heap` instances are interchangeable and compare equal, regardless of element type.
///
/// # Examples
///
/// ```
/// use arena_list::{Heap, TypedAllocator};
///
/// let heap = Heap::<u64>::new();
/// let ptr = heap.allocate(4).unwrap();
///
/// // SAFETY: The pointer came from `allocate(4)` on the same allocator and holds no values.
/// unsafe { heap.deallocate(ptr, 4) };
///
/// assert_eq!(heap, heap.rebind::<String>());
/// ```
pub struct Heap<T> {
    _element: PhantomData<fn() -> T>,
}

impl<T> Heap<T> {
    /// Creates a new global allocator handle.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _element: PhantomData,
        }
    }

    fn layout(count: usize) -> Result<Layout> {
        Layout::array::<T>(count).map_err(|_overflow| Error::SizeOverflow {
            count,
            element_size: size_of::<T>(),
        })
    }
}

// SAFETY: We forward to the global allocator with a layout calculated for `count` values of
// `T`, so the memory is valid and aligned for them until deallocated. Zero-sized requests
// receive a dangling pointer, which is valid for zero-sized accesses.
unsafe impl<T> TypedAllocator<T> for Heap<T> {
    type Rebind<U> = Heap<U>;

    fn rebind<U>(&self) -> Heap<U> {
        Heap::new()
    }

    fn allocate(&self, count: usize) -> Result<NonNull<T>> {
        let layout = Self::layout(count)?;

        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        // SAFETY: The layout is valid for `count` values of `T` and not zero-sized
        // (guarded above).
        let ptr = unsafe { alloc(layout) };

        NonNull::new(ptr.cast::<T>()).ok_or(Error::OutOfMemory {
            size: layout.size(),
            align: layout.align(),
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        let layout = Self::layout(count)
            .expect("the same count was accepted by allocate() so the layout must be calculable");

        if layout.size() == 0 {
            return;
        }

        // SAFETY: Forwarding the caller's guarantee that the pointer came from `allocate()`
        // with the same count, which means the same layout.
        unsafe {
            dealloc(ptr.as_ptr().cast(), layout);
        }
    }
}

impl<T> Clone for Heap<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Heap<T> {}

impl<T> Default for Heap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, U> PartialEq<Heap<U>> for Heap<T> {
    fn eq(&self, _other: &Heap<U>) -> bool {
        true
    }
}

impl<T> Eq for Heap<T> {}

impl<T> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap").finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Heap<u32>: Send, Sync, Copy);
    assert_impl_all!(Heap<std::rc::Rc<u32>>: Send, Sync);

    #[test]
    fn allocate_and_deallocate_round_trip() {
        let heap = Heap::<u64>::new();

        let ptr = heap.allocate(3).unwrap();
        assert_eq!(ptr.as_ptr().addr() % align_of::<u64>(), 0);

        // SAFETY: The allocation has room for 3 u64 values.
        unsafe {
            ptr.as_ptr().write(1);
            ptr.as_ptr().add(2).write(3);
        }

        // SAFETY: u64 has no drop logic and the pointer came from allocate(3).
        unsafe {
            heap.deallocate(ptr, 3);
        }
    }

    #[test]
    fn zero_count_is_dangling() {
        let heap = Heap::<u64>::new();

        let ptr = heap.allocate(0).unwrap();
        assert_eq!(ptr, NonNull::dangling());

        // SAFETY: Came from allocate(0).
        unsafe {
            heap.deallocate(ptr, 0);
        }
    }

    #[test]
    fn size_overflow_is_reported() {
        let heap = Heap::<u64>::new();

        let error = heap.allocate(usize::MAX).unwrap_err();
        assert!(matches!(
            error,
            Error::SizeOverflow {
                count: usize::MAX,
                element_size: 8,
            }
        ));
    }

    #[test]
    fn heaps_compare_equal_across_types() {
        let a = Heap::<u8>::new();
        let b = a.rebind::<String>();

        assert_eq!(a, b);
        assert_eq!(b, a);
    }

    #[test]
    fn select_on_copy_defaults_to_clone() {
        let heap = Heap::<u32>::new();
        assert_eq!(heap.select_on_copy(), heap);
    }
}
