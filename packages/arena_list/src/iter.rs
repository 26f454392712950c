use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::node::LinkPtr;
use crate::{List, TypedAllocator};

/// Iterator over shared references to the elements of a [`List`].
///
/// Created by [`List::iter()`].
pub struct Iter<'a, T> {
    /// Next node to yield from the front.
    head: LinkPtr,

    /// Next node to yield from the back.
    tail: LinkPtr,

    /// Number of nodes between `head` and `tail`, both included. Once this reaches zero,
    /// `head` and `tail` are no longer followed.
    remaining: usize,

    _values: PhantomData<&'a T>,
}

impl<T> Iter<'_, T> {
    /// # Safety
    ///
    /// `sentinel` must be the sentinel of a list with exactly `len` payload nodes of type `T`
    /// that stays borrowed for the lifetime of the iterator.
    pub(crate) unsafe fn new(sentinel: LinkPtr, len: usize) -> Self {
        Self {
            // SAFETY: Forwarding the caller's guarantee that the sentinel is alive.
            head: unsafe { sentinel.next() },
            // SAFETY: Forwarding the caller's guarantee that the sentinel is alive.
            tail: unsafe { sentinel.prev() },
            remaining: len,
            _values: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.remaining = self.remaining.checked_sub(1)?;

        let current = self.head;

        // SAFETY: `remaining` was non-zero, so `head` is a live payload node of the borrowed
        // list and so is its successor or the sentinel.
        self.head = unsafe { current.next() };

        // SAFETY: As above. The list is borrowed shared, so nothing can mutate the value.
        Some(unsafe { current.value() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.remaining = self.remaining.checked_sub(1)?;

        let current = self.tail;

        // SAFETY: `remaining` was non-zero, so `tail` is a live payload node of the borrowed
        // list and so is its predecessor or the sentinel.
        self.tail = unsafe { current.prev() };

        // SAFETY: As above. The list is borrowed shared, so nothing can mutate the value.
        Some(unsafe { current.value() })
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head,
            tail: self.tail,
            remaining: self.remaining,
            _values: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

// SAFETY: The iterator behaves like a `&[T]` iterator, handing out shared references only.
unsafe impl<T: Sync> Send for Iter<'_, T> {}

// SAFETY: As above.
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

/// Iterator over exclusive references to the elements of a [`List`].
///
/// Created by [`List::iter_mut()`].
pub struct IterMut<'a, T> {
    head: LinkPtr,
    tail: LinkPtr,
    remaining: usize,

    _values: PhantomData<&'a mut T>,
}

impl<T> IterMut<'_, T> {
    /// # Safety
    ///
    /// `sentinel` must be the sentinel of a list with exactly `len` payload nodes of type `T`
    /// that stays exclusively borrowed for the lifetime of the iterator.
    pub(crate) unsafe fn new(sentinel: LinkPtr, len: usize) -> Self {
        Self {
            // SAFETY: Forwarding the caller's guarantee that the sentinel is alive.
            head: unsafe { sentinel.next() },
            // SAFETY: Forwarding the caller's guarantee that the sentinel is alive.
            tail: unsafe { sentinel.prev() },
            remaining: len,
            _values: PhantomData,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        self.remaining = self.remaining.checked_sub(1)?;

        let current = self.head;

        // SAFETY: `remaining` was non-zero, so `head` is a live payload node of the borrowed
        // list and so is its successor or the sentinel.
        self.head = unsafe { current.next() };

        // SAFETY: As above. Each node is yielded at most once because the front and back
        // share the `remaining` budget, so the exclusive references never alias.
        Some(unsafe { current.value_mut() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.remaining = self.remaining.checked_sub(1)?;

        let current = self.tail;

        // SAFETY: `remaining` was non-zero, so `tail` is a live payload node of the borrowed
        // list and so is its predecessor or the sentinel.
        self.tail = unsafe { current.prev() };

        // SAFETY: As in `next()`.
        Some(unsafe { current.value_mut() })
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

impl<T> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

// SAFETY: The iterator behaves like a `&mut [T]` iterator, so it can move to another thread
// whenever the values can.
unsafe impl<T: Send> Send for IterMut<'_, T> {}

// SAFETY: Shared access to the iterator exposes no values at all.
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

/// Owning iterator over the elements of a [`List`].
///
/// Created by [`List::into_iter()`][IntoIterator::into_iter]. Elements not consumed by the
/// time the iterator is dropped are dropped with it, and their nodes are released.
pub struct IntoIter<T, A: TypedAllocator<T>> {
    list: List<T, A>,
}

impl<T, A: TypedAllocator<T>> IntoIter<T, A> {
    pub(crate) fn new(list: List<T, A>) -> Self {
        Self { list }
    }
}

impl<T, A: TypedAllocator<T>> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T, A: TypedAllocator<T>> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
    }
}

impl<T, A: TypedAllocator<T>> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: TypedAllocator<T>> FusedIterator for IntoIter<T, A> {}

impl<T: fmt::Debug, A: TypedAllocator<T>> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.list).finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(
    clippy::arithmetic_side_effects,
    reason = "test code doesn't need the same rigor as production code"
)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::{Arena, ArenaHandle, Heap};

    assert_impl_all!(Iter<'static, u32>: Send, Sync, Clone);
    assert_impl_all!(IterMut<'static, u32>: Send, Sync);
    assert_impl_all!(IntoIter<u32, Heap<u32>>: Send, Sync);
    assert_not_impl_any!(Iter<'static, Cell<u32>>: Send, Sync);
    assert_not_impl_any!(IntoIter<Rc<u32>, Heap<Rc<u32>>>: Send, Sync);

    #[test]
    fn iter_front_to_back() {
        let list = List::from_iter([1, 2, 3]);

        let collected: Vec<_> = list.iter().copied().collect();
        assert_eq!(collected, [1, 2, 3]);
        assert_eq!(list.iter().len(), 3);
    }

    #[test]
    fn iter_from_both_ends_meets_in_the_middle() {
        let list = List::from_iter([1, 2, 3, 4, 5]);

        let mut iter = list.iter();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&5));
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn iter_of_empty_list() {
        let list = List::<String>::new();

        assert_eq!(list.iter().next(), None);
        assert_eq!(list.iter().next_back(), None);
    }

    #[test]
    fn iter_is_fused() {
        let list = List::from_iter([1]);

        let mut iter = list.iter();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn cloned_iter_is_independent() {
        let list = List::from_iter(['x', 'y']);

        let mut first = list.iter();
        first.next();

        let second = first.clone();
        assert_eq!(first.next(), Some(&'y'));
        assert!(second.eq([&'y']));
    }

    #[test]
    fn iter_mut_modifies_in_place() {
        let mut list = List::from_iter([1, 2, 3]);

        for value in &mut list {
            *value *= 2;
        }

        let mut iter = list.iter_mut();
        *iter.next_back().unwrap() = 0;
        drop(iter);

        assert!(list.iter().eq(&[2, 4, 0]));
    }

    #[test]
    fn into_iter_yields_owned_values() {
        let list = List::from_iter([String::from("a"), String::from("b"), String::from("c")]);

        let mut iter = list.into_iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next_back().as_deref(), Some("c"));
        assert_eq!(iter.next().as_deref(), Some("a"));
        assert_eq!(iter.len(), 1);
    }

    #[test]
    fn dropping_into_iter_drops_the_rest() {
        let tracker = Rc::new(());
        let list = List::from_iter((0..4).map(|_| Rc::clone(&tracker)));

        let mut iter = list.into_iter();
        iter.next();
        assert_eq!(Rc::strong_count(&tracker), 4);

        drop(iter);
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn arena_list_iterates() {
        let arena = Arena::<1024>::new();
        let list = List::from_elem_in(4, &9_u16, ArenaHandle::new(&arena)).unwrap();

        assert_eq!(list.iter().sum::<u16>(), 36);
        assert_eq!(list.into_iter().rev().count(), 4);
    }
}
