use std::fmt;

use crate::node::LinkPtr;
use crate::{Heap, List, Result, TypedAllocator};

/// Bidirectional movement over the ring of a [`List`], shared by all cursor types.
///
/// Moving past the sentinel (the [`end()`][List::end] position) wraps around: advancing from
/// the end lands on the first element and retreating from the first element lands on the end.
pub trait Traverse {
    /// Moves to the next node of the ring.
    fn move_next(&mut self);

    /// Moves to the previous node of the ring.
    fn move_prev(&mut self);

    /// Whether the cursor is at the end position, where there is no element to access.
    fn is_end(&self) -> bool;

    /// Whether the cursor is at the first position. In an empty list, this is also the end.
    fn is_begin(&self) -> bool;
}

/// A read-only position in a [`List`].
///
/// Cursors are cheap to copy. Two cursors are equal if they point at the same node of the
/// same list, regardless of the values stored there.
///
/// # Examples
///
/// ```
/// use arena_list::List;
///
/// let list = List::from_iter([1, 2, 3]);
///
/// let mut cursor = list.begin();
/// assert_eq!(cursor.get(), Some(&1));
///
/// cursor.move_next();
/// cursor.move_next();
/// cursor.move_next();
/// assert_eq!(cursor, list.end());
/// assert_eq!(cursor.get(), None);
///
/// // The ring is closed, so one more step wraps around.
/// cursor.move_next();
/// assert_eq!(cursor, list.begin());
/// ```
pub struct Cursor<'a, T, A: TypedAllocator<T> = Heap<T>> {
    position: LinkPtr,
    list: &'a List<T, A>,
}

impl<'a, T, A: TypedAllocator<T>> Cursor<'a, T, A> {
    pub(crate) fn new(position: LinkPtr, list: &'a List<T, A>) -> Self {
        Self { position, list }
    }

    /// The element at the cursor, or `None` at the end position.
    #[must_use]
    pub fn get(&self) -> Option<&'a T> {
        if self.is_end() {
            return None;
        }

        // SAFETY: The position is a payload node of a list we borrow, so it stays alive and no
        // exclusive reference to its value can exist while the borrow lasts.
        Some(unsafe { self.position.value() })
    }

    /// The element after the cursor, or `None` if the next position is the end.
    #[must_use]
    pub fn peek_next(&self) -> Option<&'a T> {
        let mut next = *self;
        next.move_next();
        next.get()
    }

    /// The element before the cursor, or `None` if the previous position is the end.
    #[must_use]
    pub fn peek_prev(&self) -> Option<&'a T> {
        let mut prev = *self;
        prev.move_prev();
        prev.get()
    }

    /// Moves to the next node of the ring, wrapping from the end to the first element.
    pub fn move_next(&mut self) {
        // SAFETY: Every node of a borrowed list's ring is alive.
        self.position = unsafe { self.position.next() };
    }

    /// Moves to the previous node of the ring, wrapping from the first element to the end.
    pub fn move_prev(&mut self) {
        // SAFETY: Every node of a borrowed list's ring is alive.
        self.position = unsafe { self.position.prev() };
    }

    /// Whether the cursor is at the end position.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.position == self.list.sentinel()
    }

    /// Whether the cursor is at the first position.
    #[must_use]
    pub fn is_begin(&self) -> bool {
        self.position == self.list.begin().position
    }
}

impl<T, A: TypedAllocator<T>> Traverse for Cursor<'_, T, A> {
    fn move_next(&mut self) {
        Cursor::move_next(self);
    }

    fn move_prev(&mut self) {
        Cursor::move_prev(self);
    }

    fn is_end(&self) -> bool {
        Cursor::is_end(self)
    }

    fn is_begin(&self) -> bool {
        Cursor::is_begin(self)
    }
}

impl<T, A: TypedAllocator<T>> Clone for Cursor<'_, T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A: TypedAllocator<T>> Copy for Cursor<'_, T, A> {}

impl<T, A: TypedAllocator<T>> PartialEq for Cursor<'_, T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl<T, A: TypedAllocator<T>> Eq for Cursor<'_, T, A> {}

impl<T: fmt::Debug, A: TypedAllocator<T>> fmt::Debug for Cursor<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("current", &self.get())
            .finish_non_exhaustive()
    }
}

/// A position in a [`List`] that can modify the element at the cursor and the list itself.
///
/// The cursor borrows the list exclusively. Use [`as_cursor()`][Self::as_cursor] or the
/// [`From`] conversion to obtain a read-only [`Cursor`] at the same position. There is no
/// conversion in the other direction.
///
/// # Examples
///
/// ```
/// use arena_list::List;
///
/// let mut list = List::from_iter([1, 2, 4]);
///
/// let mut cursor = list.begin_mut();
/// cursor.move_next();
/// cursor.move_next();
///
/// // Splices a new node in front of the cursor, which stays where it is.
/// cursor.insert_before(3).unwrap();
/// assert_eq!(cursor.get(), Some(&4));
///
/// *cursor.get_mut().unwrap() = 40;
///
/// assert!(list.iter().eq(&[1, 2, 3, 40]));
/// ```
pub struct CursorMut<'a, T, A: TypedAllocator<T> = Heap<T>> {
    position: LinkPtr,
    list: &'a mut List<T, A>,
}

impl<'a, T, A: TypedAllocator<T>> CursorMut<'a, T, A> {
    pub(crate) fn new(position: LinkPtr, list: &'a mut List<T, A>) -> Self {
        Self { position, list }
    }

    /// The element at the cursor, or `None` at the end position.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.as_cursor().get()
    }

    /// The element at the cursor, or `None` at the end position.
    #[must_use]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.is_end() {
            return None;
        }

        // SAFETY: The position is a payload node of a list we borrow exclusively, and the
        // returned reference borrows the cursor exclusively in turn.
        Some(unsafe { self.position.value_mut() })
    }

    /// The element before the cursor, or `None` if the previous position is the end.
    #[must_use]
    pub fn peek_prev_mut(&mut self) -> Option<&mut T> {
        // SAFETY: Every node of a borrowed list's ring is alive.
        let prev = unsafe { self.position.prev() };

        if prev == self.list.sentinel() {
            return None;
        }

        // SAFETY: The position is a payload node of a list we borrow exclusively, and the
        // returned reference borrows the cursor exclusively in turn.
        Some(unsafe { prev.value_mut() })
    }

    /// Moves to the next node of the ring, wrapping from the end to the first element.
    pub fn move_next(&mut self) {
        // SAFETY: Every node of a borrowed list's ring is alive.
        self.position = unsafe { self.position.next() };
    }

    /// Moves to the previous node of the ring, wrapping from the first element to the end.
    pub fn move_prev(&mut self) {
        // SAFETY: Every node of a borrowed list's ring is alive.
        self.position = unsafe { self.position.prev() };
    }

    /// Whether the cursor is at the end position.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.position == self.list.sentinel()
    }

    /// Whether the cursor is at the first position.
    #[must_use]
    pub fn is_begin(&self) -> bool {
        self.as_cursor().is_begin()
    }

    /// Inserts `value` immediately before the cursor. The cursor keeps pointing at the same
    /// node, so inserting at the end position appends to the list.
    ///
    /// # Errors
    ///
    /// Returns an error if node memory cannot be allocated. The list is not modified.
    pub fn insert_before(&mut self, value: T) -> Result<()> {
        // SAFETY: The position is a node of the borrowed list's ring.
        unsafe { self.list.insert_before(self.position, move || Ok(value)) }.map(|_| ())
    }

    /// Removes the element at the cursor and returns it, moving the cursor to the next node.
    ///
    /// At the end position there is nothing to remove, so this returns `None` and leaves the
    /// cursor where it is.
    pub fn remove_current(&mut self) -> Option<T> {
        if self.is_end() {
            return None;
        }

        let removed = self.position;

        // SAFETY: Every node of a borrowed list's ring is alive.
        self.position = unsafe { removed.next() };

        // SAFETY: The node is a payload node of the borrowed list, as checked above.
        Some(unsafe { self.list.remove_node(removed) })
    }

    /// A read-only cursor at the same position, borrowing this one.
    #[must_use]
    pub fn as_cursor(&self) -> Cursor<'_, T, A> {
        Cursor::new(self.position, self.list)
    }

    /// Converts into a read-only cursor at the same position.
    #[must_use]
    pub fn into_cursor(self) -> Cursor<'a, T, A> {
        Cursor::new(self.position, self.list)
    }
}

impl<T, A: TypedAllocator<T>> Traverse for CursorMut<'_, T, A> {
    fn move_next(&mut self) {
        CursorMut::move_next(self);
    }

    fn move_prev(&mut self) {
        CursorMut::move_prev(self);
    }

    fn is_end(&self) -> bool {
        CursorMut::is_end(self)
    }

    fn is_begin(&self) -> bool {
        CursorMut::is_begin(self)
    }
}

impl<'a, T, A: TypedAllocator<T>> From<CursorMut<'a, T, A>> for Cursor<'a, T, A> {
    fn from(cursor: CursorMut<'a, T, A>) -> Self {
        cursor.into_cursor()
    }
}

impl<T: fmt::Debug, A: TypedAllocator<T>> fmt::Debug for CursorMut<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorMut")
            .field("current", &self.get())
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
    use super::*;
    use crate::{Arena, ArenaHandle};

    #[test]
    fn forward_traversal_visits_every_element_then_wraps() {
        for len in [0_usize, 1, 2, 7] {
            let list = List::<usize>::try_from_fn_in(len, Heap::new(), Ok::<_, crate::Error>)
                .unwrap();

            let mut cursor = list.begin();
            let mut visited = Vec::new();

            while !cursor.is_end() {
                visited.push(*cursor.get().unwrap());
                cursor.move_next();
            }

            assert_eq!(visited, (0..len).collect::<Vec<_>>());
            assert_eq!(cursor, list.end());

            cursor.move_next();
            assert_eq!(cursor, list.begin());
        }
    }

    #[test]
    fn backward_traversal_from_end() {
        let list = List::from_iter(['a', 'b', 'c']);

        let mut cursor = list.end();
        cursor.move_prev();
        assert_eq!(cursor.get(), Some(&'c'));
        cursor.move_prev();
        cursor.move_prev();
        assert_eq!(cursor.get(), Some(&'a'));
        assert!(cursor.is_begin());

        cursor.move_prev();
        assert!(cursor.is_end());
    }

    #[test]
    fn peek_neighbors() {
        let list = List::from_iter([1, 2, 3]);

        let mut cursor = list.begin();
        cursor.move_next();

        assert_eq!(cursor.peek_prev(), Some(&1));
        assert_eq!(cursor.peek_next(), Some(&3));
        assert_eq!(list.begin().peek_prev(), None);
        assert_eq!(list.end().peek_next(), Some(&1));
    }

    #[test]
    fn cursors_of_different_lists_are_unequal() {
        let a = List::<u8>::new();
        let b = List::<u8>::new();

        assert_ne!(a.end(), b.end());
        assert_eq!(a.end(), a.end());
    }

    #[test]
    fn insert_before_begin_and_end() {
        let mut list = List::from_elem(3, &7).unwrap();

        list.begin_mut().insert_before(5).unwrap();
        assert!(list.iter().eq(&[5, 7, 7, 7]));
        assert_eq!(list.len(), 4);

        list.end_mut().insert_before(9).unwrap();
        assert!(list.iter().eq(&[5, 7, 7, 7, 9]));
        #[cfg(debug_assertions)]
        list.integrity_check();
    }

    #[test]
    fn insert_into_empty_list() {
        let mut list = List::new();

        let mut cursor = list.begin_mut();
        assert!(cursor.is_end());
        cursor.insert_before("only").unwrap();

        assert!(cursor.is_end());
        assert!(list.iter().eq(&["only"]));
    }

    #[test]
    fn remove_current_advances() {
        let mut list = List::from_iter([5, 7, 8, 9]);

        let mut cursor = list.begin_mut();
        assert_eq!(cursor.remove_current(), Some(5));
        assert_eq!(cursor.get(), Some(&7));

        cursor.move_next();
        assert_eq!(cursor.remove_current(), Some(8));
        assert_eq!(cursor.get(), Some(&9));

        assert!(list.iter().eq(&[7, 9]));
        assert_eq!(list.len(), 2);
        #[cfg(debug_assertions)]
        list.integrity_check();
    }

    #[test]
    fn remove_at_end_is_noop() {
        let mut list = List::from_iter([1, 2]);

        let mut cursor = list.end_mut();
        assert_eq!(cursor.remove_current(), None);
        assert!(cursor.is_end());

        assert_eq!(list.len(), 2);
    }

    #[test]
    fn insert_then_erase_restores_sequence() {
        let mut list = List::from_iter([1, 2, 3]);

        let mut cursor = list.begin_mut();
        cursor.move_next();
        cursor.insert_before(99).unwrap();

        // The inserted node is right before the cursor.
        cursor.move_prev();
        assert_eq!(cursor.get(), Some(&99));
        assert_eq!(cursor.remove_current(), Some(99));
        assert_eq!(cursor.get(), Some(&2));

        assert!(list.iter().eq(&[1, 2, 3]));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn get_mut_writes_through() {
        let mut list = List::from_iter([1, 2, 3]);

        let mut cursor = list.end_mut();
        assert!(cursor.get_mut().is_none());

        cursor.move_prev();
        *cursor.get_mut().unwrap() *= 10;

        *cursor.peek_prev_mut().unwrap() += 100;

        assert!(list.iter().eq(&[1, 102, 30]));
    }

    #[test]
    fn mutable_cursor_converts_to_read_only() {
        let mut list = List::from_iter([1, 2]);

        let mut cursor = list.begin_mut();
        cursor.move_next();

        assert_eq!(cursor.as_cursor().get(), Some(&2));

        let read_only: Cursor<'_, i32> = cursor.into();
        assert_eq!(read_only.peek_prev(), Some(&1));
        assert!(!read_only.is_begin());
    }

    #[test]
    fn failed_insert_leaves_cursor_and_list_unchanged() {
        let arena = Arena::<128>::new();
        let mut list = List::new_in(ArenaHandle::new(&arena));

        let mut cursor = list.end_mut();
        while cursor.insert_before(0_u64).is_ok() {}

        assert!(cursor.is_end());
        let len = list.len();
        #[cfg(debug_assertions)]
        list.integrity_check();
        assert!(len > 0);
    }

    #[test]
    fn generic_traversal_through_trait() {
        fn count_to_end(cursor: &mut impl Traverse) -> usize {
            let mut steps = 0;
            while !cursor.is_end() {
                cursor.move_next();
                steps += 1;
            }
            steps
        }

        let mut list = List::from_iter([1, 2, 3]);

        assert_eq!(count_to_end(&mut list.begin()), 3);
        assert_eq!(count_to_end(&mut list.begin_mut()), 3);
    }
}
