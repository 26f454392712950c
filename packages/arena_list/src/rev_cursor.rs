use std::fmt;

use crate::{Cursor, CursorMut, Traverse, TypedAllocator};

/// Adapts a cursor to walk the list back to front.
///
/// The adapter keeps the wrapped cursor one node *after* the position it represents and
/// accesses the element before it. This means the reverse begin position wraps the forward
/// end and the reverse end wraps the forward begin, so both ends are reachable without any
/// extra sentinel.
///
/// # Examples
///
/// ```
/// use arena_list::List;
///
/// let list = List::from_iter([1, 2, 3]);
///
/// let mut cursor = list.rbegin();
/// let mut reversed = Vec::new();
///
/// while cursor != list.rend() {
///     reversed.push(*cursor.get().unwrap());
///     cursor.move_next();
/// }
///
/// assert_eq!(reversed, [3, 2, 1]);
/// ```
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct RevCursor<C> {
    base: C,
}

impl<C: Traverse> RevCursor<C> {
    /// Wraps `base`. The reverse cursor represents the position immediately before `base`.
    #[must_use]
    pub fn new(base: C) -> Self {
        Self { base }
    }

    /// The wrapped forward cursor, one node after the represented position.
    #[must_use]
    pub fn base(&self) -> &C {
        &self.base
    }

    /// Unwraps the forward cursor, one node after the represented position.
    #[must_use]
    pub fn into_base(self) -> C {
        self.base
    }

    /// Moves one step towards the front of the list.
    pub fn move_next(&mut self) {
        self.base.move_prev();
    }

    /// Moves one step towards the back of the list.
    pub fn move_prev(&mut self) {
        self.base.move_next();
    }

    /// Whether the cursor is at the reverse end, one before the first element.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.base.is_begin()
    }

    /// Whether the cursor is at the last element. In an empty list, this is also the end.
    #[must_use]
    pub fn is_begin(&self) -> bool {
        self.base.is_end()
    }
}

impl<C: Traverse> Traverse for RevCursor<C> {
    fn move_next(&mut self) {
        Self::move_next(self);
    }

    fn move_prev(&mut self) {
        Self::move_prev(self);
    }

    fn is_end(&self) -> bool {
        Self::is_end(self)
    }

    fn is_begin(&self) -> bool {
        Self::is_begin(self)
    }
}

impl<'a, T, A: TypedAllocator<T>> RevCursor<Cursor<'a, T, A>> {
    /// The element at the cursor, or `None` at the reverse end.
    #[must_use]
    pub fn get(&self) -> Option<&'a T> {
        self.base.peek_prev()
    }
}

impl<'a, T, A: TypedAllocator<T>> RevCursor<CursorMut<'a, T, A>> {
    /// The element at the cursor, or `None` at the reverse end.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.base.as_cursor().peek_prev()
    }

    /// The element at the cursor, or `None` at the reverse end.
    #[must_use]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.base.peek_prev_mut()
    }

    /// Converts into a read-only reverse cursor at the same position.
    #[must_use]
    pub fn into_cursor(self) -> RevCursor<Cursor<'a, T, A>> {
        RevCursor::new(self.base.into_cursor())
    }
}

impl<'a, T, A: TypedAllocator<T>> From<RevCursor<CursorMut<'a, T, A>>>
    for RevCursor<Cursor<'a, T, A>>
{
    fn from(cursor: RevCursor<CursorMut<'a, T, A>>) -> Self {
        cursor.into_cursor()
    }
}

impl<C: fmt::Debug> fmt::Debug for RevCursor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevCursor")
            .field("base", &self.base)
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
    use crate::List;

    #[test]
    fn reverse_traversal_visits_back_to_front() {
        let list = List::from_iter(['a', 'b', 'c', 'd']);

        let mut cursor = list.rbegin();
        let mut visited = Vec::new();

        while !cursor.is_end() {
            visited.push(*cursor.get().unwrap());
            cursor.move_next();
        }

        assert_eq!(visited, ['d', 'c', 'b', 'a']);
        assert_eq!(cursor, list.rend());
        assert_eq!(cursor.get(), None);
    }

    #[test]
    fn empty_list_reverse_begin_is_end() {
        let list = List::<u8>::new();

        let cursor = list.rbegin();
        assert!(cursor.is_begin());
        assert!(cursor.is_end());
        assert_eq!(cursor, list.rend());
        assert_eq!(cursor.get(), None);
    }

    #[test]
    fn move_prev_walks_forward() {
        let list = List::from_iter([1, 2, 3]);

        let mut cursor = list.rend();
        cursor.move_prev();
        assert_eq!(cursor.get(), Some(&1));
        cursor.move_prev();
        assert_eq!(cursor.get(), Some(&2));

        assert_eq!(cursor.base().get(), Some(&3));
        assert_eq!(cursor.into_base().peek_prev(), Some(&2));
    }

    #[test]
    fn reverse_wraps_around() {
        let list = List::from_iter([1, 2]);

        let mut cursor = list.rend();
        cursor.move_next();

        assert_eq!(cursor, list.rbegin());
        assert_eq!(cursor.get(), Some(&2));
    }

    #[test]
    fn mutable_reverse_cursor_writes_back_to_front() {
        let mut list = List::from_iter([1, 2, 3]);

        let mut cursor = list.rbegin_mut();
        let mut next_value = 10;

        while !cursor.is_end() {
            *cursor.get_mut().unwrap() = next_value;
            next_value += 1;
            cursor.move_next();
        }

        assert_eq!(cursor.get(), None);
        assert!(list.iter().eq(&[12, 11, 10]));
    }

    #[test]
    fn mutable_reverse_cursor_converts_to_read_only() {
        let mut list = List::from_iter([1, 2, 3]);

        let mut cursor = list.rbegin_mut();
        cursor.move_next();
        assert_eq!(cursor.get(), Some(&2));

        let read_only = cursor.into_cursor();
        assert_eq!(read_only.get(), Some(&2));
        assert!(!read_only.is_begin());
    }

    #[test]
    fn rend_mut_is_reverse_end() {
        let mut list = List::from_iter([1]);

        let mut cursor = list.rend_mut();
        assert!(cursor.is_end());
        assert!(cursor.get_mut().is_none());

        cursor.move_next();
        assert!(cursor.is_begin());
        assert_eq!(cursor.get(), Some(&1));
    }
}
