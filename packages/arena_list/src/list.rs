use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use scopeguard::ScopeGuard;
use tracing::debug;

use crate::node::{LinkPtr, Links, Node, take_value};
use crate::{
    Cursor, CursorMut, Error, Heap, IntoIter, Iter, IterMut, Result, RevCursor, TypedAllocator,
};

/// A doubly-linked list whose nodes are allocated through a pluggable [`TypedAllocator`].
///
/// The nodes form a closed ring around a payload-less sentinel node, which marks the
/// [`end()`][Self::end] position. Insertion and removal at any cursor position are O(1) and
/// never move other elements. There is no random access.
///
/// By default, nodes come from the global allocator via [`Heap`]. Supply an
/// [`ArenaHandle`][crate::ArenaHandle] to carve nodes out of a fixed-capacity
/// [`Arena`][crate::Arena] instead. The list rebinds the allocator from the element type `T`
/// to its internal node type, so the caller only ever names the element type.
///
/// # Fallible operations
///
/// Every operation that allocates returns a [`Result`][std::result::Result]. When building a
/// list of many elements fails part way through, all nodes created so far are released in
/// reverse order before the error is returned, so a failed build leaves no allocations behind.
/// A failed single insertion leaves the list unchanged.
///
/// # Examples
///
/// ```
/// use arena_list::{Arena, ArenaHandle, List};
///
/// let arena = Arena::<1024>::new();
/// let mut list = List::from_elem_in(3, &7, ArenaHandle::new(&arena)).unwrap();
///
/// list.begin_mut().insert_before(5).unwrap();
/// assert!(list.iter().eq(&[5, 7, 7, 7]));
///
/// list.begin_mut().remove_current();
/// assert!(list.iter().eq(&[7, 7, 7]));
/// assert_eq!(list.len(), 3);
/// ```
///
/// # Thread safety
///
/// The list is [`Send`] and [`Sync`] when both the element type and the allocator are.
/// Lists that allocate from an arena are neither, as the arena is not thread-safe.
pub struct List<T, A: TypedAllocator<T> = Heap<T>> {
    /// The boundary node of the ring. It lives in its own heap allocation so that the list
    /// itself can be moved without breaking the links that point to the sentinel.
    sentinel: LinkPtr,

    /// Number of payload nodes in the ring. Incremented and decremented exactly when a node
    /// is linked or unlinked.
    len: usize,

    alloc: A,

    _values: PhantomData<T>,
}

impl<T> List<T> {
    /// Creates an empty list that allocates from the global allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(Heap::new())
    }

    /// Creates a list of `len` default values, allocated from the global allocator.
    ///
    /// # Errors
    ///
    /// Returns an error if node memory cannot be allocated. No nodes are leaked.
    pub fn with_len(len: usize) -> Result<Self>
    where
        T: Default,
    {
        Self::with_len_in(len, Heap::new())
    }

    /// Creates a list of `len` clones of `value`, allocated from the global allocator.
    ///
    /// # Errors
    ///
    /// Returns an error if node memory cannot be allocated. No nodes are leaked.
    pub fn from_elem(len: usize, value: &T) -> Result<Self>
    where
        T: Clone,
    {
        Self::from_elem_in(len, value, Heap::new())
    }
}

impl<T, A: TypedAllocator<T>> List<T, A> {
    /// Creates an empty list that allocates nodes through `alloc`.
    #[must_use]
    pub fn new_in(alloc: A) -> Self {
        let sentinel = LinkPtr::new(NonNull::from(Box::leak(Box::new(Links::detached()))));

        // SAFETY: We just allocated the sentinel and nothing else refers to it yet.
        unsafe {
            sentinel.self_link();
        }

        Self {
            sentinel,
            len: 0,
            alloc,
            _values: PhantomData,
        }
    }

    /// Creates a list of `len` default values that allocates nodes through `alloc`.
    ///
    /// # Errors
    ///
    /// Returns an error if node memory cannot be allocated. Every node created before the
    /// failure is released before returning.
    pub fn with_len_in(len: usize, alloc: A) -> Result<Self>
    where
        T: Default,
    {
        Self::build(alloc, 0..len, |_| Ok(T::default()))
    }

    /// Creates a list of `len` clones of `value` that allocates nodes through `alloc`.
    ///
    /// # Errors
    ///
    /// Returns an error if node memory cannot be allocated. Every node created before the
    /// failure is released before returning.
    pub fn from_elem_in(len: usize, value: &T, alloc: A) -> Result<Self>
    where
        T: Clone,
    {
        Self::build(alloc, 0..len, |_| Ok(value.clone()))
    }

    /// Creates a list of `len` values produced by `f`, which receives the index of each
    /// value and may fail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ElementConstruction`] wrapping the first error returned by `f`, or an
    /// allocation error if node memory cannot be allocated. Every node created before the
    /// failure is released before returning.
    ///
    /// # Examples
    ///
    /// ```
    /// use arena_list::{Error, Heap, List};
    ///
    /// let squares = List::try_from_fn_in(4, Heap::new(), |i| Ok::<_, Error>(i * i)).unwrap();
    /// assert!(squares.iter().eq(&[0, 1, 4, 9]));
    ///
    /// let result = List::try_from_fn_in(4, Heap::new(), |i| {
    ///     if i == 2 { Err("no twos allowed") } else { Ok(i) }
    /// });
    /// assert!(matches!(result, Err(Error::ElementConstruction { index: 2, .. })));
    /// ```
    pub fn try_from_fn_in<E, F>(len: usize, alloc: A, mut f: F) -> Result<Self>
    where
        F: FnMut(usize) -> std::result::Result<T, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self::build(alloc, 0..len, |index| {
            f(index).map_err(|source| Error::ElementConstruction {
                index,
                source: source.into(),
            })
        })
    }

    /// Creates a copy of the list, allocating through the allocator selected by
    /// [`TypedAllocator::select_on_copy()`].
    ///
    /// # Errors
    ///
    /// Returns an error if node memory cannot be allocated. The partial copy is released and
    /// `self` is not affected.
    pub fn try_clone(&self) -> Result<Self>
    where
        T: Clone,
    {
        Self::build(self.alloc.select_on_copy(), self, |value| Ok(value.clone()))
    }

    /// Replaces the contents of the list with copies of the elements of `source`.
    ///
    /// The copy is built in full before anything about `self` changes, so on failure the
    /// list keeps its previous contents. The copy uses the allocator of `source` if
    /// [`TypedAllocator::PROPAGATE_ON_COPY_ASSIGNMENT`] is set, otherwise the list's own.
    ///
    /// # Errors
    ///
    /// Returns an error if node memory cannot be allocated.
    pub fn assign_from(&mut self, source: &Self) -> Result<()>
    where
        T: Clone,
    {
        let alloc = if A::PROPAGATE_ON_COPY_ASSIGNMENT {
            source.alloc.clone()
        } else {
            self.alloc.clone()
        };

        let mut copy = Self::build(alloc, source, |value| Ok(value.clone()))?;

        // The previous contents move into `copy` and are released when it is dropped.
        self.swap(&mut copy);

        Ok(())
    }

    /// The allocator the list allocates its nodes through.
    #[must_use]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Number of elements in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends an element to the back of the list.
    ///
    /// # Errors
    ///
    /// Returns an error if node memory cannot be allocated. The list is not modified.
    pub fn push_back(&mut self, value: T) -> Result<()> {
        // SAFETY: The sentinel is always part of our own ring.
        unsafe { self.insert_before(self.sentinel, move || Ok(value)) }.map(|_| ())
    }

    /// Prepends an element to the front of the list.
    ///
    /// # Errors
    ///
    /// Returns an error if node memory cannot be allocated. The list is not modified.
    pub fn push_front(&mut self, value: T) -> Result<()> {
        // SAFETY: The sentinel is always part of our own ring, so its successor is, too.
        let first = unsafe { self.sentinel.next() };

        // SAFETY: See above.
        unsafe { self.insert_before(first, move || Ok(value)) }.map(|_| ())
    }

    /// Removes the last element and returns it, or `None` if the list is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        // SAFETY: The list is not empty, so the predecessor of the sentinel is a payload node.
        let last = unsafe { self.sentinel.prev() };

        // SAFETY: See above.
        Some(unsafe { self.remove_node(last) })
    }

    /// Removes the first element and returns it, or `None` if the list is empty.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        // SAFETY: The list is not empty, so the successor of the sentinel is a payload node.
        let first = unsafe { self.sentinel.next() };

        // SAFETY: See above.
        Some(unsafe { self.remove_node(first) })
    }

    /// The first element, or `None` if the list is empty.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.begin().get()
    }

    /// The last element, or `None` if the list is empty.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.end().peek_prev()
    }

    /// The first element, or `None` if the list is empty.
    #[must_use]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            return None;
        }

        // SAFETY: The sentinel is alive for as long as the list is.
        let first = unsafe { self.sentinel.next() };

        // SAFETY: The list is not empty, so the successor of the sentinel is a payload node.
        // We hold `&mut self`, so nobody else can reference its value.
        Some(unsafe { first.value_mut() })
    }

    /// The last element, or `None` if the list is empty.
    #[must_use]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            return None;
        }

        // SAFETY: The sentinel is alive for as long as the list is.
        let last = unsafe { self.sentinel.prev() };

        // SAFETY: The list is not empty, so the predecessor of the sentinel is a payload node.
        // We hold `&mut self`, so nobody else can reference its value.
        Some(unsafe { last.value_mut() })
    }

    /// Removes and drops all elements, releasing their nodes.
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Exchanges the contents of two lists, including their allocators.
    ///
    /// Each list keeps its own sentinel: the exchanged chains of nodes are re-pointed at the
    /// sentinel of the list that now owns them. This means [`end()`][Self::end] positions of
    /// both lists are unaffected by the swap.
    pub fn swap(&mut self, other: &mut Self) {
        let ours = self.sentinel;
        let theirs = other.sentinel;

        // SAFETY: Both sentinels are alive for as long as their lists are.
        let our_first = unsafe { ours.next() };
        // SAFETY: As above.
        let our_last = unsafe { ours.prev() };
        // SAFETY: As above.
        let their_first = unsafe { theirs.next() };
        // SAFETY: As above.
        let their_last = unsafe { theirs.prev() };

        mem::swap(&mut self.len, &mut other.len);
        mem::swap(&mut self.alloc, &mut other.alloc);

        // SAFETY: The chains were taken from closed rings a moment ago and the sentinels are
        // alive. Lengths have already been exchanged to match the chains.
        unsafe {
            Self::adopt(ours, their_first, their_last, self.len);
        }
        // SAFETY: As above.
        unsafe {
            Self::adopt(theirs, our_first, our_last, other.len);
        }

        #[cfg(debug_assertions)]
        {
            self.integrity_check();
            other.integrity_check();
        }
    }

    /// Read-only cursor at the first element, or at [`end()`][Self::end] if the list is empty.
    #[must_use]
    pub fn begin(&self) -> Cursor<'_, T, A> {
        // SAFETY: The sentinel is alive for as long as the list is.
        let first = unsafe { self.sentinel.next() };
        Cursor::new(first, self)
    }

    /// Read-only cursor at the sentinel, one past the last element. It cannot be dereferenced.
    #[must_use]
    pub fn end(&self) -> Cursor<'_, T, A> {
        Cursor::new(self.sentinel, self)
    }

    /// Mutable cursor at the first element, or at [`end_mut()`][Self::end_mut] if the list is
    /// empty.
    #[must_use]
    pub fn begin_mut(&mut self) -> CursorMut<'_, T, A> {
        // SAFETY: The sentinel is alive for as long as the list is.
        let first = unsafe { self.sentinel.next() };
        CursorMut::new(first, self)
    }

    /// Mutable cursor at the sentinel, one past the last element. Inserting here appends.
    #[must_use]
    pub fn end_mut(&mut self) -> CursorMut<'_, T, A> {
        let sentinel = self.sentinel;
        CursorMut::new(sentinel, self)
    }

    /// Read-only reverse cursor at the last element.
    #[must_use]
    pub fn rbegin(&self) -> RevCursor<Cursor<'_, T, A>> {
        RevCursor::new(self.end())
    }

    /// Read-only reverse cursor one before the first element. It cannot be dereferenced.
    #[must_use]
    pub fn rend(&self) -> RevCursor<Cursor<'_, T, A>> {
        RevCursor::new(self.begin())
    }

    /// Mutable reverse cursor at the last element.
    #[must_use]
    pub fn rbegin_mut(&mut self) -> RevCursor<CursorMut<'_, T, A>> {
        RevCursor::new(self.end_mut())
    }

    /// Mutable reverse cursor one before the first element. It cannot be dereferenced.
    #[must_use]
    pub fn rend_mut(&mut self) -> RevCursor<CursorMut<'_, T, A>> {
        RevCursor::new(self.begin_mut())
    }

    /// Iterates over shared references to the elements, front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        // SAFETY: The sentinel is alive and the ring holds exactly `len` payload nodes.
        unsafe { Iter::new(self.sentinel, self.len) }
    }

    /// Iterates over exclusive references to the elements, front to back.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        // SAFETY: The sentinel is alive and the ring holds exactly `len` payload nodes. We
        // hold `&mut self` for the lifetime of the iterator.
        unsafe { IterMut::new(self.sentinel, self.len) }
    }

    pub(crate) fn sentinel(&self) -> LinkPtr {
        self.sentinel
    }

    /// Builds a list by appending one element per seed. On the first failure, every node
    /// linked so far is released in reverse order and the error is returned.
    fn build<S, I, F>(alloc: A, seeds: I, mut construct: F) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        F: FnMut(S) -> Result<T>,
    {
        let mut list = Self::new_in(alloc);

        for seed in seeds {
            let end = list.sentinel;

            // SAFETY: The sentinel is always part of our own ring.
            let inserted = unsafe { list.insert_before(end, || construct(seed)) };

            if let Err(error) = inserted {
                list.unwind();
                return Err(error);
            }
        }

        #[cfg(debug_assertions)]
        list.integrity_check();

        Ok(list)
    }

    /// Releases all nodes of a partially built list, newest first.
    fn unwind(&mut self) {
        let released = self.len;

        while self.pop_back().is_some() {}

        debug!(
            released,
            element = type_name::<T>(),
            "rolled back partially built list"
        );
    }

    fn node_allocator(&self) -> A::Rebind<Node<T>> {
        self.alloc.rebind()
    }

    /// Allocates a node and constructs its payload. If construction fails or panics, the
    /// node memory is released before the failure propagates.
    fn create_node<F>(&self, construct: F) -> Result<LinkPtr>
    where
        F: FnOnce() -> Result<T>,
    {
        let node_allocator = self.node_allocator();
        let node = node_allocator.allocate(1)?;

        let slot = scopeguard::guard(node, |node| {
            // SAFETY: Allocated above with the same count and holds no value yet.
            unsafe {
                node_allocator.deallocate(node, 1);
            }
        });

        let value = construct()?;

        // SAFETY: The memory is freshly allocated, sized and aligned for one node.
        unsafe {
            slot.as_ptr().write(Node::new(value));
        }

        Ok(LinkPtr::from_node(ScopeGuard::into_inner(slot)))
    }

    /// Creates a node and splices it into the ring immediately before `position`. On failure,
    /// the ring is left unchanged.
    ///
    /// # Safety
    ///
    /// `position` must be a node of this list's ring (the sentinel included).
    pub(crate) unsafe fn insert_before<F>(
        &mut self,
        position: LinkPtr,
        construct: F,
    ) -> Result<LinkPtr>
    where
        F: FnOnce() -> Result<T>,
    {
        let node = self.create_node(construct)?;

        // SAFETY: The caller guarantees `position` is in our closed ring and the node is
        // freshly created, not part of any ring.
        unsafe {
            position.link_before(node);
        }

        self.len = self
            .len
            .checked_add(1)
            .expect("a list cannot hold more nodes than fit in memory");

        Ok(node)
    }

    /// Unlinks a payload node, moves its value out and releases its memory.
    ///
    /// # Safety
    ///
    /// `position` must be a payload node of this list's ring (not the sentinel).
    pub(crate) unsafe fn remove_node(&mut self, position: LinkPtr) -> T {
        debug_assert_ne!(position, self.sentinel, "the sentinel cannot be removed");

        // SAFETY: The caller guarantees the node is in our closed ring.
        unsafe {
            position.unlink();
        }

        self.len = self
            .len
            .checked_sub(1)
            .expect("we just unlinked a payload node so the length must be non-zero");

        // SAFETY: The caller guarantees this is a payload node of our element type.
        let node = unsafe { position.as_node::<T>() };

        // SAFETY: The node was initialized when linked and is no longer reachable from the ring.
        let value = unsafe { take_value(node) };

        // SAFETY: Every payload node was allocated through an equal node allocator with a
        // count of one, and its value has just been moved out.
        unsafe {
            self.node_allocator().deallocate(node, 1);
        }

        value
    }

    /// Re-points the chain `first..=last` at `sentinel`, or self-links the sentinel if the
    /// chain is empty.
    ///
    /// # Safety
    ///
    /// All nodes must be alive. If `len` is non-zero, `first` and `last` must be the ends of a
    /// chain of `len` payload nodes.
    unsafe fn adopt(sentinel: LinkPtr, first: LinkPtr, last: LinkPtr, len: usize) {
        if len == 0 {
            // SAFETY: Forwarding the caller's guarantee.
            unsafe {
                sentinel.self_link();
            }
            return;
        }

        // SAFETY: Forwarding the caller's guarantee.
        unsafe {
            sentinel.set_next(first);
        }
        // SAFETY: Forwarding the caller's guarantee.
        unsafe {
            sentinel.set_prev(last);
        }
        // SAFETY: Forwarding the caller's guarantee.
        unsafe {
            first.set_prev(sentinel);
        }
        // SAFETY: Forwarding the caller's guarantee.
        unsafe {
            last.set_next(sentinel);
        }
    }

    /// Verifies that the ring is closed in both directions and holds exactly `len` payload
    /// nodes.
    ///
    /// # Panics
    ///
    /// Panics if the ring is corrupted.
    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    pub(crate) fn integrity_check(&self) {
        let mut observed_len: usize = 0;
        let mut current = self.sentinel;

        loop {
            // SAFETY: Every node reachable from the sentinel is alive, or the ring is corrupted
            // in a way we cannot detect anyway.
            let next = unsafe { current.next() };

            // SAFETY: As above.
            let next_prev = unsafe { next.prev() };

            assert_eq!(
                next_prev,
                current,
                "ring is not closed after node {} in list of {}",
                observed_len,
                type_name::<T>()
            );

            if next == self.sentinel {
                break;
            }

            observed_len = observed_len
                .checked_add(1)
                .expect("guarded by the length check below");

            assert!(
                observed_len <= self.len,
                "ring holds more payload nodes than the stored length {} in list of {}",
                self.len,
                type_name::<T>()
            );

            current = next;
        }

        assert_eq!(
            observed_len,
            self.len,
            "ring holds {} payload nodes but the stored length is {} in list of {}",
            observed_len,
            self.len,
            type_name::<T>()
        );
    }
}

impl<T, A: TypedAllocator<T>> Drop for List<T, A> {
    fn drop(&mut self) {
        self.clear();

        // SAFETY: The sentinel was leaked from a `Box` in `new_in()` and nothing refers to it
        // any more now that the ring is empty.
        drop(unsafe { Box::from_raw(self.sentinel.as_non_null().as_ptr()) });
    }
}

impl<T: Clone, A: TypedAllocator<T>> Clone for List<T, A> {
    fn clone(&self) -> Self {
        self.try_clone()
            .expect("we do not intend to handle allocation failure when cloning - use try_clone()")
    }

    fn clone_from(&mut self, source: &Self) {
        self.assign_from(source)
            .expect("we do not intend to handle allocation failure when cloning - use assign_from()");
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::build(Heap::new(), iter, Ok)
            .expect("we do not intend to handle global allocation failure as a real possibility")
    }
}

impl<T, A: TypedAllocator<T>> IntoIterator for List<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, A: TypedAllocator<T>> IntoIterator for &'a List<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: TypedAllocator<T>> IntoIterator for &'a mut List<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, A, B> PartialEq<List<T, B>> for List<T, A>
where
    T: PartialEq,
    A: TypedAllocator<T>,
    B: TypedAllocator<T>,
{
    fn eq(&self, other: &List<T, B>) -> bool {
        self.len == other.len() && self.iter().eq(other)
    }
}

impl<T: Eq, A: TypedAllocator<T>> Eq for List<T, A> {}

impl<T: Hash, A: TypedAllocator<T>> Hash for List<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);

        for value in self {
            value.hash(state);
        }
    }
}

impl<T: fmt::Debug, A: TypedAllocator<T>> fmt::Debug for List<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self).finish()
    }
}

// SAFETY: The list exclusively owns its nodes and their values, so it can move to another
// thread whenever the values and the allocator can.
unsafe impl<T: Send, A: TypedAllocator<T> + Send> Send for List<T, A> {}

// SAFETY: Shared access only reads the ring and hands out shared references to values, so
// sharing is safe whenever the values and the allocator can be shared.
unsafe impl<T: Sync, A: TypedAllocator<T> + Sync> Sync for List<T, A> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(
    clippy::arithmetic_side_effects,
    clippy::items_after_statements,
    reason = "test code doesn't need the same rigor as production code"
)]
mod tests {
    use std::alloc::Layout;
    use std::cell::Cell;
    use std::collections::hash_map::DefaultHasher;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::{Arena, ArenaHandle};

    assert_impl_all!(List<u32>: Send, Sync, Clone);
    assert_impl_all!(List<Cell<u32>>: Send);
    assert_not_impl_any!(List<Cell<u32>>: Sync);
    assert_not_impl_any!(List<Rc<u32>>: Send, Sync);
    assert_not_impl_any!(List<u32, ArenaHandle<'static, u32, 64>>: Send, Sync);

    fn contents<T: Clone, A: TypedAllocator<T>>(list: &List<T, A>) -> Vec<T> {
        list.iter().cloned().collect()
    }

    #[test]
    fn new_is_empty() {
        let list = List::<u32>::new();

        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
        assert_eq!(list.begin(), list.end());
        #[cfg(debug_assertions)]
        list.integrity_check();
    }

    #[test]
    fn with_len_uses_default() {
        let list = List::<u32>::with_len(4).unwrap();

        assert_eq!(list.len(), 4);
        assert_eq!(contents(&list), vec![0, 0, 0, 0]);
    }

    #[test]
    fn from_elem_clones_value() {
        let list = List::from_elem(3, &7).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(contents(&list), vec![7, 7, 7]);
    }

    #[test]
    fn from_elem_zero_is_empty() {
        let list = List::from_elem(0, &"x".to_string()).unwrap();

        assert!(list.is_empty());
        #[cfg(debug_assertions)]
        list.integrity_check();
    }

    #[test]
    fn push_and_pop_both_ends() {
        let mut list = List::new();

        list.push_back(2).unwrap();
        list.push_back(3).unwrap();
        list.push_front(1).unwrap();

        assert_eq!(contents(&list), vec![1, 2, 3]);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&3));
        #[cfg(debug_assertions)]
        list.integrity_check();

        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), None);
        assert_eq!(list.pop_front(), None);
        #[cfg(debug_assertions)]
        list.integrity_check();
    }

    #[test]
    fn push_back_then_pop_back_restores_sequence() {
        let mut list = List::from_iter([1, 2, 3]);

        list.push_back(4).unwrap();
        assert_eq!(list.pop_back(), Some(4));

        assert_eq!(contents(&list), vec![1, 2, 3]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn front_and_back_mut() {
        let mut list = List::from_iter([1, 2, 3]);

        *list.front_mut().unwrap() = 10;
        *list.back_mut().unwrap() = 30;

        assert_eq!(contents(&list), vec![10, 2, 30]);

        let mut empty = List::<u32>::new();
        assert!(empty.front_mut().is_none());
        assert!(empty.back_mut().is_none());
        assert!(empty.front().is_none());
        assert!(empty.back().is_none());
    }

    #[test]
    fn clone_is_independent() {
        let original = List::from_iter([1, 2, 3]);
        let mut copy = original.clone();

        assert_eq!(original, copy);

        *copy.front_mut().unwrap() = 100;

        assert_eq!(contents(&original), vec![1, 2, 3]);
        assert_eq!(contents(&copy), vec![100, 2, 3]);
    }

    #[test]
    fn clone_from_replaces_contents() {
        let source = List::from_iter([4, 5]);
        let mut target = List::from_iter([1, 2, 3]);

        target.clone_from(&source);

        assert_eq!(contents(&target), vec![4, 5]);
        assert_eq!(contents(&source), vec![4, 5]);
        #[cfg(debug_assertions)]
        target.integrity_check();
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = List::from_iter([1, 2, 3]);
        let mut b = List::from_iter([9]);

        a.swap(&mut b);

        assert_eq!(contents(&a), vec![9]);
        assert_eq!(contents(&b), vec![1, 2, 3]);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn swap_with_empty_relinks_sentinels() {
        let mut full = List::from_iter([1, 2]);
        let mut empty = List::new();

        full.swap(&mut empty);

        assert!(full.is_empty());
        assert_eq!(full.begin(), full.end());
        assert_eq!(contents(&empty), vec![1, 2]);

        // Both lists must remain fully usable after the swap.
        full.push_back(5).unwrap();
        empty.push_front(0).unwrap();

        assert_eq!(contents(&full), vec![5]);
        assert_eq!(contents(&empty), vec![0, 1, 2]);
        #[cfg(debug_assertions)]
        full.integrity_check();
        #[cfg(debug_assertions)]
        empty.integrity_check();
    }

    #[test]
    fn swap_two_empty_lists() {
        let mut a = List::<u8>::new();
        let mut b = List::<u8>::new();

        a.swap(&mut b);

        assert!(a.is_empty());
        assert!(b.is_empty());
        #[cfg(debug_assertions)]
        a.integrity_check();
        #[cfg(debug_assertions)]
        b.integrity_check();
    }

    #[test]
    fn swap_keeps_end_position() {
        let mut a = List::from_iter([1]);
        let mut b = List::from_iter([2, 3]);

        let a_end_before = a.sentinel();
        a.swap(&mut b);

        assert_eq!(a.sentinel(), a_end_before);
        assert_eq!(a.back(), Some(&3));
    }

    #[test]
    fn moving_list_keeps_ring_intact() {
        let list = List::from_iter([1, 2, 3]);

        let mut boxed = Box::new(list);
        boxed.push_back(4).unwrap();

        let moved = *boxed;
        assert_eq!(contents(&moved), vec![1, 2, 3, 4]);
        #[cfg(debug_assertions)]
        moved.integrity_check();
    }

    struct Counted(Rc<Cell<usize>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn clear_drops_all_values() {
        let drops = Rc::new(Cell::new(0));

        let mut list = List::new();
        for _ in 0..5 {
            list.push_back(Counted(Rc::clone(&drops))).unwrap();
        }

        list.clear();

        assert_eq!(drops.get(), 5);
        assert!(list.is_empty());
        #[cfg(debug_assertions)]
        list.integrity_check();

        list.push_back(Counted(Rc::clone(&drops))).unwrap();
        drop(list);

        assert_eq!(drops.get(), 6);
    }

    #[test]
    fn try_from_fn_in_stops_at_first_error() {
        let mut calls = 0;

        let result = List::try_from_fn_in(10, Heap::new(), |index| {
            calls += 1;
            if index == 3 { Err("three") } else { Ok(index) }
        });

        assert!(matches!(
            result,
            Err(Error::ElementConstruction { index: 3, .. })
        ));
        assert_eq!(calls, 4);
    }

    #[test]
    fn arena_backed_list_reports_exhaustion() {
        // Room for a handful of nodes but not a hundred.
        let arena = Arena::<256>::new();

        let result = List::from_elem_in(100, &1_u64, ArenaHandle::new(&arena));

        assert!(matches!(result, Err(Error::CapacityExceeded { .. })));
    }

    #[test]
    fn failed_push_leaves_list_unchanged() {
        let arena = Arena::<64>::new();
        let mut list = List::new_in(ArenaHandle::new(&arena));

        let mut pushed = 0_u64;
        while list.push_back(pushed).is_ok() {
            pushed += 1;
        }

        assert_eq!(list.len(), usize::try_from(pushed).unwrap());
        assert!(list.iter().copied().eq(0..pushed));
        #[cfg(debug_assertions)]
        list.integrity_check();
    }

    #[test]
    fn assign_from_failure_keeps_previous_contents() {
        // Both arenas must outlive both lists, as assignment ties their handle lifetimes.
        let target_arena = Arena::<512>::new();
        let source_arena = Arena::<512>::new();

        let mut target = List::from_elem_in(1, &1_u64, ArenaHandle::new(&target_arena)).unwrap();

        // Leave room for no more than two more nodes in the target's arena.
        let filler = target_arena.remaining() - 64;
        target_arena
            .allocate(Layout::from_size_align(filler, 1).unwrap())
            .unwrap();

        let source = List::from_elem_in(10, &2_u64, ArenaHandle::new(&source_arena)).unwrap();

        // The copy is built with the target's own allocator, which runs out part way.
        let result = target.assign_from(&source);

        assert!(matches!(result, Err(Error::CapacityExceeded { .. })));
        assert_eq!(contents(&target), vec![1]);
        assert_eq!(contents(&source), vec![2; 10]);
        #[cfg(debug_assertions)]
        target.integrity_check();
    }

    #[test]
    fn assign_from_keeps_own_allocator() {
        let target_arena = Arena::<512>::new();
        let source_arena = Arena::<512>::new();

        let mut target = List::from_elem_in(1, &1_u64, ArenaHandle::new(&target_arena)).unwrap();
        let source = List::from_elem_in(3, &2_u64, ArenaHandle::new(&source_arena)).unwrap();

        let source_used = source_arena.used();
        target.assign_from(&source).unwrap();

        assert_eq!(contents(&target), vec![2, 2, 2]);
        assert_eq!(*target.allocator(), ArenaHandle::<u64, 512>::new(&target_arena));
        assert_eq!(source_arena.used(), source_used);
    }

    #[test]
    fn equality_and_hash_follow_contents() {
        let a = List::from_iter([1, 2, 3]);
        let b = List::from_iter([1, 2, 3]);
        let c = List::from_iter([1, 2]);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let hash = |list: &List<i32>| {
            let mut hasher = DefaultHasher::new();
            list.hash(&mut hasher);
            hasher.finish()
        };

        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn equality_across_allocators() {
        let arena = Arena::<1024>::new();
        let in_arena = List::from_elem_in(2, &5, ArenaHandle::new(&arena)).unwrap();
        let on_heap = List::from_elem(2, &5).unwrap();

        assert!(in_arena == on_heap);
    }

    #[test]
    fn debug_lists_elements() {
        let list = List::from_iter([1, 2]);
        assert_eq!(format!("{list:?}"), "[1, 2]");
    }

    #[test]
    fn zero_sized_elements() {
        let mut list = List::from_elem(3, &()).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(list.pop_front(), Some(()));
        assert_eq!(list.len(), 2);
        #[cfg(debug_assertions)]
        list.integrity_check();
    }
}
