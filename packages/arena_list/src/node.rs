use std::cell::Cell;
use std::ptr::NonNull;

/// The ring-link part of a node. The sentinel of a list is a bare `Links`, every other node
/// of the ring is a [`Node<T>`] that starts with one.
///
/// The links are `Cell`s so that neighbors can be rewired through shared references while
/// exclusive references to the payloads of the same nodes exist.
#[derive(Debug)]
pub(crate) struct Links {
    next: Cell<NonNull<Links>>,
    prev: Cell<NonNull<Links>>,
}

impl Links {
    /// Links that do not point anywhere meaningful yet. They must be wired into a ring before
    /// anything follows them.
    pub(crate) fn detached() -> Self {
        Self {
            next: Cell::new(NonNull::dangling()),
            prev: Cell::new(NonNull::dangling()),
        }
    }
}

/// A payload node. `repr(C)` guarantees the links come first, so a pointer to the node is
/// also a valid pointer to its links.
#[repr(C)]
#[derive(Debug)]
pub(crate) struct Node<T> {
    #[allow(dead_code, reason = "only accessed through pointer casts in LinkPtr")]
    links: Links,
    value: T,
}

impl<T> Node<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            links: Links::detached(),
            value,
        }
    }
}

/// A pointer to the links of some ring node, either the sentinel or a payload node.
///
/// This is the unit of position in the ring. Equality is node identity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct LinkPtr(NonNull<Links>);

impl LinkPtr {
    pub(crate) fn new(links: NonNull<Links>) -> Self {
        Self(links)
    }

    pub(crate) fn from_node<T>(node: NonNull<Node<T>>) -> Self {
        Self(node.cast())
    }

    pub(crate) fn as_non_null(self) -> NonNull<Links> {
        self.0
    }

    /// Reinterprets the position as a payload node.
    ///
    /// # Safety
    ///
    /// The position must not be the sentinel.
    pub(crate) unsafe fn as_node<T>(self) -> NonNull<Node<T>> {
        self.0.cast()
    }

    /// # Safety
    ///
    /// The pointer must refer to live links.
    unsafe fn links<'a>(self) -> &'a Links {
        // SAFETY: Forwarding the caller's guarantee. We only ever create shared references
        // to links, mutating them through `Cell`.
        unsafe { self.0.as_ref() }
    }

    /// # Safety
    ///
    /// The pointer must refer to live links.
    pub(crate) unsafe fn next(self) -> Self {
        // SAFETY: Forwarding the caller's guarantee.
        Self(unsafe { self.links() }.next.get())
    }

    /// # Safety
    ///
    /// The pointer must refer to live links.
    pub(crate) unsafe fn prev(self) -> Self {
        // SAFETY: Forwarding the caller's guarantee.
        Self(unsafe { self.links() }.prev.get())
    }

    /// # Safety
    ///
    /// The pointer must refer to live links.
    pub(crate) unsafe fn set_next(self, next: Self) {
        // SAFETY: Forwarding the caller's guarantee.
        unsafe { self.links() }.next.set(next.0);
    }

    /// # Safety
    ///
    /// The pointer must refer to live links.
    pub(crate) unsafe fn set_prev(self, prev: Self) {
        // SAFETY: Forwarding the caller's guarantee.
        unsafe { self.links() }.prev.set(prev.0);
    }

    /// Points both links at the node itself, forming a ring of one.
    ///
    /// # Safety
    ///
    /// The pointer must refer to live links.
    pub(crate) unsafe fn self_link(self) {
        // SAFETY: Forwarding the caller's guarantee.
        unsafe {
            self.set_next(self);
        }
        // SAFETY: Forwarding the caller's guarantee.
        unsafe {
            self.set_prev(self);
        }
    }

    /// Splices `node` into the ring immediately before `self`.
    ///
    /// # Safety
    ///
    /// `self` must be part of a closed ring and `node` must be live links that are not part of
    /// any ring.
    pub(crate) unsafe fn link_before(self, node: Self) {
        // SAFETY: `self` is in a closed ring, so its predecessor is live as well.
        let prev = unsafe { self.prev() };

        // SAFETY: The caller guarantees `node` is live.
        unsafe {
            node.set_prev(prev);
        }
        // SAFETY: The caller guarantees `node` is live.
        unsafe {
            node.set_next(self);
        }
        // SAFETY: The predecessor is live as part of the same closed ring.
        unsafe {
            prev.set_next(node);
        }
        // SAFETY: The caller guarantees `self` is live.
        unsafe {
            self.set_prev(node);
        }
    }

    /// Removes `self` from its ring, joining its neighbors directly.
    ///
    /// The links of `self` are left pointing at the former neighbors.
    ///
    /// # Safety
    ///
    /// `self` must be part of a closed ring.
    pub(crate) unsafe fn unlink(self) {
        // SAFETY: `self` is in a closed ring, so it and its neighbors are live.
        let prev = unsafe { self.prev() };
        // SAFETY: As above.
        let next = unsafe { self.next() };

        // SAFETY: Both neighbors are live, as above.
        unsafe {
            prev.set_next(next);
        }
        // SAFETY: Both neighbors are live, as above.
        unsafe {
            next.set_prev(prev);
        }
    }

    /// # Safety
    ///
    /// The position must be a live payload node of type `Node<T>` and no exclusive reference
    /// to its value may exist for the lifetime `'a`.
    pub(crate) unsafe fn value<'a, T>(self) -> &'a T {
        // SAFETY: Forwarding the caller's guarantee.
        let node = unsafe { self.as_node::<T>() };

        // SAFETY: The node is live and its value initialized. We borrow only the value field,
        // leaving the links free for shared access.
        unsafe { &(*node.as_ptr()).value }
    }

    /// # Safety
    ///
    /// The position must be a live payload node of type `Node<T>` and no other reference to
    /// its value may exist for the lifetime `'a`.
    pub(crate) unsafe fn value_mut<'a, T>(self) -> &'a mut T {
        // SAFETY: Forwarding the caller's guarantee.
        let node = unsafe { self.as_node::<T>() };

        // SAFETY: The node is live, its value initialized and not otherwise borrowed. We
        // borrow only the value field, leaving the links free for shared access.
        unsafe { &mut (*node.as_ptr()).value }
    }
}

/// Moves the value out of a payload node, leaving the node memory uninitialized.
///
/// # Safety
///
/// The node must be live and initialized, and must not be read as initialized afterwards.
pub(crate) unsafe fn take_value<T>(node: NonNull<Node<T>>) -> T {
    // SAFETY: Forwarding the caller's guarantee that the node is live.
    let value = unsafe { &raw const (*node.as_ptr()).value };

    // SAFETY: Forwarding the caller's guarantee that the value is initialized and will not be
    // read again.
    unsafe { value.read() }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    reason = "test code doesn't need the same safety rigor as production code"
)]
mod tests {
    use super::*;

    fn boxed_links() -> LinkPtr {
        LinkPtr::new(NonNull::from(Box::leak(Box::new(Links::detached()))))
    }

    /// # Safety
    ///
    /// Must come from `boxed_links()` and not be used afterwards.
    unsafe fn free(links: LinkPtr) {
        // SAFETY: Forwarding the caller's guarantee.
        drop(unsafe { Box::from_raw(links.as_non_null().as_ptr()) });
    }

    #[test]
    fn link_and_unlink_keep_ring_closed() {
        let sentinel = boxed_links();
        let a = boxed_links();
        let b = boxed_links();

        // SAFETY: All links are live until freed at the end of the test.
        unsafe {
            sentinel.self_link();
            sentinel.link_before(a);
            sentinel.link_before(b);

            assert_eq!(sentinel.next(), a);
            assert_eq!(a.next(), b);
            assert_eq!(b.next(), sentinel);
            assert_eq!(sentinel.prev(), b);
            assert_eq!(b.prev(), a);
            assert_eq!(a.prev(), sentinel);

            a.unlink();

            assert_eq!(sentinel.next(), b);
            assert_eq!(b.prev(), sentinel);

            b.unlink();

            assert_eq!(sentinel.next(), sentinel);
            assert_eq!(sentinel.prev(), sentinel);

            free(a);
            free(b);
            free(sentinel);
        }
    }

    #[test]
    fn node_pointer_is_links_pointer() {
        let node = NonNull::from(Box::leak(Box::new(Node::new(42_u32))));
        let position = LinkPtr::from_node(node);

        // SAFETY: The node is live and we hold no other references to it.
        unsafe {
            position.self_link();
            assert_eq!(position.next(), position);
            assert_eq!(*position.value::<u32>(), 42);

            *position.value_mut::<u32>() = 43;
            assert_eq!(*position.value::<u32>(), 43);

            drop(Box::from_raw(node.as_ptr()));
        }
    }
}
