use thiserror::Error;

/// Errors that can occur when allocating memory for list nodes or constructing their payloads.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The arena does not have enough space left to satisfy the request.
    ///
    /// The arena cursor is not advanced when this is returned, so a smaller request may
    /// still succeed afterwards.
    #[error(
        "arena capacity exceeded: requested {requested} bytes aligned to {align}, {available} bytes available"
    )]
    CapacityExceeded {
        /// Number of bytes requested, not counting alignment padding.
        requested: usize,

        /// Alignment of the requested region.
        align: usize,

        /// Number of bytes left in the arena before the request, not counting any padding
        /// that would have been required to satisfy the alignment.
        available: usize,
    },

    /// The total size of the requested items does not fit into `usize`.
    #[error("cannot allocate {count} items of {element_size} bytes each: size overflows usize")]
    SizeOverflow {
        /// Number of items requested.
        count: usize,

        /// Size of one item in bytes.
        element_size: usize,
    },

    /// The global allocator was unable to provide the requested memory.
    #[error("global allocator failed to provide {size} bytes aligned to {align}")]
    OutOfMemory {
        /// Number of bytes requested.
        size: usize,

        /// Alignment of the requested region.
        align: usize,
    },

    /// A caller-supplied generator failed to produce an element.
    #[error("failed to construct element at index {index}")]
    ElementConstruction {
        /// Zero-based position of the element that could not be constructed.
        index: usize,

        /// The error returned by the generator.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// A specialized `Result` type for list and allocator operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::error::Error as _;
    use std::fmt::Debug;
    use std::io;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn capacity_exceeded_mentions_sizes() {
        let error = Error::CapacityExceeded {
            requested: 24,
            align: 8,
            available: 16,
        };

        let message = error.to_string();
        assert!(message.contains("24"));
        assert!(message.contains("16"));
    }

    #[test]
    fn element_construction_exposes_source() {
        let error = Error::ElementConstruction {
            index: 3,
            source: Box::new(io::Error::other("boom")),
        };

        assert!(error.to_string().contains('3'));
        assert_eq!(error.source().map(ToString::to_string).as_deref(), Some("boom"));
    }

    #[test]
    fn usable_in_result_context() {
        let result: Result<()> = Err(Error::OutOfMemory { size: 8, align: 8 });
        assert!(matches!(result, Err(Error::OutOfMemory { size: 8, .. })));
    }
}
