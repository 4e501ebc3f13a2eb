use thiserror::Error;

/// Errors reported by the `try_` family of container operations.
///
/// The plain operations signal the same conditions through `None`, `false` or an end cursor so
/// they can be used without any error plumbing; this type exists for callers who prefer `?`.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The allocator or arena backing the container has no room for the request.
    #[error("backing storage has no capacity left for the request")]
    CapacityExhausted,

    /// A handle or block was handed to a storage provider that does not own it, or it referred
    /// to a slot that is no longer occupied.
    #[error("the handle does not refer to a live object owned by this storage")]
    InvalidOwnership,

    /// The requested key or position is not present in the container.
    #[error("no entry matches the request")]
    NotFound,
}

/// A specialized `Result` type for container operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug, Copy);

    #[test]
    fn messages_are_descriptive() {
        assert_eq!(
            Error::CapacityExhausted.to_string(),
            "backing storage has no capacity left for the request"
        );
        assert_eq!(
            Error::NotFound.to_string(),
            "no entry matches the request"
        );
    }

    #[test]
    fn usable_with_question_mark() {
        fn fails() -> Result<()> {
            Err(Error::InvalidOwnership)?;
            Ok(())
        }

        assert_eq!(fails(), Err(Error::InvalidOwnership));
    }
}
