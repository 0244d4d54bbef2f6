//! Defines the single error type shared by every container.

/// Reasons a container operation can be refused.
///
/// Every variant is reported through a `Result`; no operation panics on bad input.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, thiserror::Error)]
pub enum Error {
    /// Zero capacity or element size, a caller buffer of the wrong length, or an invalid handle.
    #[error("invalid argument")]
    InvalidArgument,
    /// The container already holds `capacity` elements.
    #[error("capacity exceeded")]
    CapacityExceeded,
    /// The container holds no elements.
    #[error("container is empty")]
    Empty,
    /// The allocator could not provide memory for a node or its element buffer.
    #[error("allocation failure")]
    AllocationFailure,
}

impl From<allocator_api2::alloc::AllocError> for Error {
    fn from(_: allocator_api2::alloc::AllocError) -> Self {
        log::warn!("allocator refused a node or element buffer");
        Error::AllocationFailure
    }
}
