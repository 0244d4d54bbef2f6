//! Fallible allocation helpers: owned byte buffers and node boxes.

use allocator_api2::{
    alloc::Allocator,
    boxed::Box,
    vec::Vec,
};

use crate::Error;

/// An owned heap buffer holding a byte-exact copy of one element.
pub type Blob<A> = Box<[u8], A>;

/// Copies `bytes` into a freshly allocated buffer of exactly `bytes.len()` bytes.
/// Nothing is left allocated if the allocator refuses.
pub fn try_copy_in<A: Allocator>(bytes: &[u8], alloc: A) -> Result<Blob<A>, Error> {
    let mut buf = Vec::new_in(alloc);
    buf.try_reserve_exact(bytes.len()).map_err(|_| {
        log::warn!("allocator refused an element buffer of {} bytes", bytes.len());
        Error::AllocationFailure
    })?;
    buf.extend_from_slice(bytes);
    Ok(buf.into_boxed_slice())
}

/// Copies the whole of `blob` into the front of `out`.
/// Fails if `out` is shorter than `blob`; the bytes of `out` past `blob.len()` are untouched.
pub fn copy_out(blob: &[u8], out: &mut [u8]) -> Result<(), Error> {
    match out.get_mut(..blob.len()) {
        Some(dst) => {
            dst.copy_from_slice(blob);
            Ok(())
        }
        None => Err(Error::InvalidArgument),
    }
}

/// Moves `value` into a new box, or reports [`Error::AllocationFailure`].
/// On failure `value` is dropped, so anything it owns is released too.
pub fn try_box<T, A: Allocator>(value: T, alloc: A) -> Result<Box<T, A>, Error> {
    Ok(Box::try_new_in(value, alloc)?)
}
