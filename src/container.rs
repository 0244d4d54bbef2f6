//! Defines a trait for bounded containers of fixed-size elements.

/// A bounded collection whose capacity and element size are fixed at creation.
///
/// **The following operations are required to be implemented**:
///
/// - fixed properties --- [`Self::capacity`] and [`Self::element_size`]
/// - current count --- [`Self::len`]
/// - draining --- [`Self::clear`]
///
/// The following must hold at all times: `len() <= capacity()`.
///
pub trait Container {
    /// Returns the maximum number of elements this container may ever hold.
    fn capacity(&self) -> usize;

    /// Returns the byte width of one element.
    fn element_size(&self) -> usize;

    /// Returns how many elements are currently stored.
    fn len(&self) -> usize;

    /// Returns whether this container holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns whether this container can accept no more elements.
    fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Removes and frees every element, returning how many were removed.
    /// Capacity and element size are unaffected; the container stays usable.
    fn clear(&mut self) -> usize;
}
