//! Defines [`Handle`]: an opaque, explicitly destroyed reference to one container.

use allocator_api2::alloc::Allocator;

use crate::{ByteQueue, ByteStack, Container, Error};

/// An opaque reference to one container with an explicit create/operate/destroy lifecycle.
///
/// A handle is either valid (owns a container) or invalid (creation failed, or the handle was
/// destroyed). Operations on an invalid handle fail with [`Error::InvalidArgument`], except:
///
/// - [`Self::is_empty`] reports `true`.
/// - [`Self::size`] reports `-1`.
/// - [`Self::destroy`] does nothing and reports `0`.
///
/// Example:
/// ```
/// use tinyds::{Error, Handle};
/// let mut h = Handle::stack(2, 4);
/// h.push(&[1, 2, 3, 4]).unwrap();
/// assert_eq!(h.size(), 1);
/// assert_eq!(h.destroy(), 1);
/// assert!(h.is_empty());
/// assert_eq!(h.size(), -1);
/// assert_eq!(h.push(&[1, 2, 3, 4]), Err(Error::InvalidArgument));
/// ```
///
#[derive(Debug)]
pub struct Handle<C: Container>(Option<C>);

impl<C: Container> Handle<C> {
    /// Creates an invalid handle.
    pub const fn invalid() -> Self { Self(None) }

    /// Wraps the outcome of a container constructor; a failed creation yields an invalid handle.
    pub fn create(created: Result<C, Error>) -> Self {
        match created {
            Ok(c) => Self(Some(c)),
            Err(e) => {
                log::debug!("container creation failed ({}), handle is invalid", e);
                Self(None)
            }
        }
    }

    /// Returns whether this handle still owns a container.
    pub fn is_valid(&self) -> bool { self.0.is_some() }

    /// Borrows the container.
    pub fn get(&self) -> Result<&C, Error> {
        self.0.as_ref().ok_or(Error::InvalidArgument)
    }

    /// Mutably borrows the container.
    pub fn get_mut(&mut self) -> Result<&mut C, Error> {
        self.0.as_mut().ok_or(Error::InvalidArgument)
    }

    /// Returns whether the container is empty; an invalid handle counts as empty.
    pub fn is_empty(&self) -> bool {
        self.0.as_ref().map_or(true, |c| c.is_empty())
    }

    /// Returns the number of stored elements, or `-1` for an invalid handle.
    pub fn size(&self) -> isize {
        self.0.as_ref().map_or(-1, |c| isize::try_from(c.len()).unwrap_or(isize::MAX))
    }

    /// Frees every remaining element and the container, leaving this handle invalid.
    /// Returns how many elements were still stored; `0` if the handle was already invalid.
    pub fn destroy(&mut self) -> usize {
        match self.0.take() {
            Some(mut c) => {
                let freed = c.clear();
                log::debug!("destroyed handle, freed {} elements", freed);
                freed
            }
            None => 0,
        }
    }

    /// Takes the container out, leaving this handle invalid.
    pub fn take(&mut self) -> Option<C> { self.0.take() }
}

impl<C: Container> Default for Handle<C> {
    fn default() -> Self { Self::invalid() }
}

impl<C: Container> From<C> for Handle<C> {
    fn from(c: C) -> Self { Self(Some(c)) }
}

impl Handle<ByteStack> {
    /// Creates a byte stack handle; invalid if either argument is zero.
    pub fn stack(capacity: usize, element_size: usize) -> Self {
        Self::create(ByteStack::new(capacity, element_size))
    }
}

impl<A: Allocator + Clone> Handle<ByteStack<A>> {
    /// See [`ByteStack::push`].
    pub fn push(&mut self, data: &[u8]) -> Result<(), Error> {
        self.get_mut()?.push(data)
    }

    /// See [`ByteStack::pop`].
    pub fn pop(&mut self, out: &mut [u8]) -> Result<(), Error> {
        self.get_mut()?.pop(out)
    }

    /// See [`ByteStack::peek`].
    pub fn peek(&self, out: &mut [u8]) -> Result<(), Error> {
        self.get()?.peek(out)
    }
}

impl Handle<ByteQueue> {
    /// Creates a byte queue handle; invalid if either argument is zero.
    pub fn queue(capacity: usize, element_size: usize) -> Self {
        Self::create(ByteQueue::new(capacity, element_size))
    }
}

impl<A: Allocator + Clone> Handle<ByteQueue<A>> {
    /// See [`ByteQueue::enqueue`].
    pub fn enqueue(&mut self, data: &[u8]) -> Result<(), Error> {
        self.get_mut()?.enqueue(data)
    }

    /// See [`ByteQueue::dequeue`].
    pub fn dequeue(&mut self, out: &mut [u8]) -> Result<(), Error> {
        self.get_mut()?.dequeue(out)
    }

    /// See [`ByteQueue::peek`].
    pub fn peek(&self, out: &mut [u8]) -> Result<(), Error> {
        self.get()?.peek(out)
    }
}
