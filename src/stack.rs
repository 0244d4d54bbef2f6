use core::{
    fmt::{Debug, Formatter},
    mem,
};

use allocator_api2::{
    alloc::{Allocator, Global},
    boxed::Box,
};

use crate::{
    blob::{self, Blob},
    Container,
    Error,
};

struct Node<T, A: Allocator> {
    value: T,
    next: Link<T, A>,
}

type Link<T, A> = Option<Box<Node<T, A>, A>>;

/// A bounded LIFO stack of `T`, stored as a chain of individually allocated nodes hanging off
/// the top.
///
/// - `T`: the element type; must not be zero-sized.
/// - `A`: the allocator every node comes from.
///
/// The capacity is chosen at creation and never changes; pushing onto a full stack is refused
/// rather than growing or evicting.
///
/// ## Summary of supported operations
///
/// - {push,pop} at the top of the stack, with [`Self::discard`] to drop the top unseen.
/// - Copy of the top element ([`Self::peek`]).
/// - Draining ([`Self::clear`], [`Self::destroy`]).
///
/// Example:
/// ```
/// use tinyds::{Error, Stack};
/// let mut s = Stack::<u32>::new(2).unwrap();
/// s.push(10).unwrap();
/// s.push(20).unwrap();
/// assert_eq!(s.push(30), Err(Error::CapacityExceeded));
/// assert_eq!(s.pop(), Ok(20));
/// assert_eq!(s.pop(), Ok(10));
/// assert_eq!(s.pop(), Err(Error::Empty));
/// ```
///
pub struct Stack<T, A: Allocator + Clone = Global> {
    top: Link<T, A>,
    len: usize,
    capacity: usize,
    alloc: A,
}

impl<T> Stack<T> {
    /// Creates an empty stack holding at most `capacity` elements, allocating from [`Global`].
    pub fn new(capacity: usize) -> Result<Self, Error> {
        Self::new_in(capacity, Global)
    }
}

impl<T, A: Allocator + Clone> Stack<T, A> {
    /// The byte width of one element.
    pub const ELEMENT_SIZE: usize = mem::size_of::<T>();

    /// Creates an empty stack holding at most `capacity` elements, allocating from `alloc`.
    /// Fails if `capacity` is zero or `T` is zero-sized.
    pub fn new_in(capacity: usize, alloc: A) -> Result<Self, Error> {
        if capacity == 0 || Self::ELEMENT_SIZE == 0 {
            log::debug!(
                "refusing stack with capacity {} and element size {}",
                capacity, Self::ELEMENT_SIZE);
            return Err(Error::InvalidArgument);
        }
        log::debug!(
            "created stack with capacity {} and element size {}", capacity, Self::ELEMENT_SIZE);
        Ok(Self { top: None, len: 0, capacity, alloc })
    }

    /// Returns how many elements are currently in the stack.
    pub fn len(&self) -> usize { self.len }

    /// Returns the maximum number of elements this stack can store.
    pub fn capacity(&self) -> usize { self.capacity }

    /// Returns whether this stack is empty.
    pub fn is_empty(&self) -> bool { self.top.is_none() }

    /// Returns whether this stack can fit no more elements.
    pub fn is_full(&self) -> bool { self.len >= self.capacity }

    /// Pushes an element onto the top of this stack.
    /// On failure the stack is unchanged and `value` is dropped.
    pub fn push(&mut self, value: T) -> Result<(), Error> {
        if self.is_full() {
            log::debug!("stack is full ({} elements)", self.capacity);
            return Err(Error::CapacityExceeded);
        }
        // Link only after the allocation succeeded, so a refusal cannot take the chain with it.
        let mut node = blob::try_box(Node { value, next: None }, self.alloc.clone())?;
        node.next = self.top.take();
        self.top = Some(node);
        self.len += 1;
        log::trace!("pushed element {} onto stack", self.len);
        Ok(())
    }

    /// Removes the element on top and returns it.
    pub fn pop(&mut self) -> Result<T, Error> {
        let node = self.unlink().inspect_err(|_| log::debug!("pop from empty stack"))?;
        let Node { value, .. } = Box::into_inner(node);
        Ok(value)
    }

    /// Returns a copy of the element on top without removing it.
    pub fn peek(&self) -> Result<T, Error>
        where T: Clone {
        self.top().cloned().ok_or(Error::Empty)
    }

    /// Removes and frees the element on top without returning it.
    pub fn discard(&mut self) -> Result<(), Error> {
        self.unlink().map(drop)
    }

    /// Removes every element, returning how many were freed.
    pub fn clear(&mut self) -> usize {
        let mut freed = 0;
        while self.top.is_some() {
            if self.discard().is_ok() {
                freed += 1;
            }
        }
        freed
    }

    /// Frees every remaining node along with the stack itself.
    /// Returns how many elements were still stored.
    pub fn destroy(mut self) -> usize {
        let freed = self.clear();
        log::debug!("destroyed stack, freed {} elements", freed);
        freed
    }

    pub(crate) fn top(&self) -> Option<&T> {
        self.top.as_deref().map(|node| &node.value)
    }

    pub(crate) fn allocator(&self) -> &A { &self.alloc }

    fn unlink(&mut self) -> Result<Box<Node<T, A>, A>, Error> {
        let mut node = self.top.take().ok_or(Error::Empty)?;
        self.top = node.next.take();
        self.len -= 1;
        log::trace!("removed element from stack, {} left", self.len);
        Ok(node)
    }
}

impl<T, A: Allocator + Clone>
Container for Stack<T, A> {
    fn capacity(&self) -> usize { self.capacity }
    fn element_size(&self) -> usize { Self::ELEMENT_SIZE }
    fn len(&self) -> usize { self.len }
    fn clear(&mut self) -> usize { Stack::clear(self) }
}

impl<T, A: Allocator + Clone>
Drop for Stack<T, A> {
    fn drop(&mut self) {
        // Unlink one node at a time; dropping the chain head would recurse once per node.
        self.clear();
    }
}

impl<T: Debug, A: Allocator + Clone>
Debug for Stack<T, A> {
    /// Lists the elements from top to bottom.
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut list = f.debug_list();
        let mut cur = self.top.as_deref();
        while let Some(node) = cur {
            list.entry(&node.value);
            cur = node.next.as_deref();
        }
        list.finish()
    }
}

/// A bounded LIFO stack of opaque fixed-size byte elements.
///
/// Every element is exactly `element_size` bytes, fixed at creation. Each push deep-copies the
/// caller's bytes into a node-owned [`Blob`]; pop and peek copy them back out. Caller buffers
/// and stored data never alias.
///
/// Example:
/// ```
/// use tinyds::ByteStack;
/// let mut s = ByteStack::new(2, 4).unwrap();
/// s.push(&10i32.to_ne_bytes()).unwrap();
/// s.push(&20i32.to_ne_bytes()).unwrap();
/// assert!(s.push(&30i32.to_ne_bytes()).is_err());
/// let mut out = [0u8; 4];
/// s.pop(&mut out).unwrap();
/// assert_eq!(i32::from_ne_bytes(out), 20);
/// ```
///
pub struct ByteStack<A: Allocator + Clone = Global> {
    inner: Stack<Blob<A>, A>,
    element_size: usize,
}

impl ByteStack {
    /// Creates an empty stack of `capacity` elements of `element_size` bytes each,
    /// allocating from [`Global`].
    pub fn new(capacity: usize, element_size: usize) -> Result<Self, Error> {
        Self::new_in(capacity, element_size, Global)
    }
}

impl<A: Allocator + Clone> ByteStack<A> {
    /// Creates an empty stack of `capacity` elements of `element_size` bytes each,
    /// allocating from `alloc`. Fails if either argument is zero.
    pub fn new_in(capacity: usize, element_size: usize, alloc: A) -> Result<Self, Error> {
        if element_size == 0 {
            log::debug!("refusing stack with element size 0");
            return Err(Error::InvalidArgument);
        }
        Ok(Self { inner: Stack::new_in(capacity, alloc)?, element_size })
    }

    /// Returns the byte width of every element.
    pub fn element_size(&self) -> usize { self.element_size }

    /// Returns how many elements are currently in the stack.
    pub fn len(&self) -> usize { self.inner.len() }

    /// Returns the maximum number of elements this stack can store.
    pub fn capacity(&self) -> usize { self.inner.capacity() }

    /// Returns whether this stack is empty.
    pub fn is_empty(&self) -> bool { self.inner.is_empty() }

    /// Returns whether this stack can fit no more elements.
    pub fn is_full(&self) -> bool { self.inner.is_full() }

    /// Copies `data` onto the top of the stack.
    /// `data` must be exactly `element_size` bytes long.
    pub fn push(&mut self, data: &[u8]) -> Result<(), Error> {
        if self.inner.is_full() {
            log::debug!("stack is full ({} elements)", self.inner.capacity());
            return Err(Error::CapacityExceeded);
        }
        if data.len() != self.element_size {
            return Err(Error::InvalidArgument);
        }
        let blob = blob::try_copy_in(data, self.inner.allocator().clone())?;
        self.inner.push(blob)
    }

    /// Removes the element on top, copying it into the front of `out`.
    /// `out` must be at least `element_size` bytes long.
    pub fn pop(&mut self, out: &mut [u8]) -> Result<(), Error> {
        if out.len() < self.element_size {
            return Err(Error::InvalidArgument);
        }
        let blob = self.inner.pop()?;
        blob::copy_out(&blob, out)
    }

    /// Copies the element on top into the front of `out`, leaving the stack unchanged.
    /// `out` must be at least `element_size` bytes long.
    pub fn peek(&self, out: &mut [u8]) -> Result<(), Error> {
        if out.len() < self.element_size {
            return Err(Error::InvalidArgument);
        }
        let blob = self.inner.top().ok_or(Error::Empty)?;
        blob::copy_out(blob, out)
    }

    /// Removes and frees the element on top without copying it out.
    pub fn discard(&mut self) -> Result<(), Error> { self.inner.discard() }

    /// Removes every element, returning how many were freed.
    pub fn clear(&mut self) -> usize { self.inner.clear() }

    /// Frees every remaining node along with the stack itself.
    /// Returns how many elements were still stored.
    pub fn destroy(self) -> usize { self.inner.destroy() }
}

impl<A: Allocator + Clone>
Container for ByteStack<A> {
    fn capacity(&self) -> usize { self.inner.capacity() }
    fn element_size(&self) -> usize { self.element_size }
    fn len(&self) -> usize { self.inner.len() }
    fn clear(&mut self) -> usize { self.inner.clear() }
}

impl<A: Allocator + Clone>
Debug for ByteStack<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut list = f.debug_list();
        let mut cur = self.inner.top.as_deref();
        while let Some(node) = cur {
            list.entry(&&*node.value);
            cur = node.next.as_deref();
        }
        list.finish()
    }
}
