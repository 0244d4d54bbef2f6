use core::{
    fmt::{Debug, Formatter},
    marker::PhantomData,
    mem,
    ptr::NonNull,
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

struct Node<T> {
    value: T,
    next: Option<NonNull<Node<T>>>,
}

/// A bounded FIFO queue of `T`, stored as a chain of individually allocated nodes running from
/// the head (removal end) to the tail (insertion end).
///
/// - `T`: the element type; must not be zero-sized.
/// - `A`: the allocator every node comes from.
///
/// The capacity is chosen at creation and never changes; enqueueing into a full queue is
/// refused rather than growing or evicting.
///
/// The queue does no locking of its own. It is [`Send`]/[`Sync`] whenever `T` and `A` are, so it
/// may be shared behind a caller-owned lock.
///
/// Example:
/// ```
/// use tinyds::{Error, Queue};
/// let mut q = Queue::<u32>::new(2).unwrap();
/// q.enqueue(10).unwrap();
/// q.enqueue(20).unwrap();
/// assert_eq!(q.enqueue(30), Err(Error::CapacityExceeded));
/// assert_eq!(q.dequeue(), Ok(10));
/// assert_eq!(q.dequeue(), Ok(20));
/// assert!(q.is_empty());
/// ```
///
pub struct Queue<T, A: Allocator + Clone = Global> {
    // Invariant: `head.is_none() == tail.is_none() == (len == 0)`, and `tail.next` is `None`.
    // Every node entered the chain through `into_link`, leaves it through `reclaim`, and is owned
    // by this queue alone.
    head: Option<NonNull<Node<T>>>,
    tail: Option<NonNull<Node<T>>>,
    len: usize,
    capacity: usize,
    alloc: A,
    _owns: PhantomData<Node<T>>,
}

// SAFETY: the node chain is uniquely owned, exactly like a `Box` chain would be.
unsafe impl<T: Send, A: Allocator + Clone + Send> Send for Queue<T, A> {}
// SAFETY: `&Queue` only hands out `&T`.
unsafe impl<T: Sync, A: Allocator + Clone + Sync> Sync for Queue<T, A> {}

impl<T> Queue<T> {
    /// Creates an empty queue holding at most `capacity` elements, allocating from [`Global`].
    pub fn new(capacity: usize) -> Result<Self, Error> {
        Self::new_in(capacity, Global)
    }
}

impl<T, A: Allocator + Clone> Queue<T, A> {
    /// The byte width of one element.
    pub const ELEMENT_SIZE: usize = mem::size_of::<T>();

    /// Creates an empty queue holding at most `capacity` elements, allocating from `alloc`.
    /// Fails if `capacity` is zero or `T` is zero-sized.
    pub fn new_in(capacity: usize, alloc: A) -> Result<Self, Error> {
        if capacity == 0 || Self::ELEMENT_SIZE == 0 {
            log::debug!(
                "refusing queue with capacity {} and element size {}",
                capacity, Self::ELEMENT_SIZE);
            return Err(Error::InvalidArgument);
        }
        log::debug!(
            "created queue with capacity {} and element size {}", capacity, Self::ELEMENT_SIZE);
        Ok(Self {
            head: None,
            tail: None,
            len: 0,
            capacity,
            alloc,
            _owns: PhantomData,
        })
    }

    /// Returns how many elements are currently in the queue.
    pub fn len(&self) -> usize { self.len }

    /// Same as [`Self::len`].
    pub fn size(&self) -> usize { self.len }

    /// Returns the maximum number of elements this queue can store.
    pub fn capacity(&self) -> usize { self.capacity }

    /// Returns whether this queue is empty.
    pub fn is_empty(&self) -> bool { self.head.is_none() }

    /// Returns whether this queue can fit no more elements.
    pub fn is_full(&self) -> bool { self.len >= self.capacity }

    /// Appends an element at the tail of this queue.
    /// On failure the queue is unchanged and `value` is dropped.
    pub fn enqueue(&mut self, value: T) -> Result<(), Error> {
        if self.is_full() {
            log::debug!("queue is full ({} elements)", self.capacity);
            return Err(Error::CapacityExceeded);
        }
        let node = blob::try_box(Node { value, next: None }, self.alloc.clone())?;
        let node = Self::into_link(node);
        match self.tail {
            // SAFETY: `tail` is the live last node of this queue and nothing else borrows it.
            Some(mut tail) => unsafe { tail.as_mut().next = Some(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
        log::trace!("enqueued element {}", self.len);
        Ok(())
    }

    /// Removes the element at the head and returns it.
    pub fn dequeue(&mut self) -> Result<T, Error> {
        let node = self.unlink().inspect_err(|_| log::debug!("dequeue from empty queue"))?;
        let Node { value, .. } = Box::into_inner(node);
        Ok(value)
    }

    /// Returns a copy of the element at the head without removing it.
    pub fn peek(&self) -> Result<T, Error>
        where T: Clone {
        self.front().cloned().ok_or(Error::Empty)
    }

    /// Removes and frees the element at the head without returning it.
    pub fn discard(&mut self) -> Result<(), Error> {
        self.unlink().map(drop)
    }

    /// Removes every element, returning how many were freed.
    pub fn clear(&mut self) -> usize {
        let mut freed = 0;
        while self.head.is_some() {
            if self.discard().is_ok() {
                freed += 1;
            }
        }
        freed
    }

    /// Frees every remaining node along with the queue itself.
    /// Returns how many elements were still stored.
    pub fn destroy(mut self) -> usize {
        let freed = self.clear();
        log::debug!("destroyed queue, freed {} elements", freed);
        freed
    }

    pub(crate) fn front(&self) -> Option<&T> {
        // SAFETY: `head` is live for as long as `self` is borrowed; removal needs `&mut self`.
        self.head.map(|head| unsafe { &head.as_ref().value })
    }

    pub(crate) fn allocator(&self) -> &A { &self.alloc }

    fn unlink(&mut self) -> Result<Box<Node<T>, A>, Error> {
        let head = self.head.ok_or(Error::Empty)?;
        // SAFETY: `head` is live and is unreachable from the queue once `head` advances below.
        let node = unsafe { self.reclaim(head) };
        self.head = node.next;
        if self.head.is_none() {
            self.tail = None;
        }
        self.len -= 1;
        log::trace!("removed element from queue, {} left", self.len);
        Ok(node)
    }

    /// Releases ownership of a freshly allocated node into the raw chain.
    /// The allocator copy inside the box is dropped here; [`Self::reclaim`] supplies a new one.
    fn into_link(node: Box<Node<T>, A>) -> NonNull<Node<T>> {
        let (ptr, alloc) = Box::into_raw_with_allocator(node);
        drop(alloc);
        // SAFETY: a box pointer is never null.
        unsafe { NonNull::new_unchecked(ptr) }
    }

    /// Takes ownership of a chain node back as a box.
    ///
    /// # Safety
    ///
    /// `link` must come from [`Self::into_link`] on this queue, must not have been reclaimed
    /// already, and must no longer be reachable from `head` or `tail` once the box is dropped.
    unsafe fn reclaim(&self, link: NonNull<Node<T>>) -> Box<Node<T>, A> {
        // SAFETY: upheld by the caller; every node was allocated by a clone of `self.alloc`.
        unsafe { Box::from_raw_in(link.as_ptr(), self.alloc.clone()) }
    }

    fn for_each_ref(&self, mut f: impl FnMut(&T)) {
        let mut cur = self.head;
        while let Some(node) = cur {
            // SAFETY: every node reachable from `head` is live while `self` is borrowed.
            let node = unsafe { node.as_ref() };
            f(&node.value);
            cur = node.next;
        }
    }
}

impl<T, A: Allocator + Clone>
Container for Queue<T, A> {
    fn capacity(&self) -> usize { self.capacity }
    fn element_size(&self) -> usize { Self::ELEMENT_SIZE }
    fn len(&self) -> usize { self.len }
    fn clear(&mut self) -> usize { Queue::clear(self) }
}

impl<T, A: Allocator + Clone>
Drop for Queue<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Debug, A: Allocator + Clone>
Debug for Queue<T, A> {
    /// Lists the elements from head to tail.
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut list = f.debug_list();
        self.for_each_ref(|value| { list.entry(value); });
        list.finish()
    }
}

/// A bounded FIFO queue of opaque fixed-size byte elements.
///
/// Every element is exactly `element_size` bytes, fixed at creation. Each enqueue deep-copies
/// the caller's bytes into a node-owned [`Blob`]; dequeue and peek copy them back out.
///
/// Example:
/// ```
/// use tinyds::ByteQueue;
/// let mut q = ByteQueue::new(2, 4).unwrap();
/// q.enqueue(&10i32.to_ne_bytes()).unwrap();
/// q.enqueue(&20i32.to_ne_bytes()).unwrap();
/// let mut out = [0u8; 4];
/// q.dequeue(&mut out).unwrap();
/// assert_eq!(i32::from_ne_bytes(out), 10);
/// assert_eq!(q.size(), 1);
/// ```
///
pub struct ByteQueue<A: Allocator + Clone = Global> {
    inner: Queue<Blob<A>, A>,
    element_size: usize,
}

impl ByteQueue {
    /// Creates an empty queue of `capacity` elements of `element_size` bytes each,
    /// allocating from [`Global`].
    pub fn new(capacity: usize, element_size: usize) -> Result<Self, Error> {
        Self::new_in(capacity, element_size, Global)
    }
}

impl<A: Allocator + Clone> ByteQueue<A> {
    /// Creates an empty queue of `capacity` elements of `element_size` bytes each,
    /// allocating from `alloc`. Fails if either argument is zero.
    pub fn new_in(capacity: usize, element_size: usize, alloc: A) -> Result<Self, Error> {
        if element_size == 0 {
            log::debug!("refusing queue with element size 0");
            return Err(Error::InvalidArgument);
        }
        Ok(Self { inner: Queue::new_in(capacity, alloc)?, element_size })
    }

    /// Returns the byte width of every element.
    pub fn element_size(&self) -> usize { self.element_size }

    /// Returns how many elements are currently in the queue.
    pub fn len(&self) -> usize { self.inner.len() }

    /// Same as [`Self::len`].
    pub fn size(&self) -> usize { self.inner.len() }

    /// Returns the maximum number of elements this queue can store.
    pub fn capacity(&self) -> usize { self.inner.capacity() }

    /// Returns whether this queue is empty.
    pub fn is_empty(&self) -> bool { self.inner.is_empty() }

    /// Returns whether this queue can fit no more elements.
    pub fn is_full(&self) -> bool { self.inner.is_full() }

    /// Copies `data` to the tail of the queue.
    /// `data` must be exactly `element_size` bytes long; an empty slice is always refused.
    pub fn enqueue(&mut self, data: &[u8]) -> Result<(), Error> {
        if self.inner.is_full() {
            log::debug!("queue is full ({} elements)", self.inner.capacity());
            return Err(Error::CapacityExceeded);
        }
        if data.len() != self.element_size {
            return Err(Error::InvalidArgument);
        }
        let blob = blob::try_copy_in(data, self.inner.allocator().clone())?;
        self.inner.enqueue(blob)
    }

    /// Removes the element at the head, copying it into the front of `out`.
    /// `out` must be at least `element_size` bytes long.
    pub fn dequeue(&mut self, out: &mut [u8]) -> Result<(), Error> {
        if out.len() < self.element_size {
            return Err(Error::InvalidArgument);
        }
        let blob = self.inner.dequeue()?;
        blob::copy_out(&blob, out)
    }

    /// Copies the element at the head into the front of `out`, leaving the queue unchanged.
    /// `out` must be at least `element_size` bytes long.
    pub fn peek(&self, out: &mut [u8]) -> Result<(), Error> {
        if out.len() < self.element_size {
            return Err(Error::InvalidArgument);
        }
        let blob = self.inner.front().ok_or(Error::Empty)?;
        blob::copy_out(blob, out)
    }

    /// Removes and frees the element at the head without copying it out.
    pub fn discard(&mut self) -> Result<(), Error> { self.inner.discard() }

    /// Removes every element, returning how many were freed.
    pub fn clear(&mut self) -> usize { self.inner.clear() }

    /// Frees every remaining node along with the queue itself.
    /// Returns how many elements were still stored.
    pub fn destroy(self) -> usize { self.inner.destroy() }
}

impl<A: Allocator + Clone>
Container for ByteQueue<A> {
    fn capacity(&self) -> usize { self.inner.capacity() }
    fn element_size(&self) -> usize { self.element_size }
    fn len(&self) -> usize { self.inner.len() }
    fn clear(&mut self) -> usize { self.inner.clear() }
}

impl<A: Allocator + Clone>
Debug for ByteQueue<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut list = f.debug_list();
        self.inner.for_each_ref(|blob| { list.entry(&&**blob); });
        list.finish()
    }
}
