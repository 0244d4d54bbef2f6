//! Every node and element buffer is freed exactly once, and a refused allocation leaves the
//! container exactly as it was.

use core::{alloc::Layout, cell::Cell, ptr::NonNull};

use tinyds::{AllocError, Allocator, ByteQueue, ByteStack, Error, Global, Handle, Queue, Stack};

/// Forwards to [`Global`], counting live allocations, and refuses the allocation whose
/// zero-based index equals `fail_at`.
#[derive(Default)]
struct Budget {
    live: Cell<usize>,
    total: Cell<usize>,
    fail_at: Cell<Option<usize>>,
}

impl Budget {
    fn failing_at(index: usize) -> Self {
        let b = Self::default();
        b.fail_at.set(Some(index));
        b
    }
}

unsafe impl Allocator for Budget {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if self.fail_at.get() == Some(self.total.get()) {
            return Err(AllocError);
        }
        let ptr = Global.allocate(layout)?;
        self.total.set(self.total.get() + 1);
        self.live.set(self.live.get() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.live.set(self.live.get() - 1);
        Global.deallocate(ptr, layout);
    }
}

#[test]
fn byte_stack_frees_node_and_buffer() {
    let budget = Budget::default();
    let mut s = ByteStack::new_in(4, 8, &budget).unwrap();
    assert_eq!(budget.live.get(), 0);

    for x in 0..3u64 {
        s.push(&x.to_le_bytes()).unwrap();
    }
    assert_eq!(budget.live.get(), 6);

    let mut out = [0u8; 8];
    s.pop(&mut out).unwrap();
    assert_eq!(u64::from_le_bytes(out), 2);
    assert_eq!(budget.live.get(), 4);

    s.peek(&mut out).unwrap();
    assert_eq!(budget.live.get(), 4);

    assert_eq!(s.destroy(), 2);
    assert_eq!(budget.live.get(), 0);
    assert_eq!(budget.total.get(), 6);
}

#[test]
fn byte_queue_frees_on_drop() {
    let budget = Budget::default();
    {
        let mut q = ByteQueue::new_in(8, 2, &budget).unwrap();
        for x in 0..5u16 {
            q.enqueue(&x.to_le_bytes()).unwrap();
        }
        q.discard().unwrap();
        assert_eq!(budget.live.get(), 8);
    }
    assert_eq!(budget.live.get(), 0);
    assert_eq!(budget.total.get(), 10);
}

#[test]
fn handle_destroy_frees_everything() {
    let budget = Budget::default();
    let mut h = Handle::create(ByteQueue::new_in(3, 4, &budget));
    h.enqueue(&[1, 2, 3, 4]).unwrap();
    h.enqueue(&[5, 6, 7, 8]).unwrap();
    assert_eq!(budget.live.get(), 4);
    assert_eq!(h.destroy(), 2);
    assert_eq!(budget.live.get(), 0);
    assert_eq!(h.destroy(), 0);
}

#[test]
fn refused_buffer_leaves_stack_unchanged() {
    let budget = Budget::failing_at(0);
    let mut s = ByteStack::new_in(2, 4, &budget).unwrap();
    assert_eq!(s.push(&[1, 2, 3, 4]), Err(Error::AllocationFailure));
    assert!(s.is_empty());
    assert_eq!(budget.live.get(), 0);

    budget.fail_at.set(None);
    s.push(&[1, 2, 3, 4]).unwrap();
    assert_eq!(s.len(), 1);
}

#[test]
fn refused_node_releases_buffer() {
    // One successful push takes allocations 0 and 1; the next push gets its buffer (2) and
    // is refused its node (3).
    let budget = Budget::failing_at(3);
    let mut s = ByteStack::new_in(4, 4, &budget).unwrap();
    s.push(&[1, 1, 1, 1]).unwrap();
    assert_eq!(s.push(&[2, 2, 2, 2]), Err(Error::AllocationFailure));
    assert_eq!(s.len(), 1);
    assert_eq!(budget.live.get(), 2);

    let mut out = [0u8; 4];
    s.peek(&mut out).unwrap();
    assert_eq!(out, [1, 1, 1, 1]);

    budget.fail_at.set(None);
    s.push(&[3, 3, 3, 3]).unwrap();
    s.pop(&mut out).unwrap();
    assert_eq!(out, [3, 3, 3, 3]);
    s.pop(&mut out).unwrap();
    assert_eq!(out, [1, 1, 1, 1]);
    assert_eq!(budget.live.get(), 0);
}

#[test]
fn refused_node_keeps_queue_chain() {
    let budget = Budget::failing_at(3);
    let mut q = ByteQueue::new_in(4, 1, &budget).unwrap();
    q.enqueue(&[1]).unwrap();
    assert_eq!(q.enqueue(&[2]), Err(Error::AllocationFailure));
    assert_eq!(q.size(), 1);
    assert_eq!(budget.live.get(), 2);

    budget.fail_at.set(None);
    q.enqueue(&[3]).unwrap();
    let mut out = [0u8; 1];
    q.dequeue(&mut out).unwrap();
    assert_eq!(out, [1]);
    q.dequeue(&mut out).unwrap();
    assert_eq!(out, [3]);
    assert!(q.is_empty());
    assert_eq!(budget.live.get(), 0);
}

#[test]
fn refused_typed_insert() {
    let budget = Budget::failing_at(1);
    let mut s = Stack::<u64, _>::new_in(3, &budget).unwrap();
    s.push(7).unwrap();
    assert_eq!(s.push(8), Err(Error::AllocationFailure));
    assert_eq!(s.len(), 1);
    assert_eq!(s.peek(), Ok(7));

    let budget = Budget::failing_at(0);
    let mut q = Queue::<u64, _>::new_in(3, &budget).unwrap();
    assert_eq!(q.enqueue(8), Err(Error::AllocationFailure));
    assert!(q.is_empty());
    assert_eq!(q.peek(), Err(Error::Empty));
}

#[test]
fn full_container_allocates_nothing() {
    let budget = Budget::default();
    let mut s = ByteStack::new_in(1, 1, &budget).unwrap();
    s.push(&[1]).unwrap();
    assert_eq!(budget.total.get(), 2);
    assert_eq!(s.push(&[2]), Err(Error::CapacityExceeded));
    assert_eq!(budget.total.get(), 2);
}

/// A cloneable allocator handle whose clones are visible through the `Rc` count.
#[derive(Clone, Default)]
struct Shared(std::rc::Rc<()>);

unsafe impl Allocator for Shared {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        Global.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        Global.deallocate(ptr, layout);
    }
}

#[test]
fn queue_releases_allocator_clones() {
    let shared = Shared::default();

    let mut q = Queue::<u32, _>::new_in(4, shared.clone()).unwrap();
    for x in 0..3 {
        q.enqueue(x).unwrap();
    }
    assert_eq!(std::rc::Rc::strong_count(&shared.0), 2);
    for x in 0..3 {
        assert_eq!(q.dequeue(), Ok(x));
    }
    q.enqueue(9).unwrap();
    drop(q);
    assert_eq!(std::rc::Rc::strong_count(&shared.0), 1);

    let mut b = ByteQueue::new_in(4, 2, shared.clone()).unwrap();
    for x in 0..3u16 {
        b.enqueue(&x.to_le_bytes()).unwrap();
    }
    assert_eq!(std::rc::Rc::strong_count(&shared.0), 5);
    assert_eq!(b.destroy(), 3);
    assert_eq!(std::rc::Rc::strong_count(&shared.0), 1);

    let mut s = Stack::<u32, _>::new_in(4, shared.clone()).unwrap();
    s.push(1).unwrap();
    s.push(2).unwrap();
    drop(s);
    assert_eq!(std::rc::Rc::strong_count(&shared.0), 1);
}
