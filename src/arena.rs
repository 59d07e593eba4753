//! Chunked slab allocator with generational handles.

use std::mem;
use std::ops::{Index, IndexMut};
use std::vec::Vec;

/// A handle to an object stored in an `Arena<T>`.
///
/// Handles carry the generation of the block they were issued for. Once the object is freed, the
/// block's generation moves on and the old handle no longer resolves, even if the block has since
/// been reused.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Handle {
    chunk_index: usize,
    block_index: usize,
    generation: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Slot {
    chunk_index: usize,
    block_index: usize,
}

enum Block<T> {
    Occupied { value: T, generation: u32 },
    Vacant { next: Option<Slot>, generation: u32 },
}

/// An allocator for a single type of object, backed by a list of fixed-size chunks.
///
/// Freed blocks are threaded onto a free list and reused by later allocations. A chunk is never
/// reallocated once created, so growing the arena does not move existing objects. Every object
/// is dropped when the arena is dropped.
///
/// # Examples
///
/// ```
/// use usurping_treap::arena::Arena;
///
/// let mut arena = Arena::new(1024);
///
/// let x = arena.allocate(1);
/// assert_eq!(arena[x], 1);
///
/// arena[x] += 1;
/// assert_eq!(arena.free(&x), 2);
/// assert_eq!(arena.get(&x), None);
/// ```
pub struct Arena<T> {
    head: Option<Slot>,
    chunks: Vec<Vec<Block<T>>>,
    chunk_size: usize,
    len: usize,
    capacity: usize,
}

impl<T> Arena<T> {
    /// Constructs a new, empty `Arena<T>` holding at most `chunk_size` objects per chunk.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "Error: chunk size must be positive.");
        Arena {
            head: None,
            chunks: Vec::new(),
            chunk_size,
            len: 0,
            capacity: 0,
        }
    }

    fn block(&self, handle: &Handle) -> Option<&Block<T>> {
        self.chunks
            .get(handle.chunk_index)
            .and_then(|chunk| chunk.get(handle.block_index))
    }

    /// Stores `value` in the arena and returns a handle to it.
    pub fn allocate(&mut self, value: T) -> Handle {
        if self.len == self.capacity {
            self.chunks.push(Vec::with_capacity(self.chunk_size));
            self.capacity += self.chunk_size;
        }
        self.len += 1;

        match self.head.take() {
            None => {
                let chunk_index = self.chunks.len() - 1;
                let chunk = &mut self.chunks[chunk_index];
                chunk.push(Block::Occupied {
                    value,
                    generation: 0,
                });
                Handle {
                    chunk_index,
                    block_index: chunk.len() - 1,
                    generation: 0,
                }
            },
            Some(slot) => {
                let block = &mut self.chunks[slot.chunk_index][slot.block_index];
                let (next, generation) = match *block {
                    Block::Vacant { next, generation } => (next, generation),
                    Block::Occupied { .. } => panic!("Expected a vacant block on the free list."),
                };
                *block = Block::Occupied { value, generation };
                self.head = next;
                Handle {
                    chunk_index: slot.chunk_index,
                    block_index: slot.block_index,
                    generation,
                }
            },
        }
    }

    /// Removes the object named by `handle` from the arena and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not name a live object.
    pub fn free(&mut self, handle: &Handle) -> T {
        if !self.contains(handle) {
            panic!("Error: attempting to free an invalid or vacant block.");
        }
        let next = self.head.take();
        let block = &mut self.chunks[handle.chunk_index][handle.block_index];
        let old_block = mem::replace(
            block,
            Block::Vacant {
                next,
                generation: handle.generation.wrapping_add(1),
            },
        );
        self.len -= 1;
        self.head = Some(Slot {
            chunk_index: handle.chunk_index,
            block_index: handle.block_index,
        });
        match old_block {
            Block::Occupied { value, .. } => value,
            Block::Vacant { .. } => unreachable!(),
        }
    }

    /// Returns `true` if `handle` names a live object in this arena.
    pub fn contains(&self, handle: &Handle) -> bool {
        match self.block(handle) {
            Some(Block::Occupied { generation, .. }) => *generation == handle.generation,
            _ => false,
        }
    }

    /// Returns an immutable reference to the object named by `handle`, or `None` if the handle is
    /// invalid or stale.
    pub fn get(&self, handle: &Handle) -> Option<&T> {
        match self.block(handle) {
            Some(Block::Occupied { value, generation }) if *generation == handle.generation => {
                Some(value)
            },
            _ => None,
        }
    }

    /// Returns a mutable reference to the object named by `handle`, or `None` if the handle is
    /// invalid or stale.
    pub fn get_mut(&mut self, handle: &Handle) -> Option<&mut T> {
        let block = self
            .chunks
            .get_mut(handle.chunk_index)
            .and_then(|chunk| chunk.get_mut(handle.block_index));
        match block {
            Some(Block::Occupied { value, generation }) if *generation == handle.generation => {
                Some(value)
            },
            _ => None,
        }
    }

    /// Frees every object in the arena. Chunks are kept and all outstanding handles become stale.
    pub fn clear(&mut self) {
        let mut head = None;
        for (chunk_index, chunk) in self.chunks.iter_mut().enumerate() {
            for (block_index, block) in chunk.iter_mut().enumerate() {
                let generation = match *block {
                    Block::Occupied { generation, .. } => generation.wrapping_add(1),
                    Block::Vacant { generation, .. } => generation,
                };
                *block = Block::Vacant {
                    next: head,
                    generation,
                };
                head = Some(Slot {
                    chunk_index,
                    block_index,
                });
            }
        }
        self.head = head;
        self.len = 0;
    }

    /// Returns the number of live objects in the arena.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the arena holds no live objects.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Index<Handle> for Arena<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &Self::Output {
        self.get(&handle).expect("Error: stale or out of bounds handle.")
    }
}

impl<T> IndexMut<Handle> for Arena<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut Self::Output {
        self.get_mut(&handle).expect("Error: stale or out of bounds handle.")
    }
}
