//! Provides a queue of image tile indices for the render worker
//! threads. The queue itself is never changed after creation; the
//! threads simply work through it via an atomic cursor tracking the
//! next tile to hand out.

use std::sync::atomic::{AtomicUsize, Ordering};

/// The queue of tiles to work on, shared immutably between worker
/// threads.
pub struct BlockQueue {
    /// tile indices in row-major order
    blocks: Vec<(u32, u32)>,
    /// dimensions of an individual tile
    dimensions: (u32, u32),
    /// index of the next tile to be worked on
    next: AtomicUsize,
}

impl BlockQueue {
    /// Create a block queue covering an image of dimensions `img`
    /// with tiles of dimensions `dim`; border tiles are clipped by
    /// the consumer, not the queue.
    pub fn new(img: (u32, u32), dim: (u32, u32)) -> BlockQueue {
        let count: (u32, u32) = (
            (img.0 + dim.0 - 1) / dim.0,
            (img.1 + dim.1 - 1) / dim.1,
        );
        let blocks: Vec<(u32, u32)> = (0..count.0 * count.1)
            .map(|i| (i % count.0, i / count.0))
            .collect();
        BlockQueue {
            blocks,
            dimensions: dim,
            next: AtomicUsize::new(0),
        }
    }
    /// Get the dimensions of an individual tile in the queue
    pub fn block_dim(&self) -> (u32, u32) {
        self.dimensions
    }
    /// Get the next tile in the queue or None if the queue is finished
    pub fn next(&self) -> Option<(u32, u32)> {
        let i: usize = self.next.fetch_add(1, Ordering::AcqRel);
        if i >= self.blocks.len() {
            None
        } else {
            Some(self.blocks[i])
        }
    }
    /// Get the length of the queue
    pub fn len(&self) -> usize {
        self.blocks.len()
    }
    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.next.load(Ordering::Acquire) >= self.blocks.len()
    }
}
