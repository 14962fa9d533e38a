//! Allocation and recycling of client-range object ids.
//!
//! The display server terminates the connection over id misuse, so ids of
//! destroyed objects must go back into the pool and the lowest free id must
//! be handed out first.
//!
//! # Example
//!
//! ```
//! use kenai_core::id_manager::IdManager;
//!
//! let ids = IdManager::new();
//! let first = ids.alloc_id().unwrap();
//! let second = ids.alloc_id().unwrap();
//! assert_ne!(first, second);
//! ids.recycle_id(first);
//! assert_eq!(first, ids.alloc_id().unwrap());
//! ```

use std::sync::{Arc, Mutex};
use std::{cmp::Reverse, collections::BinaryHeap};

use thiserror::Error;

use crate::channel::ObjectId;

const CLIENT_MIN_ID: u32 = 0x0000_0001;
const CLIENT_MAX_ID: u32 = 0xfeff_ffff;

#[derive(Debug)]
struct IdPool {
    next: u32,
    free: BinaryHeap<Reverse<u32>>,
}

impl IdPool {
    const fn new() -> Self {
        Self {
            next: CLIENT_MIN_ID,
            free: BinaryHeap::new(),
        }
    }

    fn alloc(&mut self) -> Result<u32, IdManagerError> {
        if let Some(&Reverse(lowest)) = self.free.peek()
            && lowest < self.next
        {
            self.free.pop();
            return Ok(lowest);
        }

        if self.next > CLIENT_MAX_ID {
            return Err(IdManagerError::OutOfClientIds(self.next));
        }

        let id = self.next;
        self.next += 1;
        Ok(id)
    }

    fn recycle(&mut self, id: u32) {
        if id + 1 == self.next {
            self.next = id;
            // Pull the top of the free heap back down while it stays contiguous.
            while let Some(&Reverse(top)) = self.free.peek() {
                if top + 1 == self.next {
                    self.free.pop();
                    self.next = top;
                } else {
                    break;
                }
            }
        } else {
            self.free.push(Reverse(id));
        }
    }
}

/// A thread-safe allocator for client-range object ids.
///
/// Clones share the same pool.
#[derive(Debug, Clone)]
pub struct IdManager(Arc<Mutex<IdPool>>);

impl IdManager {
    /// Creates an empty pool; the first id handed out is the lowest client id.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(IdPool::new())))
    }

    /// Hands out the lowest free id.
    ///
    /// # Errors
    ///
    /// Returns [`IdManagerError::OutOfClientIds`] when the client range is
    /// exhausted.
    pub fn alloc_id(&self) -> Result<ObjectId, IdManagerError> {
        self.0.lock().unwrap().alloc()
    }

    /// Returns the id of a destroyed object to the pool.
    pub fn recycle_id(&self, id: ObjectId) {
        self.0.lock().unwrap().recycle(id);
    }
}

impl Default for IdManager {
    fn default() -> Self {
        Self::new()
    }
}

/// An error that may occur when allocating an object id.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdManagerError {
    /// Every id in the client range is live.
    #[error(
        "all client object ids have been exhausted ({0} is out of the range of {CLIENT_MIN_ID} - {CLIENT_MAX_ID})"
    )]
    OutOfClientIds(ObjectId),
}
