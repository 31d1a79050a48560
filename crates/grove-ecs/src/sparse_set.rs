//! Sparse set - the index primitive behind component stores and groups.
//!
//! Maps a bounded key domain `[0, sparse_capacity)` to dense, contiguous
//! positions. Insert, swap-remove and membership are O(1); iteration walks
//! the dense array only.
//!
//! ```text
//! sparse: [ 2, -, 0, -, 1 ]      key -> dense index
//! dense:  [ 2, 4, 0 ]            dense index -> key
//! ```

use crate::{
    entity::EntityId,
    error::{Error, Result},
};

/// Marker stored in `sparse` for keys that are not present.
const ABSENT: u32 = u32::MAX;

/// Indices describing a swap-remove, so a parallel value array can mirror it.
///
/// The element at `last` moved into `vacated` (nothing moved when they are
/// equal). `Vec::swap_remove(vacated)` performs exactly this move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapRemove {
    /// Dense slot the removed key occupied.
    pub vacated: usize,
    /// Dense slot of the element that filled the hole.
    pub last: usize,
}

/// A sparse set over entity ids with fixed sparse and dense capacities.
#[derive(Clone)]
pub struct SparseSet {
    /// Dense index per key, or `ABSENT`.
    sparse: Box<[u32]>,
    /// Present keys, packed.
    dense: Vec<EntityId>,
    /// Upper bound on `dense.len()`.
    dense_capacity: usize,
}

impl SparseSet {
    /// Create an empty set.
    ///
    /// `sparse_capacity` bounds the key domain, `dense_capacity` bounds how
    /// many keys may be present at once. Neither grows.
    #[must_use]
    pub fn new(sparse_capacity: usize, dense_capacity: usize) -> Self {
        Self {
            sparse: vec![ABSENT; sparse_capacity].into_boxed_slice(),
            dense: Vec::with_capacity(dense_capacity),
            dense_capacity,
        }
    }

    /// Insert a key and return its dense index.
    pub fn insert(&mut self, key: EntityId) -> Result<usize> {
        let slot = self.slot(key)?;
        if self.sparse[slot] != ABSENT {
            return Err(Error::DuplicateKey { key });
        }
        if self.dense.len() >= self.dense_capacity {
            return Err(Error::SetFull {
                capacity: self.dense_capacity,
            });
        }

        let index = self.dense.len();
        self.sparse[slot] = index as u32;
        self.dense.push(key);
        Ok(index)
    }

    /// Remove a key by moving the last dense element into its slot.
    pub fn remove(&mut self, key: EntityId) -> Result<SwapRemove> {
        let slot = self.slot(key)?;
        let vacated = self.sparse[slot];
        if vacated == ABSENT {
            return Err(Error::MissingKey { key });
        }

        let vacated = vacated as usize;
        let last = self.dense.len() - 1;
        self.dense.swap_remove(vacated);
        if vacated < last {
            let moved = self.dense[vacated];
            self.sparse[moved as usize] = vacated as u32;
        }
        self.sparse[slot] = ABSENT;

        Ok(SwapRemove { vacated, last })
    }

    /// Check whether a key is present. Keys outside the domain are absent.
    #[must_use]
    pub fn contains(&self, key: EntityId) -> bool {
        self.sparse
            .get(key as usize)
            .is_some_and(|&index| index != ABSENT)
    }

    /// Dense index of a present key.
    #[must_use]
    pub fn index_of(&self, key: EntityId) -> Option<usize> {
        match self.sparse.get(key as usize) {
            Some(&index) if index != ABSENT => Some(index as usize),
            _ => None,
        }
    }

    /// The present keys in dense order.
    ///
    /// Order is insertion order until a removal swaps the last key forward.
    #[must_use]
    pub fn entries(&self) -> &[EntityId] {
        &self.dense
    }

    /// Number of present keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Size of the key domain.
    #[must_use]
    pub fn sparse_capacity(&self) -> usize {
        self.sparse.len()
    }

    /// Maximum number of keys present at once.
    #[must_use]
    pub const fn dense_capacity(&self) -> usize {
        self.dense_capacity
    }

    /// Whether another key can be inserted.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.dense.len() >= self.dense_capacity
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        for &key in &self.dense {
            self.sparse[key as usize] = ABSENT;
        }
        self.dense.clear();
    }

    fn slot(&self, key: EntityId) -> Result<usize> {
        let slot = key as usize;
        if slot < self.sparse.len() {
            Ok(slot)
        } else {
            Err(Error::KeyOutOfRange {
                key,
                capacity: self.sparse.len(),
            })
        }
    }
}

impl std::fmt::Debug for SparseSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseSet")
            .field("len", &self.dense.len())
            .field("sparse_capacity", &self.sparse.len())
            .field("dense_capacity", &self.dense_capacity)
            .field("entries", &self.dense)
            .finish()
    }
}
