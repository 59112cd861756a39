//  Copyright 2024 ordlist Project Authors
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

//! Node allocation strategies.
//!
//! An [`OrderedList`](crate::OrderedList) never owns node memory directly. Every node is obtained from and returned
//! to an [`Allocator`], which hands out stable [`NodeToken`]s instead of pointers.

use slab::Slab;

use crate::{
    config::StrategyConfig,
    error::{Error, Result},
    token::NodeToken,
};

/// Storage strategy that obtains and releases node slots.
///
/// # Safety
///
/// Every token returned by [`Allocator::allocate`] MUST resolve through [`Allocator::get`] and
/// [`Allocator::get_mut`] until it is passed to [`Allocator::release`]. The list resolves tokens without checking.
pub unsafe trait Allocator<N> {
    /// Move `node` into newly obtained storage and return its token.
    ///
    /// On failure, `node` is dropped and nothing is obtained.
    fn allocate(&mut self, node: N) -> Result<NodeToken>;

    /// Release the storage of `token` and return the node it held.
    fn release(&mut self, token: NodeToken) -> Option<N>;

    /// Get the node of `token`.
    fn get(&self, token: NodeToken) -> Option<&N>;

    /// Get the mutable node of `token`.
    fn get_mut(&mut self, token: NodeToken) -> Option<&mut N>;

    /// Count of live nodes.
    fn len(&self) -> usize;

    /// Check if there is no live node.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node budget, `None` for growable strategies.
    fn capacity(&self) -> Option<usize> {
        None
    }
}

/// Default strategy: a growable slab on the system heap. Never fails.
#[derive(Debug)]
pub struct SlabAllocator<N> {
    slab: Slab<N>,
}

impl<N> Default for SlabAllocator<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> SlabAllocator<N> {
    /// Create a slab allocator without preallocated slots.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a slab allocator with `capacity` preallocated slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slab: Slab::with_capacity(capacity),
        }
    }
}

unsafe impl<N> Allocator<N> for SlabAllocator<N> {
    fn allocate(&mut self, node: N) -> Result<NodeToken> {
        let raw = self.slab.insert(node);
        Ok(NodeToken::from_raw(raw))
    }

    fn release(&mut self, token: NodeToken) -> Option<N> {
        self.slab.try_remove(token.to_raw())
    }

    fn get(&self, token: NodeToken) -> Option<&N> {
        self.slab.get(token.to_raw())
    }

    fn get_mut(&mut self, token: NodeToken) -> Option<&mut N> {
        self.slab.get_mut(token.to_raw())
    }

    fn len(&self) -> usize {
        self.slab.len()
    }
}

/// Strategy with a fixed node budget.
///
/// All slots are reserved up front. Allocation fails with [`Error::AllocationFailure`] once `capacity` nodes are live.
#[derive(Debug)]
pub struct BoundedAllocator<N> {
    slab: Slab<N>,
    capacity: usize,
}

impl<N> BoundedAllocator<N> {
    /// Create a bounded allocator that holds at most `capacity` nodes.
    pub fn new(capacity: usize) -> Self {
        Self {
            slab: Slab::with_capacity(capacity),
            capacity,
        }
    }
}

unsafe impl<N> Allocator<N> for BoundedAllocator<N> {
    fn allocate(&mut self, node: N) -> Result<NodeToken> {
        if self.slab.len() >= self.capacity {
            tracing::warn!(capacity = self.capacity, "[bounded allocator]: node budget exhausted");
            return Err(Error::AllocationFailure {
                capacity: self.capacity,
            });
        }
        let raw = self.slab.insert(node);
        Ok(NodeToken::from_raw(raw))
    }

    fn release(&mut self, token: NodeToken) -> Option<N> {
        self.slab.try_remove(token.to_raw())
    }

    fn get(&self, token: NodeToken) -> Option<&N> {
        self.slab.get(token.to_raw())
    }

    fn get_mut(&mut self, token: NodeToken) -> Option<&mut N> {
        self.slab.get_mut(token.to_raw())
    }

    fn len(&self) -> usize {
        self.slab.len()
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }
}

/// Strategy selected at runtime from a [`StrategyConfig`].
#[derive(Debug)]
pub enum Strategy<N> {
    /// See [`SlabAllocator`].
    Heap(SlabAllocator<N>),
    /// See [`BoundedAllocator`].
    Bounded(BoundedAllocator<N>),
}

impl<N> Strategy<N> {
    /// Build the strategy described by `config`.
    pub fn new(config: &StrategyConfig) -> Result<Self> {
        match *config {
            StrategyConfig::Heap { initial_capacity } => Ok(Self::Heap(SlabAllocator::with_capacity(initial_capacity))),
            StrategyConfig::Bounded { capacity: None } => {
                Err(Error::MissingConfiguration("bounded strategy requires `capacity`"))
            }
            StrategyConfig::Bounded { capacity: Some(0) } => {
                Err(Error::MissingConfiguration("bounded strategy requires a non-zero `capacity`"))
            }
            StrategyConfig::Bounded {
                capacity: Some(capacity),
            } => Ok(Self::Bounded(BoundedAllocator::new(capacity))),
        }
    }
}

unsafe impl<N> Allocator<N> for Strategy<N> {
    fn allocate(&mut self, node: N) -> Result<NodeToken> {
        match self {
            Self::Heap(a) => a.allocate(node),
            Self::Bounded(a) => a.allocate(node),
        }
    }

    fn release(&mut self, token: NodeToken) -> Option<N> {
        match self {
            Self::Heap(a) => a.release(token),
            Self::Bounded(a) => a.release(token),
        }
    }

    fn get(&self, token: NodeToken) -> Option<&N> {
        match self {
            Self::Heap(a) => a.get(token),
            Self::Bounded(a) => a.get(token),
        }
    }

    fn get_mut(&mut self, token: NodeToken) -> Option<&mut N> {
        match self {
            Self::Heap(a) => a.get_mut(token),
            Self::Bounded(a) => a.get_mut(token),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Heap(a) => a.len(),
            Self::Bounded(a) => a.len(),
        }
    }

    fn capacity(&self) -> Option<usize> {
        match self {
            Self::Heap(a) => a.capacity(),
            Self::Bounded(a) => a.capacity(),
        }
    }
}
