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

use std::{fmt::Debug, num::NonZeroUsize};

/// Stable handle of a node slot inside an [`crate::Allocator`].
///
/// The highest bit is always set, so the raw slot `0` is still representable and
/// `Option<NodeToken>` takes no more space than `NodeToken`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeToken(NonZeroUsize);

impl NodeToken {
    const MASK: usize = 1 << (usize::BITS - 1);

    /// Wrap a raw slot index.
    ///
    /// # Panics
    ///
    /// Panics if the highest bit of `raw` is used.
    pub fn from_raw(raw: usize) -> Self {
        // Assert the highest bit is not used.
        assert_eq!(0, raw & Self::MASK);
        let inner = unsafe { NonZeroUsize::new_unchecked(raw | Self::MASK) };
        Self(inner)
    }

    /// Get the raw slot index.
    pub fn to_raw(&self) -> usize {
        self.0.get() & !Self::MASK
    }
}

impl Debug for NodeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NodeToken").field(&self.to_raw()).finish()
    }
}
