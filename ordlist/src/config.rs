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

use serde::{Deserialize, Serialize};

/// Config of the node allocation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Growable slab on the system heap.
    Heap {
        /// Slots to reserve up front.
        #[serde(default)]
        initial_capacity: usize,
    },
    /// Fixed node budget.
    Bounded {
        /// Max live nodes. Required.
        #[serde(default)]
        capacity: Option<usize>,
    },
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::Heap { initial_capacity: 0 }
    }
}

/// Config of an [`OrderedList`](crate::OrderedList).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Node allocation strategy.
    pub strategy: StrategyConfig,
}

impl ListConfig {
    /// Config with a growable heap strategy.
    pub fn heap(initial_capacity: usize) -> Self {
        Self {
            strategy: StrategyConfig::Heap { initial_capacity },
        }
    }

    /// Config with a bounded strategy holding at most `capacity` nodes.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            strategy: StrategyConfig::Bounded {
                capacity: Some(capacity),
            },
        }
    }
}
