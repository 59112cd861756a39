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

//! An index-addressable double linked list.
//!
//! [`OrderedList`] supports positional insertion, lookup, range erasure and node swap. Nodes are obtained from a
//! pluggable [`Allocator`] and addressed by [`NodeToken`]s instead of pointers.
//!
//! ```
//! use ordlist::OrderedList;
//!
//! let mut list = OrderedList::new();
//! list.append(123).unwrap();
//! list.append(45).unwrap();
//! list.insert(1, 67).unwrap();
//! assert_eq!(*list.lookup(1).unwrap(), 67);
//!
//! list.erase(0, 0).unwrap();
//! list.swap(0, 1).unwrap();
//! assert_eq!(format!("{list:?}"), "[45, 67]");
//! ```

mod alloc;
mod config;
mod error;
mod list;
mod token;

pub use alloc::{Allocator, BoundedAllocator, SlabAllocator, Strategy};
pub use config::{ListConfig, StrategyConfig};
pub use error::{Error, Result};
pub use list::{Comparator, Node, OrderedList};
pub use token::NodeToken;
