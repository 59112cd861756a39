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

/// ordlist error.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The allocation strategy could not provide storage for a new node.
    #[error("node allocation failed, capacity: {capacity}")]
    AllocationFailure {
        /// Node budget of the strategy that failed.
        capacity: usize,
    },
    /// The operation requires at least one element.
    #[error("list is empty")]
    EmptyList,
    /// The start of a range exceeds its end.
    #[error("invalid range: start {start} > end {end}")]
    InvalidRange {
        /// Range start.
        start: usize,
        /// Range end.
        end: usize,
    },
    /// The index is at or after the length of the list.
    #[error("index out of range: index {index} >= len {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Length of the list.
        len: usize,
    },
    /// A required configuration item is missing or unusable.
    #[error("missing configuration: {0}")]
    MissingConfiguration(&'static str),
}

/// ordlist result.
pub type Result<T> = std::result::Result<T, Error>;
