// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

mod bm25_similarity;

pub use self::bm25_similarity::*;

use core::codec::FieldInvertState;

use std::fmt::Display;

/// Similarity defines the index-time half of scoring.
///
/// At indexing time, the indexer calls `compute_norm(FieldInvertState)` once per
/// document and field, allowing the implementation to set a per-document value
/// for the field. No assumption is made about what is in this norm, but it is
/// most useful for encoding length normalization information.
///
/// Implementations should carefully consider how the normalization is encoded:
/// `BM25Similarity` encodes a combination of index-time boost and length
/// normalization information with `SmallFloat` into a single byte.
pub trait Similarity: Display + Send + Sync {
    /// Computes the normalization value for a field, given the accumulated
    /// state of term processing for this field.
    ///
    /// Matches in longer fields are less precise, so implementations of this
    /// method usually set smaller values when `state.length` is large,
    /// and larger values when `state.length` is small.
    fn compute_norm(&self, state: &FieldInvertState) -> i64;
}
