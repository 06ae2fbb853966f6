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

mod doc_values_writer;

pub use self::doc_values_writer::*;

mod plain_doc_values_format;

pub use self::plain_doc_values_format::*;

use core::codec::field_infos::FieldInfo;
use core::codec::segment_infos::SegmentWriteState;

use error::ErrorKind::IllegalState;
use error::Result;

/// Encodes/decodes per-document values
pub trait DocValuesFormat: Send + Sync {
    type Consumer: DocValuesConsumer;

    /// Returns a `DocValuesConsumer` to write docvalues to the index.
    fn fields_consumer(&self, state: &SegmentWriteState) -> Result<Self::Consumer>;

    /// Unique name for this format.
    fn name(&self) -> &str;
}

/// Abstract API that consumes numeric, binary and sorted docvalues. All
/// slices indexed by document hold one entry per document of the segment.
pub trait DocValuesConsumer {
    /// Writes numeric docvalues for a field. `None` marks a document
    /// without a value.
    fn add_numeric_field(&mut self, field_info: &FieldInfo, values: &[Option<i64>]) -> Result<()>;

    /// Writes binary docvalues for a field.
    fn add_binary_field(&mut self, field_info: &FieldInfo, values: &[Option<&[u8]>]) -> Result<()>;

    /// Writes pre-sorted binary docvalues for a field. `values` holds the
    /// unique values in byte order and `doc_to_ord` the ordinal of every
    /// document, -1 if it has no value.
    fn add_sorted_field(
        &mut self,
        field_info: &FieldInfo,
        values: &[&[u8]],
        doc_to_ord: &[i32],
    ) -> Result<()>;

    /// Writes pre-sorted numeric docvalues for a field. `doc_to_value_count`
    /// holds the number of values of every document and `values` all values
    /// in document order, sorted within each document.
    fn add_sorted_numeric_field(
        &mut self,
        field_info: &FieldInfo,
        doc_to_value_count: &[u32],
        values: &[i64],
    ) -> Result<()>;

    /// Writes pre-sorted set docvalues for a field. `ords` holds the
    /// ordinals of all documents in document order, sorted and deduplicated
    /// within each document.
    fn add_sorted_set_field(
        &mut self,
        field_info: &FieldInfo,
        values: &[&[u8]],
        doc_to_ord_count: &[u32],
        ords: &[i64],
    ) -> Result<()>;

    /// Called once after all fields were added.
    fn finish(&mut self) -> Result<()>;
}

fn flushed_field_info<'a>(state: &'a SegmentWriteState, name: &str) -> Result<&'a FieldInfo> {
    match state.field_infos.field_info_by_name(name) {
        Some(fi) => Ok(fi),
        None => bail!(IllegalState(format!(
            "field '{}' has doc values but is missing from the field infos",
            name
        ))),
    }
}
