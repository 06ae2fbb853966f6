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

mod stored_fields_consumer;

pub use self::stored_fields_consumer::*;

mod plain_stored_fields_format;

pub use self::plain_stored_fields_format::*;

use core::codec::field_infos::{FieldInfo, FieldInfos};
use core::codec::segment_infos::SegmentInfo;
use core::store::directory::Directory;
use core::store::IOContext;
use core::util::{DocId, VariantValue};

use error::Result;

use std::sync::Arc;

/// Controls the format of stored fields
pub trait StoredFieldsFormat: Send + Sync {
    type Writer: StoredFieldsWriter;
    type Reader: StoredFieldsReader;

    /// Returns a `StoredFieldsWriter` to write stored fields.
    fn fields_writer(
        &self,
        directory: Arc<dyn Directory>,
        si: &SegmentInfo,
        ctx: &IOContext,
    ) -> Result<Self::Writer>;

    /// Returns a `StoredFieldsReader` to load stored fields.
    fn fields_reader(
        &self,
        directory: &dyn Directory,
        si: &SegmentInfo,
        field_infos: &FieldInfos,
    ) -> Result<Self::Reader>;
}

/// Codec API for writing stored fields:
///
/// 1. For every document, `start_document` is called, informing the codec
///    that a new document has started.
/// 2. `write_field` is called for each field in the document.
/// 3. After all documents have been written, `finish` is called for
///    verification/sanity-checks.
/// 4. Finally the writer is dropped.
pub trait StoredFieldsWriter {
    /// Called before writing the stored fields of the document.
    /// `write_field` will be called for each stored field. Note that this is
    /// called even if the document has no stored fields.
    fn start_document(&mut self) -> Result<()>;

    /// Writes a single stored field.
    fn write_field(&mut self, field_info: &FieldInfo, value: &VariantValue) -> Result<()>;

    /// Called when a document and all its fields have been added.
    fn finish_document(&mut self) -> Result<()>;

    /// Called before the writer is dropped, passing in the number of documents
    /// that were written. Note that this is intentionally redundant (equivalent
    /// to the number of calls to `start_document`), but a codec should check
    /// that this is the case.
    fn finish(&mut self, field_infos: &FieldInfos, num_docs: usize) -> Result<()>;

    /// Aborts writing entirely, releasing any partially written files.
    fn abort(&mut self) -> Result<()>;
}

/// One stored value of a document, as read back.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFieldValue {
    pub field_number: u32,
    pub value: VariantValue,
}

/// Codec API for reading stored fields.
pub trait StoredFieldsReader {
    fn document(&self, doc_id: DocId) -> Result<Vec<StoredFieldValue>>;

    fn num_docs(&self) -> usize;
}
