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

mod term_vector_consumer;

pub use self::term_vector_consumer::*;

mod plain_term_vectors_format;

pub use self::plain_term_vectors_format::*;

use core::codec::field_infos::{FieldInfo, FieldInfos};
use core::codec::segment_infos::SegmentInfo;
use core::store::directory::Directory;
use core::store::IOContext;

use error::Result;

use std::sync::Arc;

/// Controls the format of term vectors
pub trait TermVectorsFormat: Send + Sync {
    type Writer: TermVectorsWriter;

    /// Returns a `TermVectorsWriter` to write term vectors.
    fn tv_writer(
        &self,
        directory: Arc<dyn Directory>,
        segment_info: &SegmentInfo,
        context: &IOContext,
    ) -> Result<Self::Writer>;
}

/// Codec API for writing term vectors:
///
/// For every document, `start_document` is called, informing the codec how
/// many fields will be written. `start_field` is called for each field in the
/// document, informing the codec how many terms will be written for that
/// field, and whether or not positions, offsets, or payloads are enabled.
/// Within each field, `start_term` is called for each term. If offsets and/or
/// positions are enabled, then `add_position` will be called for each term
/// occurrence. After all documents have been written, `finish` is called for
/// verification/sanity-checks.
pub trait TermVectorsWriter {
    /// Called before writing the term vectors of the document. `start_field`
    /// will be called `num_vector_fields` times. Note that if term vectors are
    /// enabled, this is called even if the document has no vector fields, in
    /// this case `num_vector_fields` will be zero.
    fn start_document(&mut self, num_vector_fields: usize) -> Result<()>;

    /// Called after a doc and all its fields have been added.
    fn finish_document(&mut self) -> Result<()>;

    /// Called before writing the terms of the field. `start_term` will be
    /// called `num_terms` times.
    fn start_field(
        &mut self,
        info: &FieldInfo,
        num_terms: usize,
        has_positions: bool,
        has_offsets: bool,
        has_payloads: bool,
    ) -> Result<()>;

    /// Called after a field and all its terms have been added.
    fn finish_field(&mut self) -> Result<()>;

    /// Adds a term and its term frequency `freq`. If this field has positions
    /// and/or offsets enabled, then `add_position` will be called `freq` times.
    fn start_term(&mut self, term: &[u8], freq: i32) -> Result<()>;

    /// Called after a term and all its positions have been added.
    fn finish_term(&mut self) -> Result<()> {
        Ok(())
    }

    /// Adds a term position and offsets
    fn add_position(
        &mut self,
        position: i32,
        start_offset: i32,
        end_offset: i32,
        payload: &[u8],
    ) -> Result<()>;

    /// Called before the writer is dropped, passing in the number of documents
    /// that were written. A codec should check that this matches the number of
    /// `start_document` calls.
    fn finish(&mut self, fis: &FieldInfos, num_docs: usize) -> Result<()>;

    /// Aborts writing entirely, releasing any partially written files.
    fn abort(&mut self) -> Result<()>;
}
