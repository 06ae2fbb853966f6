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

use core::codec::codec_util;
use core::codec::field_infos::{FieldInfo, FieldInfos};
use core::codec::segment_infos::{segment_file_name, SegmentInfo};
use core::codec::term_vectors::{TermVectorsFormat, TermVectorsWriter};
use core::store::directory::Directory;
use core::store::io::{DataOutput, IndexOutput};
use core::store::IOContext;
use core::util::ID_LENGTH;
use error::ErrorKind::IllegalState;
use error::Result;

use std::sync::Arc;

/// Extension of vectors data file
pub const VECTORS_EXTENSION: &str = "tvd";
/// Extension of vectors index file
pub const VECTORS_INDEX_EXTENSION: &str = "tvx";

const CODEC_NAME_DAT: &str = "PlainTermVectorsData";
const CODEC_NAME_IDX: &str = "PlainTermVectorsIndex";
const VERSION_START: i32 = 0;
const VERSION_CURRENT: i32 = VERSION_START;

const POSITIONS: u8 = 0x01;
const OFFSETS: u8 = 0x02;
const PAYLOADS: u8 = 0x04;

/// Uncompressed term vectors, one buffered entry per document.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTermVectorsFormat;

impl TermVectorsFormat for PlainTermVectorsFormat {
    type Writer = PlainTermVectorsWriter;

    fn tv_writer(
        &self,
        directory: Arc<dyn Directory>,
        segment_info: &SegmentInfo,
        context: &IOContext,
    ) -> Result<PlainTermVectorsWriter> {
        PlainTermVectorsWriter::new(directory, segment_info, context)
    }
}

pub struct PlainTermVectorsWriter {
    directory: Arc<dyn Directory>,
    segment: String,
    segment_id: [u8; ID_LENGTH],
    context: IOContext,
    vectors_stream: Option<Box<dyn IndexOutput>>,
    doc_buffer: Vec<u8>,
    doc_pointers: Vec<i64>,
    // state of the field being written
    has_positions: bool,
    has_offsets: bool,
    has_payloads: bool,
    last_position: i32,
    last_offset: i32,
}

impl PlainTermVectorsWriter {
    pub fn new(
        directory: Arc<dyn Directory>,
        si: &SegmentInfo,
        context: &IOContext,
    ) -> Result<PlainTermVectorsWriter> {
        let name = segment_file_name(&si.name, "", VECTORS_EXTENSION);
        let mut vectors_stream = directory.create_output(&name, context)?;
        codec_util::write_index_header(
            &mut vectors_stream,
            CODEC_NAME_DAT,
            VERSION_CURRENT,
            &si.id,
            "",
        )?;
        Ok(PlainTermVectorsWriter {
            directory,
            segment: si.name.clone(),
            segment_id: si.id,
            context: *context,
            vectors_stream: Some(vectors_stream),
            doc_buffer: Vec::with_capacity(1024),
            doc_pointers: vec![],
            has_positions: false,
            has_offsets: false,
            has_payloads: false,
            last_position: 0,
            last_offset: 0,
        })
    }

    fn stream(&mut self) -> Result<&mut Box<dyn IndexOutput>> {
        match self.vectors_stream.as_mut() {
            Some(s) => Ok(s),
            None => bail!(IllegalState("term vectors writer is closed".into())),
        }
    }
}

impl TermVectorsWriter for PlainTermVectorsWriter {
    fn start_document(&mut self, num_vector_fields: usize) -> Result<()> {
        self.doc_buffer.clear();
        self.doc_buffer.write_vint(num_vector_fields as i32)
    }

    fn finish_document(&mut self) -> Result<()> {
        let doc = ::std::mem::replace(&mut self.doc_buffer, Vec::new());
        let pointer = {
            let stream = self.stream()?;
            let pointer = stream.file_pointer();
            stream.write_bytes(&doc, 0, doc.len())?;
            pointer
        };
        self.doc_buffer = doc;
        self.doc_pointers.push(pointer);
        Ok(())
    }

    fn start_field(
        &mut self,
        info: &FieldInfo,
        num_terms: usize,
        has_positions: bool,
        has_offsets: bool,
        has_payloads: bool,
    ) -> Result<()> {
        self.has_positions = has_positions;
        self.has_offsets = has_offsets;
        self.has_payloads = has_payloads;

        let mut flags = 0u8;
        if has_positions {
            flags |= POSITIONS;
        }
        if has_offsets {
            flags |= OFFSETS;
        }
        if has_payloads {
            flags |= PAYLOADS;
        }
        self.doc_buffer.write_vint(info.number as i32)?;
        self.doc_buffer.write_byte(flags)?;
        self.doc_buffer.write_vint(num_terms as i32)
    }

    fn finish_field(&mut self) -> Result<()> {
        Ok(())
    }

    fn start_term(&mut self, term: &[u8], freq: i32) -> Result<()> {
        self.last_position = 0;
        self.last_offset = 0;
        self.doc_buffer.write_vint(term.len() as i32)?;
        self.doc_buffer.write_bytes(term, 0, term.len())?;
        self.doc_buffer.write_vint(freq)
    }

    fn add_position(
        &mut self,
        position: i32,
        start_offset: i32,
        end_offset: i32,
        payload: &[u8],
    ) -> Result<()> {
        if self.has_positions {
            self.doc_buffer.write_vint(position - self.last_position)?;
            self.last_position = position;
            if self.has_payloads {
                self.doc_buffer.write_vint(payload.len() as i32)?;
                self.doc_buffer.write_bytes(payload, 0, payload.len())?;
            }
        }
        if self.has_offsets {
            self.doc_buffer.write_vint(start_offset - self.last_offset)?;
            self.doc_buffer.write_vint(end_offset - start_offset)?;
            self.last_offset = start_offset;
        }
        Ok(())
    }

    fn finish(&mut self, _fis: &FieldInfos, num_docs: usize) -> Result<()> {
        if self.doc_pointers.len() != num_docs {
            bail!(IllegalState(format!(
                "Wrote {} docs, finish called with num_docs={}",
                self.doc_pointers.len(),
                num_docs
            )));
        }

        let name = segment_file_name(&self.segment, "", VECTORS_INDEX_EXTENSION);
        let mut index_stream = self.directory.create_output(&name, &self.context)?;
        codec_util::write_index_header(
            &mut index_stream,
            CODEC_NAME_IDX,
            VERSION_CURRENT,
            &self.segment_id,
            "",
        )?;
        index_stream.write_vint(num_docs as i32)?;
        for pointer in &self.doc_pointers {
            index_stream.write_vlong(*pointer)?;
        }
        codec_util::write_footer(&mut index_stream)?;

        if let Some(mut stream) = self.vectors_stream.take() {
            codec_util::write_footer(&mut stream)?;
        }
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        self.vectors_stream = None;
        self.doc_pointers.clear();
        for ext in &[VECTORS_EXTENSION, VECTORS_INDEX_EXTENSION] {
            let name = segment_file_name(&self.segment, "", ext);
            if let Err(e) = self.directory.delete_file(&name) {
                debug!("abort: could not delete '{}': {:?}", name, e);
            }
        }
        Ok(())
    }
}
