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
use core::codec::field_infos::FieldInfos;
use core::codec::postings::{
    FieldPostings, FieldsConsumer, PostingsDoc, PostingsFormat, PostingsPosition, TermPostings,
};
use core::codec::segment_infos::{segment_file_name, SegmentInfo, SegmentWriteState};
use core::store::directory::Directory;
use core::store::io::{ByteArrayDataInput, DataInput, DataOutput, IndexOutput};
use core::util::DocId;

use error::ErrorKind::{CorruptIndex, IllegalState};
use error::Result;

use std::collections::BTreeMap;
use std::io::Read;

/// Extension of the postings file
pub const POSTINGS_EXTENSION: &str = "pst";

const CODEC_NAME: &str = "PlainPostings";
const VERSION_START: i32 = 0;
const VERSION_CURRENT: i32 = VERSION_START;

/// Writes every field's terms and postings into a single checksummed file.
///
/// Per field: number, term count and the field statistics. Per term: its
/// bytes and doc freq followed by the documents as doc id deltas. Freqs,
/// positions, payloads and offsets are written only as far as the field's
/// index options allow.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainPostingsFormat;

impl PostingsFormat for PlainPostingsFormat {
    type FieldsConsumer = PlainFieldsWriter;

    fn fields_consumer(&self, state: &SegmentWriteState) -> Result<PlainFieldsWriter> {
        PlainFieldsWriter::new(state)
    }

    fn name(&self) -> &str {
        "Plain"
    }
}

pub struct PlainFieldsWriter {
    output: Option<Box<dyn IndexOutput>>,
}

impl PlainFieldsWriter {
    pub fn new(state: &SegmentWriteState) -> Result<PlainFieldsWriter> {
        let name = state.file_name(POSTINGS_EXTENSION);
        let mut output = state.directory.create_output(&name, &state.context)?;
        codec_util::write_index_header(
            &mut output,
            CODEC_NAME,
            VERSION_CURRENT,
            &state.segment_info.id,
            &state.segment_suffix,
        )?;
        Ok(PlainFieldsWriter {
            output: Some(output),
        })
    }

    fn write_field<T: DataOutput + ?Sized>(out: &mut T, field: &FieldPostings) -> Result<()> {
        let options = field.field_info.index_options;
        let has_freqs = options.has_freqs();
        let has_positions = options.has_positions();
        let has_offsets = options.has_offsets();
        let has_payloads = field.field_info.has_store_payloads;

        out.write_vint(field.field_info.number as i32)?;
        out.write_vint(field.terms.len() as i32)?;
        out.write_vlong(field.sum_total_term_freq)?;
        out.write_vlong(field.sum_doc_freq)?;
        out.write_vint(field.doc_count)?;

        for term in &field.terms {
            out.write_vint(term.term.len() as i32)?;
            out.write_bytes(&term.term, 0, term.term.len())?;
            out.write_vint(term.docs.len() as i32)?;

            let mut last_doc = 0;
            for doc in &term.docs {
                out.write_vint(doc.doc_id - last_doc)?;
                last_doc = doc.doc_id;
                if has_freqs {
                    out.write_vint(doc.freq)?;
                }
                if !has_positions {
                    continue;
                }
                let mut last_position = 0;
                let mut last_offset = 0;
                for pos in &doc.positions {
                    out.write_vint(pos.position - last_position)?;
                    last_position = pos.position;
                    if has_payloads {
                        out.write_vint(pos.payload.len() as i32)?;
                        out.write_bytes(&pos.payload, 0, pos.payload.len())?;
                    }
                    if has_offsets {
                        out.write_vint(pos.start_offset - last_offset)?;
                        out.write_vint(pos.end_offset - pos.start_offset)?;
                        last_offset = pos.start_offset;
                    }
                }
            }
        }
        Ok(())
    }
}

impl FieldsConsumer for PlainFieldsWriter {
    fn write(&mut self, fields: &[FieldPostings]) -> Result<()> {
        let mut output = match self.output.take() {
            Some(o) => o,
            None => bail!(IllegalState("postings were already written".into())),
        };
        output.write_vint(fields.len() as i32)?;
        for field in fields {
            Self::write_field(&mut output, field)?;
        }
        codec_util::write_footer(&mut output)
    }
}

/// Loads a flushed postings file back into memory.
pub struct PlainFieldsReader {
    fields: BTreeMap<String, Vec<TermPostings>>,
}

impl PlainFieldsReader {
    pub fn open(
        directory: &dyn Directory,
        si: &SegmentInfo,
        field_infos: &FieldInfos,
    ) -> Result<PlainFieldsReader> {
        let name = segment_file_name(&si.name, "", POSTINGS_EXTENSION);
        let mut input = directory.open_input(&name)?;
        codec_util::check_footer(&input)?;
        codec_util::check_index_header(
            &mut input,
            CODEC_NAME,
            VERSION_START,
            VERSION_CURRENT,
            &si.id,
            "",
        )?;

        let mut fields = BTreeMap::new();
        let num_fields = input.read_vint()?;
        for _ in 0..num_fields {
            let number = input.read_vint()?;
            let info = match field_infos.field_info_by_number(number as u32) {
                Some(info) => info,
                None => bail!(CorruptIndex(format!("invalid field number: {}", number))),
            };
            let options = info.index_options;
            let terms = Self::read_terms(
                &mut input,
                options.has_freqs(),
                options.has_positions(),
                options.has_offsets(),
                info.has_store_payloads,
            )?;
            fields.insert(info.name.clone(), terms);
        }
        Ok(PlainFieldsReader { fields })
    }

    fn read_terms(
        input: &mut ByteArrayDataInput,
        has_freqs: bool,
        has_positions: bool,
        has_offsets: bool,
        has_payloads: bool,
    ) -> Result<Vec<TermPostings>> {
        let num_terms = input.read_vint()?;
        // field statistics
        input.read_vlong()?;
        input.read_vlong()?;
        input.read_vint()?;

        let mut terms = Vec::with_capacity(num_terms.max(0) as usize);
        for _ in 0..num_terms {
            let mut term = vec![0u8; input.read_vint()?.max(0) as usize];
            input.read_exact(&mut term)?;
            let doc_freq = input.read_vint()?;
            let mut docs = Vec::with_capacity(doc_freq.max(0) as usize);
            let mut doc_id: DocId = 0;
            for _ in 0..doc_freq {
                doc_id += input.read_vint()?;
                let freq = if has_freqs { input.read_vint()? } else { 1 };
                let mut positions = vec![];
                if has_positions {
                    let mut position = 0;
                    let mut offset = 0;
                    for _ in 0..freq {
                        position += input.read_vint()?;
                        let mut payload = vec![];
                        if has_payloads {
                            payload = vec![0u8; input.read_vint()?.max(0) as usize];
                            input.read_exact(&mut payload)?;
                        }
                        let (mut start_offset, mut end_offset) = (-1, -1);
                        if has_offsets {
                            offset += input.read_vint()?;
                            start_offset = offset;
                            end_offset = offset + input.read_vint()?;
                        }
                        positions.push(PostingsPosition {
                            position,
                            start_offset,
                            end_offset,
                            payload,
                        });
                    }
                }
                docs.push(PostingsDoc {
                    doc_id,
                    freq,
                    positions,
                });
            }
            terms.push(TermPostings { term, docs });
        }
        Ok(terms)
    }

    pub fn terms(&self, field: &str) -> Option<&[TermPostings]> {
        self.fields.get(field).map(|t| t.as_slice())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }
}
