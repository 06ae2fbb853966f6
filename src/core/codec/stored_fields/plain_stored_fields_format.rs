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
use core::codec::stored_fields::{
    StoredFieldValue, StoredFieldsFormat, StoredFieldsReader, StoredFieldsWriter,
};
use core::store::directory::Directory;
use core::store::io::{ByteArrayDataInput, DataInput, DataOutput, IndexOutput};
use core::store::IOContext;
use core::util::{DocId, VariantValue, ID_LENGTH};
use error::ErrorKind::{CorruptIndex, IllegalArgument, IllegalState};
use error::Result;

use std::io::Read;
use std::sync::Arc;

/// Extension of stored fields file
pub const STORED_FIELDS_EXTENSION: &str = "fdt";
/// Extension of stored fields index file
pub const STORED_FIELDS_INDEX_EXTENSION: &str = "fdx";

const CODEC_NAME_DAT: &str = "PlainStoredFieldsData";
const CODEC_NAME_IDX: &str = "PlainStoredFieldsIndex";
const VERSION_START: i32 = 0;
const VERSION_CURRENT: i32 = VERSION_START;

const STRING: i64 = 0x00;
const BYTE_ARR: i64 = 0x01;
const NUMERIC_INT: i64 = 0x02;
const NUMERIC_FLOAT: i64 = 0x03;
const NUMERIC_LONG: i64 = 0x04;
const NUMERIC_DOUBLE: i64 = 0x05;
const BOOL: i64 = 0x06;

const TYPE_BITS: i64 = 3;
const TYPE_MASK: i64 = 7;

/// Uncompressed stored fields: every document is a vint field count followed
/// by `(number << 3 | type, value)` entries. The `.fdx` file keeps the start
/// pointer of every document.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainStoredFieldsFormat;

impl StoredFieldsFormat for PlainStoredFieldsFormat {
    type Writer = PlainStoredFieldsWriter;
    type Reader = PlainStoredFieldsReader;

    fn fields_writer(
        &self,
        directory: Arc<dyn Directory>,
        si: &SegmentInfo,
        ctx: &IOContext,
    ) -> Result<Self::Writer> {
        PlainStoredFieldsWriter::new(directory, si, ctx)
    }

    fn fields_reader(
        &self,
        directory: &dyn Directory,
        si: &SegmentInfo,
        _field_infos: &FieldInfos,
    ) -> Result<Self::Reader> {
        PlainStoredFieldsReader::open(directory, si)
    }
}

pub struct PlainStoredFieldsWriter {
    directory: Arc<dyn Directory>,
    segment: String,
    segment_id: [u8; ID_LENGTH],
    context: IOContext,
    fields_stream: Option<Box<dyn IndexOutput>>,
    doc_buffer: Vec<u8>,
    num_stored_fields: i32,
    doc_pointers: Vec<i64>,
}

impl PlainStoredFieldsWriter {
    pub fn new(
        directory: Arc<dyn Directory>,
        si: &SegmentInfo,
        context: &IOContext,
    ) -> Result<PlainStoredFieldsWriter> {
        let name = segment_file_name(&si.name, "", STORED_FIELDS_EXTENSION);
        let mut fields_stream = directory.create_output(&name, context)?;
        codec_util::write_index_header(
            &mut fields_stream,
            CODEC_NAME_DAT,
            VERSION_CURRENT,
            &si.id,
            "",
        )?;

        Ok(PlainStoredFieldsWriter {
            directory,
            segment: si.name.clone(),
            segment_id: si.id,
            context: *context,
            fields_stream: Some(fields_stream),
            doc_buffer: Vec::with_capacity(1024),
            num_stored_fields: 0,
            doc_pointers: Vec::new(),
        })
    }

    fn stream(&mut self) -> Result<&mut Box<dyn IndexOutput>> {
        match self.fields_stream.as_mut() {
            Some(s) => Ok(s),
            None => bail!(IllegalState("stored fields writer is closed".into())),
        }
    }

    fn write_index(&self, num_docs: usize) -> Result<()> {
        let name = segment_file_name(&self.segment, "", STORED_FIELDS_INDEX_EXTENSION);
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
        codec_util::write_footer(&mut index_stream)
    }
}

impl StoredFieldsWriter for PlainStoredFieldsWriter {
    fn start_document(&mut self) -> Result<()> {
        self.doc_buffer.clear();
        self.num_stored_fields = 0;
        Ok(())
    }

    fn write_field(&mut self, field_info: &FieldInfo, value: &VariantValue) -> Result<()> {
        self.num_stored_fields += 1;

        let number = i64::from(field_info.number);
        let buffer = &mut self.doc_buffer;
        match value {
            VariantValue::VString(s) => {
                buffer.write_vlong((number << TYPE_BITS) | STRING)?;
                buffer.write_string(s)?;
            }
            VariantValue::Binary(b) => {
                buffer.write_vlong((number << TYPE_BITS) | BYTE_ARR)?;
                buffer.write_vint(b.len() as i32)?;
                buffer.write_bytes(b, 0, b.len())?;
            }
            VariantValue::Int(i) => {
                buffer.write_vlong((number << TYPE_BITS) | NUMERIC_INT)?;
                buffer.write_int(*i)?;
            }
            VariantValue::Float(f) => {
                buffer.write_vlong((number << TYPE_BITS) | NUMERIC_FLOAT)?;
                buffer.write_int(f.to_bits() as i32)?;
            }
            VariantValue::Long(l) => {
                buffer.write_vlong((number << TYPE_BITS) | NUMERIC_LONG)?;
                buffer.write_long(*l)?;
            }
            VariantValue::Double(d) => {
                buffer.write_vlong((number << TYPE_BITS) | NUMERIC_DOUBLE)?;
                buffer.write_long(d.to_bits() as i64)?;
            }
            VariantValue::Bool(b) => {
                buffer.write_vlong((number << TYPE_BITS) | BOOL)?;
                buffer.write_byte(*b as u8)?;
            }
        }
        Ok(())
    }

    fn finish_document(&mut self) -> Result<()> {
        let num_stored_fields = self.num_stored_fields;
        let doc = ::std::mem::replace(&mut self.doc_buffer, Vec::new());
        let pointer = {
            let stream = self.stream()?;
            let pointer = stream.file_pointer();
            stream.write_vint(num_stored_fields)?;
            stream.write_bytes(&doc, 0, doc.len())?;
            pointer
        };
        self.doc_buffer = doc;
        self.doc_buffer.clear();
        self.doc_pointers.push(pointer);
        Ok(())
    }

    fn finish(&mut self, _field_infos: &FieldInfos, num_docs: usize) -> Result<()> {
        if self.doc_pointers.len() != num_docs {
            bail!(IllegalState(format!(
                "Wrote {} docs, finish called with num_docs={}",
                self.doc_pointers.len(),
                num_docs
            )));
        }
        self.write_index(num_docs)?;
        if let Some(mut stream) = self.fields_stream.take() {
            codec_util::write_footer(&mut stream)?;
        }
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        self.fields_stream = None;
        self.doc_pointers.clear();
        for ext in &[STORED_FIELDS_EXTENSION, STORED_FIELDS_INDEX_EXTENSION] {
            let name = segment_file_name(&self.segment, "", ext);
            if let Err(e) = self.directory.delete_file(&name) {
                debug!("abort: could not delete '{}': {:?}", name, e);
            }
        }
        Ok(())
    }
}

pub struct PlainStoredFieldsReader {
    data: Vec<u8>,
    doc_pointers: Vec<usize>,
    data_end: usize,
}

impl PlainStoredFieldsReader {
    pub fn open(directory: &dyn Directory, si: &SegmentInfo) -> Result<PlainStoredFieldsReader> {
        let index_name = segment_file_name(&si.name, "", STORED_FIELDS_INDEX_EXTENSION);
        let mut index_in = directory.open_input(&index_name)?;
        codec_util::check_footer(&index_in)?;
        codec_util::check_index_header(
            &mut index_in,
            CODEC_NAME_IDX,
            VERSION_START,
            VERSION_CURRENT,
            &si.id,
            "",
        )?;
        let num_docs = index_in.read_vint()?;
        if num_docs < 0 || num_docs != si.max_doc {
            bail!(CorruptIndex(format!(
                "doc count mismatch: index has {}, segment has {}",
                num_docs, si.max_doc
            )));
        }
        let mut doc_pointers = Vec::with_capacity(num_docs as usize);
        for _ in 0..num_docs {
            doc_pointers.push(index_in.read_vlong()? as usize);
        }

        let data_name = segment_file_name(&si.name, "", STORED_FIELDS_EXTENSION);
        let mut data_in = directory.open_input(&data_name)?;
        codec_util::check_footer(&data_in)?;
        codec_util::check_index_header(
            &mut data_in,
            CODEC_NAME_DAT,
            VERSION_START,
            VERSION_CURRENT,
            &si.id,
            "",
        )?;
        let data_end = data_in.length() - codec_util::footer_length();
        if doc_pointers.iter().any(|p| *p > data_end) {
            bail!(CorruptIndex(format!(
                "stored fields pointer past end of '{}'",
                data_name
            )));
        }

        Ok(PlainStoredFieldsReader {
            data: ByteArrayDataInput::bytes(&data_in).to_vec(),
            doc_pointers,
            data_end,
        })
    }

    fn read_value(input: &mut ByteArrayDataInput, bits: i64) -> Result<VariantValue> {
        let value = match bits & TYPE_MASK {
            STRING => VariantValue::VString(input.read_string()?),
            BYTE_ARR => {
                let len = input.read_vint()?;
                if len < 0 {
                    bail!(CorruptIndex(format!("negative binary length: {}", len)));
                }
                let mut bytes = vec![0u8; len as usize];
                input.read_exact(&mut bytes)?;
                VariantValue::Binary(bytes)
            }
            NUMERIC_INT => VariantValue::Int(input.read_int()?),
            NUMERIC_FLOAT => VariantValue::Float(f32::from_bits(input.read_int()? as u32)),
            NUMERIC_LONG => VariantValue::Long(input.read_long()?),
            NUMERIC_DOUBLE => VariantValue::Double(f64::from_bits(input.read_long()? as u64)),
            BOOL => VariantValue::Bool(input.read_byte()? != 0),
            t => bail!(CorruptIndex(format!("unknown stored field type: {}", t))),
        };
        Ok(value)
    }
}

impl StoredFieldsReader for PlainStoredFieldsReader {
    fn document(&self, doc_id: DocId) -> Result<Vec<StoredFieldValue>> {
        if doc_id < 0 || doc_id as usize >= self.doc_pointers.len() {
            bail!(IllegalArgument(format!(
                "doc_id {} out of bounds [0, {})",
                doc_id,
                self.doc_pointers.len()
            )));
        }
        let start = self.doc_pointers[doc_id as usize];
        let end = self
            .doc_pointers
            .get(doc_id as usize + 1)
            .cloned()
            .unwrap_or(self.data_end);
        let mut input = ByteArrayDataInput::new(self.data[start..end].to_vec());

        let num_fields = input.read_vint()?;
        let mut fields = Vec::with_capacity(num_fields.max(0) as usize);
        for _ in 0..num_fields {
            let bits = input.read_vlong()?;
            let value = Self::read_value(&mut input, bits)?;
            fields.push(StoredFieldValue {
                field_number: (bits >> TYPE_BITS) as u32,
                value,
            });
        }
        Ok(fields)
    }

    fn num_docs(&self) -> usize {
        self.doc_pointers.len()
    }
}
