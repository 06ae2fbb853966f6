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
use core::codec::doc_values::{DocValuesConsumer, DocValuesFormat};
use core::codec::field_infos::{FieldInfo, FieldInfos};
use core::codec::segment_infos::{segment_file_name, SegmentInfo, SegmentWriteState};
use core::doc::DocValuesType;
use core::store::directory::Directory;
use core::store::io::{ByteArrayDataInput, DataInput, DataOutput, IndexOutput};

use error::ErrorKind::{CorruptIndex, IllegalArgument, IllegalState};
use error::Result;

use std::collections::HashMap;
use std::io::Read;

pub const DATA_CODEC: &str = "PlainDocValuesData";
pub const DATA_EXTENSION: &str = "dvd";
pub const VERSION_START: i32 = 0;
pub const VERSION_CURRENT: i32 = VERSION_START;

/// All doc values fields of a segment in one file: for every field its
/// number, its type and then the column, end marked by -1.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlainDocValuesFormat;

impl DocValuesFormat for PlainDocValuesFormat {
    type Consumer = PlainDocValuesConsumer;

    fn fields_consumer(&self, state: &SegmentWriteState) -> Result<PlainDocValuesConsumer> {
        PlainDocValuesConsumer::new(state)
    }

    fn name(&self) -> &str {
        "Plain"
    }
}

/// Writer for `PlainDocValuesFormat`
pub struct PlainDocValuesConsumer {
    data: Box<dyn IndexOutput>,
    max_doc: usize,
    finished: bool,
}

impl PlainDocValuesConsumer {
    pub fn new(state: &SegmentWriteState) -> Result<PlainDocValuesConsumer> {
        let name = state.file_name(DATA_EXTENSION);
        let mut data = state.directory.create_output(&name, &state.context)?;
        codec_util::write_index_header(
            &mut data,
            DATA_CODEC,
            VERSION_CURRENT,
            state.segment_info.get_id(),
            &state.segment_suffix,
        )?;
        Ok(PlainDocValuesConsumer {
            data,
            max_doc: state.segment_info.max_doc() as usize,
            finished: false,
        })
    }

    fn start_field(
        &mut self,
        field_info: &FieldInfo,
        dv_type: DocValuesType,
        docs: usize,
    ) -> Result<()> {
        if self.finished {
            bail!(IllegalState("doc values consumer is already finished".into()));
        }
        if docs != self.max_doc {
            bail!(IllegalArgument(format!(
                "illegal doc values for field {}, expected count={}, got={}",
                field_info.name, self.max_doc, docs
            )));
        }
        self.data.write_vint(field_info.number as i32)?;
        self.data.write_byte(dv_type.value())
    }

    fn write_bytes_value(&mut self, value: &[u8]) -> Result<()> {
        self.data.write_vint(value.len() as i32)?;
        self.data.write_bytes(value, 0, value.len())
    }
}

impl DocValuesConsumer for PlainDocValuesConsumer {
    fn add_numeric_field(&mut self, field_info: &FieldInfo, values: &[Option<i64>]) -> Result<()> {
        self.start_field(field_info, DocValuesType::Numeric, values.len())?;
        for v in values {
            match *v {
                Some(v) => {
                    self.data.write_byte(1)?;
                    self.data.write_long(v)?;
                }
                None => self.data.write_byte(0)?,
            }
        }
        Ok(())
    }

    fn add_binary_field(&mut self, field_info: &FieldInfo, values: &[Option<&[u8]>]) -> Result<()> {
        self.start_field(field_info, DocValuesType::Binary, values.len())?;
        for v in values {
            match *v {
                Some(v) => {
                    self.data.write_byte(1)?;
                    self.write_bytes_value(v)?;
                }
                None => self.data.write_byte(0)?,
            }
        }
        Ok(())
    }

    fn add_sorted_field(
        &mut self,
        field_info: &FieldInfo,
        values: &[&[u8]],
        doc_to_ord: &[i32],
    ) -> Result<()> {
        self.start_field(field_info, DocValuesType::Sorted, doc_to_ord.len())?;
        self.data.write_vint(values.len() as i32)?;
        for v in values {
            self.write_bytes_value(v)?;
        }
        for ord in doc_to_ord {
            // shifted so that missing (-1) encodes as 0
            self.data.write_vint(*ord + 1)?;
        }
        Ok(())
    }

    fn add_sorted_numeric_field(
        &mut self,
        field_info: &FieldInfo,
        doc_to_value_count: &[u32],
        values: &[i64],
    ) -> Result<()> {
        self.start_field(
            field_info,
            DocValuesType::SortedNumeric,
            doc_to_value_count.len(),
        )?;
        for count in doc_to_value_count {
            self.data.write_vint(*count as i32)?;
        }
        self.data.write_vint(values.len() as i32)?;
        for v in values {
            self.data.write_long(*v)?;
        }
        Ok(())
    }

    fn add_sorted_set_field(
        &mut self,
        field_info: &FieldInfo,
        values: &[&[u8]],
        doc_to_ord_count: &[u32],
        ords: &[i64],
    ) -> Result<()> {
        self.start_field(field_info, DocValuesType::SortedSet, doc_to_ord_count.len())?;
        self.data.write_vint(values.len() as i32)?;
        for v in values {
            self.write_bytes_value(v)?;
        }
        for count in doc_to_ord_count {
            self.data.write_vint(*count as i32)?;
        }
        self.data.write_vint(ords.len() as i32)?;
        for ord in ords {
            self.data.write_vlong(*ord)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        // EOF marker
        self.data.write_vint(-1)?;
        codec_util::write_footer(&mut self.data)
    }
}

/// A decoded doc values column, one entry per document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocValuesColumn {
    Numeric(Vec<Option<i64>>),
    Binary(Vec<Option<Vec<u8>>>),
    Sorted {
        values: Vec<Vec<u8>>,
        doc_to_ord: Vec<i32>,
    },
    SortedNumeric(Vec<Vec<i64>>),
    SortedSet {
        values: Vec<Vec<u8>>,
        doc_to_ords: Vec<Vec<i64>>,
    },
}

/// Reader for `PlainDocValuesFormat`.
pub struct PlainDocValuesReader {
    columns: HashMap<String, DocValuesColumn>,
}

impl PlainDocValuesReader {
    pub fn open(
        directory: &dyn Directory,
        si: &SegmentInfo,
        field_infos: &FieldInfos,
    ) -> Result<PlainDocValuesReader> {
        let max_doc = si.max_doc() as usize;
        let name = segment_file_name(&si.name, "", DATA_EXTENSION);
        let mut input = directory.open_input(&name)?;
        codec_util::check_footer(&input)?;
        codec_util::check_index_header(
            &mut input,
            DATA_CODEC,
            VERSION_START,
            VERSION_CURRENT,
            &si.id,
            "",
        )?;

        let mut columns = HashMap::new();
        loop {
            let number = input.read_vint()?;
            if number == -1 {
                break;
            }
            let info = match field_infos.field_info_by_number(number as u32) {
                Some(info) => info,
                None => bail!(CorruptIndex(format!("invalid field number: {}", number))),
            };
            let dv_type = DocValuesType::from_value(input.read_byte()?)?;
            if dv_type != info.doc_values_type {
                bail!(CorruptIndex(format!(
                    "field {} has doc values type {:?} but field infos say {:?}",
                    info.name, dv_type, info.doc_values_type
                )));
            }
            let column = Self::read_column(&mut input, dv_type, max_doc)?;
            columns.insert(info.name.clone(), column);
        }
        Ok(PlainDocValuesReader { columns })
    }

    fn read_bytes_value(input: &mut ByteArrayDataInput) -> Result<Vec<u8>> {
        let len = input.read_vint()?;
        if len < 0 {
            bail!(CorruptIndex(format!("negative value length: {}", len)));
        }
        let mut value = vec![0u8; len as usize];
        input.read_exact(&mut value)?;
        Ok(value)
    }

    fn read_values(input: &mut ByteArrayDataInput) -> Result<Vec<Vec<u8>>> {
        let count = input.read_vint()?;
        let mut values = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            values.push(Self::read_bytes_value(input)?);
        }
        Ok(values)
    }

    fn read_counts(input: &mut ByteArrayDataInput, max_doc: usize) -> Result<Vec<usize>> {
        let mut counts = Vec::with_capacity(max_doc);
        for _ in 0..max_doc {
            counts.push(input.read_vint()?.max(0) as usize);
        }
        Ok(counts)
    }

    fn read_column(
        input: &mut ByteArrayDataInput,
        dv_type: DocValuesType,
        max_doc: usize,
    ) -> Result<DocValuesColumn> {
        let column = match dv_type {
            DocValuesType::Numeric => {
                let mut values = Vec::with_capacity(max_doc);
                for _ in 0..max_doc {
                    if input.read_byte()? != 0 {
                        values.push(Some(input.read_long()?));
                    } else {
                        values.push(None);
                    }
                }
                DocValuesColumn::Numeric(values)
            }
            DocValuesType::Binary => {
                let mut values = Vec::with_capacity(max_doc);
                for _ in 0..max_doc {
                    if input.read_byte()? != 0 {
                        values.push(Some(Self::read_bytes_value(input)?));
                    } else {
                        values.push(None);
                    }
                }
                DocValuesColumn::Binary(values)
            }
            DocValuesType::Sorted => {
                let values = Self::read_values(input)?;
                let mut doc_to_ord = Vec::with_capacity(max_doc);
                for _ in 0..max_doc {
                    doc_to_ord.push(input.read_vint()? - 1);
                }
                DocValuesColumn::Sorted { values, doc_to_ord }
            }
            DocValuesType::SortedNumeric => {
                let counts = Self::read_counts(input, max_doc)?;
                input.read_vint()?;
                let mut docs = Vec::with_capacity(max_doc);
                for count in counts {
                    let mut values = Vec::with_capacity(count);
                    for _ in 0..count {
                        values.push(input.read_long()?);
                    }
                    docs.push(values);
                }
                DocValuesColumn::SortedNumeric(docs)
            }
            DocValuesType::SortedSet => {
                let values = Self::read_values(input)?;
                let counts = Self::read_counts(input, max_doc)?;
                input.read_vint()?;
                let mut doc_to_ords = Vec::with_capacity(max_doc);
                for count in counts {
                    let mut ords = Vec::with_capacity(count);
                    for _ in 0..count {
                        ords.push(input.read_vlong()?);
                    }
                    doc_to_ords.push(ords);
                }
                DocValuesColumn::SortedSet {
                    values,
                    doc_to_ords,
                }
            }
            DocValuesType::Null => bail!(CorruptIndex("doc values field without a type".into())),
        };
        Ok(column)
    }

    pub fn column(&self, field: &str) -> Option<&DocValuesColumn> {
        self.columns.get(field)
    }
}
