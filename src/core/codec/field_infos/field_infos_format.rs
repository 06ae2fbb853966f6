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
use core::doc::{DocValuesType, IndexOptions};
use core::store::directory::Directory;
use core::store::io::{DataInput, DataOutput};
use core::store::IOContext;
use error::{ErrorKind::CorruptIndex, Result};

/// Encodes/decodes `FieldInfos`
pub trait FieldInfosFormat: Send + Sync {
    /// Read the `FieldInfos` previously written with `write`.
    fn read(
        &self,
        directory: &dyn Directory,
        segment_info: &SegmentInfo,
        segment_suffix: &str,
    ) -> Result<FieldInfos>;

    /// Writes the provided `FieldInfos` to the directory.
    fn write(
        &self,
        directory: &dyn Directory,
        segment_info: &SegmentInfo,
        segment_suffix: &str,
        infos: &FieldInfos,
        context: &IOContext,
    ) -> Result<()>;
}

/// Extension of field infos
const EXTENSION: &str = "fnm";

// Codec header
const CODEC_NAME: &str = "PlainFieldInfos";
const FORMAT_START: i32 = 0;
const FORMAT_CURRENT: i32 = FORMAT_START;

// Field flags
const STORE_TERM_VECTOR: u8 = 0x1;
const OMIT_NORMS: u8 = 0x2;
const STORE_PAYLOADS: u8 = 0x4;

/// Writes one `.fnm` file per segment: for every field its name, number,
/// flag bits, index options, doc values type and attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainFieldInfosFormat;

impl FieldInfosFormat for PlainFieldInfosFormat {
    fn read(
        &self,
        directory: &dyn Directory,
        segment_info: &SegmentInfo,
        segment_suffix: &str,
    ) -> Result<FieldInfos> {
        let file_name = segment_file_name(&segment_info.name, segment_suffix, EXTENSION);
        let mut input = directory.open_input(&file_name)?;
        codec_util::check_footer(&input)?;
        codec_util::check_index_header(
            &mut input,
            CODEC_NAME,
            FORMAT_START,
            FORMAT_CURRENT,
            &segment_info.id,
            segment_suffix,
        )?;

        let size = input.read_vint()?;
        let mut infos = Vec::with_capacity(size.max(0) as usize);
        for _ in 0..size {
            let name = input.read_string()?;
            let field_number = input.read_vint()?;
            if field_number < 0 {
                bail!(CorruptIndex(format!(
                    "invalid field number for field: {}, field_number={}",
                    name, field_number
                )));
            }
            let bits = input.read_byte()?;
            let index_options = IndexOptions::from_value(i32::from(input.read_byte()?))
                .map_err(|e| CorruptIndex(format!("field '{}': {}", name, e)))?;
            let doc_values_type = DocValuesType::from_value(input.read_byte()?)
                .map_err(|e| CorruptIndex(format!("field '{}': {}", name, e)))?;
            let attributes = input.read_map_of_strings()?;

            infos.push(FieldInfo::new(
                name,
                field_number as u32,
                bits & STORE_TERM_VECTOR != 0,
                bits & OMIT_NORMS != 0,
                bits & STORE_PAYLOADS != 0,
                index_options,
                doc_values_type,
                attributes,
            )?);
        }
        FieldInfos::new(infos)
    }

    fn write(
        &self,
        directory: &dyn Directory,
        segment_info: &SegmentInfo,
        segment_suffix: &str,
        infos: &FieldInfos,
        context: &IOContext,
    ) -> Result<()> {
        let file_name = segment_file_name(&segment_info.name, segment_suffix, EXTENSION);
        let mut output = directory.create_output(&file_name, context)?;
        codec_util::write_index_header(
            &mut output,
            CODEC_NAME,
            FORMAT_CURRENT,
            &segment_info.id,
            segment_suffix,
        )?;
        output.write_vint(infos.len() as i32)?;
        for fi in infos.iter() {
            fi.check_consistency()?;
            output.write_string(&fi.name)?;
            output.write_vint(fi.number as i32)?;

            let mut bits = 0u8;
            if fi.has_store_term_vector {
                bits |= STORE_TERM_VECTOR;
            }
            if fi.omit_norms {
                bits |= OMIT_NORMS;
            }
            if fi.has_store_payloads {
                bits |= STORE_PAYLOADS;
            }
            output.write_byte(bits)?;
            output.write_byte(fi.index_options.value() as u8)?;
            output.write_byte(fi.doc_values_type.value())?;
            output.write_map_of_strings(&fi.attributes)?;
        }
        codec_util::write_footer(&mut output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::store::directory::RAMDirectory;
    use core::util::random_id;
    use std::collections::HashMap;

    #[test]
    fn test_write_and_read_back() {
        let mut title = FieldInfo::new(
            "title".into(),
            0,
            true,
            false,
            true,
            IndexOptions::DocsAndFreqsAndPositions,
            DocValuesType::Null,
            HashMap::new(),
        )
        .unwrap();
        title.put_attribute("analyzer".into(), "whitespace".into());
        let price = FieldInfo::new(
            "price".into(),
            1,
            false,
            false,
            false,
            IndexOptions::Null,
            DocValuesType::Numeric,
            HashMap::new(),
        )
        .unwrap();
        let infos = FieldInfos::new(vec![title, price]).unwrap();

        let dir = RAMDirectory::new();
        let si = SegmentInfo::new("_0", 3, random_id(), "Plain");
        let format = PlainFieldInfosFormat;
        format
            .write(&dir, &si, "", &infos, &IOContext::Default)
            .unwrap();
        assert!(dir.file_length("_0.fnm").unwrap() > 0);

        let read = format.read(&dir, &si, "").unwrap();
        assert_eq!(read.len(), 2);
        let title = read.field_info_by_name("title").unwrap();
        assert!(title.has_store_term_vector && title.has_store_payloads);
        assert_eq!(title.attribute("analyzer"), Some("whitespace"));
        let price = read.field_info_by_number(1).unwrap();
        assert_eq!(price.doc_values_type, DocValuesType::Numeric);
        assert!(read.has_doc_values && read.has_vectors);
    }
}
