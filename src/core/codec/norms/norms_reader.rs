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
use core::codec::norms::{
    DATA_CODEC, DATA_EXTENSION, METADATA_CODEC, METADATA_EXTENSION, VERSION_CURRENT, VERSION_START,
};
use core::codec::segment_infos::{segment_file_name, SegmentInfo};
use core::store::directory::Directory;
use core::store::io::{ByteArrayDataInput, DataInput};

use error::ErrorKind::CorruptIndex;
use error::Result;

use std::collections::HashMap;

#[derive(Debug)]
struct NormsEntry {
    bytes_per_value: u8,
    offset: i64,
}

/// Reader for `PlainNormsFormat`. Decodes the norms of every field eagerly.
pub struct PlainNormsReader {
    norms: HashMap<String, Vec<i64>>,
}

impl PlainNormsReader {
    pub fn open(
        directory: &dyn Directory,
        si: &SegmentInfo,
        field_infos: &FieldInfos,
    ) -> Result<PlainNormsReader> {
        let max_doc = si.max_doc() as usize;

        let meta_name = segment_file_name(&si.name, "", METADATA_EXTENSION);
        let mut meta = directory.open_input(&meta_name)?;
        codec_util::check_footer(&meta)?;
        let meta_version = codec_util::check_index_header(
            &mut meta,
            METADATA_CODEC,
            VERSION_START,
            VERSION_CURRENT,
            &si.id,
            "",
        )?;
        let mut entries = Vec::new();
        loop {
            let number = meta.read_vint()?;
            if number == -1 {
                break;
            }
            let info = match field_infos.field_info_by_number(number as u32) {
                Some(info) => info,
                None => bail!(CorruptIndex(format!("Invalid field number: {}", number))),
            };
            if !info.has_norms() {
                bail!(CorruptIndex(format!("Invalid field: {}", info.name)));
            }
            let bytes_per_value = meta.read_byte()?;
            let offset = meta.read_long()?;
            match bytes_per_value {
                0 | 1 | 2 | 4 | 8 => {}
                b => bail!(CorruptIndex(format!(
                    "Invalid bytes_per_value: {}, field: {}",
                    b, info.name
                ))),
            }
            entries.push((info.name.clone(), NormsEntry { bytes_per_value, offset }));
        }

        let data_name = segment_file_name(&si.name, "", DATA_EXTENSION);
        let mut data = directory.open_input(&data_name)?;
        codec_util::check_footer(&data)?;
        let data_version = codec_util::check_index_header(
            &mut data,
            DATA_CODEC,
            VERSION_START,
            VERSION_CURRENT,
            &si.id,
            "",
        )?;
        if data_version != meta_version {
            bail!(CorruptIndex(format!(
                "Format versions mismatch: meta={}, data={}",
                meta_version, data_version
            )))
        }

        let mut norms = HashMap::with_capacity(entries.len());
        for (name, entry) in entries {
            let values = Self::load(&mut data, &entry, max_doc)?;
            norms.insert(name, values);
        }
        Ok(PlainNormsReader { norms })
    }

    fn load(data: &mut ByteArrayDataInput, entry: &NormsEntry, max_doc: usize) -> Result<Vec<i64>> {
        if entry.bytes_per_value == 0 {
            return Ok(vec![entry.offset; max_doc]);
        }
        data.set_position(entry.offset as usize);
        let mut values = Vec::with_capacity(max_doc);
        for _ in 0..max_doc {
            let v = match entry.bytes_per_value {
                1 => data.read_byte()? as i8 as i64,
                2 => data.read_short()? as i64,
                4 => data.read_int()? as i64,
                _ => data.read_long()?,
            };
            values.push(v);
        }
        Ok(values)
    }

    pub fn norms(&self, field: &str) -> Option<&[i64]> {
        self.norms.get(field).map(|v| v.as_slice())
    }
}
