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
use core::codec::field_infos::FieldInfo;
use core::codec::norms::{NormsConsumer, VERSION_CURRENT};
use core::codec::segment_infos::SegmentWriteState;
use core::store::io::{DataOutput, IndexOutput};

use error::ErrorKind::{IllegalArgument, IllegalState};
use error::Result;

/// Writer for `PlainNormsFormat`
pub struct PlainNormsConsumer {
    data: Box<dyn IndexOutput>,
    meta: Box<dyn IndexOutput>,
    max_doc: i32,
    finished: bool,
}

impl PlainNormsConsumer {
    pub fn new(
        state: &SegmentWriteState,
        data_codec: &str,
        data_extension: &str,
        meta_codec: &str,
        meta_extension: &str,
    ) -> Result<Self> {
        let data_name = state.file_name(data_extension);
        let mut data = state.directory.create_output(&data_name, &state.context)?;
        codec_util::write_index_header(
            &mut data,
            data_codec,
            VERSION_CURRENT,
            state.segment_info.get_id(),
            &state.segment_suffix,
        )?;

        let meta_name = state.file_name(meta_extension);
        let mut meta = state.directory.create_output(&meta_name, &state.context)?;
        codec_util::write_index_header(
            &mut meta,
            meta_codec,
            VERSION_CURRENT,
            state.segment_info.get_id(),
            &state.segment_suffix,
        )?;

        let max_doc = state.segment_info.max_doc();

        Ok(PlainNormsConsumer {
            data,
            meta,
            max_doc,
            finished: false,
        })
    }

    fn add_constant(&mut self, constant: i64) -> Result<()> {
        self.meta.write_byte(0 as u8)?;
        self.meta.write_long(constant)
    }

    fn add_byte(&mut self, min_value: i64, max_value: i64, values: &[i64]) -> Result<()> {
        let len = if min_value >= i8::min_value() as i64 && max_value <= i8::max_value() as i64 {
            1
        } else if min_value >= i16::min_value() as i64 && max_value <= i16::max_value() as i64 {
            2
        } else if min_value >= i32::min_value() as i64 && max_value <= i32::max_value() as i64 {
            4
        } else {
            8
        };
        self.meta.write_byte(len as u8)?;
        self.meta.write_long(self.data.file_pointer())?;
        for &v in values {
            match len {
                1 => self.data.write_byte(v as i8 as u8)?,
                2 => self.data.write_short(v as i16)?,
                4 => self.data.write_int(v as i32)?,
                _ => self.data.write_long(v)?,
            }
        }
        Ok(())
    }
}

impl NormsConsumer for PlainNormsConsumer {
    fn add_norms_field(&mut self, field_info: &FieldInfo, values: &[i64]) -> Result<()> {
        if self.finished {
            bail!(IllegalState("norms consumer is already finished".into()));
        }
        if values.len() != self.max_doc as usize {
            bail!(IllegalArgument(format!(
                "illegal norms data for field {}, expected count={}, got={}",
                field_info.name,
                self.max_doc,
                values.len()
            )));
        }
        self.meta.write_vint(field_info.number as i32)?;
        let mut min_value = i64::max_value();
        let mut max_value = i64::min_value();
        for &v in values {
            min_value = v.min(min_value);
            max_value = v.max(max_value);
        }
        if min_value == max_value {
            self.add_constant(min_value)
        } else {
            self.add_byte(min_value, max_value, values)
        }
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        // write EOF marker
        self.meta.write_vint(-1)?;
        codec_util::write_footer(&mut self.meta)?;
        codec_util::write_footer(&mut self.data)
    }
}
