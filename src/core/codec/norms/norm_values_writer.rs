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

use core::codec::field_infos::FieldInfo;
use core::codec::norms::NormsConsumer;
use core::codec::segment_infos::SegmentWriteState;
use core::util::{Counter, DocId};

use error::ErrorKind::IllegalState;
use error::Result;

use std::mem;

const MISSING: i64 = 0;

/// Buffers the norm values of one field until the segment is flushed.
/// Documents without a value for the field get `MISSING`.
pub struct NormValuesWriter {
    field_name: String,
    pending: Vec<i64>,
    bytes_used: Counter,
    last_doc: DocId,
}

impl NormValuesWriter {
    pub fn new(field_info: &FieldInfo, bytes_used: Counter) -> Self {
        NormValuesWriter {
            field_name: field_info.name.clone(),
            pending: Vec::new(),
            bytes_used,
            last_doc: -1,
        }
    }

    pub fn add_value(&mut self, doc_id: DocId, value: i64) -> Result<()> {
        if doc_id <= self.last_doc {
            bail!(IllegalState(format!(
                "norm for field '{}' added out of order: doc {} after doc {}",
                self.field_name, doc_id, self.last_doc
            )));
        }
        let added = doc_id as usize + 1 - self.pending.len();
        self.pending.resize(doc_id as usize, MISSING);
        self.pending.push(value);
        self.bytes_used
            .add((added * mem::size_of::<i64>()) as i64);
        self.last_doc = doc_id;
        Ok(())
    }

    pub fn finish(&mut self, _max_doc: i32) {}

    pub fn flush<NC: NormsConsumer>(
        &mut self,
        state: &SegmentWriteState,
        consumer: &mut NC,
    ) -> Result<()> {
        let max_doc = state.segment_info.max_doc() as usize;
        let field_info = match state.field_infos.field_info_by_name(&self.field_name) {
            Some(fi) => fi,
            None => bail!(IllegalState(format!(
                "field '{}' has norms but is missing from the field infos",
                self.field_name
            ))),
        };
        if self.pending.len() > max_doc {
            bail!(IllegalState(format!(
                "field '{}' has norms for {} docs but the segment has {}",
                self.field_name,
                self.pending.len(),
                max_doc
            )));
        }
        self.pending.resize(max_doc, MISSING);
        consumer.add_norms_field(field_info, &self.pending)
    }
}
