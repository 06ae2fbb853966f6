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
use core::codec::segment_infos::{SegmentInfo, SegmentWriteState};
use core::codec::stored_fields::{StoredFieldsFormat, StoredFieldsWriter};
use core::codec::Codec;
use core::store::directory::Directory;
use core::store::IOContext;
use core::util::VariantValue;

use error::ErrorKind::IllegalState;
use error::Result;

use std::sync::Arc;

type StoredWriter<C> = <<C as Codec>::StoredFieldsFmt as StoredFieldsFormat>::Writer;

/// Drives the codec's `StoredFieldsWriter` for one segment. The writer is
/// created on the first `start_document` and released by `flush` or `abort`.
pub struct StoredFieldsConsumer<C: Codec> {
    codec: Arc<C>,
    directory: Arc<dyn Directory>,
    segment_info: SegmentInfo,
    writer: Option<StoredWriter<C>>,
    num_docs: usize,
}

impl<C: Codec> StoredFieldsConsumer<C> {
    pub fn new(codec: Arc<C>, directory: Arc<dyn Directory>, segment_info: SegmentInfo) -> Self {
        StoredFieldsConsumer {
            codec,
            directory,
            segment_info,
            writer: None,
            num_docs: 0,
        }
    }

    fn init_stored_fields_writer(&mut self) -> Result<()> {
        if self.writer.is_none() {
            let writer = self.codec.stored_fields_format().fields_writer(
                Arc::clone(&self.directory),
                &self.segment_info,
                &IOContext::Default,
            )?;
            debug!(
                "stored fields writer created for segment {}",
                self.segment_info.name
            );
            self.writer = Some(writer);
        }
        Ok(())
    }

    fn writer(&mut self) -> Result<&mut StoredWriter<C>> {
        match self.writer.as_mut() {
            Some(w) => Ok(w),
            None => bail!(IllegalState("stored fields writer is not started".into())),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.writer.is_some()
    }

    /// Number of start/finish cycles completed so far.
    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn start_document(&mut self) -> Result<()> {
        self.init_stored_fields_writer()?;
        self.writer()?.start_document()
    }

    pub fn write_field(&mut self, field_info: &FieldInfo, value: &VariantValue) -> Result<()> {
        self.writer()?.write_field(field_info, value)
    }

    pub fn finish_document(&mut self) -> Result<()> {
        self.writer()?.finish_document()?;
        self.num_docs += 1;
        Ok(())
    }

    /// Runs empty cycles until `max_doc` documents have been written.
    pub fn finish(&mut self, max_doc: usize) -> Result<()> {
        while self.num_docs < max_doc {
            self.start_document()?;
            self.finish_document()?;
        }
        Ok(())
    }

    pub fn flush(&mut self, state: &SegmentWriteState) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.finish(&state.field_infos, state.segment_info.max_doc() as usize)?;
        }
        Ok(())
    }

    pub fn abort(&mut self) -> Result<()> {
        self.num_docs = 0;
        if let Some(mut writer) = self.writer.take() {
            writer.abort()?;
        }
        Ok(())
    }
}
