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

pub mod codec_util;

pub mod field_infos;

pub use self::field_infos::*;

pub mod segment_infos;

pub use self::segment_infos::*;

pub mod doc_values;
pub mod norms;
pub mod postings;
pub mod stored_fields;
pub mod term_vectors;

use core::codec::doc_values::{DocValuesFormat, PlainDocValuesFormat};
use core::codec::norms::{NormsFormat, PlainNormsFormat};
use core::codec::postings::{PlainPostingsFormat, PostingsFormat};
use core::codec::stored_fields::{PlainStoredFieldsFormat, StoredFieldsFormat};
use core::codec::term_vectors::{PlainTermVectorsFormat, TermVectorsFormat};

/// Encodes/decodes an inverted index segment.
///
/// The indexing chain only writes, so a codec here is the set of formats
/// a new segment is flushed with.
pub trait Codec: Send + Sync + 'static {
    type PostingsFmt: PostingsFormat;
    type DocValuesFmt: DocValuesFormat;
    type StoredFieldsFmt: StoredFieldsFormat;
    type TermVectorsFmt: TermVectorsFormat;
    type FieldInfosFmt: FieldInfosFormat;
    type NormsFmt: NormsFormat;

    fn name(&self) -> &str;
    fn postings_format(&self) -> &Self::PostingsFmt;
    fn doc_values_format(&self) -> &Self::DocValuesFmt;
    fn stored_fields_format(&self) -> &Self::StoredFieldsFmt;
    fn term_vectors_format(&self) -> &Self::TermVectorsFmt;
    fn field_infos_format(&self) -> &Self::FieldInfosFmt;
    fn norms_format(&self) -> &Self::NormsFmt;
}

/// Codec writing every part of the segment as a simple checksummed file.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCodec {
    postings_format: PlainPostingsFormat,
    doc_values_format: PlainDocValuesFormat,
    stored_fields_format: PlainStoredFieldsFormat,
    term_vectors_format: PlainTermVectorsFormat,
    field_infos_format: PlainFieldInfosFormat,
    norms_format: PlainNormsFormat,
}

impl Codec for PlainCodec {
    type PostingsFmt = PlainPostingsFormat;
    type DocValuesFmt = PlainDocValuesFormat;
    type StoredFieldsFmt = PlainStoredFieldsFormat;
    type TermVectorsFmt = PlainTermVectorsFormat;
    type FieldInfosFmt = PlainFieldInfosFormat;
    type NormsFmt = PlainNormsFormat;

    fn name(&self) -> &str {
        "Plain"
    }

    fn postings_format(&self) -> &PlainPostingsFormat {
        &self.postings_format
    }

    fn doc_values_format(&self) -> &PlainDocValuesFormat {
        &self.doc_values_format
    }

    fn stored_fields_format(&self) -> &PlainStoredFieldsFormat {
        &self.stored_fields_format
    }

    fn term_vectors_format(&self) -> &PlainTermVectorsFormat {
        &self.term_vectors_format
    }

    fn field_infos_format(&self) -> &PlainFieldInfosFormat {
        &self.field_infos_format
    }

    fn norms_format(&self) -> &PlainNormsFormat {
        &self.norms_format
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use core::codec::stored_fields::{PlainStoredFieldsReader, StoredFieldsWriter};
    use core::codec::term_vectors::TermVectorsWriter;
    use core::store::directory::Directory;
    use core::store::IOContext;
    use core::util::VariantValue;
    use error::Result;

    use std::io;
    use std::sync::{Arc, Mutex};

    /// A call observed on a recording writer.
    #[derive(Debug, Clone, PartialEq)]
    pub enum WriterEvent {
        StartDocument(usize),
        FinishDocument,
        WriteField(String, VariantValue),
        StartField(String, usize),
        StartTerm(Vec<u8>, i32),
        AddPosition(i32, i32, i32),
        FinishField,
        Finish(usize),
        Abort,
    }

    /// Where a recording writer fails instead of recording.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum FailPoint {
        StartDocument,
        WriteField,
        FinishDocument,
        Finish,
    }

    #[derive(Clone, Default)]
    pub struct EventLog {
        events: Arc<Mutex<Vec<WriterEvent>>>,
        fail_at: Arc<Mutex<Option<FailPoint>>>,
    }

    impl EventLog {
        fn record(&self, event: WriterEvent) -> Result<()> {
            self.events.lock()?.push(event);
            Ok(())
        }

        fn check(&self, point: FailPoint) -> Result<()> {
            if *self.fail_at.lock()? == Some(point) {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("injected failure at {:?}", point),
                )
                .into());
            }
            Ok(())
        }

        pub fn events(&self) -> Vec<WriterEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn fail_at(&self, point: Option<FailPoint>) {
            *self.fail_at.lock().unwrap() = point;
        }
    }

    pub struct RecordingStoredFieldsFormat {
        log: EventLog,
    }

    impl StoredFieldsFormat for RecordingStoredFieldsFormat {
        type Writer = RecordingWriter;
        type Reader = PlainStoredFieldsReader;

        fn fields_writer(
            &self,
            _directory: Arc<dyn Directory>,
            _si: &SegmentInfo,
            _ctx: &IOContext,
        ) -> Result<RecordingWriter> {
            Ok(RecordingWriter {
                log: self.log.clone(),
            })
        }

        fn fields_reader(
            &self,
            directory: &dyn Directory,
            si: &SegmentInfo,
            _field_infos: &FieldInfos,
        ) -> Result<PlainStoredFieldsReader> {
            PlainStoredFieldsReader::open(directory, si)
        }
    }

    pub struct RecordingTermVectorsFormat {
        log: EventLog,
    }

    impl TermVectorsFormat for RecordingTermVectorsFormat {
        type Writer = RecordingWriter;

        fn tv_writer(
            &self,
            _directory: Arc<dyn Directory>,
            _segment_info: &SegmentInfo,
            _context: &IOContext,
        ) -> Result<RecordingWriter> {
            Ok(RecordingWriter {
                log: self.log.clone(),
            })
        }
    }

    /// Stored fields and term vectors writer that logs every call.
    pub struct RecordingWriter {
        log: EventLog,
    }

    impl StoredFieldsWriter for RecordingWriter {
        fn start_document(&mut self) -> Result<()> {
            self.log.check(FailPoint::StartDocument)?;
            self.log.record(WriterEvent::StartDocument(0))
        }

        fn write_field(&mut self, field_info: &FieldInfo, value: &VariantValue) -> Result<()> {
            self.log.check(FailPoint::WriteField)?;
            self.log
                .record(WriterEvent::WriteField(field_info.name.clone(), value.clone()))
        }

        fn finish_document(&mut self) -> Result<()> {
            self.log.check(FailPoint::FinishDocument)?;
            self.log.record(WriterEvent::FinishDocument)
        }

        fn finish(&mut self, _field_infos: &FieldInfos, num_docs: usize) -> Result<()> {
            self.log.check(FailPoint::Finish)?;
            self.log.record(WriterEvent::Finish(num_docs))
        }

        fn abort(&mut self) -> Result<()> {
            self.log.record(WriterEvent::Abort)
        }
    }

    impl TermVectorsWriter for RecordingWriter {
        fn start_document(&mut self, num_vector_fields: usize) -> Result<()> {
            self.log.check(FailPoint::StartDocument)?;
            self.log
                .record(WriterEvent::StartDocument(num_vector_fields))
        }

        fn finish_document(&mut self) -> Result<()> {
            self.log.check(FailPoint::FinishDocument)?;
            self.log.record(WriterEvent::FinishDocument)
        }

        fn start_field(
            &mut self,
            info: &FieldInfo,
            num_terms: usize,
            _has_positions: bool,
            _has_offsets: bool,
            _has_payloads: bool,
        ) -> Result<()> {
            self.log
                .record(WriterEvent::StartField(info.name.clone(), num_terms))
        }

        fn finish_field(&mut self) -> Result<()> {
            self.log.record(WriterEvent::FinishField)
        }

        fn start_term(&mut self, term: &[u8], freq: i32) -> Result<()> {
            self.log.record(WriterEvent::StartTerm(term.to_vec(), freq))
        }

        fn add_position(
            &mut self,
            position: i32,
            start_offset: i32,
            end_offset: i32,
            _payload: &[u8],
        ) -> Result<()> {
            self.log
                .record(WriterEvent::AddPosition(position, start_offset, end_offset))
        }

        fn finish(&mut self, _fis: &FieldInfos, num_docs: usize) -> Result<()> {
            self.log.check(FailPoint::Finish)?;
            self.log.record(WriterEvent::Finish(num_docs))
        }

        fn abort(&mut self) -> Result<()> {
            self.log.record(WriterEvent::Abort)
        }
    }

    /// Plain codec whose stored fields and term vectors writers only record
    /// the calls they receive.
    pub struct TestCodec {
        plain: PlainCodec,
        stored_fields_format: RecordingStoredFieldsFormat,
        term_vectors_format: RecordingTermVectorsFormat,
    }

    impl Default for TestCodec {
        fn default() -> Self {
            TestCodec {
                plain: PlainCodec::default(),
                stored_fields_format: RecordingStoredFieldsFormat {
                    log: EventLog::default(),
                },
                term_vectors_format: RecordingTermVectorsFormat {
                    log: EventLog::default(),
                },
            }
        }
    }

    impl TestCodec {
        pub fn stored_fields_log(&self) -> &EventLog {
            &self.stored_fields_format.log
        }

        pub fn term_vectors_log(&self) -> &EventLog {
            &self.term_vectors_format.log
        }

        pub fn stored_fields_events(&self) -> Vec<WriterEvent> {
            self.stored_fields_format.log.events()
        }

        pub fn term_vectors_events(&self) -> Vec<WriterEvent> {
            self.term_vectors_format.log.events()
        }
    }

    impl Codec for TestCodec {
        type PostingsFmt = PlainPostingsFormat;
        type DocValuesFmt = PlainDocValuesFormat;
        type StoredFieldsFmt = RecordingStoredFieldsFormat;
        type TermVectorsFmt = RecordingTermVectorsFormat;
        type FieldInfosFmt = PlainFieldInfosFormat;
        type NormsFmt = PlainNormsFormat;

        fn name(&self) -> &str {
            "Test"
        }

        fn postings_format(&self) -> &PlainPostingsFormat {
            self.plain.postings_format()
        }

        fn doc_values_format(&self) -> &PlainDocValuesFormat {
            self.plain.doc_values_format()
        }

        fn stored_fields_format(&self) -> &RecordingStoredFieldsFormat {
            &self.stored_fields_format
        }

        fn term_vectors_format(&self) -> &RecordingTermVectorsFormat {
            &self.term_vectors_format
        }

        fn field_infos_format(&self) -> &PlainFieldInfosFormat {
            self.plain.field_infos_format()
        }

        fn norms_format(&self) -> &PlainNormsFormat {
            self.plain.norms_format()
        }
    }
}
