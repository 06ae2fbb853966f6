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

use core::analysis::Analyzer;
use core::codec::field_infos::{FieldInfos, FieldInfosBuilder, FieldNumbers, FieldNumbersRef};
use core::codec::segment_infos::{SegmentInfo, SegmentWriteState};
use core::codec::Codec;
use core::doc::Fieldable;
use core::index::writer::{DocConsumer, IndexWriterConfig, INDEX_MAX_DOCS};
use core::search::similarity::Similarity;
use core::store::directory::{Directory, TrackingDirectoryWrapper};
use core::store::{FlushInfo, IOContext};
use core::util::{random_id, Counter, DocId};

use error::ErrorKind::{IllegalArgument, IllegalState};
use error::Result;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Per-document state handed to the indexing chain.
pub struct DocState {
    pub doc_id: DocId,
    pub analyzer: Arc<dyn Analyzer>,
    pub similarity: Arc<dyn Similarity>,
    // set by the chain on an error that left its buffers unusable
    aborting: bool,
}

impl DocState {
    pub fn new(analyzer: Arc<dyn Analyzer>, similarity: Arc<dyn Similarity>) -> Self {
        DocState {
            doc_id: 0,
            analyzer,
            similarity,
            aborting: false,
        }
    }

    /// Marks the session unusable, only `abort` is legal from now on.
    pub fn set_aborting(&mut self) {
        if !self.aborting {
            debug!("DWPT: document {} hit an aborting error", self.doc_id);
            self.aborting = true;
        }
    }

    pub fn is_aborting(&self) -> bool {
        self.aborting
    }
}

/// One indexing session: buffers the documents of a single new segment
/// through its own `DocConsumer`, then flushes them.
pub struct DocumentsWriterPerThread<C: Codec> {
    // records every file the segment writes
    directory: Arc<TrackingDirectoryWrapper>,
    config: Arc<IndexWriterConfig<C>>,
    doc_state: DocState,
    consumer: DocConsumer<C>,
    pub segment_info: SegmentInfo,
    // true if an abort is pending
    aborted: bool,
    num_docs_in_ram: u32,
    // docs that hit a non-aborting error, they keep their doc id
    deleted_docs: BTreeSet<DocId>,
    pending_num_docs: Arc<AtomicI64>,
}

impl<C: Codec> DocumentsWriterPerThread<C> {
    pub fn new(
        segment_name: &str,
        directory: Arc<dyn Directory>,
        config: Arc<IndexWriterConfig<C>>,
        field_numbers: Arc<FieldNumbers>,
        pending_num_docs: Arc<AtomicI64>,
        bytes_used: Counter,
    ) -> Self {
        let directory = Arc::new(TrackingDirectoryWrapper::new(directory));
        let segment_info = SegmentInfo::new(segment_name, -1, random_id(), config.codec().name());
        let consumer = DocConsumer::new(
            Arc::clone(&config.codec),
            Arc::clone(&directory) as Arc<dyn Directory>,
            &segment_info,
            FieldInfosBuilder::new(FieldNumbersRef::new(field_numbers)),
            bytes_used,
            config.max_stored_field_length,
        );
        let doc_state = DocState::new(Arc::clone(&config.analyzer), Arc::clone(&config.similarity));
        debug!("DWPT: init segment {}", segment_name);

        DocumentsWriterPerThread {
            directory,
            config,
            doc_state,
            consumer,
            segment_info,
            aborted: false,
            num_docs_in_ram: 0,
            deleted_docs: BTreeSet::new(),
            pending_num_docs,
        }
    }

    pub fn codec(&self) -> &C {
        self.config.codec()
    }

    pub fn num_docs_in_ram(&self) -> u32 {
        self.num_docs_in_ram
    }

    pub fn deleted_docs(&self) -> &BTreeSet<DocId> {
        &self.deleted_docs
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Bytes buffered by this session alone.
    pub fn bytes_used(&self) -> i64 {
        self.consumer.bytes_used()
    }

    /// Whether the buffered documents reached the configured doc count or
    /// RAM budget.
    pub fn need_flush(&self) -> bool {
        let by_docs = self.config.flush_on_doc_count()
            && self.num_docs_in_ram >= self.config.max_buffered_docs();
        let by_ram = self.config.flush_on_ram()
            && self.bytes_used() >= self.config.ram_buffer_size_bytes();
        by_docs || by_ram
    }

    // Anything that will add N docs to the index should reserve first to make sure it's allowed
    fn reserve_one_doc(&mut self) -> Result<()> {
        let pending = self.pending_num_docs.fetch_add(1, Ordering::AcqRel) + 1;
        if pending > i64::from(INDEX_MAX_DOCS) {
            // Reserve failed: put the one doc back
            self.pending_num_docs.fetch_sub(1, Ordering::AcqRel);
            bail!(IllegalArgument(format!(
                "number of documents in the index cannot exceed {}",
                INDEX_MAX_DOCS
            )));
        }
        Ok(())
    }

    pub fn update_document<F: Fieldable>(&mut self, doc: &mut [F]) -> Result<()> {
        if self.aborted {
            bail!(IllegalState(format!(
                "segment {} was aborted and cannot accept documents",
                self.segment_info.name
            )));
        }
        if self.segment_info.is_max_doc_set() {
            bail!(IllegalState(format!(
                "segment {} was already flushed",
                self.segment_info.name
            )));
        }
        self.reserve_one_doc()?;
        self.doc_state.doc_id = self.num_docs_in_ram as DocId;

        // Even on error, the document is still added (but marked
        // deleted), so we don't need to un-reserve at that point.
        let res = self.consumer.process_document(&mut self.doc_state, doc);
        self.num_docs_in_ram += 1;
        if let Err(ref e) = res {
            error!(
                "DWPT: process document {} failed: {}",
                self.doc_state.doc_id, e
            );
            if self.doc_state.is_aborting() {
                self.abort();
            } else {
                // mark document as deleted
                self.deleted_docs.insert(self.doc_state.doc_id);
            }
        }
        res
    }

    /// Flushes all buffered documents into a new segment. Returns `None` if
    /// the session was aborted or holds no documents.
    pub fn flush(&mut self) -> Result<Option<FlushedSegment>> {
        if self.aborted {
            debug!("DWPT: flush: skip because aborting is set.");
            return Ok(None);
        }
        if self.num_docs_in_ram == 0 {
            return Ok(None);
        }

        self.segment_info.set_max_doc(self.num_docs_in_ram as i32)?;
        let ctx = IOContext::Flush(FlushInfo::new(
            self.num_docs_in_ram,
            self.bytes_used().max(0) as u64,
        ));
        let mut flush_state = SegmentWriteState::new(
            Arc::clone(&self.directory) as Arc<dyn Directory>,
            self.segment_info.clone(),
            FieldInfos::default(),
            ctx,
            String::new(),
        );
        // Apply delete-by-docID now (delete-by-docID only
        // happens when an error is hit processing that
        // doc, eg if analyzer has some problem w/ the text):
        flush_state.del_count_on_flush = self.deleted_docs.len() as u32;
        flush_state.deleted_docs = self.deleted_docs.clone();

        debug!(
            "DWPT: flush postings as segment '{}' num_docs={}",
            &flush_state.segment_info.name, self.num_docs_in_ram
        );
        match self.do_flush(flush_state) {
            Ok(segment) => Ok(Some(segment)),
            Err(e) => {
                self.abort();
                Err(e)
            }
        }
    }

    fn do_flush(&mut self, mut flush_state: SegmentWriteState) -> Result<FlushedSegment> {
        let t0 = Instant::now();
        self.consumer.flush(&mut flush_state)?;
        self.segment_info
            .set_files(&self.directory.create_files())?;

        debug!(
            "DWPT: flushed segment '{}': {} files, {} deleted docs, took {:?}",
            self.segment_info.name,
            self.segment_info.files().len(),
            flush_state.del_count_on_flush,
            t0.elapsed()
        );
        Ok(FlushedSegment {
            segment_info: self.segment_info.clone(),
            field_infos: flush_state.field_infos,
            deleted_docs: flush_state.deleted_docs,
            del_count: flush_state.del_count_on_flush,
        })
    }

    /// Called if we hit an error at a bad time (when
    /// updating the index files) and must discard all
    /// currently buffered docs.  This resets our state,
    /// discarding any docs added since last flush.
    pub fn abort(&mut self) {
        self.aborted = true;
        debug!("DWPT: now abort segment {}", self.segment_info.name);

        if let Err(e) = self.consumer.abort() {
            warn!("DWPT: indexing chain abort failed: {}", e);
        }
        self.pending_num_docs
            .fetch_sub(i64::from(self.num_docs_in_ram), Ordering::AcqRel);
        self.num_docs_in_ram = 0;
        self.deleted_docs.clear();
        debug!("DWPT: done abort");
    }
}

/// The outcome of a successful session flush.
pub struct FlushedSegment {
    pub segment_info: SegmentInfo,
    pub field_infos: FieldInfos,
    pub deleted_docs: BTreeSet<DocId>,
    pub del_count: u32,
}

impl FlushedSegment {
    pub fn max_doc(&self) -> i32 {
        self.segment_info.max_doc()
    }

    pub fn is_live(&self, doc_id: DocId) -> bool {
        doc_id < self.max_doc() && !self.deleted_docs.contains(&doc_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::codec::doc_values::{DocValuesColumn, PlainDocValuesReader};
    use core::codec::norms::PlainNormsReader;
    use core::codec::postings::PlainFieldsReader;
    use core::codec::stored_fields::{PlainStoredFieldsReader, StoredFieldsReader};
    use core::codec::tests::{FailPoint, TestCodec};
    use core::codec::PlainCodec;
    use core::doc::Field;
    use core::store::directory::RAMDirectory;
    use core::util::{Count, VariantValue};

    use error::ErrorKind;

    fn session<C: Codec>(
        config: IndexWriterConfig<C>,
    ) -> (
        DocumentsWriterPerThread<C>,
        Arc<dyn Directory>,
        Arc<AtomicI64>,
    ) {
        let dir: Arc<dyn Directory> = Arc::new(RAMDirectory::new());
        let pending = Arc::new(AtomicI64::new(0));
        let dwpt = DocumentsWriterPerThread::new(
            "_0",
            Arc::clone(&dir),
            Arc::new(config),
            Arc::new(FieldNumbers::new()),
            Arc::clone(&pending),
            Counter::new(),
        );
        (dwpt, dir, pending)
    }

    fn stored_value(
        reader: &PlainStoredFieldsReader,
        field_infos: &FieldInfos,
        doc_id: DocId,
        name: &str,
    ) -> Option<VariantValue> {
        let number = field_infos.field_info_by_name(name)?.number;
        reader
            .document(doc_id)
            .unwrap()
            .into_iter()
            .find(|v| v.field_number == number)
            .map(|v| v.value)
    }

    #[test]
    fn test_flush_segment() {
        let (mut dwpt, dir, pending) = session(IndexWriterConfig::default());
        dwpt.update_document(&mut [
            Field::new_text("body", "hello world", false),
            Field::new_string("title", "a", true),
            Field::new_numeric_doc_values("rank", 5),
            Field::new_sorted_doc_values("tag", b"x".to_vec()),
        ])
        .unwrap();
        dwpt.update_document(&mut [
            Field::new_text("body", "world", false),
            Field::new_string("title", "b", true),
            Field::new_numeric_doc_values("rank", 7),
        ])
        .unwrap();
        assert_eq!(dwpt.num_docs_in_ram(), 2);
        assert_eq!(pending.load(Ordering::Acquire), 2);
        assert!(dwpt.bytes_used() > 0);

        let segment = dwpt.flush().unwrap().unwrap();
        assert_eq!(segment.max_doc(), 2);
        assert_eq!(segment.del_count, 0);
        let files = segment.segment_info.files();
        for ext in &["fnm", "fdt", "pst", "nvd", "dvd"] {
            assert!(files.contains(&format!("_0.{}", ext)), "missing {}", ext);
        }

        let si = &segment.segment_info;
        let fis = &segment.field_infos;
        assert_eq!(fis.len(), 4);

        let stored = PlainStoredFieldsReader::open(dir.as_ref(), si).unwrap();
        assert_eq!(stored.num_docs(), 2);
        assert_eq!(
            stored_value(&stored, fis, 1, "title"),
            Some(VariantValue::from("b"))
        );
        assert_eq!(stored_value(&stored, fis, 0, "body"), None);

        let postings = PlainFieldsReader::open(dir.as_ref(), si, fis).unwrap();
        let body = postings.terms("body").unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].term, b"hello".to_vec());
        assert_eq!(body[1].term, b"world".to_vec());
        let docs: Vec<DocId> = body[1].docs.iter().map(|d| d.doc_id).collect();
        assert_eq!(docs, vec![0, 1]);

        let norms = PlainNormsReader::open(dir.as_ref(), si, fis).unwrap();
        let body_norms = norms.norms("body").unwrap();
        assert!(body_norms[0] != 0 && body_norms[1] != 0);
        assert!(norms.norms("title").is_none());

        let doc_values = PlainDocValuesReader::open(dir.as_ref(), si, fis).unwrap();
        assert_eq!(
            doc_values.column("rank"),
            Some(&DocValuesColumn::Numeric(vec![Some(5), Some(7)]))
        );
        assert_eq!(
            doc_values.column("tag"),
            Some(&DocValuesColumn::Sorted {
                values: vec![b"x".to_vec()],
                doc_to_ord: vec![0, -1],
            })
        );
    }

    #[test]
    fn test_field_capabilities_grow() {
        let (mut dwpt, dir, _) = session(IndexWriterConfig::default());
        dwpt.update_document(&mut [Field::new_stored("f", VariantValue::from("kept only"))])
            .unwrap();
        dwpt.update_document(&mut [Field::new_text("f", "now indexed", false)])
            .unwrap();

        let segment = dwpt.flush().unwrap().unwrap();
        let si = &segment.segment_info;
        let fis = &segment.field_infos;
        let fi = fis.field_info_by_name("f").unwrap();
        assert!(fi.is_indexed());
        assert!(fi.has_norms());

        // the first doc keeps its stored value, gets no postings and norm 0
        let stored = PlainStoredFieldsReader::open(dir.as_ref(), si).unwrap();
        assert_eq!(
            stored_value(&stored, fis, 0, "f"),
            Some(VariantValue::from("kept only"))
        );
        let postings = PlainFieldsReader::open(dir.as_ref(), si, fis).unwrap();
        for term in postings.terms("f").unwrap() {
            assert!(term.docs.iter().all(|d| d.doc_id == 1));
        }
        let norms = PlainNormsReader::open(dir.as_ref(), si, fis).unwrap();
        let f_norms = norms.norms("f").unwrap();
        assert_eq!(f_norms[0], 0);
        assert!(f_norms[1] != 0);
    }

    #[test]
    fn test_failed_document_is_deleted() {
        let (mut dwpt, dir, pending) = session(IndexWriterConfig::default());
        dwpt.update_document(&mut [Field::new_numeric_doc_values("rank", 1)])
            .unwrap();
        let err = dwpt
            .update_document(&mut [Field::new_binary_doc_values("rank", b"1".to_vec())])
            .unwrap_err();
        match *err.kind() {
            ErrorKind::IllegalArgument(_) => {}
            ref k => panic!("unexpected error {:?}", k),
        }
        assert!(!dwpt.is_aborted());
        dwpt.update_document(&mut [Field::new_numeric_doc_values("rank", 3)])
            .unwrap();
        assert_eq!(dwpt.num_docs_in_ram(), 3);
        assert_eq!(pending.load(Ordering::Acquire), 3);

        let segment = dwpt.flush().unwrap().unwrap();
        assert_eq!(segment.max_doc(), 3);
        assert_eq!(segment.del_count, 1);
        assert!(segment.deleted_docs.contains(&1));
        assert!(segment.is_live(0) && !segment.is_live(1) && segment.is_live(2));

        let stored =
            PlainStoredFieldsReader::open(dir.as_ref(), &segment.segment_info).unwrap();
        assert_eq!(stored.num_docs(), 3);
        let doc_values = PlainDocValuesReader::open(
            dir.as_ref(),
            &segment.segment_info,
            &segment.field_infos,
        )
        .unwrap();
        assert_eq!(
            doc_values.column("rank"),
            Some(&DocValuesColumn::Numeric(vec![Some(1), None, Some(3)]))
        );
    }

    #[test]
    fn test_aborting_error_aborts_session() {
        let config = IndexWriterConfig::new(Arc::new(TestCodec::default()));
        let (mut dwpt, _, pending) = session(config);
        dwpt.update_document(&mut [Field::new_stored("note", VariantValue::Int(1))])
            .unwrap();

        dwpt.codec()
            .stored_fields_log()
            .fail_at(Some(FailPoint::WriteField));
        assert!(dwpt
            .update_document(&mut [Field::new_stored("note", VariantValue::Int(2))])
            .is_err());
        assert!(dwpt.is_aborted());
        assert_eq!(dwpt.num_docs_in_ram(), 0);
        assert_eq!(pending.load(Ordering::Acquire), 0);
        assert_eq!(dwpt.bytes_used(), 0);

        let err = dwpt
            .update_document(&mut [Field::new_stored("note", VariantValue::Int(3))])
            .unwrap_err();
        match *err.kind() {
            ErrorKind::IllegalState(_) => {}
            ref k => panic!("unexpected error {:?}", k),
        }
        assert!(dwpt.flush().unwrap().is_none());
    }

    #[test]
    fn test_sessions_share_byte_counter() {
        let config = Arc::new(IndexWriterConfig::default());
        let field_numbers = Arc::new(FieldNumbers::new());
        let pending = Arc::new(AtomicI64::new(0));
        let shared = Counter::new();
        let new_session = |name: &str| {
            DocumentsWriterPerThread::new(
                name,
                Arc::new(RAMDirectory::new()),
                Arc::clone(&config),
                Arc::clone(&field_numbers),
                Arc::clone(&pending),
                shared.shallow_copy(),
            )
        };
        let mut first = new_session("_0");
        let mut second = new_session("_1");

        first
            .update_document(&mut [Field::new_text("body", "hello world", false)])
            .unwrap();
        second
            .update_document(&mut [Field::new_text("body", "another document", false)])
            .unwrap();
        let second_bytes = second.bytes_used();
        assert!(first.bytes_used() > 0 && second_bytes > 0);
        assert_eq!(shared.get(), first.bytes_used() + second_bytes);

        first.abort();
        assert_eq!(first.bytes_used(), 0);
        assert_eq!(second.bytes_used(), second_bytes);
        assert_eq!(shared.get(), second_bytes);
    }

    #[test]
    fn test_documents_rejected_after_flush() {
        let (mut dwpt, _, _) = session(IndexWriterConfig::default());
        dwpt.update_document(&mut [Field::new_text("body", "a", false)])
            .unwrap();
        assert!(dwpt.flush().unwrap().is_some());
        let err = dwpt
            .update_document(&mut [Field::new_text("body", "b", false)])
            .unwrap_err();
        match *err.kind() {
            ErrorKind::IllegalState(ref msg) => assert!(msg.contains("already flushed")),
            ref k => panic!("unexpected error {:?}", k),
        }
    }

    #[test]
    fn test_empty_session_flushes_nothing() {
        let (mut dwpt, dir, _) = session(IndexWriterConfig::new(Arc::new(PlainCodec::default())));
        assert!(dwpt.flush().unwrap().is_none());
        assert!(dir.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_need_flush_by_doc_count() {
        let config = IndexWriterConfig::default()
            .set_max_buffered_docs(Some(2))
            .set_ram_buffer_size_mb(0.0);
        let (mut dwpt, _, _) = session(config);
        dwpt.update_document(&mut [Field::new_text("body", "a", false)])
            .unwrap();
        assert!(!dwpt.need_flush());
        dwpt.update_document(&mut [Field::new_text("body", "b", false)])
            .unwrap();
        assert!(dwpt.need_flush());
    }

    #[test]
    fn test_reserve_doc_limit() {
        let (mut dwpt, _, pending) = session(IndexWriterConfig::default());
        pending.store(i64::from(INDEX_MAX_DOCS), Ordering::Release);
        let err = dwpt
            .update_document(&mut [Field::new_text("body", "a", false)])
            .unwrap_err();
        match *err.kind() {
            ErrorKind::IllegalArgument(ref msg) => assert!(msg.contains("cannot exceed")),
            ref k => panic!("unexpected error {:?}", k),
        }
        assert_eq!(dwpt.num_docs_in_ram(), 0);
        assert_eq!(pending.load(Ordering::Acquire), i64::from(INDEX_MAX_DOCS));
    }
}
