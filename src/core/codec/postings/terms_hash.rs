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

use core::analysis::Token;
use core::codec::field_infos::{FieldInfo, FieldInvertState};
use core::codec::postings::{
    FieldPostings, FieldsConsumer, FreqProxTermsWriterPerField, PostingsFormat, MAX_TERM_LENGTH,
};
use core::codec::segment_infos::SegmentWriteState;
use core::codec::term_vectors::{TermVectorsConsumer, TermVectorsConsumerPerField};
use core::codec::Codec;
use core::doc::FieldType;
use core::util::{Counter, DocId};

use error::ErrorKind::{IllegalArgument, IllegalState};
use error::Result;

use std::collections::BTreeMap;
use std::sync::Arc;

/// Receives each token produced by the analyzer on each field during
/// indexing and keeps them in per-field buffers. The postings writer is the
/// first in line and forwards to the term vectors consumer behind it.
///
/// Per-field state lives with the caller, which hands it back on every call
/// so that one hash never holds references into another's storage.
pub trait TermsHash {
    type PerField;

    fn add_field(&mut self, field_info: &FieldInfo) -> Self::PerField;

    fn start_document(&mut self) -> Result<()>;

    /// Called once per field occurrence before its tokens. `first` is true
    /// for the first occurrence of the field in the current document.
    /// Returns whether this hash wants to see the tokens.
    fn start_field(
        &mut self,
        per_field: &mut Self::PerField,
        field_type: &FieldType,
        first: bool,
    ) -> Result<bool>;

    /// Called once per inverted token.
    fn add(
        &mut self,
        per_field: &mut Self::PerField,
        field_state: &mut FieldInvertState,
        token: &Token,
        doc_id: DocId,
    ) -> Result<()>;

    /// Called once per field per document, after all occurrences were
    /// inverted.
    fn finish_field(
        &mut self,
        per_field: &mut Self::PerField,
        field_state: &FieldInvertState,
        field_info: &mut FieldInfo,
    ) -> Result<()>;

    fn finish_document(&mut self, doc_id: DocId) -> Result<()>;

    fn flush(
        &mut self,
        fields: BTreeMap<String, &mut Self::PerField>,
        state: &SegmentWriteState,
    ) -> Result<()>;

    fn abort(&mut self) -> Result<()>;
}

/// Buffers postings for every indexed field and writes them through the
/// codec's `PostingsFormat` at flush.
pub struct FreqProxTermsWriter<C: Codec> {
    codec: Arc<C>,
    pub next_terms_hash: TermVectorsConsumer<C>,
    bytes_used: Counter,
}

impl<C: Codec> FreqProxTermsWriter<C> {
    pub fn new(codec: Arc<C>, term_vectors: TermVectorsConsumer<C>, bytes_used: Counter) -> Self {
        FreqProxTermsWriter {
            codec,
            next_terms_hash: term_vectors,
            bytes_used,
        }
    }
}

impl<C: Codec> TermsHash for FreqProxTermsWriter<C> {
    type PerField = FreqProxTermsWriterPerField;

    fn add_field(&mut self, field_info: &FieldInfo) -> FreqProxTermsWriterPerField {
        let next_per_field = self.next_terms_hash.add_field(field_info);
        FreqProxTermsWriterPerField::new(field_info, next_per_field)
    }

    fn start_document(&mut self) -> Result<()> {
        self.next_terms_hash.start_document()
    }

    fn start_field(
        &mut self,
        per_field: &mut FreqProxTermsWriterPerField,
        field_type: &FieldType,
        first: bool,
    ) -> Result<bool> {
        per_field.do_next_call =
            self.next_terms_hash
                .start_field(&mut per_field.next_per_field, field_type, first)?;
        Ok(true)
    }

    fn add(
        &mut self,
        per_field: &mut FreqProxTermsWriterPerField,
        field_state: &mut FieldInvertState,
        token: &Token,
        doc_id: DocId,
    ) -> Result<()> {
        if token.term.len() > MAX_TERM_LENGTH {
            let prefix_len = token.term.len().min(30);
            bail!(IllegalArgument(format!(
                "Document contains at least one immense term in field=\"{}\" (whose UTF8 \
                 encoding is longer than the max length {}), all of which were skipped. Please \
                 correct the analyzer to not produce such terms. The prefix of the first immense \
                 term is: '{:?}...'",
                per_field.field_name,
                MAX_TERM_LENGTH,
                &token.term[..prefix_len]
            )));
        }

        let bytes = per_field.add(field_state, token, doc_id);
        self.bytes_used.add(bytes);
        if per_field.do_next_call {
            self.next_terms_hash
                .add(&mut per_field.next_per_field, field_state, token, doc_id)?;
        }
        Ok(())
    }

    fn finish_field(
        &mut self,
        per_field: &mut FreqProxTermsWriterPerField,
        field_state: &FieldInvertState,
        field_info: &mut FieldInfo,
    ) -> Result<()> {
        self.next_terms_hash
            .finish_field(&mut per_field.next_per_field, field_state, field_info)?;
        per_field.finish(field_state);
        if per_field.saw_payloads {
            field_info.set_store_payloads();
        }
        Ok(())
    }

    fn finish_document(&mut self, doc_id: DocId) -> Result<()> {
        self.next_terms_hash.finish_document(doc_id)
    }

    fn flush(
        &mut self,
        mut fields: BTreeMap<String, &mut FreqProxTermsWriterPerField>,
        state: &SegmentWriteState,
    ) -> Result<()> {
        {
            let next_fields: BTreeMap<String, &mut TermVectorsConsumerPerField> = fields
                .iter_mut()
                .map(|(name, pf)| (name.clone(), &mut pf.next_per_field))
                .collect();
            self.next_terms_hash.flush(next_fields, state)?;
        }

        let mut all_fields = Vec::with_capacity(fields.len());
        for (name, per_field) in &fields {
            if per_field.num_terms() == 0 {
                continue;
            }
            let field_info = match state.field_infos.field_info_by_name(name) {
                Some(fi) => fi,
                None => bail!(IllegalState(format!(
                    "field '{}' has postings but is missing from the field infos",
                    name
                ))),
            };
            all_fields.push(FieldPostings {
                field_info,
                terms: per_field.sorted_terms(),
                sum_total_term_freq: per_field.sum_total_term_freq,
                sum_doc_freq: per_field.sum_doc_freq,
                doc_count: per_field.doc_count,
            });
        }

        debug!(
            "flush postings: segment={} fields={}",
            state.segment_info.name,
            all_fields.len()
        );
        let mut consumer = self.codec.postings_format().fields_consumer(state)?;
        consumer.write(&all_fields)
    }

    fn abort(&mut self) -> Result<()> {
        self.next_terms_hash.abort()
    }
}
