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

use core::analysis::{Analyzer, WhitespaceAnalyzer};
use core::codec::{Codec, PlainCodec};
use core::search::similarity::{BM25Similarity, Similarity};

use std::sync::Arc;

/// Default value is 16 MB (which means flush when buffered docs consume
/// approximately 16 MB RAM).
pub const DEFAULT_RAM_BUFFER_SIZE_MB: f64 = 16.0;

/// Default limit for a single stored string or binary value.
pub const DEFAULT_MAX_STORED_FIELD_LENGTH: usize = 16 * 1024 * 1024;

/// Holds all the configuration shared by the indexing sessions of one
/// writer. Changes made after a session was created are not seen by it.
///
/// All setters consume and return the config so settings can be chained:
///
/// ```ignore
/// let config = IndexWriterConfig::default()
///     .set_max_buffered_docs(Some(1000))
///     .set_ram_buffer_size_mb(64.0);
/// ```
pub struct IndexWriterConfig<C: Codec = PlainCodec> {
    pub codec: Arc<C>,
    pub analyzer: Arc<dyn Analyzer>,
    /// Default similarity captured by every field when it is first seen.
    pub similarity: Arc<dyn Similarity>,
    pub ram_buffer_size_mb: f64,
    pub max_buffered_docs: Option<u32>,
    pub max_stored_field_length: usize,
}

impl Default for IndexWriterConfig<PlainCodec> {
    fn default() -> Self {
        Self::new(Arc::new(PlainCodec::default()))
    }
}

impl<C: Codec> IndexWriterConfig<C> {
    pub fn new(codec: Arc<C>) -> Self {
        IndexWriterConfig {
            codec,
            analyzer: Arc::new(WhitespaceAnalyzer::new()),
            similarity: Arc::new(BM25Similarity::default()),
            ram_buffer_size_mb: DEFAULT_RAM_BUFFER_SIZE_MB,
            max_buffered_docs: None,
            max_stored_field_length: DEFAULT_MAX_STORED_FIELD_LENGTH,
        }
    }

    pub fn set_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn set_similarity(mut self, similarity: Arc<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn set_ram_buffer_size_mb(mut self, ram_buffer_size_mb: f64) -> Self {
        self.ram_buffer_size_mb = ram_buffer_size_mb;
        self
    }

    pub fn set_max_buffered_docs(mut self, max_buffered_docs: Option<u32>) -> Self {
        self.max_buffered_docs = max_buffered_docs;
        self
    }

    pub fn set_max_stored_field_length(mut self, max_stored_field_length: usize) -> Self {
        self.max_stored_field_length = max_stored_field_length;
        self
    }

    pub fn codec(&self) -> &C {
        self.codec.as_ref()
    }

    pub fn max_buffered_docs(&self) -> u32 {
        self.max_buffered_docs.unwrap_or(0)
    }

    pub fn flush_on_doc_count(&self) -> bool {
        self.max_buffered_docs.is_some()
    }

    pub fn flush_on_ram(&self) -> bool {
        self.ram_buffer_size_mb > 0.0
    }

    /// RAM budget in bytes, 0 if flushing by RAM is disabled.
    pub fn ram_buffer_size_bytes(&self) -> i64 {
        if self.flush_on_ram() {
            (self.ram_buffer_size_mb * 1024.0 * 1024.0) as i64
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexWriterConfig::default();
        assert_eq!(config.codec().name(), "Plain");
        assert!(!config.flush_on_doc_count());
        assert_eq!(config.max_buffered_docs(), 0);
        assert_eq!(config.ram_buffer_size_bytes(), 16 * 1024 * 1024);
        assert_eq!(config.max_stored_field_length, DEFAULT_MAX_STORED_FIELD_LENGTH);
        assert_eq!(config.analyzer.position_increment_gap("body"), 0);
    }

    #[test]
    fn test_chained_setters() {
        let config = IndexWriterConfig::default()
            .set_max_buffered_docs(Some(2))
            .set_ram_buffer_size_mb(0.0)
            .set_max_stored_field_length(8);
        assert!(config.flush_on_doc_count());
        assert_eq!(config.max_buffered_docs(), 2);
        assert!(!config.flush_on_ram());
        assert_eq!(config.ram_buffer_size_bytes(), 0);
        assert_eq!(config.max_stored_field_length, 8);
    }
}
