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

use core::doc::{DocValuesType, IndexOptions};

use std::fmt;

/// Describes how a field is handled by the indexing chain: whether its value
/// is inverted, stored, and which per-document structures it feeds.
#[derive(Clone, PartialEq, Hash, Serialize, Debug)]
pub struct FieldType {
    pub stored: bool,
    pub tokenized: bool,
    pub store_term_vectors: bool,
    pub store_term_vector_offsets: bool,
    pub store_term_vector_positions: bool,
    pub store_term_vector_payloads: bool,
    pub omit_norms: bool,
    pub index_options: IndexOptions,
    pub doc_values_type: DocValuesType,
}

// Nothing indexed, stored or recorded; presets below override from here.
const NO_CAPABILITIES: FieldType = FieldType {
    stored: false,
    tokenized: true,
    store_term_vectors: false,
    store_term_vector_offsets: false,
    store_term_vector_positions: false,
    store_term_vector_payloads: false,
    omit_norms: false,
    index_options: IndexOptions::Null,
    doc_values_type: DocValuesType::Null,
};

impl Default for FieldType {
    fn default() -> Self {
        NO_CAPABILITIES
    }
}

impl FieldType {
    pub fn indexed(&self) -> bool {
        self.index_options != IndexOptions::Null
    }

    pub fn stored(&self) -> bool {
        self.stored
    }

    pub fn tokenized(&self) -> bool {
        self.tokenized
    }

    pub fn store_term_vectors(&self) -> bool {
        self.store_term_vectors
    }

    pub fn store_term_vector_offsets(&self) -> bool {
        self.store_term_vector_offsets
    }

    pub fn store_term_vector_positions(&self) -> bool {
        self.store_term_vector_positions
    }

    pub fn store_term_vector_payloads(&self) -> bool {
        self.store_term_vector_payloads
    }

    pub fn omit_norms(&self) -> bool {
        self.omit_norms
    }

    pub fn index_options(&self) -> IndexOptions {
        self.index_options
    }

    pub fn doc_values_type(&self) -> DocValuesType {
        self.doc_values_type
    }

    /// True when the indexing chain has nothing to do with a field of this type.
    pub fn is_inert(&self) -> bool {
        !self.indexed() && !self.stored && self.doc_values_type.null()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Ok(s) = ::serde_json::to_string_pretty(self) {
            write!(f, "{}", s)?;
        }

        Ok(())
    }
}

/// Indexed, tokenized, not stored.
pub const TEXT_FIELD_TYPE_NOT_STORED: FieldType = FieldType {
    index_options: IndexOptions::DocsAndFreqsAndPositions,
    ..NO_CAPABILITIES
};

/// Indexed, tokenized, stored.
pub const TEXT_FIELD_TYPE_STORED: FieldType = FieldType {
    stored: true,
    ..TEXT_FIELD_TYPE_NOT_STORED
};

/// Indexed as a single token, omits norms, not stored.
pub const STRING_FIELD_TYPE_NOT_STORED: FieldType = FieldType {
    tokenized: false,
    omit_norms: true,
    index_options: IndexOptions::Docs,
    ..NO_CAPABILITIES
};

/// Indexed as a single token, omits norms, stored.
pub const STRING_FIELD_TYPE_STORED: FieldType = FieldType {
    stored: true,
    ..STRING_FIELD_TYPE_NOT_STORED
};

pub const STORED_FIELD_TYPE: FieldType = FieldType {
    stored: true,
    ..NO_CAPABILITIES
};

const DOC_VALUES_ONLY: FieldType = FieldType {
    tokenized: false,
    ..NO_CAPABILITIES
};

pub const NUMERIC_DOC_VALUES_FIELD_TYPE: FieldType = FieldType {
    doc_values_type: DocValuesType::Numeric,
    ..DOC_VALUES_ONLY
};

pub const SORTED_NUMERIC_DOC_VALUES_FIELD_TYPE: FieldType = FieldType {
    doc_values_type: DocValuesType::SortedNumeric,
    ..DOC_VALUES_ONLY
};

pub const BINARY_DOC_VALUES_FIELD_TYPE: FieldType = FieldType {
    doc_values_type: DocValuesType::Binary,
    ..DOC_VALUES_ONLY
};

pub const SORTED_DOC_VALUES_FIELD_TYPE: FieldType = FieldType {
    doc_values_type: DocValuesType::Sorted,
    ..DOC_VALUES_ONLY
};

pub const SORTED_SET_DOC_VALUES_FIELD_TYPE: FieldType = FieldType {
    doc_values_type: DocValuesType::SortedSet,
    ..DOC_VALUES_ONLY
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert!(FieldType::default().is_inert());
        assert!(TEXT_FIELD_TYPE_STORED.indexed() && TEXT_FIELD_TYPE_STORED.tokenized());
        assert!(!TEXT_FIELD_TYPE_NOT_STORED.stored());
        assert!(STRING_FIELD_TYPE_STORED.omit_norms() && !STRING_FIELD_TYPE_STORED.tokenized());
        assert!(STORED_FIELD_TYPE.stored() && !STORED_FIELD_TYPE.indexed());
        assert_eq!(
            SORTED_SET_DOC_VALUES_FIELD_TYPE.doc_values_type(),
            DocValuesType::SortedSet
        );
        assert!(!NUMERIC_DOC_VALUES_FIELD_TYPE.is_inert());
    }
}
