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

use error::{ErrorKind::IllegalArgument, Result};

/// DocValues types. Note that DocValues is strongly typed, so a
/// field cannot have different types across different documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DocValuesType {
    /// No doc values for this field.
    Null,
    /// A per-document numeric value.
    Numeric,
    /// A per-document [u8]. Values may be larger than 32766 bytes, but different
    /// codecs may enforce their own limits.
    Binary,
    /// A pre-sorted [u8]. Fields with this type only store distinct byte values
    /// and store an additional offset pointer per document to dereference the
    /// shared byte[]. Values must be `<= 32766` bytes.
    Sorted,
    /// A pre-sorted [Number]. Fields with this type store numeric values in sorted
    /// order according to `i64::cmp`.
    SortedNumeric,
    /// A pre-sorted Set<[u8]>. Values must be `<= 32766` bytes.
    SortedSet,
}

impl DocValuesType {
    pub fn null(&self) -> bool {
        match *self {
            DocValuesType::Null => true,
            _ => false,
        }
    }

    pub fn value(&self) -> u8 {
        match *self {
            DocValuesType::Null => 0,
            DocValuesType::Numeric => 1,
            DocValuesType::Binary => 2,
            DocValuesType::Sorted => 3,
            DocValuesType::SortedNumeric => 4,
            DocValuesType::SortedSet => 5,
        }
    }

    pub fn from_value(value: u8) -> Result<DocValuesType> {
        let res = match value {
            0 => DocValuesType::Null,
            1 => DocValuesType::Numeric,
            2 => DocValuesType::Binary,
            3 => DocValuesType::Sorted,
            4 => DocValuesType::SortedNumeric,
            5 => DocValuesType::SortedSet,
            _ => bail!(IllegalArgument(format!("invalid doc values type {}", value))),
        };
        Ok(res)
    }
}

impl Default for DocValuesType {
    fn default() -> DocValuesType {
        DocValuesType::Null
    }
}
