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

use core::analysis::{Analyzer, BinaryTokenStream, StringTokenStream, TokenStream};
use core::doc::*;
use core::util::{Numeric, VariantValue};

use error::ErrorKind::IllegalArgument;
use error::Result;

use std::fmt;

/// Represents a single field for indexing.
///
/// The indexing chain consumes a slice of `Fieldable` as a document.
pub trait Fieldable {
    fn name(&self) -> &str;
    fn field_type(&self) -> &FieldType;
    fn boost(&self) -> f32;
    fn field_data(&self) -> Option<&VariantValue>;
    /// Creates the token stream used to invert this field, falling back to
    /// `analyzer` for tokenized text.
    fn token_stream(&mut self, analyzer: &dyn Analyzer) -> Result<Box<dyn TokenStream>>;
    fn binary_value(&self) -> Option<&[u8]>;
    fn string_value(&self) -> Option<&str>;
    fn numeric_value(&self) -> Option<Numeric>;
}

impl<T: Fieldable + ?Sized> Fieldable for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn field_type(&self) -> &FieldType {
        (**self).field_type()
    }
    fn boost(&self) -> f32 {
        (**self).boost()
    }
    fn field_data(&self) -> Option<&VariantValue> {
        (**self).field_data()
    }
    fn token_stream(&mut self, analyzer: &dyn Analyzer) -> Result<Box<dyn TokenStream>> {
        (**self).token_stream(analyzer)
    }
    fn binary_value(&self) -> Option<&[u8]> {
        (**self).binary_value()
    }
    fn string_value(&self) -> Option<&str> {
        (**self).string_value()
    }
    fn numeric_value(&self) -> Option<Numeric> {
        (**self).numeric_value()
    }
}

pub struct Field {
    field_name: String,
    field_type: FieldType,
    field_data: Option<VariantValue>,
    boost: f32,
    token_stream: Option<Box<dyn TokenStream>>,
}

impl Field {
    pub fn new(field_name: &str, field_type: FieldType, field_data: VariantValue) -> Field {
        Field {
            field_name: field_name.to_string(),
            field_type,
            field_data: Some(field_data),
            boost: 1.0_f32,
            token_stream: None,
        }
    }

    /// A field whose tokens are already produced by `token_stream`.
    pub fn with_token_stream(
        field_name: &str,
        field_type: FieldType,
        token_stream: Box<dyn TokenStream>,
    ) -> Field {
        Field {
            field_name: field_name.to_string(),
            field_type,
            field_data: None,
            boost: 1.0_f32,
            token_stream: Some(token_stream),
        }
    }

    pub fn new_text(field_name: &str, value: &str, stored: bool) -> Field {
        let ft = if stored {
            TEXT_FIELD_TYPE_STORED
        } else {
            TEXT_FIELD_TYPE_NOT_STORED
        };
        Field::new(field_name, ft, VariantValue::from(value))
    }

    pub fn new_string(field_name: &str, value: &str, stored: bool) -> Field {
        let ft = if stored {
            STRING_FIELD_TYPE_STORED
        } else {
            STRING_FIELD_TYPE_NOT_STORED
        };
        Field::new(field_name, ft, VariantValue::from(value))
    }

    pub fn new_stored(field_name: &str, value: VariantValue) -> Field {
        Field::new(field_name, STORED_FIELD_TYPE, value)
    }

    pub fn new_numeric_doc_values(field_name: &str, value: i64) -> Field {
        Field::new(
            field_name,
            NUMERIC_DOC_VALUES_FIELD_TYPE,
            VariantValue::Long(value),
        )
    }

    /// Numeric doc values holding the raw bits of a double.
    pub fn new_double_doc_values(field_name: &str, value: f64) -> Field {
        Self::new_numeric_doc_values(field_name, value.to_bits() as i64)
    }

    /// Numeric doc values holding the raw bits of a float.
    pub fn new_float_doc_values(field_name: &str, value: f32) -> Field {
        Self::new_numeric_doc_values(field_name, i64::from(value.to_bits() as i32))
    }

    pub fn new_sorted_numeric_doc_values(field_name: &str, value: i64) -> Field {
        Field::new(
            field_name,
            SORTED_NUMERIC_DOC_VALUES_FIELD_TYPE,
            VariantValue::Long(value),
        )
    }

    pub fn new_binary_doc_values(field_name: &str, value: Vec<u8>) -> Field {
        Field::new(
            field_name,
            BINARY_DOC_VALUES_FIELD_TYPE,
            VariantValue::Binary(value),
        )
    }

    pub fn new_sorted_doc_values(field_name: &str, value: Vec<u8>) -> Field {
        Field::new(
            field_name,
            SORTED_DOC_VALUES_FIELD_TYPE,
            VariantValue::Binary(value),
        )
    }

    pub fn new_sorted_set_doc_values(field_name: &str, value: Vec<u8>) -> Field {
        Field::new(
            field_name,
            SORTED_SET_DOC_VALUES_FIELD_TYPE,
            VariantValue::Binary(value),
        )
    }

    pub fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    pub fn set_field_data(&mut self, data: Option<VariantValue>) {
        self.field_data = data;
    }
}

impl Fieldable for Field {
    fn name(&self) -> &str {
        &self.field_name
    }

    fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn field_data(&self) -> Option<&VariantValue> {
        self.field_data.as_ref()
    }

    // a preset token stream can only be consumed once
    fn token_stream(&mut self, analyzer: &dyn Analyzer) -> Result<Box<dyn TokenStream>> {
        if self.field_type.index_options == IndexOptions::Null {
            bail!(IllegalArgument(format!(
                "field '{}' is not indexed and has no token stream",
                self.field_name
            )));
        }

        if let Some(ts) = self.token_stream.take() {
            return Ok(ts);
        }

        match self.field_data {
            Some(VariantValue::VString(ref s)) if self.field_type.tokenized => {
                analyzer.token_stream(&self.field_name, s)
            }
            Some(VariantValue::VString(ref s)) => Ok(Box::new(StringTokenStream::new(s.clone()))),
            Some(VariantValue::Binary(ref b)) if !self.field_type.tokenized => {
                Ok(Box::new(BinaryTokenStream::new(b.clone())))
            }
            Some(_) if !self.field_type.tokenized => bail!(IllegalArgument(format!(
                "Non-Tokenized field '{}' must have a String or binary value",
                self.field_name
            ))),
            _ => bail!(IllegalArgument(format!(
                "field '{}' must have either a TokenStream or a String value",
                self.field_name
            ))),
        }
    }

    fn binary_value(&self) -> Option<&[u8]> {
        self.field_data.as_ref().and_then(|f| f.get_binary())
    }

    fn string_value(&self) -> Option<&str> {
        self.field_data.as_ref().and_then(|f| f.get_string())
    }

    fn numeric_value(&self) -> Option<Numeric> {
        self.field_data.as_ref().and_then(|f| f.get_numeric())
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.field_name)
            .field("field_type", &self.field_type)
            .field("field_data", &self.field_data)
            .field("boost", &self.boost)
            .field("has_token_stream", &self.token_stream.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::analysis::WhitespaceAnalyzer;

    fn drain(mut ts: Box<dyn TokenStream>) -> Vec<Vec<u8>> {
        ts.reset().unwrap();
        let mut terms = vec![];
        while ts.next_token().unwrap() {
            terms.push(ts.token().term.clone());
        }
        terms
    }

    #[test]
    fn test_token_stream_selection() {
        let analyzer = WhitespaceAnalyzer::new();

        let mut text = Field::new_text("body", "hello big world", false);
        let terms = drain(text.token_stream(&analyzer).unwrap());
        assert_eq!(terms.len(), 3);

        let mut id = Field::new_string("id", "doc 1", true);
        let terms = drain(id.token_stream(&analyzer).unwrap());
        assert_eq!(terms, vec![b"doc 1".to_vec()]);

        let mut stored = Field::new_stored("raw", VariantValue::Int(3));
        assert!(stored.token_stream(&analyzer).is_err());

        let mut ft = STRING_FIELD_TYPE_NOT_STORED;
        ft.tokenized = false;
        let mut num = Field::new("n", ft, VariantValue::Long(5));
        assert!(num.token_stream(&analyzer).is_err());
    }

    #[test]
    fn test_doc_values_constructors() {
        let f = Field::new_double_doc_values("price", 2.5);
        assert_eq!(f.field_type().doc_values_type, DocValuesType::Numeric);
        assert_eq!(
            f.numeric_value().map(|n| n.long_value()),
            Some(2.5f64.to_bits() as i64)
        );
        let f = Field::new_sorted_set_doc_values("tags", b"a".to_vec());
        assert_eq!(f.binary_value(), Some(&b"a"[..]));
        assert!(!f.field_type().indexed());
    }
}
