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

use core::doc::{Field, Fieldable};

/// An ordered list of fields; several fields may share a name.
#[derive(Debug, Default)]
pub struct Document {
    pub fields: Vec<Field>,
}

impl Document {
    pub fn new() -> Document {
        Default::default()
    }

    pub fn add(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn get_fields<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.name() == name)
    }

    pub fn remove_fields(&mut self, name: &str) {
        self.fields.retain(|f| f.name() != name);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Vec<Field>> for Document {
    fn from(fields: Vec<Field>) -> Self {
        Document { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_valued_fields() {
        let mut doc = Document::new();
        doc.add(Field::new_text("title", "hello world", true));
        doc.add(Field::new_string("id", "1", true));
        doc.add(Field::new_text("title", "again", false));

        assert_eq!(doc.len(), 3);
        assert_eq!(doc.get_fields("title").count(), 2);
        assert_eq!(doc.get_field("id").and_then(|f| f.string_value()), Some("1"));

        doc.remove_fields("title");
        assert_eq!(doc.len(), 1);
    }
}
