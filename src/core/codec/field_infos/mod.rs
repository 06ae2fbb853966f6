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

mod field_infos_format;

pub use self::field_infos_format::*;

use error::ErrorKind::{IllegalArgument, IllegalState};
use error::Result;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::result;
use std::sync::{Arc, Mutex};

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use core::doc::{DocValuesType, IndexOptions};

/// Describes one field of a segment: whether it is indexed and how, whether
/// it stores term vectors, payloads, norms and which doc values it carries.
///
/// The capabilities only ever grow while a segment is written: term vectors,
/// payloads and omitted norms are sticky, the doc values kind is set once.
#[derive(Clone, Debug, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub number: u32,
    pub doc_values_type: DocValuesType,
    pub has_store_term_vector: bool,
    pub omit_norms: bool,
    pub index_options: IndexOptions,
    pub has_store_payloads: bool,
    pub attributes: HashMap<String, String>,
}

impl FieldInfo {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        number: u32,
        store_term_vector: bool,
        omit_norms: bool,
        store_payloads: bool,
        index_options: IndexOptions,
        doc_values_type: DocValuesType,
        attributes: HashMap<String, String>,
    ) -> Result<FieldInfo> {
        let info = FieldInfo {
            name,
            number,
            doc_values_type,
            has_store_term_vector: store_term_vector,
            omit_norms,
            index_options,
            has_store_payloads: store_payloads,
            attributes,
        };

        info.check_consistency()?;
        Ok(info)
    }

    pub fn check_consistency(&self) -> Result<()> {
        if self.index_options == IndexOptions::Null {
            if self.has_store_term_vector {
                bail!(IllegalState(format!(
                    "non-indexed field '{}' cannot store term vectors",
                    &self.name
                )));
            }
            if self.has_store_payloads {
                bail!(IllegalState(format!(
                    "non-indexed field '{}' cannot store payloads",
                    &self.name
                )));
            }
        } else if self.index_options < IndexOptions::DocsAndFreqsAndPositions
            && self.has_store_payloads
        {
            bail!(IllegalState(format!(
                "indexed field '{}' cannot have payloads without positions",
                &self.name
            )));
        }

        Ok(())
    }

    pub fn set_doc_values_type(&mut self, dv_type: DocValuesType) -> Result<()> {
        if !self.doc_values_type.null() && !dv_type.null() && self.doc_values_type != dv_type {
            bail!(IllegalArgument(format!(
                "cannot change DocValues type from {:?} to {:?} for field \"{}\"",
                self.doc_values_type, dv_type, self.name
            )));
        }
        if !dv_type.null() {
            self.doc_values_type = dv_type;
        }
        Ok(())
    }

    pub fn set_store_payloads(&mut self) {
        if self.index_options >= IndexOptions::DocsAndFreqsAndPositions {
            self.has_store_payloads = true;
        }
        debug_assert!(self.check_consistency().is_ok());
    }

    /// Index options may be set once from `Null` and afterwards only downgraded.
    pub fn set_index_options(&mut self, new_options: IndexOptions) {
        if self.index_options != new_options {
            if self.index_options == IndexOptions::Null {
                self.index_options = new_options;
            } else if new_options != IndexOptions::Null && self.index_options > new_options {
                // downgrade
                self.index_options = new_options;
            }
        }

        if self.index_options < IndexOptions::DocsAndFreqsAndPositions {
            // cannot store payloads if we don't store positions:
            self.has_store_payloads = false;
        }
    }

    /// Once norms are omitted for an indexed field they stay omitted.
    pub fn set_omit_norms(&mut self) {
        if self.index_options != IndexOptions::Null {
            self.omit_norms = true;
        }
    }

    pub fn set_store_term_vectors(&mut self) {
        if self.index_options != IndexOptions::Null {
            self.has_store_term_vector = true;
        }
    }

    pub fn has_norms(&self) -> bool {
        self.index_options != IndexOptions::Null && !self.omit_norms
    }

    pub fn is_indexed(&self) -> bool {
        self.index_options != IndexOptions::Null
    }

    pub fn has_doc_values(&self) -> bool {
        !self.doc_values_type.null()
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn put_attribute(&mut self, key: String, value: String) -> Option<String> {
        self.attributes.insert(key, value)
    }
}

impl fmt::Display for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Ok(s) = ::serde_json::to_string_pretty(self) {
            write!(f, "{}", s)?;
        }

        Ok(())
    }
}

/// Tracks the number and position / offset parameters of terms being added
/// to the index for one field of one document. The information collected here
/// is also used to calculate the normalization factor for the field.
#[derive(Debug)]
pub struct FieldInvertState {
    pub name: String,
    pub position: i32,
    pub length: i32,
    pub num_overlap: i32,
    pub offset: usize,
    pub max_term_frequency: u32,
    pub unique_term_count: u32,
    pub boost: f32,

    // we must track these across field instances (multi-valued case)
    pub last_start_offset: i32,
    pub last_position: i32,
}

impl FieldInvertState {
    pub fn new(name: String) -> Self {
        FieldInvertState {
            name,
            position: 0,
            length: 0,
            num_overlap: 0,
            offset: 0,
            max_term_frequency: 0,
            unique_term_count: 0,
            boost: 1.0f32,
            last_start_offset: 0,
            last_position: 0,
        }
    }

    /// Re-initialize the state for the first occurrence of the field in a document.
    pub fn reset(&mut self) {
        self.position = -1;
        self.length = 0;
        self.num_overlap = 0;
        self.offset = 0;
        self.max_term_frequency = 0;
        self.unique_term_count = 0;
        self.boost = 1.0f32;
        self.last_position = 0;
        self.last_start_offset = 0;
    }
}

/// Collection of `FieldInfo`s (accessible by number or by name).
#[derive(Clone, Debug, Default)]
pub struct FieldInfos {
    pub has_freq: bool,
    pub has_prox: bool,
    pub has_payloads: bool,
    pub has_offsets: bool,
    pub has_vectors: bool,
    pub has_norms: bool,
    pub has_doc_values: bool,

    pub by_number: BTreeMap<u32, Arc<FieldInfo>>,
    pub by_name: HashMap<String, Arc<FieldInfo>>,
}

impl Serialize for FieldInfos {
    fn serialize<S>(&self, serializer: S) -> result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("FieldInfos", 8)?;
        s.serialize_field("has_freq", &self.has_freq)?;
        s.serialize_field("has_prox", &self.has_prox)?;
        s.serialize_field("has_payloads", &self.has_payloads)?;
        s.serialize_field("has_offsets", &self.has_offsets)?;
        s.serialize_field("has_vectors", &self.has_vectors)?;
        s.serialize_field("has_norms", &self.has_norms)?;
        s.serialize_field("has_doc_values", &self.has_doc_values)?;

        let fields: Vec<&FieldInfo> = self.iter().collect();
        s.serialize_field("fields", &fields)?;
        s.end()
    }
}

impl fmt::Display for FieldInfos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Ok(s) = ::serde_json::to_string_pretty(self) {
            write!(f, "{}", s)?;
        }

        Ok(())
    }
}

impl FieldInfos {
    pub fn new(infos: Vec<FieldInfo>) -> Result<FieldInfos> {
        let mut field_infos = FieldInfos::default();

        for info in infos {
            let info = Arc::new(info);
            let number = info.number;

            field_infos.has_vectors |= info.has_store_term_vector;
            field_infos.has_prox |= info.index_options.has_positions();
            field_infos.has_freq |= info.index_options.has_freqs();
            field_infos.has_offsets |= info.index_options.has_offsets();
            field_infos.has_norms |= info.has_norms();
            field_infos.has_doc_values |= info.has_doc_values();
            field_infos.has_payloads |= info.has_store_payloads;

            if let Some(previous) = field_infos.by_number.insert(number, Arc::clone(&info)) {
                bail!(IllegalArgument(format!(
                    "duplicated field numbers: {} and {} have: {}",
                    previous.name, &info.name, number
                )));
            }

            let name = info.name.clone();
            if let Some(previous) = field_infos.by_name.insert(name.clone(), info) {
                bail!(IllegalArgument(format!(
                    "duplicated field names: {} and {} have: {}",
                    previous.number, number, &name
                )));
            }
        }
        Ok(field_infos)
    }

    pub fn field_info_by_number(&self, field_number: u32) -> Option<&FieldInfo> {
        self.by_number.get(&field_number).map(Arc::as_ref)
    }

    pub fn field_info_by_name(&self, field_name: &str) -> Option<&FieldInfo> {
        self.by_name.get(field_name).map(Arc::as_ref)
    }

    /// Iterates the fields in field number order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldInfo> {
        self.by_number.values().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-segment, in-RAM schema that is built up while documents are added.
pub struct FieldInfosBuilder<T: AsRef<FieldNumbers>> {
    pub by_name: HashMap<String, FieldInfo>,
    pub global_field_numbers: T,
}

impl Default for FieldInfosBuilder<FieldNumbersRef> {
    fn default() -> Self {
        Self::new(FieldNumbersRef::default())
    }
}

impl<T: AsRef<FieldNumbers>> FieldInfosBuilder<T> {
    pub fn new(global_field_numbers: T) -> Self {
        FieldInfosBuilder {
            by_name: HashMap::new(),
            global_field_numbers,
        }
    }

    /// Create a new field, or return existing one.
    pub fn get_or_add(&mut self, name: &str) -> Result<&mut FieldInfo> {
        if !self.by_name.contains_key(name) {
            // This field wasn't yet added to this in-RAM segment's FieldInfo, so
            // now we get a global number for this field. If the field was seen
            // before then we'll get the same name and number, else we'll
            // allocate a new one:
            let field_number = self.global_field_numbers.as_ref().add_or_get(
                name,
                0,
                DocValuesType::Null,
            )?;
            let fi = FieldInfo::new(
                name.to_string(),
                field_number,
                false,
                false,
                false,
                IndexOptions::Null,
                DocValuesType::Null,
                HashMap::new(),
            )?;
            self.by_name.insert(name.to_string(), fi);
        }
        self.get_mut(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldInfo> {
        self.by_name.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut FieldInfo> {
        match self.by_name.get_mut(name) {
            Some(fi) => Ok(fi),
            None => bail!(IllegalState(format!("unknown field '{}'", name))),
        }
    }

    /// Records the doc values kind of a field. The first declaration for a name
    /// goes through the global numbers so that conflicting kinds are rejected
    /// across segments too.
    pub fn set_doc_values_type(&mut self, name: &str, dv_type: DocValuesType) -> Result<()> {
        let global = self.global_field_numbers.as_ref();
        let fi = match self.by_name.get_mut(name) {
            Some(fi) => fi,
            None => bail!(IllegalState(format!("unknown field '{}'", name))),
        };
        if dv_type.null() {
            return Ok(());
        }
        if fi.doc_values_type.null() {
            global.set_doc_values_type(fi.number, name, dv_type)?;
        }
        fi.set_doc_values_type(dv_type)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn finish(&self) -> Result<FieldInfos> {
        let infos: Vec<FieldInfo> = self.by_name.values().cloned().collect();
        FieldInfos::new(infos)
    }
}

/// Global name to number mapping, shared by every session writing to one
/// index. All mutation happens under one mutex.
pub struct FieldNumbers {
    inner: Mutex<FieldNumbersInner>,
}

impl FieldNumbers {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_or_get(
        &self,
        field_name: &str,
        preferred_field_number: u32,
        dv_type: DocValuesType,
    ) -> Result<u32> {
        self.inner
            .lock()?
            .add_or_get(field_name, preferred_field_number, dv_type)
    }

    pub fn set_doc_values_type(
        &self,
        number: u32,
        name: &str,
        dv_type: DocValuesType,
    ) -> Result<()> {
        self.inner
            .lock()?
            .set_doc_values_type(number, name, dv_type)
    }

    pub fn get_doc_values_type(&self, field: &str) -> Result<Option<DocValuesType>> {
        Ok(self.inner.lock()?.get_doc_values_type(field))
    }
}

impl Default for FieldNumbers {
    fn default() -> Self {
        let inner = Mutex::new(FieldNumbersInner::new());
        FieldNumbers { inner }
    }
}

#[derive(Clone, Copy)]
struct GlobalField {
    number: u32,
    // a field never changes its doc values kind, even across sessions
    doc_values_type: DocValuesType,
}

#[derive(Default)]
struct FieldNumbersInner {
    fields: HashMap<String, GlobalField>,
    numbers: HashMap<u32, String>,
    next_unassigned: u32,
}

impl FieldNumbersInner {
    fn new() -> Self {
        Default::default()
    }

    fn conflicting_kind(
        name: &str,
        current: DocValuesType,
        requested: DocValuesType,
    ) -> Result<()> {
        if !current.null() && !requested.null() && current != requested {
            bail!(IllegalArgument(format!(
                "cannot change DocValues type from {:?} to {:?} for field '{}'",
                current, requested, name
            )));
        }
        Ok(())
    }

    /// Number of `field_name`, assigning `preferred` when the name is new and the
    /// number is still free, else the lowest free number.
    fn add_or_get(
        &mut self,
        field_name: &str,
        preferred: u32,
        dv_type: DocValuesType,
    ) -> Result<u32> {
        if let Some(field) = self.fields.get_mut(field_name) {
            Self::conflicting_kind(field_name, field.doc_values_type, dv_type)?;
            if field.doc_values_type.null() {
                field.doc_values_type = dv_type;
            }
            return Ok(field.number);
        }

        let number = if self.numbers.contains_key(&preferred) {
            while self.numbers.contains_key(&self.next_unassigned) {
                self.next_unassigned += 1;
            }
            self.next_unassigned
        } else {
            preferred
        };
        self.numbers.insert(number, field_name.to_string());
        self.fields.insert(
            field_name.to_string(),
            GlobalField {
                number,
                doc_values_type: dv_type,
            },
        );
        Ok(number)
    }

    fn verify_consistent(&self, number: u32, name: &str, dv_type: DocValuesType) -> Result<()> {
        match self.numbers.get(&number) {
            Some(existing) if existing != name => bail!(IllegalArgument(format!(
                "field number {} is already mapped to field name '{}' not '{}'",
                number, existing, name
            ))),
            _ => {}
        }
        if let Some(field) = self.fields.get(name) {
            if field.number != number {
                bail!(IllegalArgument(format!(
                    "field name {} is already mapped to field number '{}' not '{}'",
                    name, field.number, number
                )));
            }
            Self::conflicting_kind(name, field.doc_values_type, dv_type)?;
        }
        Ok(())
    }

    fn set_doc_values_type(
        &mut self,
        number: u32,
        name: &str,
        dv_type: DocValuesType,
    ) -> Result<()> {
        self.verify_consistent(number, name, dv_type)?;
        match self.fields.get_mut(name) {
            Some(field) => field.doc_values_type = dv_type,
            None => bail!(IllegalState(format!("unknown field '{}'", name))),
        }
        Ok(())
    }

    fn get_doc_values_type(&self, field_name: &str) -> Option<DocValuesType> {
        self.fields.get(field_name).map(|f| f.doc_values_type)
    }
}

impl AsRef<FieldNumbers> for FieldNumbers {
    fn as_ref(&self) -> &FieldNumbers {
        self
    }
}

#[derive(Clone)]
pub struct FieldNumbersRef {
    field_numbers: Arc<FieldNumbers>,
}

impl Default for FieldNumbersRef {
    fn default() -> Self {
        FieldNumbersRef {
            field_numbers: Arc::new(FieldNumbers::new()),
        }
    }
}

impl FieldNumbersRef {
    pub fn new(field_numbers: Arc<FieldNumbers>) -> Self {
        FieldNumbersRef { field_numbers }
    }
}

impl AsRef<FieldNumbers> for FieldNumbersRef {
    fn as_ref(&self) -> &FieldNumbers {
        self.field_numbers.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, options: IndexOptions) -> FieldInfo {
        FieldInfo::new(
            name.to_string(),
            0,
            false,
            false,
            false,
            options,
            DocValuesType::Null,
            HashMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_index_options_only_downgrade() {
        let mut fi = info("body", IndexOptions::Null);
        fi.set_index_options(IndexOptions::DocsAndFreqsAndPositions);
        assert_eq!(fi.index_options, IndexOptions::DocsAndFreqsAndPositions);
        fi.set_store_payloads();
        assert!(fi.has_store_payloads);

        fi.set_index_options(IndexOptions::DocsAndFreqsAndPositionsAndOffsets);
        assert_eq!(fi.index_options, IndexOptions::DocsAndFreqsAndPositions);

        fi.set_index_options(IndexOptions::Docs);
        assert_eq!(fi.index_options, IndexOptions::Docs);
        assert!(!fi.has_store_payloads);

        fi.set_index_options(IndexOptions::Null);
        assert_eq!(fi.index_options, IndexOptions::Docs);
    }

    #[test]
    fn test_sticky_capabilities() {
        let mut fi = info("title", IndexOptions::Null);
        fi.set_omit_norms();
        fi.set_store_term_vectors();
        assert!(!fi.omit_norms);
        assert!(!fi.has_store_term_vector);

        fi.set_index_options(IndexOptions::DocsAndFreqs);
        fi.set_omit_norms();
        fi.set_store_term_vectors();
        assert!(fi.has_store_term_vector);
        assert!(fi.omit_norms);
        assert!(!fi.has_norms());

        fi.set_index_options(IndexOptions::Docs);
        assert!(fi.has_store_term_vector);
        assert!(fi.omit_norms);

        assert!(fi.set_doc_values_type(DocValuesType::Sorted).is_ok());
        assert!(fi.set_doc_values_type(DocValuesType::Sorted).is_ok());
        assert!(fi.set_doc_values_type(DocValuesType::Numeric).is_err());
    }

    #[test]
    fn test_inconsistent_field_info_rejected() {
        let res = FieldInfo::new(
            "f".into(),
            0,
            true,
            false,
            false,
            IndexOptions::Null,
            DocValuesType::Null,
            HashMap::new(),
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_builder_assigns_global_numbers() {
        let numbers = Arc::new(FieldNumbers::new());
        let mut b1 = FieldInfosBuilder::new(FieldNumbersRef::new(Arc::clone(&numbers)));
        let mut b2 = FieldInfosBuilder::new(FieldNumbersRef::new(Arc::clone(&numbers)));

        assert_eq!(b1.get_or_add("a").unwrap().number, 0);
        assert_eq!(b1.get_or_add("b").unwrap().number, 1);
        assert_eq!(b2.get_or_add("b").unwrap().number, 1);
        assert_eq!(b2.get_or_add("c").unwrap().number, 2);
        assert_eq!(b1.get_or_add("a").unwrap().number, 0);
        assert_eq!(b1.len(), 2);
    }

    #[test]
    fn test_doc_values_conflict_across_builders() {
        let numbers = Arc::new(FieldNumbers::new());
        let mut b1 = FieldInfosBuilder::new(FieldNumbersRef::new(Arc::clone(&numbers)));
        let mut b2 = FieldInfosBuilder::new(FieldNumbersRef::new(Arc::clone(&numbers)));

        b1.get_or_add("price").unwrap();
        b1.set_doc_values_type("price", DocValuesType::Numeric)
            .unwrap();

        b2.get_or_add("price").unwrap();
        let err = b2
            .set_doc_values_type("price", DocValuesType::Binary)
            .unwrap_err();
        match *err.kind() {
            ::error::ErrorKind::IllegalArgument(_) => {}
            ref k => panic!("unexpected error {:?}", k),
        }
        assert_eq!(
            numbers.get_doc_values_type("price").unwrap(),
            Some(DocValuesType::Numeric)
        );
        assert!(b2.get("price").unwrap().doc_values_type.null());
    }

    #[test]
    fn test_field_infos_flags() {
        let mut a = info("a", IndexOptions::DocsAndFreqsAndPositionsAndOffsets);
        a.number = 0;
        let mut b = info("b", IndexOptions::Null);
        b.number = 1;
        b.set_doc_values_type(DocValuesType::Numeric).unwrap();

        let infos = FieldInfos::new(vec![b, a]).unwrap();
        assert!(infos.has_offsets && infos.has_prox && infos.has_freq);
        assert!(infos.has_norms);
        assert!(infos.has_doc_values);
        assert!(!infos.has_vectors);
        let names: Vec<&str> = infos.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let dup = vec![info("x", IndexOptions::Docs), info("y", IndexOptions::Docs)];
        assert!(FieldInfos::new(dup).is_err());
    }
}
