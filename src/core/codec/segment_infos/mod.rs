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

use core::codec::field_infos::FieldInfos;
use core::store::directory::Directory;
use core::store::IOContext;
use core::util::{id2str, DocId, ID_LENGTH};
use error::ErrorKind::{IllegalArgument, IllegalState};
use error::Result;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Returns a file name that includes the given segment name, suffix and
/// extension: `<segment>[_<suffix>][.<ext>]`.
pub fn segment_file_name(name: &str, suffix: &str, ext: &str) -> String {
    if !ext.is_empty() || !suffix.is_empty() {
        debug_assert!(!ext.starts_with('.'));
        let mut filename = String::with_capacity(name.len() + 2 + suffix.len() + ext.len());
        filename.push_str(name);
        if !suffix.is_empty() {
            filename.push('_');
            filename.push_str(suffix);
        }
        if !ext.is_empty() {
            filename.push('.');
            filename.push_str(ext);
        }
        filename
    } else {
        String::from(name)
    }
}

/// Strips the segment name out of the given file name.
pub fn strip_segment_name(name: &str) -> &str {
    let idx = match name.get(1..).and_then(|rest| rest.find('_')) {
        Some(i) => Some(i + 1),
        None => name.find('.'),
    };
    match idx {
        Some(i) => &name[i..],
        None => name,
    }
}

/// Information about a segment such as its name, directory, and files related
/// to the segment.
#[derive(Clone, Debug)]
pub struct SegmentInfo {
    pub name: String,
    pub max_doc: i32,
    pub id: [u8; ID_LENGTH],
    pub codec_name: String,
    pub diagnostics: HashMap<String, String>,
    set_files: HashSet<String>,
}

impl SegmentInfo {
    pub fn new(name: &str, max_doc: i32, id: [u8; ID_LENGTH], codec_name: &str) -> SegmentInfo {
        SegmentInfo {
            name: String::from(name),
            max_doc,
            id,
            codec_name: codec_name.to_string(),
            diagnostics: HashMap::new(),
            set_files: HashSet::new(),
        }
    }

    pub fn max_doc(&self) -> i32 {
        debug_assert!(self.max_doc >= 0);
        self.max_doc
    }

    /// False until the segment was flushed.
    pub fn is_max_doc_set(&self) -> bool {
        self.max_doc != -1
    }

    pub fn set_max_doc(&mut self, max_doc: i32) -> Result<()> {
        if self.is_max_doc_set() {
            bail!(IllegalState("max_doc was already set".into()));
        }
        self.max_doc = max_doc;
        Ok(())
    }

    pub fn get_id(&self) -> &[u8] {
        &self.id
    }

    /// Return all files referenced by this SegmentInfo.
    pub fn files(&self) -> &HashSet<String> {
        &self.set_files
    }

    pub fn set_files(&mut self, files: &HashSet<String>) -> Result<()> {
        self.set_files = HashSet::with_capacity(files.len());
        self.add_files(files)
    }

    pub fn add_file(&mut self, file: &str) -> Result<()> {
        self.check_file_name(file)?;
        let file = self.named_for_this_segment(file);
        self.set_files.insert(file);
        Ok(())
    }

    pub fn add_files(&mut self, files: &HashSet<String>) -> Result<()> {
        for f in files {
            self.check_file_name(f)?;
        }
        for f in files {
            let file = self.named_for_this_segment(f);
            self.set_files.insert(file);
        }
        Ok(())
    }

    // codec files look like `_<segment>[_suffix].<ext>`
    fn check_file_name(&self, file: &str) -> Result<()> {
        let valid = file.starts_with('_')
            && file.contains('.')
            && file
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !valid {
            bail!(IllegalArgument(format!("invalid codec file_name '{}'", file)));
        }
        if file.to_lowercase().ends_with(".tmp") {
            bail!(IllegalArgument(
                "invalid codec file_name, can't end with .tmp extension".into()
            ));
        }
        Ok(())
    }

    fn named_for_this_segment(&self, file: &str) -> String {
        let mut name = self.name.clone();
        name.push_str(strip_segment_name(file));
        name
    }
}

impl fmt::Display for SegmentInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}(codec={}):C{} id={}",
            self.name,
            self.codec_name,
            self.max_doc,
            id2str(&self.id)
        )
    }
}

/// Holder class for common parameters used while writing a segment.
pub struct SegmentWriteState {
    /// `Directory` where this segment will be written to.
    pub directory: Arc<dyn Directory>,

    pub segment_info: SegmentInfo,

    /// `FieldInfos` describing all fields in this segment.
    pub field_infos: FieldInfos,

    /// Number of deleted documents set while flushing the segment.
    pub del_count_on_flush: u32,

    /// Documents that failed while being indexed; they consumed a doc id but
    /// must be treated as deleted.
    pub deleted_docs: BTreeSet<DocId>,

    /// Unique suffix for any files written for this segment.
    pub segment_suffix: String,

    pub context: IOContext,
}

impl SegmentWriteState {
    pub fn new(
        directory: Arc<dyn Directory>,
        segment_info: SegmentInfo,
        field_infos: FieldInfos,
        context: IOContext,
        segment_suffix: String,
    ) -> Self {
        SegmentWriteState {
            directory,
            segment_info,
            field_infos,
            del_count_on_flush: 0,
            deleted_docs: BTreeSet::new(),
            segment_suffix,
            context,
        }
    }

    pub fn file_name(&self, ext: &str) -> String {
        segment_file_name(&self.segment_info.name, &self.segment_suffix, ext)
    }
}
