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

use std::collections::HashSet;
use std::fmt;

use core::store::io::{ByteArrayDataInput, IndexOutput};
use core::store::IOContext;
use error::Result;

/// A Directory is a flat list of files.
///
/// Files may be written once, when they are created.  Once a file is created it may only
/// be read back, or deleted.
pub trait Directory: fmt::Display + Send + Sync {
    /// Returns the names of all files in the directory, sorted.
    fn list_all(&self) -> Result<Vec<String>>;

    fn file_length(&self, name: &str) -> Result<i64>;

    /// Creates a new, empty file in the directory with the given name.
    /// Returns a stream writing this file.
    fn create_output(&self, name: &str, context: &IOContext) -> Result<Box<dyn IndexOutput>>;

    /// Reads the full content of a finished file.
    fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    fn open_input(&self, name: &str) -> Result<ByteArrayDataInput> {
        Ok(ByteArrayDataInput::new(self.read_file(name)?))
    }

    fn delete_file(&self, name: &str) -> Result<()>;

    /// Files created through this directory, for wrappers that track them.
    fn create_files(&self) -> HashSet<String> {
        HashSet::new()
    }
}
