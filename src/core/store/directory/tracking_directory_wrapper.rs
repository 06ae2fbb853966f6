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

use core::store::directory::Directory;
use core::store::io::IndexOutput;
use core::store::IOContext;

use error::Result;

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A delegating Directory that records which files were written to and deleted.
pub struct TrackingDirectoryWrapper {
    create_file_names: Mutex<HashSet<String>>,
    pub directory: Arc<dyn Directory>,
}

impl TrackingDirectoryWrapper {
    pub fn new(directory: Arc<dyn Directory>) -> TrackingDirectoryWrapper {
        TrackingDirectoryWrapper {
            create_file_names: Mutex::new(HashSet::new()),
            directory,
        }
    }
}

impl Directory for TrackingDirectoryWrapper {
    fn list_all(&self) -> Result<Vec<String>> {
        self.directory.list_all()
    }

    fn file_length(&self, name: &str) -> Result<i64> {
        self.directory.file_length(name)
    }

    fn create_output(&self, name: &str, ctx: &IOContext) -> Result<Box<dyn IndexOutput>> {
        let output = self.directory.create_output(name, ctx)?;
        self.create_file_names.lock()?.insert(name.to_string());
        Ok(output)
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        self.directory.read_file(name)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.directory.delete_file(name)?;
        self.create_file_names.lock()?.remove(name);
        Ok(())
    }

    fn create_files(&self) -> HashSet<String> {
        match self.create_file_names.lock() {
            Ok(names) => names.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl fmt::Display for TrackingDirectoryWrapper {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TrackingDirectoryWrapper({})", &*self.directory)
    }
}
