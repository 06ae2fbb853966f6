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

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::{Arc, RwLock};

use core::store::directory::Directory;
use core::store::io::{IndexOutput, RAMFile, RAMOutputStream};
use core::store::IOContext;
use error::Result;

/// A memory-resident `Directory`, mostly used for tests and transient segments.
#[derive(Default)]
pub struct RAMDirectory {
    files: RwLock<HashMap<String, RAMFile>>,
}

impl RAMDirectory {
    pub fn new() -> RAMDirectory {
        Default::default()
    }

    fn file(&self, name: &str) -> Result<RAMFile> {
        match self.files.read()?.get(name) {
            Some(f) => Ok(Arc::clone(f)),
            None => Err(io::Error::new(io::ErrorKind::NotFound, name.to_string()).into()),
        }
    }
}

impl Directory for RAMDirectory {
    fn list_all(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.files.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn file_length(&self, name: &str) -> Result<i64> {
        let file = self.file(name)?;
        let len = file.read()?.len();
        Ok(len as i64)
    }

    fn create_output(&self, name: &str, _context: &IOContext) -> Result<Box<dyn IndexOutput>> {
        let mut files = self.files.write()?;
        if files.contains_key(name) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, name.to_string()).into());
        }
        let file: RAMFile = Arc::new(RwLock::new(Vec::new()));
        files.insert(name.to_string(), Arc::clone(&file));
        Ok(Box::new(RAMOutputStream::with_file(name, file)))
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let file = self.file(name)?;
        let bytes = file.read()?.clone();
        Ok(bytes)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        if self.files.write()?.remove(name).is_none() {
            return Err(io::Error::new(io::ErrorKind::NotFound, name.to_string()).into());
        }
        Ok(())
    }
}

impl fmt::Display for RAMDirectory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RAMDirectory")
    }
}
