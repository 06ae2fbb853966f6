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

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use core::store::directory::Directory;
use core::store::io::{FSIndexOutput, IndexOutput};
use core::store::IOContext;
use error::ErrorKind::IllegalState;
use error::Result;

/// A straightforward `Directory` implementation on top of `std::fs`.
pub struct FSDirectory {
    pub directory: PathBuf,
}

impl FSDirectory {
    pub fn new<T: AsRef<Path> + ?Sized>(directory: &T) -> Result<FSDirectory> {
        let directory = directory.as_ref();
        if !Path::exists(directory) {
            fs::create_dir_all(directory)?;
        } else if !Path::is_dir(directory) {
            bail!(IllegalState(format!(
                "Path {:?} exists but is not directory",
                directory
            )))
        }

        Ok(FSDirectory {
            directory: From::from(directory),
        })
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }
}

impl Directory for FSDirectory {
    fn list_all(&self) -> Result<Vec<String>> {
        let mut result = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            if let Ok(filename) = entry.file_name().into_string() {
                result.push(filename);
            }
        }
        result.sort();
        Ok(result)
    }

    fn file_length(&self, name: &str) -> Result<i64> {
        let meta = fs::metadata(self.resolve(name))?;
        Ok(meta.len() as i64)
    }

    fn create_output(&self, name: &str, _context: &IOContext) -> Result<Box<dyn IndexOutput>> {
        let output = FSIndexOutput::new(name.to_string(), self.resolve(name))?;
        Ok(Box::new(output))
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.resolve(name))?)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        fs::remove_file(self.resolve(name))?;
        Ok(())
    }
}

impl fmt::Display for FSDirectory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FSDirectory({})", self.directory.display())
    }
}
