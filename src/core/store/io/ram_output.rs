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

use core::store::io::{DataOutput, IndexOutput};

use error::Result;

use std::io::{self, Write};
use std::sync::{Arc, RwLock};

use flate2::Crc;

/// Bytes of one in-memory file, shared between its writer and its directory.
pub type RAMFile = Arc<RwLock<Vec<u8>>>;

/// A memory-resident `IndexOutput` implementation.
pub struct RAMOutputStream {
    name: String,
    file: RAMFile,
    crc: Crc,
}

impl RAMOutputStream {
    pub fn new(name: &str) -> Self {
        Self::with_file(name, Arc::new(RwLock::new(Vec::new())))
    }

    pub fn with_file(name: &str, file: RAMFile) -> Self {
        RAMOutputStream {
            name: name.to_string(),
            file,
            crc: Crc::new(),
        }
    }

    /// Copy of everything written so far.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.file.read()?.clone())
    }
}

impl Write for RAMOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file
            .write()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned ram file"))?
            .extend_from_slice(buf);
        self.crc.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl DataOutput for RAMOutputStream {}

impl IndexOutput for RAMOutputStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn file_pointer(&self) -> i64 {
        i64::from(self.crc.amount())
    }

    fn checksum(&self) -> Result<i64> {
        Ok((self.crc.sum() as i64) & 0xffff_ffffi64)
    }
}
