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

pub mod directory;
pub mod io;

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct FlushInfo {
    pub num_docs: u32,
    pub estimated_segment_size: u64,
}

impl FlushInfo {
    pub fn new(num_docs: u32, estimated_segment_size: u64) -> Self {
        FlushInfo {
            num_docs,
            estimated_segment_size,
        }
    }
}

/// Hints the directory about the purpose of an open file.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum IOContext {
    Default,
    Flush(FlushInfo),
    Read(bool),
}

impl Default for IOContext {
    fn default() -> Self {
        IOContext::Default
    }
}

impl IOContext {
    pub const READ: IOContext = IOContext::Read(false);
    pub const READ_ONCE: IOContext = IOContext::Read(true);
}
