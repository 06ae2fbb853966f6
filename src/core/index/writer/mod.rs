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

mod doc_consumer;

pub use self::doc_consumer::*;

mod doc_writer_per_thread;

pub use self::doc_writer_per_thread::*;

mod index_writer_config;

pub use self::index_writer_config::*;

/// Hard limit on the number of documents buffered across all sessions that
/// share one pending-doc counter.
pub const INDEX_MAX_DOCS: i32 = i32::max_value() - 128;

/// Maximum value of the token position in an indexed field.
pub const INDEX_MAX_POSITION: i32 = i32::max_value() - 128;
