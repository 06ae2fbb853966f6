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

mod norms_consumer;

pub use self::norms_consumer::*;

mod norms_reader;

pub use self::norms_reader::*;

mod norm_values_writer;

pub use self::norm_values_writer::*;

use core::codec::field_infos::FieldInfo;
use core::codec::segment_infos::SegmentWriteState;

use error::Result;

pub const DATA_CODEC: &str = "PlainNormsData";
pub const DATA_EXTENSION: &str = "nvd";
pub const METADATA_CODEC: &str = "PlainNormsMetadata";
pub const METADATA_EXTENSION: &str = "nvm";
pub const VERSION_START: i32 = 0;
pub const VERSION_CURRENT: i32 = VERSION_START;

/// Encodes/decodes per-document score normalization values.
pub trait NormsFormat: Send + Sync {
    type Consumer: NormsConsumer;

    /// Returns a `NormsConsumer` to write norms to the index.
    fn norms_consumer(&self, state: &SegmentWriteState) -> Result<Self::Consumer>;
}

/// Abstract API that consumes normalization values.
pub trait NormsConsumer {
    /// Writes normalization values for a field. `values` holds one value
    /// per document of the segment.
    fn add_norms_field(&mut self, field_info: &FieldInfo, values: &[i64]) -> Result<()>;

    /// Called once after all fields were added.
    fn finish(&mut self) -> Result<()>;
}

/// Norms stored as a constant when every document shares a value, otherwise
/// packed at the narrowest of 1, 2, 4 or 8 bytes per document.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlainNormsFormat;

impl NormsFormat for PlainNormsFormat {
    type Consumer = PlainNormsConsumer;

    fn norms_consumer(&self, state: &SegmentWriteState) -> Result<PlainNormsConsumer> {
        PlainNormsConsumer::new(
            state,
            DATA_CODEC,
            DATA_EXTENSION,
            METADATA_CODEC,
            METADATA_EXTENSION,
        )
    }
}
