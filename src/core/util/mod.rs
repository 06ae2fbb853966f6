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

pub type DocId = i32;

pub mod numeric;

pub use self::numeric::*;

mod variant_value;

pub use self::variant_value::*;

mod counter;
pub use self::counter::*;

pub mod small_float;
pub mod string_util;

pub use self::string_util::{id2str, random_id, ID_LENGTH};
