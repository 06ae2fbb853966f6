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

mod index_options;

pub use self::index_options::*;

mod doc_values_type;

pub use self::doc_values_type::*;

mod field_type;

pub use self::field_type::*;

mod field;

pub use self::field::*;

mod document;

pub use self::document::*;
