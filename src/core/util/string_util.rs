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

use rand::{thread_rng, Rng};

pub const ID_LENGTH: usize = 16;

pub fn random_id() -> [u8; ID_LENGTH] {
    let mut id = [0u8; ID_LENGTH];
    thread_rng().fill(&mut id);
    id
}

pub fn id2str(id: &[u8]) -> String {
    let strs: Vec<String> = id.iter().map(|b| format!("{:02X}", b)).collect();
    strs.join("")
}
