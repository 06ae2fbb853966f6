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

use core::codec::FieldInvertState;
use core::search::similarity::Similarity;
use core::util::small_float::SmallFloat;

use std::fmt;

/// BM25 Similarity. Introduced in Stephen E. Robertson, Steve Walker,
/// Susan Jones, Micheline Hancock-Beaulieu, and Mike Gatford. Okapi at TREC-3.
///
/// Only the index-time norm encoding lives here; `k1` and `b` are carried so the
/// configured instance describes the full scoring model.
#[derive(Debug, Clone)]
pub struct BM25Similarity {
    k1: f32,
    b: f32,
    discount_overlaps: bool,
}

impl Default for BM25Similarity {
    fn default() -> Self {
        BM25Similarity::new(1.2, 0.75)
    }
}

impl BM25Similarity {
    pub fn new(k1: f32, b: f32) -> BM25Similarity {
        BM25Similarity {
            k1,
            b,
            discount_overlaps: true,
        }
    }

    /// Whether overlap tokens (position increment of zero) are left out of the
    /// field length.
    pub fn set_discount_overlaps(&mut self, discount_overlaps: bool) {
        self.discount_overlaps = discount_overlaps;
    }

    pub fn discount_overlaps(&self) -> bool {
        self.discount_overlaps
    }

    pub fn k1(&self) -> f32 {
        self.k1
    }

    pub fn b(&self) -> f32 {
        self.b
    }

    pub fn encode_norm_value(boost: f32, field_length: i32) -> u8 {
        SmallFloat::float_to_byte315(boost / (field_length as f32).sqrt())
    }

    /// The inverse of `encode_norm_value`, as a squared length.
    pub fn decode_norm_value(b: u8) -> f32 {
        if b == 0 {
            return 0.0;
        }
        let f = SmallFloat::byte315_to_float(b);
        1f32 / (f * f)
    }
}

impl Similarity for BM25Similarity {
    fn compute_norm(&self, state: &FieldInvertState) -> i64 {
        let num_terms = if self.discount_overlaps {
            state.length - state.num_overlap
        } else {
            state.length
        };
        i64::from(BM25Similarity::encode_norm_value(state.boost, num_terms))
    }
}

impl fmt::Display for BM25Similarity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BM25(k1={},b={})", self.k1, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(length: i32, num_overlap: i32, boost: f32) -> FieldInvertState {
        let mut state = FieldInvertState::new("body".to_string());
        state.length = length;
        state.num_overlap = num_overlap;
        state.boost = boost;
        state
    }

    #[test]
    fn test_shorter_fields_get_larger_norms() {
        let sim = BM25Similarity::default();
        let short = sim.compute_norm(&state(1, 0, 1.0));
        let long = sim.compute_norm(&state(100, 0, 1.0));
        assert_eq!(short, 124);
        assert!(short > long);
        assert!((BM25Similarity::decode_norm_value(short as u8) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_overlaps_and_boost() {
        let mut sim = BM25Similarity::default();
        assert_eq!(
            sim.compute_norm(&state(4, 3, 1.0)),
            sim.compute_norm(&state(1, 0, 1.0))
        );
        sim.set_discount_overlaps(false);
        assert_eq!(
            sim.compute_norm(&state(4, 3, 1.0)),
            sim.compute_norm(&state(4, 0, 1.0))
        );
        assert!(sim.compute_norm(&state(4, 0, 4.0)) > sim.compute_norm(&state(4, 0, 1.0)));
        assert_eq!(format!("{}", sim), "BM25(k1=1.2,b=0.75)");
    }
}
