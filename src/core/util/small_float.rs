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

/// Floating point numbers packed into a single byte, used for norms.
///
/// The byte holds `num_mantissa_bits` of mantissa and the remaining bits of
/// exponent, shifted so that `zero_exp` maps to the smallest representable
/// value. Values too small to represent round up to the smallest positive
/// byte, values too large clamp to 255.
pub struct SmallFloat;

impl SmallFloat {
    pub fn float_to_byte(f: f32, num_mantissa_bits: u32, zero_exp: i32) -> u8 {
        // adjustment from a float zero exponent to our zero exponent,
        // shifted over to our exponent position.
        let fzero = (63 - zero_exp) << num_mantissa_bits;
        let bits = f.to_bits() as i32;
        let small_float = bits >> (24 - num_mantissa_bits);
        if small_float <= fzero {
            if bits <= 0 {
                0
            } else {
                1
            }
        } else if small_float >= fzero + 0x100 {
            255
        } else {
            (small_float - fzero) as u8
        }
    }

    pub fn byte_to_float(b: u8, num_mantissa_bits: u32, zero_exp: i32) -> f32 {
        if b == 0 {
            return 0f32;
        }
        let mut bits = u32::from(b) << (24 - num_mantissa_bits);
        bits += ((63 - zero_exp) as u32) << 24;
        f32::from_bits(bits)
    }

    /// 3 bits of mantissa, zero exponent of 15: values from about 5.8e-10 to 7.5e9.
    #[inline]
    pub fn float_to_byte315(f: f32) -> u8 {
        SmallFloat::float_to_byte(f, 3, 15)
    }

    #[inline]
    pub fn byte315_to_float(b: u8) -> f32 {
        SmallFloat::byte_to_float(b, 3, 15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_values() {
        assert_eq!(SmallFloat::float_to_byte315(0.0), 0);
        assert_eq!(SmallFloat::float_to_byte315(-1.0), 0);
        assert_eq!(SmallFloat::float_to_byte315(1.0e-20), 1);
        assert_eq!(SmallFloat::float_to_byte315(1.0e20), 255);
        assert_eq!(SmallFloat::float_to_byte315(1.0), 124);
        assert!((SmallFloat::byte315_to_float(124) - 1.0).abs() < ::std::f32::EPSILON);
        assert_eq!(SmallFloat::byte315_to_float(0), 0.0);
    }

    #[test]
    fn test_decoded_values_round_trip_exactly() {
        for i in 1..256 {
            let b = i as u8;
            let f = SmallFloat::byte315_to_float(b);
            assert_eq!(SmallFloat::float_to_byte315(f), b);
        }
    }

    #[test]
    fn test_encoding_is_monotonic() {
        let mut last = 0u8;
        let mut f = 1.0e-12f32;
        while f < 1.0e12 {
            let b = SmallFloat::float_to_byte315(f);
            assert!(b >= last);
            last = b;
            f *= 1.7;
        }
    }
}
