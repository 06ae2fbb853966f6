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

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum Numeric {
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Numeric {
    pub fn int_value(&self) -> i32 {
        match *self {
            Numeric::Short(v) => i32::from(v),
            Numeric::Int(v) => v,
            Numeric::Long(v) => v as i32,
            Numeric::Float(v) => v as i32,
            Numeric::Double(v) => v as i32,
        }
    }

    pub fn long_value(&self) -> i64 {
        match *self {
            Numeric::Short(v) => i64::from(v),
            Numeric::Int(v) => i64::from(v),
            Numeric::Long(v) => v,
            Numeric::Float(v) => v as i64,
            Numeric::Double(v) => v as i64,
        }
    }

    pub fn float_value(&self) -> f32 {
        match *self {
            Numeric::Short(v) => f32::from(v),
            Numeric::Int(v) => v as f32,
            Numeric::Long(v) => v as f32,
            Numeric::Float(v) => v,
            Numeric::Double(v) => v as f32,
        }
    }

    pub fn double_value(&self) -> f64 {
        match *self {
            Numeric::Short(v) => f64::from(v),
            Numeric::Int(v) => f64::from(v),
            Numeric::Long(v) => v as f64,
            Numeric::Float(v) => f64::from(v),
            Numeric::Double(v) => v,
        }
    }

    pub fn is_floating(&self) -> bool {
        match *self {
            Numeric::Float(_) | Numeric::Double(_) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Numeric::Short(v) => write!(f, "{}s", v),
            Numeric::Int(v) => write!(f, "{}", v),
            Numeric::Long(v) => write!(f, "{}", v),
            Numeric::Float(v) => write!(f, "{:.3}", v),
            Numeric::Double(v) => write!(f, "{:.6}", v),
        }
    }
}

impl From<i16> for Numeric {
    fn from(val: i16) -> Self {
        Numeric::Short(val)
    }
}

impl From<i32> for Numeric {
    fn from(val: i32) -> Self {
        Numeric::Int(val)
    }
}

impl From<i64> for Numeric {
    fn from(val: i64) -> Self {
        Numeric::Long(val)
    }
}

impl From<f32> for Numeric {
    fn from(val: f32) -> Self {
        Numeric::Float(val)
    }
}

impl From<f64> for Numeric {
    fn from(val: f64) -> Self {
        Numeric::Double(val)
    }
}

/// Maps a double to a long whose signed order matches the double order.
pub fn double2sortable_long(value: f64) -> i64 {
    sortable_double_bits(value.to_bits() as i64)
}

pub fn float2sortable_int(value: f32) -> i32 {
    sortable_float_bits(value.to_bits() as i32)
}

pub fn sortable_double_bits(bits: i64) -> i64 {
    bits ^ (bits >> 63) & 0x7fff_ffff_ffff_ffff
}

pub fn sortable_float_bits(bits: i32) -> i32 {
    bits ^ (bits >> 31) & 0x7fff_ffff
}
