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

use core::util::numeric::Numeric;

/// The value carried by a document field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum VariantValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    VString(String),
    Binary(Vec<u8>),
}

impl VariantValue {
    pub fn get_bool(&self) -> Option<bool> {
        match self {
            VariantValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get_numeric(&self) -> Option<Numeric> {
        match *self {
            VariantValue::Int(i) => Some(Numeric::Int(i)),
            VariantValue::Long(l) => Some(Numeric::Long(l)),
            VariantValue::Float(f) => Some(Numeric::Float(f)),
            VariantValue::Double(d) => Some(Numeric::Double(d)),
            _ => None,
        }
    }

    pub fn get_string(&self) -> Option<&str> {
        match self {
            VariantValue::VString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_binary(&self) -> Option<&[u8]> {
        match self {
            VariantValue::Binary(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Raw bytes of a string or binary value.
    pub fn get_bytes(&self) -> Option<&[u8]> {
        match self {
            VariantValue::VString(s) => Some(s.as_bytes()),
            VariantValue::Binary(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Approximate in-memory size, used for stored field limits.
    pub fn len(&self) -> usize {
        match self {
            VariantValue::Bool(_) => 1,
            VariantValue::Int(_) | VariantValue::Float(_) => 4,
            VariantValue::Long(_) | VariantValue::Double(_) => 8,
            VariantValue::VString(s) => s.len(),
            VariantValue::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for VariantValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VariantValue::Bool(b) => write!(f, "{}", b),
            VariantValue::Int(v) => write!(f, "{}", v),
            VariantValue::Long(v) => write!(f, "{}", v),
            VariantValue::Float(v) => write!(f, "{:.3}", v),
            VariantValue::Double(v) => write!(f, "{:.6}", v),
            VariantValue::VString(s) => write!(f, "{}", s),
            VariantValue::Binary(b) => write!(f, "{:?}", b),
        }
    }
}

impl From<bool> for VariantValue {
    fn from(v: bool) -> Self {
        VariantValue::Bool(v)
    }
}

impl From<i32> for VariantValue {
    fn from(v: i32) -> Self {
        VariantValue::Int(v)
    }
}

impl From<i64> for VariantValue {
    fn from(v: i64) -> Self {
        VariantValue::Long(v)
    }
}

impl From<f32> for VariantValue {
    fn from(v: f32) -> Self {
        VariantValue::Float(v)
    }
}

impl From<f64> for VariantValue {
    fn from(v: f64) -> Self {
        VariantValue::Double(v)
    }
}

impl<'a> From<&'a str> for VariantValue {
    fn from(v: &'a str) -> Self {
        VariantValue::VString(v.to_string())
    }
}

impl From<String> for VariantValue {
    fn from(v: String) -> Self {
        VariantValue::VString(v)
    }
}

impl From<Vec<u8>> for VariantValue {
    fn from(v: Vec<u8>) -> Self {
        VariantValue::Binary(v)
    }
}
