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

use error::ErrorKind::IllegalArgument;
use error::Result;

use std::collections::HashMap;
use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

/// Trait for performing write operations of the low-level index data types.
pub trait DataOutput: Write {
    fn write_byte(&mut self, b: u8) -> Result<()> {
        self.write_u8(b)?;
        Ok(())
    }

    #[inline]
    fn write_bytes(&mut self, b: &[u8], offset: usize, length: usize) -> Result<()> {
        debug_assert!(offset + length <= b.len());
        self.write_all(&b[offset..offset + length])?;
        Ok(())
    }

    fn write_short(&mut self, i: i16) -> Result<()> {
        self.write_i16::<BigEndian>(i)?;
        Ok(())
    }

    fn write_int(&mut self, i: i32) -> Result<()> {
        self.write_i32::<BigEndian>(i)?;
        Ok(())
    }

    fn write_long(&mut self, i: i64) -> Result<()> {
        self.write_i64::<BigEndian>(i)?;
        Ok(())
    }

    fn write_vint(&mut self, i: i32) -> Result<()> {
        let mut i = i as u32;
        while (i & !0x7f_u32) != 0 {
            self.write_byte(((i & 0x7f) | 0x80) as u8)?;
            i >>= 7;
        }
        self.write_byte(i as u8)
    }

    fn write_vlong(&mut self, i: i64) -> Result<()> {
        if i < 0 {
            bail!(IllegalArgument("Can't write negative vLong".to_owned()));
        }
        let mut i = i as u64;
        while (i & !0x7f_u64) != 0 {
            self.write_byte(((i & 0x7f_u64) | 0x80_u64) as u8)?;
            i >>= 7;
        }
        self.write_byte(i as u8)
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        let s = s.as_bytes();
        self.write_vint(s.len() as i32)?;
        self.write_all(s)?;
        Ok(())
    }

    fn write_map_of_strings(&mut self, map: &HashMap<String, String>) -> Result<()> {
        self.write_vint(map.len() as i32)?;

        let mut entries: Vec<(&String, &String)> = map.iter().collect();
        entries.sort();
        for (k, v) in entries {
            self.write_string(k)?;
            self.write_string(v)?;
        }
        Ok(())
    }
}

// a implement that can use Vec<u8> as a data output
impl DataOutput for Vec<u8> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vint_encoding() {
        let mut out = Vec::new();
        out.write_vint(0).unwrap();
        out.write_vint(127).unwrap();
        out.write_vint(128).unwrap();
        out.write_vint(16_384).unwrap();
        assert_eq!(out, vec![0x00, 0x7f, 0x80, 0x01, 0x80, 0x80, 0x01]);

        let mut out = Vec::new();
        out.write_vint(-1).unwrap();
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_fixed_width_is_big_endian() {
        let mut out = Vec::new();
        DataOutput::write_int(&mut out, 0x0102_0304).unwrap();
        out.write_short(0x0506).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_negative_vlong_rejected() {
        let mut out = Vec::new();
        assert!(out.write_vlong(-5).is_err());
        assert!(out.is_empty());
    }
}
