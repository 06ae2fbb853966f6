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

use error::ErrorKind::CorruptIndex;
use error::Result;

use std::collections::HashMap;
use std::io::{self, Read};

use byteorder::{BigEndian, ReadBytesExt};

/// Reads the types written by `DataOutput`.
pub trait DataInput: Read {
    fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_u8()?)
    }

    fn read_bytes(&mut self, b: &mut [u8], offset: usize, length: usize) -> Result<()> {
        self.read_exact(&mut b[offset..offset + length])?;
        Ok(())
    }

    fn read_short(&mut self) -> Result<i16> {
        Ok(self.read_i16::<BigEndian>()?)
    }

    fn read_int(&mut self) -> Result<i32> {
        Ok(self.read_i32::<BigEndian>()?)
    }

    fn read_long(&mut self) -> Result<i64> {
        Ok(self.read_i64::<BigEndian>()?)
    }

    fn read_vint(&mut self) -> Result<i32> {
        let mut value = 0u32;
        let mut shift = 0;
        loop {
            let b = self.read_byte()?;
            value |= u32::from(b & 0x7f) << shift;
            if b & 0x80 == 0 {
                return Ok(value as i32);
            }
            shift += 7;
            if shift > 28 {
                bail!(CorruptIndex("Invalid vInt detected".into()));
            }
        }
    }

    fn read_vlong(&mut self) -> Result<i64> {
        let mut value = 0u64;
        let mut shift = 0;
        loop {
            let b = self.read_byte()?;
            value |= u64::from(b & 0x7f) << shift;
            if b & 0x80 == 0 {
                return Ok(value as i64);
            }
            shift += 7;
            if shift > 63 {
                bail!(CorruptIndex("Invalid vLong detected".into()));
            }
        }
    }

    fn read_string(&mut self) -> Result<String> {
        let length = self.read_vint()?;
        if length < 0 {
            bail!(CorruptIndex(format!("negative string length {}", length)));
        }
        let mut buffer = vec![0u8; length as usize];
        self.read_exact(&mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn read_map_of_strings(&mut self) -> Result<HashMap<String, String>> {
        let count = self.read_vint()?;
        let mut map = HashMap::new();
        for _ in 0..count {
            let k = self.read_string()?;
            let v = self.read_string()?;
            map.insert(k, v);
        }
        Ok(map)
    }
}

/// A `DataInput` over an owned byte buffer.
pub struct ByteArrayDataInput {
    bytes: Vec<u8>,
    pos: usize,
}

impl ByteArrayDataInput {
    pub fn new(bytes: Vec<u8>) -> ByteArrayDataInput {
        ByteArrayDataInput { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        debug_assert!(pos <= self.bytes.len());
        self.pos = pos;
    }

    pub fn length(&self) -> usize {
        self.bytes.len()
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Read for ByteArrayDataInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let size = buf.len().min(self.bytes.len() - self.pos);
        buf[..size].copy_from_slice(&self.bytes[self.pos..self.pos + size]);
        self.pos += size;
        Ok(size)
    }
}

impl DataInput for ByteArrayDataInput {
    fn read_byte(&mut self) -> Result<u8> {
        if self.pos >= self.bytes.len() {
            bail!(CorruptIndex("read past EOF".into()));
        }
        let b = self.bytes[self.pos];
        self.pos += 1;
        Ok(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::store::io::DataOutput;

    #[test]
    fn test_read_back_written_values() {
        let mut out = Vec::new();
        out.write_vint(300).unwrap();
        out.write_vlong(1 << 40).unwrap();
        out.write_int(-7).unwrap();
        out.write_long(i64::min_value()).unwrap();
        out.write_string("héllo").unwrap();

        let mut input = ByteArrayDataInput::new(out);
        assert_eq!(input.read_vint().unwrap(), 300);
        assert_eq!(input.read_vlong().unwrap(), 1 << 40);
        assert_eq!(DataInput::read_int(&mut input).unwrap(), -7);
        assert_eq!(input.read_long().unwrap(), i64::min_value());
        assert_eq!(input.read_string().unwrap(), "héllo");
        assert!(input.eof());
    }

    #[test]
    fn test_read_past_eof() {
        let mut input = ByteArrayDataInput::new(vec![0x80]);
        assert!(input.read_vint().is_err());
    }
}
