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

use core::store::io::{ByteArrayDataInput, DataInput, DataOutput, IndexOutput};
use core::util::{id2str, ID_LENGTH};
use error::ErrorKind::{CorruptIndex, IllegalArgument, IllegalState};
use error::Result;

use flate2::Crc;

/// Constant to identify the start of a codec header.
pub const CODEC_MAGIC: i32 = 0x3FD7_6C17;
/// Constant to identify the start of a codec footer.
pub const FOOTER_MAGIC: i32 = !CODEC_MAGIC;

/// Writes a codec header, which records both a string to identify the file
/// and a version number.
pub fn write_header<T: DataOutput + ?Sized>(out: &mut T, codec: &str, version: i32) -> Result<()> {
    let clen = codec.len();
    if clen >= 128 {
        bail!(IllegalArgument(format!(
            "codec must be simple ASCII less than 128 characters, got {}[length={}]",
            codec, clen,
        )));
    }
    out.write_int(CODEC_MAGIC)?;
    out.write_string(codec)?;
    out.write_int(version)
}

/// Writes a codec header for a per-segment file: the plain header followed by
/// the segment id and the segment suffix.
pub fn write_index_header<T: DataOutput + ?Sized>(
    out: &mut T,
    codec: &str,
    version: i32,
    id: &[u8],
    suffix: &str,
) -> Result<()> {
    if id.len() != ID_LENGTH {
        bail!(IllegalArgument(format!("Invalid id: {:?}", id)));
    }
    write_header(out, codec, version)?;
    out.write_bytes(id, 0, id.len())?;
    let slen = suffix.len();

    if slen >= 256 {
        bail!(IllegalArgument(format!(
            "suffix must be simple ASCII less than 256 characters, got {}[length={}]",
            suffix, slen
        )));
    }
    out.write_byte(slen as u8)?;
    out.write_bytes(suffix.as_bytes(), 0, slen)
}

/// Writes the footer: magic, algorithm id and the CRC32 of everything before it.
pub fn write_footer<T: IndexOutput + ?Sized>(output: &mut T) -> Result<()> {
    output.write_int(FOOTER_MAGIC)?;
    output.write_int(0)?;
    let value = output.checksum()?;
    if value as u64 & 0xFFFF_FFFF_0000_0000 != 0 {
        bail!(IllegalState(format!("Illegal CRC-32 checksum: {}", value)));
    }
    output.write_long(value)
}

pub fn footer_length() -> usize {
    16
}

/// Reads and validates a header previously written with `write_header`.
pub fn check_header<T: DataInput + ?Sized>(
    data_input: &mut T,
    codec: &str,
    min_ver: i32,
    max_ver: i32,
) -> Result<i32> {
    let actual_header = data_input.read_int()?;
    if actual_header != CODEC_MAGIC {
        bail!(CorruptIndex(format!(
            "codec header mismatch: actual=0x{:X}, expected=0x{:X}",
            actual_header, CODEC_MAGIC
        )));
    }
    let actual_codec = data_input.read_string()?;
    if actual_codec != codec {
        bail!(CorruptIndex(format!(
            "codec mismatch: actual={}, expected={}",
            actual_codec, codec
        )));
    }
    let actual_ver = data_input.read_int()?;
    if actual_ver < min_ver || actual_ver > max_ver {
        bail!(CorruptIndex(format!(
            "index format either too new or too old: {} <= {} <= {} doesn't hold",
            min_ver, actual_ver, max_ver
        )));
    }
    Ok(actual_ver)
}

/// Reads and validates a header previously written with `write_index_header`.
pub fn check_index_header<T: DataInput + ?Sized>(
    data_input: &mut T,
    codec: &str,
    min_ver: i32,
    max_ver: i32,
    expected_id: &[u8],
    expected_suffix: &str,
) -> Result<i32> {
    let version = check_header(data_input, codec, min_ver, max_ver)?;

    let mut actual_id = [0u8; ID_LENGTH];
    data_input.read_exact(&mut actual_id)?;
    if actual_id != expected_id {
        bail!(CorruptIndex(format!(
            "file mismatch, expected_id={}, got={}",
            id2str(expected_id),
            id2str(&actual_id)
        )));
    }

    let suffix_len = data_input.read_byte()? as usize;
    let mut suffix_bytes = vec![0u8; suffix_len];
    data_input.read_exact(&mut suffix_bytes)?;
    let suffix = ::std::str::from_utf8(&suffix_bytes)?;
    if suffix != expected_suffix {
        bail!(CorruptIndex(format!(
            "file mismatch, expected suffix={}, got={}",
            expected_suffix, suffix
        )));
    }
    Ok(version)
}

/// Verifies the footer of a fully buffered file and returns its checksum.
/// The input position is left untouched.
pub fn check_footer(input: &ByteArrayDataInput) -> Result<i64> {
    let bytes = input.bytes();
    if bytes.len() < footer_length() {
        bail!(CorruptIndex(format!(
            "misplaced codec footer (file truncated?): length={}",
            bytes.len()
        )));
    }
    let footer_start = bytes.len() - footer_length();
    let mut footer = ByteArrayDataInput::new(bytes[footer_start..].to_vec());
    let magic = footer.read_int()?;
    if magic != FOOTER_MAGIC {
        bail!(CorruptIndex(format!(
            "codec footer mismatch: actual={} vs expected={}",
            magic, FOOTER_MAGIC
        )));
    }
    let algorithm_id = footer.read_int()?;
    if algorithm_id != 0 {
        bail!(CorruptIndex(format!(
            "codec footer mismatch: unknown algorithm_id: {}",
            algorithm_id
        )));
    }
    let expected_checksum = footer.read_long()?;

    let mut crc = Crc::new();
    crc.update(&bytes[..footer_start + 8]);
    let actual_checksum = i64::from(crc.sum());
    if actual_checksum != expected_checksum {
        bail!(CorruptIndex(format!(
            "checksum failed (hardware problems?): expected=0x{:X}, actual=0x{:X}",
            expected_checksum, actual_checksum
        )));
    }
    Ok(actual_checksum)
}
