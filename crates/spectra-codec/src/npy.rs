// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! NumPy `.npy` array blobs.
//!
//! Layout (format 1.0):
//!
//! ```text
//! \x93NUMPY  major minor  header_len:u16le  header  payload
//! ```
//!
//! `header` is an ASCII Python dict literal, e.g.
//! `{'descr': '<f8', 'fortran_order': False, 'shape': (2, 3), }`, space padded
//! and newline terminated so the payload starts on a 64-byte boundary.
//! Formats 2.0 and 3.0 only widen `header_len` to `u32` (3.0 allows UTF-8).
//!
//! The writer always emits little-endian C-order payloads. The reader also
//! accepts big-endian descriptors and Fortran-ordered payloads, normalising
//! both into the in-memory layout of [`NdArray`].

use crate::array::{element_count, ArrayCodecError, DType, NdArray};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGN: usize = 64;

/// Serializes `array` as a self-describing NPY blob.
pub fn encode_npy(array: &NdArray) -> Vec<u8> {
    let dict = header_dict(array);
    // magic + version + u16 length
    let (major, preamble) = if padded_len(&dict, 10) <= usize::from(u16::MAX) {
        (1u8, 10)
    } else {
        (2u8, 12)
    };
    let header_len = padded_len(&dict, preamble);

    let mut out = Vec::with_capacity(preamble + header_len + array.as_bytes().len());
    out.extend_from_slice(MAGIC);
    out.push(major);
    out.push(0);
    if major == 1 {
        let len = u16::try_from(header_len).unwrap_or(u16::MAX);
        out.extend_from_slice(&len.to_le_bytes());
    } else {
        let len = u32::try_from(header_len).unwrap_or(u32::MAX);
        out.extend_from_slice(&len.to_le_bytes());
    }
    out.extend_from_slice(dict.as_bytes());
    out.resize(preamble + header_len - 1, b' ');
    out.push(b'\n');
    out.extend_from_slice(array.as_bytes());
    out
}

/// Header length (dict + padding + newline) for a given preamble size.
fn padded_len(dict: &str, preamble: usize) -> usize {
    let unpadded = preamble + dict.len() + 1;
    let padding = (ALIGN - unpadded % ALIGN) % ALIGN;
    dict.len() + padding + 1
}

fn header_dict(array: &NdArray) -> String {
    let dtype = array.dtype();
    let order = if dtype.itemsize() == 1 { '|' } else { '<' };
    let descr = format!("{order}{}{}", dtype.kind_char(), dtype.itemsize());

    let shape = match array.shape() {
        [] => "()".to_owned(),
        [only] => format!("({only},)"),
        dims => {
            let parts: Vec<String> = dims.iter().map(ToString::to_string).collect();
            format!("({})", parts.join(", "))
        }
    };

    format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}")
}

/// Parses an NPY blob back into an [`NdArray`].
///
/// # Errors
///
/// Returns an [`ArrayCodecError`] when the blob is truncated, carries an
/// unknown magic/version, has a malformed header, names an unsupported dtype,
/// or has a payload whose size disagrees with the header.
pub fn decode_npy(blob: &[u8]) -> Result<NdArray, ArrayCodecError> {
    let mut reader = Reader::new(blob);
    if reader.take(MAGIC.len())? != MAGIC {
        return Err(ArrayCodecError::BadMagic);
    }
    let major = reader.read_u8()?;
    let minor = reader.read_u8()?;
    let header_len = match (major, minor) {
        (1, 0) => usize::from(reader.read_u16_le()?),
        (2 | 3, 0) => usize::try_from(reader.read_u32_le()?)
            .map_err(|_| ArrayCodecError::MalformedHeader("header length overflow".into()))?,
        _ => return Err(ArrayCodecError::UnsupportedVersion { major, minor }),
    };

    let raw_header = reader.take(header_len)?;
    if major < 3 && !raw_header.is_ascii() {
        return Err(ArrayCodecError::MalformedHeader(
            "non-ASCII header in format < 3.0".into(),
        ));
    }
    let text = std::str::from_utf8(raw_header)
        .map_err(|_| ArrayCodecError::MalformedHeader("header is not valid UTF-8".into()))?;
    let header = parse_header(text)?;
    let (dtype, big_endian) = parse_descr(&header.descr)?;

    let count = element_count(&header.shape)?;
    let nbytes = count
        .checked_mul(dtype.itemsize())
        .ok_or_else(|| ArrayCodecError::SizeOverflow(header.shape.clone()))?;
    let payload = reader.take(nbytes)?;
    if reader.remaining() != 0 {
        return Err(ArrayCodecError::TrailingBytes(reader.remaining()));
    }

    let mut data = payload.to_vec();
    if big_endian && dtype.itemsize() > 1 {
        for element in data.chunks_exact_mut(dtype.itemsize()) {
            element.reverse();
        }
    }

    if header.fortran_order {
        let mut reversed = header.shape;
        reversed.reverse();
        Ok(NdArray::from_raw(dtype, reversed, data)?.transpose())
    } else {
        NdArray::from_raw(dtype, header.shape, data)
    }
}

/// Maps an NPY descriptor (`<f8`, `|u1`, `>i4`, …) to a dtype and byte order.
fn parse_descr(descr: &str) -> Result<(DType, bool), ArrayCodecError> {
    let unsupported = || ArrayCodecError::UnsupportedDescr(descr.to_owned());
    let mut chars = descr.chars();
    let big_endian = match chars.next() {
        Some('<' | '|') => false,
        Some('>') => true,
        Some('=') => cfg!(target_endian = "big"),
        _ => return Err(unsupported()),
    };
    let kind = chars.next().ok_or_else(unsupported)?;
    let itemsize: usize = chars.as_str().parse().map_err(|_| unsupported())?;
    let dtype = DType::from_kind(kind, itemsize).ok_or_else(unsupported)?;
    Ok((dtype, big_endian))
}

#[derive(Debug)]
struct NpyHeader {
    descr: String,
    fortran_order: bool,
    shape: Vec<usize>,
}

#[derive(Debug)]
enum HeaderValue {
    Str(String),
    Bool(bool),
    Tuple(Vec<usize>),
}

/// Parses the restricted Python dict literal NumPy writes.
fn parse_header(text: &str) -> Result<NpyHeader, ArrayCodecError> {
    let mut cursor = HeaderCursor {
        rest: text.trim_end(),
    };
    cursor.expect('{')?;

    let mut descr = None;
    let mut fortran_order = None;
    let mut shape = None;
    loop {
        cursor.skip_ws();
        if cursor.eat('}') {
            break;
        }
        let key = cursor.quoted()?;
        cursor.skip_ws();
        cursor.expect(':')?;
        cursor.skip_ws();
        let value = cursor.value()?;
        match (key.as_str(), value) {
            ("descr", HeaderValue::Str(s)) => descr = Some(s),
            ("fortran_order", HeaderValue::Bool(b)) => fortran_order = Some(b),
            ("shape", HeaderValue::Tuple(t)) => shape = Some(t),
            (other, value) => {
                return Err(ArrayCodecError::MalformedHeader(format!(
                    "unexpected entry '{other}': {value:?}"
                )))
            }
        }
        cursor.skip_ws();
        if !cursor.eat(',') {
            cursor.skip_ws();
            cursor.expect('}')?;
            break;
        }
    }
    if !cursor.rest.trim().is_empty() {
        return Err(ArrayCodecError::MalformedHeader(format!(
            "unexpected text after header: {:?}",
            cursor.rest
        )));
    }

    let missing = |key: &str| ArrayCodecError::MalformedHeader(format!("missing key '{key}'"));
    Ok(NpyHeader {
        descr: descr.ok_or_else(|| missing("descr"))?,
        fortran_order: fortran_order.ok_or_else(|| missing("fortran_order"))?,
        shape: shape.ok_or_else(|| missing("shape"))?,
    })
}

struct HeaderCursor<'a> {
    rest: &'a str,
}

impl HeaderCursor<'_> {
    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, c: char) -> bool {
        if let Some(rest) = self.rest.strip_prefix(c) {
            self.rest = rest;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ArrayCodecError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(ArrayCodecError::MalformedHeader(format!(
                "expected '{c}' at {:?}",
                self.rest
            )))
        }
    }

    fn quoted(&mut self) -> Result<String, ArrayCodecError> {
        let quote = if self.eat('\'') {
            '\''
        } else if self.eat('"') {
            '"'
        } else {
            return Err(ArrayCodecError::MalformedHeader(format!(
                "expected quoted string at {:?}",
                self.rest
            )));
        };
        let end = self.rest.find(quote).ok_or_else(|| {
            ArrayCodecError::MalformedHeader("unterminated string literal".into())
        })?;
        let s = self.rest[..end].to_owned();
        self.rest = &self.rest[end + 1..];
        Ok(s)
    }

    fn value(&mut self) -> Result<HeaderValue, ArrayCodecError> {
        if self.rest.starts_with(['\'', '"']) {
            return self.quoted().map(HeaderValue::Str);
        }
        if self.eat('(') {
            let end = self.rest.find(')').ok_or_else(|| {
                ArrayCodecError::MalformedHeader("unterminated shape tuple".into())
            })?;
            let inner = &self.rest[..end];
            self.rest = &self.rest[end + 1..];
            let dims = inner
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| {
                    // Python 2 writers suffix longs with `L`.
                    part.trim_end_matches('L').parse::<usize>().map_err(|_| {
                        ArrayCodecError::MalformedHeader(format!("bad shape dimension {part:?}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(HeaderValue::Tuple(dims));
        }
        for (word, flag) in [("True", true), ("False", false)] {
            if let Some(rest) = self.rest.strip_prefix(word) {
                self.rest = rest;
                return Ok(HeaderValue::Bool(flag));
            }
        }
        Err(ArrayCodecError::MalformedHeader(format!(
            "unrecognised value at {:?}",
            self.rest
        )))
    }
}

/// Bounds-checked little-endian reader over a blob.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ArrayCodecError> {
        let truncated = || ArrayCodecError::Truncated {
            offset: self.offset,
            needed: len,
            available: self.bytes.len() - self.offset,
        };
        let end = self.offset.checked_add(len).ok_or_else(truncated)?;
        let out = self.bytes.get(self.offset..end).ok_or_else(truncated)?;
        self.offset = end;
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, ArrayCodecError> {
        Ok(self.take(1)?[0])
    }

    fn read_u16_le(&mut self) -> Result<u16, ArrayCodecError> {
        let chunk = self.take(2)?;
        Ok(u16::from_le_bytes([chunk[0], chunk[1]]))
    }

    fn read_u32_le(&mut self) -> Result<u32, ArrayCodecError> {
        let chunk = self.take(4)?;
        Ok(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn header_matches_numpy_layout() {
        let blob = encode_npy(&NdArray::from_slice(&[1.0f64, 2.0, 3.0]));
        assert_eq!(&blob[..8], b"\x93NUMPY\x01\x00");
        // 57-byte dict + 60 spaces + '\n' puts the payload at offset 128.
        assert_eq!(u16::from_le_bytes([blob[8], blob[9]]), 118);
        assert_eq!(blob.len(), 128 + 24);
        assert_eq!(blob[127], b'\n');
        let dict = std::str::from_utf8(&blob[10..67]).unwrap();
        assert_eq!(
            dict,
            "{'descr': '<f8', 'fortran_order': False, 'shape': (3,), }"
        );
    }

    #[test]
    fn scalar_and_matrix_shapes_render_as_python_tuples() {
        let scalar = NdArray::from_vec(vec![], vec![7i64]).unwrap();
        assert!(header_dict(&scalar).contains("'shape': ()"));
        let matrix = NdArray::from_vec(vec![2, 3], vec![0u8; 6]).unwrap();
        assert!(header_dict(&matrix).contains("'descr': '|u1'"));
        assert!(header_dict(&matrix).contains("'shape': (2, 3)"));
    }

    #[test]
    fn decodes_fortran_ordered_payload() {
        // [[1, 2, 3], [4, 5, 6]] stored column-major: 1 4 2 5 3 6
        let header = "{'descr': '<i4', 'fortran_order': True, 'shape': (2, 3), }";
        let mut blob = Vec::new();
        blob.extend_from_slice(b"\x93NUMPY\x01\x00");
        let len = u16::try_from(header.len() + 1).unwrap();
        blob.extend_from_slice(&len.to_le_bytes());
        blob.extend_from_slice(header.as_bytes());
        blob.push(b'\n');
        for v in [1i32, 4, 2, 5, 3, 6] {
            blob.extend_from_slice(&v.to_le_bytes());
        }
        let a = decode_npy(&blob).unwrap();
        assert_eq!(a.shape(), &[2, 3]);
        assert_eq!(a.to_vec::<i32>().unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn decodes_big_endian_payload() {
        let header = "{'descr': '>u2', 'fortran_order': False, 'shape': (2,), }\n";
        let mut blob = Vec::new();
        blob.extend_from_slice(b"\x93NUMPY\x01\x00");
        let len = u16::try_from(header.len()).unwrap();
        blob.extend_from_slice(&len.to_le_bytes());
        blob.extend_from_slice(header.as_bytes());
        blob.extend_from_slice(&[0x01, 0x02, 0xAB, 0xCD]);
        let a = decode_npy(&blob).unwrap();
        assert_eq!(a.to_vec::<u16>().unwrap(), vec![0x0102, 0xABCD]);
    }

    #[test]
    fn rejects_bad_magic_and_version() {
        assert_eq!(decode_npy(b"\x93NUMPZ\x01\x00"), Err(ArrayCodecError::BadMagic));
        assert_eq!(
            decode_npy(b"\x93NUMPY\x09\x00\x00\x00"),
            Err(ArrayCodecError::UnsupportedVersion { major: 9, minor: 0 })
        );
    }

    #[test]
    fn rejects_truncated_payload() {
        let blob = encode_npy(&NdArray::from_slice(&[1.5f32, 2.5]));
        let err = decode_npy(&blob[..blob.len() - 1]).unwrap_err();
        assert!(matches!(err, ArrayCodecError::Truncated { needed: 8, available: 7, .. }));
        assert!(matches!(
            decode_npy(&blob[..4]),
            Err(ArrayCodecError::Truncated { .. })
        ));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut blob = encode_npy(&NdArray::from_slice(&[1u8]));
        blob.push(0);
        assert_eq!(decode_npy(&blob), Err(ArrayCodecError::TrailingBytes(1)));
    }

    #[test]
    fn rejects_unknown_descr_and_keys() {
        assert!(matches!(
            parse_descr("<c16"),
            Err(ArrayCodecError::UnsupportedDescr(_))
        ));
        assert!(matches!(
            parse_header("{'descr': '<f8', 'fortran_order': False, 'shape': (1,), 'extra': 1}"),
            Err(ArrayCodecError::MalformedHeader(_))
        ));
        assert!(matches!(
            parse_header("{'descr': '<f8', 'shape': (1,), }"),
            Err(ArrayCodecError::MalformedHeader(_))
        ));
    }

    #[test]
    fn parses_python2_long_dimensions() {
        let h = parse_header("{'descr': '<i8', 'fortran_order': False, 'shape': (2L, 3L), }")
            .unwrap();
        assert_eq!(h.shape, vec![2, 3]);
    }
}
