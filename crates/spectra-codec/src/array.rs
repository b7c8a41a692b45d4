// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! N-dimensional numeric arrays with a fixed element type.
//!
//! [`NdArray`] keeps its elements as raw little-endian bytes in C (row-major)
//! order. Equality is therefore bit-for-bit: two arrays are equal only when
//! dtype, shape, and every element's bit pattern agree.

use std::fmt;

use thiserror::Error;

/// Element type of an [`NdArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DType {
    /// One byte, `0` or `1`.
    Bool,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// IEEE-754 single precision.
    F32,
    /// IEEE-754 double precision.
    F64,
}

impl DType {
    /// Every supported dtype.
    pub const ALL: [Self; 11] = [
        Self::Bool,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::F32,
        Self::F64,
    ];

    /// Size of one element in bytes.
    pub const fn itemsize(self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// NumPy-style name (`float64`, `int32`, …).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }

    /// NumPy kind character: `b`, `i`, `u`, or `f`.
    pub const fn kind_char(self) -> char {
        match self {
            Self::Bool => 'b',
            Self::I8 | Self::I16 | Self::I32 | Self::I64 => 'i',
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => 'u',
            Self::F32 | Self::F64 => 'f',
        }
    }

    /// Looks up a dtype by kind character and item size.
    pub fn from_kind(kind: char, itemsize: usize) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.kind_char() == kind && d.itemsize() == itemsize)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while building, encoding, or decoding arrays.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayCodecError {
    /// Blob does not begin with the NPY magic string.
    #[error("blob does not start with the NPY magic string")]
    BadMagic,
    /// NPY format version this codec does not understand.
    #[error("unsupported NPY format version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version byte.
        major: u8,
        /// Minor version byte.
        minor: u8,
    },
    /// Blob ended before a required field.
    #[error("blob truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        /// Offset of the read that failed.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the blob.
        available: usize,
    },
    /// Header dictionary could not be parsed.
    #[error("malformed NPY header: {0}")]
    MalformedHeader(String),
    /// Element descriptor names a dtype outside the supported set.
    #[error("unsupported element descriptor '{0}'")]
    UnsupportedDescr(String),
    /// Element count does not match the shape.
    #[error("shape {shape:?} holds {expected} elements but {actual} were supplied")]
    ShapeMismatch {
        /// Requested shape.
        shape: Vec<usize>,
        /// Elements implied by the shape.
        expected: usize,
        /// Elements supplied.
        actual: usize,
    },
    /// Raw byte length does not match shape × itemsize.
    #[error("{dtype} array of shape {shape:?} needs {expected} bytes, got {actual}")]
    PayloadSize {
        /// Element type.
        dtype: DType,
        /// Array shape.
        shape: Vec<usize>,
        /// Bytes implied by the shape.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
    /// Bytes left over after the array payload.
    #[error("{0} trailing bytes after array payload")]
    TrailingBytes(usize),
    /// Typed access with the wrong element type.
    #[error("array holds {actual} elements, requested {requested}")]
    DTypeMismatch {
        /// Element type requested by the caller.
        requested: DType,
        /// Element type of the array.
        actual: DType,
    },
    /// Shape product overflows `usize`.
    #[error("array shape {0:?} overflows the addressable size")]
    SizeOverflow(Vec<usize>),
}

mod sealed {
    pub trait Sealed {}
}

/// Rust scalar types that can be stored in an [`NdArray`].
pub trait Element: Copy + sealed::Sealed {
    /// Matching array dtype.
    const DTYPE: DType;

    /// Appends the little-endian bytes of `self`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Reads one element from exactly `DTYPE.itemsize()` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_element!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

impl sealed::Sealed for bool {}

impl Element for bool {
    const DTYPE: DType = DType::Bool;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes.first().is_some_and(|b| *b != 0)
    }
}

pub(crate) fn element_count(shape: &[usize]) -> Result<usize, ArrayCodecError> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| ArrayCodecError::SizeOverflow(shape.to_vec()))
}

/// Dense N-dimensional array: dtype, shape, and C-order little-endian bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NdArray {
    dtype: DType,
    shape: Vec<usize>,
    data: Vec<u8>,
}

impl NdArray {
    /// Builds an array from typed elements in C order.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayCodecError::ShapeMismatch`] when `values.len()` differs
    /// from the product of `shape`.
    pub fn from_vec<T: Element>(shape: Vec<usize>, values: Vec<T>) -> Result<Self, ArrayCodecError> {
        let expected = element_count(&shape)?;
        if expected != values.len() {
            return Err(ArrayCodecError::ShapeMismatch {
                shape,
                expected,
                actual: values.len(),
            });
        }
        let mut data = Vec::with_capacity(values.len() * T::DTYPE.itemsize());
        for value in values {
            value.write_le(&mut data);
        }
        Ok(Self {
            dtype: T::DTYPE,
            shape,
            data,
        })
    }

    /// Builds a one-dimensional array from a slice.
    pub fn from_slice<T: Element>(values: &[T]) -> Self {
        let mut data = Vec::with_capacity(values.len() * T::DTYPE.itemsize());
        for value in values {
            value.write_le(&mut data);
        }
        Self {
            dtype: T::DTYPE,
            shape: vec![values.len()],
            data,
        }
    }

    /// Builds an array from raw little-endian C-order bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayCodecError::PayloadSize`] when `data` is not exactly
    /// `product(shape) * dtype.itemsize()` bytes long.
    pub fn from_raw(dtype: DType, shape: Vec<usize>, data: Vec<u8>) -> Result<Self, ArrayCodecError> {
        let expected = element_count(&shape)?
            .checked_mul(dtype.itemsize())
            .ok_or_else(|| ArrayCodecError::SizeOverflow(shape.clone()))?;
        if expected != data.len() {
            return Err(ArrayCodecError::PayloadSize {
                dtype,
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { dtype, shape, data })
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Dimensions, outermost first.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.dtype.itemsize()
    }

    /// Returns `true` when the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw little-endian C-order element bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copies the elements out as `T`, in C order.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayCodecError::DTypeMismatch`] unless `T::DTYPE` equals the
    /// array's dtype.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, ArrayCodecError> {
        if T::DTYPE != self.dtype {
            return Err(ArrayCodecError::DTypeMismatch {
                requested: T::DTYPE,
                actual: self.dtype,
            });
        }
        Ok(self
            .data
            .chunks_exact(self.dtype.itemsize())
            .map(T::read_le)
            .collect())
    }

    /// Reverses the axis order (NumPy's `.T`), re-laying the bytes in C order.
    ///
    /// Arrays of rank 0 or 1 are returned unchanged.
    pub fn transpose(&self) -> Self {
        let ndim = self.shape.len();
        if ndim < 2 || self.data.is_empty() {
            let mut shape = self.shape.clone();
            shape.reverse();
            return Self {
                dtype: self.dtype,
                shape,
                data: self.data.clone(),
            };
        }

        let itemsize = self.dtype.itemsize();
        let mut src_strides = vec![1usize; ndim];
        for axis in (0..ndim - 1).rev() {
            src_strides[axis] = src_strides[axis + 1] * self.shape[axis + 1];
        }
        let new_shape: Vec<usize> = self.shape.iter().rev().copied().collect();

        let mut data = Vec::with_capacity(self.data.len());
        let mut index = vec![0usize; ndim];
        for _ in 0..self.len() {
            // index[k] walks new axis k, which is source axis ndim-1-k.
            let src: usize = index
                .iter()
                .enumerate()
                .map(|(k, i)| i * src_strides[ndim - 1 - k])
                .sum();
            let start = src * itemsize;
            data.extend_from_slice(&self.data[start..start + itemsize]);

            for axis in (0..ndim).rev() {
                index[axis] += 1;
                if index[axis] < new_shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }

        Self {
            dtype: self.dtype,
            shape: new_shape,
            data,
        }
    }
}

impl fmt::Display for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.dtype)?;
        for (i, dim) in self.shape.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{dim}")?;
        }
        f.write_str("]")
    }
}
