//! Typed sample storage.
//!
//! [`Element`] is implemented for every primitive a volume can hold and
//! carries the per-type byte encoding and narrowing rules. [`ArrayData`] is
//! the tagged variant over `Array3<T>` used for both decoded frames
//! (height, width, channels) and volumes (depth, height, width).

use crate::types::{ByteOrder, DataType};
use ndarray::Array3;
use num_traits::{AsPrimitive, Zero};
use std::fmt;

/// A primitive sample type
pub trait Element:
    Copy + Default + PartialOrd + Zero + AsPrimitive<f64> + fmt::Display + fmt::Debug + Send + Sync
{
    const DATA_TYPE: DataType;

    /// Append the value's bytes in the given order
    fn write_to(self, order: ByteOrder, out: &mut Vec<u8>);

    /// Decode one value; `bytes` must hold at least `size_of::<Self>()` bytes
    fn read_from(bytes: &[u8], order: ByteOrder) -> Self;

    /// Plain `as` conversion from `f64` (saturating for integer targets)
    fn cast_from_f64(value: f64) -> Self;

    /// Narrow a floating point intensity to this type.
    ///
    /// Integers round to nearest (ties to even) and then clip to the type's
    /// range; floats are cast directly.
    fn from_luminance(value: f64) -> Self;

    fn wrap(array: Array3<Self>) -> ArrayData;

    /// Take the array out if `data` holds this element type
    fn unwrap(data: ArrayData) -> std::result::Result<Array3<Self>, ArrayData>;

    fn as_array(data: &ArrayData) -> Option<&Array3<Self>>;

    fn to_f64(self) -> f64 {
        self.as_()
    }
}

fn round_and_clip(value: f64, min: f64, max: f64) -> f64 {
    let rounded = value.round_ties_even();
    if rounded.is_nan() {
        0.0
    } else {
        rounded.clamp(min, max)
    }
}

macro_rules! impl_element_common {
    ($t:ty, $variant:ident) => {
        const DATA_TYPE: DataType = DataType::$variant;

        fn write_to(self, order: ByteOrder, out: &mut Vec<u8>) {
            match order {
                ByteOrder::Little => out.extend_from_slice(&self.to_le_bytes()),
                ByteOrder::Big => out.extend_from_slice(&self.to_be_bytes()),
            }
        }

        fn read_from(bytes: &[u8], order: ByteOrder) -> Self {
            let mut buf = [0u8; std::mem::size_of::<$t>()];
            buf.copy_from_slice(&bytes[..std::mem::size_of::<$t>()]);
            match order {
                ByteOrder::Little => <$t>::from_le_bytes(buf),
                ByteOrder::Big => <$t>::from_be_bytes(buf),
            }
        }

        fn cast_from_f64(value: f64) -> Self {
            value as $t
        }

        fn wrap(array: Array3<Self>) -> ArrayData {
            ArrayData::$variant(array)
        }

        fn unwrap(data: ArrayData) -> std::result::Result<Array3<Self>, ArrayData> {
            match data {
                ArrayData::$variant(array) => Ok(array),
                other => Err(other),
            }
        }

        fn as_array(data: &ArrayData) -> Option<&Array3<Self>> {
            match data {
                ArrayData::$variant(array) => Some(array),
                _ => None,
            }
        }
    };
}

macro_rules! impl_int_element {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            impl_element_common!($t, $variant);

            fn from_luminance(value: f64) -> Self {
                round_and_clip(value, <$t>::MIN as f64, <$t>::MAX as f64) as $t
            }
        }
    };
}

macro_rules! impl_float_element {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            impl_element_common!($t, $variant);

            fn from_luminance(value: f64) -> Self {
                value as $t
            }
        }
    };
}

impl_int_element!(u8, U8);
impl_int_element!(i8, I8);
impl_int_element!(u16, U16);
impl_int_element!(i16, I16);
impl_int_element!(u32, U32);
impl_int_element!(i32, I32);
impl_int_element!(u64, U64);
impl_int_element!(i64, I64);
impl_float_element!(f32, F32);
impl_float_element!(f64, F64);

/// A 3-axis array of one of the supported element types
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    U8(Array3<u8>),
    I8(Array3<i8>),
    U16(Array3<u16>),
    I16(Array3<i16>),
    U32(Array3<u32>),
    I32(Array3<i32>),
    U64(Array3<u64>),
    I64(Array3<i64>),
    F32(Array3<f32>),
    F64(Array3<f64>),
}

/// Evaluate `$body` with `$arr` bound to the typed array inside an [`ArrayData`]
macro_rules! dispatch_array {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            $crate::element::ArrayData::U8($arr) => $body,
            $crate::element::ArrayData::I8($arr) => $body,
            $crate::element::ArrayData::U16($arr) => $body,
            $crate::element::ArrayData::I16($arr) => $body,
            $crate::element::ArrayData::U32($arr) => $body,
            $crate::element::ArrayData::I32($arr) => $body,
            $crate::element::ArrayData::U64($arr) => $body,
            $crate::element::ArrayData::I64($arr) => $body,
            $crate::element::ArrayData::F32($arr) => $body,
            $crate::element::ArrayData::F64($arr) => $body,
        }
    };
}

/// Like [`dispatch_array`], re-wrapping the result in the same variant
macro_rules! map_array {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            $crate::element::ArrayData::U8($arr) => $crate::element::ArrayData::U8($body),
            $crate::element::ArrayData::I8($arr) => $crate::element::ArrayData::I8($body),
            $crate::element::ArrayData::U16($arr) => $crate::element::ArrayData::U16($body),
            $crate::element::ArrayData::I16($arr) => $crate::element::ArrayData::I16($body),
            $crate::element::ArrayData::U32($arr) => $crate::element::ArrayData::U32($body),
            $crate::element::ArrayData::I32($arr) => $crate::element::ArrayData::I32($body),
            $crate::element::ArrayData::U64($arr) => $crate::element::ArrayData::U64($body),
            $crate::element::ArrayData::I64($arr) => $crate::element::ArrayData::I64($body),
            $crate::element::ArrayData::F32($arr) => $crate::element::ArrayData::F32($body),
            $crate::element::ArrayData::F64($arr) => $crate::element::ArrayData::F64($body),
        }
    };
}

/// Evaluate `$body` with the type alias `$t` bound to the primitive for a [`DataType`]
macro_rules! dispatch_type {
    ($dtype:expr, $t:ident => $body:expr) => {
        match $dtype {
            $crate::types::DataType::U8 => {
                type $t = u8;
                $body
            }
            $crate::types::DataType::I8 => {
                type $t = i8;
                $body
            }
            $crate::types::DataType::U16 => {
                type $t = u16;
                $body
            }
            $crate::types::DataType::I16 => {
                type $t = i16;
                $body
            }
            $crate::types::DataType::U32 => {
                type $t = u32;
                $body
            }
            $crate::types::DataType::I32 => {
                type $t = i32;
                $body
            }
            $crate::types::DataType::U64 => {
                type $t = u64;
                $body
            }
            $crate::types::DataType::I64 => {
                type $t = i64;
                $body
            }
            $crate::types::DataType::F32 => {
                type $t = f32;
                $body
            }
            $crate::types::DataType::F64 => {
                type $t = f64;
                $body
            }
        }
    };
}

pub(crate) use dispatch_array;
pub(crate) use dispatch_type;
pub(crate) use map_array;

impl ArrayData {
    pub fn data_type(&self) -> DataType {
        match self {
            ArrayData::U8(_) => DataType::U8,
            ArrayData::I8(_) => DataType::I8,
            ArrayData::U16(_) => DataType::U16,
            ArrayData::I16(_) => DataType::I16,
            ArrayData::U32(_) => DataType::U32,
            ArrayData::I32(_) => DataType::I32,
            ArrayData::U64(_) => DataType::U64,
            ArrayData::I64(_) => DataType::I64,
            ArrayData::F32(_) => DataType::F32,
            ArrayData::F64(_) => DataType::F64,
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        let shape = dispatch_array!(self, arr => arr.dim());
        [shape.0, shape.1, shape.2]
    }

    pub fn len(&self) -> usize {
        dispatch_array!(self, arr => arr.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode a flat buffer into typed values; trailing bytes shorter than one
/// element are ignored
pub fn decode_elements<T: Element>(bytes: &[u8], order: ByteOrder) -> Vec<T> {
    bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(|chunk| T::read_from(chunk, order))
        .collect()
}

/// Encode values into a flat buffer in the given order
pub fn encode_elements<'a, T, I>(values: I, order: ByteOrder) -> Vec<u8>
where
    T: Element + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let values = values.into_iter();
    let mut out = Vec::with_capacity(values.size_hint().0 * std::mem::size_of::<T>());
    for value in values {
        value.write_to(order, &mut out);
    }
    out
}
