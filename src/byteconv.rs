//! Flat binary conversions: element type reinterpretation and byte swapping

use crate::element::{decode_elements, dispatch_type, Element};
use crate::error::{Result, VolError};
use crate::types::{ByteOrder, DataType};
use crate::utils::{append_to_stem, prefix_file_name};
use crate::volume::Volume;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix of files written by the endian swap
pub const SWAP_PREFIX: &str = "SE_";

/// Element formats understood by the byte converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteFormat {
    Double,
    Float,
    Short,
    UShort,
    Int,
    UInt,
}

impl ByteFormat {
    pub const ALL: [ByteFormat; 6] = [
        ByteFormat::Double,
        ByteFormat::Float,
        ByteFormat::Short,
        ByteFormat::UShort,
        ByteFormat::Int,
        ByteFormat::UInt,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ByteFormat::Double => "double",
            ByteFormat::Float => "float",
            ByteFormat::Short => "short",
            ByteFormat::UShort => "ushort",
            ByteFormat::Int => "int",
            ByteFormat::UInt => "uint",
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ByteFormat::Double => DataType::F64,
            ByteFormat::Float => DataType::F32,
            ByteFormat::Short => DataType::I16,
            ByteFormat::UShort => DataType::U16,
            ByteFormat::Int => DataType::I32,
            ByteFormat::UInt => DataType::U32,
        }
    }

    /// Extension of converted output files, including the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ByteFormat::Double => ".d64",
            ByteFormat::Float => ".f32",
            ByteFormat::Short => ".s2",
            ByteFormat::UShort => ".us2",
            ByteFormat::Int => ".int32",
            ByteFormat::UInt => ".uint32",
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        self.data_type().size_in_bytes()
    }
}

impl fmt::Display for ByteFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ByteFormat {
    type Err = VolError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        ByteFormat::ALL
            .into_iter()
            .find(|f| f.name() == lower)
            .ok_or_else(|| {
                VolError::InvalidArgument(format!(
                    "unknown format '{}' (expected double, float, short, ushort, int or uint)",
                    s.trim()
                ))
            })
    }
}

/// `<input without extension>_converted<target extension>`
pub fn converted_path(input: &Path, target: ByteFormat) -> PathBuf {
    append_to_stem(input, &format!("_converted{}", target.extension()))
}

/// `SE_<basename>` next to the input
pub fn swapped_path(input: &Path) -> PathBuf {
    prefix_file_name(input, SWAP_PREFIX)
}

/// Convert the first `count` elements of `bytes` from `source` to `target`.
///
/// Values go through a plain numeric cast (via `f64`); out-of-range values
/// saturate at the target type's bounds. Bytes past `count` elements are
/// ignored.
pub fn convert_elements(
    bytes: &[u8],
    count: usize,
    source: ByteFormat,
    target: ByteFormat,
    order: ByteOrder,
) -> Result<Vec<u8>> {
    let available = bytes.len() / source.size_in_bytes();
    if available < count {
        return Err(VolError::TruncatedInput {
            expected: count,
            available,
        });
    }
    let input = &bytes[..count * source.size_in_bytes()];

    let values: Vec<f64> = dispatch_type!(source.data_type(), S => {
        decode_elements::<S>(input, order)
            .into_iter()
            .map(|v| v.to_f64())
            .collect()
    });

    Ok(dispatch_type!(target.data_type(), T => cast_and_encode::<T>(&values, order)))
}

fn cast_and_encode<T: Element>(values: &[f64], order: ByteOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * std::mem::size_of::<T>());
    for &v in values {
        T::cast_from_f64(v).write_to(order, &mut out);
    }
    out
}

/// Re-encode a (x, y, z) volume of `data_type` from `order` into the
/// opposite byte order
pub fn swap_endian(
    bytes: &[u8],
    dims: (usize, usize, usize),
    data_type: DataType,
    order: ByteOrder,
) -> Result<Vec<u8>> {
    let volume = Volume::from_bytes(bytes, dims, data_type, order)?;
    Ok(volume.to_bytes(order.opposite()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::encode_elements;

    #[test]
    fn test_int_to_float() {
        let input = encode_elements(&[1i32, 2, 3], ByteOrder::Little);
        let out = convert_elements(&input, 3, ByteFormat::Int, ByteFormat::Float, ByteOrder::Little)
            .unwrap();
        assert_eq!(out.len(), 12);
        assert_eq!(decode_elements::<f32>(&out, ByteOrder::Little), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_double_to_short_saturates() {
        let input = encode_elements(&[1.9f64, -70000.0, 123.0], ByteOrder::Little);
        let out = convert_elements(&input, 3, ByteFormat::Double, ByteFormat::Short, ByteOrder::Little)
            .unwrap();
        assert_eq!(decode_elements::<i16>(&out, ByteOrder::Little), vec![1, i16::MIN, 123]);
    }

    #[test]
    fn test_truncated_input() {
        let input = encode_elements(&[1u16, 2], ByteOrder::Little);
        let err = convert_elements(&input, 3, ByteFormat::UShort, ByteFormat::UInt, ByteOrder::Little)
            .unwrap_err();
        assert!(matches!(
            err,
            VolError::TruncatedInput {
                expected: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn test_extra_input_is_ignored() {
        let input = encode_elements(&[7u32, 8, 9], ByteOrder::Big);
        let out = convert_elements(&input, 2, ByteFormat::UInt, ByteFormat::Double, ByteOrder::Big)
            .unwrap();
        assert_eq!(decode_elements::<f64>(&out, ByteOrder::Big), vec![7.0, 8.0]);
    }

    #[test]
    fn test_format_names() {
        assert_eq!("UShort".parse::<ByteFormat>().unwrap(), ByteFormat::UShort);
        assert_eq!(ByteFormat::Int.extension(), ".int32");
        assert!(matches!(
            "long".parse::<ByteFormat>(),
            Err(VolError::InvalidArgument(_))
        ));
        assert_eq!(
            converted_path(Path::new("dir/data.bin"), ByteFormat::Double),
            PathBuf::from("dir/data_converted.d64")
        );
    }

    #[test]
    fn test_swap_uint16() {
        let input = [0x02, 0x01, 0x04, 0x03];
        let out = swap_endian(&input, (1, 1, 2), DataType::U16, ByteOrder::Little).unwrap();
        assert_eq!(out, vec![0x01, 0x02, 0x03, 0x04]);
        assert_eq!(decode_elements::<u16>(&out, ByteOrder::Big), vec![0x0102, 0x0304]);
    }

    #[test]
    fn test_swap_is_elementwise_for_wide_types() {
        let input = encode_elements(&[1.0f64, -2.5], ByteOrder::Big);
        let out = swap_endian(&input, (2, 1, 1), DataType::F64, ByteOrder::Big).unwrap();
        assert_eq!(decode_elements::<f64>(&out, ByteOrder::Little), vec![1.0, -2.5]);
    }

    #[test]
    fn test_swap_size_mismatch() {
        let err = swap_endian(&[0u8; 8], (2, 2, 2), DataType::U16, ByteOrder::Little).unwrap_err();
        assert!(matches!(
            err,
            VolError::SizeMismatch {
                expected: 8,
                actual: 4
            }
        ));
        assert_eq!(swapped_path(Path::new("in/vol.bin")), PathBuf::from("in/SE_vol.bin"));
    }

    #[test]
    fn test_swap_rejects_overflowing_dims() {
        let err = swap_endian(&[0u8; 4], (1usize << 32, 1usize << 32, 2), DataType::U16, ByteOrder::Little)
            .unwrap_err();
        assert!(matches!(err, VolError::InvalidArgument(_)));
    }
}
