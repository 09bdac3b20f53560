//! Core data types for volume conversion

use crate::error::{Result, VolError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Element types a volume can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DataType {
    /// Unsigned 8-bit integer
    U8 = 1,
    /// Unsigned 16-bit integer
    U16 = 2,
    /// Unsigned 32-bit integer
    U32 = 3,
    /// Unsigned 64-bit integer
    U64 = 4,
    /// Signed 8-bit integer
    I8 = 5,
    /// Signed 16-bit integer
    I16 = 6,
    /// Signed 32-bit integer
    I32 = 7,
    /// Signed 64-bit integer
    I64 = 8,
    /// 32-bit floating point
    F32 = 9,
    /// 64-bit floating point
    F64 = 10,
}

impl DataType {
    pub const ALL: [DataType; 10] = [
        DataType::U8,
        DataType::I8,
        DataType::U16,
        DataType::I16,
        DataType::U32,
        DataType::I32,
        DataType::U64,
        DataType::I64,
        DataType::F32,
        DataType::F64,
    ];

    /// Size in bytes of this data type
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::U16 | DataType::I16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
            DataType::U64 | DataType::I64 | DataType::F64 => 8,
        }
    }

    /// Check if this is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }

    /// Check if this is an integer type
    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }

    /// Check if values of this type carry a sign
    pub fn is_signed(&self) -> bool {
        !matches!(
            self,
            DataType::U8 | DataType::U16 | DataType::U32 | DataType::U64
        )
    }

    /// Canonical name, e.g. `uint16` or `float32`
    pub fn name(&self) -> &'static str {
        match self {
            DataType::U8 => "uint8",
            DataType::I8 => "int8",
            DataType::U16 => "uint16",
            DataType::I16 => "int16",
            DataType::U32 => "uint32",
            DataType::I32 => "int32",
            DataType::U64 => "uint64",
            DataType::I64 => "int64",
            DataType::F32 => "float32",
            DataType::F64 => "float64",
        }
    }

    /// Name used in raw output filenames.
    ///
    /// Types without a dedicated short name fall back to [`DataType::name`].
    pub fn raw_name(&self) -> &'static str {
        match self {
            DataType::U8 => "uint8",
            DataType::I8 => "char",
            DataType::U16 => "uint16",
            DataType::I16 => "int16",
            DataType::U32 => "uint",
            DataType::I32 => "int",
            DataType::F32 => "float32",
            DataType::F64 => "double64",
            DataType::U64 | DataType::I64 => self.name(),
        }
    }

    /// Representable value range of the type
    pub fn value_range(&self) -> ValueRange {
        match self {
            DataType::U8 => ValueRange::new(u8::MIN as f64, u8::MAX as f64),
            DataType::I8 => ValueRange::new(i8::MIN as f64, i8::MAX as f64),
            DataType::U16 => ValueRange::new(u16::MIN as f64, u16::MAX as f64),
            DataType::I16 => ValueRange::new(i16::MIN as f64, i16::MAX as f64),
            DataType::U32 => ValueRange::new(u32::MIN as f64, u32::MAX as f64),
            DataType::I32 => ValueRange::new(i32::MIN as f64, i32::MAX as f64),
            DataType::U64 => ValueRange::new(u64::MIN as f64, u64::MAX as f64),
            DataType::I64 => ValueRange::new(i64::MIN as f64, i64::MAX as f64),
            DataType::F32 => ValueRange::new(f32::MIN as f64, f32::MAX as f64),
            DataType::F64 => ValueRange::new(f64::MIN, f64::MAX),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = VolError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        DataType::ALL
            .into_iter()
            .find(|dt| dt.name() == lower)
            .ok_or_else(|| VolError::UnsupportedType(s.to_string()))
    }
}

/// Byte order of a flat buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    pub fn opposite(&self) -> Self {
        match self {
            ByteOrder::Little => ByteOrder::Big,
            ByteOrder::Big => ByteOrder::Little,
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Little => f.write_str("little"),
            ByteOrder::Big => f.write_str("big"),
        }
    }
}

impl FromStr for ByteOrder {
    type Err = VolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "little" => Ok(ByteOrder::Little),
            "big" => Ok(ByteOrder::Big),
            _ => Err(VolError::InvalidArgument(format!(
                "byte order must be 'little' or 'big', got '{}'",
                s
            ))),
        }
    }
}

/// Physical voxel size along width, height and depth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Spacing {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

impl Default for Spacing {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

/// Value range of a volume or a type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_sizes() {
        assert_eq!(DataType::U8.size_in_bytes(), 1);
        assert_eq!(DataType::I16.size_in_bytes(), 2);
        assert_eq!(DataType::F32.size_in_bytes(), 4);
        assert_eq!(DataType::F64.size_in_bytes(), 8);
    }

    #[test]
    fn test_raw_names() {
        assert_eq!(DataType::I8.raw_name(), "char");
        assert_eq!(DataType::U32.raw_name(), "uint");
        assert_eq!(DataType::I32.raw_name(), "int");
        assert_eq!(DataType::F64.raw_name(), "double64");
        assert_eq!(DataType::U64.raw_name(), "uint64");
        assert_eq!(DataType::I64.raw_name(), "int64");
    }

    #[test]
    fn test_parse_data_type() {
        assert_eq!("uint16".parse::<DataType>().unwrap(), DataType::U16);
        assert_eq!("Float64".parse::<DataType>().unwrap(), DataType::F64);
        for dt in DataType::ALL {
            assert_eq!(dt.name().parse::<DataType>().unwrap(), dt);
        }
        assert!(matches!(
            "complex64".parse::<DataType>(),
            Err(VolError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_signedness() {
        assert!(DataType::I8.is_signed());
        assert!(DataType::F32.is_signed());
        assert!(!DataType::U64.is_signed());
        assert!(DataType::U16.is_integer());
    }

    #[test]
    fn test_byte_order() {
        assert_eq!("BIG".parse::<ByteOrder>().unwrap(), ByteOrder::Big);
        assert_eq!(ByteOrder::Little.opposite(), ByteOrder::Big);
        assert_eq!(ByteOrder::default(), ByteOrder::Little);
        assert!("middle".parse::<ByteOrder>().is_err());
    }

    #[test]
    fn test_spacing_validation() {
        assert!(Spacing::default().is_valid());
        assert!(!Spacing::new(1.0, 0.0, 1.0).is_valid());
        assert!(!Spacing::new(1.0, 1.0, f64::NAN).is_valid());
    }

    #[test]
    fn test_value_range() {
        let range = DataType::I16.value_range();
        assert_eq!(range.min, -32768.0);
        assert_eq!(range.max, 32767.0);
        assert_eq!(ValueRange::new(-1.0, 3.0), ValueRange { min: -1.0, max: 3.0 });
    }
}
