//! Legacy VTK `STRUCTURED_POINTS` writer
//!
//! The payload is flattened with width varying fastest, then height, then
//! depth. Binary payloads are always big-endian.

use crate::element::{ArrayData, Element};
use crate::types::{ByteOrder, Spacing};
use crate::volume::Volume;
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

pub const VTK_MAGIC: &str = "# vtk DataFile Version 3.0";

pub const DEFAULT_TITLE: &str = "TIF to VTK conversion";

/// Payload encoding of a VTK file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VtkEncoding {
    #[default]
    Binary,
    Ascii,
}

impl VtkEncoding {
    pub fn keyword(&self) -> &'static str {
        match self {
            VtkEncoding::Binary => "BINARY",
            VtkEncoding::Ascii => "ASCII",
        }
    }
}

/// VTK scalar types this writer emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    UnsignedChar,
    UnsignedShort,
    Float,
}

impl ScalarType {
    pub fn keyword(&self) -> &'static str {
        match self {
            ScalarType::UnsignedChar => "unsigned_char",
            ScalarType::UnsignedShort => "unsigned_short",
            ScalarType::Float => "float",
        }
    }
}

/// Scalars converted to a type VTK readers accept
#[derive(Debug, Clone, PartialEq)]
pub enum VtkScalars {
    UnsignedChar(Array3<u8>),
    UnsignedShort(Array3<u16>),
    Float(Array3<f32>),
}

impl VtkScalars {
    /// Map a volume's samples to a VTK scalar type.
    ///
    /// `uint8` and `uint16` pass through, floats become `float`; anything
    /// else is rescaled from its observed range into `[0, 255]`.
    pub fn from_volume(volume: &Volume) -> Self {
        match volume.data() {
            ArrayData::U8(arr) => VtkScalars::UnsignedChar(arr.clone()),
            ArrayData::U16(arr) => VtkScalars::UnsignedShort(arr.clone()),
            ArrayData::F32(arr) => VtkScalars::Float(arr.clone()),
            ArrayData::F64(arr) => VtkScalars::Float(arr.mapv(|v| v as f32)),
            ArrayData::I8(arr) => VtkScalars::UnsignedChar(rescale_to_u8(arr)),
            ArrayData::I16(arr) => VtkScalars::UnsignedChar(rescale_to_u8(arr)),
            ArrayData::U32(arr) => VtkScalars::UnsignedChar(rescale_to_u8(arr)),
            ArrayData::I32(arr) => VtkScalars::UnsignedChar(rescale_to_u8(arr)),
            ArrayData::U64(arr) => VtkScalars::UnsignedChar(rescale_to_u8(arr)),
            ArrayData::I64(arr) => VtkScalars::UnsignedChar(rescale_to_u8(arr)),
        }
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            VtkScalars::UnsignedChar(_) => ScalarType::UnsignedChar,
            VtkScalars::UnsignedShort(_) => ScalarType::UnsignedShort,
            VtkScalars::Float(_) => ScalarType::Float,
        }
    }

    fn write_binary(&self, out: &mut Vec<u8>) {
        match self {
            VtkScalars::UnsignedChar(arr) => write_big_endian(arr, out),
            VtkScalars::UnsignedShort(arr) => write_big_endian(arr, out),
            VtkScalars::Float(arr) => write_big_endian(arr, out),
        }
    }

    fn write_ascii(&self, out: &mut String) {
        match self {
            VtkScalars::UnsignedChar(arr) => {
                for v in arr.iter() {
                    let _ = writeln!(out, "{}", v);
                }
            }
            VtkScalars::UnsignedShort(arr) => {
                for v in arr.iter() {
                    let _ = writeln!(out, "{}", v);
                }
            }
            VtkScalars::Float(arr) => {
                for v in arr.iter() {
                    let _ = writeln!(out, "{:.6}", v);
                }
            }
        }
    }
}

fn write_big_endian<T: Element>(arr: &Array3<T>, out: &mut Vec<u8>) {
    out.reserve(arr.len() * std::mem::size_of::<T>());
    for v in arr.iter() {
        v.write_to(ByteOrder::Big, out);
    }
}

/// Linear rescale of observed [min, max] to [0, 255]; all zeros when the
/// range is degenerate
fn rescale_to_u8<T: Element>(arr: &Array3<T>) -> Array3<u8> {
    let (min, max) = arr.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        let v = v.to_f64();
        (lo.min(v), hi.max(v))
    });
    if max <= min {
        return Array3::zeros(arr.raw_dim());
    }
    let span = max - min;
    arr.mapv(|v| ((v.to_f64() - min) / span * 255.0) as u8)
}

/// Header text, newline-terminated
pub fn header(
    title: &str,
    encoding: VtkEncoding,
    dims: (usize, usize, usize),
    spacing: Spacing,
    scalar_type: ScalarType,
) -> String {
    let (width, height, depth) = dims;
    format!(
        "{magic}\n{title}\n{mode}\nDATASET STRUCTURED_POINTS\n\
         DIMENSIONS {width} {height} {depth}\n\
         SPACING {sx:.6} {sy:.6} {sz:.6}\n\
         ORIGIN 0.0 0.0 0.0\n\
         POINT_DATA {points}\n\
         SCALARS image_data {scalar} 1\n\
         LOOKUP_TABLE default\n",
        magic = VTK_MAGIC,
        title = title,
        mode = encoding.keyword(),
        width = width,
        height = height,
        depth = depth,
        sx = spacing.x,
        sy = spacing.y,
        sz = spacing.z,
        points = width * height * depth,
        scalar = scalar_type.keyword(),
    )
}

/// Serialize a volume to a complete legacy VTK file
pub fn encode_vtk(volume: &Volume, spacing: Spacing, encoding: VtkEncoding, title: &str) -> Vec<u8> {
    let scalars = VtkScalars::from_volume(volume);
    let head = header(title, encoding, volume.dims(), spacing, scalars.scalar_type());

    match encoding {
        VtkEncoding::Binary => {
            let mut out = head.into_bytes();
            scalars.write_binary(&mut out);
            out
        }
        VtkEncoding::Ascii => {
            let mut out = head;
            scalars.write_ascii(&mut out);
            out.into_bytes()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn split_header(bytes: &[u8]) -> (Vec<String>, &[u8]) {
        let mut lines = Vec::new();
        let mut start = 0;
        for (i, b) in bytes.iter().enumerate() {
            if *b == b'\n' {
                lines.push(String::from_utf8(bytes[start..i].to_vec()).unwrap());
                start = i + 1;
                if lines.len() == 10 {
                    break;
                }
            }
        }
        (lines, &bytes[start..])
    }

    #[test]
    fn test_uint8_binary_scenario() {
        let volume = Volume::new(array![[[0u8, 255], [128, 64]], [[10, 20], [30, 40]]]);
        let bytes = encode_vtk(&volume, Spacing::default(), VtkEncoding::Binary, DEFAULT_TITLE);
        let (lines, payload) = split_header(&bytes);
        assert_eq!(
            lines,
            vec![
                "# vtk DataFile Version 3.0",
                "TIF to VTK conversion",
                "BINARY",
                "DATASET STRUCTURED_POINTS",
                "DIMENSIONS 2 2 2",
                "SPACING 1.000000 1.000000 1.000000",
                "ORIGIN 0.0 0.0 0.0",
                "POINT_DATA 8",
                "SCALARS image_data unsigned_char 1",
                "LOOKUP_TABLE default",
            ]
        );
        assert_eq!(payload, &[0x00, 0xFF, 0x80, 0x40, 0x0A, 0x14, 0x1E, 0x28]);
    }

    #[test]
    fn test_dimensions_are_width_height_depth() {
        let volume = Volume::new(Array3::<u16>::zeros((5, 3, 7)));
        let bytes = encode_vtk(&volume, Spacing::new(0.5, 0.25, 2.0), VtkEncoding::Binary, "t");
        let (lines, payload) = split_header(&bytes);
        assert_eq!(lines[4], "DIMENSIONS 7 3 5");
        assert_eq!(lines[5], "SPACING 0.500000 0.250000 2.000000");
        assert_eq!(lines[7], "POINT_DATA 105");
        assert_eq!(lines[8], "SCALARS image_data unsigned_short 1");
        assert_eq!(payload.len(), 105 * 2);
    }

    #[test]
    fn test_uint16_payload_big_endian() {
        let volume = Volume::new(array![[[0x0102u16, 0xA0B0]]]);
        let bytes = encode_vtk(&volume, Spacing::default(), VtkEncoding::Binary, "t");
        let (_, payload) = split_header(&bytes);
        assert_eq!(payload, &[0x01, 0x02, 0xA0, 0xB0]);
    }

    #[test]
    fn test_float64_is_downcast() {
        let volume = Volume::new(array![[[1.5f64, -2.0]]]);
        let bytes = encode_vtk(&volume, Spacing::default(), VtkEncoding::Binary, "t");
        let (lines, payload) = split_header(&bytes);
        assert_eq!(lines[8], "SCALARS image_data float 1");
        let mut expected = 1.5f32.to_be_bytes().to_vec();
        expected.extend_from_slice(&(-2.0f32).to_be_bytes());
        assert_eq!(payload, expected.as_slice());
    }

    #[test]
    fn test_other_types_are_rescaled() {
        let volume = Volume::new(array![[[-100i16, 0, 100]]]);
        let scalars = VtkScalars::from_volume(&volume);
        assert_eq!(scalars, VtkScalars::UnsignedChar(array![[[0u8, 127, 255]]]));
    }

    #[test]
    fn test_rescale_reaches_full_scale() {
        for top in [25i32, 29, 50, 200, 99_999] {
            let volume = Volume::new(array![[[0i32, top]]]);
            assert_eq!(
                VtkScalars::from_volume(&volume),
                VtkScalars::UnsignedChar(array![[[0u8, 255]]]),
                "range 0..{}",
                top
            );
        }

        let volume = Volume::new(array![[[0i16, 25]]]);
        assert_eq!(
            VtkScalars::from_volume(&volume),
            VtkScalars::UnsignedChar(array![[[0u8, 255]]])
        );

        // (v - min) / (max - min) * 255, truncated
        let volume = Volume::new(array![[[0u32, 1, 2, 3]]]);
        assert_eq!(
            VtkScalars::from_volume(&volume),
            VtkScalars::UnsignedChar(array![[[0u8, 85, 170, 255]]])
        );
    }

    #[test]
    fn test_degenerate_range_is_zero() {
        let volume = Volume::new(array![[[42i32, 42], [42, 42]]]);
        let scalars = VtkScalars::from_volume(&volume);
        assert_eq!(scalars, VtkScalars::UnsignedChar(Array3::zeros((1, 2, 2))));
    }

    #[test]
    fn test_ascii_payload() {
        let volume = Volume::new(array![[[0.5f32, 2.0]]]);
        let text = String::from_utf8(encode_vtk(
            &volume,
            Spacing::default(),
            VtkEncoding::Ascii,
            DEFAULT_TITLE,
        ))
        .unwrap();
        assert!(text.contains("\nASCII\n"));
        assert!(text.ends_with("LOOKUP_TABLE default\n0.500000\n2.000000\n"));

        let volume = Volume::new(array![[[7u8], [9]]]);
        let text = String::from_utf8(encode_vtk(
            &volume,
            Spacing::default(),
            VtkEncoding::Ascii,
            DEFAULT_TITLE,
        ))
        .unwrap();
        assert!(text.ends_with("LOOKUP_TABLE default\n7\n9\n"));
    }
}
