//! Headerless raw volume files

use crate::error::Result;
use crate::types::{ByteOrder, DataType};
use crate::volume::Volume;

/// `<basename>_<width>x<height>x<depth>_<typeName>.raw`
pub fn raw_file_name(basename: &str, volume: &Volume) -> String {
    let (width, height, depth) = volume.dims();
    format!(
        "{}_{}x{}x{}_{}.raw",
        basename,
        width,
        height,
        depth,
        volume.data_type().raw_name()
    )
}

/// Serialize a volume with every element encoded in `order`
pub fn encode_raw(volume: &Volume, order: ByteOrder) -> Vec<u8> {
    volume.to_bytes(order)
}

/// Rebuild a volume from raw bytes; `dims` is (width, height, depth)
pub fn decode_raw(
    bytes: &[u8],
    dims: (usize, usize, usize),
    data_type: DataType,
    order: ByteOrder,
) -> Result<Volume> {
    Volume::from_bytes(bytes, dims, data_type, order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{dispatch_type, Element};
    use crate::error::VolError;
    use ndarray::Array3;

    fn synthetic<T: Element>() -> Volume {
        let array = Array3::from_shape_fn((3, 2, 4), |(z, y, x)| {
            T::cast_from_f64((z * 8 + y * 4 + x) as f64 * 3.0 - 20.0)
        });
        Volume::new(array)
    }

    #[test]
    fn test_round_trip_all_types() {
        for dt in DataType::ALL {
            let volume = dispatch_type!(dt, T => synthetic::<T>());
            for order in [ByteOrder::Little, ByteOrder::Big] {
                let bytes = encode_raw(&volume, order);
                assert_eq!(bytes.len(), volume.size_in_bytes());
                let decoded = decode_raw(&bytes, volume.dims(), dt, order).unwrap();
                assert_eq!(decoded, volume, "{} {}", dt, order);
            }
        }
    }

    #[test]
    fn test_big_endian_is_swapped_elementwise() {
        let volume = Volume::new(Array3::from_shape_vec((1, 1, 2), vec![0x0102u16, 0x0304]).unwrap());
        assert_eq!(encode_raw(&volume, ByteOrder::Little), vec![2, 1, 4, 3]);
        assert_eq!(encode_raw(&volume, ByteOrder::Big), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_file_names() {
        let volume = Volume::new(Array3::<i8>::zeros((5, 3, 4)));
        assert_eq!(raw_file_name("stack", &volume), "stack_4x3x5_char.raw");

        let volume = Volume::new(Array3::<u64>::zeros((1, 2, 2)));
        assert_eq!(raw_file_name("slice_", &volume), "slice__2x2x1_uint64.raw");
    }

    #[test]
    fn test_decode_wrong_length() {
        let err = decode_raw(&[0u8; 7], (2, 2, 1), DataType::U16, ByteOrder::Little).unwrap_err();
        assert!(matches!(err, VolError::SizeMismatch { .. }));
    }
}
