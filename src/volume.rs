//! In-memory volume model

use crate::element::{dispatch_array, dispatch_type, map_array, ArrayData, Element};
use crate::error::{Result, VolError};
use crate::types::{ByteOrder, DataType, ValueRange};
use ndarray::Array3;

/// A dense scalar volume indexed (depth, height, width)
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: ArrayData,
}

impl Volume {
    pub fn new<T: Element>(array: Array3<T>) -> Self {
        Self {
            data: T::wrap(array),
        }
    }

    /// Wrap already-typed data laid out as (depth, height, width)
    pub fn from_data(data: ArrayData) -> Self {
        Self { data }
    }

    /// Rebuild a volume from a flat buffer.
    ///
    /// `dims` is (width, height, depth); the buffer must hold exactly
    /// `width * height * depth` elements of `data_type`.
    pub fn from_bytes(
        bytes: &[u8],
        dims: (usize, usize, usize),
        data_type: DataType,
        order: ByteOrder,
    ) -> Result<Self> {
        let (width, height, depth) = dims;
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(depth))
            .ok_or_else(|| {
                VolError::InvalidArgument(format!(
                    "dimensions {}x{}x{} overflow the element count",
                    width, height, depth
                ))
            })?;
        let size = data_type.size_in_bytes();
        if bytes.len() % size != 0 || bytes.len() / size != expected {
            return Err(VolError::SizeMismatch {
                expected,
                actual: bytes.len() / size,
            });
        }

        dispatch_type!(data_type, T => {
            let values = crate::element::decode_elements::<T>(bytes, order);
            Ok(Self::new(Array3::from_shape_vec((depth, height, width), values)?))
        })
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    /// Borrow the typed array if the volume holds `T`
    pub fn as_array<T: Element>(&self) -> Option<&Array3<T>> {
        T::as_array(&self.data)
    }

    pub fn depth(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn height(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn width(&self) -> usize {
        self.data.shape()[2]
    }

    /// Extents as (width, height, depth)
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.width(), self.height(), self.depth())
    }

    pub fn num_voxels(&self) -> usize {
        self.data.len()
    }

    pub fn size_in_bytes(&self) -> usize {
        self.num_voxels() * self.data_type().size_in_bytes()
    }

    /// Observed minimum and maximum sample values
    pub fn value_range(&self) -> ValueRange {
        dispatch_array!(&self.data, arr => observed_range(arr))
    }

    /// Flatten to bytes in (depth, height, width) row-major order, every
    /// element encoded in `order`
    pub fn to_bytes(&self, order: ByteOrder) -> Vec<u8> {
        dispatch_array!(&self.data, arr => crate::element::encode_elements(arr.iter(), order))
    }

    /// Apply a shape-changing transform that keeps the element type
    pub fn map<F>(self, f: F) -> Self
    where
        F: ArrayTransform,
    {
        Self {
            data: map_array!(self.data, arr => f.apply(arr)),
        }
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        format!(
            "{}x{}x{} ({}), {}",
            self.width(),
            self.height(),
            self.depth(),
            self.data_type(),
            crate::utils::format_bytes(self.size_in_bytes())
        )
    }
}

/// A transform generic over the element type, used with [`Volume::map`]
pub trait ArrayTransform {
    fn apply<T: Element>(&self, array: Array3<T>) -> Array3<T>;
}

fn observed_range<T: Element>(array: &Array3<T>) -> ValueRange {
    let mut values = array.iter().map(|v| v.to_f64());
    match values.next() {
        Some(first) => {
            let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
            ValueRange::new(min, max)
        }
        None => ValueRange::new(0.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_volume() -> Volume {
        Volume::new(array![[[0u8, 255], [128, 64]], [[10, 20], [30, 40]]])
    }

    #[test]
    fn test_dims() {
        let volume = Volume::new(Array3::<i16>::zeros((4, 3, 2)));
        assert_eq!(volume.dims(), (2, 3, 4));
        assert_eq!(volume.num_voxels(), 24);
        assert_eq!(volume.size_in_bytes(), 48);
        assert_eq!(volume.data_type(), DataType::I16);
    }

    #[test]
    fn test_value_range() {
        let range = sample_volume().value_range();
        assert_eq!(range.min, 0.0);
        assert_eq!(range.max, 255.0);
    }

    #[test]
    fn test_to_bytes_is_row_major() {
        assert_eq!(
            sample_volume().to_bytes(ByteOrder::Big),
            vec![0x00, 0xFF, 0x80, 0x40, 0x0A, 0x14, 0x1E, 0x28]
        );
    }

    #[test]
    fn test_from_bytes_size_mismatch() {
        let err = Volume::from_bytes(&[0u8; 6], (2, 2, 1), DataType::U16, ByteOrder::Little)
            .unwrap_err();
        assert!(matches!(
            err,
            VolError::SizeMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_from_bytes_overflowing_dims() {
        let err = Volume::from_bytes(&[0u8; 4], (1usize << 32, 1usize << 32, 2), DataType::U16, ByteOrder::Little)
            .unwrap_err();
        assert!(matches!(err, VolError::InvalidArgument(_)));

        let err = Volume::from_bytes(&[0u8; 4], (usize::MAX, 2, 1), DataType::U8, ByteOrder::Little)
            .unwrap_err();
        assert!(matches!(err, VolError::InvalidArgument(_)));
    }

    #[test]
    fn test_from_bytes_layout() {
        let bytes = [1u8, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0];
        let volume =
            Volume::from_bytes(&bytes, (3, 2, 1), DataType::U16, ByteOrder::Little).unwrap();
        let arr = volume.as_array::<u16>().unwrap();
        assert_eq!(volume.dims(), (3, 2, 1));
        assert_eq!(arr[[0, 1, 0]], 4);
        assert_eq!(arr[[0, 0, 2]], 3);
    }

    #[test]
    fn test_summary() {
        assert_eq!(sample_volume().summary(), "2x2x2 (uint8), 8 B");
    }
}
