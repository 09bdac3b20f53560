//! Per-slice horizontal shear correction

use crate::element::Element;
use crate::error::{Result, VolError};
use crate::volume::{ArrayTransform, Volume};
use ndarray::{s, Array3, ArrayView3};

/// Column offsets of every slice for a shear of `offset_per_slice`.
///
/// Offsets are `floor(i * k)` shifted so the smallest is zero, which keeps
/// negative shears from pushing samples off the left edge.
pub fn slice_offsets(depth: usize, offset_per_slice: f64) -> Vec<usize> {
    let raw: Vec<i64> = (0..depth)
        .map(|i| (i as f64 * offset_per_slice).floor() as i64)
        .collect();
    let min = raw.iter().copied().min().unwrap_or(0);
    raw.into_iter().map(|base| (base - min) as usize).collect()
}

/// Shift slice `i` right by `floor(i * k)` columns into a zero-filled,
/// wider array. Depth and height are unchanged.
pub fn deskew_array<T: Element>(volume: ArrayView3<T>, offset_per_slice: f64) -> Array3<T> {
    let (depth, height, width) = volume.dim();
    let offsets = slice_offsets(depth, offset_per_slice);
    let new_width = width + offsets.iter().copied().max().unwrap_or(0);

    let mut out = Array3::<T>::zeros((depth, height, new_width));
    for (i, base) in offsets.into_iter().enumerate() {
        out.slice_mut(s![i, .., base..base + width])
            .assign(&volume.slice(s![i, .., ..]));
    }
    out
}

/// Deskew transform usable with [`Volume::map`]
#[derive(Debug, Clone, Copy)]
pub struct Deskew {
    offset_per_slice: f64,
}

impl Deskew {
    pub fn new(offset_per_slice: f64) -> Result<Self> {
        if !offset_per_slice.is_finite() {
            return Err(VolError::InvalidArgument(format!(
                "deskew offset must be finite, got {}",
                offset_per_slice
            )));
        }
        Ok(Self { offset_per_slice })
    }

    pub fn offset_per_slice(&self) -> f64 {
        self.offset_per_slice
    }

    pub fn apply_to(&self, volume: Volume) -> Volume {
        let (width, height, depth) = volume.dims();
        let deskewed = volume.map(*self);
        log::info!(
            "Deskewed volume from {}x{}x{} to {}x{}x{}",
            width,
            height,
            depth,
            deskewed.width(),
            height,
            depth
        );
        deskewed
    }
}

impl ArrayTransform for Deskew {
    fn apply<T: Element>(&self, array: Array3<T>) -> Array3<T> {
        deskew_array(array.view(), self.offset_per_slice)
    }
}
