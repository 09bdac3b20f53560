//! Channel reduction: RGB/RGBA to a single luminosity channel

use crate::element::Element;
use crate::error::{Result, VolError};
use ndarray::{Array2, Array3, ArrayView3, ArrayView4, Axis, Zip};

/// Luminosity weights for the R, G and B channels
pub const LUMA_WEIGHTS: [f64; 3] = [0.2989, 0.5870, 0.1140];

/// How a frame's channel axis is turned into scalar samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// One sample per pixel
    Scalar,
    /// Three or four channels (RGB or RGBA), reduced by luminosity
    Color(usize),
}

impl ChannelLayout {
    pub fn from_channels(channels: usize) -> Result<Self> {
        match channels {
            1 => Ok(ChannelLayout::Scalar),
            3 | 4 => Ok(ChannelLayout::Color(channels)),
            other => Err(VolError::Format(format!(
                "unsupported channel count {} (expected 1, 3 or 4)",
                other
            ))),
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            ChannelLayout::Scalar => 1,
            ChannelLayout::Color(n) => *n,
        }
    }
}

/// Weighted intensity of one pixel; alpha is never read
pub fn luminance(r: f64, g: f64, b: f64) -> f64 {
    LUMA_WEIGHTS[0] * r + LUMA_WEIGHTS[1] * g + LUMA_WEIGHTS[2] * b
}

/// Reduce a (height, width, channels) frame to (height, width)
pub fn reduce_frame<T: Element>(frame: ArrayView3<T>) -> Result<Array2<T>> {
    let (height, width, channels) = frame.dim();
    if channels != 3 && channels != 4 {
        return Err(VolError::Format(format!(
            "channel reduction needs 3 or 4 channels, got {}",
            channels
        )));
    }

    let mut out = Array2::<T>::zeros((height, width));
    Zip::from(&mut out)
        .and(frame.lanes(Axis(2)))
        .for_each(|dst, px| {
            *dst = T::from_luminance(luminance(px[0].to_f64(), px[1].to_f64(), px[2].to_f64()));
        });
    Ok(out)
}

/// Reduce a (depth, height, width, channels) stack to (depth, height, width)
pub fn reduce_volume<T: Element>(stack: ArrayView4<T>) -> Result<Array3<T>> {
    let (depth, height, width, _) = stack.dim();
    let mut out = Array3::<T>::zeros((depth, height, width));
    for (mut dst, src) in out.outer_iter_mut().zip(stack.outer_iter()) {
        dst.assign(&reduce_frame(src)?);
    }
    Ok(out)
}
