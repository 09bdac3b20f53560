//! Image stack decoders.
//!
//! Decoding is an ordered list of [`StackDecoder`] strategies; the first one
//! that returns frames wins. The default order is the multi-page TIFF decoder
//! followed by the generic raster decoder from the `image` crate.

use crate::element::{ArrayData, Element};
use crate::error::{Result, VolError};
use crate::types::DataType;
use image::DynamicImage;
use ndarray::Array3;
use std::io::Cursor;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::ColorType;

/// One decoded image, laid out (height, width, channels)
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    data: ArrayData,
}

impl Frame {
    pub fn new<T: Element>(array: Array3<T>) -> Self {
        Self {
            data: T::wrap(array),
        }
    }

    fn from_samples<T: Element>(
        height: usize,
        width: usize,
        channels: usize,
        samples: Vec<T>,
    ) -> Result<Self> {
        let len = samples.len();
        let array = Array3::from_shape_vec((height, width, channels), samples).map_err(|_| {
            VolError::Decode(format!(
                "{} samples do not fill a {}x{}x{} frame",
                len, width, height, channels
            ))
        })?;
        Ok(Self::new(array))
    }

    pub fn height(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn width(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn channels(&self) -> usize {
        self.data.shape()[2]
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }
}

/// A strategy for turning file contents into frames
pub trait StackDecoder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decode every frame in stored order
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Frame>>;
}

/// Multi-page TIFF decoder
#[derive(Debug, Default)]
pub struct TiffStackDecoder;

fn tiff_error(err: tiff::TiffError) -> VolError {
    VolError::Decode(err.to_string())
}

impl TiffStackDecoder {
    fn read_frame<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<Frame> {
        let (width, height) = decoder.dimensions().map_err(tiff_error)?;
        let channels = match decoder.colortype().map_err(tiff_error)? {
            ColorType::Gray(_) => 1,
            ColorType::GrayA(_) => 2,
            ColorType::RGB(_) => 3,
            ColorType::RGBA(_) => 4,
            other => {
                return Err(VolError::Decode(format!(
                    "unsupported TIFF color type {:?}",
                    other
                )))
            }
        };
        let (h, w) = (height as usize, width as usize);

        match decoder.read_image().map_err(tiff_error)? {
            DecodingResult::U8(v) => Frame::from_samples(h, w, channels, v),
            DecodingResult::I8(v) => Frame::from_samples(h, w, channels, v),
            DecodingResult::U16(v) => Frame::from_samples(h, w, channels, v),
            DecodingResult::I16(v) => Frame::from_samples(h, w, channels, v),
            DecodingResult::U32(v) => Frame::from_samples(h, w, channels, v),
            DecodingResult::I32(v) => Frame::from_samples(h, w, channels, v),
            DecodingResult::U64(v) => Frame::from_samples(h, w, channels, v),
            DecodingResult::I64(v) => Frame::from_samples(h, w, channels, v),
            DecodingResult::F32(v) => Frame::from_samples(h, w, channels, v),
            DecodingResult::F64(v) => Frame::from_samples(h, w, channels, v),
            #[allow(unreachable_patterns)]
            _ => Err(VolError::Decode(
                "unsupported TIFF sample format".to_string(),
            )),
        }
    }
}

impl StackDecoder for TiffStackDecoder {
    fn name(&self) -> &'static str {
        "tiff"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Frame>> {
        let mut decoder = Decoder::new(Cursor::new(bytes))
            .map_err(tiff_error)?
            .with_limits(Limits::unlimited());

        let mut frames = Vec::new();
        loop {
            frames.push(Self::read_frame(&mut decoder)?);
            if !decoder.more_images() {
                break;
            }
            decoder.next_image().map_err(tiff_error)?;
        }
        Ok(frames)
    }
}

/// Single-frame fallback backed by the `image` crate
#[derive(Debug, Default)]
pub struct RasterDecoder;

impl StackDecoder for RasterDecoder {
    fn name(&self) -> &'static str {
        "image"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Frame>> {
        let img = image::load_from_memory(bytes).map_err(|e| VolError::Decode(e.to_string()))?;
        let (h, w) = (img.height() as usize, img.width() as usize);

        let frame = match img {
            DynamicImage::ImageLuma8(buf) => Frame::from_samples(h, w, 1, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => Frame::from_samples(h, w, 2, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => Frame::from_samples(h, w, 3, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => Frame::from_samples(h, w, 4, buf.into_raw()),
            DynamicImage::ImageLuma16(buf) => Frame::from_samples(h, w, 1, buf.into_raw()),
            DynamicImage::ImageLumaA16(buf) => Frame::from_samples(h, w, 2, buf.into_raw()),
            DynamicImage::ImageRgb16(buf) => Frame::from_samples(h, w, 3, buf.into_raw()),
            DynamicImage::ImageRgba16(buf) => Frame::from_samples(h, w, 4, buf.into_raw()),
            DynamicImage::ImageRgb32F(buf) => Frame::from_samples(h, w, 3, buf.into_raw()),
            DynamicImage::ImageRgba32F(buf) => Frame::from_samples(h, w, 4, buf.into_raw()),
            other => Err(VolError::Decode(format!(
                "unsupported pixel layout {:?}",
                other.color()
            ))),
        }?;
        Ok(vec![frame])
    }
}

/// Decoder strategies in the order they are tried
pub fn default_decoders() -> Vec<Box<dyn StackDecoder>> {
    vec![Box::new(TiffStackDecoder), Box::new(RasterDecoder)]
}

/// Try each strategy in turn; fails with [`VolError::Decode`] listing every
/// strategy's error when none succeeds
pub fn decode_stack(
    decoders: &[Box<dyn StackDecoder>],
    bytes: &[u8],
    source: &Path,
) -> Result<Vec<Frame>> {
    let mut failures = Vec::new();
    for decoder in decoders {
        match decoder.decode(bytes) {
            Ok(frames) if !frames.is_empty() => {
                log::debug!(
                    "Decoded {} frame(s) from {} with the {} decoder",
                    frames.len(),
                    source.display(),
                    decoder.name()
                );
                return Ok(frames);
            }
            Ok(_) => failures.push(format!("{}: no frames", decoder.name())),
            Err(e) => {
                log::warn!("{} decoder failed on {}: {}", decoder.name(), source.display(), e);
                failures.push(format!("{}: {}", decoder.name(), e));
            }
        }
    }
    Err(VolError::Decode(format!(
        "{}: no decoder could read the file ({})",
        source.display(),
        failures.join("; ")
    )))
}
