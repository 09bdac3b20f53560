//! Volume reader: image stacks and prefix-numbered slice sequences

use crate::channels::{reduce_volume, ChannelLayout};
use crate::decode::{decode_stack, default_decoders, Frame, StackDecoder};
use crate::element::{dispatch_type, Element};
use crate::error::{Result, VolError};
use crate::io::IOManager;
use crate::volume::Volume;
use ndarray::{Array3, Array4, Axis};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A decoded slice and the file it came from
pub type Slice = (PathBuf, Frame);

/// Reads volumes through an [`IOManager`] using an ordered list of decoders
pub struct VolumeReader {
    io_manager: Arc<dyn IOManager>,
    decoders: Vec<Box<dyn StackDecoder>>,
}

impl VolumeReader {
    pub fn new(io_manager: Arc<dyn IOManager>) -> Self {
        Self {
            io_manager,
            decoders: default_decoders(),
        }
    }

    /// Replace the decoder strategies
    pub fn with_decoders(mut self, decoders: Vec<Box<dyn StackDecoder>>) -> Self {
        self.decoders = decoders;
        self
    }

    /// Decode every frame of a single stack file
    pub async fn read_stack_file(&self, path: &Path) -> Result<Volume> {
        let bytes = self.io_manager.read(path).await?;
        let frames = decode_stack(&self.decoders, &bytes, path)?;
        let slices = frames
            .into_iter()
            .map(|frame| (path.to_path_buf(), frame))
            .collect();
        let volume = assemble_volume(slices)?;
        log_volume(path, &volume);
        Ok(volume)
    }

    /// Stack every file matching `prefix*.tif`/`prefix*.tiff`, or `pattern`
    /// relative to the prefix's directory, one slice per file
    pub async fn read_prefix(&self, prefix: &Path, pattern: Option<&str>) -> Result<Volume> {
        let files = self.find_slices(prefix, pattern).await?;
        log::info!(
            "Stacking {} slice file(s) for prefix {}",
            files.len(),
            prefix.display()
        );

        let mut slices = Vec::with_capacity(files.len());
        for file in files {
            let bytes = self.io_manager.read(&file).await?;
            let mut frames = decode_stack(&self.decoders, &bytes, &file)?;
            if frames.len() != 1 {
                return Err(VolError::Format(format!(
                    "{} holds {} frames; prefix mode expects one frame per file",
                    file.display(),
                    frames.len()
                )));
            }
            log::debug!("Read slice {}", file.display());
            slices.push((file, frames.remove(0)));
        }

        let volume = assemble_volume(slices)?;
        log_volume(prefix, &volume);
        Ok(volume)
    }

    /// Split a prefix into its directory and filename prefix.
    ///
    /// A prefix ending in a path separator, or naming an existing directory,
    /// selects every slice in that directory.
    pub async fn split_prefix(&self, prefix: &Path) -> Result<(PathBuf, String)> {
        let text = prefix.to_string_lossy();
        if text.ends_with(std::path::is_separator) || self.io_manager.is_dir(prefix).await? {
            return Ok((prefix.to_path_buf(), String::new()));
        }
        let dir = prefix.parent().map(Path::to_path_buf).unwrap_or_default();
        let base = prefix
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok((dir, base))
    }

    /// Slice files for a prefix, sorted by file name
    pub async fn find_slices(&self, prefix: &Path, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
        let (dir, base) = self.split_prefix(prefix).await?;
        let dir = PathBuf::from(glob::Pattern::escape(&dir.to_string_lossy()));
        let patterns = match pattern {
            Some(p) => vec![p.to_string()],
            None => {
                let base = glob::Pattern::escape(&base);
                vec![format!("{}*.tif", base), format!("{}*.tiff", base)]
            }
        };

        let mut files = Vec::new();
        for p in patterns {
            let full = dir.join(p);
            files.extend(self.io_manager.glob(&full.to_string_lossy()).await?);
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        files.dedup();

        if files.is_empty() {
            return Err(VolError::NotFound(format!(
                "no TIFF files found for prefix '{}'",
                prefix.display()
            )));
        }
        Ok(files)
    }
}

fn log_volume(source: &Path, volume: &Volume) {
    let range = volume.value_range();
    log::info!("Loaded {} from {}", volume.summary(), source.display());
    log::info!("Min value: {}, Max value: {}", range.min, range.max);
}

/// Build a scalar volume from decoded slices.
///
/// The first slice fixes the expected (height, width), element type and
/// channel layout; color slices are reduced to luminosity.
pub fn assemble_volume(slices: Vec<Slice>) -> Result<Volume> {
    let (first_path, first) = slices
        .first()
        .ok_or_else(|| VolError::Format("stack contains no slices".to_string()))?;

    let layout = ChannelLayout::from_channels(first.channels()).map_err(|e| {
        VolError::Format(format!("{}: {}", first_path.display(), e))
    })?;
    let expected = (first.height(), first.width());
    let data_type = first.data_type();

    for (path, frame) in &slices {
        if frame.channels() != layout.channels() {
            return Err(VolError::Format(format!(
                "{} has {} channel(s) but the first slice has {}",
                path.display(),
                frame.channels(),
                layout.channels()
            )));
        }
        let actual = (frame.height(), frame.width());
        if actual != expected {
            return Err(VolError::ShapeMismatch {
                file: path.clone(),
                actual,
                expected,
            });
        }
        if frame.data_type() != data_type {
            return Err(VolError::Format(format!(
                "{} has element type {} but the first slice has {}",
                path.display(),
                frame.data_type(),
                data_type
            )));
        }
    }

    if let ChannelLayout::Color(channels) = layout {
        log::info!(
            "Color slices detected ({} channels); converting to grayscale using luminosity weights",
            channels
        );
    }

    dispatch_type!(data_type, T => Ok(Volume::new(stack_slices::<T>(slices, expected, layout)?)))
}

fn stack_slices<T: Element>(
    slices: Vec<Slice>,
    (height, width): (usize, usize),
    layout: ChannelLayout,
) -> Result<Array3<T>> {
    let depth = slices.len();
    match layout {
        ChannelLayout::Scalar => {
            let mut volume = Array3::<T>::zeros((depth, height, width));
            for (mut dst, (path, frame)) in volume.outer_iter_mut().zip(slices) {
                let array = unwrap_frame::<T>(&path, frame)?;
                dst.assign(&array.index_axis(Axis(2), 0));
            }
            Ok(volume)
        }
        ChannelLayout::Color(channels) => {
            let mut stack = Array4::<T>::zeros((depth, height, width, channels));
            for (mut dst, (path, frame)) in stack.outer_iter_mut().zip(slices) {
                dst.assign(&unwrap_frame::<T>(&path, frame)?);
            }
            reduce_volume(stack.view())
        }
    }
}

fn unwrap_frame<T: Element>(path: &Path, frame: Frame) -> Result<Array3<T>> {
    T::unwrap(frame.into_data()).map_err(|other| {
        VolError::Format(format!(
            "{} has element type {}, expected {}",
            path.display(),
            other.data_type(),
            T::DATA_TYPE
        ))
    })
}
