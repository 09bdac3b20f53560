//! Conversion pipelines - main API tying readers, transforms and writers together

use crate::byteconv::{self, ByteFormat};
use crate::config::ConversionConfig;
use crate::decode::StackDecoder;
use crate::deskew::Deskew;
use crate::error::{Result, VolError};
use crate::io::IOManager;
use crate::raw::{encode_raw, raw_file_name};
use crate::reader::VolumeReader;
use crate::types::{ByteOrder, DataType, ValueRange};
use crate::utils::{file_stem, is_tiff, parent_dir};
use crate::volume::Volume;
use crate::vtk::encode_vtk;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main interface for volume conversions
pub struct VolumeConverter {
    /// I/O manager for every file touched by a pipeline
    io_manager: Arc<dyn IOManager>,

    reader: VolumeReader,

    config: ConversionConfig,
}

impl VolumeConverter {
    pub fn new(io_manager: Arc<dyn IOManager>, config: ConversionConfig) -> Self {
        Self {
            reader: VolumeReader::new(Arc::clone(&io_manager)),
            io_manager,
            config,
        }
    }

    /// Replace the decoder strategies used for every read
    pub fn with_decoders(mut self, decoders: Vec<Box<dyn StackDecoder>>) -> Self {
        self.reader = self.reader.with_decoders(decoders);
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub async fn read_stack_file(&self, path: &Path) -> Result<Volume> {
        self.reader.read_stack_file(path).await
    }

    pub async fn read_prefix(&self, prefix: &Path, pattern: Option<&str>) -> Result<Volume> {
        self.reader.read_prefix(prefix, pattern).await
    }

    /// Convert a stack file, or every slice matching a prefix, to a raw file.
    ///
    /// `output` may name a file or an existing directory; by default the raw
    /// file is written next to the input.
    pub async fn stack_to_raw(
        &self,
        input: &Path,
        output: Option<&Path>,
        pattern: Option<&str>,
    ) -> Result<PathBuf> {
        let single_file =
            self.io_manager.exists(input).await? && !self.io_manager.is_dir(input).await?;

        let (volume, basename, dir) = if single_file {
            log::info!("Reading stack file {}", input.display());
            let volume = self.reader.read_stack_file(input).await?;
            (volume, file_stem(input), parent_dir(input))
        } else {
            log::info!("Reading slices with prefix {}", input.display());
            let (dir, basename) = self.reader.split_prefix(input).await?;
            let dir = if dir.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                dir
            };
            (self.reader.read_prefix(input, pattern).await?, basename, dir)
        };

        let name = raw_file_name(&basename, &volume);
        let path = match output {
            Some(out) if self.io_manager.is_dir(out).await? => out.join(name),
            Some(out) => out.to_path_buf(),
            None => dir.join(name),
        };

        let order = self.config.raw.byte_order;
        self.io_manager.write(&path, &encode_raw(&volume, order)).await?;
        log::info!(
            "Wrote {} raw volume ({} byte order) to {}",
            volume.summary(),
            order,
            path.display()
        );
        Ok(path)
    }

    /// Convert one stack file to legacy VTK, deskewing first when configured
    pub async fn tif_to_vtk(&self, input: &Path, output: Option<&Path>) -> Result<PathBuf> {
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.with_extension("vtk"));

        let mut volume = self.reader.read_stack_file(input).await?;
        if let Some(k) = self.config.deskew {
            volume = Deskew::new(k)?.apply_to(volume);
        }

        log::debug!("{}", self.stats(&volume).summary());

        let vtk = &self.config.vtk;
        let bytes = encode_vtk(&volume, vtk.spacing, vtk.encoding, &vtk.title);
        self.io_manager.write(&path, &bytes).await?;
        log::info!(
            "Wrote {} VTK file {} ({})",
            vtk.encoding.keyword(),
            path.display(),
            crate::utils::format_bytes(bytes.len())
        );
        Ok(path)
    }

    /// Convert every TIFF in `dir` to VTK, continuing past failures
    pub async fn convert_directory(
        &self,
        dir: &Path,
        output_dir: Option<&Path>,
    ) -> Result<BatchReport> {
        let pattern = PathBuf::from(glob::Pattern::escape(&dir.to_string_lossy())).join("*");
        let files: Vec<PathBuf> = self
            .io_manager
            .glob(&pattern.to_string_lossy())
            .await?
            .into_iter()
            .filter(|p| is_tiff(p))
            .collect();

        if files.is_empty() {
            return Err(VolError::NotFound(format!(
                "no TIFF files found in {}",
                dir.display()
            )));
        }

        let output_dir = output_dir.unwrap_or(dir);
        self.io_manager.create_dir_all(output_dir).await?;
        log::info!(
            "Converting {} file(s) from {} into {}",
            files.len(),
            dir.display(),
            output_dir.display()
        );

        let mut report = BatchReport::default();
        for file in files {
            let target = output_dir.join(format!("{}.vtk", file_stem(&file)));
            match self.tif_to_vtk(&file, Some(&target)).await {
                Ok(path) => report.succeeded.push(path),
                Err(e) => {
                    log::warn!("Failed to convert {}: {}", file.display(), e);
                    report.failed.push((file, e.to_string()));
                }
            }
        }

        log::info!("{}", report.summary());
        Ok(report)
    }

    /// Convert `count` elements of a flat binary file between element formats
    pub async fn convert_bytes(
        &self,
        input: &Path,
        count: usize,
        source: ByteFormat,
        target: ByteFormat,
    ) -> Result<PathBuf> {
        let bytes = self.io_manager.read(input).await?;
        let order = self.config.byte_conv.byte_order;
        let converted = byteconv::convert_elements(&bytes, count, source, target, order)?;

        let path = byteconv::converted_path(input, target);
        self.io_manager.write(&path, &converted).await?;
        log::info!(
            "Converted {} {} value(s) to {} in {}",
            count,
            source,
            target,
            path.display()
        );
        Ok(path)
    }

    /// Re-encode a raw volume in the opposite byte order to `SE_<name>`
    pub async fn swap_endian(
        &self,
        input: &Path,
        dims: (usize, usize, usize),
        data_type: DataType,
        order: ByteOrder,
    ) -> Result<PathBuf> {
        let bytes = self.io_manager.read(input).await?;
        let swapped = byteconv::swap_endian(&bytes, dims, data_type, order)?;

        let path = byteconv::swapped_path(input);
        self.io_manager.write(&path, &swapped).await?;
        log::info!(
            "Swapped {}x{}x{} {} volume from {} to {} endian: {}",
            dims.0,
            dims.1,
            dims.2,
            data_type,
            order,
            order.opposite(),
            path.display()
        );
        Ok(path)
    }

    /// Statistics about a volume as it would be written
    pub fn stats(&self, volume: &Volume) -> VolumeStats {
        VolumeStats {
            dims: volume.dims(),
            total_voxels: volume.num_voxels(),
            size_in_bytes: volume.size_in_bytes(),
            data_type: volume.data_type(),
            range: volume.value_range(),
        }
    }
}

/// Outcome of a directory conversion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_partial_success(&self) -> bool {
        !self.succeeded.is_empty() && !self.failed.is_empty()
    }

    /// Process exit status: 0 when every file converted, 2 on partial
    /// success, 1 when nothing converted
    pub fn exit_status(&self) -> u8 {
        if self.succeeded.is_empty() {
            1
        } else if self.is_complete_success() {
            0
        } else {
            2
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Batch finished: {} of {} converted, {} failed",
            self.succeeded.len(),
            self.total(),
            self.failed.len()
        )
    }
}

/// Volume statistics
#[derive(Debug, Clone)]
pub struct VolumeStats {
    /// (width, height, depth)
    pub dims: (usize, usize, usize),
    pub total_voxels: usize,
    pub size_in_bytes: usize,
    pub data_type: DataType,
    pub range: ValueRange,
}

impl VolumeStats {
    pub fn summary(&self) -> String {
        format!(
            "{}x{}x{} volume: {} voxels, {} ({}), values {}..{}",
            self.dims.0,
            self.dims.1,
            self.dims.2,
            self.total_voxels,
            crate::utils::format_bytes(self.size_in_bytes),
            self.data_type,
            self.range.min,
            self.range.max,
        )
    }
}
