//! volconv - microscopy volume conversion
//!
//! Reads 3D image stacks (multi-page TIFF files or numbered slice sequences)
//! into typed in-memory volumes and writes them out as headerless raw files
//! or legacy VTK `STRUCTURED_POINTS` datasets.
//!
//! # Features
//!
//! - Every integer and float element type from 8 to 64 bits
//! - Color slices reduced to luminosity on load
//! - Per-slice deskew before VTK output
//! - Flat binary element type conversion and byte order swapping
//! - Async I/O behind the [`IOManager`] trait
//!
//! # Example
//!
//! ```rust,ignore
//! use std::{path::Path, sync::Arc};
//! use volconv::{ConversionConfig, FileSystemIOManager, VolumeConverter};
//!
//! # async fn example() -> volconv::Result<()> {
//! let io = Arc::new(FileSystemIOManager::current_dir());
//! let converter = VolumeConverter::new(io, ConversionConfig::new().with_deskew(1.5));
//! converter.tif_to_vtk(Path::new("cells.tif"), None).await?;
//! # Ok(())
//! # }
//! ```

pub mod byteconv;
pub mod channels;
pub mod config;
pub mod convert;
pub mod decode;
pub mod deskew;
pub mod element;
pub mod error;
pub mod io;
pub mod raw;
pub mod reader;
pub mod types;
pub mod utils;
pub mod volume;
pub mod vtk;

// Re-exports
pub use byteconv::ByteFormat;
pub use config::ConversionConfig;
pub use convert::{BatchReport, VolumeConverter, VolumeStats};
pub use decode::{Frame, StackDecoder};
pub use deskew::Deskew;
pub use element::{ArrayData, Element};
pub use error::{Result, VolError};
pub use io::{FileSystemIOManager, IOManager};
pub use reader::VolumeReader;
pub use types::{ByteOrder, DataType, Spacing};
pub use volume::Volume;
pub use vtk::VtkEncoding;

/// Version of volconv
pub const VOLCONV_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VOLCONV_VERSION.is_empty());
    }
}
