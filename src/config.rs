//! Conversion configuration.
//!
//! Defaults are carried in a [`ConversionConfig`] value handed to each
//! operation; it can be loaded from JSON and overridden field by field.

use crate::error::{Result, VolError};
use crate::types::{ByteOrder, Spacing};
use crate::vtk::{VtkEncoding, DEFAULT_TITLE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options for raw output
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawOptions {
    pub byte_order: ByteOrder,
}

/// Options for legacy VTK output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VtkOptions {
    pub spacing: Spacing,
    pub encoding: VtkEncoding,
    pub title: String,
}

impl Default for VtkOptions {
    fn default() -> Self {
        Self {
            spacing: Spacing::default(),
            encoding: VtkEncoding::Binary,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Options for the flat byte type converter
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ByteConvOptions {
    pub byte_order: ByteOrder,
}

/// Complete configuration for a conversion run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub raw: RawOptions,
    pub vtk: VtkOptions,
    pub byte_conv: ByteConvOptions,
    /// Horizontal shift per slice applied before VTK output
    pub deskew: Option<f64>,
}

impl ConversionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            VolError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_raw_byte_order(mut self, order: ByteOrder) -> Self {
        self.raw.byte_order = order;
        self
    }

    pub fn with_spacing(mut self, spacing: Spacing) -> Self {
        self.vtk.spacing = spacing;
        self
    }

    pub fn with_vtk_encoding(mut self, encoding: VtkEncoding) -> Self {
        self.vtk.encoding = encoding;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.vtk.title = title.into();
        self
    }

    pub fn with_deskew(mut self, offset_per_slice: f64) -> Self {
        self.deskew = Some(offset_per_slice);
        self
    }

    pub fn with_byte_conv_order(mut self, order: ByteOrder) -> Self {
        self.byte_conv.byte_order = order;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.vtk.spacing.is_valid() {
            return Err(VolError::Configuration(format!(
                "spacing must be positive and finite, got {:?}",
                self.vtk.spacing
            )));
        }
        if let Some(k) = self.deskew {
            if !k.is_finite() {
                return Err(VolError::Configuration(format!(
                    "deskew offset must be finite, got {}",
                    k
                )));
            }
        }
        if self.vtk.title.contains('\n') {
            return Err(VolError::Configuration(
                "VTK title must be a single line".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConversionConfig::new();
        assert_eq!(config.raw.byte_order, ByteOrder::Little);
        assert_eq!(config.vtk.spacing, Spacing::new(1.0, 1.0, 1.0));
        assert_eq!(config.vtk.encoding, VtkEncoding::Binary);
        assert_eq!(config.vtk.title, "TIF to VTK conversion");
        assert_eq!(config.deskew, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: ConversionConfig = serde_json::from_str(
            r#"{ "vtk": { "spacing": { "x": 0.5, "y": 0.5, "z": 2.0 }, "encoding": "ascii" }, "deskew": 7.0 }"#,
        )
        .unwrap();
        assert_eq!(config.vtk.spacing, Spacing::new(0.5, 0.5, 2.0));
        assert_eq!(config.vtk.encoding, VtkEncoding::Ascii);
        assert_eq!(config.vtk.title, DEFAULT_TITLE);
        assert_eq!(config.raw.byte_order, ByteOrder::Little);
        assert_eq!(config.deskew, Some(7.0));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "raw": { "byte_order": "big" } }"#).unwrap();
        let config = ConversionConfig::from_json_file(&path).unwrap();
        assert_eq!(config.raw.byte_order, ByteOrder::Big);

        std::fs::write(&path, r#"{ "vtk": { "spacing": { "x": 0.0, "y": 1.0, "z": 1.0 } } }"#)
            .unwrap();
        assert!(matches!(
            ConversionConfig::from_json_file(&path),
            Err(VolError::Configuration(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = ConversionConfig::new()
            .with_spacing(Spacing::new(2.0, 2.0, 4.0))
            .with_vtk_encoding(VtkEncoding::Ascii)
            .with_deskew(-3.5)
            .with_raw_byte_order(ByteOrder::Big);
        assert!(config.validate().is_ok());
        assert!(config.clone().with_deskew(f64::NAN).validate().is_err());
        assert!(config.with_title("a\nb").validate().is_err());
    }
}
