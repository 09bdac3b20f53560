//! Utility functions

use std::path::{Path, PathBuf};

/// Format byte size in human-readable form
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// File name without its final extension, lossily converted
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Directory containing `path`, `.` when it has none
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `path` with its extension removed and `suffix` appended to the name
pub fn append_to_stem(path: &Path, suffix: &str) -> PathBuf {
    let name = format!("{}{}", file_stem(path), suffix);
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// `path`'s file name with `prefix` prepended, in the same directory
pub fn prefix_file_name(path: &Path, prefix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    parent_dir(path).join(format!("{}{}", prefix, name))
}

/// True for `.tif` and `.tiff` files
pub fn is_tiff(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tif") | Some("tiff")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_append_to_stem() {
        assert_eq!(
            append_to_stem(Path::new("data/volume.bin"), "_converted.f32"),
            PathBuf::from("data/volume_converted.f32")
        );
        assert_eq!(
            append_to_stem(Path::new("volume"), "_converted.s2"),
            PathBuf::from("volume_converted.s2")
        );
    }

    #[test]
    fn test_prefix_file_name() {
        assert_eq!(
            prefix_file_name(Path::new("/tmp/x/data.bin"), "SE_"),
            PathBuf::from("/tmp/x/SE_data.bin")
        );
        assert_eq!(
            prefix_file_name(Path::new("data.bin"), "SE_"),
            PathBuf::from("./SE_data.bin")
        );
    }

    #[test]
    fn test_is_tiff() {
        assert!(is_tiff(Path::new("a/b.tif")));
        assert!(is_tiff(Path::new("b.tiff")));
        assert!(!is_tiff(Path::new("b.png")));
        assert!(!is_tiff(Path::new("tif")));
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("slice_")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("in/slice_")), PathBuf::from("in"));
    }
}
