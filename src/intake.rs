//! Bulk image intake: directory discovery and dimension probing.

#![cfg(not(target_arch = "wasm32"))]

use std::path::{Path, PathBuf};

use crate::model::ImageSource;
use crate::store::ImageSpec;

/// File extensions accepted as images, lowercase.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp", "tif", "tiff"];

/// Case-insensitive extension check against [`IMAGE_EXTENSIONS`].
pub fn is_image_filename(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Recursively collect image paths under a directory, sorted by path for a
/// stable intake order.
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut found = Vec::new();
    walk(dir, &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, found)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_image_filename)
        {
            found.push(path);
        }
    }
    Ok(())
}

/// Probe each path for pixel dimensions and build the specs the store
/// ingests. Files that fail to decode are skipped and reported back.
pub fn probe_images(paths: &[PathBuf]) -> (Vec<ImageSpec>, Vec<String>) {
    let mut specs = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();

    for path in paths {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                skipped.push(format!("{}: unreadable filename", path.display()));
                continue;
            }
        };
        match image::image_dimensions(path) {
            Ok((width, height)) => specs.push(ImageSpec {
                filename,
                source: ImageSource::Path(path.clone()),
                width,
                height,
            }),
            Err(e) => skipped.push(format!("{}: {e}", path.display())),
        }
    }

    if !skipped.is_empty() {
        log::warn!("⚠️ Skipped {} unreadable images", skipped.len());
    }
    (specs, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_filename_matching() {
        assert!(is_image_filename("photo.jpg"));
        assert!(is_image_filename("photo.JPEG"));
        assert!(is_image_filename("scan.TIF"));
        assert!(!is_image_filename("labels.txt"));
        assert!(!is_image_filename("noextension"));
        assert!(!is_image_filename("archive.zip"));
    }

    #[test]
    fn test_discover_recurses_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("sub/c.jpeg"), b"x").unwrap();

        let found = discover_images(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg", "sub/c.jpeg"]);
    }

    #[test]
    fn test_probe_skips_undecodable_files() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.jpg");
        std::fs::write(&bogus, b"not an image").unwrap();

        let (specs, skipped) = probe_images(&[bogus]);
        assert!(specs.is_empty());
        assert_eq!(skipped.len(), 1);
    }
}
