//! Image discovery for batch runs using walkdir.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::ScanError;

/// Extensions the batch runner picks up when walking directories
const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif"];

/// Decides which directory entries are analyzable images
pub struct ImageFilter {
    extensions: HashSet<String>,
    include_hidden: bool,
}

impl ImageFilter {
    /// Create a filter accepting the default image extensions
    pub fn new() -> Self {
        Self {
            extensions: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files and directories (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    fn descend_into(&self, entry: &DirEntry) -> bool {
        entry.depth() == 0 || self.include_hidden || !is_hidden(entry.path())
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Walk configuration
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
}

/// Images found plus the entries that could not be read
#[derive(Debug, Default)]
pub struct Discovery {
    pub images: Vec<PathBuf>,
    pub errors: Vec<ScanError>,
}

/// Collect image paths from files and directories.
///
/// Files named directly are always taken, whatever their extension, so the
/// decoder gets to reject them. Directories are walked in file-name order.
/// A root that does not exist aborts discovery.
pub fn discover(roots: &[PathBuf], config: &DiscoveryConfig) -> Result<Discovery, ScanError> {
    let filter = ImageFilter::new().with_hidden(config.include_hidden);
    let mut discovery = Discovery::default();

    for root in roots {
        if !root.exists() {
            return Err(ScanError::NotFound { path: root.clone() });
        }
        if root.is_file() {
            discovery.images.push(root.clone());
            continue;
        }

        let mut walker = WalkDir::new(root)
            .follow_links(config.follow_symlinks)
            .sort_by_file_name();
        if let Some(depth) = config.max_depth {
            walker = walker.max_depth(depth);
        }

        for entry in walker.into_iter().filter_entry(|e| filter.descend_into(e)) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && filter.should_include(entry.path()) {
                        discovery.images.push(entry.into_path());
                    }
                }
                Err(e) => discovery.errors.push(ScanError::ReadDirectory {
                    path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
                    reason: e.to_string(),
                }),
            }
        }
    }

    Ok(discovery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn filter_accepts_image_extensions() {
        let filter = ImageFilter::new();
        assert!(filter.should_include(Path::new("/a/photo.jpg")));
        assert!(filter.should_include(Path::new("/a/photo.JPEG")));
        assert!(filter.should_include(Path::new("/a/scan.tif")));
        assert!(!filter.should_include(Path::new("/a/notes.txt")));
        assert!(!filter.should_include(Path::new("/a/README")));
    }

    #[test]
    fn filter_skips_hidden_files() {
        assert!(!ImageFilter::new().should_include(Path::new("/a/.thumb.jpg")));
        assert!(ImageFilter::new()
            .with_hidden(true)
            .should_include(Path::new("/a/.thumb.jpg")));
    }

    #[test]
    fn walk_is_sorted_and_skips_hidden_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.png");
        touch(dir.path(), "a.jpg");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "nested/c.webp");
        touch(dir.path(), ".cache/d.jpg");

        let found = discover(&[dir.path().to_path_buf()], &DiscoveryConfig::default()).unwrap();
        let names: Vec<String> = found
            .images
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();

        assert_eq!(names, vec!["a.jpg", "b.png", "nested/c.webp"]);
        assert!(found.errors.is_empty());
    }

    #[test]
    fn hidden_directories_are_walked_on_request() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), ".cache/d.jpg");

        let config = DiscoveryConfig {
            include_hidden: true,
            ..DiscoveryConfig::default()
        };
        let found = discover(&[dir.path().to_path_buf()], &config).unwrap();
        assert_eq!(found.images.len(), 1);
    }

    #[test]
    fn explicit_files_bypass_the_extension_filter() {
        let dir = TempDir::new().unwrap();
        let upload = touch(dir.path(), "upload.bin");

        let found = discover(&[upload.clone()], &DiscoveryConfig::default()).unwrap();
        assert_eq!(found.images, vec![upload]);
    }

    #[test]
    fn max_depth_limits_the_walk() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "top.jpg");
        touch(dir.path(), "deep/er/bottom.jpg");

        let config = DiscoveryConfig {
            max_depth: Some(1),
            ..DiscoveryConfig::default()
        };
        let found = discover(&[dir.path().to_path_buf()], &config).unwrap();
        assert_eq!(found.images.len(), 1);
    }

    #[test]
    fn missing_root_is_an_error() {
        let result = discover(
            &[PathBuf::from("/definitely/not/here")],
            &DiscoveryConfig::default(),
        );
        assert!(matches!(result, Err(ScanError::NotFound { .. })));
    }
}
