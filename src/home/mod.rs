//! Home directory upkeep: dotfile symlinks and cleanup of unwanted files.
pub mod cleanup;
pub mod links;

use std::path::Path;

/// Whether `path` is a real directory, not a symlink to one.
fn is_real_dir(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|m| m.is_dir() && !m.is_symlink())
        .unwrap_or(false)
}

/// Remove whatever occupies `path`: a real directory with its contents,
/// otherwise the file or link itself.
fn remove_entry(path: &Path) -> std::io::Result<()> {
    if is_real_dir(path) {
        std::fs::remove_dir_all(path)
    } else {
        remove_link_or_file(path)
    }
}

#[cfg(not(windows))]
fn remove_link_or_file(path: &Path) -> std::io::Result<()> {
    std::fs::remove_file(path)
}

/// Directory symlinks on Windows carry the directory attribute and need
/// `remove_dir`.
#[cfg(windows)]
fn remove_link_or_file(path: &Path) -> std::io::Result<()> {
    use std::os::windows::fs::MetadataExt as _;

    const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x10;
    let meta = std::fs::symlink_metadata(path)?;
    if meta.file_attributes() & FILE_ATTRIBUTE_DIRECTORY != 0 {
        std::fs::remove_dir(path)
    } else {
        std::fs::remove_file(path)
    }
}
