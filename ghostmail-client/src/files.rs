// ghostmail-client/src/files.rs
use crate::error::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write `contents` to `path` readable by the owner only.
///
/// The data goes to a sibling temp file first and is renamed into place, so
/// a failed write never leaves a truncated file behind.
pub(crate) fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Config(format!("no parent directory for {}", path.display())))?;
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = dir.join(format!(".{}.{:016x}.tmp", file_name, rand::random::<u64>()));

    let result = write_new_private(&tmp_path, contents).and_then(|_| {
        fs::rename(&tmp_path, path)?;
        Ok(())
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Create a fresh file (never following an existing entry) that is 0600
/// from the moment it exists
fn write_new_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

/// Read a file, reporting a missing one as `Error::NotFound`
pub(crate) fn read_existing(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| not_found_or_io(e, path))
}

fn not_found_or_io(err: io::Error, path: &Path) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::NotFound(PathBuf::from(path))
    } else {
        Error::Io(err)
    }
}
