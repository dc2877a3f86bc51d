use std::{fs::File, io::Read, path::Path};

use crate::error::{BundleError, Result};

/// Read the whole file at `path`.
///
/// The handle is closed before returning, so at most one file is open at a time
/// during a walk.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| BundleError::io(path, e))?;
    let capacity = file
        .metadata()
        .map_or(0, |metadata| usize::try_from(metadata.len()).unwrap_or(0));
    let mut contents = Vec::with_capacity(capacity);
    file.read_to_end(&mut contents)
        .map_err(|e| BundleError::io(path, e))?;
    Ok(contents)
}
