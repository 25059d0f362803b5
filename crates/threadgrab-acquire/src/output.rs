use crate::error::FetchError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use threadgrab_model::ThreadRecord;

/// Write a thread record as pretty-printed JSON to `{output_dir}/{file_name}`.
///
/// Creates the directory if it doesn't exist. The JSON goes to a temporary
/// file in the same directory and is renamed over the target, so an earlier
/// file of the same name is either fully replaced or left as it was.
pub fn write_thread(
    record: &ThreadRecord,
    output_dir: &Path,
    file_name: &str,
) -> Result<PathBuf, FetchError> {
    let json = serde_json::to_string_pretty(record)?;

    fs::create_dir_all(output_dir).map_err(|source| FetchError::Write {
        path: output_dir.display().to_string(),
        source,
    })?;

    let path = output_dir.join(file_name);
    let write_err = |source| FetchError::Write {
        path: path.display().to_string(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(output_dir).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Temp files are created 0600; saved threads are ordinary files.
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(write_err)?;
    }
    // On failure the PersistError drops its temp file, which deletes it.
    tmp.persist(&path).map_err(|e| write_err(e.error))?;
    tracing::info!(path = %path.display(), bytes = json.len(), "Wrote thread JSON");

    Ok(path)
}
