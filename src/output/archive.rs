use std::fs;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::OutputError;

/// Bundle `members` into a deflate-compressed zip at `archive_path`
///
/// Entries are stored under their bare file names. The archive is built in a
/// temp file next to the target and renamed into place once complete.
pub fn write_archive(archive_path: &Path, members: &[&Path]) -> Result<(), OutputError> {
    let dir = archive_path.parent().unwrap_or_else(|| Path::new("."));
    let temp_file = tempfile::NamedTempFile::new_in(dir)?;

    let mut zip = ZipWriter::new(temp_file.as_file());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for member in members {
        let name = member
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| OutputError::Malformed(format!("bad member path {}", member.display())))?;
        zip.start_file(name, options)?;
        zip.write_all(&fs::read(member)?)?;
    }
    zip.finish()?;

    temp_file.persist(archive_path).map_err(|e| e.error)?;
    Ok(())
}
