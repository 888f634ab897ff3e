//! Export-file IO: UTF-8 reading with legacy-encoding fallback, BOM
//! handling for the spreadsheet-exported CSVs, folder discovery, and the
//! exclusive lock held across a corrective read/match/write-back.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

const UTF8_BOM: &str = "\u{feff}";

/// Read file and convert to UTF-8 if needed (handles Windows-1252,
/// Latin-1, etc., common for Excel-exported CSVs). Strips a leading BOM.
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(decode_utf8(bytes))
}

fn decode_utf8(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };
    text.strip_prefix(UTF8_BOM).map(str::to_string).unwrap_or(text)
}

/// CSV files directly inside `folder`, sorted by file name. Extension
/// matching is case-insensitive; the centers are not consistent about it.
pub fn csv_files(folder: &Path) -> Result<Vec<PathBuf>, String> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)
        .map_err(|e| format!("{}: {e}", folder.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// File name without its path, lossily decoded.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// An export file held under an exclusive OS lock for the duration of a
/// read/match/write-back. The lock releases on drop, on every exit path,
/// including the common case where nothing changed and no write happens.
pub struct LockedFile {
    file: File,
    path: PathBuf,
}

impl LockedFile {
    pub fn acquire(path: &Path) -> Result<Self, String> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| format!("{}: {e}", path.display()))?;
        file.lock_exclusive()
            .map_err(|e| format!("{}: cannot lock: {e}", path.display()))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn read_to_string(&mut self) -> Result<String, String> {
        let mut bytes = Vec::new();
        self.file
            .read_to_end(&mut bytes)
            .map_err(|e| format!("{}: {e}", self.path.display()))?;
        Ok(decode_utf8(bytes))
    }

    /// Overwrite the file in place. The exports are written back with a
    /// BOM, matching how the spreadsheet tooling emitted them.
    pub fn replace_contents(&mut self, text: &str) -> Result<(), String> {
        let io = |e: std::io::Error| format!("{}: {e}", self.path.display());
        self.file.seek(SeekFrom::Start(0)).map_err(io)?;
        self.file.set_len(0).map_err(io)?;
        self.file.write_all(UTF8_BOM.as_bytes()).map_err(io)?;
        self.file.write_all(text.as_bytes()).map_err(io)?;
        self.file.flush().map_err(io)?;
        Ok(())
    }
}

impl Drop for LockedFile {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}
