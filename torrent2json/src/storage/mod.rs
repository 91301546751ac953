use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Destination of the rendered JSON.
///
/// The `Storage` struct decides where the output of a conversion lands: next
/// to the torrent file by default, or at an explicit path.
pub struct Storage {
    /// The file the JSON will be written to.
    pub output_path: PathBuf,
}

impl Storage {
    /// Creates a new `Storage` instance.
    ///
    /// If `output` is provided, it is used as is. Otherwise the output goes to
    /// the same directory as `torrent`, with the same stem and a `.json`
    /// extension.
    ///
    /// # Arguments
    ///
    /// * `torrent` - Path of the input `.torrent` file.
    /// * `output` - An optional explicit output path.
    pub fn new(torrent: &Path, output: Option<PathBuf>) -> Self {
        let output_path = output.unwrap_or_else(|| sibling_json_path(torrent));
        Self { output_path }
    }

    /// Writes the whole document, replacing any existing file.
    pub fn write(&self, contents: &[u8]) -> io::Result<()> {
        fs::write(&self.output_path, contents)
    }

    /// Returns the output path as a string.
    ///
    /// This uses `to_string_lossy()` so it may replace non-UTF8 characters.
    pub fn get_output_path_str(&self) -> String {
        self.output_path.to_string_lossy().to_string()
    }
}

/// `dir/name.torrent` becomes `dir/name.json`.
pub fn sibling_json_path(torrent: &Path) -> PathBuf {
    torrent.with_extension("json")
}
