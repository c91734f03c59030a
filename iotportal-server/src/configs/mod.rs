mod schema;
mod settings;
mod storage;

use std::io;
use std::path::{Path, PathBuf};

pub use schema::SchemaManager;
pub use settings::{
    Auth, Aws, Azure, CloudProvider, Database, LoRaWan, Logger, Metrics, Portal, RunMode, Server,
    Settings, DEFAULT_AUTH_SECRET,
};
pub use storage::Storage;

/// Resolves a configured path against the working directory.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let path = path.as_ref();

    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    std::env::current_dir()?.join(path).canonicalize()
}
