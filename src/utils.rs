use anyhow::Context;
use std::path::{Path, PathBuf};

/// Write a file.
pub(crate) async fn write(
    path: impl AsRef<Path>,
    contents: impl AsRef<[u8]>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Append bytes to the end of an existing file.
pub(crate) async fn append(
    path: impl AsRef<Path>,
    contents: impl AsRef<[u8]>,
) -> anyhow::Result<()> {
    use tokio::io::AsyncWriteExt;
    let path = path.as_ref();
    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("Unable to open {} for appending", path.display()))?;
    file.write_all(contents.as_ref())
        .await
        .with_context(|| format!("Unable to append to {}", path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("Unable to flush {}", path.display()))
}

/// True if the file is empty or its last byte is `\n`.
pub(crate) async fn ends_with_newline(path: impl AsRef<Path>) -> anyhow::Result<bool> {
    use tokio::io::{AsyncReadExt, AsyncSeekExt};
    let path = path.as_ref();
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Unable to open {}", path.display()))?;
    let len = file
        .metadata()
        .await
        .with_context(|| format!("Unable to stat {}", path.display()))?
        .len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(std::io::SeekFrom::End(-1))
        .await
        .with_context(|| format!("Unable to seek in {}", path.display()))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)
        .await
        .with_context(|| format!("Unable to read the end of {}", path.display()))?;
    Ok(last[0] == b'\n')
}

/// Read a file into bytes.
pub(crate) async fn read_bytes(path: impl AsRef<Path>) -> anyhow::Result<Vec<u8>> {
    let path = path.as_ref();
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Read a file to a `String`.
pub(crate) async fn read(path: impl AsRef<Path>) -> anyhow::Result<String> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Create a directory and its parents if they are missing.
pub(crate) async fn make_dir(path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Unable to create directory at {}", path.to_string_lossy()))
}

pub(crate) async fn canonicalize(path: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
    let path = path.as_ref();
    tokio::fs::canonicalize(path)
        .await
        .with_context(|| format!("Unable to canonicalize the path {}", path.to_string_lossy()))
}

/// True if something exists at `path`.
pub(crate) async fn exists(path: impl AsRef<Path>) -> anyhow::Result<bool> {
    let path = path.as_ref();
    tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("Unable to check for {}", path.display()))
}
