use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{self, AsyncWriteExt},
};

/// Writes data into a temporary sibling of `path` and moves it over the original.
/// Readers observe either the previous content or the new one, never a half written file.
pub async fn replace_file(path: &Path, data: &[u8]) -> Result<(), io::Error> {
    let temporary = temporary_sibling(path);
    let mut file = File::create(&temporary).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&temporary, path).await
}

/// Reads the whole file. Missing files are not an error.
pub async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, io::Error> {
    match tokio::fs::read(path).await {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("data"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Advisory lock used to coordinate processes sharing a directory. The lock file itself stays
/// empty.
pub struct LockFile {
    file: File,
}

impl LockFile {
    pub async fn open(path: &Path) -> Result<Self, io::Error> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .await?;
        Ok(Self { file })
    }

    pub fn lock_shared(&self) -> Result<(), io::Error> {
        self.file.lock_shared()
    }

    pub fn lock_exclusive(&self) -> Result<(), io::Error> {
        self.file.lock_exclusive()
    }

    pub async fn unlock(&self) -> Result<(), io::Error> {
        self.file.unlock_async().await
    }
}
