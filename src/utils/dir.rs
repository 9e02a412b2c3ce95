use std::{
    env, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path = env::var("APPDATA")
                .map(PathBuf::from)
                .context("APPDATA should be present on Windows")?;
            path.push("playtrack");
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .context("Couldn't find XDG_STATE_HOME or HOME")?;
            path.push("playtrack");
            path
        }
    };

    create_application_path(&path)
}

/// Creates the directory if needed and returns its absolute path. The daemon changes its working
/// directory, so relative paths would break after detaching.
pub fn create_application_path(path: &Path) -> Result<PathBuf> {
    match std::fs::create_dir_all(path) {
        Ok(_) => {}
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => {}
        Err(v) => return Err(v.into()),
    }
    Ok(std::path::absolute(path)?)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::create_application_path;

    #[test]
    fn test_creating_twice_is_fine() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("playtrack");

        let first = create_application_path(&path)?;
        let second = create_application_path(&path)?;

        assert_eq!(first, second);
        assert!(first.is_absolute());
        assert!(first.is_dir());
        Ok(())
    }
}
