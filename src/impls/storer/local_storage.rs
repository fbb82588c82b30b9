use std::fs::{create_dir_all, read, remove_file, write};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::core::ports::storer::FileStorer;
use crate::error::Error;

/// Stores files under a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorer {
    root: PathBuf,
}

impl LocalStorer {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_owned() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, Error> {
        let relative = Path::new(path);
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(Error::ServerError(format!("refusing to touch path outside storage root: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

impl FileStorer for LocalStorer {
    fn ensure_dir(&self, dir: &str) -> Result<(), Error> {
        create_dir_all(self.resolve(dir)?)?;
        Ok(())
    }

    fn write(&self, path: &str, content: &[u8]) -> Result<(), Error> {
        write(self.resolve(path)?, content)?;
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, Error> {
        match read(self.resolve(path)?) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, path: &str) -> Result<(), Error> {
        match remove_file(self.resolve(path)?) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
