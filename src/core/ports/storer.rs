use crate::error::Error;

/// Durable file storage addressed by paths relative to the storer's root.
pub trait FileStorer {
    /// Creates the directory and its parents. Succeeds if it already exists.
    fn ensure_dir(&self, dir: &str) -> Result<(), Error>;
    fn write(&self, path: &str, content: &[u8]) -> Result<(), Error>;
    fn read(&self, path: &str) -> Result<Vec<u8>, Error>;
    /// Removes the file. Succeeds if it is already gone.
    fn delete(&self, path: &str) -> Result<(), Error>;
}
