use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for the whole-file components of an index directory.
///
/// Implementors handle the format itself; the provided methods take care of
/// buffering and of attaching the offending path to I/O failures.
pub trait IndexFile: Sized {
    /// The error type for I/O and format failures.
    type Error: Error;

    /// Parses a component from a buffered reader.
    ///
    /// `path` labels errors only; the reader may not be backed by a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is malformed or the reader fails.
    fn read_from(reader: &mut impl BufRead, path: &str) -> Result<Self, Self::Error>;

    /// Serializes the component to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    fn write_to(&self, writer: &mut impl Write, path: &str) -> Result<(), Self::Error>;

    /// Wraps an I/O failure on `path` in the implementor's error type.
    fn io_error(path: &str, source: io::Error) -> Self::Error;

    /// Reads a component from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, Self::Error> {
        let label = path.as_ref().display().to_string();
        let file = File::open(path.as_ref()).map_err(|e| Self::io_error(&label, e))?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, &label)
    }

    /// Writes a component to a file path, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Self::Error> {
        let label = path.as_ref().display().to_string();
        let file = File::create(path.as_ref()).map_err(|e| Self::io_error(&label, e))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, &label)?;
        writer.flush().map_err(|e| Self::io_error(&label, e))
    }
}
