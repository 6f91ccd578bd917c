use super::records::{RecordError, RecordKind, RecordReader, RecordWriter};
use super::traits::IndexFile;
use crate::core::models::protein::{Protein, ProteinTable};
use std::io::{self, BufRead, Write};

pub const PROTEINS_FILE: &str = "proteins.idx";

/// The protein table is persisted as a `Proteins` record stream, in index order.
impl IndexFile for ProteinTable {
    type Error = RecordError;

    fn read_from(reader: &mut impl BufRead, path: &str) -> Result<Self, Self::Error> {
        RecordReader::new(reader, path, RecordKind::Proteins)?
            .records::<Protein>()
            .collect()
    }

    fn write_to(&self, writer: &mut impl Write, path: &str) -> Result<(), Self::Error> {
        let mut stream = RecordWriter::new(writer, path, RecordKind::Proteins)?;
        for (_, protein) in self.iter() {
            stream.write(protein)?;
        }
        stream.finish().map(|_| ())
    }

    fn io_error(path: &str, source: io::Error) -> Self::Error {
        RecordError::Io {
            path: path.to_string(),
            source,
        }
    }
}
