use bincode::config::{Configuration, Fixint, LittleEndian};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use thiserror::Error;

pub const STREAM_MAGIC: &[u8; 8] = b"PEPDEXRS";
pub const STREAM_VERSION: u32 = 1;

fn codec() -> Configuration<LittleEndian, Fixint> {
    bincode::config::standard().with_fixed_int_encoding()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    Proteins,
    Peptides,
    AuxLocations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamHeader {
    pub version: u32,
    pub kind: RecordKind,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Corrupted record stream '{path}': {reason}")]
    Corrupted { path: String, reason: String },
    #[error("Record stream '{path}' holds {found:?} records, expected {expected:?}")]
    WrongKind {
        path: String,
        expected: RecordKind,
        found: RecordKind,
    },
    #[error("Record stream '{path}' has unsupported version {found}")]
    UnsupportedVersion { path: String, found: u32 },
    #[error("Failed to encode a record for '{path}': {source}")]
    Encode {
        path: String,
        #[source]
        source: bincode::error::EncodeError,
    },
}

impl RecordError {
    fn io(path: &str, source: io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            source,
        }
    }

    fn corrupted(path: &str, reason: impl Into<String>) -> Self {
        Self::Corrupted {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Writes a typed stream of length-prefixed bincode records.
#[derive(Debug)]
pub struct RecordWriter<W: Write> {
    inner: W,
    path: String,
    count: u64,
}

impl RecordWriter<BufWriter<File>> {
    pub fn create(path: &Path, kind: RecordKind) -> Result<Self, RecordError> {
        let label = path.display().to_string();
        let file = File::create(path).map_err(|e| RecordError::io(&label, e))?;
        Self::new(BufWriter::new(file), label, kind)
    }
}

impl<W: Write> RecordWriter<W> {
    /// Wraps `inner` and writes the stream header; `path` only labels errors.
    pub fn new(mut inner: W, path: impl Into<String>, kind: RecordKind) -> Result<Self, RecordError> {
        let path = path.into();
        let header = StreamHeader {
            version: STREAM_VERSION,
            kind,
        };
        inner
            .write_all(STREAM_MAGIC)
            .map_err(|e| RecordError::io(&path, e))?;
        let encoded = bincode::serde::encode_to_vec(header, codec()).map_err(|source| {
            RecordError::Encode {
                path: path.clone(),
                source,
            }
        })?;
        inner
            .write_all(&encoded)
            .map_err(|e| RecordError::io(&path, e))?;
        Ok(Self {
            inner,
            path,
            count: 0,
        })
    }

    /// Wraps `inner` positioned after the last record of an existing stream.
    ///
    /// No header is written; the count restarts at zero.
    pub fn resume(inner: W, path: impl Into<String>) -> Self {
        Self {
            inner,
            path: path.into(),
            count: 0,
        }
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), RecordError> {
        let payload = bincode::serde::encode_to_vec(record, codec()).map_err(|source| {
            RecordError::Encode {
                path: self.path.clone(),
                source,
            }
        })?;
        let len = u32::try_from(payload.len())
            .map_err(|_| RecordError::corrupted(&self.path, "record exceeds 4 GiB"))?;
        self.inner
            .write_all(&len.to_le_bytes())
            .and_then(|()| self.inner.write_all(&payload))
            .map_err(|e| RecordError::io(&self.path, e))?;
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Flushes and returns the record count.
    pub fn finish(mut self) -> Result<u64, RecordError> {
        self.inner
            .flush()
            .map_err(|e| RecordError::io(&self.path, e))?;
        Ok(self.count)
    }
}

/// Reads a typed stream written by [`RecordWriter`], validating its kind up front.
#[derive(Debug)]
pub struct RecordReader<R: Read> {
    inner: R,
    path: String,
    buffer: Vec<u8>,
}

impl RecordReader<BufReader<File>> {
    pub fn open(path: &Path, expected: RecordKind) -> Result<Self, RecordError> {
        let label = path.display().to_string();
        let file = File::open(path).map_err(|e| RecordError::io(&label, e))?;
        Self::new(BufReader::new(file), label, expected)
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(mut inner: R, path: impl Into<String>, expected: RecordKind) -> Result<Self, RecordError> {
        let path = path.into();
        let mut magic = [0u8; 8];
        read_exact_or_corrupt(&mut inner, &mut magic, &path, "truncated stream magic")?;
        if &magic != STREAM_MAGIC {
            return Err(RecordError::corrupted(&path, "not a pepdex record stream"));
        }
        let header: StreamHeader = bincode::serde::decode_from_std_read(&mut inner, codec())
            .map_err(|e| RecordError::corrupted(&path, format!("unreadable stream header: {e}")))?;
        if header.version != STREAM_VERSION {
            return Err(RecordError::UnsupportedVersion {
                path,
                found: header.version,
            });
        }
        if header.kind != expected {
            return Err(RecordError::WrongKind {
                path,
                expected,
                found: header.kind,
            });
        }
        Ok(Self {
            inner,
            path,
            buffer: Vec::new(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Next record, or `None` at a clean end of stream.
    pub fn read_next<T: DeserializeOwned>(&mut self) -> Result<Option<T>, RecordError> {
        let mut prefix = [0u8; 4];
        let mut filled = 0;
        while filled < prefix.len() {
            match self.inner.read(&mut prefix[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(RecordError::corrupted(&self.path, "truncated length prefix"));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(RecordError::io(&self.path, e)),
            }
        }

        let len = u32::from_le_bytes(prefix) as usize;
        self.buffer.resize(len, 0);
        read_exact_or_corrupt(&mut self.inner, &mut self.buffer, &self.path, "truncated record")?;
        let (record, used) = bincode::serde::decode_from_slice(&self.buffer, codec())
            .map_err(|e| RecordError::corrupted(&self.path, format!("undecodable record: {e}")))?;
        if used != len {
            return Err(RecordError::corrupted(
                &self.path,
                format!("record declared {len} bytes but decoded {used}"),
            ));
        }
        Ok(Some(record))
    }

    pub fn records<T: DeserializeOwned>(self) -> Records<R, T> {
        Records {
            reader: self,
            done: false,
            _marker: std::marker::PhantomData,
        }
    }
}

/// Iterator adapter over a [`RecordReader`]; stops after the first error.
pub struct Records<R: Read, T> {
    reader: RecordReader<R>,
    done: bool,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<R: Read, T: DeserializeOwned> Iterator for Records<R, T> {
    type Item = Result<T, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn read_exact_or_corrupt(
    reader: &mut impl Read,
    buf: &mut [u8],
    path: &str,
    reason: &str,
) -> Result<(), RecordError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            RecordError::corrupted(path, reason)
        } else {
            RecordError::io(path, e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::peptide::{CleavageType, IndexedPeptide, PeptideSource};
    use crate::core::models::protein::Protein;
    use std::io::Cursor;

    fn peptide(mass: f64) -> IndexedPeptide {
        IndexedPeptide {
            length: 5,
            mass,
            is_decoy: false,
            sources: vec![PeptideSource {
                protein_index: 2,
                cleavage: CleavageType::Full,
                start: 4,
            }],
            exceptions: None,
        }
    }

    fn encode(kind: RecordKind, records: &[IndexedPeptide]) -> Vec<u8> {
        let mut writer = RecordWriter::new(Vec::new(), "memory", kind).unwrap();
        for record in records {
            writer.write(record).unwrap();
        }
        assert_eq!(writer.count(), records.len() as u64);
        writer.inner
    }

    #[test]
    fn peptides_survive_a_stream_round_trip() {
        let records = vec![peptide(500.25), peptide(612.5)];
        let bytes = encode(RecordKind::Peptides, &records);
        let reader = RecordReader::new(Cursor::new(bytes), "memory", RecordKind::Peptides).unwrap();
        let decoded: Vec<IndexedPeptide> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn wrong_kind_is_rejected_before_reading() {
        let bytes = encode(RecordKind::Peptides, &[peptide(500.0)]);
        let err = RecordReader::new(Cursor::new(bytes), "memory", RecordKind::Proteins).unwrap_err();
        assert!(matches!(
            err,
            RecordError::WrongKind {
                expected: RecordKind::Proteins,
                found: RecordKind::Peptides,
                ..
            }
        ));
    }

    #[test]
    fn bad_magic_is_corruption() {
        let err = RecordReader::new(Cursor::new(b"NOTASTREAM....".to_vec()), "memory", RecordKind::Peptides)
            .unwrap_err();
        assert!(matches!(err, RecordError::Corrupted { .. }));
    }

    #[test]
    fn truncated_payload_is_corruption() {
        let mut bytes = encode(RecordKind::Peptides, &[peptide(500.0), peptide(600.0)]);
        bytes.truncate(bytes.len() - 3);
        let reader = RecordReader::new(Cursor::new(bytes), "memory", RecordKind::Peptides).unwrap();
        let results: Vec<Result<IndexedPeptide, _>> = reader.records().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(RecordError::Corrupted { .. })));
    }

    #[test]
    fn truncated_length_prefix_is_corruption() {
        let mut bytes = encode(RecordKind::Peptides, &[]);
        bytes.extend_from_slice(&[7, 0]);
        let mut reader = RecordReader::new(Cursor::new(bytes), "memory", RecordKind::Peptides).unwrap();
        assert!(matches!(
            reader.read_next::<IndexedPeptide>(),
            Err(RecordError::Corrupted { .. })
        ));
    }

    #[test]
    fn resumed_writer_continues_the_stream() {
        let mut bytes = encode(RecordKind::Peptides, &[peptide(500.0)]);
        let mut resumed = RecordWriter::resume(&mut bytes, "memory");
        resumed.write(&peptide(550.0)).unwrap();
        assert_eq!(resumed.finish().unwrap(), 1);

        let reader = RecordReader::new(Cursor::new(bytes), "memory", RecordKind::Peptides).unwrap();
        let masses: Vec<f64> = reader
            .records::<IndexedPeptide>()
            .map(|r| r.unwrap().mass)
            .collect();
        assert_eq!(masses, vec![500.0, 550.0]);
    }

    #[test]
    fn empty_stream_reads_as_no_records() {
        let bytes = encode(RecordKind::Proteins, &[]);
        let mut reader = RecordReader::new(Cursor::new(bytes), "memory", RecordKind::Proteins).unwrap();
        assert!(reader.read_next::<Protein>().unwrap().is_none());
    }

    #[test]
    fn file_streams_report_their_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proteins.idx");
        let mut writer = RecordWriter::create(&path, RecordKind::Proteins).unwrap();
        writer.write(&Protein::new("P1", "MKAAPKR")).unwrap();
        assert_eq!(writer.finish().unwrap(), 1);

        let reader = RecordReader::open(&path, RecordKind::Proteins).unwrap();
        assert!(reader.path().ends_with("proteins.idx"));
        let proteins: Vec<Protein> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(proteins[0].residues(), "MKAAPKR");

        let missing = RecordReader::open(&dir.path().join("missing"), RecordKind::Proteins);
        assert!(matches!(missing, Err(RecordError::Io { .. })));
    }
}
