// ABOUTME: Append-only writer for the combined SQL dump artifact
// ABOUTME: Writes the database preamble, per-table fragments and the view fragment in order

use crate::error::SinkError;
use crate::utils::quote_ident;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Single-writer sink for the dump artifact.
///
/// Fragments are written in the order they arrive. A fragment that does not
/// end in a newline gets one, so the next fragment starts on its own line.
pub struct OutputAssembler<W: Write> {
    sink: W,
    bytes_written: u64,
}

impl OutputAssembler<BufWriter<File>> {
    /// Create (or truncate) the artifact file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| SinkError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Writing dump to {}", path.display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> OutputAssembler<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            bytes_written: 0,
        }
    }

    /// Write `CREATE DATABASE` and `USE` so several dumps can be restored
    /// into one server.
    pub fn write_preamble(&mut self, database: &str) -> Result<(), SinkError> {
        let quoted = quote_ident(database);
        let preamble = format!("CREATE DATABASE {quoted};\nUSE {quoted};\n");
        self.write(preamble.as_bytes())
    }

    pub fn append_fragment(&mut self, fragment: &[u8]) -> Result<(), SinkError> {
        if fragment.is_empty() {
            return Ok(());
        }
        self.write(fragment)?;
        if !fragment.ends_with(b"\n") {
            self.write(b"\n")?;
        }
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush and hand back the underlying sink.
    pub fn finish(mut self) -> Result<W, SinkError> {
        self.sink
            .flush()
            .map_err(|source| SinkError::WriteFailed { source })?;
        Ok(self.sink)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        self.sink
            .write_all(bytes)
            .map_err(|source| SinkError::WriteFailed { source })?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_fragments_are_appended_in_order() {
        let mut assembler = OutputAssembler::new(Vec::new());
        assembler.write_preamble("shop").unwrap();
        assembler.append_fragment(b"INSERT INTO `a` VALUES (1);\n").unwrap();
        assembler.append_fragment(b"").unwrap();
        assembler.append_fragment(b"INSERT INTO `b` VALUES (2);").unwrap();
        assembler.append_fragment(b"-- views\n").unwrap();

        let written = assembler.bytes_written();
        let out = String::from_utf8(assembler.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            "CREATE DATABASE `shop`;\nUSE `shop`;\n\
             INSERT INTO `a` VALUES (1);\n\
             INSERT INTO `b` VALUES (2);\n\
             -- views\n"
        );
        assert_eq!(written, out.len() as u64);
    }

    #[test]
    fn test_write_failure_is_sink_error() {
        let mut assembler = OutputAssembler::new(BrokenSink);
        let err = assembler.append_fragment(b"data").unwrap_err();
        assert!(matches!(err, SinkError::WriteFailed { .. }));
    }

    #[test]
    fn test_create_in_missing_directory_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let result = OutputAssembler::create(dir.path().join("missing").join("output.sql"));
        assert!(matches!(result, Err(SinkError::OpenFailed { .. })));
    }

    #[test]
    fn test_create_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.sql");

        let mut assembler = OutputAssembler::create(&path).unwrap();
        assembler.append_fragment(b"SELECT 1;\n").unwrap();
        assembler.finish().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "SELECT 1;\n");
    }
}
