use crate::errors::{ErrorKind, Result, ResultExt};
use crate::merge::source::{OrderedSource, Streaming};
use crate::sync::action::{ActionSink, SyncAction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::path::Path;

/// Streams rows from newline-delimited JSON, one object per line.
///
/// Only the current line is kept in memory. Blank lines are skipped.
pub struct NdjsonSource<B, T> {
    reader: B,
    line: String,
    line_no: usize,
    row: PhantomData<T>,
}

impl<B, T> NdjsonSource<B, T>
where
    B: BufRead,
    T: DeserializeOwned,
{
    pub fn new(reader: B) -> NdjsonSource<B, T> {
        NdjsonSource {
            reader,
            line: String::new(),
            line_no: 0,
            row: PhantomData,
        }
    }
}

impl<T> NdjsonSource<BufReader<File>, T>
where
    T: DeserializeOwned,
{
    pub fn open<P: AsRef<Path>>(path: P) -> Result<NdjsonSource<BufReader<File>, T>> {
        let path = path.as_ref();
        let file = File::open(path)
            .chain_err(|| format!("Could not open NDJSON file {}", path.display()))?;
        debug!(target: "merge_sync", "Reading rows from {}", path.display());

        Ok(NdjsonSource::new(BufReader::new(file)))
    }
}

impl<B, T> OrderedSource for NdjsonSource<B, T>
where
    B: BufRead,
    T: DeserializeOwned,
{
    type Row = T;

    fn next_row(&mut self) -> Result<Option<T>> {
        loop {
            self.line.clear();
            let next_line = self.line_no + 1;
            let read = self
                .reader
                .read_line(&mut self.line)
                .chain_err(|| ErrorKind::MalformedRow(next_line))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let line_no = self.line_no;
            let row = serde_json::from_str(trimmed).chain_err(|| ErrorKind::MalformedRow(line_no))?;

            return Ok(Some(row));
        }
    }

    fn streaming(&self) -> Streaming {
        Streaming::Streaming
    }
}

/// Writes each action as one JSON line. Unchanged pairs are skipped unless asked for.
pub struct NdjsonActionWriter<W> {
    writer: W,
    include_unchanged: bool,
    written: u64,
}

impl<W: Write> NdjsonActionWriter<W> {
    pub fn new(writer: W) -> NdjsonActionWriter<W> {
        NdjsonActionWriter {
            writer,
            include_unchanged: false,
            written: 0,
        }
    }

    pub fn include_unchanged(mut self, include: bool) -> Self {
        self.include_unchanged = include;
        self
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W, L, R> ActionSink<L, R> for NdjsonActionWriter<W>
where
    W: Write,
    L: Serialize,
    R: Serialize,
{
    fn apply(&mut self, action: SyncAction<L, R>) -> Result<()> {
        if let SyncAction::Unchanged { .. } = action {
            if !self.include_unchanged {
                return Ok(());
            }
        }

        serde_json::to_writer(&mut self.writer, &action)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use serde::Deserialize;
    use std::io::Cursor;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
        label: String,
    }

    #[test]
    fn test_reads_rows_and_skips_blank_lines() {
        let input = "{\"id\":1,\"label\":\"a\"}\n\n  \n{\"id\":2,\"label\":\"b\"}";
        let mut source: NdjsonSource<_, Item> = NdjsonSource::new(Cursor::new(input));

        assert_eq!(source.next_row().unwrap().unwrap().id, 1);
        assert_eq!(source.next_row().unwrap().unwrap().label, "b");
        assert!(source.next_row().unwrap().is_none());
        assert!(source.next_row().unwrap().is_none());
    }

    #[test]
    fn test_malformed_row_reports_line_number() {
        let input = "{\"id\":1,\"label\":\"a\"}\n{\"id\":\"two\"}\n";
        let mut source: NdjsonSource<_, Item> = NdjsonSource::new(Cursor::new(input));
        source.next_row().unwrap();

        match source.next_row() {
            Err(Error(ErrorKind::MalformedRow(line), _)) => assert_eq!(line, 2),
            other => panic!("Expected a malformed row, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_reports_line_number() {
        let mut input = b"{\"id\":1,\"label\":\"a\"}\n".to_vec();
        input.extend_from_slice(&[b'{', 0xff, 0xfe, b'}', b'\n']);
        let mut source: NdjsonSource<_, Item> = NdjsonSource::new(Cursor::new(input));
        source.next_row().unwrap();

        match source.next_row() {
            Err(Error(ErrorKind::MalformedRow(line), _)) => assert_eq!(line, 2),
            other => panic!("Expected a malformed row, got {:?}", other),
        }
    }

    #[test]
    fn test_open_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"id\":7,\"label\":\"x\"}}").unwrap();

        let mut source = NdjsonSource::<_, Item>::open(file.path()).unwrap();
        assert_eq!(
            source.next_row().unwrap(),
            Some(Item {
                id: 7,
                label: "x".into()
            })
        );
        assert_eq!(source.streaming(), Streaming::Streaming);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = NdjsonSource::<_, Item>::open(dir.path().join("missing.ndjson"));

        assert!(result.is_err());
    }

    #[test]
    fn test_writer_skips_unchanged_by_default() {
        let mut writer = NdjsonActionWriter::new(vec![]);
        writer
            .apply(SyncAction::<u32, u32>::Insert { source: 1 })
            .unwrap();
        writer
            .apply(SyncAction::<u32, u32>::Unchanged {
                source: 2,
                destination: 2,
            })
            .unwrap();
        writer
            .apply(SyncAction::<u32, u32>::Delete { destination: 3 })
            .unwrap();

        assert_eq!(writer.written(), 2);
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            out,
            "{\"action\":\"insert\",\"source\":1}\n{\"action\":\"delete\",\"destination\":3}\n"
        );
    }

    #[test]
    fn test_writer_can_include_unchanged() {
        let mut writer = NdjsonActionWriter::new(vec![]).include_unchanged(true);
        writer
            .apply(SyncAction::<u32, u32>::Unchanged {
                source: 2,
                destination: 2,
            })
            .unwrap();

        assert_eq!(writer.written(), 1);
    }
}
