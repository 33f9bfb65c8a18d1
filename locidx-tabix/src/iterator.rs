use std::fmt::{self, Debug};

use log::trace;

use crate::errors::Result;
use crate::reader::TabixReader;
use crate::stream::VirtualSeekRead;
use crate::virtual_offset::{Chunk, VirtualOffset};

///
/// Lines of a tabix-indexed file overlapping one query.
///
/// Created by [`TabixReader::query`] and friends. Chunks are read in order and
/// every line is decoded to discard records outside the query. Because records
/// are sorted, the first record on another sequence or starting at or past the
/// query end stops the scan.
///
/// The iterator is single-pass. After it returns `None` or an error it stays
/// exhausted.
///
pub struct TabixIterator<'r, S>
where
    S: VirtualSeekRead,
{
    reader: &'r mut TabixReader<S>,
    chunks: Vec<Chunk>,
    /// Chunk being read, `None` before the first one
    current: Option<usize>,
    cursor: VirtualOffset,
    tid: Option<usize>,
    begin: u32,
    end: u32,
    show_header: bool,
    skip_lines: usize,
    done: bool,
}

impl<'r, S> TabixIterator<'r, S>
where
    S: VirtualSeekRead,
{
    pub(crate) fn new(
        reader: &'r mut TabixReader<S>,
        tid: Option<usize>,
        begin: u32,
        end: u32,
        chunks: Vec<Chunk>,
    ) -> Self {
        TabixIterator {
            reader,
            chunks,
            current: None,
            cursor: VirtualOffset::default(),
            tid,
            begin,
            end,
            show_header: false,
            skip_lines: 0,
            done: false,
        }
    }

    /// Return header (meta) lines instead of skipping them.
    pub fn show_header(mut self, show_header: bool) -> Self {
        self.show_header = show_header;
        self
    }

    pub(crate) fn skip_lines(mut self, skip_lines: usize) -> Self {
        self.skip_lines = skip_lines;
        self
    }

    /// The merged chunks this iterator reads
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    fn read_next(&mut self) -> Result<Option<String>> {
        loop {
            let exhausted = match self.current {
                None => true,
                Some(i) => self.cursor >= self.chunks[i].v,
            };
            if exhausted && !self.advance_chunk()? {
                return Ok(None);
            }

            let Some(line) = self.reader.stream.next_line()? else {
                trace!("End of data stream");
                return Ok(None);
            };
            self.cursor = self.reader.stream.virtual_offset();

            if line.is_empty() {
                continue;
            }
            if self.skip_lines > 0 {
                self.skip_lines -= 1;
                continue;
            }
            if self.reader.header().is_meta(&line) {
                if self.show_header {
                    return Ok(Some(line));
                }
                continue;
            }

            let index = &self.reader.index;
            let record = index
                .header()
                .decode_record(&line, |name| index.sequence_id(name))?;
            self.reader.last_record = Some((self.cursor, record));

            if self.tid.is_some_and(|tid| record.tid != Some(tid)) || record.begin >= self.end {
                trace!("Record past query ({}), stopping", record);
                return Ok(None);
            }
            if record.overlaps(self.begin, self.end) {
                return Ok(Some(line));
            }
        }
    }

    /// Move to the next chunk, seeking unless it continues the current one.
    /// Returns `false` when no chunk is left or the scan is known to be over.
    fn advance_chunk(&mut self) -> Result<bool> {
        let next = self.current.map_or(0, |i| i + 1);
        let Some(chunk) = self.chunks.get(next).copied() else {
            return Ok(false);
        };

        let contiguous = self
            .current
            .is_some_and(|i| self.chunks[i].v == chunk.u);
        if !contiguous {
            if self.reader.cached_past_end(chunk.u, self.tid, self.end) {
                trace!("Record cached at {} is past the query end", chunk.u);
                return Ok(false);
            }
            trace!("Seek to {}", chunk.u);
            self.reader.stream.seek_virtual(chunk.u)?;
            self.cursor = self.reader.stream.virtual_offset();
        }
        self.current = Some(next);
        Ok(true)
    }
}

impl<S> Iterator for TabixIterator<'_, S>
where
    S: VirtualSeekRead,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_next() {
            Ok(Some(line)) => Some(Ok(line)),
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

impl<S> std::iter::FusedIterator for TabixIterator<'_, S> where S: VirtualSeekRead {}

impl<S> Debug for TabixIterator<'_, S>
where
    S: VirtualSeekRead,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabixIterator")
            .field("tid", &self.tid)
            .field("begin", &self.begin)
            .field("end", &self.end)
            .field("chunks", &self.chunks)
            .field("current", &self.current)
            .field("done", &self.done)
            .finish()
    }
}
