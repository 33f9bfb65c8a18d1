//! The block-compressed data stream a [`TabixReader`](crate::TabixReader) reads records from.

use std::io::{self, BufRead, Read, Seek};

use noodles_bgzf as bgzf;

use crate::virtual_offset::VirtualOffset;

/// A line-oriented stream addressed by BGZF virtual offsets.
pub trait VirtualSeekRead {
    /// Position the stream at `offset`.
    fn seek_virtual(&mut self, offset: VirtualOffset) -> io::Result<()>;

    /// Read the next line without its line terminator, `None` at end of stream.
    fn next_line(&mut self) -> io::Result<Option<String>>;

    /// Virtual offset of the next unread byte.
    fn virtual_offset(&self) -> VirtualOffset;
}

impl<R> VirtualSeekRead for bgzf::io::Reader<R>
where
    R: Read + Seek,
{
    fn seek_virtual(&mut self, offset: VirtualOffset) -> io::Result<()> {
        self.seek(bgzf::VirtualPosition::from(offset.as_raw()))?;
        Ok(())
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        if BufRead::read_line(self, &mut buf)? == 0 {
            return Ok(None);
        }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        Ok(Some(buf))
    }

    fn virtual_offset(&self) -> VirtualOffset {
        VirtualOffset::new(u64::from(self.virtual_position()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::{Cursor, Write};

    fn bgzip(text: &str) -> Vec<u8> {
        let mut writer = bgzf::io::Writer::new(Vec::new());
        writer.write_all(text.as_bytes()).unwrap();
        writer.finish().unwrap()
    }

    #[rstest]
    fn test_read_lines_and_offsets() {
        let data = bgzip("a\tb\r\nsecond\nlast");
        let mut stream = bgzf::io::Reader::new(Cursor::new(data));

        assert_eq!(stream.virtual_offset().as_raw(), 0);
        assert_eq!(stream.next_line().unwrap().as_deref(), Some("a\tb"));
        assert_eq!(stream.virtual_offset().within_block_offset(), 5);
        assert_eq!(stream.next_line().unwrap().as_deref(), Some("second"));
        assert_eq!(stream.next_line().unwrap().as_deref(), Some("last"));
        assert_eq!(stream.next_line().unwrap(), None);
    }

    #[rstest]
    fn test_seek_virtual() {
        let data = bgzip("first\nsecond\n");
        let mut stream = bgzf::io::Reader::new(Cursor::new(data));

        stream.seek_virtual(VirtualOffset::from_parts(0, 6)).unwrap();
        assert_eq!(stream.next_line().unwrap().as_deref(), Some("second"));

        stream.seek_virtual(VirtualOffset::default()).unwrap();
        assert_eq!(stream.next_line().unwrap().as_deref(), Some("first"));
        assert_eq!(stream.virtual_offset(), VirtualOffset::from_parts(0, 6));
    }
}
