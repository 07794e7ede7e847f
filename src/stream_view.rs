use crate::container::{Container, ReadSeek};
use crate::err::{CfbError, Result};

use log::trace;
use std::io::{self, Read, Seek, SeekFrom};

/// A seekable view of one directory entry's stream.
///
/// The chain is resolved once when the view is created, so every unit (sector or mini-sector)
/// already has its physical offset and seeking never touches the allocation tables.
pub struct StreamView<'a, T: ReadSeek> {
    container: &'a Container<T>,
    sid: u32,
    /// Physical offset of each unit of the stream, in stream order.
    offsets: Vec<u64>,
    unit_size: usize,
    len: u64,
    pos: u64,
    mini: bool,
}

impl<'a, T: ReadSeek> StreamView<'a, T> {
    pub(crate) fn new(
        container: &'a Container<T>,
        sid: u32,
        offsets: Vec<u64>,
        unit_size: usize,
        len: u64,
        mini: bool,
    ) -> Self {
        trace!(
            "stream view for entry {}: {} bytes over {} {} units",
            sid,
            len,
            offsets.len(),
            if mini { "mini" } else { "regular" }
        );
        StreamView {
            container,
            sid,
            offsets,
            unit_size,
            len,
            pos: 0,
            mini,
        }
    }

    pub fn sid(&self) -> u32 {
        self.sid
    }

    /// Length of the view, including slack when it was requested.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Whether the stream lives in the mini stream.
    pub fn is_mini(&self) -> bool {
        self.mini
    }

    /// 64 for mini streams, the sector size otherwise.
    pub fn unit_size(&self) -> usize {
        self.unit_size
    }

    /// Physical offset of every unit backing this stream.
    pub fn physical_offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Read up to `buf.len()` bytes at the current position.
    ///
    /// Runs of physically contiguous units are read with a single call to the byte source.
    pub(crate) fn read_inner(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.pos >= self.len || buf.is_empty() {
            return Ok(0);
        }
        let want = (self.len - self.pos).min(buf.len() as u64) as usize;
        let unit = self.unit_size as u64;

        let mut done = 0;
        while done < want {
            let index = (self.pos / unit) as usize;
            let within = self.pos % unit;
            let start = self.offsets[index] + within;

            let mut run = (unit - within) as usize;
            let mut last = index;
            while run < want - done
                && last + 1 < self.offsets.len()
                && self.offsets[last + 1] == self.offsets[last] + unit
            {
                run += self.unit_size;
                last += 1;
            }

            let n = run.min(want - done);
            let got = self
                .container
                .read_at(start, &mut buf[done..done + n])?;
            done += got;
            self.pos += got as u64;

            if got < n {
                if done == 0 {
                    return Err(CfbError::TruncatedRead {
                        what: "stream data",
                        offset: start,
                        need: n,
                        have: got,
                    });
                }
                break;
            }
        }

        Ok(done)
    }

    /// Read from the current position to the end of the view.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let remaining = self.len.saturating_sub(self.pos);
        let mut out = vec![0; remaining as usize];
        let mut filled = 0;
        while filled < out.len() {
            let n = self.read_inner(&mut out[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled < out.len() {
            return Err(CfbError::TruncatedRead {
                what: "stream data",
                offset: self.pos,
                need: out.len(),
                have: filled,
            });
        }
        Ok(out)
    }
}

impl<T: ReadSeek> Read for StreamView<'_, T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_inner(buf).map_err(|e| match e {
            CfbError::Io(inner) => inner,
            other => io::Error::new(io::ErrorKind::UnexpectedEof, other),
        })
    }
}

impl<T: ReadSeek> Seek for StreamView<'_, T> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };
        match target {
            Some(target) => {
                self.pos = target;
                Ok(target)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}
