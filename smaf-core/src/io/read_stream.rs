// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;
use std::io::Read;

use super::ReadBytes;

/// `ReadStream` adapts any source implementing [`std::io::Read`] to [`ReadBytes`].
///
/// Short reads from the inner source are retried until either the request is satisfied or the
/// source reports the end of the stream.
pub struct ReadStream<R: Read> {
    inner: R,
    pos: u64,
}

impl<R: Read> ReadStream<R> {
    pub fn new(inner: R) -> Self {
        ReadStream { inner, pos: 0 }
    }
}

impl<R: Read> ReadBytes for ReadStream<R> {
    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        self.read_buf_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        let mut bytes = [0u8; 2];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        let mut bytes = [0u8; 4];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;

        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => (),
                Err(err) => return Err(err),
            }
        }

        self.pos += filled as u64;
        Ok(filled)
    }

    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let len = self.read_buf(buf)?;

        if len < buf.len() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of stream"));
        }

        Ok(())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};

    use super::ReadStream;
    use crate::io::ReadBytes;

    /// A source that never returns more than `step` bytes per read call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let len = self.step.min(buf.len()).min(self.data.len());
            buf[..len].copy_from_slice(&self.data[..len]);
            self.data = &self.data[len..];
            Ok(len)
        }
    }

    #[test]
    fn verify_short_reads_are_retried() {
        let data = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let mut stream = ReadStream::new(Trickle { data: &data, step: 3 });

        let mut buf = [0u8; 8];
        assert_eq!(stream.read_buf(&mut buf).unwrap(), 8);
        assert_eq!(buf, [0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(stream.pos(), 8);

        assert_eq!(stream.read_buf(&mut buf).unwrap(), 2);
        assert!(stream.read_byte().is_err());
    }

    #[test]
    fn verify_big_endian_reads() {
        let data = [0x00, 0x00, 0x01, 0x02, 0x03, 0x04];
        let mut stream = ReadStream::new(Trickle { data: &data, step: 1 });

        assert_eq!(stream.read_be_u32().unwrap(), 0x0102);
        assert_eq!(stream.read_be_u16().unwrap(), 0x0304);
        assert!(stream.read_quad_bytes().is_err());
    }
}
