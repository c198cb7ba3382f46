// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;

use super::{FiniteStream, ReadBytes};

/// `BufReader` walks a borrowed payload from front to back.
pub struct BufReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BufReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        BufReader { buf, pos: 0 }
    }

    /// Lends the next `len` bytes and moves past them. Nothing is consumed on failure.
    pub fn read_buf_bytes_ref(&mut self, len: usize) -> io::Result<&'a [u8]> {
        let rest = &self.buf[self.pos..];

        if rest.len() < len {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "payload underrun"));
        }

        self.pos += len;
        Ok(&rest[..len])
    }

    /// Lends everything that is left and moves to the end.
    pub fn read_buf_bytes_available_ref(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }
}

impl ReadBytes for BufReader<'_> {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        Ok(self.read_buf_bytes_ref(1)?[0])
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        let bytes = self.read_buf_bytes_ref(2)?;
        Ok([bytes[0], bytes[1]])
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        let bytes = self.read_buf_bytes_ref(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(self.buf.len() - self.pos);
        buf[..len].copy_from_slice(self.read_buf_bytes_ref(len)?);
        Ok(len)
    }

    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        buf.copy_from_slice(self.read_buf_bytes_ref(buf.len())?);
        Ok(())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.pos as u64
    }
}

impl FiniteStream for BufReader<'_> {
    #[inline(always)]
    fn bytes_available(&self) -> u64 {
        (self.buf.len() - self.pos) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::BufReader;
    use crate::io::{FiniteStream, ReadBytes};

    #[test]
    fn verify_big_endian_reads() {
        let mut reader = BufReader::new(&[0x4d, 0x4d, 0x4d, 0x44, 0x00, 0x00, 0x01, 0x02, 0xab]);
        assert_eq!(reader.read_quad_bytes().unwrap(), *b"MMMD");
        assert_eq!(reader.read_be_u32().unwrap(), 0x0102);
        assert_eq!(reader.bytes_available(), 1);
        assert_eq!(reader.read_u8().unwrap(), 0xab);
        assert!(reader.read_u8().is_err());
    }

    #[test]
    fn verify_read_buf_stops_at_end() {
        let mut reader = BufReader::new(&[1, 2, 3]);
        let mut buf = [0u8; 8];
        assert_eq!(reader.read_buf(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(reader.read_buf(&mut buf).unwrap(), 0);
        assert_eq!(reader.pos(), 3);
    }

    #[test]
    fn verify_underrun_does_not_advance() {
        let mut reader = BufReader::new(&[1, 2, 3]);
        assert!(reader.read_quad_bytes().is_err());
        assert!(reader.read_buf_bytes_ref(4).is_err());
        assert!(reader.read_buf_exact(&mut [0u8; 4]).is_err());
        assert_eq!(reader.pos(), 0);
        assert_eq!(reader.read_buf_bytes_available_ref(), &[1, 2, 3]);
    }
}
