// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Byte sources for the chunk decoder.
//!
//! [`ReadStream`] pulls bytes from any [`std::io::Read`] source, such as an open file.
//! [`BufReader`] walks a payload that is already in memory and also reports how much of it is
//! left through [`FiniteStream`]. Chunk parsers are generic over [`ReadBytes`] so they accept
//! either.

use std::io;

mod buf_reader;
mod read_stream;

pub use buf_reader::BufReader;
pub use read_stream::ReadStream;

/// `ReadBytes` reads raw bytes and big-endian integers from a byte source.
pub trait ReadBytes {
    /// Reads one byte.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Reads two bytes in stream order.
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]>;

    /// Reads four bytes in stream order.
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]>;

    /// Fills as much of `buf` as the source allows and returns the count. A count below
    /// `buf.len()` means the source is exhausted.
    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Fills all of `buf`, failing with `UnexpectedEof` if the source runs dry first.
    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    #[inline(always)]
    fn read_u8(&mut self) -> io::Result<u8> {
        self.read_byte()
    }

    #[inline(always)]
    fn read_be_u16(&mut self) -> io::Result<u16> {
        Ok(u16::from_be_bytes(self.read_double_bytes()?))
    }

    #[inline(always)]
    fn read_be_u32(&mut self) -> io::Result<u32> {
        Ok(u32::from_be_bytes(self.read_quad_bytes()?))
    }

    /// The number of bytes consumed so far.
    fn pos(&self) -> u64;
}

/// Lets a caller lend a source to a parser and keep using it afterwards.
impl<R: ReadBytes> ReadBytes for &mut R {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        (*self).read_byte()
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        (*self).read_double_bytes()
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        (*self).read_quad_bytes()
    }

    #[inline(always)]
    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (*self).read_buf(buf)
    }

    #[inline(always)]
    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        (*self).read_buf_exact(buf)
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        (**self).pos()
    }
}

/// A byte source whose end is known in advance.
pub trait FiniteStream {
    /// The number of bytes left before the end.
    fn bytes_available(&self) -> u64;
}
