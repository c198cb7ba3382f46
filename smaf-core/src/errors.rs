// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::io;
use std::result;

/// `Error` provides an enumeration of all possible errors reported while decoding a SMAF stream.
///
/// Framing and length violations are always errors. Unknown enumeration values and unknown tags
/// are not, they are carried through as representable values instead.
#[derive(Debug)]
pub enum Error {
    /// An IO error occured while reading the stream.
    IoError(std::io::Error),
    /// A fixed-layout field was malformed and could not be decoded.
    DecodeError(&'static str),
    /// Fewer bytes than a chunk header requires were available.
    TruncatedHeader {
        /// The number of header bytes that were available.
        available: u64,
    },
    /// A chunk payload was shorter than the size declared in its header.
    ShortRead {
        /// The payload size declared by the chunk header.
        expected: u64,
        /// The number of payload bytes actually read.
        actual: u64,
    },
    /// A tag-length-value record declared more bytes than remain in its buffer.
    TlvOverrun {
        /// Offset of the record within the chunk payload.
        offset: usize,
        /// The number of bytes the record required.
        declared: usize,
        /// The number of bytes left in the payload at `offset`.
        remaining: usize,
    },
    /// An exclusive message did not consume its byte budget exactly.
    ExclusiveSizeMismatch {
        /// Bytes left in the budget after decoding finished.
        remaining: usize,
    },
    /// An exclusive message was structurally invalid.
    ExclusiveDecode(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::IoError(ref err) => err.fmt(f),
            Error::DecodeError(msg) => {
                write!(f, "malformed stream: {}", msg)
            }
            Error::TruncatedHeader { available } => {
                write!(f, "truncated chunk header: only {} of 8 bytes available", available)
            }
            Error::ShortRead { expected, actual } => {
                write!(
                    f,
                    "cannot read enough bytes for chunk: header declares {} bytes, read {}",
                    expected, actual
                )
            }
            Error::TlvOverrun { offset, declared, remaining } => {
                write!(
                    f,
                    "option record at offset {} needs {} bytes, only {} remain",
                    offset, declared, remaining
                )
            }
            Error::ExclusiveSizeMismatch { remaining } => {
                write!(f, "wrong size of exclusive data: {} bytes left unconsumed", remaining)
            }
            Error::ExclusiveDecode(msg) => {
                write!(f, "malformed exclusive message: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create a decode error.
pub fn decode_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::DecodeError(desc))
}

/// Convenience function to create a truncated header error.
pub fn truncated_header_error<T>(available: u64) -> Result<T> {
    Err(Error::TruncatedHeader { available })
}

/// Convenience function to create a short read error.
pub fn short_read_error<T>(expected: u64, actual: u64) -> Result<T> {
    Err(Error::ShortRead { expected, actual })
}

/// Convenience function to create an exclusive message decode error.
pub fn exclusive_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::ExclusiveDecode(desc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_display() {
        let err = Error::ShortRead { expected: 10, actual: 4 };
        assert_eq!(
            err.to_string(),
            "cannot read enough bytes for chunk: header declares 10 bytes, read 4"
        );

        let err = Error::ExclusiveSizeMismatch { remaining: 3 };
        assert_eq!(err.to_string(), "wrong size of exclusive data: 3 bytes left unconsumed");
    }

    #[test]
    fn verify_io_error_source() {
        let err: Error = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(error::Error::source(&err).is_some());
        assert!(error::Error::source(&Error::DecodeError("x")).is_none());
    }
}
