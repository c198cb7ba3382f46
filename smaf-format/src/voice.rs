// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use smaf_core::errors::{Error, Result};
use smaf_core::io::{BufReader, ReadBytes};
use smaf_core::util::format_hex;

use log::warn;

use serde::Serialize;

use crate::chunks::{
    describe_children, read_payload, write_node, Chunk, ChunkHeader, ChunksReader, ParseChunk,
};
use crate::exclusive::{Exclusive, EXCLUSIVE_MARKER};

/// `VoiceCollectionChunk` is the top-level container of a voice collection stream.
#[derive(Clone, Debug, Serialize)]
pub struct VoiceCollectionChunk {
    pub header: ChunkHeader,
    pub children: Vec<Chunk>,
}

impl ParseChunk for VoiceCollectionChunk {
    fn parse<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        let payload = read_payload(reader, &header)?;
        let children = ChunksReader::new(&payload).read_all()?;
        Ok(VoiceCollectionChunk { header, children })
    }
}

impl fmt::Display for VoiceCollectionChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, "VoiceCollectionChunk", &self.header, &describe_children(&self.children))
    }
}

/// `MmmgExvoChunk` carries one exclusive voice message inside a voice collection.
#[derive(Clone, Debug, Serialize)]
pub struct MmmgExvoChunk {
    pub header: ChunkHeader,
    pub stream: Vec<u8>,
    /// Present only if the payload starts with the exclusive marker.
    pub exclusive: Option<Exclusive>,
}

impl ParseChunk for MmmgExvoChunk {
    fn parse<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        let stream = read_payload(reader, &header)?;

        if stream.len() < EXCLUSIVE_MARKER.len() {
            warn!("exvo: payload is shorter than the exclusive marker, keeping it opaque");
        }

        if !stream.starts_with(&EXCLUSIVE_MARKER) {
            return Ok(MmmgExvoChunk { header, stream, exclusive: None });
        }

        let body = &stream[EXCLUSIVE_MARKER.len()..];

        let mut exclusive = Exclusive::new(false);
        let mut rest = body.len();
        exclusive.read(&mut BufReader::new(body), &mut rest)?;

        if rest != 0 {
            return Err(Error::ExclusiveSizeMismatch { remaining: rest });
        }

        Ok(MmmgExvoChunk { header, stream, exclusive: Some(exclusive) })
    }
}

impl fmt::Display for MmmgExvoChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = match &self.exclusive {
            Some(exclusive) => format!("Exclusive: {}", exclusive),
            None => format!("Stream: {}", format_hex(&self.stream)),
        };
        write_node(f, "MMMGEXVOChunk", &self.header, &[line])
    }
}

#[cfg(test)]
mod tests {
    use smaf_core::errors::Error;
    use smaf_core::io::{BufReader, FiniteStream};

    use super::*;
    use crate::exclusive::ExclusiveMessage;

    fn parse(payload: &[u8]) -> Result<MmmgExvoChunk> {
        let mut reader = BufReader::new(payload);
        MmmgExvoChunk::parse(&mut reader, ChunkHeader::new(*b"EXVO", payload.len() as u32))
    }

    #[test]
    fn verify_exclusive_is_decoded() {
        let chunk = parse(&[0xff, 0xf0, 0x03, 0x7d, 0x11, 0xf7]).unwrap();

        let exclusive = chunk.exclusive.unwrap();
        assert_eq!(exclusive.maker_id, 0x7d);
        assert_eq!(exclusive.message, ExclusiveMessage::Raw(vec![0x11]));
        assert_eq!(chunk.stream.len(), 6);
    }

    #[test]
    fn verify_opaque_payload() {
        let chunk = parse(&[0x01, 0x02, 0x03]).unwrap();
        assert!(chunk.exclusive.is_none());
        assert_eq!(chunk.to_string().lines().nth(1), Some("\tStream: 01 02 03"));

        let chunk = parse(&[0xff]).unwrap();
        assert!(chunk.exclusive.is_none());

        let chunk = parse(&[]).unwrap();
        assert!(chunk.exclusive.is_none());
    }

    #[test]
    fn verify_unconsumed_budget_fails() {
        match parse(&[0xff, 0xf0, 0x03, 0x7d, 0x11, 0xf7, 0x00]) {
            Err(Error::ExclusiveSizeMismatch { remaining: 1 }) => (),
            res => panic!("unexpected result {:?}", res),
        }
    }

    #[test]
    fn verify_malformed_exclusive_fails() {
        assert!(matches!(
            parse(&[0xff, 0xf0, 0x03, 0x7d, 0x11, 0x00]),
            Err(Error::ExclusiveDecode(_))
        ));
    }

    #[test]
    fn verify_short_payload_fails() {
        let mut reader = BufReader::new(&[0xff, 0xf0, 0x03]);
        let res = MmmgExvoChunk::parse(&mut reader, ChunkHeader::new(*b"EXVO", 6));
        assert!(matches!(res, Err(Error::ShortRead { expected: 6, actual: 3 })));
        assert_eq!(reader.bytes_available(), 0);
    }
}
