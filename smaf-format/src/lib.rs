// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Decoder for the chunk structure of SMAF (Synthetic music Mobile Application Format) streams.
//!
//! A stream is a sequence of top-level chunks. Each chunk is decoded into a [`Chunk`] tree that
//! can be described, traversed, or serialized.

use std::fmt;

use smaf_core::errors::{decode_error, Result};
use smaf_core::io::{BufReader, ReadBytes};

use log::debug;

use serde::Serialize;

mod chunks;
mod data;
mod enums;
mod exclusive;
mod file;
mod track;
mod voice;

pub use chunks::{Chunk, ChunkHeader, ChunksReader, ParseChunk, UnknownChunk};
pub use data::{decode_option_records, DataChunk, OptionRecord, Options};
pub use enums::{CodeType, ScoreTrackFormatType, ScoreTrackSequenceType, TimeBase};
pub use exclusive::{
    Exclusive, ExclusiveMessage, FmOperator, FmVoice, Voice, VoiceMessage, END_OF_EXCLUSIVE,
    EXCLUSIVE_MARKER, MAKER_ID_YAMAHA,
};
pub use file::{ContentsInfoChunk, FileChunk, OptionalDataChunk};
pub use track::{AudioTrackChunk, ScoreTrackChunk, SeekPhraseInfoChunk, SetupChunk};
pub use voice::{MmmgExvoChunk, VoiceCollectionChunk};

/// `Smaf` is a decoded SMAF stream: every top-level chunk in stream order.
#[derive(Clone, Debug, Serialize)]
pub struct Smaf {
    chunks: Vec<Chunk>,
}

impl Smaf {
    /// Reads top-level chunks until the stream ends cleanly on a chunk boundary.
    pub fn read<B: ReadBytes>(mut reader: B) -> Result<Smaf> {
        let mut chunks = Vec::new();

        while let Some(header) = ChunkHeader::try_read(&mut reader)? {
            chunks.push(Chunk::read(&mut reader, header)?);
        }

        if chunks.is_empty() {
            return decode_error("smaf: stream contains no chunks");
        }

        debug!("smaf: read {} top-level chunks", chunks.len());

        Ok(Smaf { chunks })
    }

    /// Decodes an in-memory stream.
    pub fn from_bytes(buf: &[u8]) -> Result<Smaf> {
        Smaf::read(BufReader::new(buf))
    }

    /// Gets the top-level chunks.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Visits every chunk depth-first, in stream order.
    pub fn traverse<F: FnMut(&Chunk)>(&self, mut visit: F) {
        for chunk in &self.chunks {
            chunk.traverse(&mut visit);
        }
    }
}

impl fmt::Display for Smaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let descriptions: Vec<String> = self.chunks.iter().map(Chunk::describe).collect();
        write!(f, "{}", descriptions.join("\n"))
    }
}
