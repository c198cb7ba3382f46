// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use smaf_core::errors::{short_read_error, truncated_header_error, Result};
use smaf_core::io::{BufReader, FiniteStream, ReadBytes};
use smaf_core::util::{format_escaped, indent};

use log::{debug, info};

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::data::DataChunk;
use crate::file::{ContentsInfoChunk, FileChunk, OptionalDataChunk};
use crate::track::{AudioTrackChunk, ScoreTrackChunk, SeekPhraseInfoChunk, SetupChunk};
use crate::voice::{MmmgExvoChunk, VoiceCollectionChunk};

/// Size of the largest single read issued while buffering a chunk payload.
const READ_BLOCK_LEN: usize = 4096;

/// `ChunkHeader` is the fixed 8-byte record preceding every chunk payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    /// The 4-byte signature, read big-endian.
    pub signature: u32,
    /// The exact number of payload bytes that follow the header.
    pub size: u32,
}

impl ChunkHeader {
    /// The length of a chunk header in bytes.
    pub const LEN: u64 = 8;

    pub fn new(tag: [u8; 4], size: u32) -> Self {
        ChunkHeader { signature: u32::from_be_bytes(tag), size }
    }

    /// Reads a chunk header, failing if fewer than 8 bytes are available.
    pub fn read<B: ReadBytes>(reader: &mut B) -> Result<ChunkHeader> {
        match ChunkHeader::try_read(reader)? {
            Some(header) => Ok(header),
            None => truncated_header_error(0),
        }
    }

    /// Reads a chunk header, returning `None` if the stream ended cleanly before the first byte.
    pub fn try_read<B: ReadBytes>(reader: &mut B) -> Result<Option<ChunkHeader>> {
        let mut buf = [0u8; ChunkHeader::LEN as usize];

        let len = reader.read_buf(&mut buf)?;

        if len == 0 {
            return Ok(None);
        }
        if len < buf.len() {
            return truncated_header_error(len as u64);
        }

        let mut fields = BufReader::new(&buf);
        let signature = u32::from_be_bytes(fields.read_quad_bytes()?);
        let size = fields.read_be_u32()?;

        Ok(Some(ChunkHeader { signature, size }))
    }

    /// The signature as the four bytes it was read from.
    pub fn tag(&self) -> [u8; 4] {
        self.signature.to_be_bytes()
    }

    /// The low byte of the signature. Some chunk kinds use it to select a code type or a track
    /// number.
    pub fn code_type(&self) -> u8 {
        (self.signature & 0xff) as u8
    }
}

impl fmt::Display for ChunkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "signature=\"{}\" (0x{:08X}), size={}",
            format_escaped(&self.tag()),
            self.signature,
            self.size
        )
    }
}

impl Serialize for ChunkHeader {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChunkHeader", 2)?;
        state.serialize_field("signature", &format_escaped(&self.tag()))?;
        state.serialize_field("size", &self.size)?;
        state.end()
    }
}

/// Reads exactly `header.size` payload bytes, or fails with a short read.
///
/// The payload is buffered in bounded blocks so an untrusted size on a truncated stream does not
/// allocate more than the stream actually holds.
pub(crate) fn read_payload<B: ReadBytes>(reader: &mut B, header: &ChunkHeader) -> Result<Vec<u8>> {
    let expected = header.size as usize;

    let mut payload = Vec::with_capacity(expected.min(READ_BLOCK_LEN));
    let mut block = [0u8; READ_BLOCK_LEN];

    while payload.len() < expected {
        let want = (expected - payload.len()).min(READ_BLOCK_LEN);
        let len = reader.read_buf(&mut block[..want])?;

        if len == 0 {
            break;
        }
        payload.extend_from_slice(&block[..len]);
    }

    if payload.len() < expected {
        return short_read_error(u64::from(header.size), payload.len() as u64);
    }

    Ok(payload)
}

/// Common trait implemented for all chunks that are decoded from a stream.
///
/// The reader is positioned at the first payload byte. An implementation must consume exactly
/// `header.size` bytes on success. On failure no chunk is produced.
pub trait ParseChunk: Sized {
    fn parse<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self>;
}

/// `ChunksReader` reads the child chunks packed into a container chunk's payload.
pub struct ChunksReader<'a> {
    reader: BufReader<'a>,
}

impl<'a> ChunksReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ChunksReader { reader: BufReader::new(buf) }
    }

    /// Reads the next child header, or returns `None` once the payload is exhausted.
    ///
    /// The child's declared size is validated against the bytes left in the parent.
    pub fn next_header(&mut self) -> Result<Option<ChunkHeader>> {
        if self.reader.bytes_available() == 0 {
            return Ok(None);
        }

        let header = ChunkHeader::read(&mut self.reader)?;

        // The size is untrusted, compare without adding to it.
        let available = self.reader.bytes_available();
        if available < u64::from(header.size) {
            return short_read_error(u64::from(header.size), available);
        }

        Ok(Some(header))
    }

    /// Gets the reader positioned at the payload of the last header returned.
    pub fn reader(&mut self) -> &mut BufReader<'a> {
        &mut self.reader
    }

    /// Reads the next child chunk using the common dispatch table.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        match self.next_header()? {
            Some(header) => Ok(Some(Chunk::read(&mut self.reader, header)?)),
            None => Ok(None),
        }
    }

    /// Reads every remaining child chunk.
    pub fn read_all(mut self) -> Result<Vec<Chunk>> {
        let mut children = Vec::new();

        while let Some(chunk) = self.next_chunk()? {
            children.push(chunk);
        }

        Ok(children)
    }
}

/// `UnknownChunk` keeps the payload of a chunk that is not interpreted further.
#[derive(Clone, Debug, Serialize)]
pub struct UnknownChunk {
    pub header: ChunkHeader,
    pub stream: Vec<u8>,
}

impl ParseChunk for UnknownChunk {
    fn parse<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        let stream = read_payload(reader, &header)?;
        Ok(UnknownChunk { header, stream })
    }
}

impl fmt::Display for UnknownChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = [format!("Stream: {}", format_escaped(&self.stream))];
        write_node(f, "UnknownChunk", &self.header, &lines)
    }
}

/// Writes a chunk description: a title line followed by tab-indented detail lines.
pub(crate) fn write_node(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    header: &ChunkHeader,
    lines: &[String],
) -> fmt::Result {
    write!(f, "{}: {}", name, header)?;

    if !lines.is_empty() {
        write!(f, "\n{}", indent(&lines.join("\n"), "\t"))?;
    }

    Ok(())
}

/// Describes each child chunk on its own lines.
pub(crate) fn describe_children(children: &[Chunk]) -> Vec<String> {
    children.iter().map(|child| child.describe()).collect()
}

/// Serializes raw bytes as an escaped string.
pub(crate) fn serialize_escaped<T, S>(
    bytes: &T,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&format_escaped(bytes.as_ref()))
}

/// `Chunk` is the closed set of chunk kinds found in a SMAF stream.
#[derive(Clone, Debug, Serialize)]
pub enum Chunk {
    File(FileChunk),
    ContentsInfo(ContentsInfoChunk),
    OptionalData(OptionalDataChunk),
    Data(DataChunk),
    ScoreTrack(ScoreTrackChunk),
    AudioTrack(AudioTrackChunk),
    SeekPhraseInfo(SeekPhraseInfoChunk),
    Setup(SetupChunk),
    VoiceCollection(VoiceCollectionChunk),
    MmmgExvo(MmmgExvoChunk),
    Unknown(UnknownChunk),
}

impl Chunk {
    /// Decodes the payload of the chunk introduced by `header`, selecting the chunk kind by
    /// signature.
    pub fn read<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Chunk> {
        debug!("chunk: {}", header);

        let tag = header.tag();

        let chunk = match &tag {
            b"MMMD" => Chunk::File(FileChunk::parse(reader, header)?),
            b"CNTI" => Chunk::ContentsInfo(ContentsInfoChunk::parse(reader, header)?),
            b"OPDA" => Chunk::OptionalData(OptionalDataChunk::parse(reader, header)?),
            [b'D', b'c', b'h', _] => Chunk::Data(DataChunk::parse(reader, header)?),
            [b'M', b'T', b'R', _] => Chunk::ScoreTrack(ScoreTrackChunk::parse(reader, header)?),
            [b'A', b'T', b'R', _] => Chunk::AudioTrack(AudioTrackChunk::parse(reader, header)?),
            b"MspI" => Chunk::SeekPhraseInfo(SeekPhraseInfoChunk::parse(reader, header)?),
            b"Mtsu" => Chunk::Setup(SetupChunk::parse(reader, header)?),
            b"MMMG" => Chunk::VoiceCollection(VoiceCollectionChunk::parse(reader, header)?),
            b"EXVO" => Chunk::MmmgExvo(MmmgExvoChunk::parse(reader, header)?),
            // Sequence and wave data are carried opaquely.
            b"Mtsq" | b"Mtsp" | b"Atsq" | b"Atsu" | [b'A', b'w', b'a', _] => {
                Chunk::Unknown(UnknownChunk::parse(reader, header)?)
            }
            _ => {
                info!(
                    "keeping unknown chunk opaque: tag={}, len={}",
                    format_escaped(&tag),
                    header.size
                );
                Chunk::Unknown(UnknownChunk::parse(reader, header)?)
            }
        };

        Ok(chunk)
    }

    /// Gets the header of the chunk.
    pub fn header(&self) -> &ChunkHeader {
        match self {
            Chunk::File(chunk) => &chunk.header,
            Chunk::ContentsInfo(chunk) => &chunk.header,
            Chunk::OptionalData(chunk) => &chunk.header,
            Chunk::Data(chunk) => &chunk.header,
            Chunk::ScoreTrack(chunk) => &chunk.header,
            Chunk::AudioTrack(chunk) => &chunk.header,
            Chunk::SeekPhraseInfo(chunk) => &chunk.header,
            Chunk::Setup(chunk) => &chunk.header,
            Chunk::VoiceCollection(chunk) => &chunk.header,
            Chunk::MmmgExvo(chunk) => &chunk.header,
            Chunk::Unknown(chunk) => &chunk.header,
        }
    }

    /// Gets the child chunks of a container chunk. Leaf chunks have none.
    pub fn children(&self) -> &[Chunk] {
        match self {
            Chunk::File(chunk) => &chunk.children,
            Chunk::OptionalData(chunk) => &chunk.children,
            Chunk::ScoreTrack(chunk) => &chunk.children,
            Chunk::AudioTrack(chunk) => &chunk.children,
            Chunk::VoiceCollection(chunk) => &chunk.children,
            _ => &[],
        }
    }

    /// Returns a multi-line, human-readable report of the chunk and its payload.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Visits this chunk, then every descendant in stream order.
    pub fn traverse<F: FnMut(&Chunk)>(&self, visit: &mut F) {
        visit(self);

        for child in self.children() {
            child.traverse(visit);
        }
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::File(chunk) => chunk.fmt(f),
            Chunk::ContentsInfo(chunk) => chunk.fmt(f),
            Chunk::OptionalData(chunk) => chunk.fmt(f),
            Chunk::Data(chunk) => chunk.fmt(f),
            Chunk::ScoreTrack(chunk) => chunk.fmt(f),
            Chunk::AudioTrack(chunk) => chunk.fmt(f),
            Chunk::SeekPhraseInfo(chunk) => chunk.fmt(f),
            Chunk::Setup(chunk) => chunk.fmt(f),
            Chunk::VoiceCollection(chunk) => chunk.fmt(f),
            Chunk::MmmgExvo(chunk) => chunk.fmt(f),
            Chunk::Unknown(chunk) => chunk.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use smaf_core::errors::Error;
    use smaf_core::io::{BufReader, FiniteStream};

    use super::*;

    #[test]
    fn verify_header_parsing() {
        let mut reader = BufReader::new(b"Dch\x00\x00\x00\x00\x07rest");
        let header = ChunkHeader::read(&mut reader).unwrap();

        assert_eq!(header.tag(), *b"Dch\x00");
        assert_eq!(header.signature, 0x4463_6800);
        assert_eq!(header.size, 7);
        assert_eq!(header.code_type(), 0x00);
        assert_eq!(reader.pos(), 8);
        assert_eq!(header.to_string(), "signature=\"Dch\\x00\" (0x44636800), size=7");
    }

    #[test]
    fn verify_truncated_header() {
        let mut reader = BufReader::new(b"MMMD\x00\x00");
        match ChunkHeader::read(&mut reader) {
            Err(Error::TruncatedHeader { available: 6 }) => (),
            res => panic!("unexpected result {:?}", res),
        }

        let mut reader = BufReader::new(b"");
        assert!(ChunkHeader::try_read(&mut reader).unwrap().is_none());
        assert!(matches!(
            ChunkHeader::read(&mut reader),
            Err(Error::TruncatedHeader { available: 0 })
        ));
    }

    #[test]
    fn verify_payload_consumes_exactly_size() {
        let mut buf = vec![0xaa; READ_BLOCK_LEN * 2 + 5];
        buf.extend_from_slice(b"next");

        let header = ChunkHeader::new(*b"ABCD", (READ_BLOCK_LEN * 2 + 5) as u32);
        let mut reader = BufReader::new(&buf);
        let payload = read_payload(&mut reader, &header).unwrap();

        assert_eq!(payload.len(), READ_BLOCK_LEN * 2 + 5);
        assert_eq!(reader.bytes_available(), 4);
    }

    #[test]
    fn verify_short_payload() {
        let header = ChunkHeader::new(*b"ABCD", 10);
        let mut reader = BufReader::new(&[1, 2, 3]);
        match read_payload(&mut reader, &header) {
            Err(Error::ShortRead { expected: 10, actual: 3 }) => (),
            res => panic!("unexpected result {:?}", res),
        }
    }

    #[test]
    fn verify_child_exceeding_parent() {
        let mut chunks = ChunksReader::new(b"Mtsq\x00\x00\x00\x09abc");
        match chunks.next_header() {
            Err(Error::ShortRead { expected: 9, actual: 3 }) => (),
            res => panic!("unexpected result {:?}", res),
        }
    }

    #[test]
    fn verify_leftover_bytes_in_parent() {
        let chunks = ChunksReader::new(b"Mtsq\x00\x00\x00\x01aXY");
        assert!(matches!(chunks.read_all(), Err(Error::TruncatedHeader { available: 2 })));
    }

    #[test]
    fn verify_unknown_chunk_is_kept() {
        let children = ChunksReader::new(b"Zzzz\x00\x00\x00\x02hi").read_all().unwrap();
        assert_eq!(children.len(), 1);

        match &children[0] {
            Chunk::Unknown(chunk) => assert_eq!(chunk.stream, b"hi"),
            chunk => panic!("unexpected chunk {:?}", chunk),
        }

        let mut visited = 0;
        children[0].traverse(&mut |_: &Chunk| visited += 1);
        assert_eq!(visited, 1);
    }
}
