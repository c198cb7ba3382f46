// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use smaf_core::errors::{decode_error, exclusive_error, Result};
use smaf_core::io::{BufReader, FiniteStream, ReadBytes};
use smaf_core::util::{format_escaped, format_hex};

use serde::Serialize;

use crate::chunks::{
    describe_children, read_payload, write_node, Chunk, ChunkHeader, ChunksReader, ParseChunk,
};
use crate::enums::{ScoreTrackFormatType, ScoreTrackSequenceType, TimeBase};
use crate::exclusive::{take_u8, Exclusive, EXCLUSIVE_MARKER};

/// Length of the fixed fields of a score track, excluding the channel status.
const SCORE_TRACK_FIXED_LEN: u64 = 4;

/// Length of the fixed fields of an audio track.
const AUDIO_TRACK_FIXED_LEN: u64 = 6;

/// `ScoreTrackChunk` holds one score track: its encoding, timing, channel status and the
/// setup, sequence and seek chunks that follow.
#[derive(Clone, Debug, Serialize)]
pub struct ScoreTrackChunk {
    pub header: ChunkHeader,
    pub format_type: ScoreTrackFormatType,
    pub sequence_type: ScoreTrackSequenceType,
    pub timebase_d: TimeBase,
    pub timebase_g: TimeBase,
    pub channel_status: Vec<u8>,
    pub children: Vec<Chunk>,
}

impl ScoreTrackChunk {
    /// The track number encoded in the low byte of the signature.
    pub fn track_number(&self) -> u8 {
        self.header.code_type()
    }

    /// The number of channel status bytes used by a format.
    pub fn channel_status_len(format_type: ScoreTrackFormatType) -> usize {
        match format_type {
            ScoreTrackFormatType::HandyPhoneStandard => 2,
            _ => 16,
        }
    }
}

impl ParseChunk for ScoreTrackChunk {
    fn parse<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        let payload = read_payload(reader, &header)?;
        let mut reader = BufReader::new(&payload);

        if reader.bytes_available() < SCORE_TRACK_FIXED_LEN {
            return decode_error("smaf: score track header is too short");
        }

        let format_type = ScoreTrackFormatType::from(reader.read_u8()?);
        let sequence_type = ScoreTrackSequenceType::from(reader.read_u8()?);
        let timebase_d = TimeBase::from(reader.read_u8()?);
        let timebase_g = TimeBase::from(reader.read_u8()?);

        let status_len = ScoreTrackChunk::channel_status_len(format_type);
        if reader.bytes_available() < status_len as u64 {
            return decode_error("smaf: score track channel status is truncated");
        }
        let channel_status = reader.read_buf_bytes_ref(status_len)?.to_vec();

        // Setup messages use the short exclusive form in handy phone standard tracks.
        let short_form = format_type == ScoreTrackFormatType::HandyPhoneStandard;

        let mut chunks = ChunksReader::new(reader.read_buf_bytes_available_ref());
        let mut children = Vec::new();

        while let Some(child) = chunks.next_header()? {
            let chunk = if child.tag() == *b"Mtsu" {
                Chunk::Setup(SetupChunk::parse_with_form(chunks.reader(), child, short_form)?)
            }
            else {
                Chunk::read(chunks.reader(), child)?
            };
            children.push(chunk);
        }

        Ok(ScoreTrackChunk {
            header,
            format_type,
            sequence_type,
            timebase_d,
            timebase_g,
            channel_status,
            children,
        })
    }
}

impl fmt::Display for ScoreTrackChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = vec![
            format!("Track number: {}", self.track_number()),
            format!("Format type: {}", self.format_type),
            format!("Sequence type: {}", self.sequence_type),
            format!("Timebase D: {}", self.timebase_d),
            format!("Timebase G: {}", self.timebase_g),
            format!("Channel status: {}", format_hex(&self.channel_status)),
        ];
        lines.extend(describe_children(&self.children));
        write_node(f, "ScoreTrackChunk", &self.header, &lines)
    }
}

/// `AudioTrackChunk` holds one PCM audio track and its wave data chunks.
#[derive(Clone, Debug, Serialize)]
pub struct AudioTrackChunk {
    pub header: ChunkHeader,
    pub format_type: u8,
    pub sequence_type: ScoreTrackSequenceType,
    pub wave_type: u16,
    pub timebase_d: TimeBase,
    pub timebase_g: TimeBase,
    pub children: Vec<Chunk>,
}

impl ParseChunk for AudioTrackChunk {
    fn parse<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        let payload = read_payload(reader, &header)?;
        let mut reader = BufReader::new(&payload);

        if reader.bytes_available() < AUDIO_TRACK_FIXED_LEN {
            return decode_error("smaf: audio track header is too short");
        }

        let format_type = reader.read_u8()?;
        let sequence_type = ScoreTrackSequenceType::from(reader.read_u8()?);
        let wave_type = reader.read_be_u16()?;
        let timebase_d = TimeBase::from(reader.read_u8()?);
        let timebase_g = TimeBase::from(reader.read_u8()?);

        let children = ChunksReader::new(reader.read_buf_bytes_available_ref()).read_all()?;

        Ok(AudioTrackChunk {
            header,
            format_type,
            sequence_type,
            wave_type,
            timebase_d,
            timebase_g,
            children,
        })
    }
}

impl fmt::Display for AudioTrackChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = vec![
            format!("Format type: 0x{:02X}", self.format_type),
            format!("Sequence type: {}", self.sequence_type),
            format!("Wave type: 0x{:04X}", self.wave_type),
            format!("Timebase D: {}", self.timebase_d),
            format!("Timebase G: {}", self.timebase_g),
        ];
        lines.extend(describe_children(&self.children));
        write_node(f, "AudioTrackChunk", &self.header, &lines)
    }
}

/// `SeekPhraseInfoChunk` carries the seek points and phrase list of a track verbatim.
#[derive(Clone, Debug, Serialize)]
pub struct SeekPhraseInfoChunk {
    pub header: ChunkHeader,
    pub stream: Vec<u8>,
}

impl ParseChunk for SeekPhraseInfoChunk {
    fn parse<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        let stream = read_payload(reader, &header)?;
        Ok(SeekPhraseInfoChunk { header, stream })
    }
}

impl fmt::Display for SeekPhraseInfoChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = [format!("Stream: {}", format_escaped(&self.stream))];
        write_node(f, "SeekPhraseInfoChunk", &self.header, &lines)
    }
}

/// `SetupChunk` is a run of exclusive messages sent before a track starts playing.
#[derive(Clone, Debug, Serialize)]
pub struct SetupChunk {
    pub header: ChunkHeader,
    pub messages: Vec<Exclusive>,
}

impl SetupChunk {
    /// Reads a setup chunk whose messages use the given exclusive length form.
    pub fn parse_with_form<B: ReadBytes>(
        reader: &mut B,
        header: ChunkHeader,
        short_form: bool,
    ) -> Result<SetupChunk> {
        let payload = read_payload(reader, &header)?;

        let mut reader = BufReader::new(&payload);
        let mut rest = payload.len();
        let mut messages = Vec::new();

        while rest > 0 {
            let marker = [take_u8(&mut reader, &mut rest)?, take_u8(&mut reader, &mut rest)?];
            if marker != EXCLUSIVE_MARKER {
                return exclusive_error("setup event is not an exclusive message");
            }

            let mut exclusive = Exclusive::new(short_form);
            exclusive.read(&mut reader, &mut rest)?;
            messages.push(exclusive);
        }

        Ok(SetupChunk { header, messages })
    }
}

impl ParseChunk for SetupChunk {
    fn parse<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        SetupChunk::parse_with_form(reader, header, false)
    }
}

impl fmt::Display for SetupChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> =
            self.messages.iter().map(|msg| format!("Exclusive: {}", msg)).collect();
        write_node(f, "SetupChunk", &self.header, &lines)
    }
}
