// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use smaf_core::errors::{decode_error, Result};
use smaf_core::io::{BufReader, ReadBytes};
use smaf_core::util::format_escaped;

use log::warn;

use serde::Serialize;

use crate::chunks::{
    describe_children, read_payload, serialize_escaped, write_node, Chunk, ChunkHeader,
    ChunksReader, ParseChunk,
};
use crate::enums::CodeType;

/// Length of the CRC trailing the file chunk payload.
const CRC_LEN: usize = 2;

/// Length of the fixed fields of a contents info chunk.
const CONTENTS_INFO_LEN: usize = 5;

/// `FileChunk` is the top-level container of a SMAF score file. Its payload is a run of child
/// chunks followed by a 16-bit CRC.
#[derive(Clone, Debug, Serialize)]
pub struct FileChunk {
    pub header: ChunkHeader,
    pub children: Vec<Chunk>,
    pub crc: u16,
}

impl ParseChunk for FileChunk {
    fn parse<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        let payload = read_payload(reader, &header)?;

        if payload.len() < CRC_LEN {
            return decode_error("smaf: file chunk is too short to hold a crc");
        }

        let (body, crc) = payload.split_at(payload.len() - CRC_LEN);
        let crc = u16::from_be_bytes([crc[0], crc[1]]);

        let children = ChunksReader::new(body).read_all()?;

        match children.first() {
            Some(Chunk::ContentsInfo(_)) => (),
            _ => warn!("smaf: file chunk does not start with a contents info chunk"),
        }

        Ok(FileChunk { header, children, crc })
    }
}

impl fmt::Display for FileChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = vec![format!("CRC: 0x{:04X}", self.crc)];
        lines.extend(describe_children(&self.children));
        write_node(f, "FileChunk", &self.header, &lines)
    }
}

/// `ContentsInfoChunk` describes the class, text encoding and copy permissions of the contents.
#[derive(Clone, Debug, Serialize)]
pub struct ContentsInfoChunk {
    pub header: ChunkHeader,
    pub class: u8,
    pub content_type: u8,
    pub code_type: CodeType,
    pub copy_status: u8,
    pub copy_counts: u8,
    /// Free-form option text following the fixed fields.
    #[serde(serialize_with = "serialize_escaped")]
    pub option: Vec<u8>,
}

impl ParseChunk for ContentsInfoChunk {
    fn parse<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        let payload = read_payload(reader, &header)?;

        if payload.len() < CONTENTS_INFO_LEN {
            return decode_error("smaf: contents info chunk is too short");
        }

        let mut reader = BufReader::new(&payload);

        Ok(ContentsInfoChunk {
            header,
            class: reader.read_u8()?,
            content_type: reader.read_u8()?,
            code_type: CodeType::from(reader.read_u8()?),
            copy_status: reader.read_u8()?,
            copy_counts: reader.read_u8()?,
            option: reader.read_buf_bytes_available_ref().to_vec(),
        })
    }
}

impl fmt::Display for ContentsInfoChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = [
            format!("Class: 0x{:02X}", self.class),
            format!("Type: 0x{:02X}", self.content_type),
            format!("Code type: {}", self.code_type),
            format!("Copy status: 0x{:02X}", self.copy_status),
            format!("Copy counts: {}", self.copy_counts),
            format!("Option: {}", format_escaped(&self.option)),
        ];
        write_node(f, "ContentsInfoChunk", &self.header, &lines)
    }
}

/// `OptionalDataChunk` groups the data chunks holding the contents metadata.
#[derive(Clone, Debug, Serialize)]
pub struct OptionalDataChunk {
    pub header: ChunkHeader,
    pub children: Vec<Chunk>,
}

impl ParseChunk for OptionalDataChunk {
    fn parse<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        let payload = read_payload(reader, &header)?;
        let children = ChunksReader::new(&payload).read_all()?;
        Ok(OptionalDataChunk { header, children })
    }
}

impl fmt::Display for OptionalDataChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, "OptionalDataChunk", &self.header, &describe_children(&self.children))
    }
}
