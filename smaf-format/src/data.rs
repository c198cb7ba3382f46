// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data chunks and their tag-length-value metadata records.

use std::fmt;

use smaf_core::errors::{Error, Result};
use smaf_core::io::{BufReader, FiniteStream, ReadBytes};
use smaf_core::text::decode_legacy_text;
use smaf_core::util::format_escaped;

use log::debug;

use serde::Serialize;

use crate::chunks::{read_payload, serialize_escaped, write_node, ChunkHeader, ParseChunk};
use crate::enums::CodeType;

/// The code type whose data chunks carry metadata records.
pub const CODE_TYPE_SHIFT_JIS: u8 = 0x00;

/// Length of a record's tag and length fields.
const RECORD_HEADER_LEN: usize = 4;

/// One tag-length-value metadata record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionRecord {
    #[serde(serialize_with = "serialize_escaped")]
    pub tag: [u8; 2],
    pub value: String,
}

impl OptionRecord {
    /// The tag as a two character identifier.
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// Decodes a run of `tag(2) + length(2, big-endian) + value(length)` records until the buffer is
/// exhausted. Values are Shift-JIS text.
pub fn decode_option_records(buf: &[u8]) -> Result<Vec<OptionRecord>> {
    let mut reader = BufReader::new(buf);
    let mut records = Vec::new();

    while reader.bytes_available() > 0 {
        let offset = reader.pos() as usize;
        let remaining = reader.bytes_available() as usize;

        if remaining < RECORD_HEADER_LEN {
            return Err(Error::TlvOverrun { offset, declared: RECORD_HEADER_LEN, remaining });
        }

        let tag = reader.read_double_bytes()?;
        let len = usize::from(reader.read_be_u16()?);

        if remaining - RECORD_HEADER_LEN < len {
            return Err(Error::TlvOverrun { offset, declared: RECORD_HEADER_LEN + len, remaining });
        }

        let value = decode_legacy_text(reader.read_buf_bytes_ref(len)?);

        records.push(OptionRecord { tag, value });
    }

    Ok(records)
}

/// The named metadata fields of a data chunk. A field whose tag is absent is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Options {
    pub vendor: String,
    pub carrier: String,
    pub category: String,
    pub title: String,
    pub artist: String,
    pub lyric_writer: String,
    pub composer: String,
    pub arranger: String,
    pub copyright: String,
    pub management_group: String,
    pub management_info: String,
    pub created_date: String,
    pub updated_date: String,
    pub edit_status: String,
    pub vcard: String,
}

impl Options {
    /// Builds the named fields from decoded records. A later record replaces an earlier one with
    /// the same tag. Records with unknown tags are not attached to any field.
    pub fn from_records(records: &[OptionRecord]) -> Options {
        let mut options = Options::default();

        for record in records {
            match options.field_mut(&record.tag) {
                Some(field) => *field = record.value.clone(),
                None => debug!("ignoring option with unknown tag {}", format_escaped(&record.tag)),
            }
        }

        options
    }

    fn field_mut(&mut self, tag: &[u8; 2]) -> Option<&mut String> {
        let field = match tag {
            b"VN" => &mut self.vendor,
            b"CN" => &mut self.carrier,
            b"CA" => &mut self.category,
            b"ST" => &mut self.title,
            b"AN" => &mut self.artist,
            b"WW" => &mut self.lyric_writer,
            b"SW" => &mut self.composer,
            b"AW" => &mut self.arranger,
            b"CR" => &mut self.copyright,
            b"GR" => &mut self.management_group,
            b"MI" => &mut self.management_info,
            b"CD" => &mut self.created_date,
            b"UD" => &mut self.updated_date,
            b"ES" => &mut self.edit_status,
            b"VC" => &mut self.vcard,
            _ => return None,
        };
        Some(field)
    }

    fn fields(&self) -> [(&'static str, &str); 15] {
        [
            ("Vendor", &self.vendor),
            ("Carrier", &self.carrier),
            ("Category", &self.category),
            ("Title", &self.title),
            ("Artist", &self.artist),
            ("LyricWriter", &self.lyric_writer),
            ("Composer", &self.composer),
            ("Arranger", &self.arranger),
            ("Copyright", &self.copyright),
            ("ManagementGroup", &self.management_group),
            ("ManagementInfo", &self.management_info),
            ("CreatedDate", &self.created_date),
            ("UpdatedDate", &self.updated_date),
            ("EditStatus", &self.edit_status),
            ("VCard", &self.vcard),
        ]
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields();
        let mut first = true;

        write!(f, "{{")?;
        for (name, value) in fields.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}:{}", name, value)?;
            first = false;
        }
        write!(f, "}}")
    }
}

/// `DataChunk` is a metadata chunk inside the optional data chunk. The low byte of its signature
/// selects the code type of its text.
#[derive(Clone, Debug, Serialize)]
pub struct DataChunk {
    pub header: ChunkHeader,
    pub stream: Vec<u8>,
    pub has_options: bool,
    pub options: Options,
    /// Every decoded record in stream order, including unknown tags.
    pub records: Vec<OptionRecord>,
}

impl DataChunk {
    pub fn code_type(&self) -> CodeType {
        CodeType::from(self.header.code_type())
    }
}

impl ParseChunk for DataChunk {
    fn parse<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<DataChunk> {
        let stream = read_payload(reader, &header)?;

        let mut chunk = DataChunk {
            header,
            stream,
            has_options: false,
            options: Default::default(),
            records: Vec::new(),
        };

        if header.code_type() == CODE_TYPE_SHIFT_JIS {
            chunk.records = decode_option_records(&chunk.stream)?;
            chunk.options = Options::from_records(&chunk.records);
            chunk.has_options = true;
        }

        Ok(chunk)
    }
}

impl fmt::Display for DataChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = vec![
            format!("Code type: {}", self.code_type()),
            format!("Stream: {}", format_escaped(&self.stream)),
        ];

        if self.has_options {
            lines.push(format!("Options: {}", self.options));
        }

        write_node(f, "DataChunk", &self.header, &lines)
    }
}
