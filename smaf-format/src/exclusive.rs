// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exclusive messages embedded in chunk payloads.
//!
//! Every read in this module is charged against a byte budget passed down by mutable reference.
//! A read that would exceed the budget fails instead of touching the stream, so the caller can
//! check that the budget reached exactly zero once decoding returns.

use std::fmt;

use smaf_core::errors::{exclusive_error, Result};
use smaf_core::io::{BufReader, ReadBytes};
use smaf_core::util::{format_hex, indent};

use serde::Serialize;

/// The two bytes introducing an exclusive message.
pub const EXCLUSIVE_MARKER: [u8; 2] = [0xff, 0xf0];

/// The byte terminating an exclusive message body.
pub const END_OF_EXCLUSIVE: u8 = 0xf7;

/// Maker ID assigned to Yamaha.
pub const MAKER_ID_YAMAHA: u8 = 0x43;

/// Device header and message type introducing a voice message from a Yamaha maker.
const YAMAHA_VOICE_HEADER: [u8; 4] = [0x79, 0x06, 0x7f, 0x01];

/// The longest variable-length quantity accepted for a message length.
const MAX_VLQ_LEN: usize = 4;

/// Reads one byte, charging it to the budget.
pub(crate) fn take_u8<B: ReadBytes>(reader: &mut B, rest: &mut usize) -> Result<u8> {
    if *rest < 1 {
        return exclusive_error("field exceeds remaining length");
    }

    let byte = reader.read_u8()?;
    *rest -= 1;
    Ok(byte)
}

/// Reads `len` bytes, charging them to the budget.
pub(crate) fn take_bytes<B: ReadBytes>(
    reader: &mut B,
    rest: &mut usize,
    len: usize,
) -> Result<Vec<u8>> {
    if *rest < len {
        return exclusive_error("field exceeds remaining length");
    }

    let mut buf = vec![0u8; len];
    reader.read_buf_exact(&mut buf)?;
    *rest -= len;
    Ok(buf)
}

/// Reads a MIDI variable-length quantity: 7 bits per byte, high bit set on all but the last byte.
fn read_vlq<B: ReadBytes>(reader: &mut B, rest: &mut usize) -> Result<usize> {
    let mut value = 0usize;

    for _ in 0..MAX_VLQ_LEN {
        let byte = take_u8(reader, rest)?;
        value = (value << 7) | usize::from(byte & 0x7f);

        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }

    exclusive_error("message length is longer than four bytes")
}

/// `Exclusive` is one exclusive message: a length, a maker ID, a maker-specific body and the
/// terminating `0xF7`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Exclusive {
    /// Short-form messages carry a one byte length instead of a variable-length quantity.
    pub short_form: bool,
    /// The body length, including the maker ID and the terminator.
    pub length: usize,
    pub maker_id: u8,
    pub message: ExclusiveMessage,
}

impl Exclusive {
    pub fn new(short_form: bool) -> Self {
        Exclusive { short_form, length: 0, maker_id: 0, message: ExclusiveMessage::Raw(Vec::new()) }
    }

    /// Reads a message positioned just after its `0xFF 0xF0` marker, decrementing `rest` by
    /// every byte consumed.
    pub fn read<B: ReadBytes>(&mut self, reader: &mut B, rest: &mut usize) -> Result<()> {
        let length = if self.short_form {
            usize::from(take_u8(reader, rest)?)
        }
        else {
            read_vlq(reader, rest)?
        };

        if length == 0 {
            return exclusive_error("message body is empty");
        }
        if length > *rest {
            return exclusive_error("message length exceeds remaining data");
        }

        let body = take_bytes(reader, rest, length)?;

        let content = match body.split_last() {
            Some((&END_OF_EXCLUSIVE, content)) => content,
            _ => return exclusive_error("message does not end with 0xf7"),
        };

        let (&maker_id, payload) = match content.split_first() {
            Some(split) => split,
            None => return exclusive_error("message has no maker id"),
        };

        self.length = length;
        self.maker_id = maker_id;
        self.message = ExclusiveMessage::decode(maker_id, payload)?;

        Ok(())
    }
}

impl fmt::Display for Exclusive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "maker=0x{:02X}, length={}", self.maker_id, self.length)?;
        if self.short_form {
            write!(f, " (short form)")?;
        }

        match &self.message {
            ExclusiveMessage::Voice(voice) => write!(f, "\n{}", indent(&voice.to_string(), "\t")),
            ExclusiveMessage::Raw(data) => write!(f, "\n\tData: {}", format_hex(data)),
        }
    }
}

/// The maker-specific body of an exclusive message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ExclusiveMessage {
    Voice(VoiceMessage),
    /// A body that is not interpreted, without the maker ID and terminator.
    Raw(Vec<u8>),
}

impl ExclusiveMessage {
    fn decode(maker_id: u8, payload: &[u8]) -> Result<ExclusiveMessage> {
        if maker_id != MAKER_ID_YAMAHA || !payload.starts_with(&YAMAHA_VOICE_HEADER) {
            return Ok(ExclusiveMessage::Raw(payload.to_vec()));
        }

        let voice_data = &payload[YAMAHA_VOICE_HEADER.len()..];

        let mut reader = BufReader::new(voice_data);
        let mut rest = voice_data.len();

        let voice = VoiceMessage::read(&mut reader, &mut rest)?;

        if rest != 0 {
            return exclusive_error("voice message has trailing bytes");
        }

        Ok(ExclusiveMessage::Voice(voice))
    }
}

/// A voice definition bound to a bank and program.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VoiceMessage {
    pub bank_msb: u8,
    pub bank_lsb: u8,
    pub program: u8,
    pub drum_note: u8,
    pub voice: Voice,
}

impl VoiceMessage {
    pub fn read<B: ReadBytes>(reader: &mut B, rest: &mut usize) -> Result<VoiceMessage> {
        let bank_msb = take_u8(reader, rest)?;
        let bank_lsb = take_u8(reader, rest)?;
        let program = take_u8(reader, rest)?;
        let drum_note = take_u8(reader, rest)?;

        let voice = match take_u8(reader, rest)? {
            0x00 => Voice::Fm(FmVoice::read(reader, rest)?),
            0x01 => {
                let len = *rest;
                Voice::Pcm(take_bytes(reader, rest, len)?)
            }
            _ => return exclusive_error("unknown voice type"),
        };

        Ok(VoiceMessage { bank_msb, bank_lsb, program, drum_note, voice })
    }
}

impl fmt::Display for VoiceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Voice: bank_msb=0x{:02X}, bank_lsb=0x{:02X}, program={}, drum_note={}",
            self.bank_msb, self.bank_lsb, self.program, self.drum_note
        )?;

        match &self.voice {
            Voice::Fm(fm) => write!(f, "\n{}", indent(&fm.to_string(), "\t")),
            Voice::Pcm(data) => write!(f, "\n\tPCM: {}", format_hex(data)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Voice {
    Fm(FmVoice),
    /// PCM voice parameters, kept verbatim.
    Pcm(Vec<u8>),
}

/// An FM voice: two common bytes followed by 2 or 4 operators depending on the algorithm.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FmVoice {
    pub panpot: u8,
    pub basic_octave: u8,
    pub lfo: u8,
    pub pitch_envelope: bool,
    pub algorithm: u8,
    pub operators: Vec<FmOperator>,
}

impl FmVoice {
    /// The number of operators used by an algorithm.
    pub fn operator_count(algorithm: u8) -> usize {
        match algorithm {
            0 | 1 => 2,
            _ => 4,
        }
    }

    pub fn read<B: ReadBytes>(reader: &mut B, rest: &mut usize) -> Result<FmVoice> {
        let b0 = take_u8(reader, rest)?;
        let b1 = take_u8(reader, rest)?;

        let algorithm = b1 & 0x07;

        let mut operators = Vec::with_capacity(4);
        for _ in 0..FmVoice::operator_count(algorithm) {
            operators.push(FmOperator::read(reader, rest)?);
        }

        Ok(FmVoice {
            panpot: b0 >> 3,
            basic_octave: b0 & 0x03,
            lfo: b1 >> 6,
            pitch_envelope: (b1 >> 5) & 0x01 == 1,
            algorithm,
            operators,
        })
    }
}

impl fmt::Display for FmVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FM: panpot={}, basic_octave={}, lfo={}, pitch_envelope={}, algorithm={}",
            self.panpot, self.basic_octave, self.lfo, self.pitch_envelope, self.algorithm
        )?;
        for (i, op) in self.operators.iter().enumerate() {
            write!(f, "\n\tOperator {}: {}", i + 1, op)?;
        }
        Ok(())
    }
}

/// One FM operator, unpacked from 7 bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FmOperator {
    pub sustain_rate: u8,
    pub ignore_key_off: bool,
    pub key_scale_rate: bool,
    pub release_rate: u8,
    pub decay_rate: u8,
    pub attack_rate: u8,
    pub sustain_level: u8,
    pub total_level: u8,
    pub key_scale_level: u8,
    pub am_depth: u8,
    pub am_enable: bool,
    pub vibrato_depth: u8,
    pub vibrato_enable: bool,
    pub multiplier: u8,
    pub detune: u8,
    pub waveform: u8,
    pub feedback: u8,
}

impl FmOperator {
    pub const LEN: usize = 7;

    pub fn read<B: ReadBytes>(reader: &mut B, rest: &mut usize) -> Result<FmOperator> {
        let b = take_bytes(reader, rest, FmOperator::LEN)?;

        Ok(FmOperator {
            sustain_rate: b[0] >> 4,
            ignore_key_off: (b[0] >> 3) & 0x01 == 1,
            key_scale_rate: b[0] & 0x01 == 1,
            release_rate: b[1] >> 4,
            decay_rate: b[1] & 0x0f,
            attack_rate: b[2] >> 4,
            sustain_level: b[2] & 0x0f,
            total_level: b[3] >> 2,
            key_scale_level: b[3] & 0x03,
            am_depth: (b[4] >> 5) & 0x03,
            am_enable: (b[4] >> 4) & 0x01 == 1,
            vibrato_depth: (b[4] >> 1) & 0x03,
            vibrato_enable: b[4] & 0x01 == 1,
            multiplier: b[5] >> 4,
            detune: b[5] & 0x07,
            waveform: b[6] >> 3,
            feedback: b[6] & 0x07,
        })
    }
}

impl fmt::Display for FmOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AR={} DR={} SR={} RR={} SL={} TL={} KSL={} MUL={} DT={} WS={} FB={}",
            self.attack_rate,
            self.decay_rate,
            self.sustain_rate,
            self.release_rate,
            self.sustain_level,
            self.total_level,
            self.key_scale_level,
            self.multiplier,
            self.detune,
            self.waveform,
            self.feedback
        )
    }
}
