// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Small enumerated values carried by chunk headers.
//!
//! Decoding these values never fails. A byte without a defined meaning is kept as `Undefined` and
//! displays as `undefined(0xNN)`.

use std::fmt;

use serde::{Serialize, Serializer};

macro_rules! permissive_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $label:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value with no defined meaning.
            Undefined(u8),
        }

        impl $name {
            /// Returns the name of the value, or `"undefined"`.
            pub fn label(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                    $name::Undefined(_) => "undefined",
                }
            }
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                match value {
                    $( $value => $name::$variant, )+
                    _ => $name::Undefined(value),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                match value {
                    $( $name::$variant => $value, )+
                    $name::Undefined(value) => value,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{:02X})", self.label(), u8::from(*self))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }
    };
}

permissive_enum! {
    /// How the sequence data of a score track is organised.
    pub enum ScoreTrackSequenceType {
        /// The sequence data is one continuous sequence. Seek points and the phrase list
        /// reference meaningful positions within it from the outside.
        StreamSequence = 0x00 => "StreamSequence",
        /// The sequence data is a run of separate phrases. The phrase list identifies each
        /// phrase individually.
        Subsequence = 0x01 => "Subsequence",
    }
}

permissive_enum! {
    /// The event encoding used by a score track.
    pub enum ScoreTrackFormatType {
        HandyPhoneStandard = 0x00 => "HandyPhoneStandard",
        MobileStandardCompress = 0x01 => "MobileStandardCompress",
        MobileStandardNoCompress = 0x02 => "MobileStandardNoCompress",
    }
}

permissive_enum! {
    /// The text encoding of contents info and data chunks.
    pub enum CodeType {
        ShiftJis = 0x00 => "ShiftJIS",
        Latin1 = 0x01 => "Latin1",
        EucKr = 0x02 => "EUCKR",
        HzGb2312 = 0x03 => "HZGB2312",
        Big5 = 0x04 => "Big5",
        Koi8R = 0x05 => "KOI8R",
        Tcvn5773 = 0x06 => "TCVN5773",
        Ucs2 = 0x20 => "UCS2",
        Ucs4 = 0x21 => "UCS4",
        Utf7 = 0x22 => "UTF7",
        Utf8 = 0x23 => "UTF8",
        Utf16 = 0x24 => "UTF16",
        Utf32 = 0x25 => "UTF32",
    }
}

permissive_enum! {
    /// The duration of one tick of a track's duration or gate time.
    pub enum TimeBase {
        Millis1 = 0x00 => "1ms",
        Millis2 = 0x01 => "2ms",
        Millis4 = 0x02 => "4ms",
        Millis5 = 0x03 => "5ms",
        Millis10 = 0x10 => "10ms",
        Millis20 = 0x11 => "20ms",
        Millis40 = 0x12 => "40ms",
        Millis50 = 0x13 => "50ms",
    }
}

impl TimeBase {
    /// Returns the tick length in milliseconds, if defined.
    pub fn millis(&self) -> Option<u32> {
        match self {
            TimeBase::Millis1 => Some(1),
            TimeBase::Millis2 => Some(2),
            TimeBase::Millis4 => Some(4),
            TimeBase::Millis5 => Some(5),
            TimeBase::Millis10 => Some(10),
            TimeBase::Millis20 => Some(20),
            TimeBase::Millis40 => Some(40),
            TimeBase::Millis50 => Some(50),
            TimeBase::Undefined(_) => None,
        }
    }
}
