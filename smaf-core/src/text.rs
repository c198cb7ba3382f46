// Smaf
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Legacy text decoding.

use encoding_rs::SHIFT_JIS;
use log::warn;

/// Decodes a Shift-JIS encoded byte run into a `String`.
///
/// Decoding never fails. Byte sequences that are not valid Shift-JIS are replaced with
/// U+FFFD REPLACEMENT CHARACTER and a warning is logged.
pub fn decode_legacy_text(bytes: &[u8]) -> String {
    let (text, had_errors) = SHIFT_JIS.decode_without_bom_handling(bytes);

    if had_errors {
        warn!("text contains invalid shift-jis sequences, replacing them");
    }

    text.into_owned()
}
