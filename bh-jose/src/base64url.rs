// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! The `base64url` encoding **without padding**, as used by every segment of
//! a compact JWS ([RFC 7515, section 2][1]).
//!
//! Decoding rejects the characters `+`, `/` and `=` up front, since they only
//! show up when somebody hands over standard base64. Within the `base64url`
//! alphabet it is lenient: unused trailing bits of the last character are
//! ignored, so altering that character alters the bytes instead of failing.
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7515.html#section-2

use base64::{
    alphabet,
    engine::{
        general_purpose::URL_SAFE_NO_PAD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig,
    },
    Engine as _,
};
use bherror::{traits::ForeignError as _, Error, Result};

use crate::error::DecodingError;

const STANDARD_BASE64_CHARACTERS: [char; 3] = ['+', '/', '='];

const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Returns the `base64url`-encoded string of the given `input`, without
/// padding.
///
/// Text and bytes with equal content encode identically.
pub fn encode<T: AsRef<[u8]>>(input: T) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Decodes the `base64url`-encoded string **without padding** into bytes.
pub fn decode(input: &str) -> Result<Vec<u8>, DecodingError> {
    if let Some(character) = input
        .chars()
        .find(|character| STANDARD_BASE64_CHARACTERS.contains(character))
    {
        return Err(Error::root(DecodingError::StandardBase64Character(
            character,
        )));
    }

    LENIENT_URL_SAFE
        .decode(input)
        .foreign_err(|| DecodingError::InvalidBase64Url)
}

/// Decodes the `base64url`-encoded string **without padding** into UTF-8
/// text.
pub fn decode_to_string(input: &str) -> Result<String, DecodingError> {
    let bytes = decode(input)?;
    String::from_utf8(bytes).foreign_err(|| DecodingError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_text_and_bytes_identically() {
        let text = "{\"alg\":\"HS256\"}";

        assert_eq!(encode(text), encode(text.as_bytes()));
        assert_eq!(encode(text), "eyJhbGciOiJIUzI1NiJ9");
    }

    #[test]
    fn encoding_remaps_the_alphabet_and_strips_padding() {
        // 0xfb 0xff encodes to "+/8=" in standard base64
        assert_eq!(encode([0xfb_u8, 0xff]), "-_8");
        assert_eq!(encode([0xfb_u8]), "-w");
        assert_eq!(encode(b""), "");
    }

    #[test]
    fn decodes_unpadded_input() {
        assert_eq!(decode("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode("-w").unwrap(), vec![0xfb]);
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn ignores_unused_trailing_bits() {
        // "-w" is the canonical encoding of 0xfb; the last character carries
        // four unused bits
        for input in ["-w", "-x", "-_"] {
            assert_eq!(decode(input).unwrap(), vec![0xfb], "{input}");
        }
        assert_eq!(decode("-_9").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn multi_byte_utf8_survives_a_round_trip() {
        let inputs = [
            "",
            "plain ascii",
            "čćžšđ",
            "日本語のテキスト",
            "emoji 🦀 and more 🎉",
            "{\"name\":\"Ünïcödé\"}",
        ];

        for input in inputs {
            assert_eq!(decode_to_string(&encode(input)).unwrap(), input);
        }
    }

    #[test]
    fn arbitrary_bytes_survive_a_round_trip() {
        let bytes: Vec<u8> = (0..=255).collect();

        for len in 0..bytes.len() {
            assert_eq!(decode(&encode(&bytes[..len])).unwrap(), &bytes[..len]);
        }
    }

    #[test]
    fn rejects_standard_base64_artifacts() {
        for (input, character) in [("+_8", '+'), ("-/8", '/'), ("-w==", '='), ("YQ=", '=')] {
            let error = decode(input).unwrap_err();
            assert_eq!(
                error.error,
                DecodingError::StandardBase64Character(character)
            );
        }
    }

    #[test]
    fn rejects_invalid_input() {
        for input in ["a", "ab$d", "abcde", "eyJ hbGc"] {
            let error = decode(input).unwrap_err();
            assert_eq!(error.error, DecodingError::InvalidBase64Url);
        }
    }

    #[test]
    fn rejects_invalid_utf8() {
        let error = decode_to_string(&encode([0xc3_u8, 0x28])).unwrap_err();

        assert_eq!(error.error, DecodingError::InvalidUtf8);
    }
}
