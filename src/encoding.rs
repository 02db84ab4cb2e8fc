//! Codec identity and line-feed geometry.
//!
//! The indexer does not decode text. All it needs from a codec is where the
//! LF code unit starts relative to the `0x0A` byte the block parser finds,
//! and how wide that code unit is, so line boundaries can be reported at
//! code-unit granularity for any of the supported encodings.

/// Identity of the text encoding used by the indexed file.
///
/// `Utf8` and `Latin1` share single-byte LF geometry; they are kept distinct
/// because the viewer decodes lines with the codec stored here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextCodec {
    Utf8,
    Latin1,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl TextCodec {
    /// Codec assumed when nothing better is known (empty or unreadable file).
    pub fn locale_default() -> Self {
        TextCodec::Utf8
    }

    pub fn name(self) -> &'static str {
        match self {
            TextCodec::Utf8 => "UTF-8",
            TextCodec::Latin1 => "ISO-8859-1",
            TextCodec::Utf16Le => "UTF-16LE",
            TextCodec::Utf16Be => "UTF-16BE",
            TextCodec::Utf32Le => "UTF-32LE",
            TextCodec::Utf32Be => "UTF-32BE",
        }
    }
}

/// Byte-level LF geometry derived from a codec.
///
/// `before_lf_offset` is the number of bytes preceding the `0x0A` byte within
/// the LF code unit, so a match on the raw byte can be adjusted back to the
/// start of the unit. `line_feed_width` is the unit size used to advance past
/// it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodingParameters {
    pub line_feed_width: u32,
    pub before_lf_offset: u32,
}

impl Default for EncodingParameters {
    fn default() -> Self {
        Self {
            line_feed_width: 1,
            before_lf_offset: 0,
        }
    }
}

impl EncodingParameters {
    /// Geometry for `codec`.
    ///
    /// Little-endian encodings put the `0x0A` byte first in the unit
    /// (offset 0); big-endian encodings put it last.
    pub fn for_codec(codec: TextCodec) -> Self {
        match codec {
            TextCodec::Utf8 | TextCodec::Latin1 => Self {
                line_feed_width: 1,
                before_lf_offset: 0,
            },
            TextCodec::Utf16Le => Self {
                line_feed_width: 2,
                before_lf_offset: 0,
            },
            TextCodec::Utf16Be => Self {
                line_feed_width: 2,
                before_lf_offset: 1,
            },
            TextCodec::Utf32Le => Self {
                line_feed_width: 4,
                before_lf_offset: 0,
            },
            TextCodec::Utf32Be => Self {
                line_feed_width: 4,
                before_lf_offset: 3,
            },
        }
    }
}

/// Bytes inspected by the BOM-less UTF-16/32 fallback heuristic.
const DETECT_WINDOW: usize = 4096;

/// Guesses the codec of `block`, normally the first block of the file.
///
/// BOMs win outright. Without one, a window of the block is scanned for NUL
/// bytes: mostly-ASCII UTF-16/32 text has NULs in predictable lanes, which is
/// enough to pick an endianness. Anything else is reported as UTF-8, which
/// also covers plain 8-bit content as far as LF geometry is concerned.
pub fn detect_encoding(block: &[u8]) -> TextCodec {
    // UTF-32 BOMs are supersets of the UTF-16LE BOM; test them first.
    if block.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        return TextCodec::Utf32Le;
    }
    if block.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        return TextCodec::Utf32Be;
    }
    if block.starts_with(&[0xFF, 0xFE]) {
        return TextCodec::Utf16Le;
    }
    if block.starts_with(&[0xFE, 0xFF]) {
        return TextCodec::Utf16Be;
    }
    if block.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return TextCodec::Utf8;
    }

    let window = &block[..block.len().min(DETECT_WINDOW)];
    let mut nul_even = 0usize;
    let mut nul_odd = 0usize;
    for (i, &byte) in window.iter().enumerate() {
        if byte == 0 {
            if i % 2 == 0 {
                nul_even += 1;
            } else {
                nul_odd += 1;
            }
        }
    }

    let nuls = nul_even + nul_odd;
    if nuls * 3 >= window.len() && !window.is_empty() {
        // Wide encoding without a BOM; lane of the NULs picks the byte order.
        if nul_even > nul_odd {
            TextCodec::Utf16Be
        } else {
            TextCodec::Utf16Le
        }
    } else {
        TextCodec::Utf8
    }
}
