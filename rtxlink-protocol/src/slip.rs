//! SLIP byte-stuffing (RFC 1055 style)
//!
//! Frames are delimited by END on both sides. Inside a frame, END and ESC
//! are replaced by two-byte escape sequences:
//!
//! | Data byte | On the wire   |
//! |-----------|---------------|
//! | `0xC0`    | `0xDB 0xDC`   |
//! | `0xDB`    | `0xDB 0xDD`   |
//!
//! All functions work on caller-provided slices and never allocate, so a
//! large frame can be encoded or decoded in pieces.

/// Frame delimiter
pub const END: u8 = 0xC0;

/// Escape introducer
pub const ESC: u8 = 0xDB;

/// Escaped END
pub const ESC_END: u8 = 0xDC;

/// Escaped ESC
pub const ESC_ESC: u8 = 0xDD;

/// Worst-case encoded size of `len` data bytes with both delimiters
pub const fn max_encoded_len(len: usize) -> usize {
    2 * len + 2
}

/// Errors from SLIP encoding or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlipError {
    /// Destination slice cannot hold the output
    BufferTooSmall,
    /// ESC followed by something other than ESC_END / ESC_ESC,
    /// or ESC as the very last input byte
    InvalidEscape,
}

#[inline]
fn push(dst: &mut [u8], pos: &mut usize, byte: u8) -> Result<(), SlipError> {
    let slot = dst.get_mut(*pos).ok_or(SlipError::BufferTooSmall)?;
    *slot = byte;
    *pos += 1;
    Ok(())
}

/// Encode `src` into `dst`
///
/// `start` prepends an END marker and `end` appends one, so a frame can be
/// produced across several calls. Returns the number of bytes written.
/// `dst` must hold up to [`max_encoded_len`]`(src.len())` bytes.
pub fn encode(src: &[u8], dst: &mut [u8], start: bool, end: bool) -> Result<usize, SlipError> {
    let mut pos = 0;

    if start {
        push(dst, &mut pos, END)?;
    }

    for &byte in src {
        match byte {
            END => {
                push(dst, &mut pos, ESC)?;
                push(dst, &mut pos, ESC_END)?;
            }
            ESC => {
                push(dst, &mut pos, ESC)?;
                push(dst, &mut pos, ESC_ESC)?;
            }
            other => push(dst, &mut pos, other)?,
        }
    }

    if end {
        push(dst, &mut pos, END)?;
    }

    Ok(pos)
}

/// Find the first unescaped END marker in `buf`
///
/// Returns its offset, or `None` if the block holds no frame end.
pub fn search_frame_end(buf: &[u8]) -> Option<usize> {
    let mut escaped = false;
    for (i, &byte) in buf.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            END => return Some(i),
            ESC => escaped = true,
            _ => {}
        }
    }
    None
}

/// Map the byte following an ESC back to the data byte it stands for
pub fn unescape(byte: u8) -> Option<u8> {
    match byte {
        ESC_END => Some(END),
        ESC_ESC => Some(ESC),
        _ => None,
    }
}

/// Whether `buf` ends in the middle of an escape sequence
///
/// True when the last byte is an ESC that is not itself escaped. A block
/// cut there can only be decoded once the next byte arrives.
pub fn ends_with_escape(buf: &[u8]) -> bool {
    let mut escaped = false;
    for &byte in buf {
        escaped = !escaped && byte == ESC;
    }
    escaped
}

/// Decode a block of SLIP-encoded bytes into `dst`
///
/// Decoding stops at the first unescaped END, which is consumed but not
/// written. Returns the number of decoded bytes, which is never more than
/// `src.len()`.
pub fn decode_block(src: &[u8], dst: &mut [u8]) -> Result<usize, SlipError> {
    let mut pos = 0;
    let mut bytes = src.iter();

    while let Some(&byte) = bytes.next() {
        let decoded = match byte {
            END => break,
            ESC => {
                let &next = bytes.next().ok_or(SlipError::InvalidEscape)?;
                unescape(next).ok_or(SlipError::InvalidEscape)?
            }
            other => other,
        };
        push(dst, &mut pos, decoded)?;
    }

    Ok(pos)
}
