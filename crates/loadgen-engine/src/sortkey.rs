//! Base-62 thread sort keys.
//!
//! A sort key is [`MAX_LEVEL`] two-character segments. Segment `i` holds the
//! sibling position of the comment's ancestor at depth `i + 1`, so sorting
//! keys lexicographically yields thread order. Root comments carry the
//! all-zero key.

use std::fmt;

/// Deepest reply level.
pub const MAX_LEVEL: u8 = 10;

/// Largest sibling position a two-digit base-62 segment can hold (62² − 1).
pub const MAX_POSITION: u16 = 62 * 62 - 1;

/// Characters per segment.
pub const SEGMENT_LEN: usize = 2;

/// Total key length.
pub const KEY_LEN: usize = MAX_LEVEL as usize * SEGMENT_LEN;

const DIGITS: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Errors raised while growing a reply tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThreadError {
    #[error("Reply level {0} exceeds the maximum of {max}", max = MAX_LEVEL)]
    LevelOverflow(u8),

    #[error("Sibling position {0} exceeds the maximum of {max}", max = MAX_POSITION)]
    PositionOverflow(u32),

    #[error("Invalid sort key segment '{0}'")]
    InvalidSegment(String),

    #[error("Unknown comment index {0}")]
    UnknownComment(usize),
}

/// Base-62 digit for `value` (0-61).
pub fn digit(value: u8) -> Option<char> {
    DIGITS.get(usize::from(value)).map(|&b| char::from(b))
}

/// Inverse of [`digit`].
pub fn digit_value(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'A'..='Z' => Some(c as u8 - b'A' + 10),
        'a'..='z' => Some(c as u8 - b'a' + 36),
        _ => None,
    }
}

/// Encode a sibling position as a two-character segment.
pub fn encode_segment(position: u32) -> Result<[char; SEGMENT_LEN], ThreadError> {
    if position > u32::from(MAX_POSITION) {
        return Err(ThreadError::PositionOverflow(position));
    }
    let high = digit((position / 62) as u8);
    let low = digit((position % 62) as u8);
    match (high, low) {
        (Some(high), Some(low)) => Ok([high, low]),
        _ => Err(ThreadError::PositionOverflow(position)),
    }
}

/// Decode a two-character segment back to a sibling position.
pub fn decode_segment(segment: &str) -> Result<u16, ThreadError> {
    let invalid = || ThreadError::InvalidSegment(segment.to_string());
    let mut chars = segment.chars();
    let (Some(high), Some(low), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(invalid());
    };
    let high = digit_value(high).ok_or_else(invalid)?;
    let low = digit_value(low).ok_or_else(invalid)?;
    Ok(u16::from(high) * 62 + u16::from(low))
}

/// Fixed-length, level-segmented thread key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey([u8; KEY_LEN]);

impl SortKey {
    /// Key of a root comment.
    pub fn root() -> Self {
        Self([b'0'; KEY_LEN])
    }

    /// Key of a reply at `level` (1-based depth) holding sibling `position`
    /// under the comment keyed by `self`.
    pub fn child(&self, level: u8, position: u32) -> Result<Self, ThreadError> {
        if level == 0 || level > MAX_LEVEL {
            return Err(ThreadError::LevelOverflow(level));
        }
        let [high, low] = encode_segment(position)?;
        let offset = usize::from(level - 1) * SEGMENT_LEN;
        let mut key = self.0;
        key[offset] = high as u8;
        key[offset + 1] = low as u8;
        Ok(Self(key))
    }

    /// Segment at `index` (0-based), decoded.
    pub fn segment(&self, index: usize) -> Option<u16> {
        let start = index.checked_mul(SEGMENT_LEN)?;
        let bytes = self.0.get(start..start + SEGMENT_LEN)?;
        decode_segment(std::str::from_utf8(bytes).ok()?).ok()
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII digits and letters are ever written.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
