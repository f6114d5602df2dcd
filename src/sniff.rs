//! WebP header detection
//!
//! Cheap checks on the first bytes of a file, used to decide whether the
//! animated decoder should handle it at all.

/// Bytes needed to tell an animated WebP apart from a still one
pub const HEADER_SIZE: usize = 21;

const SIMPLE_HEADER_LEN: usize = 20;

/// `ANIMATION_FLAG` in the VP8X feature byte
const ANIMATION_BIT: u8 = 0x02;

fn matches_at(bytes: &[u8], offset: usize, pattern: &[u8]) -> bool {
    bytes.get(offset..offset + pattern.len()) == Some(pattern)
}

/// `RIFF....WEBP` container signature
pub fn is_webp_header(bytes: &[u8]) -> bool {
    bytes.len() >= SIMPLE_HEADER_LEN && matches_at(bytes, 0, b"RIFF") && matches_at(bytes, 8, b"WEBP")
}

/// Extended (`VP8X`) WebP with the animation flag set
pub fn is_animated_webp_header(bytes: &[u8]) -> bool {
    is_webp_header(bytes)
        && matches_at(bytes, 12, b"VP8X")
        && bytes.get(20).is_some_and(|flags| flags & ANIMATION_BIT != 0)
}
