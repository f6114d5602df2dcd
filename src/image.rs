//! Animation metadata and decoded frame types

use imgref::ImgRef;
use rgb::RGBA8;

/// Canvas-level information about an animation
///
/// Values are exactly what the decoder reports; nothing is rescaled or
/// reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationMetadata {
    /// Canvas width in pixels
    pub canvas_width: u32,
    /// Canvas height in pixels
    pub canvas_height: u32,
    /// Number of times to play the animation (0 = forever)
    pub loop_count: u32,
    /// Background color hint, packed as libwebp reports it
    pub background_color: u32,
    /// Total number of frames
    pub frame_count: u32,
    /// Whether any frame may carry transparency
    pub has_alpha: bool,
}

impl AnimationMetadata {
    /// Bytes in one tightly packed canvas row
    pub fn row_bytes(&self) -> usize {
        self.canvas_width as usize * 4
    }

    /// Bytes in one tightly packed canvas
    pub fn frame_bytes(&self) -> usize {
        self.row_bytes() * self.canvas_height as usize
    }
}

/// Display duration of a frame in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameDuration(i32);

impl FrameDuration {
    /// No duration was reported for the frame
    pub const UNKNOWN: FrameDuration = FrameDuration(-1);

    /// Wrap a duration in milliseconds
    ///
    /// Negative values collapse to [`FrameDuration::UNKNOWN`].
    pub fn from_millis(ms: i32) -> Self {
        if ms < 0 { Self::UNKNOWN } else { Self(ms) }
    }

    /// Duration in milliseconds, or `None` when unknown
    pub fn as_millis(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }

    /// Raw value as passed over JNI (-1 when unknown)
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Returns true if the decoder reported a duration
    pub fn is_known(self) -> bool {
        self.0 >= 0
    }
}

/// A composited frame borrowed from the decoder
///
/// Pixels are tightly packed, top-down RGBA covering the whole canvas. The
/// buffer is only valid until the decoder is advanced, reset or dropped.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Canvas pixels
    pub pixels: ImgRef<'a, RGBA8>,
    /// How long this frame is displayed
    pub duration: FrameDuration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_durations_are_unknown() {
        assert_eq!(FrameDuration::from_millis(-7), FrameDuration::UNKNOWN);
        assert_eq!(FrameDuration::UNKNOWN.raw(), -1);
        assert_eq!(FrameDuration::UNKNOWN.as_millis(), None);
        assert!(!FrameDuration::UNKNOWN.is_known());
    }

    #[test]
    fn zero_duration_is_known() {
        let d = FrameDuration::from_millis(0);
        assert!(d.is_known());
        assert_eq!(d.as_millis(), Some(0));
    }

    #[test]
    fn frame_size_from_canvas() {
        let meta = AnimationMetadata {
            canvas_width: 3,
            canvas_height: 5,
            ..Default::default()
        };
        assert_eq!(meta.row_bytes(), 12);
        assert_eq!(meta.frame_bytes(), 60);
    }
}
