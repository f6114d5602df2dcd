//! Decoder configuration

/// How decoded RGBA pixels carry their alpha channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    /// Color channels are independent of alpha (libwebp `MODE_RGBA`)
    Straight,
    /// Color channels are pre-scaled by alpha (libwebp `MODE_rgbA`)
    ///
    /// This is what Android bitmaps expect by default.
    #[default]
    Premultiplied,
}

impl AlphaMode {
    /// Map the JNI `premultipliedAlpha` flag to a mode
    pub fn from_premultiplied(premultiplied: bool) -> Self {
        if premultiplied {
            AlphaMode::Premultiplied
        } else {
            AlphaMode::Straight
        }
    }

    /// Returns true for [`AlphaMode::Premultiplied`]
    pub fn is_premultiplied(self) -> bool {
        self == AlphaMode::Premultiplied
    }
}

/// Configuration for animated WebP decoding
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Output alpha representation
    pub(crate) alpha_mode: AlphaMode,
    /// Let libwebp reconstruct frames on worker threads
    pub(crate) use_threads: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            alpha_mode: AlphaMode::Premultiplied,
            use_threads: true,
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output alpha mode
    pub fn alpha_mode(mut self, mode: AlphaMode) -> Self {
        self.alpha_mode = mode;
        self
    }

    /// Enable or disable libwebp's internal threading
    ///
    /// Threading is invisible to callers: every decode still blocks until
    /// the frame is complete.
    pub fn use_threads(mut self, enabled: bool) -> Self {
        self.use_threads = enabled;
        self
    }
}
