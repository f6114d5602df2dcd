#![no_main]

use animwebp::{DecoderConfig, FrameBridge, LibWebPAnimDecoder, MemorySurface};
use libfuzzer_sys::fuzz_target;

// Bound work per input; libwebp enforces its own dimension limits.
const MAX_PIXELS: u64 = 1 << 22;
const MAX_FRAMES: u32 = 64;

fuzz_target!(|data: &[u8]| {
    let bridge = FrameBridge::<LibWebPAnimDecoder>::new();
    let Ok(handle) = bridge.create(data, &DecoderConfig::new().use_threads(false)) else {
        return;
    };
    let meta = bridge.metadata(handle).unwrap();
    if u64::from(meta.canvas_width) * u64::from(meta.canvas_height) <= MAX_PIXELS {
        // odd padding exercises the row-by-row path
        let stride = meta.canvas_width * 4 + 4;
        let mut surface =
            MemorySurface::with_stride(meta.canvas_width, meta.canvas_height, stride).unwrap();
        let mut decoded = 0;
        while decoded < MAX_FRAMES && bridge.has_next_frame(handle).unwrap() {
            let _ = bridge.decode_next_frame(handle, &mut surface);
            decoded += 1;
        }
        assert!(!surface.is_locked());
    }
    bridge.delete(handle).unwrap();
});
