#![no_main]

use animwebp::sniff::{is_animated_webp_header, is_webp_header};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if is_animated_webp_header(data) {
        assert!(is_webp_header(data));
    }
});
