//! # animwebp
//!
//! JNI bridge exposing libwebp's animated WebP decoder to Android.
//!
//! The crate performs no decoding of its own. libwebp parses the container
//! and composites every frame; this crate hands out handles to libwebp
//! decoders, steps them frame by frame, and copies each composited canvas
//! into a caller-owned surface whose rows may be padded.
//!
//! ## Quick Start
//!
//! ```no_run
//! use animwebp::{DecoderConfig, FrameBridge, LibWebPAnimDecoder, MemorySurface};
//!
//! let webp_data = std::fs::read("animation.webp").unwrap();
//! let bridge = FrameBridge::<LibWebPAnimDecoder>::new();
//! let handle = bridge.create(&webp_data, &DecoderConfig::new()).unwrap();
//!
//! let meta = bridge.metadata(handle).unwrap();
//! let mut surface = MemorySurface::new(meta.canvas_width, meta.canvas_height);
//! while bridge.has_next_frame(handle).unwrap() {
//!     let duration = bridge.decode_next_frame(handle, &mut surface).unwrap();
//!     println!("frame shown for {:?}ms", duration.as_millis());
//! }
//! bridge.delete(handle).unwrap();
//! ```
//!
//! ## Features
//!
//! - **`jni`** (default): `Java_com_github_skgmn_webpdecoder_libwebp_*`
//!   entry points for the `LibWebPAnimatedDecoder` and `AnimatedWebPDecoder`
//!   Kotlin classes. Bitmap surfaces are only available on Android.

#[cfg(all(feature = "jni", target_os = "android"))]
mod bitmap;
mod bridge;
mod config;
mod decoder;
mod error;
mod handle;
mod image;
#[cfg(feature = "jni")]
mod jni_exports;
mod playback;
pub mod sniff;
mod surface;

#[cfg(all(feature = "jni", target_os = "android"))]
pub use bitmap::AndroidBitmapSurface;
pub use bridge::FrameBridge;
pub use config::{AlphaMode, DecoderConfig};
pub use decoder::{AnimDecoder, LibWebPAnimDecoder};
pub use error::{Error, Result};
pub use handle::{Handle, HandleTable};
pub use imgref::ImgRef;
pub use image::{AnimationMetadata, Frame, FrameDuration};
pub use playback::Playback;
pub use rgb::RGBA8;
pub use surface::{LockedPixels, MemorySurface, Surface, SurfaceFormat, SurfaceInfo, copy_frame};
