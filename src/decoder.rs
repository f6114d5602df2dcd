//! Animated WebP decoder wrapping libwebp's `WebPAnimDecoder`

use crate::config::{AlphaMode, DecoderConfig};
use crate::error::{Error, Result};
use crate::image::{AnimationMetadata, Frame, FrameDuration};
use imgref::ImgRef;
use libwebp_sys::{
    WEBP_CSP_MODE, WebPAnimDecoder, WebPAnimDecoderDelete, WebPAnimDecoderGetDemuxer,
    WebPAnimDecoderGetInfo, WebPAnimDecoderGetNext, WebPAnimDecoderHasMoreFrames,
    WebPAnimDecoderNew, WebPAnimDecoderOptions, WebPAnimDecoderOptionsInit, WebPAnimDecoderReset,
    WebPAnimInfo, WebPData, WebPDemuxGetI, WebPFormatFeature,
};
use rgb::RGBA8;
use std::ffi::c_int;
use std::ptr::NonNull;
use whereat::at;

/// `ALPHA_FLAG` from libwebp's `WebPFeatureFlags`
const ALPHA_FLAG: u32 = 0x10;

/// Frame source the bridge drives
///
/// Container parsing, disposal/blending and color conversion all happen
/// behind this trait; the bridge only moves the composited canvas.
pub trait AnimDecoder: Sized {
    /// Build a decoder over encoded animation bytes
    fn open(data: &[u8], config: &DecoderConfig) -> Result<Self>;

    /// Canvas-level information
    fn metadata(&self) -> AnimationMetadata;

    /// Composite the next frame
    ///
    /// Returns `None` if the decoder could not produce a frame.
    fn next_frame(&mut self) -> Result<Option<Frame<'_>>>;

    /// Whether another frame remains in this pass
    fn has_more_frames(&self) -> bool;

    /// Rewind to the first frame without re-parsing
    fn reset(&mut self);
}

/// libwebp animation decoder with automatic cleanup
pub struct LibWebPAnimDecoder {
    dec: NonNull<WebPAnimDecoder>,
    info: AnimationMetadata,
    /// End timestamp of the previously returned frame
    last_timestamp: c_int,
    /// The demuxer points into this buffer, so it must outlive `dec`
    _data: Box<[u8]>,
}

// SAFETY: a WebPAnimDecoder has no thread affinity, and every call that
// touches it goes through `&self`/`&mut self`, so moving it between
// threads is sound.
unsafe impl Send for LibWebPAnimDecoder {}

impl LibWebPAnimDecoder {
    /// Create a new decoder over a copy of `data`
    pub fn new(data: &[u8], config: &DecoderConfig) -> Result<Self> {
        let data: Box<[u8]> = data.into();

        let mut options = std::mem::MaybeUninit::<WebPAnimDecoderOptions>::uninit();
        // SAFETY: WebPAnimDecoderOptionsInit fills in every field
        let ok = unsafe { WebPAnimDecoderOptionsInit(options.as_mut_ptr()) };
        if ok == 0 {
            return Err(at(Error::InvalidSource("libwebp demux ABI mismatch")));
        }
        let mut options = unsafe { options.assume_init() };
        options.color_mode = match config.alpha_mode {
            AlphaMode::Straight => WEBP_CSP_MODE::MODE_RGBA,
            AlphaMode::Premultiplied => WEBP_CSP_MODE::MODE_rgbA,
        };
        options.use_threads = config.use_threads as c_int;

        let webp_data = WebPData {
            bytes: data.as_ptr(),
            size: data.len(),
        };

        // SAFETY: webp_data points at `data`, which is stored alongside the
        // decoder and freed only after WebPAnimDecoderDelete.
        let dec = unsafe { WebPAnimDecoderNew(&webp_data, &options) };
        let dec = NonNull::new(dec)
            .ok_or_else(|| at(Error::InvalidSource("not a decodable WebP")))?;

        let mut anim_info = std::mem::MaybeUninit::<WebPAnimInfo>::uninit();
        // SAFETY: dec is a live decoder
        let ok = unsafe { WebPAnimDecoderGetInfo(dec.as_ptr(), anim_info.as_mut_ptr()) };
        if ok == 0 {
            // SAFETY: dec came from WebPAnimDecoderNew and is not used again
            unsafe { WebPAnimDecoderDelete(dec.as_ptr()) };
            return Err(at(Error::InvalidSource("failed to read animation info")));
        }
        let anim_info = unsafe { anim_info.assume_init() };

        // SAFETY: the demuxer is owned by dec and valid while it lives
        let has_alpha = unsafe {
            let demux = WebPAnimDecoderGetDemuxer(dec.as_ptr());
            !demux.is_null()
                && WebPDemuxGetI(demux, WebPFormatFeature::WEBP_FF_FORMAT_FLAGS) & ALPHA_FLAG != 0
        };

        let info = AnimationMetadata {
            canvas_width: anim_info.canvas_width,
            canvas_height: anim_info.canvas_height,
            loop_count: anim_info.loop_count,
            background_color: anim_info.bgcolor,
            frame_count: anim_info.frame_count,
            has_alpha,
        };
        log::debug!(
            "opened animated WebP {}x{}, {} frames, loop={}",
            info.canvas_width,
            info.canvas_height,
            info.frame_count,
            info.loop_count
        );

        Ok(Self {
            dec,
            info,
            last_timestamp: 0,
            _data: data,
        })
    }
}

impl AnimDecoder for LibWebPAnimDecoder {
    fn open(data: &[u8], config: &DecoderConfig) -> Result<Self> {
        Self::new(data, config)
    }

    fn metadata(&self) -> AnimationMetadata {
        self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame<'_>>> {
        let mut buf: *mut u8 = std::ptr::null_mut();
        let mut timestamp: c_int = 0;

        // SAFETY: dec is live; buf and timestamp are valid out-pointers
        let ok = unsafe { WebPAnimDecoderGetNext(self.dec.as_ptr(), &mut buf, &mut timestamp) };
        if ok == 0 || buf.is_null() {
            return Ok(None);
        }

        // libwebp reports when the frame ends, not how long it lasts
        let duration = FrameDuration::from_millis(timestamp - self.last_timestamp);
        self.last_timestamp = timestamp;

        let width = self.info.canvas_width as usize;
        let height = self.info.canvas_height as usize;
        // SAFETY: libwebp owns a width*height*4 canvas that stays valid until
        // the next GetNext/Reset/Delete, all of which need `&mut self`.
        // RGBA8 has alignment 1.
        let pixels = unsafe { std::slice::from_raw_parts(buf.cast::<RGBA8>(), width * height) };

        Ok(Some(Frame {
            pixels: ImgRef::new(pixels, width, height),
            duration,
        }))
    }

    fn has_more_frames(&self) -> bool {
        // SAFETY: dec is live
        unsafe { WebPAnimDecoderHasMoreFrames(self.dec.as_ptr()) != 0 }
    }

    fn reset(&mut self) {
        // SAFETY: dec is live
        unsafe { WebPAnimDecoderReset(self.dec.as_ptr()) };
        self.last_timestamp = 0;
    }
}

impl Drop for LibWebPAnimDecoder {
    fn drop(&mut self) {
        // SAFETY: dec came from WebPAnimDecoderNew and is deleted exactly once
        unsafe { WebPAnimDecoderDelete(self.dec.as_ptr()) };
    }
}
