//! Handle-based frame bridge
//!
//! [`FrameBridge`] owns every decoder it creates and gives callers only a
//! [`Handle`]. Each decoder sits behind its own mutex, so calls on one
//! handle are serialized while different handles decode in parallel. The
//! table lock is held only long enough to look an entry up.

use crate::config::DecoderConfig;
use crate::decoder::AnimDecoder;
use crate::error::{Error, Result};
use crate::handle::{Handle, HandleTable};
use crate::image::{AnimationMetadata, FrameDuration};
use crate::surface::{LockedPixels, Surface, SurfaceFormat, copy_frame};
use parking_lot::Mutex;
use std::sync::Arc;
use whereat::at;

struct Entry<D> {
    decoder: D,
    /// Read once at registration
    metadata: AnimationMetadata,
}

type SharedEntry<D> = Arc<Mutex<Entry<D>>>;

/// Registry of live decoders addressed by [`Handle`]
pub struct FrameBridge<D> {
    decoders: Mutex<HandleTable<SharedEntry<D>>>,
}

impl<D: AnimDecoder> Default for FrameBridge<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: AnimDecoder> FrameBridge<D> {
    /// Create an empty bridge
    pub fn new() -> Self {
        Self {
            decoders: Mutex::new(HandleTable::new()),
        }
    }

    /// Open a decoder over `source` and register it
    ///
    /// `source` is only borrowed for this call.
    pub fn create(&self, source: &[u8], config: &DecoderConfig) -> Result<Handle> {
        let decoder = D::open(source, config)?;
        Ok(self.register(decoder))
    }

    /// Register an already opened decoder
    pub fn register(&self, decoder: D) -> Handle {
        let metadata = decoder.metadata();
        let entry = Arc::new(Mutex::new(Entry { decoder, metadata }));
        let handle = self.decoders.lock().insert(entry);
        log::debug!("registered decoder {:#x}", handle.to_raw());
        handle
    }

    /// Release the decoder behind `handle`
    ///
    /// A decode already running on another thread finishes first; the
    /// decoder is dropped once it is done.
    pub fn delete(&self, handle: Handle) -> Result<()> {
        let entry = self
            .decoders
            .lock()
            .remove(handle)
            .ok_or_else(|| at(Error::InvalidHandle(handle.to_raw())))?;
        drop(entry);
        log::debug!("deleted decoder {:#x}", handle.to_raw());
        Ok(())
    }

    /// Canvas-level information captured when the decoder was created
    pub fn metadata(&self, handle: Handle) -> Result<AnimationMetadata> {
        let entry = self.entry(handle)?;
        let metadata = entry.lock().metadata;
        Ok(metadata)
    }

    /// Decode the next frame straight into `surface`
    ///
    /// The surface must be RGBA8888 and exactly canvas-sized; its stride may
    /// include padding. If the decoder produces no frame the surface is left
    /// untouched and [`FrameDuration::UNKNOWN`] is returned.
    pub fn decode_next_frame<S: Surface + ?Sized>(
        &self,
        handle: Handle,
        surface: &mut S,
    ) -> Result<FrameDuration> {
        let entry = self.entry(handle)?;
        let mut entry = entry.lock();
        let Entry { decoder, metadata } = &mut *entry;

        let info = surface.info()?;
        if info.format != SurfaceFormat::Rgba8888 {
            return Err(at(Error::UnsupportedFormat(info.format)));
        }
        if info.width != metadata.canvas_width || info.height != metadata.canvas_height {
            return Err(at(Error::DimensionMismatch {
                expected_width: metadata.canvas_width,
                expected_height: metadata.canvas_height,
                width: info.width,
                height: info.height,
            }));
        }

        let mut pixels = LockedPixels::lock(surface, &info)?;
        let duration = match decoder.next_frame()? {
            Some(frame) => {
                copy_frame(frame.pixels, pixels.bytes_mut(), info.stride as usize)?;
                frame.duration
            }
            None => {
                log::warn!("decoder {:#x} produced no frame", handle.to_raw());
                FrameDuration::UNKNOWN
            }
        };
        pixels.unlock()?;
        Ok(duration)
    }

    /// Rewind to the first frame
    pub fn reset(&self, handle: Handle) -> Result<()> {
        self.entry(handle)?.lock().decoder.reset();
        Ok(())
    }

    /// Whether another frame remains in the current pass
    pub fn has_next_frame(&self, handle: Handle) -> Result<bool> {
        let entry = self.entry(handle)?;
        let more = entry.lock().decoder.has_more_frames();
        Ok(more)
    }

    /// Number of live decoders
    pub fn len(&self) -> usize {
        self.decoders.lock().len()
    }

    /// Returns true when no decoder is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, handle: Handle) -> Result<SharedEntry<D>> {
        self.decoders
            .lock()
            .get(handle)
            .cloned()
            .ok_or_else(|| at(Error::InvalidHandle(handle.to_raw())))
    }
}
