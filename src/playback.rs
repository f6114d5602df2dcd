//! Loop-aware frame cursor over a bridged decoder

use crate::bridge::FrameBridge;
use crate::decoder::AnimDecoder;
use crate::error::Result;
use crate::handle::Handle;
use crate::image::FrameDuration;
use crate::surface::Surface;

/// Plays an animation's passes according to its loop count
///
/// A loop count of 0 repeats forever. Otherwise the cursor rewinds between
/// passes until `loop_count` passes have been played, then stops.
pub struct Playback<'b, D> {
    bridge: &'b FrameBridge<D>,
    handle: Handle,
    loop_count: u32,
    completed_loops: u32,
    frames_in_pass: u32,
}

impl<'b, D: AnimDecoder> Playback<'b, D> {
    /// Start from the first frame of `handle`'s animation
    pub fn new(bridge: &'b FrameBridge<D>, handle: Handle) -> Result<Self> {
        let metadata = bridge.metadata(handle)?;
        bridge.reset(handle)?;
        Ok(Self {
            bridge,
            handle,
            loop_count: metadata.loop_count,
            completed_loops: 0,
            frames_in_pass: 0,
        })
    }

    /// Decode the next frame to show, or `None` once every pass has played
    pub fn next_frame<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> Result<Option<FrameDuration>> {
        if self.is_finished() {
            return Ok(None);
        }
        if !self.bridge.has_next_frame(self.handle)? {
            // An empty pass would spin forever on an infinite loop
            if self.frames_in_pass == 0 {
                return Ok(None);
            }
            self.completed_loops += 1;
            self.frames_in_pass = 0;
            if self.is_finished() {
                return Ok(None);
            }
            self.bridge.reset(self.handle)?;
            if !self.bridge.has_next_frame(self.handle)? {
                return Ok(None);
            }
        }
        let duration = self.bridge.decode_next_frame(self.handle, surface)?;
        self.frames_in_pass += 1;
        Ok(Some(duration))
    }

    /// Passes played to the end so far
    pub fn completed_loops(&self) -> u32 {
        self.completed_loops
    }

    /// Whether the last permitted pass has been played
    pub fn is_finished(&self) -> bool {
        self.loop_count != 0 && self.completed_loops >= self.loop_count
    }
}
