//! Destination surfaces and the stride-aware frame copy

use crate::error::{Error, Result};
use imgref::ImgRef;
use rgb::RGBA8;
use std::ptr::NonNull;
use whereat::at;

/// Pixel layout of a destination surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SurfaceFormat {
    /// 4 bytes per pixel, R G B A in memory order
    Rgba8888,
    /// 16-bit 5-6-5 RGB
    Rgb565,
    /// 16-bit 4-4-4-4 RGBA
    Rgba4444,
    /// 8-bit alpha only
    A8,
    /// Half-float RGBA
    RgbaF16,
    /// Anything else the platform reports
    Other(i32),
}

/// Geometry and format of a destination surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Distance between the starts of consecutive rows, in bytes
    pub stride: u32,
    /// Pixel format
    pub format: SurfaceFormat,
}

impl SurfaceInfo {
    /// Bytes covered by the locked pixel pointer
    pub fn byte_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }
}

/// A caller-owned pixel buffer the bridge can write frames into
///
/// # Safety
///
/// After `lock_pixels` succeeds the returned pointer must be valid for
/// writes of `info().byte_len()` bytes, and `info()` must not change, until
/// the matching `unlock_pixels` call.
pub unsafe trait Surface {
    /// Current geometry and format
    fn info(&self) -> Result<SurfaceInfo>;

    /// Acquire a writable pointer to the first pixel
    fn lock_pixels(&mut self) -> Result<NonNull<u8>>;

    /// Release the pointer obtained from `lock_pixels`
    fn unlock_pixels(&mut self) -> Result<()>;
}

/// Scoped lock on a surface's pixels
///
/// The surface is unlocked when the guard is dropped, so every exit path
/// releases it. Use [`LockedPixels::unlock`] to observe unlock failures.
pub struct LockedPixels<'s, S: Surface + ?Sized> {
    surface: &'s mut S,
    pixels: NonNull<u8>,
    len: usize,
    locked: bool,
}

impl<'s, S: Surface + ?Sized> LockedPixels<'s, S> {
    /// Lock `surface`, whose geometry was already read into `info`
    pub fn lock(surface: &'s mut S, info: &SurfaceInfo) -> Result<Self> {
        let pixels = surface.lock_pixels()?;
        Ok(Self {
            surface,
            pixels,
            len: info.byte_len(),
            locked: true,
        })
    }

    /// The locked pixel memory
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: the Surface contract keeps `pixels` valid for `len` bytes
        // while locked, and `&mut self` makes this the only view.
        unsafe { std::slice::from_raw_parts_mut(self.pixels.as_ptr(), self.len) }
    }

    /// Unlock now, reporting failure instead of logging it
    pub fn unlock(mut self) -> Result<()> {
        self.locked = false;
        self.surface.unlock_pixels()
    }
}

impl<S: Surface + ?Sized> Drop for LockedPixels<'_, S> {
    fn drop(&mut self) {
        if self.locked {
            if let Err(e) = self.surface.unlock_pixels() {
                log::warn!("failed to unlock surface: {:?}", e);
            }
        }
    }
}

/// Copy a tightly packed frame into `dst`, whose rows are `stride` bytes apart
///
/// A matching stride is one bulk copy. Otherwise rows are copied one at a
/// time and the padding after each row is left as it was.
pub fn copy_frame(frame: ImgRef<'_, RGBA8>, dst: &mut [u8], stride: usize) -> Result<()> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = width * 4;

    if stride < row_bytes {
        return Err(at(Error::StrideTooSmall {
            stride,
            min: row_bytes,
        }));
    }
    if width == 0 || height == 0 {
        return Ok(());
    }

    // The last row does not need its padding
    let needed = stride * (height - 1) + row_bytes;
    if dst.len() < needed {
        return Err(at(Error::BufferTooSmall {
            needed,
            actual: dst.len(),
        }));
    }

    if stride == row_bytes && frame.stride() == width {
        let src: &[u8] = bytemuck::cast_slice(&frame.buf()[..width * height]);
        dst[..src.len()].copy_from_slice(src);
    } else {
        for (dst_row, src_row) in dst.chunks_mut(stride).zip(frame.rows()) {
            dst_row[..row_bytes].copy_from_slice(bytemuck::cast_slice(src_row));
        }
    }
    Ok(())
}

/// Heap-backed RGBA surface with an arbitrary row stride
#[derive(Debug, Clone)]
pub struct MemorySurface {
    pixels: Vec<u8>,
    info: SurfaceInfo,
    locked: bool,
    lock_count: usize,
}

impl MemorySurface {
    /// Surface with tightly packed rows
    pub fn new(width: u32, height: u32) -> Self {
        let info = SurfaceInfo {
            width,
            height,
            stride: width * 4,
            format: SurfaceFormat::Rgba8888,
        };
        Self {
            pixels: vec![0; info.byte_len()],
            info,
            locked: false,
            lock_count: 0,
        }
    }

    /// Surface whose rows are `stride` bytes apart
    pub fn with_stride(width: u32, height: u32, stride: u32) -> Result<Self> {
        let min = width as usize * 4;
        if (stride as usize) < min {
            return Err(at(Error::StrideTooSmall {
                stride: stride as usize,
                min,
            }));
        }
        let mut surface = Self::new(width, height);
        surface.info.stride = stride;
        surface.pixels = vec![0; surface.info.byte_len()];
        Ok(surface)
    }

    /// Set every byte, padding included
    pub fn fill(&mut self, value: u8) {
        self.pixels.fill(value);
    }

    /// All bytes, padding included
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel bytes of row `y`, without padding
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.info.stride as usize;
        &self.pixels[start..start + self.info.width as usize * 4]
    }

    /// Padding bytes after row `y`
    pub fn row_padding(&self, y: u32) -> &[u8] {
        let start = y as usize * self.info.stride as usize;
        &self.pixels[start + self.info.width as usize * 4..start + self.info.stride as usize]
    }

    /// Whether a lock is currently held
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// How many times the surface has been locked
    pub fn lock_count(&self) -> usize {
        self.lock_count
    }
}

// SAFETY: `pixels` holds exactly `info.byte_len()` bytes and is neither
// reallocated nor resized while locked.
unsafe impl Surface for MemorySurface {
    fn info(&self) -> Result<SurfaceInfo> {
        Ok(self.info)
    }

    fn lock_pixels(&mut self) -> Result<NonNull<u8>> {
        if self.locked {
            return Err(at(Error::SurfaceLock("surface is already locked".into())));
        }
        self.locked = true;
        self.lock_count += 1;
        Ok(NonNull::new(self.pixels.as_mut_ptr()).unwrap_or(NonNull::dangling()))
    }

    fn unlock_pixels(&mut self) -> Result<()> {
        if !self.locked {
            return Err(at(Error::SurfaceLock("surface is not locked".into())));
        }
        self.locked = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgref::Img;

    fn gradient(width: usize, height: usize) -> Vec<RGBA8> {
        (0..width * height)
            .map(|i| {
                let v = i as u8;
                RGBA8::new(v, v.wrapping_add(1), v.wrapping_add(2), 255)
            })
            .collect()
    }

    #[test]
    fn tight_stride_is_one_contiguous_copy() {
        let px = gradient(5, 3);
        let frame = Img::new(px.as_slice(), 5, 3);
        let mut dst = vec![0u8; 5 * 4 * 3];
        copy_frame(frame, &mut dst, 20).unwrap();
        assert_eq!(dst.as_slice(), bytemuck::cast_slice::<RGBA8, u8>(&px));
    }

    #[test]
    fn padded_rows_keep_their_padding() {
        let px = gradient(3, 4);
        let frame = Img::new(px.as_slice(), 3, 4);
        let stride = 3 * 4 + 8;
        let mut dst = vec![0xAAu8; stride * 4];
        copy_frame(frame, &mut dst, stride).unwrap();

        for (y, src_row) in frame.rows().enumerate() {
            let row = &dst[y * stride..(y + 1) * stride];
            assert_eq!(&row[..12], bytemuck::cast_slice::<RGBA8, u8>(src_row));
            assert!(row[12..].iter().all(|&b| b == 0xAA), "row {y} padding");
        }
    }

    #[test]
    fn last_row_padding_is_optional() {
        let px = gradient(2, 2);
        let frame = Img::new(px.as_slice(), 2, 2);
        let mut dst = vec![0u8; 16 + 8];
        copy_frame(frame, &mut dst, 16).unwrap();
        assert_eq!(&dst[16..24], bytemuck::cast_slice::<RGBA8, u8>(&px[2..]));
    }

    #[test]
    fn rejects_narrow_stride() {
        let px = gradient(4, 1);
        let frame = Img::new(px.as_slice(), 4, 1);
        let mut dst = vec![0u8; 64];
        let err = copy_frame(frame, &mut dst, 15).unwrap_err().into_inner();
        assert!(matches!(err, Error::StrideTooSmall { stride: 15, min: 16 }));
    }

    #[test]
    fn rejects_short_buffer() {
        let px = gradient(2, 3);
        let frame = Img::new(px.as_slice(), 2, 3);
        let mut dst = vec![0u8; 20];
        let err = copy_frame(frame, &mut dst, 8).unwrap_err().into_inner();
        assert!(matches!(err, Error::BufferTooSmall { needed: 24, actual: 20 }));
    }

    #[test]
    fn guard_unlocks_on_drop() {
        let mut surface = MemorySurface::new(2, 2);
        let info = surface.info().unwrap();
        {
            let mut guard = LockedPixels::lock(&mut surface, &info).unwrap();
            guard.bytes_mut()[0] = 9;
        }
        assert!(!surface.is_locked());
        assert_eq!(surface.as_bytes()[0], 9);
        assert_eq!(surface.lock_count(), 1);
    }

    #[test]
    fn explicit_unlock_reports_success() {
        let mut surface = MemorySurface::new(1, 1);
        let info = surface.info().unwrap();
        let guard = LockedPixels::lock(&mut surface, &info).unwrap();
        guard.unlock().unwrap();
        assert!(!surface.is_locked());
    }

    #[test]
    fn double_lock_is_refused() {
        let mut surface = MemorySurface::new(1, 1);
        surface.lock_pixels().unwrap();
        assert!(surface.lock_pixels().is_err());
        surface.unlock_pixels().unwrap();
        assert!(surface.unlock_pixels().is_err());
    }

    #[test]
    fn memory_surface_rejects_narrow_stride() {
        assert!(MemorySurface::with_stride(4, 4, 12).is_err());
        let s = MemorySurface::with_stride(4, 4, 32).unwrap();
        assert_eq!(s.as_bytes().len(), 128);
        assert_eq!(s.row_padding(1).len(), 16);
    }
}
