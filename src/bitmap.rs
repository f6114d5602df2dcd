//! `android.graphics.Bitmap` as a [`Surface`]

use crate::error::{Error, Result};
use crate::surface::{Surface, SurfaceFormat, SurfaceInfo};
use ::jni::sys::{JNIEnv, jobject};
use ndk_sys::{
    AndroidBitmap_getInfo, AndroidBitmap_lockPixels, AndroidBitmap_unlockPixels,
    AndroidBitmapInfo,
};
use std::ffi::c_void;
use std::ptr::NonNull;
use whereat::at;

// ANDROID_BITMAP_RESULT_SUCCESS and ANDROID_BITMAP_FORMAT_* from <android/bitmap.h>
const RESULT_SUCCESS: i32 = 0;
const FORMAT_RGBA_8888: i32 = 1;
const FORMAT_RGB_565: i32 = 4;
const FORMAT_RGBA_4444: i32 = 7;
const FORMAT_A_8: i32 = 8;
const FORMAT_RGBA_F16: i32 = 9;

fn surface_format(raw: i32) -> SurfaceFormat {
    match raw {
        FORMAT_RGBA_8888 => SurfaceFormat::Rgba8888,
        FORMAT_RGB_565 => SurfaceFormat::Rgb565,
        FORMAT_RGBA_4444 => SurfaceFormat::Rgba4444,
        FORMAT_A_8 => SurfaceFormat::A8,
        FORMAT_RGBA_F16 => SurfaceFormat::RgbaF16,
        other => SurfaceFormat::Other(other),
    }
}

fn check(status: i32, what: &str) -> Result<()> {
    if status == RESULT_SUCCESS {
        Ok(())
    } else {
        Err(at(Error::SurfaceLock(format!("{what} returned {status}"))))
    }
}

/// A Java bitmap borrowed for the duration of one JNI call
pub struct AndroidBitmapSurface {
    env: *mut JNIEnv,
    bitmap: jobject,
}

impl AndroidBitmapSurface {
    /// # Safety
    ///
    /// `env` must be the current thread's JNI environment and `bitmap` a
    /// live `android.graphics.Bitmap` reference, both valid for as long as
    /// the surface is used.
    pub unsafe fn from_jni(env: *mut JNIEnv, bitmap: jobject) -> Self {
        Self { env, bitmap }
    }
}

// SAFETY: AndroidBitmap_lockPixels returns an address valid for
// stride * height bytes until AndroidBitmap_unlockPixels, and a locked
// bitmap cannot be reconfigured.
unsafe impl Surface for AndroidBitmapSurface {
    fn info(&self) -> Result<SurfaceInfo> {
        let mut info = std::mem::MaybeUninit::<AndroidBitmapInfo>::uninit();
        // SAFETY: env and bitmap are valid per from_jni's contract
        let status =
            unsafe { AndroidBitmap_getInfo(self.env.cast(), self.bitmap.cast(), info.as_mut_ptr()) };
        check(status, "AndroidBitmap_getInfo")?;
        let info = unsafe { info.assume_init() };
        Ok(SurfaceInfo {
            width: info.width,
            height: info.height,
            stride: info.stride,
            format: surface_format(info.format as i32),
        })
    }

    fn lock_pixels(&mut self) -> Result<NonNull<u8>> {
        let mut addr: *mut c_void = std::ptr::null_mut();
        // SAFETY: env and bitmap are valid per from_jni's contract
        let status =
            unsafe { AndroidBitmap_lockPixels(self.env.cast(), self.bitmap.cast(), &mut addr) };
        check(status, "AndroidBitmap_lockPixels")?;
        match NonNull::new(addr.cast::<u8>()) {
            Some(pixels) => Ok(pixels),
            None => {
                self.unlock_pixels()?;
                Err(at(Error::SurfaceLock("bitmap has no pixel memory".into())))
            }
        }
    }

    fn unlock_pixels(&mut self) -> Result<()> {
        // SAFETY: env and bitmap are valid per from_jni's contract
        let status = unsafe { AndroidBitmap_unlockPixels(self.env.cast(), self.bitmap.cast()) };
        check(status, "AndroidBitmap_unlockPixels")
    }
}
