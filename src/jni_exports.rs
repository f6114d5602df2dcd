//! JNI entry points
//!
//! Two Kotlin classes bind to the same bridge. `LibWebPAnimatedDecoder`
//! passes the alpha mode at creation; the older `AnimatedWebPDecoder` always
//! decodes premultiplied. Everything past `createDecoder` is shared.

#![allow(non_snake_case)]

use crate::bridge::FrameBridge;
use crate::config::{AlphaMode, DecoderConfig};
use crate::decoder::{AnimDecoder, LibWebPAnimDecoder};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::image::{AnimationMetadata, FrameDuration};
use crate::sniff;
use ::jni::JNIEnv;
use ::jni::objects::{JByteArray, JByteBuffer, JClass, JObject, JValue};
use ::jni::sys::{JNI_FALSE, JNI_TRUE, JNI_VERSION_1_6, JavaVM, jboolean, jint, jlong, jobject};
use std::ffi::c_void;
use std::sync::LazyLock;
use whereat::at;

static BRIDGE: LazyLock<FrameBridge<LibWebPAnimDecoder>> = LazyLock::new(FrameBridge::new);

const ILLEGAL_STATE: &str = "java/lang/IllegalStateException";
const ILLEGAL_ARGUMENT: &str = "java/lang/IllegalArgumentException";

const METADATA_CTOR: &str = "(IIIIIZ)V";

#[unsafe(no_mangle)]
pub extern "system" fn JNI_OnLoad(_vm: *mut JavaVM, _reserved: *mut c_void) -> jint {
    #[cfg(target_os = "android")]
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("animwebp"),
    );
    JNI_VERSION_1_6
}

fn throw(env: &mut JNIEnv, err: whereat::At<Error>) {
    log::warn!("{:?}", err);
    let err = err.into_inner();
    let class = match err {
        Error::InvalidHandle(_) => ILLEGAL_STATE,
        _ => ILLEGAL_ARGUMENT,
    };
    if let Err(e) = env.throw_new(class, err.to_string()) {
        log::error!("failed to throw {class}: {e}");
    }
}

fn throw_jni(env: &mut JNIEnv, what: &str, err: ::jni::errors::Error) {
    log::warn!("{what}: {err}");
    // A pending Java exception already explains the failure
    if matches!(err, ::jni::errors::Error::JavaException) {
        return;
    }
    if let Err(e) = env.throw_new(ILLEGAL_ARGUMENT, format!("{what}: {err}")) {
        log::error!("failed to throw: {e}");
    }
}

fn handle(raw: jlong) -> Result<Handle> {
    Handle::from_raw(raw as u64).ok_or_else(|| at(Error::InvalidHandle(raw as u64)))
}

fn create_decoder(env: &mut JNIEnv, buffer: &JByteBuffer, alpha_mode: AlphaMode) -> jlong {
    let region = env.get_direct_buffer_address(buffer).and_then(|addr| {
        let len = env.get_direct_buffer_capacity(buffer)?;
        Ok((addr, len))
    });
    let (addr, len) = match region {
        Ok(region) => region,
        Err(e) => {
            throw_jni(env, "createDecoder needs a direct ByteBuffer", e);
            return 0;
        }
    };
    let source: &[u8] = if len == 0 || addr.is_null() {
        &[]
    } else {
        // SAFETY: the JVM keeps a direct buffer's memory alive while the
        // caller holds the reference, which outlasts this call.
        unsafe { std::slice::from_raw_parts(addr, len) }
    };

    let config = DecoderConfig::new().alpha_mode(alpha_mode);
    match BRIDGE.create(source, &config) {
        Ok(handle) => handle.to_raw() as jlong,
        Err(e) => {
            log::warn!("createDecoder failed: {:?}", e);
            0
        }
    }
}

fn delete_decoder(env: &mut JNIEnv, raw: jlong) {
    if let Err(e) = delete_raw(&BRIDGE, raw) {
        throw(env, e);
    }
}

/// Kotlin finalizers delete unconditionally, so the 0 left by a failed
/// `createDecoder` is accepted and ignored.
fn delete_raw<D: AnimDecoder>(bridge: &FrameBridge<D>, raw: jlong) -> Result<()> {
    if raw == 0 {
        return Ok(());
    }
    bridge.delete(handle(raw)?)
}

fn metadata_object(
    env: &mut JNIEnv,
    metadata_class: &str,
    metadata: &AnimationMetadata,
) -> ::jni::errors::Result<jobject> {
    // jint carries the unsigned fields bit for bit
    let obj = env.new_object(
        metadata_class,
        METADATA_CTOR,
        &[
            JValue::Int(metadata.canvas_width as jint),
            JValue::Int(metadata.canvas_height as jint),
            JValue::Int(metadata.loop_count as jint),
            JValue::Int(metadata.background_color as jint),
            JValue::Int(metadata.frame_count as jint),
            JValue::Bool(if metadata.has_alpha { JNI_TRUE } else { JNI_FALSE }),
        ],
    )?;
    Ok(obj.into_raw())
}

fn get_metadata(env: &mut JNIEnv, raw: jlong, metadata_class: &str) -> jobject {
    let metadata = match handle(raw).and_then(|h| BRIDGE.metadata(h)) {
        Ok(m) => m,
        Err(e) => {
            throw(env, e);
            return JObject::null().into_raw();
        }
    };
    match metadata_object(env, metadata_class, &metadata) {
        Ok(obj) => obj,
        Err(e) => {
            throw_jni(env, "failed to build metadata", e);
            JObject::null().into_raw()
        }
    }
}

#[cfg(target_os = "android")]
fn decode_next_frame(env: &mut JNIEnv, raw: jlong, bitmap: &JObject) -> jint {
    use crate::bitmap::AndroidBitmapSurface;

    // SAFETY: env and bitmap are the arguments of the current JNI call
    let mut surface = unsafe { AndroidBitmapSurface::from_jni(env.get_raw(), bitmap.as_raw()) };
    match handle(raw).and_then(|h| BRIDGE.decode_next_frame(h, &mut surface)) {
        Ok(duration) => duration.raw(),
        Err(e) => {
            throw(env, e);
            FrameDuration::UNKNOWN.raw()
        }
    }
}

#[cfg(not(target_os = "android"))]
fn decode_next_frame(env: &mut JNIEnv, _raw: jlong, _bitmap: &JObject) -> jint {
    if let Err(e) = env.throw_new(
        "java/lang/UnsupportedOperationException",
        "android.graphics.Bitmap surfaces need an Android build",
    ) {
        log::error!("failed to throw: {e}");
    }
    FrameDuration::UNKNOWN.raw()
}

fn reset(env: &mut JNIEnv, raw: jlong) {
    if let Err(e) = handle(raw).and_then(|h| BRIDGE.reset(h)) {
        throw(env, e);
    }
}

fn has_next_frame(env: &mut JNIEnv, raw: jlong) -> jboolean {
    match handle(raw).and_then(|h| BRIDGE.has_next_frame(h)) {
        Ok(true) => JNI_TRUE,
        Ok(false) => JNI_FALSE,
        Err(e) => {
            throw(env, e);
            JNI_FALSE
        }
    }
}

fn sniff_header(env: &mut JNIEnv, bytes: &JByteArray, check: fn(&[u8]) -> bool) -> jboolean {
    match env.convert_byte_array(bytes) {
        Ok(bytes) if check(&bytes) => JNI_TRUE,
        Ok(_) => JNI_FALSE,
        Err(e) => {
            throw_jni(env, "failed to read header bytes", e);
            JNI_FALSE
        }
    }
}

/// Exports every shared entry point for one Kotlin class
macro_rules! decoder_class {
    (
        metadata_class: $metadata_class:literal,
        delete: $delete:ident,
        get_metadata: $get_metadata:ident,
        decode_next_frame: $decode:ident,
        reset: $reset:ident,
        has_next_frame: $has_next:ident $(,)?
    ) => {
        #[unsafe(no_mangle)]
        pub extern "system" fn $delete<'local>(
            mut env: JNIEnv<'local>,
            _class: JClass<'local>,
            decoder: jlong,
        ) {
            delete_decoder(&mut env, decoder)
        }

        #[unsafe(no_mangle)]
        pub extern "system" fn $get_metadata<'local>(
            mut env: JNIEnv<'local>,
            _class: JClass<'local>,
            decoder: jlong,
        ) -> jobject {
            get_metadata(&mut env, decoder, $metadata_class)
        }

        #[unsafe(no_mangle)]
        pub extern "system" fn $decode<'local>(
            mut env: JNIEnv<'local>,
            _class: JClass<'local>,
            decoder: jlong,
            out_bitmap: JObject<'local>,
        ) -> jint {
            decode_next_frame(&mut env, decoder, &out_bitmap)
        }

        #[unsafe(no_mangle)]
        pub extern "system" fn $reset<'local>(
            mut env: JNIEnv<'local>,
            _class: JClass<'local>,
            decoder: jlong,
        ) {
            reset(&mut env, decoder)
        }

        #[unsafe(no_mangle)]
        pub extern "system" fn $has_next<'local>(
            mut env: JNIEnv<'local>,
            _class: JClass<'local>,
            decoder: jlong,
        ) -> jboolean {
            has_next_frame(&mut env, decoder)
        }
    };
}

// com.github.skgmn.webpdecoder.libwebp.LibWebPAnimatedDecoder

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_github_skgmn_webpdecoder_libwebp_LibWebPAnimatedDecoder_createDecoder<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    byte_buffer: JByteBuffer<'local>,
    premultiplied_alpha: jboolean,
) -> jlong {
    let mode = AlphaMode::from_premultiplied(premultiplied_alpha != JNI_FALSE);
    create_decoder(&mut env, &byte_buffer, mode)
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_github_skgmn_webpdecoder_libwebp_LibWebPAnimatedDecoder_isWebP<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    header: JByteArray<'local>,
) -> jboolean {
    sniff_header(&mut env, &header, sniff::is_webp_header)
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_github_skgmn_webpdecoder_libwebp_LibWebPAnimatedDecoder_isAnimatedWebP<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    header: JByteArray<'local>,
) -> jboolean {
    sniff_header(&mut env, &header, sniff::is_animated_webp_header)
}

decoder_class! {
    metadata_class: "com/github/skgmn/webpdecoder/libwebp/LibWebPAnimatedDecoder$Metadata",
    delete: Java_com_github_skgmn_webpdecoder_libwebp_LibWebPAnimatedDecoder_deleteDecoder,
    get_metadata: Java_com_github_skgmn_webpdecoder_libwebp_LibWebPAnimatedDecoder_getMetadata,
    decode_next_frame: Java_com_github_skgmn_webpdecoder_libwebp_LibWebPAnimatedDecoder_decodeNextFrame,
    reset: Java_com_github_skgmn_webpdecoder_libwebp_LibWebPAnimatedDecoder_reset,
    has_next_frame: Java_com_github_skgmn_webpdecoder_libwebp_LibWebPAnimatedDecoder_hasNextFrame,
}

// com.github.skgmn.webpdecoder.libwebp.AnimatedWebPDecoder (always premultiplied)

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_github_skgmn_webpdecoder_libwebp_AnimatedWebPDecoder_createDecoder<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    byte_buffer: JByteBuffer<'local>,
) -> jlong {
    create_decoder(&mut env, &byte_buffer, AlphaMode::Premultiplied)
}

decoder_class! {
    metadata_class: "com/github/skgmn/webpdecoder/libwebp/AnimatedWebPDecoder$Metadata",
    delete: Java_com_github_skgmn_webpdecoder_libwebp_AnimatedWebPDecoder_deleteDecoder,
    get_metadata: Java_com_github_skgmn_webpdecoder_libwebp_AnimatedWebPDecoder_getMetadata,
    decode_next_frame: Java_com_github_skgmn_webpdecoder_libwebp_AnimatedWebPDecoder_decodeNextFrame,
    reset: Java_com_github_skgmn_webpdecoder_libwebp_AnimatedWebPDecoder_reset,
    has_next_frame: Java_com_github_skgmn_webpdecoder_libwebp_AnimatedWebPDecoder_hasNextFrame,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Frame;

    struct Idle;

    impl AnimDecoder for Idle {
        fn open(_data: &[u8], _config: &DecoderConfig) -> Result<Self> {
            Ok(Idle)
        }

        fn metadata(&self) -> AnimationMetadata {
            AnimationMetadata {
                canvas_width: 1,
                canvas_height: 1,
                loop_count: 0,
                background_color: 0,
                frame_count: 0,
                has_alpha: false,
            }
        }

        fn next_frame(&mut self) -> Result<Option<Frame<'_>>> {
            Ok(None)
        }

        fn has_more_frames(&self) -> bool {
            false
        }

        fn reset(&mut self) {}
    }

    #[test]
    fn deleting_zero_handle_is_a_no_op() {
        let bridge = FrameBridge::<Idle>::new();
        let live = bridge.register(Idle);
        delete_raw(&bridge, 0).unwrap();
        assert_eq!(bridge.len(), 1, "zero must not touch live decoders");

        delete_raw(&bridge, live.to_raw() as jlong).unwrap();
        assert!(bridge.is_empty());
        let err = delete_raw(&bridge, live.to_raw() as jlong).unwrap_err().into_inner();
        assert!(matches!(err, Error::InvalidHandle(_)));
    }
}
