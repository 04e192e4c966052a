//! Reel Android JNI 绑定
//!
//! 后台音频前台服务（`com.reel.player.AudioBridge`）把 Intent 动作和
//! ExoPlayer 回调转发到这里，返回值是要执行的指令 JSON 数组。

mod bridge;

use std::sync::{Mutex, MutexGuard};

use jni::objects::{JClass, JLongArray, JObjectArray, JString};
use jni::sys::{jboolean, jlong, jstring, JNI_FALSE};
use jni::JNIEnv;

use reel_player::SequencerEvent;

pub use bridge::{directives_json, load_request, BridgeService};

/// JNI 入口可能来自任意线程，锁保证事件逐个处理
static SERVICE: Mutex<Option<BridgeService>> = Mutex::new(None);

/// 初始化日志（Android）
#[cfg(target_os = "android")]
fn init_logging() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("ReelPlayer"),
    );
}

#[cfg(not(target_os = "android"))]
fn init_logging() {}

fn lock_service() -> MutexGuard<'static, Option<BridgeService>> {
    SERVICE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn to_jstring(env: &mut JNIEnv<'_>, s: &str) -> jstring {
    match env.new_string(s) {
        Ok(v) => v.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// 派发事件，返回指令 JSON
fn dispatch(env: &mut JNIEnv<'_>, event: SequencerEvent) -> jstring {
    let directives = {
        let mut guard = lock_service();
        let service = guard.get_or_insert_with(BridgeService::default);
        service.handle(event)
    };
    to_jstring(env, &directives_json(&directives))
}

fn read_string(env: &mut JNIEnv<'_>, s: &JString<'_>) -> Option<String> {
    if s.is_null() {
        return None;
    }
    env.get_string(s).ok().map(String::from)
}

fn read_string_array(env: &mut JNIEnv<'_>, array: &JObjectArray<'_>) -> Option<Vec<String>> {
    if array.is_null() {
        return None;
    }

    let len = env.get_array_length(array).ok()?;
    let mut out = Vec::with_capacity(len as usize);
    for i in 0..len {
        let element = JString::from(env.get_object_array_element(array, i).ok()?);
        out.push(read_string(env, &element).unwrap_or_default());
        let _ = env.delete_local_ref(element);
    }
    Some(out)
}

fn read_long_array(env: &mut JNIEnv<'_>, array: &JLongArray<'_>) -> Option<Vec<i64>> {
    if array.is_null() {
        return None;
    }

    let len = env.get_array_length(array).ok()?;
    let mut buf: Vec<jlong> = vec![0; len as usize];
    env.get_long_array_region(array, 0, &mut buf).ok()?;
    Some(buf)
}

/// JNI: 初始化库
#[no_mangle]
pub extern "system" fn Java_com_reel_player_AudioBridge_init(_env: JNIEnv, _class: JClass) {
    init_logging();
    lock_service().get_or_insert_with(BridgeService::default);
}

/// JNI: 加载播放列表或单个视频
///
/// @param ids 播放列表 id（可为 null）
/// @param uris 播放列表 URI（可为 null）
/// @param titles 播放列表标题（可为 null）
/// @param id 单个视频的 MediaStore id
/// @param uri 单个视频 URI（可为 null）
/// @param title 单个视频标题（可为 null）
/// @return 指令 JSON 数组
#[no_mangle]
pub extern "system" fn Java_com_reel_player_AudioBridge_load<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    ids: JLongArray<'local>,
    uris: JObjectArray<'local>,
    titles: JObjectArray<'local>,
    id: jlong,
    uri: JString<'local>,
    title: JString<'local>,
) -> jstring {
    let request = load_request(
        read_long_array(&mut env, &ids),
        read_string_array(&mut env, &uris),
        read_string_array(&mut env, &titles),
        id,
        read_string(&mut env, &uri),
        read_string(&mut env, &title),
    );

    dispatch(&mut env, SequencerEvent::Load(request))
}

/// JNI: 通知栏“下一个”
#[no_mangle]
pub extern "system" fn Java_com_reel_player_AudioBridge_next<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    dispatch(&mut env, SequencerEvent::Next)
}

/// JNI: 通知栏“上一个”
#[no_mangle]
pub extern "system" fn Java_com_reel_player_AudioBridge_previous<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    dispatch(&mut env, SequencerEvent::Previous)
}

/// JNI: PLAY_PAUSE_ACTION
#[no_mangle]
pub extern "system" fn Java_com_reel_player_AudioBridge_playPause<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    dispatch(&mut env, SequencerEvent::PlayPause)
}

/// JNI: STOP_ACTION
#[no_mangle]
pub extern "system" fn Java_com_reel_player_AudioBridge_stop<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    dispatch(&mut env, SequencerEvent::Stop)
}

/// JNI: Player.STATE_ENDED
#[no_mangle]
pub extern "system" fn Java_com_reel_player_AudioBridge_onPlaybackEnded<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    dispatch(&mut env, SequencerEvent::Ended)
}

/// JNI: onPlayerError
#[no_mangle]
pub extern "system" fn Java_com_reel_player_AudioBridge_onPlaybackError<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    message: JString<'local>,
) -> jstring {
    let message = read_string(&mut env, &message).unwrap_or_default();
    dispatch(&mut env, SequencerEvent::Error(message))
}

/// JNI: onIsPlayingChanged
#[no_mangle]
pub extern "system" fn Java_com_reel_player_AudioBridge_onIsPlayingChanged(
    _env: JNIEnv,
    _class: JClass,
    playing: jboolean,
) {
    lock_service()
        .get_or_insert_with(BridgeService::default)
        .set_playing(playing != JNI_FALSE);
}
