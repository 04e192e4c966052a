//! 音频输出
//!
//! 使用 cpal 播放，引擎线程直接写入共享采样队列

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

/// 音频输出错误
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("No output device available")]
    NoDevice,
    #[error("No supported config for {channels} channels at {sample_rate} Hz")]
    NoConfig { channels: u16, sample_rate: u32 },
    #[error("Stream error: {0}")]
    Stream(String),
}

/// 音频输出配置
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// 队列容量（采样数）
    pub buffer_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 32 * 1024,
        }
    }
}

/// 解码线程与设备回调共享的采样队列
///
/// `capacity` 是高水位：达到后解码线程停止写入，直到回调取走采样。
#[derive(Clone)]
pub struct SampleQueue {
    inner: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl SampleQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    // 回调线程 panic 后仍继续使用队列内容
    fn lock(&self) -> MutexGuard<'_, VecDeque<f32>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 写入交错采样
    pub fn write(&self, samples: &[f32]) {
        self.lock().extend(samples.iter().copied());
    }

    /// 尚未播放的采样数
    pub fn buffered(&self) -> usize {
        self.lock().len()
    }

    /// 低于高水位时才继续解码
    pub fn wants_more(&self) -> bool {
        self.buffered() < self.capacity
    }

    /// 丢弃所有未播放的采样
    pub fn flush(&self) {
        self.lock().clear();
    }

    /// 取出采样填入 `out`，不足部分补静音，返回实际取出的数量
    pub fn drain_into(&self, out: &mut [f32]) -> usize {
        let mut queue = self.lock();
        let read = out.len().min(queue.len());
        for (dst, src) in out.iter_mut().zip(queue.drain(..read)) {
            *dst = src;
        }
        for sample in &mut out[read..] {
            *sample = 0.0;
        }
        read
    }
}

/// 音频输出流
pub struct AudioOutput {
    _stream: Stream,
    queue: SampleQueue,
    is_playing: Arc<AtomicBool>,
    channels: u16,
}

impl AudioOutput {
    /// 在默认设备上打开输出
    ///
    /// 设备不支持源声道数时退回双声道，由调用方通过 [`remap_channels`] 转换。
    pub fn new(config: OutputConfig) -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(OutputError::NoDevice)?;

        let supports = |channels: u16| -> Result<bool, OutputError> {
            let found = device
                .supported_output_configs()
                .map_err(|e| OutputError::Stream(e.to_string()))?
                .any(|c| {
                    c.channels() == channels
                        && c.min_sample_rate().0 <= config.sample_rate
                        && c.max_sample_rate().0 >= config.sample_rate
                        && c.sample_format() == SampleFormat::F32
                });
            Ok(found)
        };

        let channels = if supports(config.channels)? {
            config.channels
        } else if supports(2)? {
            2
        } else {
            return Err(OutputError::NoConfig {
                channels: config.channels,
                sample_rate: config.sample_rate,
            });
        };

        let stream_config = StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let queue = SampleQueue::new(config.buffer_size);
        let is_playing = Arc::new(AtomicBool::new(false));

        let queue_clone = queue.clone();
        let playing_clone = is_playing.clone();

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if playing_clone.load(Ordering::Relaxed) {
                        queue_clone.drain_into(data);
                    } else {
                        data.fill(0.0);
                    }
                },
                |err| {
                    log::error!("audio output error: {}", err);
                },
                None,
            )
            .map_err(|e| OutputError::Stream(e.to_string()))?;

        stream.play().map_err(|e| OutputError::Stream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            queue,
            is_playing,
            channels,
        })
    }

    /// 解码线程写入的队列
    pub fn queue(&self) -> &SampleQueue {
        &self.queue
    }

    pub fn set_playing(&self, playing: bool) {
        self.is_playing.store(playing, Ordering::Relaxed);
    }

    /// 设备实际使用的声道数
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// 交错采样的声道转换
///
/// 单声道复制到所有输出声道；多于输出的声道直接丢弃。
pub fn remap_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        for ch in 0..to {
            let value = if from == 1 {
                frame[0]
            } else if ch < from {
                frame[ch]
            } else {
                0.0
            };
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_high_water_mark() {
        let queue = SampleQueue::new(4);
        assert!(queue.wants_more());

        queue.write(&[0.1, 0.2, 0.3]);
        assert!(queue.wants_more());
        queue.write(&[0.4]);
        assert!(!queue.wants_more());
        assert_eq!(queue.buffered(), 4);
    }

    #[test]
    fn test_queue_drain_pads_silence() {
        let queue = SampleQueue::new(8);
        queue.write(&[0.5, -0.5, 0.25]);

        let mut out = [1.0; 4];
        assert_eq!(queue.drain_into(&mut out), 3);
        assert_eq!(out, [0.5, -0.5, 0.25, 0.0]);
        assert_eq!(queue.buffered(), 0);
    }

    #[test]
    fn test_queue_flush_discards_pending() {
        let queue = SampleQueue::new(8);
        queue.write(&[0.1; 6]);
        queue.flush();

        assert_eq!(queue.buffered(), 0);
        let mut out = [1.0; 2];
        assert_eq!(queue.drain_into(&mut out), 0);
        assert_eq!(out, [0.0, 0.0]);
    }

    #[test]
    fn test_queue_survives_poisoned_lock() {
        let queue = SampleQueue::new(8);
        queue.write(&[0.1, 0.2]);

        let shared = queue.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.lock();
            panic!("callback panicked");
        })
        .join();

        assert_eq!(queue.buffered(), 2);
        assert!(queue.wants_more());
    }

    #[test]
    fn test_remap_identity() {
        let samples = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(remap_channels(&samples, 2, 2), samples.to_vec());
    }

    #[test]
    fn test_remap_mono_to_stereo() {
        assert_eq!(
            remap_channels(&[0.5, -0.5], 1, 2),
            vec![0.5, 0.5, -0.5, -0.5]
        );
    }

    #[test]
    fn test_remap_surround_to_stereo() {
        // 6 声道 -> 2 声道，保留前左/前右
        let frame = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let samples: Vec<f32> = frame.iter().chain(frame.iter()).copied().collect();
        assert_eq!(remap_channels(&samples, 6, 2), vec![1.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn test_remap_stereo_to_quad_pads_silence() {
        assert_eq!(
            remap_channels(&[0.1, 0.2], 2, 4),
            vec![0.1, 0.2, 0.0, 0.0]
        );
    }
}
