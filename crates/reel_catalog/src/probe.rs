//! 时长探测

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::CatalogError;

/// 取容器内最长轨道的时长
pub fn probe_duration(path: &Path) -> Result<Duration, CatalogError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| CatalogError::Probe(e.to_string()))?;

    probed
        .format
        .tracks()
        .iter()
        .filter_map(|track| {
            let params = &track.codec_params;
            let frames = params.n_frames?;
            match (params.time_base, params.sample_rate) {
                (Some(tb), _) => {
                    let time = tb.calc_time(frames);
                    Some(Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac))
                }
                (None, Some(rate)) if rate > 0 => {
                    Some(Duration::from_secs_f64(frames as f64 / rate as f64))
                }
                _ => None,
            }
        })
        .max()
        .ok_or_else(|| CatalogError::Probe("no track reports a length".to_string()))
}

/// 探测失败时记录警告并返回 0
pub fn duration_ms_or_zero(path: &Path) -> u64 {
    match probe_duration(path) {
        Ok(d) => d.as_millis() as u64,
        Err(e) => {
            log::warn!("cannot probe {}: {}", path.display(), e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_probe_garbage_fails() {
        let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
        file.write_all(b"definitely not a media container").unwrap();

        assert!(probe_duration(file.path()).is_err());
        assert_eq!(duration_ms_or_zero(file.path()), 0);
    }

    #[test]
    fn test_probe_wav_duration() {
        // 1 秒 8kHz 单声道 16-bit PCM
        let rate: u32 = 8000;
        let data_len: u32 = rate * 2;
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&rate.to_le_bytes());
        wav.extend_from_slice(&(rate * 2).to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.resize(wav.len() + data_len as usize, 0);

        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(&wav).unwrap();

        assert_eq!(duration_ms_or_zero(file.path()), 1000);
    }
}
