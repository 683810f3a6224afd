/// Sound engine: procedural sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use pushbox::sim::event::GameEvent;

/// One sound effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sfx {
    Step,
    Push,
    Bump,
    Win,
    /// Whole playthrough finished.
    Fanfare,
}

impl Sfx {
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::PlayerMoved { .. } => Some(Sfx::Step),
            GameEvent::BoxPushed { .. } => Some(Sfx::Push),
            GameEvent::MoveBlocked { .. } => Some(Sfx::Bump),
            GameEvent::LevelWon { .. } => Some(Sfx::Win),
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        volume: f32,
        sfx_step: Arc<Vec<u8>>,
        sfx_push: Arc<Vec<u8>>,
        sfx_bump: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
        sfx_fanfare: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        /// `None` when no output device is available.
        pub fn new(volume: f32) -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                volume,
                sfx_step: Arc::new(make_wav(&gen_step())),
                sfx_push: Arc::new(make_wav(&gen_push())),
                sfx_bump: Arc::new(make_wav(&gen_bump())),
                sfx_win: Arc::new(make_wav(&gen_win())),
                sfx_fanfare: Arc::new(make_wav(&gen_fanfare())),
            })
        }

        pub fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0);
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match sfx {
                Sfx::Step => &self.sfx_step,
                Sfx::Push => &self.sfx_push,
                Sfx::Bump => &self.sfx_bump,
                Sfx::Win => &self.sfx_win,
                Sfx::Fanfare => &self.sfx_fanfare,
            };
            let Ok(sink) = Sink::try_new(&self.handle) else {
                return;
            };
            let cursor = Cursor::new(buf.as_ref().clone());
            if let Ok(src) = rodio::Decoder::new(cursor) {
                sink.set_volume(self.volume);
                sink.append(src);
                sink.detach();
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Footstep: very short low tick.
    fn gen_step() -> Vec<f32> {
        let n = samples_for(0.03);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                (t * 220.0 * TAU).sin() * env * env * 0.15
            })
            .collect()
    }

    /// Crate scrape: filtered noise over a falling tone.
    fn gen_push() -> Vec<f32> {
        let n = samples_for(0.09);
        let mut rng: u32 = 0x2545_f491;
        let mut smoothed = 0.0_f32;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                let tone = (t * (180.0 - p * 60.0) * TAU).sin();
                rng = rng.wrapping_mul(1_103_515_245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                smoothed += (noise - smoothed) * 0.2;
                (tone * 0.5 + smoothed * 0.5) * (1.0 - p).powf(0.7) * 0.3
            })
            .collect()
    }

    /// Blocked move: dull square thud.
    fn gen_bump() -> Vec<f32> {
        let n = samples_for(0.07);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let square = if (t * 90.0 * TAU).sin() >= 0.0 { 1.0 } else { -1.0 };
                square * (1.0 - i as f32 / n as f32) * 0.12
            })
            .collect()
    }

    fn arpeggio(notes: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = samples_for(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        let fade_len = samples.len() / 5;
        let total = samples.len();
        for (k, s) in samples[total - fade_len..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / fade_len as f32;
        }
        samples
    }

    /// Level solved: C5 E5 G5.
    fn gen_win() -> Vec<f32> {
        arpeggio(&[(523.0, 0.08), (659.0, 0.08), (784.0, 0.2)], 0.3)
    }

    /// Playthrough finished.
    fn gen_fanfare() -> Vec<f32> {
        arpeggio(
            &[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.15), (784.0, 0.08), (1047.0, 0.4)],
            0.3,
        )
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let samples = gen_win();
            let wav = make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
        }

        #[test]
        fn generated_samples_stay_in_range() {
            for samples in [gen_step(), gen_push(), gen_bump(), gen_win(), gen_fanfare()] {
                assert!(!samples.is_empty());
                assert!(samples.iter().all(|s| s.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_volume: f32) -> Option<Self> { Some(SoundEngine) }
    pub fn set_volume(&mut self, _volume: f32) {}
    pub fn play(&self, _sfx: Sfx) {}
}
