//! Host transport state.
//!
//! The host reports transport as sparse position snapshots: any subset of
//! speed, tempo and beat may arrive with each update. [`TransportState`]
//! caches the latest value of each field and derives what the engine sees.
//!
//! # Validity
//!
//! | Field | Valid when | Fallback |
//! |-------|------------|----------|
//! | speed | always (0 = stopped) | stopped |
//! | tempo | `> 0` | [`DEFAULT_TEMPO`] |
//! | beat  | `>= 0` | engine keeps its own position |

use crate::engine::TimeInfo;
use crate::types::DEFAULT_TEMPO;

/// A partial transport snapshot decoded from one host event.
///
/// Fields that were absent (or had an unsupported representation) are
/// `None` and leave the cached value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransportUpdate {
    pub speed: Option<f64>,
    pub tempo: Option<f64>,
    pub beat: Option<f64>,
}

/// Most recently observed host transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    /// Playback speed. Sign is direction, magnitude is rate, 0 is stopped.
    speed: f64,
    /// Tempo in BPM. Non-positive means "never reported".
    tempo: f64,
    /// Position in beats. Negative means "never reported".
    beat: f64,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            speed: 0.0,
            tempo: 0.0,
            beat: -1.0,
        }
    }
}

impl TransportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the fields present in `update`.
    #[inline]
    pub fn apply(&mut self, update: &TransportUpdate) {
        if let Some(speed) = update.speed {
            self.speed = speed;
        }
        if let Some(tempo) = update.tempo {
            self.tempo = tempo;
        }
        if let Some(beat) = update.beat {
            self.beat = beat;
        }
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[inline]
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    #[inline]
    pub fn beat(&self) -> f64 {
        self.beat
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.speed != 0.0
    }

    #[inline]
    pub fn has_valid_tempo(&self) -> bool {
        self.tempo > 0.0
    }

    #[inline]
    pub fn has_valid_position(&self) -> bool {
        self.beat >= 0.0
    }

    /// Tempo the engine should run at.
    ///
    /// Scales the host tempo by the absolute playback speed, so a stopped
    /// transport yields 0. Falls back to [`DEFAULT_TEMPO`] until the host
    /// reports a valid tempo.
    #[inline]
    pub fn effective_tempo(&self) -> f64 {
        if self.has_valid_tempo() {
            self.tempo * self.speed.abs()
        } else {
            DEFAULT_TEMPO
        }
    }

    /// Push tempo (and, while playing, position) into the engine.
    ///
    /// Called once per cycle before the sample loop. When the transport is
    /// stopped or the position is unknown, the engine's internally advanced
    /// position is left alone.
    pub fn sync_engine(&self, time: &mut TimeInfo) {
        time.tempo = self.effective_tempo();
        if self.is_playing() && self.has_valid_position() {
            time.beat_position = self.beat;
        }
    }
}

/// Beats covered by `frames` samples at `tempo` BPM.
#[inline]
pub fn beats_for_frames(frames: usize, tempo: f64, sample_rate: f64) -> f64 {
    frames as f64 * tempo / (60.0 * sample_rate)
}
