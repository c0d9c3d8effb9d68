//! Cadence Synth - example polyphonic sine synthesizer.
//!
//! This plugin shows how to:
//! 1. Implement [`Engine`] with a fixed internal block size
//! 2. Map host control ports onto an internal parameter order
//! 3. Allocate voices with oldest-note stealing
//! 4. React to pitch bend and all-notes-off
//! 5. Export the engine as an LV2 plugin with `export_lv2!`

use cadence_core::{Engine, ExternalParamIndex, InternalParamId, TimeInfo, PITCH_BEND_CENTER};
use cadence_lv2::{export_lv2, Lv2Config};

// =============================================================================
// Plugin Configuration
// =============================================================================

/// Static plugin configuration. The URI matches `cadence-synth.ttl`.
pub static CONFIG: Lv2Config =
    Lv2Config::new(c"https://github.com/cadence-audio/cadence/synth").with_name("Cadence Synth");

export_lv2!(CONFIG, SineSynth);

/// Internal processing block size in samples.
pub const BLOCK_SIZE: usize = 32;

/// Number of polyphonic voices
const NUM_VOICES: usize = 8;

/// Pitch bend range in semitones
const PITCH_BEND_RANGE: f64 = 2.0;

const TAU: f64 = std::f64::consts::TAU;

// =============================================================================
// Parameters
// =============================================================================

/// Internal parameter slots.
///
/// The host sees them as `gain, attack, release` (see the Turtle file);
/// [`SineSynth::remap_external_to_internal`] translates.
mod param {
    pub const ATTACK: usize = 0;
    pub const RELEASE: usize = 1;
    pub const GAIN: usize = 2;
    pub const COUNT: usize = 3;
}

/// Host port order, by internal slot.
const EXTERNAL_ORDER: [usize; param::COUNT] = [param::GAIN, param::ATTACK, param::RELEASE];

// =============================================================================
// Voice
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    Attack,
    Sustain,
    Release,
}

#[derive(Debug, Clone, Copy)]
struct Voice {
    stage: Stage,
    key: u8,
    velocity: f32,
    started: u64,
    phase: f64,
    level: f64,
}

impl Voice {
    const IDLE: Voice = Voice {
        stage: Stage::Idle,
        key: 0,
        velocity: 0.0,
        started: 0,
        phase: 0.0,
        level: 0.0,
    };

    fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    fn trigger(&mut self, key: u8, velocity: u8, started: u64) {
        self.stage = Stage::Attack;
        self.key = key;
        self.velocity = velocity as f32 / 127.0;
        self.started = started;
        self.phase = 0.0;
    }

    fn release(&mut self) {
        if self.is_active() {
            self.stage = Stage::Release;
        }
    }

    /// Render one sample. `attack` and `release` are per-sample increments.
    fn next_sample(&mut self, frequency_scale: f64, sample_rate: f64, attack: f64, release: f64) -> f64 {
        match self.stage {
            Stage::Idle => return 0.0,
            Stage::Attack => {
                self.level += attack;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => {}
            Stage::Release => {
                self.level -= release;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                    return 0.0;
                }
            }
        }

        let frequency = 440.0 * 2.0_f64.powf((self.key as f64 - 69.0) / 12.0) * frequency_scale;
        let sample = (self.phase * TAU).sin() * self.level * self.velocity as f64;
        self.phase += frequency / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        sample
    }
}

// =============================================================================
// Engine
// =============================================================================

/// An eight-voice sine synthesizer rendering in blocks of [`BLOCK_SIZE`].
pub struct SineSynth {
    params: [f32; param::COUNT],
    voices: [Voice; NUM_VOICES],
    outputs: [[f32; BLOCK_SIZE]; 2],
    time: TimeInfo,
    sample_rate: f64,
    note_counter: u64,
    /// Pitch bend in semitones.
    bend: f64,
}

impl Default for SineSynth {
    fn default() -> Self {
        let mut params = [0.0; param::COUNT];
        params[param::ATTACK] = 0.01;
        params[param::RELEASE] = 0.2;
        params[param::GAIN] = 0.5;

        Self {
            params,
            voices: [Voice::IDLE; NUM_VOICES],
            outputs: [[0.0; BLOCK_SIZE]; 2],
            time: TimeInfo::default(),
            sample_rate: 44_100.0,
            note_counter: 0,
            bend: 0.0,
        }
    }
}

impl SineSynth {
    /// Number of voices currently sounding.
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Seconds to per-sample envelope increment.
    fn ramp(&self, seconds: f32) -> f64 {
        1.0 / (seconds.max(0.001) as f64 * self.sample_rate)
    }

    /// Free voice, else the oldest one.
    fn allocate(&mut self) -> &mut Voice {
        let index = self
            .voices
            .iter()
            .position(|v| !v.is_active())
            .unwrap_or_else(|| {
                self.voices
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, v)| v.started)
                    .map_or(0, |(i, _)| i)
            });
        &mut self.voices[index]
    }
}

impl Engine for SineSynth {
    const BLOCK_SIZE: usize = BLOCK_SIZE;
    const NUM_INPUTS: usize = 0;
    const NUM_OUTPUTS: usize = 2;
    const NUM_PARAMS: usize = param::COUNT;

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    fn remap_external_to_internal(external: ExternalParamIndex) -> InternalParamId {
        EXTERNAL_ORDER[external]
    }

    fn parameter(&self, id: InternalParamId) -> f32 {
        self.params[id]
    }

    fn set_parameter(&mut self, id: InternalParamId, value: f32) {
        self.params[id] = value;
    }

    fn play_note(&mut self, _channel: u8, key: u8, velocity: u8) {
        self.note_counter += 1;
        let started = self.note_counter;
        self.allocate().trigger(key, velocity, started);
    }

    fn release_note(&mut self, _channel: u8, key: u8, _velocity: u8) {
        self.voices
            .iter_mut()
            .filter(|v| v.key == key && v.stage != Stage::Release)
            .for_each(Voice::release);
    }

    fn pitch_bend(&mut self, _channel: u8, value: i32) {
        self.bend = value as f64 / PITCH_BEND_CENTER as f64 * PITCH_BEND_RANGE;
    }

    fn channel_controller(&mut self, _channel: u8, _controller: u8, _value: u8) {}

    fn program_change(&mut self, _channel: u8, _program: u8) {}

    fn channel_aftertouch(&mut self, _channel: u8, _value: u8) {}

    fn poly_aftertouch(&mut self, _channel: u8, _key: u8, _value: u8) {}

    fn all_notes_off(&mut self) {
        self.voices.iter_mut().for_each(Voice::release);
    }

    fn process_block(&mut self) {
        let attack = self.ramp(self.params[param::ATTACK]);
        let release = self.ramp(self.params[param::RELEASE]);
        let gain = self.params[param::GAIN] as f64;
        let frequency_scale = 2.0_f64.powf(self.bend / 12.0);
        let sample_rate = self.sample_rate;

        for p in 0..BLOCK_SIZE {
            let mix: f64 = self
                .voices
                .iter_mut()
                .map(|v| v.next_sample(frequency_scale, sample_rate, attack, release))
                .sum();
            let sample = (mix * gain) as f32;
            self.outputs[0][p] = sample;
            self.outputs[1][p] = sample;
        }
    }

    fn input_mut(&mut self, _channel: usize) -> &mut [f32] {
        &mut []
    }

    fn output(&self, channel: usize) -> &[f32] {
        &self.outputs[channel]
    }

    fn time_info(&self) -> &TimeInfo {
        &self.time
    }

    fn time_info_mut(&mut self) -> &mut TimeInfo {
        &mut self.time
    }

    fn set_active(&mut self, active: bool) {
        if !active {
            self.voices = [Voice::IDLE; NUM_VOICES];
        }
    }
}
