//! Recording engine used by the unit tests.

use crate::engine::{Engine, TimeInfo};
use crate::fpu::FpuGuard;
use crate::types::{ExternalParamIndex, InternalParamId};

pub(crate) const BLOCK: usize = 32;

/// Engine interaction, in call order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Call {
    SetParameter(InternalParamId, f32),
    NoteOn(u8, u8, u8),
    NoteOff(u8, u8, u8),
    PitchBend(u8, i32),
    Controller(u8, u8, u8),
    Program(u8, u8),
    ChannelAftertouch(u8, u8),
    PolyAftertouch(u8, u8, u8),
    AllNotesOff,
    ProcessBlock,
    SetActive(bool),
}

pub(crate) struct MockEngine {
    pub params: [f32; MockEngine::PARAMS],
    pub calls: Vec<Call>,
    pub inputs: [[f32; BLOCK]; 2],
    pub outputs: [[f32; BLOCK]; 2],
    pub time: TimeInfo,
    pub sample_rate: f64,
    pub blocks: usize,
    pub accepts_input: bool,
    /// Channel 0 input buffer contents at each block computation.
    pub captured_inputs: Vec<[f32; BLOCK]>,
    /// Beat position at each block computation.
    pub block_beats: Vec<f64>,
    /// Whether denormals were flushed at each block computation.
    pub block_flushing: Vec<bool>,
}

impl MockEngine {
    pub const PARAMS: usize = 4;

    pub fn new() -> Self {
        Self {
            params: [0.0; Self::PARAMS],
            calls: Vec::new(),
            inputs: [[0.0; BLOCK]; 2],
            outputs: [[0.0; BLOCK]; 2],
            time: TimeInfo::default(),
            sample_rate: 0.0,
            blocks: 0,
            accepts_input: false,
            captured_inputs: Vec::new(),
            block_beats: Vec::new(),
            block_flushing: Vec::new(),
        }
    }

    /// Reverses the slot order so tests catch a missing remap.
    pub fn remap(external: ExternalParamIndex) -> InternalParamId {
        Self::PARAMS - 1 - external
    }

    /// Value written to output `channel` at `position` of block number `block` (1-based).
    pub fn expected_sample(block: usize, channel: usize, position: usize) -> f32 {
        (block * 1000 + channel * 100 + position) as f32
    }

    pub fn block_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::ProcessBlock).count()
    }
}

impl Engine for MockEngine {
    const BLOCK_SIZE: usize = BLOCK;
    const NUM_INPUTS: usize = 2;
    const NUM_OUTPUTS: usize = 2;
    const NUM_PARAMS: usize = Self::PARAMS;

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    fn remap_external_to_internal(external: ExternalParamIndex) -> InternalParamId {
        Self::remap(external)
    }

    fn parameter(&self, id: InternalParamId) -> f32 {
        self.params[id]
    }

    fn set_parameter(&mut self, id: InternalParamId, value: f32) {
        self.params[id] = value;
        self.calls.push(Call::SetParameter(id, value));
    }

    fn play_note(&mut self, channel: u8, key: u8, velocity: u8) {
        self.calls.push(Call::NoteOn(channel, key, velocity));
    }

    fn release_note(&mut self, channel: u8, key: u8, velocity: u8) {
        self.calls.push(Call::NoteOff(channel, key, velocity));
    }

    fn pitch_bend(&mut self, channel: u8, value: i32) {
        self.calls.push(Call::PitchBend(channel, value));
    }

    fn channel_controller(&mut self, channel: u8, controller: u8, value: u8) {
        self.calls.push(Call::Controller(channel, controller, value));
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        self.calls.push(Call::Program(channel, program));
    }

    fn channel_aftertouch(&mut self, channel: u8, value: u8) {
        self.calls.push(Call::ChannelAftertouch(channel, value));
    }

    fn poly_aftertouch(&mut self, channel: u8, key: u8, value: u8) {
        self.calls.push(Call::PolyAftertouch(channel, key, value));
    }

    fn all_notes_off(&mut self) {
        self.calls.push(Call::AllNotesOff);
    }

    fn process_block(&mut self) {
        self.blocks += 1;
        self.calls.push(Call::ProcessBlock);
        self.captured_inputs.push(self.inputs[0]);
        self.block_beats.push(self.time.beat_position);
        self.block_flushing.push(FpuGuard::flushes_denormals());
        for (channel, output) in self.outputs.iter_mut().enumerate() {
            for (position, sample) in output.iter_mut().enumerate() {
                *sample = Self::expected_sample(self.blocks, channel, position);
            }
        }
    }

    fn input_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut self.inputs[channel]
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
        self.calls.push(Call::SetActive(active));
    }

    fn accepts_input(&self) -> bool {
        self.accepts_input
    }
}
