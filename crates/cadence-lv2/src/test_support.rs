//! Small engine used by the adapter tests.

use cadence_core::{Engine, ExternalParamIndex, FpuGuard, InternalParamId, TimeInfo};

pub(crate) const BLOCK: usize = 16;

pub(crate) struct TestSynth {
    pub params: [f32; 2],
    pub notes: Vec<(u8, u8, u8)>,
    pub released: Vec<u8>,
    pub inputs: [[f32; BLOCK]; 1],
    pub outputs: [[f32; BLOCK]; 2],
    pub time: TimeInfo,
    pub sample_rate: f64,
    pub blocks: usize,
    pub active: bool,
    pub accepts_input: bool,
    /// Sum of the input block at each computation.
    pub input_sums: Vec<f32>,
    /// Whether denormals were flushed at each block computation.
    pub block_flushing: Vec<bool>,
    /// Panic inside `process_block`.
    pub panic_in_block: bool,
}

impl Default for TestSynth {
    fn default() -> Self {
        Self {
            params: [0.25, 0.75],
            notes: Vec::new(),
            released: Vec::new(),
            inputs: [[0.0; BLOCK]],
            outputs: [[0.0; BLOCK]; 2],
            time: TimeInfo::default(),
            sample_rate: 0.0,
            blocks: 0,
            active: false,
            accepts_input: true,
            input_sums: Vec::new(),
            block_flushing: Vec::new(),
            panic_in_block: false,
        }
    }
}

impl Engine for TestSynth {
    const BLOCK_SIZE: usize = BLOCK;
    const NUM_INPUTS: usize = 1;
    const NUM_OUTPUTS: usize = 2;
    const NUM_PARAMS: usize = 2;

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    fn remap_external_to_internal(external: ExternalParamIndex) -> InternalParamId {
        1 - external
    }

    fn parameter(&self, id: InternalParamId) -> f32 {
        self.params[id]
    }

    fn set_parameter(&mut self, id: InternalParamId, value: f32) {
        self.params[id] = value;
    }

    fn play_note(&mut self, channel: u8, key: u8, velocity: u8) {
        self.notes.push((channel, key, velocity));
    }

    fn release_note(&mut self, _channel: u8, key: u8, _velocity: u8) {
        self.released.push(key);
    }

    fn pitch_bend(&mut self, _channel: u8, _value: i32) {}

    fn channel_controller(&mut self, _channel: u8, _controller: u8, _value: u8) {}

    fn program_change(&mut self, _channel: u8, _program: u8) {}

    fn channel_aftertouch(&mut self, _channel: u8, _value: u8) {}

    fn poly_aftertouch(&mut self, _channel: u8, _key: u8, _value: u8) {}

    fn all_notes_off(&mut self) {
        self.released.extend(self.notes.drain(..).map(|(_, key, _)| key));
    }

    fn process_block(&mut self) {
        if self.panic_in_block {
            panic!("engine failure");
        }
        self.blocks += 1;
        self.block_flushing.push(FpuGuard::flushes_denormals());
        self.input_sums.push(self.inputs[0].iter().sum());
        let level = self.notes.len() as f32;
        for (channel, output) in self.outputs.iter_mut().enumerate() {
            output.fill(level + channel as f32 * 0.5);
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
        self.active = active;
    }

    fn accepts_input(&self) -> bool {
        self.accepts_input
    }
}
