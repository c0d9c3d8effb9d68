//! Sample-accurate block scheduling.
//!
//! The engine renders audio in fixed sub-blocks of [`Engine::BLOCK_SIZE`]
//! samples, while the host calls in with buffers of any length. The
//! [`BlockScheduler`] walks the host buffer one sample at a time and keeps a
//! phase counter into the engine's current sub-block:
//!
//! ```text
//! host cycle 1 (S = 40)           host cycle 2 (S = 40)
//! |0 ............... 31|32 .. 39| |0 ...... 23|24 ..............
//! [ sub-block 1        ][ sub-block 2          ][ sub-block 3 ...
//!  ^ boundary           ^ boundary              ^ boundary
//! ```
//!
//! The engine's state may only change at a boundary. At each boundary the
//! scheduler advances the beat position, applies every pending event that
//! falls before the end of the sub-block about to be rendered (clamped to
//! the end of the host cycle), then asks the engine for the next block.
//! Events left over after the last sample, including offsets past the end
//! of the cycle, are applied before returning so none are ever dropped.
//!
//! Events are never reordered: the cursor stops at the first event that is
//! not yet due.

use crate::buffer::Buffer;
use crate::engine::Engine;
use crate::event::{Decoded, TimedEvent};
use crate::transport::{beats_for_frames, TransportState};

/// Phase tracker for the engine's sub-block grid.
///
/// The phase persists across host cycles and is only reset when the stream
/// restarts.
#[derive(Debug, Clone, Default)]
pub struct BlockScheduler {
    position: usize,
}

impl BlockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position within the current sub-block (`0..BLOCK_SIZE`).
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Restart at a sub-block boundary.
    #[inline]
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Run one host cycle.
    ///
    /// `events` must be in host order. Host input is forwarded only when
    /// the engine accepts input and at least one input channel is present.
    pub fn run<'e, E, I>(
        &mut self,
        engine: &mut E,
        transport: &mut TransportState,
        events: I,
        buffer: &mut Buffer<'_>,
        sample_rate: f64,
    ) where
        E: Engine,
        I: IntoIterator<Item = TimedEvent<'e>>,
    {
        let num_samples = buffer.num_samples();
        let forward_input = engine.accepts_input() && buffer.num_input_channels() > 0;
        let num_inputs = E::NUM_INPUTS.min(buffer.num_input_channels());
        let num_outputs = E::NUM_OUTPUTS.min(buffer.num_output_channels());

        let mut events = events.into_iter().peekable();

        for i in 0..num_samples {
            if self.position == 0 {
                let time = engine.time_info_mut();
                time.beat_position += beats_for_frames(E::BLOCK_SIZE, time.tempo, sample_rate);

                let block_end = (i + E::BLOCK_SIZE).min(num_samples);
                while let Some(event) = events.next_if(|e| e.is_before(block_end)) {
                    apply_event(&event, engine, transport);
                }

                engine.process_block();
            }

            if forward_input {
                for channel in 0..num_inputs {
                    if let Some(input) = buffer.input(channel) {
                        engine.input_mut(channel)[self.position] = input[i];
                    }
                }
            }

            for channel in 0..num_outputs {
                let sample = engine.output(channel)[self.position];
                if let Some(output) = buffer.output_mut(channel) {
                    output[i] = sample;
                }
            }

            self.position += 1;
            if self.position >= E::BLOCK_SIZE {
                self.position = 0;
            }
        }

        for event in events {
            apply_event(&event, engine, transport);
        }
    }
}

/// Decode one event and route it to the engine or the transport.
#[inline]
fn apply_event<E: Engine>(event: &TimedEvent<'_>, engine: &mut E, transport: &mut TransportState) {
    match event.decode() {
        Some(Decoded::Command(command)) => command.dispatch(engine),
        Some(Decoded::Transport(update)) => transport.apply(&update),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{NumericValue, PositionPayload};
    use crate::test_support::{Call, MockEngine, BLOCK};

    const SAMPLE_RATE: f64 = 48_000.0;

    const NOTE_ON: [u8; 3] = [0x90, 60, 100];
    const NOTE_OFF: [u8; 3] = [0x80, 60, 0];
    const CC_ALL_OFF: [u8; 3] = [0xB0, 123, 0];

    struct Harness {
        scheduler: BlockScheduler,
        engine: MockEngine,
        transport: TransportState,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                scheduler: BlockScheduler::new(),
                engine: MockEngine::new(),
                transport: TransportState::new(),
            }
        }

        fn run(&mut self, events: &[TimedEvent<'_>], num_samples: usize) -> [Vec<f32>; 2] {
            let mut left = vec![0.0; num_samples];
            let mut right = vec![0.0; num_samples];
            let mut buffer = Buffer::outputs_only(
                [left.as_mut_slice(), right.as_mut_slice()],
                num_samples,
            );
            self.scheduler.run(
                &mut self.engine,
                &mut self.transport,
                events.iter().copied(),
                &mut buffer,
                SAMPLE_RATE,
            );
            [left, right]
        }

        fn run_with_input(&mut self, input: &[f32]) {
            let mut left = vec![0.0; input.len()];
            let mut buffer = Buffer::new([input], [left.as_mut_slice()], input.len());
            self.scheduler.run(
                &mut self.engine,
                &mut self.transport,
                std::iter::empty(),
                &mut buffer,
                SAMPLE_RATE,
            );
        }
    }

    #[test]
    fn test_note_applied_before_containing_block() {
        let mut h = Harness::new();
        let [left, right] = h.run(&[TimedEvent::midi(10, &NOTE_ON)], 64);

        assert_eq!(
            h.engine.calls,
            vec![Call::NoteOn(0, 60, 100), Call::ProcessBlock, Call::ProcessBlock]
        );
        assert_eq!(left[10], MockEngine::expected_sample(1, 0, 10));
        assert_eq!(right[40], MockEngine::expected_sample(2, 1, 8));
    }

    #[test]
    fn test_event_in_second_block() {
        let mut h = Harness::new();
        h.run(&[TimedEvent::midi(40, &NOTE_ON)], 64);

        assert_eq!(
            h.engine.calls,
            vec![Call::ProcessBlock, Call::NoteOn(0, 60, 100), Call::ProcessBlock]
        );
    }

    #[test]
    fn test_event_on_boundary_belongs_to_next_block() {
        let mut h = Harness::new();
        h.run(
            &[TimedEvent::midi(31, &NOTE_ON), TimedEvent::midi(32, &NOTE_OFF)],
            64,
        );

        assert_eq!(
            h.engine.calls,
            vec![
                Call::NoteOn(0, 60, 100),
                Call::ProcessBlock,
                Call::NoteOff(0, 60, 0),
                Call::ProcessBlock,
            ]
        );
    }

    #[test]
    fn test_same_offset_keeps_host_order() {
        let mut h = Harness::new();
        h.run(
            &[
                TimedEvent::midi(0, &NOTE_ON),
                TimedEvent::midi(0, &NOTE_OFF),
                TimedEvent::midi(0, &[0xE3, 0x7F, 0x7F]),
            ],
            8,
        );

        assert_eq!(
            h.engine.calls,
            vec![
                Call::NoteOn(0, 60, 100),
                Call::NoteOff(0, 60, 0),
                Call::PitchBend(3, 8191),
                Call::ProcessBlock,
            ]
        );
    }

    #[test]
    fn test_events_past_cycle_end_applied_after_loop() {
        let mut h = Harness::new();
        h.run(
            &[
                TimedEvent::midi(5, &NOTE_ON),
                TimedEvent::midi(16, &NOTE_OFF),
                TimedEvent::midi(20, &CC_ALL_OFF),
            ],
            16,
        );

        assert_eq!(
            h.engine.calls,
            vec![
                Call::NoteOn(0, 60, 100),
                Call::ProcessBlock,
                Call::NoteOff(0, 60, 0),
                Call::AllNotesOff,
            ]
        );
    }

    #[test]
    fn test_every_event_applied_exactly_once() {
        let mut h = Harness::new();
        let events: Vec<TimedEvent<'_>> = (0..100)
            .map(|frame| TimedEvent::midi(frame, &NOTE_ON))
            .collect();
        h.run(&events, 70);

        let notes = h
            .engine
            .calls
            .iter()
            .filter(|c| **c == Call::NoteOn(0, 60, 100))
            .count();
        assert_eq!(notes, 100);
        assert_eq!(h.engine.block_count(), 3);
    }

    #[test]
    fn test_zero_samples_still_applies_events() {
        let mut h = Harness::new();
        let [left, _] = h.run(&[TimedEvent::midi(0, &NOTE_ON)], 0);

        assert!(left.is_empty());
        assert_eq!(h.engine.calls, vec![Call::NoteOn(0, 60, 100)]);
        assert_eq!(h.scheduler.position(), 0);
    }

    #[test]
    fn test_phase_persists_across_calls() {
        let mut h = Harness::new();
        h.run(&[], 1);
        assert_eq!(h.scheduler.position(), 1);
        h.run(&[], 1);
        assert_eq!(h.scheduler.position(), 2);
        assert_eq!(h.engine.block_count(), 1);
    }

    #[test]
    fn test_phase_wraps() {
        let mut h = Harness::new();
        h.run(&[], BLOCK);
        assert_eq!(h.scheduler.position(), 0);
        h.run(&[], BLOCK + 5);
        assert_eq!(h.scheduler.position(), 5);
        assert_eq!(h.engine.block_count(), 3);
    }

    #[test]
    fn test_single_sample_cycles_match_one_large_cycle() {
        let total = BLOCK + 3;

        let mut chunked = Harness::new();
        let mut chunked_left = Vec::new();
        for _ in 0..total {
            let [left, _] = chunked.run(&[], 1);
            chunked_left.extend(left);
        }

        let mut whole = Harness::new();
        let [whole_left, _] = whole.run(&[], total);

        assert_eq!(chunked_left, whole_left);
        assert_eq!(chunked.scheduler.position(), whole.scheduler.position());
        assert_eq!(chunked.engine.block_count(), whole.engine.block_count());
    }

    #[test]
    fn test_output_follows_sub_block_grid() {
        let mut h = Harness::new();
        h.run(&[], 20);
        let [left, right] = h.run(&[], 20);

        // Second cycle starts at phase 20 of block 1; block 2 begins at i = 12.
        assert_eq!(left[0], MockEngine::expected_sample(1, 0, 20));
        assert_eq!(left[11], MockEngine::expected_sample(1, 0, 31));
        assert_eq!(left[12], MockEngine::expected_sample(2, 0, 0));
        assert_eq!(right[19], MockEngine::expected_sample(2, 1, 7));
    }

    #[test]
    fn test_event_in_already_rendered_block_waits_for_boundary() {
        let mut h = Harness::new();
        h.run(&[], 20);
        h.engine.calls.clear();

        h.run(&[TimedEvent::midi(5, &NOTE_ON)], 20);
        assert_eq!(
            h.engine.calls,
            vec![Call::NoteOn(0, 60, 100), Call::ProcessBlock]
        );
    }

    #[test]
    fn test_event_without_boundary_applied_after_loop() {
        let mut h = Harness::new();
        h.run(&[], 5);
        h.engine.calls.clear();

        h.run(&[TimedEvent::midi(0, &NOTE_ON)], 1);
        assert_eq!(h.engine.calls, vec![Call::NoteOn(0, 60, 100)]);
    }

    #[test]
    fn test_transport_event_updates_state() {
        let mut h = Harness::new();
        let position = PositionPayload {
            speed: Some(NumericValue::Float(1.0)),
            tempo: Some(NumericValue::Double(140.0)),
            beat: Some(NumericValue::Long(12)),
        };
        h.run(&[TimedEvent::position(3, position)], 8);

        assert!(h.transport.is_playing());
        assert_eq!(h.transport.tempo(), 140.0);
        assert_eq!(h.transport.beat(), 12.0);
        assert_eq!(h.engine.calls, vec![Call::ProcessBlock]);
    }

    #[test]
    fn test_beat_advances_per_block() {
        let mut h = Harness::new();
        h.engine.time.tempo = 120.0;
        h.run(&[], 2 * BLOCK);

        let step = BLOCK as f64 * 120.0 / (60.0 * SAMPLE_RATE);
        assert_eq!(h.engine.block_beats.len(), 2);
        assert!((h.engine.block_beats[0] - step).abs() < 1e-12);
        assert!((h.engine.block_beats[1] - 2.0 * step).abs() < 1e-12);
    }

    #[test]
    fn test_beat_frozen_at_zero_tempo() {
        let mut h = Harness::new();
        h.engine.time.tempo = 0.0;
        h.engine.time.beat_position = 7.0;
        h.run(&[], 3 * BLOCK);
        assert_eq!(h.engine.time.beat_position, 7.0);
    }

    #[test]
    fn test_input_forwarding() {
        let mut h = Harness::new();
        h.engine.accepts_input = true;

        let ramp: Vec<f32> = (0..2 * BLOCK).map(|i| i as f32).collect();
        h.run_with_input(&ramp);
        h.run_with_input(&[0.0]);

        // Block n is rendered from the input written during block n - 1.
        assert_eq!(h.engine.captured_inputs.len(), 3);
        assert_eq!(h.engine.captured_inputs[1][0], 0.0);
        assert_eq!(h.engine.captured_inputs[1][BLOCK - 1], (BLOCK - 1) as f32);
        assert_eq!(h.engine.captured_inputs[2][0], BLOCK as f32);
    }

    #[test]
    fn test_input_ignored_when_engine_declines() {
        let mut h = Harness::new();
        let ones = vec![1.0; 2 * BLOCK];
        h.run_with_input(&ones);
        h.run_with_input(&[0.0]);

        assert!(h
            .engine
            .captured_inputs
            .iter()
            .all(|block| block.iter().all(|s| *s == 0.0)));
    }

    #[test]
    fn test_unknown_events_are_skipped() {
        let mut h = Harness::new();
        h.run(
            &[
                TimedEvent::new(0, crate::event::EventPayload::Unknown),
                TimedEvent::midi(1, &[0xF8]),
                TimedEvent::midi(2, &NOTE_ON),
            ],
            4,
        );
        assert_eq!(
            h.engine.calls,
            vec![Call::NoteOn(0, 60, 100), Call::ProcessBlock]
        );
    }
}
