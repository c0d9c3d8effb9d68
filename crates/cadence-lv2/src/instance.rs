//! Per-instance LV2 state.
//!
//! An [`Lv2Instance`] owns the processor, the resolved URIDs and the port
//! bindings the host makes through `connect_port`. Each `run` snapshots the
//! control ports, wraps the audio ports in a [`Buffer`] and feeds the event
//! sequence to the processor.

use std::ffi::c_void;
use std::ptr;
use std::slice;

use log::warn;

use cadence_core::{Buffer, Engine, FpuGuard, Processor};

use crate::atom::{to_timed_event, SequenceIter};
use crate::error::Lv2Result;
use crate::sys::Lv2AtomSequence;
use crate::urid::Urids;

/// What a port index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Continuous parameter, by external index.
    Control(usize),
    /// The `atom:Sequence` event input.
    Events,
    AudioInput(usize),
    AudioOutput(usize),
}

/// Port numbering for an engine.
///
/// ```text
/// 0 .. N        control ports (one per parameter)
/// N             event input
/// N+1 .. N+1+I  audio inputs
/// ..            audio outputs
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortLayout {
    pub num_params: usize,
    pub num_inputs: usize,
    pub num_outputs: usize,
}

impl PortLayout {
    pub const fn of<E: Engine>() -> Self {
        Self {
            num_params: E::NUM_PARAMS,
            num_inputs: E::NUM_INPUTS,
            num_outputs: E::NUM_OUTPUTS,
        }
    }

    #[inline]
    pub const fn events(&self) -> usize {
        self.num_params
    }

    #[inline]
    pub const fn first_input(&self) -> usize {
        self.num_params + 1
    }

    #[inline]
    pub const fn first_output(&self) -> usize {
        self.first_input() + self.num_inputs
    }

    /// Total number of ports.
    #[inline]
    pub const fn len(&self) -> usize {
        self.first_output() + self.num_outputs
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self, port: usize) -> Option<PortKind> {
        if port < self.events() {
            Some(PortKind::Control(port))
        } else if port == self.events() {
            Some(PortKind::Events)
        } else if port < self.first_output() {
            Some(PortKind::AudioInput(port - self.first_input()))
        } else if port < self.len() {
            Some(PortKind::AudioOutput(port - self.first_output()))
        } else {
            None
        }
    }
}

/// The object behind an `LV2_Handle`.
pub struct Lv2Instance<E: Engine> {
    processor: Processor<E>,
    urids: Urids,
    layout: PortLayout,
    ports: Vec<*mut c_void>,
    /// Last value read from each control port.
    controls: Vec<f32>,
}

impl<E: Engine> Lv2Instance<E> {
    /// Create an instance with every port unbound.
    pub fn new(engine: E, sample_rate: f64, urids: Urids) -> Lv2Result<Self> {
        let processor = Processor::new(engine, sample_rate)?;
        let layout = PortLayout::of::<E>();

        let mut controls = vec![0.0; layout.num_params];
        for (external, value) in controls.iter_mut().enumerate() {
            *value = processor
                .engine()
                .parameter(E::remap_external_to_internal(external));
        }

        Ok(Self {
            processor,
            urids,
            layout,
            ports: vec![ptr::null_mut(); layout.len()],
            controls,
        })
    }

    #[inline]
    pub fn layout(&self) -> PortLayout {
        self.layout
    }

    #[inline]
    pub fn processor(&self) -> &Processor<E> {
        &self.processor
    }

    #[inline]
    pub fn processor_mut(&mut self) -> &mut Processor<E> {
        &mut self.processor
    }

    /// Bind `port` to host memory. Unknown ports are ignored.
    pub fn connect_port(&mut self, port: u32, data: *mut c_void) {
        match self.ports.get_mut(port as usize) {
            Some(slot) => *slot = data,
            None => warn!(
                "connect_port: port {} out of range (plugin has {} ports)",
                port,
                self.layout.len()
            ),
        }
    }

    pub fn activate(&mut self) {
        self.processor.activate();
    }

    pub fn deactivate(&mut self) {
        self.processor.deactivate();
    }

    /// Process `sample_count` frames.
    ///
    /// # Safety
    ///
    /// Every control, event and output port must be bound to memory valid
    /// for this call (control ports to one `f32`, audio ports to at least
    /// `sample_count` samples). Audio inputs may be null.
    pub unsafe fn run(&mut self, sample_count: u32) {
        // Held over the port reads too; `Processor::process` nests its own.
        let _fpu = FpuGuard::enter();

        let num_samples = sample_count as usize;
        let layout = self.layout;
        let ports = &self.ports;

        for (value, &port) in self.controls.iter_mut().zip(&ports[..layout.num_params]) {
            if !port.is_null() {
                // SAFETY: control ports point to a single f32.
                *value = unsafe { *(port as *const f32) };
            }
        }

        let input_ports = &ports[layout.first_input()..layout.first_output()];
        let forward = input_ports.iter().all(|p| !p.is_null());
        let inputs = input_ports
            .iter()
            .take(if forward { layout.num_inputs } else { 0 })
            .map(|&port| {
                // SAFETY: non-null input ports hold `num_samples` samples.
                Some(unsafe { slice::from_raw_parts(port as *const f32, num_samples) })
            });

        let outputs = ports[layout.first_output()..].iter().map(|&port| {
            let port = port as *mut f32;
            // SAFETY: bound output ports hold `num_samples` samples and do
            // not alias any input the engine reads within one sample.
            (!port.is_null()).then(|| unsafe { slice::from_raw_parts_mut(port, num_samples) })
        });

        let mut buffer = Buffer::from_slots(inputs, outputs, num_samples);

        let urids = self.urids;
        let sequence = ports[layout.events()] as *const Lv2AtomSequence;
        // SAFETY: the event port holds a sequence atom for this cycle, or is null.
        let events = unsafe { SequenceIter::from_raw(sequence) }
            .map(move |event| to_timed_event(event, &urids));

        self.processor.process(&self.controls, events, &mut buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::testing::SequenceBuilder;
    use crate::test_support::{TestSynth, BLOCK};
    use crate::urid::testing::TestMap;
    use crate::urid::{UridMapper, Urids};

    struct Ports {
        controls: [f32; 2],
        sequence: Vec<u64>,
        input: Vec<f32>,
        left: Vec<f32>,
        right: Vec<f32>,
    }

    impl Ports {
        fn new(n: usize, sequence: Vec<u64>) -> Self {
            Self {
                // Engine defaults in external order.
                controls: [0.75, 0.25],
                sequence,
                input: vec![1.0; n],
                left: vec![0.0; n],
                right: vec![0.0; n],
            }
        }

        fn connect(&mut self, instance: &mut Lv2Instance<TestSynth>, with_input: bool) {
            instance.connect_port(0, &mut self.controls[0] as *mut f32 as *mut c_void);
            instance.connect_port(1, &mut self.controls[1] as *mut f32 as *mut c_void);
            instance.connect_port(2, self.sequence.as_mut_ptr() as *mut c_void);
            let input = if with_input {
                self.input.as_mut_ptr() as *mut c_void
            } else {
                ptr::null_mut()
            };
            instance.connect_port(3, input);
            instance.connect_port(4, self.left.as_mut_ptr() as *mut c_void);
            instance.connect_port(5, self.right.as_mut_ptr() as *mut c_void);
        }
    }

    fn instance(map: &TestMap) -> (Lv2Instance<TestSynth>, Urids) {
        let raw = map.feature();
        let urids = Urids::from_map(&UridMapper::new(&raw).unwrap());
        let instance = Lv2Instance::new(TestSynth::default(), 48_000.0, urids).unwrap();
        (instance, urids)
    }

    #[test]
    fn test_port_layout() {
        let layout = PortLayout::of::<TestSynth>();
        assert_eq!(layout.len(), 6);
        assert_eq!(layout.kind(0), Some(PortKind::Control(0)));
        assert_eq!(layout.kind(1), Some(PortKind::Control(1)));
        assert_eq!(layout.kind(2), Some(PortKind::Events));
        assert_eq!(layout.kind(3), Some(PortKind::AudioInput(0)));
        assert_eq!(layout.kind(4), Some(PortKind::AudioOutput(0)));
        assert_eq!(layout.kind(5), Some(PortKind::AudioOutput(1)));
        assert_eq!(layout.kind(6), None);
    }

    #[test]
    fn test_invalid_sample_rate() {
        let map = TestMap::default();
        let raw = map.feature();
        let urids = Urids::from_map(&UridMapper::new(&raw).unwrap());
        assert!(Lv2Instance::new(TestSynth::default(), 0.0, urids).is_err());
    }

    #[test]
    fn test_out_of_range_port_ignored() {
        let map = TestMap::default();
        let (mut instance, _) = instance(&map);
        let mut value = 0.0f32;
        instance.connect_port(99, &mut value as *mut f32 as *mut c_void);
        assert_eq!(instance.ports.len(), 6);
    }

    #[test]
    fn test_run_renders_notes_and_parameters() {
        let map = TestMap::default();
        let (mut instance, urids) = instance(&map);
        let sequence = SequenceBuilder::default()
            .event(4, urids.midi_event, &[0x90, 60, 100])
            .build(0);
        let mut ports = Ports::new(2 * BLOCK, sequence);
        ports.connect(&mut instance, true);
        ports.controls[0] = 0.5;

        instance.activate();
        // SAFETY: every port is bound to live memory of the right size.
        unsafe { instance.run(2 * BLOCK as u32) };

        let engine = instance.processor().engine();
        assert_eq!(engine.notes, vec![(0, 60, 100)]);
        // External 0 maps to internal 1.
        assert_eq!(engine.params, [0.25, 0.5]);
        assert_eq!(engine.blocks, 2);
        assert!(ports.left.iter().all(|s| *s == 1.0));
        assert!(ports.right.iter().all(|s| *s == 1.5));
    }

    #[test]
    fn test_unconnected_input_disables_forwarding() {
        let map = TestMap::default();
        let (mut instance, urids) = instance(&map);
        let sequence = SequenceBuilder::default().build(urids.atom_int);

        let mut ports = Ports::new(2 * BLOCK, sequence.clone());
        ports.connect(&mut instance, false);
        instance.activate();
        // SAFETY: bound ports are valid; the input is deliberately null.
        unsafe { instance.run(2 * BLOCK as u32) };
        assert_eq!(instance.processor().engine().input_sums, vec![0.0, 0.0]);

        let map = TestMap::default();
        let (mut instance, _) = self::instance(&map);
        let mut ports = Ports::new(2 * BLOCK, sequence);
        ports.connect(&mut instance, true);
        instance.activate();
        // SAFETY: every port is bound.
        unsafe { instance.run(2 * BLOCK as u32) };
        assert_eq!(
            instance.processor().engine().input_sums,
            vec![0.0, BLOCK as f32]
        );
    }

    #[test]
    fn test_null_event_port_is_empty_sequence() {
        let map = TestMap::default();
        let (mut instance, _) = instance(&map);
        let mut ports = Ports::new(BLOCK, Vec::new());
        ports.connect(&mut instance, true);
        instance.connect_port(2, ptr::null_mut());

        instance.activate();
        // SAFETY: the event port is null, which reads as no events.
        unsafe { instance.run(BLOCK as u32) };
        assert_eq!(instance.processor().engine().blocks, 1);
    }

    #[test]
    fn test_run_restores_fpu_state() {
        let map = TestMap::default();
        let (mut instance, _) = instance(&map);
        let mut ports = Ports::new(2 * BLOCK, Vec::new());
        ports.connect(&mut instance, true);
        instance.connect_port(2, ptr::null_mut());
        let before = FpuGuard::current_state();

        instance.activate();
        // SAFETY: every port is bound; the event port reads as no events.
        unsafe { instance.run(2 * BLOCK as u32) };

        assert_eq!(FpuGuard::current_state(), before);
        let flushing = &instance.processor().engine().block_flushing;
        assert_eq!(flushing.len(), 2);
        if cfg!(any(target_arch = "x86_64", target_arch = "aarch64")) {
            assert!(flushing.iter().all(|&f| f));
        }
    }
}
