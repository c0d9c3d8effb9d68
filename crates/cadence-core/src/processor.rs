//! Processing core facade.
//!
//! [`Processor`] owns an engine together with the per-instance state the
//! format layer needs to drive it: the parameter cache, the transport cache
//! and the sub-block scheduler. A format adapter only has to translate its
//! host's buffers and events into a [`Buffer`] and an iterator of
//! [`TimedEvent`]s.

use log::debug;

use crate::buffer::Buffer;
use crate::engine::Engine;
use crate::error::{ProcessorError, ProcessorResult};
use crate::event::TimedEvent;
use crate::fpu::FpuGuard;
use crate::params::ParameterCache;
use crate::scheduler::BlockScheduler;
use crate::transport::TransportState;
use crate::types::MAX_CHANNELS;

/// Lifecycle of a processor instance.
///
/// ```text
/// Instantiated --activate--> Active <--deactivate/activate--> Inactive
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Instantiated,
    Active,
    Inactive,
}

/// Drives an [`Engine`] from host processing cycles.
pub struct Processor<E: Engine> {
    engine: E,
    sample_rate: f64,
    params: ParameterCache,
    transport: TransportState,
    scheduler: BlockScheduler,
    state: LifecycleState,
}

impl<E: Engine> Processor<E> {
    /// Set up a processor around `engine`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::InvalidSampleRate`] if `sample_rate` is not
    /// finite and positive, or [`ProcessorError::TooManyChannels`] if the
    /// engine declares more channels than [`MAX_CHANNELS`].
    pub fn new(mut engine: E, sample_rate: f64) -> ProcessorResult<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ProcessorError::InvalidSampleRate(sample_rate));
        }
        check_channel_count(E::NUM_INPUTS)?;
        check_channel_count(E::NUM_OUTPUTS)?;

        engine.set_sample_rate(sample_rate);

        debug!(
            "Processor created: sample_rate={}, block_size={}, inputs={}, outputs={}, params={}",
            sample_rate,
            E::BLOCK_SIZE,
            E::NUM_INPUTS,
            E::NUM_OUTPUTS,
            E::NUM_PARAMS
        );

        Ok(Self {
            engine,
            sample_rate,
            params: ParameterCache::new(E::NUM_PARAMS),
            transport: TransportState::new(),
            scheduler: BlockScheduler::new(),
            state: LifecycleState::Instantiated,
        })
    }

    /// Start (or restart) the stream.
    ///
    /// Resets the sub-block phase and reloads the parameter cache from the
    /// engine so the first cycle only forwards values the host changed.
    pub fn activate(&mut self) {
        self.scheduler.reset();
        self.params.resync(&self.engine);
        self.engine.set_active(true);
        self.state = LifecycleState::Active;
        debug!("Processor activated");
    }

    /// Run one host cycle.
    ///
    /// `controls` holds the current value of each host parameter slot in
    /// external order. `events` must be in host order.
    ///
    /// Real-time safe: no allocation, locking or logging.
    pub fn process<'e, I>(&mut self, controls: &[f32], events: I, buffer: &mut Buffer<'_>)
    where
        I: IntoIterator<Item = TimedEvent<'e>>,
    {
        debug_assert_eq!(
            self.state,
            LifecycleState::Active,
            "process() called on an inactive processor"
        );

        let _fpu = FpuGuard::enter();

        self.params.apply(controls, &mut self.engine);
        self.transport.sync_engine(self.engine.time_info_mut());
        self.scheduler.run(
            &mut self.engine,
            &mut self.transport,
            events,
            buffer,
            self.sample_rate,
        );
    }

    /// Stop the stream and silence every voice.
    pub fn deactivate(&mut self) {
        self.engine.all_notes_off();
        self.engine.set_active(false);
        self.state = LifecycleState::Inactive;
        debug!("Processor deactivated");
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[inline]
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn transport(&self) -> &TransportState {
        &self.transport
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Position within the engine's current sub-block.
    #[inline]
    pub fn block_position(&self) -> usize {
        self.scheduler.position()
    }
}

fn check_channel_count(requested: usize) -> ProcessorResult<()> {
    if requested > MAX_CHANNELS {
        return Err(ProcessorError::TooManyChannels {
            requested,
            max: MAX_CHANNELS,
        });
    }
    Ok(())
}
