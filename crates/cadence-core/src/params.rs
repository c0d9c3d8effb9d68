//! Continuous parameter diffing.
//!
//! Hosts expose each engine parameter as a control port whose value is
//! re-read every cycle. Writing every value into the engine each cycle would
//! retrigger parameter-change handling needlessly, so [`ParameterCache`]
//! remembers the last value forwarded for each slot and only writes the
//! ones that changed.

use crate::engine::Engine;
use crate::types::ExternalParamIndex;

/// Last value forwarded to the engine, per host parameter slot.
///
/// The cache is sized once during setup; [`ParameterCache::apply`] never
/// allocates.
#[derive(Debug, Clone)]
pub struct ParameterCache {
    previous: Vec<f32>,
}

impl ParameterCache {
    /// Create a cache for `len` slots, all zero.
    pub fn new(len: usize) -> Self {
        Self {
            previous: vec![0.0; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.previous.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    /// Cached value for a host slot.
    #[inline]
    pub fn get(&self, index: ExternalParamIndex) -> Option<f32> {
        self.previous.get(index).copied()
    }

    /// Reload every slot from the engine's current values.
    ///
    /// Called at stream start so that the first cycle does not re-apply
    /// values the engine already holds.
    pub fn resync<E: Engine>(&mut self, engine: &E) {
        for (external, cached) in self.previous.iter_mut().enumerate() {
            *cached = engine.parameter(E::remap_external_to_internal(external));
        }
    }

    /// Forward changed slot values to the engine.
    ///
    /// Comparison is exact (`!=`), so a NaN slot value is forwarded every
    /// cycle. Returns the number of parameters written.
    pub fn apply<E: Engine>(&mut self, values: &[f32], engine: &mut E) -> usize {
        let mut written = 0;
        for (external, (cached, &value)) in self.previous.iter_mut().zip(values).enumerate() {
            if value != *cached {
                engine.set_parameter(E::remap_external_to_internal(external), value);
                *cached = value;
                written += 1;
            }
        }
        written
    }
}
