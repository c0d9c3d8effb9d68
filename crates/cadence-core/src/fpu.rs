//! Scoped floating-point environment for the audio thread.
//!
//! Denormal arithmetic can be orders of magnitude slower than normal
//! arithmetic on some CPUs, which is enough to blow a real-time deadline when
//! a filter or envelope decays towards zero. [`FpuGuard`] switches the
//! current thread to flush-to-zero / denormals-are-zero with
//! round-to-nearest for the duration of a processing cycle and restores the
//! host's settings when dropped.
//!
//! | Target              | Register | Bits touched                       |
//! |---------------------|----------|------------------------------------|
//! | x86 (SSE) / x86_64  | MXCSR    | FTZ, DAZ, rounding, exception flags |
//! | aarch64             | FPCR     | FZ, RMode (flags cleared in FPSR)  |
//! | anything else       | none     | no-op                              |

/// RAII guard over the thread's floating-point control register.
///
/// ```ignore
/// let _guard = FpuGuard::enter();
/// // denormals flush to zero until `_guard` goes out of scope
/// ```
#[must_use = "the previous FPU state is restored when the guard is dropped"]
pub struct FpuGuard {
    saved: u64,
}

impl FpuGuard {
    /// Save the current register and install the audio-thread mode.
    #[inline]
    pub fn enter() -> Self {
        let saved = imp::read();
        imp::write(imp::audio_mode(saved));
        imp::clear_flags();
        Self { saved }
    }

    /// The register value that will be restored on drop.
    #[inline]
    pub fn saved_state(&self) -> u64 {
        self.saved
    }

    /// The thread's current control register (0 on unsupported targets).
    #[inline]
    pub fn current_state() -> u64 {
        imp::read()
    }

    /// Returns true if the thread currently flushes denormals to zero.
    #[inline]
    pub fn flushes_denormals() -> bool {
        imp::is_flushing(imp::read())
    }
}

impl Drop for FpuGuard {
    #[inline]
    fn drop(&mut self) {
        imp::write(self.saved);
    }
}

// =============================================================================
// x86 / x86_64
// =============================================================================

#[cfg(any(
    target_arch = "x86_64",
    all(target_arch = "x86", target_feature = "sse")
))]
mod imp {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::{_mm_getcsr, _mm_setcsr};
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::{_mm_getcsr, _mm_setcsr};

    pub(super) const FLUSH_TO_ZERO: u64 = 1 << 15;
    pub(super) const DENORMALS_ARE_ZERO: u64 = 1 << 6;
    const ROUNDING_MASK: u64 = 0b11 << 13;
    const EXCEPTION_FLAGS: u64 = 0x3F;

    pub(super) fn is_flushing(current: u64) -> bool {
        current & FLUSH_TO_ZERO != 0
    }

    pub(super) fn audio_mode(current: u64) -> u64 {
        (current | FLUSH_TO_ZERO | DENORMALS_ARE_ZERO) & !ROUNDING_MASK & !EXCEPTION_FLAGS
    }

    #[inline]
    #[allow(deprecated)]
    pub(super) fn read() -> u64 {
        // SAFETY: SSE is available on every target this module compiles for.
        let csr = unsafe { _mm_getcsr() };
        csr as u64
    }

    #[inline]
    #[allow(deprecated)]
    pub(super) fn write(value: u64) {
        // SAFETY: `value` is a previously read MXCSR with at most the mode
        // and flag bits changed, so reserved bits are preserved.
        unsafe { _mm_setcsr(value as u32) };
    }

    /// Flags live in MXCSR itself and are cleared by `audio_mode`.
    #[inline]
    pub(super) fn clear_flags() {}
}

// =============================================================================
// aarch64
// =============================================================================

#[cfg(target_arch = "aarch64")]
mod imp {
    use std::arch::asm;

    pub(super) const FLUSH_TO_ZERO: u64 = 1 << 24;
    const ROUNDING_MASK: u64 = 0b11 << 22;

    pub(super) fn is_flushing(current: u64) -> bool {
        current & FLUSH_TO_ZERO != 0
    }

    pub(super) fn audio_mode(current: u64) -> u64 {
        (current | FLUSH_TO_ZERO) & !ROUNDING_MASK
    }

    #[inline]
    pub(super) fn read() -> u64 {
        let fpcr: u64;
        // SAFETY: reading FPCR has no side effects.
        unsafe { asm!("mrs {}, fpcr", out(reg) fpcr, options(nomem, nostack, preserves_flags)) };
        fpcr
    }

    #[inline]
    pub(super) fn write(value: u64) {
        // SAFETY: only mode bits differ from a value read from FPCR.
        unsafe { asm!("msr fpcr, {}", in(reg) value, options(nomem, nostack, preserves_flags)) };
    }

    #[inline]
    pub(super) fn clear_flags() {
        // SAFETY: FPSR only holds cumulative status flags.
        unsafe { asm!("msr fpsr, {}", in(reg) 0u64, options(nomem, nostack, preserves_flags)) };
    }
}

// =============================================================================
// Fallback
// =============================================================================

#[cfg(not(any(
    target_arch = "x86_64",
    all(target_arch = "x86", target_feature = "sse"),
    target_arch = "aarch64"
)))]
mod imp {
    pub(super) fn is_flushing(_current: u64) -> bool {
        false
    }

    pub(super) fn audio_mode(current: u64) -> u64 {
        current
    }

    pub(super) fn read() -> u64 {
        0
    }

    pub(super) fn write(_value: u64) {}

    pub(super) fn clear_flags() {}
}
