//! LV2 descriptor table and C-ABI entry points.
//!
//! ```text
//! LV2 host
//!    │  lv2_descriptor(0)           (generated by export_lv2!)
//!    ▼
//! DescriptorTable (OnceLock, built on first lookup)
//!    │  instantiate / connect_port / activate / run / deactivate / cleanup
//!    ▼
//! Lv2Instance<E> ──► Processor<E> ──► E
//! ```
//!
//! # Safety
//!
//! Every entry point wraps its body in `catch_unwind` so a panic never
//! crosses the FFI boundary. A panicking `run` leaves the output ports as
//! far as they were written. Handles are checked for null before use; the
//! `LV2_Handle` is cast back to `Lv2Instance<E>` only in this module.

use std::ffi::{c_char, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::sync::OnceLock;

use log::{debug, error};

use cadence_core::Engine;

use crate::config::Lv2Config;
use crate::error::Lv2Result;
use crate::instance::Lv2Instance;
use crate::sys::{self, Lv2Descriptor, Lv2Feature, Lv2UridMap, LV2_Handle};
use crate::urid::{require_feature, UridMapper, Urids};

// =============================================================================
// Descriptor Table
// =============================================================================

/// The plugin's descriptor together with its configuration.
pub struct DescriptorTable {
    descriptor: Lv2Descriptor,
    config: &'static Lv2Config,
}

// SAFETY: the table is immutable once built; its pointers refer to the
// 'static config URI and to functions.
unsafe impl Send for DescriptorTable {}
// SAFETY: see above.
unsafe impl Sync for DescriptorTable {}

impl DescriptorTable {
    pub fn new<E: Engine + Default>(config: &'static Lv2Config) -> Self {
        Self {
            descriptor: Lv2Descriptor {
                uri: config.uri.as_ptr(),
                instantiate: Some(instantiate::<E>),
                connect_port: Some(connect_port::<E>),
                activate: Some(activate::<E>),
                run: Some(run::<E>),
                deactivate: Some(deactivate::<E>),
                cleanup: Some(cleanup::<E>),
                extension_data: Some(extension_data),
            },
            config,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &Lv2Descriptor {
        &self.descriptor
    }

    #[inline]
    pub fn config(&self) -> &'static Lv2Config {
        self.config
    }
}

/// Process-wide table; one plugin per binary.
static TABLE: OnceLock<DescriptorTable> = OnceLock::new();

/// Look up descriptor `index`, building the table on first use.
///
/// Only index 0 exists. Called by the `lv2_descriptor` symbol that
/// [`export_lv2!`](crate::export_lv2) generates.
pub fn lv2_descriptor<E: Engine + Default>(
    config: &'static Lv2Config,
    index: u32,
) -> *const Lv2Descriptor {
    if index != 0 {
        return ptr::null();
    }

    let table = TABLE.get_or_init(|| {
        debug!("LV2 descriptor table built for {}", config.display_name());
        DescriptorTable::new::<E>(config)
    });
    table.descriptor()
}

fn plugin_name() -> &'static str {
    TABLE
        .get()
        .map(|table| table.config().display_name())
        .unwrap_or("cadence plugin")
}

// =============================================================================
// Instance Lifecycle
// =============================================================================

/// # Safety
///
/// `features` must be a null-terminated feature array (or null).
unsafe fn create<E: Engine + Default>(
    sample_rate: f64,
    features: *const *const Lv2Feature,
) -> Lv2Result<Lv2Instance<E>> {
    // SAFETY: forwarded caller contract.
    let map = unsafe { require_feature(features, sys::LV2_URID_MAP, "urid:map") }?;
    // SAFETY: the `urid:map` feature data is an `LV2_URID_Map` that outlives
    // instantiation.
    let map = unsafe { map.cast::<Lv2UridMap>().as_ref() };
    let urids = Urids::from_map(&UridMapper::new(map)?);

    Lv2Instance::new(E::default(), sample_rate, urids)
}

/// Create an instance.
///
/// # Safety
///
/// `features` must be a null-terminated array of valid features (or null).
/// Returns null on failure.
pub unsafe extern "C" fn instantiate<E: Engine + Default>(
    _descriptor: *const Lv2Descriptor,
    sample_rate: f64,
    _bundle_path: *const c_char,
    features: *const *const Lv2Feature,
) -> LV2_Handle {
    // SAFETY: forwarded caller contract.
    let result = catch_unwind(AssertUnwindSafe(|| unsafe { create::<E>(sample_rate, features) }));

    match result {
        Ok(Ok(instance)) => {
            debug!("{}: instantiated at {} Hz", plugin_name(), sample_rate);
            Box::into_raw(Box::new(instance)) as LV2_Handle
        }
        Ok(Err(err)) => {
            error!("{}: instantiate failed: {}", plugin_name(), err);
            ptr::null_mut()
        }
        Err(_) => {
            error!("{}: panic during instantiate", plugin_name());
            ptr::null_mut()
        }
    }
}

/// Bind a port.
///
/// # Safety
///
/// `instance` must be null or a handle returned by [`instantiate`] for the
/// same engine type.
pub unsafe extern "C" fn connect_port<E: Engine>(instance: LV2_Handle, port: u32, data: *mut c_void) {
    if instance.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: caller guarantees a live handle of this type.
        let instance = unsafe { &mut *(instance as *mut Lv2Instance<E>) };
        instance.connect_port(port, data);
    }));
}

/// # Safety
///
/// Same contract as [`connect_port`].
pub unsafe extern "C" fn activate<E: Engine>(instance: LV2_Handle) {
    if instance.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: caller guarantees a live handle of this type.
        let instance = unsafe { &mut *(instance as *mut Lv2Instance<E>) };
        instance.activate();
    }));
}

/// Process one cycle.
///
/// # Safety
///
/// Same contract as [`connect_port`], plus the port contract of
/// [`Lv2Instance::run`].
pub unsafe extern "C" fn run<E: Engine>(instance: LV2_Handle, sample_count: u32) {
    if instance.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: caller guarantees a live handle of this type.
        let instance = unsafe { &mut *(instance as *mut Lv2Instance<E>) };
        // SAFETY: the host has bound every required port for this cycle.
        unsafe { instance.run(sample_count) };
    }));
}

/// # Safety
///
/// Same contract as [`connect_port`].
pub unsafe extern "C" fn deactivate<E: Engine>(instance: LV2_Handle) {
    if instance.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: caller guarantees a live handle of this type.
        let instance = unsafe { &mut *(instance as *mut Lv2Instance<E>) };
        instance.deactivate();
    }));
}

/// Destroy an instance.
///
/// # Safety
///
/// Same contract as [`connect_port`]; the handle is invalid afterwards.
pub unsafe extern "C" fn cleanup<E: Engine>(instance: LV2_Handle) {
    if instance.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: the handle came from `Box::into_raw` in `instantiate`.
        drop(unsafe { Box::from_raw(instance as *mut Lv2Instance<E>) });
    }));
}

/// No extensions are provided.
///
/// # Safety
///
/// `uri` is not read.
pub unsafe extern "C" fn extension_data(_uri: *const c_char) -> *const c_void {
    ptr::null()
}
