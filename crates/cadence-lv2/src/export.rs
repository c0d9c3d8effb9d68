//! Export macro for LV2 plugins.

/// Generate the `lv2_descriptor` entry point for an engine.
///
/// The engine type must implement [`cadence_core::Engine`] and [`Default`];
/// a fresh engine is built for every host instance. Only one plugin may be
/// exported per binary.
///
/// # Example
///
/// ```rust,ignore
/// use cadence_lv2::{export_lv2, Lv2Config};
///
/// static CONFIG: Lv2Config = Lv2Config::new(c"https://example.com/plugins/synth")
///     .with_name("Example Synth");
///
/// export_lv2!(CONFIG, MySynth);
/// ```
#[macro_export]
macro_rules! export_lv2 {
    ($config:expr, $engine:ty) => {
        /// LV2 discovery entry point.
        #[no_mangle]
        pub extern "C" fn lv2_descriptor(index: u32) -> *const $crate::sys::Lv2Descriptor {
            $crate::descriptor::lv2_descriptor::<$engine>(&$config, index)
        }
    };
}
