//! LV2 plugin configuration.

use std::ffi::CStr;

/// Static description of an exported LV2 plugin.
///
/// # Example
///
/// ```ignore
/// use cadence_lv2::Lv2Config;
///
/// static CONFIG: Lv2Config = Lv2Config::new(c"https://example.com/plugins/synth")
///     .with_name("Example Synth");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Lv2Config {
    /// Plugin URI; must match the `lv2:Plugin` subject in the bundle's Turtle.
    pub uri: &'static CStr,
    /// Human-readable name, used in log messages.
    pub name: &'static str,
}

impl Lv2Config {
    pub const fn new(uri: &'static CStr) -> Self {
        Self { uri, name: "" }
    }

    pub const fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Name for log messages, falling back to the URI.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.uri.to_str().unwrap_or("<non-UTF-8 URI>")
        } else {
            self.name
        }
    }
}
