//! # cadence-lv2
//!
//! LV2 adapter for the Cadence processing core.
//!
//! This crate exposes an [`Engine`](cadence_core::Engine) as an LV2 plugin:
//! it owns the C ABI descriptor, negotiates the `urid:map` feature, binds
//! ports, parses the host's atom event sequence and drives a
//! [`Processor`](cadence_core::Processor) from `run`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cadence_lv2::{export_lv2, Lv2Config};
//!
//! static CONFIG: Lv2Config = Lv2Config::new(c"https://example.com/plugins/synth")
//!     .with_name("Example Synth");
//!
//! export_lv2!(CONFIG, MySynth);
//! ```
//!
//! The bundle's Turtle must declare ports in [`PortLayout`] order.

pub mod atom;
pub mod config;
pub mod descriptor;
pub mod error;
mod export;
pub mod instance;
pub mod sys;
pub mod urid;

#[cfg(test)]
mod test_support;

pub use config::Lv2Config;
pub use descriptor::{lv2_descriptor, DescriptorTable};
pub use error::{Lv2Error, Lv2Result};
pub use instance::{Lv2Instance, PortKind, PortLayout};
pub use urid::{Uri, Urids};
