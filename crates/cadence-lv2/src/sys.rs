//! LV2 C ABI definitions.
//!
//! Hand-written `#[repr(C)]` mirrors of the LV2 core, URID and atom headers.
//! Only the parts this crate touches are defined. Layouts must match
//! `lv2/core/lv2.h`, `lv2/urid/urid.h` and `lv2/atom/atom.h` exactly.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_void, CStr};

// =============================================================================
// URIs
// =============================================================================

pub const LV2_URID_MAP: &CStr = c"http://lv2plug.in/ns/ext/urid#map";

pub const LV2_MIDI_MIDI_EVENT: &CStr = c"http://lv2plug.in/ns/ext/midi#MidiEvent";

pub const LV2_ATOM_BLANK: &CStr = c"http://lv2plug.in/ns/ext/atom#Blank";
pub const LV2_ATOM_OBJECT: &CStr = c"http://lv2plug.in/ns/ext/atom#Object";
pub const LV2_ATOM_DOUBLE: &CStr = c"http://lv2plug.in/ns/ext/atom#Double";
pub const LV2_ATOM_FLOAT: &CStr = c"http://lv2plug.in/ns/ext/atom#Float";
pub const LV2_ATOM_INT: &CStr = c"http://lv2plug.in/ns/ext/atom#Int";
pub const LV2_ATOM_LONG: &CStr = c"http://lv2plug.in/ns/ext/atom#Long";

pub const LV2_TIME_POSITION: &CStr = c"http://lv2plug.in/ns/ext/time#Position";
pub const LV2_TIME_BEATS_PER_MINUTE: &CStr = c"http://lv2plug.in/ns/ext/time#beatsPerMinute";
pub const LV2_TIME_SPEED: &CStr = c"http://lv2plug.in/ns/ext/time#speed";
pub const LV2_TIME_BEAT: &CStr = c"http://lv2plug.in/ns/ext/time#beat";

// =============================================================================
// Core (lv2.h)
// =============================================================================

/// Opaque plugin instance pointer handed to the host.
pub type LV2_Handle = *mut c_void;

/// A host feature (matches `LV2_Feature`).
#[repr(C)]
#[derive(Debug)]
pub struct Lv2Feature {
    pub uri: *const c_char,
    pub data: *mut c_void,
}

pub type InstantiateFn = unsafe extern "C" fn(
    descriptor: *const Lv2Descriptor,
    sample_rate: f64,
    bundle_path: *const c_char,
    features: *const *const Lv2Feature,
) -> LV2_Handle;
pub type ConnectPortFn = unsafe extern "C" fn(instance: LV2_Handle, port: u32, data: *mut c_void);
pub type InstanceFn = unsafe extern "C" fn(instance: LV2_Handle);
pub type RunFn = unsafe extern "C" fn(instance: LV2_Handle, sample_count: u32);
pub type ExtensionDataFn = unsafe extern "C" fn(uri: *const c_char) -> *const c_void;

/// Plugin descriptor (matches `LV2_Descriptor`).
#[repr(C)]
#[derive(Debug)]
pub struct Lv2Descriptor {
    pub uri: *const c_char,
    pub instantiate: Option<InstantiateFn>,
    pub connect_port: Option<ConnectPortFn>,
    pub activate: Option<InstanceFn>,
    pub run: Option<RunFn>,
    pub deactivate: Option<InstanceFn>,
    pub cleanup: Option<InstanceFn>,
    pub extension_data: Option<ExtensionDataFn>,
}

// =============================================================================
// URID (urid.h)
// =============================================================================

pub type LV2_URID = u32;

pub type MapFn = unsafe extern "C" fn(handle: *mut c_void, uri: *const c_char) -> LV2_URID;

/// Data of the `urid:map` feature (matches `LV2_URID_Map`).
#[repr(C)]
#[derive(Debug)]
pub struct Lv2UridMap {
    pub handle: *mut c_void,
    pub map: Option<MapFn>,
}

// =============================================================================
// Atoms (atom.h)
// =============================================================================

/// Atom header (matches `LV2_Atom`). `size` excludes the header.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Lv2Atom {
    pub size: u32,
    pub type_: LV2_URID,
}

/// Sequence body header (matches `LV2_Atom_Sequence_Body`).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Lv2AtomSequenceBody {
    pub unit: u32,
    pub pad: u32,
}

/// Sequence atom (matches `LV2_Atom_Sequence`). Events follow the body.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Lv2AtomSequence {
    pub atom: Lv2Atom,
    pub body: Lv2AtomSequenceBody,
}

/// Object body header (matches `LV2_Atom_Object_Body`).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Lv2AtomObjectBody {
    pub id: LV2_URID,
    pub otype: LV2_URID,
}

/// Byte sizes of the headers walked by the atom parser.
pub const ATOM_HEADER_SIZE: usize = std::mem::size_of::<Lv2Atom>();
/// Event header: 64-bit time stamp followed by an atom header.
pub const ATOM_EVENT_HEADER_SIZE: usize = 8 + ATOM_HEADER_SIZE;
pub const SEQUENCE_BODY_SIZE: usize = std::mem::size_of::<Lv2AtomSequenceBody>();
pub const OBJECT_BODY_SIZE: usize = std::mem::size_of::<Lv2AtomObjectBody>();
/// Property header: key, context, then the value's atom header.
pub const PROPERTY_HEADER_SIZE: usize = 8 + ATOM_HEADER_SIZE;

/// Atoms inside containers are padded to this alignment.
pub const ATOM_ALIGNMENT: usize = 8;

/// Round `size` up to the next atom boundary.
#[inline]
pub const fn atom_pad(size: usize) -> usize {
    (size + ATOM_ALIGNMENT - 1) & !(ATOM_ALIGNMENT - 1)
}
