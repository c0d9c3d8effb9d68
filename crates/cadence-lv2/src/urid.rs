//! Host feature lookup and URID resolution.
//!
//! The host hands every instance a null-terminated array of features. The
//! only one required is `urid:map`, which is used once at instantiation to
//! resolve every URI the event parser compares against into a [`Urids`]
//! table. Nothing is mapped on the audio thread.

use std::ffi::{c_void, CStr};
use std::ptr::NonNull;

use crate::error::{Lv2Error, Lv2Result};
use crate::sys::{self, Lv2Feature, Lv2UridMap, LV2_URID};

/// Every URI the adapter needs mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uri {
    MidiEvent,
    AtomBlank,
    AtomObject,
    AtomDouble,
    AtomFloat,
    AtomInt,
    AtomLong,
    TimePosition,
    TimeBeatsPerMinute,
    TimeSpeed,
    TimeBeat,
}

impl Uri {
    pub const ALL: [Uri; 11] = [
        Uri::MidiEvent,
        Uri::AtomBlank,
        Uri::AtomObject,
        Uri::AtomDouble,
        Uri::AtomFloat,
        Uri::AtomInt,
        Uri::AtomLong,
        Uri::TimePosition,
        Uri::TimeBeatsPerMinute,
        Uri::TimeSpeed,
        Uri::TimeBeat,
    ];

    pub const fn as_cstr(self) -> &'static CStr {
        match self {
            Self::MidiEvent => sys::LV2_MIDI_MIDI_EVENT,
            Self::AtomBlank => sys::LV2_ATOM_BLANK,
            Self::AtomObject => sys::LV2_ATOM_OBJECT,
            Self::AtomDouble => sys::LV2_ATOM_DOUBLE,
            Self::AtomFloat => sys::LV2_ATOM_FLOAT,
            Self::AtomInt => sys::LV2_ATOM_INT,
            Self::AtomLong => sys::LV2_ATOM_LONG,
            Self::TimePosition => sys::LV2_TIME_POSITION,
            Self::TimeBeatsPerMinute => sys::LV2_TIME_BEATS_PER_MINUTE,
            Self::TimeSpeed => sys::LV2_TIME_SPEED,
            Self::TimeBeat => sys::LV2_TIME_BEAT,
        }
    }
}

/// URIDs resolved once per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Urids {
    pub midi_event: LV2_URID,
    pub atom_blank: LV2_URID,
    pub atom_object: LV2_URID,
    pub atom_double: LV2_URID,
    pub atom_float: LV2_URID,
    pub atom_int: LV2_URID,
    pub atom_long: LV2_URID,
    pub time_position: LV2_URID,
    pub time_beats_per_minute: LV2_URID,
    pub time_speed: LV2_URID,
    pub time_beat: LV2_URID,
}

impl Urids {
    /// Resolve every [`Uri`] through `map`.
    pub fn resolve(mut map: impl FnMut(Uri) -> LV2_URID) -> Self {
        Self {
            midi_event: map(Uri::MidiEvent),
            atom_blank: map(Uri::AtomBlank),
            atom_object: map(Uri::AtomObject),
            atom_double: map(Uri::AtomDouble),
            atom_float: map(Uri::AtomFloat),
            atom_int: map(Uri::AtomInt),
            atom_long: map(Uri::AtomLong),
            time_position: map(Uri::TimePosition),
            time_beats_per_minute: map(Uri::TimeBeatsPerMinute),
            time_speed: map(Uri::TimeSpeed),
            time_beat: map(Uri::TimeBeat),
        }
    }

    /// Resolve through the host's `urid:map` feature.
    pub fn from_map(map: &UridMapper<'_>) -> Self {
        Self::resolve(|uri| map.map(uri.as_cstr()))
    }

    /// True for either atom object type (`atom:Object` or legacy `atom:Blank`).
    #[inline]
    pub fn is_object(&self, type_: LV2_URID) -> bool {
        type_ == self.atom_object || type_ == self.atom_blank
    }
}

/// Safe view of the host's `urid:map` feature.
pub struct UridMapper<'a> {
    raw: &'a Lv2UridMap,
    map: sys::MapFn,
}

impl<'a> UridMapper<'a> {
    /// Wrap the feature data.
    ///
    /// # Errors
    ///
    /// [`Lv2Error::NullFeature`] if the host left the map function null.
    pub fn new(raw: &'a Lv2UridMap) -> Lv2Result<Self> {
        let map = raw.map.ok_or(Lv2Error::NullFeature("urid:map"))?;
        Ok(Self { raw, map })
    }

    pub fn map(&self, uri: &CStr) -> LV2_URID {
        // SAFETY: the host guarantees the map function and its handle stay
        // valid for the lifetime of the instance; `uri` is NUL-terminated.
        unsafe { (self.map)(self.raw.handle, uri.as_ptr()) }
    }
}

/// Find the data pointer of the feature named `uri`.
///
/// Returns `Ok(None)` if the feature is absent.
///
/// # Safety
///
/// `features` must be null or point to a null-terminated array of valid
/// feature pointers whose URIs are NUL-terminated strings.
pub unsafe fn find_feature(
    features: *const *const Lv2Feature,
    uri: &CStr,
) -> Option<*mut c_void> {
    if features.is_null() {
        return None;
    }

    let mut cursor = features;
    loop {
        // SAFETY: the array is null-terminated and `cursor` has not passed
        // the terminator.
        let feature = unsafe { *cursor };
        if feature.is_null() {
            return None;
        }
        // SAFETY: non-null entries point to valid features.
        let feature = unsafe { &*feature };
        // SAFETY: feature URIs are NUL-terminated.
        if !feature.uri.is_null() && unsafe { CStr::from_ptr(feature.uri) } == uri {
            return Some(feature.data);
        }
        // SAFETY: still inside the array; the terminator has not been read.
        cursor = unsafe { cursor.add(1) };
    }
}

/// Like [`find_feature`], but a missing or null feature is an error.
///
/// # Safety
///
/// Same contract as [`find_feature`].
pub unsafe fn require_feature(
    features: *const *const Lv2Feature,
    uri: &CStr,
    name: &'static str,
) -> Lv2Result<NonNull<c_void>> {
    // SAFETY: forwarded caller contract.
    let data = unsafe { find_feature(features, uri) }.ok_or(Lv2Error::MissingFeature(name))?;
    NonNull::new(data).ok_or(Lv2Error::NullFeature(name))
}
