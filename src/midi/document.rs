//! Serializable representation of a decoded Standard MIDI File.
//!
//! The field names follow the JSON emitted by the common JavaScript MIDI
//! libraries (camelCase keys, normalized velocities, seconds derived from the
//! tempo map) so uploaded blobs can be read back by those tools unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A decoded MIDI file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiDocument {
    pub header: Header,
    pub tracks: Vec<TrackDocument>,
}

impl MidiDocument {
    /// Total number of notes across all tracks.
    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.notes.len()).sum()
    }
}

/// File-level information gathered from every track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Name from the first track-name event of the first track.
    pub name: String,
    /// Pulses (ticks) per quarter note.
    pub ppq: u16,
    pub tempos: Vec<TempoEvent>,
    pub time_signatures: Vec<TimeSignatureEvent>,
    pub key_signatures: Vec<KeySignatureEvent>,
    pub meta: Vec<MetaEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoEvent {
    pub ticks: u32,
    pub bpm: f64,
    /// Seconds from the start of the file.
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSignatureEvent {
    pub ticks: u32,
    /// `[numerator, denominator]`, e.g. `[6, 8]`.
    pub time_signature: [u32; 2],
    /// Measures elapsed before this event.
    pub measures: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySignatureEvent {
    pub ticks: u32,
    /// Tonic, e.g. `"F#"`.
    pub key: String,
    /// `"major"` or `"minor"`.
    pub scale: String,
}

/// Textual meta event (text, copyright, marker, lyrics, cue point).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEvent {
    pub ticks: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// One track of notes and controller data on a single channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDocument {
    pub name: String,
    pub channel: u8,
    pub instrument: Instrument,
    pub notes: Vec<NoteEvent>,
    /// Controller events keyed by controller number.
    pub control_changes: BTreeMap<String, Vec<ControlChangeEvent>>,
    pub pitch_bends: Vec<PitchBendEvent>,
    pub end_of_track_ticks: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// General MIDI program number (0-127).
    pub number: u8,
    pub family: String,
    pub name: String,
    pub percussion: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    /// MIDI note number. 60 = Middle C.
    pub midi: u8,
    /// Pitch name with octave, e.g. `"C4"`.
    pub name: String,
    /// Normalized velocity, 0..=1.
    pub velocity: f64,
    pub ticks: u32,
    pub duration_ticks: u32,
    pub time: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlChangeEvent {
    pub number: u8,
    /// Normalized value, 0..=1.
    pub value: f64,
    pub ticks: u32,
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchBendEvent {
    /// Normalized bend, -1..1 with 0 as center.
    pub value: f64,
    pub ticks: u32,
    pub time: f64,
}
