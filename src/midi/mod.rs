//! MIDI decoding and the serializable document it produces.
//!
//! [`SmfDecoder`] is the only [`MidiDecoder`] shipped; the trait exists so the
//! intake pipeline can be exercised with decoders that fail on demand.

mod decoder;
mod document;
mod instruments;

pub use decoder::{DecodeError, MidiDecoder, SmfDecoder};
pub use document::{
    ControlChangeEvent, Header, Instrument, KeySignatureEvent, MetaEvent, MidiDocument,
    NoteEvent, PitchBendEvent, TempoEvent, TimeSignatureEvent, TrackDocument,
};

/// Standard MIDI note names for display purposes.
/// Maps MIDI note number (0-127) to note name within an octave.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Tempo assumed until the first tempo event: 500,000 µs per beat (120 BPM).
pub const DEFAULT_USEC_PER_BEAT: u32 = 500_000;

/// Converts a MIDI note number to a human-readable note name with octave.
///
/// # Examples
///
/// ```
/// use midishare::midi::note_to_name;
///
/// let name = note_to_name(60); // Middle C
/// assert_eq!(name, "C4");
/// ```
pub fn note_to_name(note: u8) -> String {
    let octave = (note / 12) as i8 - 1; // MIDI octave convention
    let note_index = (note % 12) as usize;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}

/// Converts ticks to seconds at a fixed tempo.
///
/// # Arguments
///
/// * `ticks` - Number of ticks
/// * `usec_per_beat` - Tempo in microseconds per quarter note
/// * `ppq` - Ticks per quarter note
pub fn ticks_to_seconds(ticks: u32, usec_per_beat: u32, ppq: u16) -> f64 {
    let beats = ticks as f64 / ppq as f64;
    beats * usec_per_beat as f64 / 1_000_000.0
}

/// In-memory SMF fixtures for unit tests.
#[cfg(test)]
pub(crate) mod test_support {
    use midly::num::{u15, u24, u28, u4, u7};
    use midly::{
        Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
    };

    fn ev(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind,
        }
    }

    fn midi(channel: u8, message: MidiMessage) -> TrackEventKind<'static> {
        TrackEventKind::Midi {
            channel: u4::new(channel),
            message,
        }
    }

    fn note_on(channel: u8, key: u8, vel: u8) -> TrackEventKind<'static> {
        midi(
            channel,
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
        )
    }

    fn note_off(channel: u8, key: u8) -> TrackEventKind<'static> {
        midi(
            channel,
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
        )
    }

    fn end() -> TrackEvent<'static> {
        ev(0, TrackEventKind::Meta(MetaMessage::EndOfTrack))
    }

    fn write(smf: &Smf) -> Vec<u8> {
        let mut bytes = Vec::new();
        smf.write_std(&mut bytes).expect("in-memory write");
        bytes
    }

    /// A track holding only tempo events at the given `(tick, µs per beat)`.
    pub fn tempo_track(changes: &[(u32, u32)]) -> Vec<TrackEvent<'static>> {
        let mut track = Vec::new();
        let mut last = 0;
        for &(tick, usec) in changes {
            track.push(ev(
                tick - last,
                TrackEventKind::Meta(MetaMessage::Tempo(u24::new(usec))),
            ));
            last = tick;
        }
        track.push(end());
        track
    }

    /// Format 1 at 480 PPQ, 120 BPM, 3/4: a tempo track named "Demo" and a
    /// "Piano" track playing C4 E4 G4 as quarter notes.
    pub fn simple_song() -> Vec<u8> {
        let tempo = vec![
            ev(0, TrackEventKind::Meta(MetaMessage::TrackName(b"Demo"))),
            ev(0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(500_000)))),
            ev(
                0,
                TrackEventKind::Meta(MetaMessage::TimeSignature(3, 2, 24, 8)),
            ),
            end(),
        ];

        let mut piano = vec![
            ev(0, TrackEventKind::Meta(MetaMessage::TrackName(b"Piano"))),
            ev(
                0,
                midi(
                    0,
                    MidiMessage::ProgramChange {
                        program: u7::new(0),
                    },
                ),
            ),
        ];
        for key in [60, 64, 67] {
            piano.push(ev(0, note_on(0, key, 100)));
            piano.push(ev(480, note_off(0, key)));
        }
        piano.push(end());

        write(&Smf {
            header: Header::new(Format::Parallel, Timing::Metrical(u15::new(480))),
            tracks: vec![tempo, piano],
        })
    }

    /// Format 0 with a melody on channel 0 and a kick on channel 9.
    pub fn single_track_two_channels() -> Vec<u8> {
        let track = vec![
            ev(0, note_on(0, 72, 90)),
            ev(0, note_on(9, 36, 127)),
            ev(240, note_off(9, 36)),
            ev(240, note_off(0, 72)),
            end(),
        ];

        write(&Smf {
            header: Header::new(Format::SingleTrack, Timing::Metrical(u15::new(96))),
            tracks: vec![track],
        })
    }
}
