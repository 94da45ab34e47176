//! Standard MIDI File (SMF) decoding.
//!
//! Turns the raw bytes of a .mid file into a [`MidiDocument`]. Accepts SMF
//! Format 0 (single track, split by channel), Format 1 (parallel tracks) and
//! Format 2 (sequential tracks, decoded like Format 1).
//!
//! # Limitations
//!
//! - SMPTE timecode timing is rejected
//! - SysEx and escape events are skipped
//! - Overlapping notes of the same pitch on one channel are paired
//!   last-on/first-off

use super::document::{
    ControlChangeEvent, Header, Instrument, KeySignatureEvent, MetaEvent, MidiDocument,
    NoteEvent, PitchBendEvent, TempoEvent, TimeSignatureEvent, TrackDocument,
};
use super::{instruments, note_to_name, ticks_to_seconds, DEFAULT_USEC_PER_BEAT};
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Errors that can occur while decoding MIDI bytes.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a well-formed SMF stream.
    #[error("MIDI parse error: {0}")]
    Parse(String),
    /// Well-formed, but uses a feature this decoder does not handle.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Turns raw bytes into a structured document or fails.
pub trait MidiDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<MidiDocument, DecodeError>;
}

/// The midly-backed decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmfDecoder;

impl MidiDecoder for SmfDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<MidiDocument, DecodeError> {
        let smf = Smf::parse(bytes).map_err(|e| DecodeError::Parse(e.to_string()))?;
        check_track_count(bytes, smf.tracks.len())?;

        let ppq = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(_, _) => {
                return Err(DecodeError::UnsupportedFormat(
                    "SMPTE timecode timing not supported".to_string(),
                ))
            }
        };
        if ppq == 0 {
            return Err(DecodeError::Parse("header declares 0 ticks per beat".to_string()));
        }

        let tempo_map = TempoMap::from_tracks(&smf.tracks, ppq);
        let header = build_header(&smf.tracks, ppq, &tempo_map);

        // Format 0 packs every channel into one track; split it so each
        // resulting track has a single channel and instrument.
        let split_channels = smf.header.format == Format::SingleTrack;

        let mut tracks = Vec::with_capacity(smf.tracks.len());
        for track in &smf.tracks {
            tracks.extend(parse_track(track, &tempo_map, split_channels));
        }

        Ok(MidiDocument { header, tracks })
    }
}

/// Rejects streams that end before every declared track chunk was found.
///
/// midly tolerates missing trailing tracks, which would let a truncated
/// download pass as a shorter file. The header may sit inside a RIFF/RMID
/// wrapper, so `ntrks` is read relative to the `MThd` chunk.
fn check_track_count(bytes: &[u8], parsed: usize) -> Result<(), DecodeError> {
    let header = bytes
        .windows(4)
        .position(|w| w == b"MThd")
        .ok_or_else(|| DecodeError::Parse("missing MThd chunk".to_string()))?;
    let declared = bytes
        .get(header + 10..header + 12)
        .map(|b| u16::from_be_bytes([b[0], b[1]]) as usize)
        .ok_or_else(|| DecodeError::Parse("truncated header".to_string()))?;

    if parsed < declared {
        return Err(DecodeError::Parse(format!(
            "header declares {} tracks but only {} present",
            declared, parsed
        )));
    }
    Ok(())
}

/// Iterates a track's events paired with their absolute tick.
fn absolute<'a, 'b>(
    track: &'b [TrackEvent<'a>],
) -> impl Iterator<Item = (u32, &'b TrackEvent<'a>)> + 'b {
    track.iter().scan(0u32, |tick, event| {
        *tick = tick.saturating_add(event.delta.as_int());
        Some((*tick, event))
    })
}

/// A tempo change and the elapsed seconds at its tick.
#[derive(Debug, Clone, Copy)]
struct TempoSegment {
    tick: u32,
    seconds: f64,
    usec_per_beat: u32,
}

/// Converts ticks to seconds across tempo changes.
#[derive(Debug, Clone)]
struct TempoMap {
    ppq: u16,
    /// Sorted by tick; always starts at tick 0.
    segments: Vec<TempoSegment>,
    /// The explicit tempo events, for the header.
    changes: Vec<(u32, u32)>,
}

impl TempoMap {
    fn from_tracks(tracks: &[Vec<TrackEvent>], ppq: u16) -> Self {
        let mut changes: Vec<(u32, u32)> = tracks
            .iter()
            .flat_map(|track| absolute(track))
            .filter_map(|(tick, event)| match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(usec)) if usec.as_int() > 0 => {
                    Some((tick, usec.as_int()))
                }
                _ => None,
            })
            .collect();
        changes.sort_by_key(|&(tick, _)| tick);

        let mut segments = vec![TempoSegment {
            tick: 0,
            seconds: 0.0,
            usec_per_beat: DEFAULT_USEC_PER_BEAT,
        }];
        for &(tick, usec_per_beat) in &changes {
            let Some(last) = segments.last().copied() else {
                break;
            };
            if tick == last.tick {
                // A later event at the same tick overrides the earlier one.
                if let Some(seg) = segments.last_mut() {
                    seg.usec_per_beat = usec_per_beat;
                }
                continue;
            }
            segments.push(TempoSegment {
                tick,
                seconds: last.seconds + ticks_to_seconds(tick - last.tick, last.usec_per_beat, ppq),
                usec_per_beat,
            });
        }

        Self {
            ppq,
            segments,
            changes,
        }
    }

    fn seconds_at(&self, tick: u32) -> f64 {
        let idx = self.segments.partition_point(|seg| seg.tick <= tick);
        let seg = &self.segments[idx.saturating_sub(1)];
        seg.seconds + ticks_to_seconds(tick - seg.tick, seg.usec_per_beat, self.ppq)
    }
}

const MAJOR_KEYS: [&str; 15] = [
    "Cb", "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#",
];
const MINOR_KEYS: [&str; 15] = [
    "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#", "G#", "D#", "A#",
];

/// Maps a key signature (sharps positive, flats negative) to its tonic.
fn key_name(sharps: i8, minor: bool) -> &'static str {
    let idx = (sharps.clamp(-7, 7) + 7) as usize;
    if minor {
        MINOR_KEYS[idx]
    } else {
        MAJOR_KEYS[idx]
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Collects file-level events from every track.
fn build_header(tracks: &[Vec<TrackEvent>], ppq: u16, tempo_map: &TempoMap) -> Header {
    let name = tracks
        .first()
        .and_then(|track| {
            track.iter().find_map(|event| match event.kind {
                TrackEventKind::Meta(MetaMessage::TrackName(name)) => Some(lossy(name)),
                _ => None,
            })
        })
        .unwrap_or_default();

    let tempos = tempo_map
        .changes
        .iter()
        .map(|&(ticks, usec)| TempoEvent {
            ticks,
            bpm: 60_000_000.0 / usec as f64,
            time: tempo_map.seconds_at(ticks),
        })
        .collect();

    let mut time_sigs: Vec<(u32, u32, u32)> = Vec::new();
    let mut key_signatures = Vec::new();
    let mut meta = Vec::new();

    for track in tracks {
        for (ticks, event) in absolute(track) {
            let TrackEventKind::Meta(message) = event.kind else {
                continue;
            };
            match message {
                MetaMessage::TimeSignature(num, denom_power, _, _) => {
                    // denom_power is a power of 2 (2 means quarter note)
                    let denom = 1u32 << denom_power.min(31);
                    time_sigs.push((ticks, num as u32, denom));
                }
                MetaMessage::KeySignature(sharps, minor) => {
                    key_signatures.push(KeySignatureEvent {
                        ticks,
                        key: key_name(sharps, minor).to_string(),
                        scale: if minor { "minor" } else { "major" }.to_string(),
                    });
                }
                MetaMessage::Text(text) => meta.push(meta_event(ticks, "text", text)),
                MetaMessage::Copyright(text) => {
                    meta.push(meta_event(ticks, "copyrightNotice", text))
                }
                MetaMessage::Marker(text) => meta.push(meta_event(ticks, "marker", text)),
                MetaMessage::CuePoint(text) => meta.push(meta_event(ticks, "cuePoint", text)),
                MetaMessage::Lyric(text) => meta.push(meta_event(ticks, "lyrics", text)),
                _ => {}
            }
        }
    }

    time_sigs.sort_by_key(|&(ticks, _, _)| ticks);
    key_signatures.sort_by_key(|k| k.ticks);
    meta.sort_by_key(|m| m.ticks);

    Header {
        name,
        ppq,
        tempos,
        time_signatures: with_measures(&time_sigs, ppq),
        key_signatures,
        meta,
    }
}

fn meta_event(ticks: u32, kind: &str, text: &[u8]) -> MetaEvent {
    MetaEvent {
        ticks,
        kind: kind.to_string(),
        text: lossy(text),
    }
}

/// Annotates time signatures with the number of measures elapsed before each,
/// assuming 4/4 until the first signature.
fn with_measures(time_sigs: &[(u32, u32, u32)], ppq: u16) -> Vec<TimeSignatureEvent> {
    let mut out = Vec::with_capacity(time_sigs.len());
    let (mut prev_tick, mut prev_num, mut prev_denom) = (0u32, 4u32, 4u32);
    let mut measures = 0.0;

    for &(ticks, num, denom) in time_sigs {
        let ticks_per_measure = ppq as f64 * 4.0 * prev_num as f64 / prev_denom as f64;
        if ticks_per_measure > 0.0 {
            measures += (ticks - prev_tick) as f64 / ticks_per_measure;
        }
        out.push(TimeSignatureEvent {
            ticks,
            time_signature: [num, denom],
            measures,
        });
        (prev_tick, prev_num, prev_denom) = (ticks, num, denom);
    }
    out
}

/// Note-on state while a track is walked.
/// Key is (channel, pitch), value is (start_tick, velocity).
type ActiveNotes = HashMap<(u8, u8), (u32, u8)>;

/// Accumulates one output track.
#[derive(Debug, Default)]
struct TrackBuilder {
    channel: Option<u8>,
    program: u8,
    notes: Vec<NoteEvent>,
    control_changes: BTreeMap<String, Vec<ControlChangeEvent>>,
    pitch_bends: Vec<PitchBendEvent>,
}

impl TrackBuilder {
    fn push_note(&mut self, pitch: u8, velocity: u8, start: u32, end: u32, tempo: &TempoMap) {
        let time = tempo.seconds_at(start);
        self.notes.push(NoteEvent {
            midi: pitch,
            name: note_to_name(pitch),
            velocity: velocity as f64 / 127.0,
            ticks: start,
            duration_ticks: end - start,
            time,
            duration: tempo.seconds_at(end) - time,
        });
    }

    fn finish(mut self, name: &str, end_of_track: Option<u32>) -> TrackDocument {
        let channel = self.channel.unwrap_or(0);
        let (family, instrument_name) = instruments::describe(self.program, channel);
        self.notes
            .sort_by(|a, b| a.ticks.cmp(&b.ticks).then(a.midi.cmp(&b.midi)));

        TrackDocument {
            name: name.to_string(),
            channel,
            instrument: Instrument {
                number: self.program,
                family: family.to_string(),
                name: instrument_name.to_string(),
                percussion: channel == instruments::PERCUSSION_CHANNEL,
            },
            notes: self.notes,
            control_changes: self.control_changes,
            pitch_bends: self.pitch_bends,
            end_of_track_ticks: end_of_track,
        }
    }
}

/// Parses a single SMF track into one track, or one per channel when
/// `split_channels` is set.
fn parse_track(
    track: &[TrackEvent],
    tempo: &TempoMap,
    split_channels: bool,
) -> Vec<TrackDocument> {
    let mut builders: BTreeMap<u8, TrackBuilder> = BTreeMap::new();
    let mut active_notes: ActiveNotes = HashMap::new();
    let mut track_name: Option<String> = None;
    let mut end_of_track: Option<u32> = None;
    let mut last_tick = 0u32;

    for (tick, event) in absolute(track) {
        last_tick = tick;

        match event.kind {
            TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
                if track_name.is_none() {
                    track_name = Some(lossy(name));
                }
            }
            TrackEventKind::Meta(MetaMessage::EndOfTrack) => end_of_track = Some(tick),
            TrackEventKind::Midi { channel, message } => {
                let ch = channel.as_int();
                let key = if split_channels { ch } else { 0 };
                let builder = builders.entry(key).or_default();
                builder.channel.get_or_insert(ch);

                match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        active_notes.insert((ch, key.as_int()), (tick, vel.as_int()));
                    }
                    // Note on with velocity 0 = note off
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let pitch = key.as_int();
                        if let Some((start, velocity)) = active_notes.remove(&(ch, pitch)) {
                            builder.push_note(pitch, velocity, start, tick, tempo);
                        }
                    }
                    MidiMessage::ProgramChange { program } => {
                        builder.program = program.as_int();
                    }
                    MidiMessage::Controller { controller, value } => {
                        let number = controller.as_int();
                        builder
                            .control_changes
                            .entry(number.to_string())
                            .or_default()
                            .push(ControlChangeEvent {
                                number,
                                value: value.as_int() as f64 / 127.0,
                                ticks: tick,
                                time: tempo.seconds_at(tick),
                            });
                    }
                    MidiMessage::PitchBend { bend } => {
                        // 14-bit value centered on 0x2000
                        let raw = bend.0.as_int() as f64;
                        builder.pitch_bends.push(PitchBendEvent {
                            value: (raw - 8192.0) / 8192.0,
                            ticks: tick,
                            time: tempo.seconds_at(tick),
                        });
                    }
                    _ => {} // Aftertouch is not represented
                }
            }
            _ => {} // SysEx, escapes and other meta events
        }
    }

    // Close notes still sounding when the track ends (incomplete files).
    let track_end = end_of_track.unwrap_or(last_tick);
    let mut unclosed: Vec<_> = active_notes.into_iter().collect();
    unclosed.sort_by_key(|&((ch, pitch), (start, _))| (start, ch, pitch));
    for ((ch, pitch), (start, velocity)) in unclosed {
        let key = if split_channels { ch } else { 0 };
        if let Some(builder) = builders.get_mut(&key) {
            let end = if track_end > start {
                track_end
            } else {
                start + tempo.ppq as u32
            };
            builder.push_note(pitch, velocity, start, end, tempo);
        }
    }

    let name = track_name.unwrap_or_default();
    if builders.is_empty() {
        return vec![TrackBuilder::default().finish(&name, end_of_track)];
    }
    builders
        .into_values()
        .map(|builder| builder.finish(&name, end_of_track))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::test_support;

    #[test]
    fn test_decodes_simple_song() {
        let doc = SmfDecoder.decode(&test_support::simple_song()).unwrap();

        assert_eq!(doc.header.name, "Demo");
        assert_eq!(doc.header.ppq, 480);
        assert_eq!(doc.header.tempos.len(), 1);
        assert!((doc.header.tempos[0].bpm - 120.0).abs() < 1e-9);
        assert_eq!(doc.header.time_signatures[0].time_signature, [3, 4]);

        // Tempo track plus one piano track
        assert_eq!(doc.tracks.len(), 2);
        let piano = &doc.tracks[1];
        assert_eq!(piano.name, "Piano");
        assert_eq!(piano.instrument.number, 0);
        assert_eq!(piano.instrument.family, "piano");

        let names: Vec<_> = piano.notes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["C4", "E4", "G4"]);
        assert_eq!(piano.notes[1].ticks, 480);
        assert_eq!(piano.notes[1].duration_ticks, 480);
        // 120 BPM: one beat = 0.5 seconds
        assert!((piano.notes[1].time - 0.5).abs() < 1e-9);
        assert!((piano.notes[1].duration - 0.5).abs() < 1e-9);
        assert!((piano.notes[0].velocity - 100.0 / 127.0).abs() < 1e-9);
        assert_eq!(doc.note_count(), 3);
    }

    #[test]
    fn test_rejects_corrupt_bytes() {
        let song = test_support::simple_song();
        let cases: Vec<Vec<u8>> = vec![
            Vec::new(),
            b"definitely not a midi file".to_vec(),
            song[..12].to_vec(),
            {
                let mut bad_magic = song.clone();
                bad_magic[0] = b'X';
                bad_magic
            },
        ];

        for bytes in cases {
            assert!(
                matches!(SmfDecoder.decode(&bytes), Err(DecodeError::Parse(_))),
                "{} bytes decoded",
                bytes.len()
            );
        }
    }

    #[test]
    fn test_rejects_missing_tracks() {
        let song = test_support::simple_song();
        // Cut the file right after the first track chunk.
        let first_len = u32::from_be_bytes([song[18], song[19], song[20], song[21]]) as usize;
        let truncated = &song[..14 + 8 + first_len];
        assert!(SmfDecoder.decode(truncated).is_err());
    }

    fn rmid(smf: &[u8]) -> Vec<u8> {
        let mut data = b"RMIDdata".to_vec();
        data.extend_from_slice(&(smf.len() as u32).to_le_bytes());
        data.extend_from_slice(smf);

        let mut riff = b"RIFF".to_vec();
        riff.extend_from_slice(&(data.len() as u32).to_le_bytes());
        riff.extend_from_slice(&data);
        riff
    }

    #[test]
    fn test_decodes_rmid_wrapped_song() {
        let doc = SmfDecoder.decode(&rmid(&test_support::simple_song())).unwrap();

        assert_eq!(doc.tracks.len(), 2);
        assert_eq!(doc.note_count(), 3);
    }

    #[test]
    fn test_tempo_change_affects_time() {
        let tracks = vec![test_support::tempo_track(&[(0, 500_000), (960, 1_000_000)])];
        let map = TempoMap::from_tracks(&tracks, 480);

        assert!((map.seconds_at(480) - 0.5).abs() < 1e-9);
        assert!((map.seconds_at(960) - 1.0).abs() < 1e-9);
        // 60 BPM after tick 960
        assert!((map.seconds_at(1440) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_zero_splits_channels() {
        let doc = SmfDecoder
            .decode(&test_support::single_track_two_channels())
            .unwrap();

        assert_eq!(doc.tracks.len(), 2);
        assert_eq!(doc.tracks[0].channel, 0);
        assert_eq!(doc.tracks[1].channel, 9);
        assert!(doc.tracks[1].instrument.percussion);
    }

    #[test]
    fn test_key_name() {
        assert_eq!(key_name(0, false), "C");
        assert_eq!(key_name(0, true), "A");
        assert_eq!(key_name(-1, false), "F");
        assert_eq!(key_name(6, false), "F#");
        assert_eq!(key_name(-3, true), "C");
    }

    #[test]
    fn test_measures() {
        let sigs = with_measures(&[(0, 4, 4), (3840, 3, 4), (5280, 6, 8)], 480);
        assert_eq!(sigs[0].measures, 0.0);
        assert_eq!(sigs[1].measures, 2.0);
        assert_eq!(sigs[2].measures, 3.0);
    }
}
