//! Reference scores: the note sequence a performance is aligned against.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// MIDI status byte of a note-on event on the first channel.
const NOTE_ON_STATUS: u8 = 0x90;

/// A non-empty, immutable sequence of note numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    notes: Vec<usize>,
}

impl Score {
    pub fn new(notes: Vec<usize>) -> Result<Self> {
        if notes.is_empty() {
            return Err(Error::EmptyScore);
        }
        Ok(Score { notes })
    }

    pub fn notes(&self) -> &[usize] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Parses whitespace separated note numbers.
    pub fn from_text(text: &str) -> Result<Self> {
        let notes = text
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<usize>()
                    .map_err(|_| Error::Score(format!("Invalid note number '{}'", token)))
            })
            .collect::<Result<Vec<_>>>()?;
        Score::new(notes)
    }

    /// Collects the keys of first channel note-on events with a non-zero
    /// velocity, in track order. Files with several tracks are rejected.
    pub fn from_midi(data: &[u8]) -> Result<Self> {
        let smf = midly::Smf::parse(data)?;
        if smf.tracks.len() > 1 {
            return Err(Error::Score(format!(
                "MIDI score contains {} tracks, only one is supported",
                smf.tracks.len()
            )));
        }

        let mut notes = Vec::new();
        for track in &smf.tracks {
            for event in track {
                if let midly::TrackEventKind::Midi { channel, message } = event.kind {
                    match message {
                        midly::MidiMessage::NoteOn { key, vel }
                            if vel.as_int() > 0
                                && (NOTE_ON_STATUS | channel.as_int()) == NOTE_ON_STATUS =>
                        {
                            notes.push(key.as_int() as usize);
                        }
                        _ => {}
                    }
                }
            }
        }
        Score::new(notes)
    }

    /// Loads a `.mid`/`.midi` file as MIDI and anything else as text.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_midi = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| {
                extension.eq_ignore_ascii_case("mid") || extension.eq_ignore_ascii_case("midi")
            })
            .unwrap_or(false);

        let score = if is_midi {
            Score::from_midi(&fs::read(path)?)?
        } else {
            Score::from_text(&fs::read_to_string(path)?)?
        };
        log::info!("Loaded score of {} notes from {}", score.len(), path.display());
        Ok(score)
    }
}
