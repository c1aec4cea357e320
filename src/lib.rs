//! Real time score following for monophonic instruments.
//!
//! Given a known score and a live audio stream, reports which note of the
//! score is currently being played. The pipeline
//!
//! * decodes raw sample buffers of various bit depths and byte orders,
//! * cuts the stream into overlapping frames of a fixed size,
//! * estimates the pitch of each frame (the bundled estimator uses the MPM,
//!   McLeod Pitch Method, with FFT accelerated autocorrelation),
//! * quantizes the pitch to a note number, with hysteresis and a per-note
//!   confidence threshold,
//! * aligns the detected notes with the score using online dynamic time
//!   warping, tolerating skipped, repeated and wrong notes.
//!
//! # Examples
//!
//! Any closure can stand in for the pitch estimator:
//!
//! ```
//! use std::sync::Arc;
//! use score_follower::{Config, Event, PitchEstimate, Score, ScoreFollower};
//!
//! // Frames of 2048 samples at 44.1 kHz, MIDI note numbers.
//! let config = Arc::new(Config::default());
//! let middle_c = |_frame: &[f32]| PitchEstimate::new(261.63, 0.9);
//! let mut follower = ScoreFollower::new(config, middle_c).unwrap();
//! follower.set_score(Score::new(vec![60, 62, 64]).unwrap());
//! follower.start_following().unwrap();
//!
//! let mut positions = Vec::new();
//! follower.process_samples(&[0.0; 4096], |event| {
//!     if let Event::PositionChanged(position) = event {
//!         positions.push(position);
//!     }
//! });
//! assert_eq!(positions, vec![0]);
//! ```
//!
//! [`FollowerHandle`] runs the same pipeline on its own thread and delivers
//! the events over a channel.

pub mod classifier;
pub mod common;
pub mod config;
pub mod decoder;
pub mod error;
pub mod estimator;
pub mod follower;
pub mod frame;
pub mod level;
pub mod note_table;
pub mod score;
pub mod tracker;
pub mod worker;

pub use classifier::{Classification, PitchClassifier};
pub use config::{Config, NoteEntry};
pub use decoder::{ByteOrder, DecodeError, SampleFormat, SampleType};
pub use error::{Error, Result};
pub use estimator::{MpmEstimator, PitchEstimate, PitchEstimator};
pub use follower::{Event, ScoreFollower};
pub use frame::FrameAccumulator;
pub use level::LevelMeter;
pub use note_table::NoteTable;
pub use score::Score;
pub use tracker::PositionTracker;
pub use worker::FollowerHandle;
