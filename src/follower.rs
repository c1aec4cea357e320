//! The complete following pipeline for one session.
//!
//! Raw buffers are decoded, fed to the level meter and, while following, cut
//! into frames. Every frame goes through the pitch estimator and the
//! classifier, and every accepted note advances the position tracker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::classifier::{Classification, PitchClassifier};
use crate::config::Config;
use crate::decoder::{self, ByteOrder, SampleFormat, SampleType};
use crate::error::{Error, Result};
use crate::estimator::{MpmEstimator, PitchEstimator};
use crate::frame::FrameAccumulator;
use crate::level::LevelMeter;
use crate::note_table::NoteTable;
use crate::score::Score;
use crate::tracker::PositionTracker;

/// Format the level meter assumes for already decoded samples.
const FLOAT_SAMPLES: SampleFormat =
    SampleFormat::new(32, SampleType::Float, ByteOrder::LittleEndian);

/// Notifications produced by the pipeline, in emission order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// The best matching score index changed. 0-based.
    PositionChanged(usize),
    /// Mean level of the last batch of samples.
    LevelChanged(f32),
}

/// Counts received samples per wall clock second.
struct Throughput {
    second_start: Option<Instant>,
    sample_count: usize,
}

impl Throughput {
    fn new() -> Self {
        Throughput {
            second_start: None,
            sample_count: 0,
        }
    }

    fn record(&mut self, sample_count: usize) {
        let now = Instant::now();
        match self.second_start {
            None => {
                log::info!("Buffer size: {}", sample_count);
                self.second_start = Some(now);
            }
            Some(start) if now.duration_since(start) >= Duration::from_secs(1) => {
                log::info!("{} samples in the last second", self.sample_count);
                self.sample_count = 0;
                self.second_start = Some(now);
            }
            Some(_) => {}
        }
        self.sample_count += sample_count;
    }
}

pub struct ScoreFollower<E: PitchEstimator = MpmEstimator> {
    config: Arc<Config>,
    estimator: E,
    accumulator: FrameAccumulator,
    classifier: PitchClassifier,
    tracker: Option<PositionTracker>,
    level: LevelMeter,
    following: bool,
    samples: Vec<f32>,
    throughput: Throughput,
}

impl ScoreFollower<MpmEstimator> {
    /// Creates a follower using the bundled MPM pitch estimator.
    pub fn with_mpm(config: Arc<Config>) -> Result<Self> {
        let estimator = MpmEstimator::new(config.sample_rate as f32, config.frame_size)?;
        ScoreFollower::new(config, estimator)
    }
}

impl<E: PitchEstimator> ScoreFollower<E> {
    pub fn new(config: Arc<Config>, estimator: E) -> Result<Self> {
        config.validate()?;
        let table = Arc::new(NoteTable::from_config(&config)?);
        Ok(ScoreFollower {
            accumulator: FrameAccumulator::new(config.frame_size, config.hop_size)?,
            classifier: PitchClassifier::new(table),
            level: LevelMeter::new(config.level_batch_size)?,
            tracker: None,
            following: false,
            samples: Vec::new(),
            throughput: Throughput::new(),
            estimator,
            config,
        })
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn estimator_mut(&mut self) -> &mut E {
        &mut self.estimator
    }

    pub fn note_table(&self) -> &NoteTable {
        self.classifier.table()
    }

    pub fn score(&self) -> Option<&Score> {
        self.tracker.as_ref().map(|tracker| tracker.score())
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    /// The last reported position, `None` before the first accepted note or
    /// without a score.
    pub fn position(&self) -> Option<usize> {
        self.tracker.as_ref().and_then(|tracker| tracker.position())
    }

    /// Replaces the score, discarding all alignment state.
    pub fn set_score(&mut self, score: Score) {
        log::info!("Score set, {} notes", score.len());
        match self.tracker.as_mut() {
            Some(tracker) => tracker.set_score(score),
            None => self.tracker = Some(PositionTracker::new(score)),
        }
    }

    pub fn reset_alignment(&mut self) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.reset();
        }
    }

    /// Starts aligning from the beginning of the score.
    pub fn start_following(&mut self) -> Result<()> {
        if self.tracker.is_none() {
            return Err(Error::MissingScore);
        }
        self.reset_alignment();
        self.classifier.reset();
        self.following = true;
        log::info!("Started score following");
        Ok(())
    }

    /// Stops aligning and drops the partially accumulated frame.
    pub fn stop_following(&mut self) {
        self.following = false;
        self.accumulator.clear();
        log::info!("Stopped score following");
    }

    /// Processes one raw mono buffer of `sample_count` samples.
    pub fn process_buffer<F>(
        &mut self,
        bytes: &[u8],
        sample_count: usize,
        format: SampleFormat,
        handler: F,
    ) where
        F: FnMut(Event),
    {
        let mut samples = std::mem::take(&mut self.samples);
        samples.clear();
        decoder::decode_into(bytes, sample_count, format, &mut samples);
        self.process_decoded(&samples, format, handler);
        self.samples = samples;
    }

    /// Processes already decoded samples. The level meter treats them as
    /// float samples with a full scale of 1.
    pub fn process_samples<F>(&mut self, samples: &[f32], handler: F)
    where
        F: FnMut(Event),
    {
        self.process_decoded(samples, FLOAT_SAMPLES, handler);
    }

    fn process_decoded<F>(&mut self, samples: &[f32], format: SampleFormat, mut handler: F)
    where
        F: FnMut(Event),
    {
        if self.config.verbose {
            self.throughput.record(samples.len());
        }

        self.level
            .process(samples, format, |level| handler(Event::LevelChanged(level)));
        if !self.following {
            return;
        }
        let tracker = match self.tracker.as_mut() {
            Some(tracker) => tracker,
            None => return,
        };

        let estimator = &mut self.estimator;
        let classifier = &mut self.classifier;
        self.accumulator.process(samples, |frame| {
            let estimate = estimator.estimate(frame);
            if let Classification::Accepted(note) = classifier.classify(estimate) {
                if let Some(position) = tracker.update(note) {
                    handler(Event::PositionChanged(position));
                }
            }
        });
    }
}
