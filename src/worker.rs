//! Runs a [`ScoreFollower`] on a dedicated thread.
//!
//! The control side sends buffers and score changes over an unbounded
//! channel and receives [`Event`]s over another, so neither the audio
//! producer nor the consumer ever waits on the other. Starting and stopping
//! travel on the command channel too, so they apply in order with the
//! buffers around them. A shared flag mirrors the following state for the
//! control side.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::decoder::SampleFormat;
use crate::error::{Error, Result};
use crate::estimator::PitchEstimator;
use crate::follower::{Event, ScoreFollower};
use crate::score::Score;

enum Command {
    Buffer {
        bytes: Vec<u8>,
        sample_count: usize,
        format: SampleFormat,
    },
    Samples(Vec<f32>),
    SetScore(Score),
    ResetAlignment,
    Start,
    Stop,
    Shutdown,
}

pub struct FollowerHandle {
    commands: Sender<Command>,
    events: Receiver<Event>,
    following: Arc<AtomicBool>,
    has_score: bool,
    thread: Option<JoinHandle<()>>,
}

impl FollowerHandle {
    /// Moves `follower` onto a new thread.
    pub fn spawn<E>(follower: ScoreFollower<E>) -> Result<Self>
    where
        E: PitchEstimator + 'static,
    {
        let (command_sender, command_receiver) = unbounded();
        let (event_sender, event_receiver) = unbounded();
        let following = Arc::new(AtomicBool::new(follower.is_following()));
        let has_score = follower.score().is_some();

        let flag = following.clone();
        let thread = std::thread::Builder::new()
            .name("score-follower".into())
            .spawn(move || run(follower, command_receiver, event_sender, flag))?;

        Ok(FollowerHandle {
            commands: command_sender,
            events: event_receiver,
            following,
            has_score,
            thread: Some(thread),
        })
    }

    /// Events in the order the pipeline produced them.
    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    pub fn is_following(&self) -> bool {
        self.following.load(Ordering::Acquire)
    }

    /// Queues a raw mono buffer.
    pub fn push_buffer(&self, bytes: Vec<u8>, sample_count: usize, format: SampleFormat) -> Result<()> {
        self.send(Command::Buffer {
            bytes,
            sample_count,
            format,
        })
    }

    /// Queues already decoded samples.
    pub fn push_samples(&self, samples: Vec<f32>) -> Result<()> {
        self.send(Command::Samples(samples))
    }

    pub fn set_score(&mut self, score: Score) -> Result<()> {
        self.send(Command::SetScore(score))?;
        self.has_score = true;
        Ok(())
    }

    pub fn reset_alignment(&self) -> Result<()> {
        self.send(Command::ResetAlignment)
    }

    /// Applies to every buffer queued after this call.
    pub fn start_following(&self) -> Result<()> {
        if !self.has_score {
            return Err(Error::MissingScore);
        }
        self.send(Command::Start)?;
        self.following.store(true, Ordering::Release);
        Ok(())
    }

    /// Applies to every buffer queued after this call. The partial frame
    /// queued so far is dropped.
    pub fn stop_following(&self) -> Result<()> {
        self.following.store(false, Ordering::Release);
        self.send(Command::Stop)
    }

    /// Processes the buffers already queued, then stops the thread.
    pub fn shutdown(mut self) -> Result<()> {
        self.join()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::Disconnected)
    }

    fn join(&mut self) -> Result<()> {
        match self.thread.take() {
            Some(thread) => {
                let _ = self.commands.send(Command::Shutdown);
                thread.join().map_err(|_| Error::Disconnected)
            }
            None => Ok(()),
        }
    }
}

impl Drop for FollowerHandle {
    fn drop(&mut self) {
        if let Err(error) = self.join() {
            log::error!("Score follower thread failed: {}", error);
        }
    }
}

fn run<E: PitchEstimator>(
    mut follower: ScoreFollower<E>,
    commands: Receiver<Command>,
    events: Sender<Event>,
    following: Arc<AtomicBool>,
) {
    let mut emit = |event: Event| {
        // The control side may have dropped its receiver; keep processing.
        let _ = events.send(event);
    };

    for command in commands.iter() {
        match command {
            Command::Buffer {
                bytes,
                sample_count,
                format,
            } => follower.process_buffer(&bytes, sample_count, format, &mut emit),
            Command::Samples(samples) => follower.process_samples(&samples, &mut emit),
            Command::SetScore(score) => follower.set_score(score),
            Command::ResetAlignment => follower.reset_alignment(),
            Command::Start => {
                if let Err(error) = follower.start_following() {
                    log::error!("Cannot start following: {}", error);
                    following.store(false, Ordering::Release);
                }
            }
            Command::Stop => follower.stop_following(),
            Command::Shutdown => break,
        }
    }
    log::debug!("Score follower thread finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::decoder::{ByteOrder, SampleType};
    use crate::estimator::PitchEstimate;

    const FRAME_SIZE: usize = 32;
    const HOP_SIZE: usize = 16;

    fn follower(notes: Vec<usize>) -> ScoreFollower<impl PitchEstimator> {
        let mut config = Config::with_equal_tempered_notes(8000, FRAME_SIZE, HOP_SIZE, 0..128, 0.5);
        config.level_batch_size = FRAME_SIZE;
        let mut estimates = notes
            .into_iter()
            .map(|note| PitchEstimate::new(crate::common::midi_note_to_freq(note as f32), 1.0));
        let estimator = move |_frame: &[f32]| estimates.next().unwrap_or_else(PitchEstimate::none);
        ScoreFollower::new(Arc::new(config), estimator).unwrap()
    }

    fn positions(events: &Receiver<Event>) -> Vec<usize> {
        events
            .try_iter()
            .filter_map(|event| match event {
                Event::PositionChanged(position) => Some(position),
                Event::LevelChanged(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_follows_on_worker_thread() {
        let mut handle = FollowerHandle::spawn(follower(vec![48, 50, 52])).unwrap();
        handle.set_score(Score::new(vec![48, 50, 52]).unwrap()).unwrap();
        handle.start_following().unwrap();
        assert!(handle.is_following());

        let format = SampleFormat::new(16, SampleType::SignedInt, ByteOrder::BigEndian);
        for _ in 0..4 {
            handle.push_buffer(vec![0; HOP_SIZE * 2], HOP_SIZE, format).unwrap();
        }
        let events = handle.events().clone();
        handle.shutdown().unwrap();

        let all: Vec<Event> = events.try_iter().collect();
        let levels = all
            .iter()
            .filter(|event| matches!(event, Event::LevelChanged(_)))
            .count();
        assert_eq!(levels, 2);
        let positions: Vec<usize> = all
            .iter()
            .filter_map(|event| match event {
                Event::PositionChanged(position) => Some(*position),
                Event::LevelChanged(_) => None,
            })
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_not_following_reports_only_levels() {
        let mut handle = FollowerHandle::spawn(follower(vec![48, 50])).unwrap();
        handle.set_score(Score::new(vec![48, 50]).unwrap()).unwrap();
        handle.push_samples(vec![0.0; FRAME_SIZE * 4]).unwrap();
        let events = handle.events().clone();
        drop(handle);
        assert!(positions(&events).is_empty());
    }

    #[test]
    fn test_restart_discards_partial_frame() {
        let (seen_sender, seen_receiver) = unbounded();
        let estimator = move |frame: &[f32]| {
            let _ = seen_sender.send(frame[0]);
            PitchEstimate::new(crate::common::midi_note_to_freq(48.0), 1.0)
        };
        let config = Config::with_equal_tempered_notes(8000, FRAME_SIZE, HOP_SIZE, 0..128, 0.5);
        let mut follower = ScoreFollower::new(Arc::new(config), estimator).unwrap();
        follower.set_score(Score::new(vec![48, 50]).unwrap());

        let handle = FollowerHandle::spawn(follower).unwrap();
        handle.start_following().unwrap();
        handle.push_samples(vec![1.0; FRAME_SIZE - 1]).unwrap();
        handle.stop_following().unwrap();
        handle.start_following().unwrap();
        handle.push_samples(vec![2.0; FRAME_SIZE]).unwrap();
        handle.shutdown().unwrap();

        let seen: Vec<f32> = seen_receiver.try_iter().collect();
        assert_eq!(seen, vec![2.0]);
    }

    #[test]
    fn test_stop_is_ordered_with_buffers() {
        let mut handle = FollowerHandle::spawn(follower(vec![48, 50, 52])).unwrap();
        handle.set_score(Score::new(vec![48, 50, 52]).unwrap()).unwrap();
        handle.start_following().unwrap();
        handle.push_samples(vec![0.0; FRAME_SIZE]).unwrap();
        handle.stop_following().unwrap();
        assert!(!handle.is_following());
        handle.push_samples(vec![0.0; FRAME_SIZE * 4]).unwrap();
        let events = handle.events().clone();
        handle.shutdown().unwrap();
        assert_eq!(positions(&events), vec![0]);
    }

    #[test]
    fn test_start_requires_score() {
        let handle = FollowerHandle::spawn(follower(Vec::new())).unwrap();
        assert!(matches!(handle.start_following(), Err(Error::MissingScore)));
        assert!(!handle.is_following());
        handle.shutdown().unwrap();
    }
}
