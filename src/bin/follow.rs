//! Follows a recorded performance through a score and prints the positions.
//!
//! Usage:
//!   follow [--verbose|-v] <settings.json> <score> <input.wav>
//!
//! The score is a MIDI file (`.mid`, `.midi`) or a text file of note numbers.
//! Positions are printed 1-based, one per line, as they are reported.

use std::error::Error;
use std::sync::Arc;

use score_follower::{
    ByteOrder, Config, Event, FollowerHandle, SampleFormat, SampleType, Score, ScoreFollower,
};

/// Samples per buffer handed to the follower, about what an audio device
/// delivers per callback.
const BUFFER_SAMPLES: usize = 1024;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    let paths: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with('-')).collect();

    let log_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if paths.len() != 3 {
        eprintln!("Usage: follow [--verbose|-v] <settings.json> <score> <input.wav>");
        std::process::exit(2);
    }

    if let Err(error) = run(paths[0], paths[1], paths[2], verbose) {
        log::error!("{}", error);
        std::process::exit(1);
    }
}

fn run(settings: &str, score: &str, wav: &str, verbose: bool) -> Result<(), Box<dyn Error>> {
    let mut config = Config::from_file(settings)?;
    config.verbose |= verbose;
    let config = Arc::new(config);
    let score = Score::load(score)?;

    let (format, buffers) = read_wav(wav, config.sample_rate)?;
    log::info!("Read {} buffers of {} from {}", buffers.len(), format, wav);

    let mut follower = ScoreFollower::with_mpm(config)?;
    follower.set_score(score);
    follower.start_following()?;
    let handle = FollowerHandle::spawn(follower)?;

    let events = handle.events().clone();
    for (bytes, sample_count) in buffers {
        handle.push_buffer(bytes, sample_count, format)?;
        print_events(&events);
    }
    handle.shutdown()?;
    print_events(&events);
    Ok(())
}

fn print_events(events: &crossbeam_channel::Receiver<Event>) {
    for event in events.try_iter() {
        match event {
            Event::PositionChanged(position) => println!("{}", position + 1),
            Event::LevelChanged(level) => log::debug!("Level {:.3}", level),
        }
    }
}

/// Reads the first channel of a WAV file and splits it into raw little
/// endian buffers of `BUFFER_SAMPLES` samples.
fn read_wav(path: &str, sample_rate: u32) -> Result<(SampleFormat, Vec<(Vec<u8>, usize)>), Box<dyn Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.sample_rate != sample_rate {
        log::warn!(
            "{} is sampled at {} Hz but the settings expect {} Hz",
            path,
            spec.sample_rate,
            sample_rate
        );
    }
    let channels = spec.channels.max(1) as usize;

    let (format, bytes): (SampleFormat, Vec<u8>) = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => {
            let samples = reader.samples::<f32>().step_by(channels).collect::<Result<Vec<_>, _>>()?;
            (
                SampleFormat::new(32, SampleType::Float, ByteOrder::LittleEndian),
                samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
            )
        }
        (hound::SampleFormat::Int, 8) => {
            let samples = reader.samples::<i8>().step_by(channels).collect::<Result<Vec<_>, _>>()?;
            (
                SampleFormat::new(8, SampleType::SignedInt, ByteOrder::LittleEndian),
                samples.iter().map(|s| *s as u8).collect(),
            )
        }
        (hound::SampleFormat::Int, 16) => {
            let samples = reader.samples::<i16>().step_by(channels).collect::<Result<Vec<_>, _>>()?;
            (
                SampleFormat::new(16, SampleType::SignedInt, ByteOrder::LittleEndian),
                samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
            )
        }
        (hound::SampleFormat::Int, bits) if bits <= 32 => {
            // Widened to 32 bit, the narrowest supported format holding them.
            let shift = 32 - u32::from(bits);
            let samples = reader.samples::<i32>().step_by(channels).collect::<Result<Vec<_>, _>>()?;
            (
                SampleFormat::new(32, SampleType::SignedInt, ByteOrder::LittleEndian),
                samples.iter().flat_map(|s| (s << shift).to_le_bytes()).collect(),
            )
        }
        (sample_format, bits) => {
            return Err(format!("Unsupported WAV format: {} bit {:?}", bits, sample_format).into());
        }
    };

    let stride = format.bytes_per_sample() * BUFFER_SAMPLES;
    let buffers = bytes
        .chunks(stride)
        .map(|chunk| (chunk.to_vec(), chunk.len() / format.bytes_per_sample()))
        .collect();
    Ok((format, buffers))
}
