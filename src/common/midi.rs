use micromath::F32Ext;

/// Frequency in Hz of A4, MIDI note number 69.
pub const A4_FREQUENCY: f32 = 440.0;
const A4_NOTE_NUMBER: f32 = 69.0;

/// Converts a [MIDI](https://en.wikipedia.org/wiki/MIDI) note number to its
/// equal tempered frequency in Hz.
pub fn midi_note_to_freq(note_number: f32) -> f32 {
    A4_FREQUENCY * F32Ext::powf(2.0, (note_number - A4_NOTE_NUMBER) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approximate_frequency() {
        // The conversion relies on the approximate powf function of the
        // micromath crate. Compare it to std's powf and make sure the
        // difference stays well inside the half-semitone note margin.
        let max_cent_error = 5.0_f32;
        for note in 0..128 {
            let n = note as f32;
            let actual = 440.0_f32 * 2.0_f32.powf((n - 69.0) / 12.0);
            let approx = midi_note_to_freq(n);
            let delta_cents = 1200.0 * (approx / actual).log2();
            assert!(
                delta_cents.abs() <= max_cent_error,
                "note {} off by {} cents",
                note,
                delta_cents
            );
        }
    }

    #[test]
    fn test_a4() {
        assert!((midi_note_to_freq(69.0) - 440.0).abs() < 1.0);
    }
}
