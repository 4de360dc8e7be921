//! N-Back working-memory session.
//!
//! A stimulus is appended to the sequence on a fixed cadence, drawn
//! uniformly from an 8-symbol alphabet with independent draws. The single
//! player action compares the newest symbol against the one two positions
//! earlier.
//!
//! Scoring rewards correct flags and penalizes false flags only. A true
//! repeat the player fails to flag costs nothing beyond being one of the
//! opportunities in the denominator. The 70% threshold upstream was
//! calibrated against exactly this asymmetry, so it stays.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// The fixed stimulus alphabet.
pub const NBACK_ALPHABET: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Result of one `flag_match` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Fewer than 3 symbols exist; the flag is ignored entirely.
    Ignored,
    /// Newest symbol equals the one 2 positions back.
    Hit,
    FalseAlarm,
}

#[derive(Debug)]
pub struct NBackSession {
    sequence: Vec<char>,
    hits: u32,
    false_alarms: u32,
    next_stimulus_at: DateTime<Utc>,
    interval: Duration,
}

impl NBackSession {
    pub fn new(now: DateTime<Utc>, stimulus_interval_ms: u64) -> Self {
        let interval = Duration::milliseconds(stimulus_interval_ms as i64);
        Self {
            sequence: Vec::new(),
            hits: 0,
            false_alarms: 0,
            next_stimulus_at: now + interval,
            interval,
        }
    }

    /// Emit every stimulus whose deadline has passed. Returns the
    /// (index, symbol) pairs appended, oldest first.
    pub fn tick(&mut self, now: DateTime<Utc>, rng: &mut impl Rng) -> Vec<(usize, char)> {
        let mut emitted = Vec::new();
        while now >= self.next_stimulus_at {
            let symbol = NBACK_ALPHABET[rng.gen_range(0..NBACK_ALPHABET.len())];
            self.sequence.push(symbol);
            emitted.push((self.sequence.len() - 1, symbol));
            self.next_stimulus_at += self.interval;
        }
        emitted
    }

    /// The single player action: claim the current stimulus is a 2-back
    /// repeat.
    pub fn flag_match(&mut self) -> MatchOutcome {
        if self.sequence.len() < 3 {
            return MatchOutcome::Ignored;
        }
        let current = self.sequence[self.sequence.len() - 1];
        let target = self.sequence[self.sequence.len() - 3];
        if current == target {
            self.hits += 1;
            MatchOutcome::Hit
        } else {
            self.false_alarms += 1;
            MatchOutcome::FalseAlarm
        }
    }

    /// hits / max(1, len - 2), in 0.0..=1.0 (and above if the player
    /// flags one repeat several times; the original allowed that too).
    pub fn accuracy(&self) -> f64 {
        let opportunities = self.sequence.len().saturating_sub(2).max(1);
        f64::from(self.hits) / opportunities as f64
    }

    pub fn current(&self) -> Option<char> {
        self.sequence.last().copied()
    }

    pub fn sequence(&self) -> &[char] {
        &self.sequence
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn false_alarms(&self) -> u32 {
        self.false_alarms
    }

    #[cfg(test)]
    pub(crate) fn with_sequence(symbols: &[char]) -> Self {
        let mut session = Self::new(Utc::now(), 2000);
        session.sequence = symbols.to_vec();
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn flag_is_noop_under_three_symbols() {
        let mut session = NBackSession::with_sequence(&['A', 'B']);
        assert_eq!(session.flag_match(), MatchOutcome::Ignored);
        assert_eq!(session.hits(), 0);
        assert_eq!(session.false_alarms(), 0);
    }

    #[test]
    fn abaca_sequence_scores_two_of_three() {
        // Sequence A B A C A, flags after index 2 and index 4.
        let mut session = NBackSession::with_sequence(&['A', 'B', 'A']);
        assert_eq!(session.flag_match(), MatchOutcome::Hit); // A vs A

        session.sequence.push('C');
        session.sequence.push('A');
        assert_eq!(session.flag_match(), MatchOutcome::Hit); // A vs A

        assert_eq!(session.hits(), 2);
        // opportunities = 5 - 2 = 3 -> 66.7%, below the 70% bar.
        assert!((session.accuracy() - 2.0 / 3.0).abs() < 1e-9);
        assert!(session.accuracy() < 0.70);
    }

    #[test]
    fn false_alarm_on_mismatch() {
        let mut session = NBackSession::with_sequence(&['A', 'B', 'C']);
        assert_eq!(session.flag_match(), MatchOutcome::FalseAlarm);
        assert_eq!(session.false_alarms(), 1);
    }

    #[test]
    fn threshold_is_inclusive_at_seventy_percent() {
        // 10 opportunities (12 symbols), 7 hits -> exactly 0.70.
        let mut session = NBackSession::with_sequence(&['A'; 12]);
        for _ in 0..7 {
            session.flag_match();
        }
        assert!((session.accuracy() - 0.70).abs() < 1e-9);
        assert!(session.accuracy() >= 0.70);
    }

    #[test]
    fn missed_repeats_are_not_penalized() {
        // All-repeat sequence, zero flags: accuracy 0, no false alarms.
        let session = NBackSession::with_sequence(&['B'; 10]);
        assert_eq!(session.accuracy(), 0.0);
        assert_eq!(session.false_alarms(), 0);
    }

    #[test]
    fn stimuli_emitted_per_elapsed_interval() {
        let now = Utc::now();
        let mut session = NBackSession::new(now, 2000);
        let mut rng = rand_pcg::Pcg64::seed_from_u64(1);
        assert!(session.tick(now + Duration::milliseconds(1999), &mut rng).is_empty());
        let emitted = session.tick(now + Duration::milliseconds(6001), &mut rng);
        assert_eq!(emitted.len(), 3);
        assert_eq!(session.sequence().len(), 3);
        for symbol in session.sequence() {
            assert!(NBACK_ALPHABET.contains(symbol));
        }
    }
}
