//! Playback surface capability.
//!
//! The engine never embeds or configures a concrete video widget; it only
//! calls this capability set. The GUI shell owns the real player;
//! [`SimulatedPlayer`] stands in for it in the CLI session runner and the
//! integration tests.

use crate::quiz::PlaybackIntent;

/// Black-box video playback capability.
pub trait PlaybackSurface {
    fn play(&mut self);
    fn pause(&mut self);
    /// Seek to an absolute position. Implementations clamp to
    /// `[0, duration]`.
    fn seek_to(&mut self, secs: f64);
    fn current_time(&self) -> f64;
    /// End-of-media notification, observed by the controller.
    fn has_ended(&self) -> bool;
}

/// Apply caller-mediated intents from the quiz scheduler to a surface.
pub fn apply_intents(surface: &mut dyn PlaybackSurface, intents: &[PlaybackIntent]) {
    for intent in intents {
        match intent {
            PlaybackIntent::Pause => surface.pause(),
            PlaybackIntent::Resume => surface.play(),
            PlaybackIntent::SeekBackBy { secs } => {
                let target = (surface.current_time() - secs).max(0.0);
                surface.seek_to(target);
            }
        }
    }
}

/// Deterministic in-process player: position advances only through
/// [`SimulatedPlayer::advance`], and only while playing.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    position: f64,
    duration: f64,
    playing: bool,
}

impl SimulatedPlayer {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            position: 0.0,
            duration: duration_secs,
            playing: false,
        }
    }

    /// Advance the clock. Position moves only while playing and stops at
    /// the end of the media.
    pub fn advance(&mut self, delta_secs: f64) {
        if self.playing {
            self.position = (self.position + delta_secs).min(self.duration);
            if self.position >= self.duration {
                self.playing = false;
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}

impl PlaybackSurface for SimulatedPlayer {
    fn play(&mut self) {
        if self.position < self.duration {
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek_to(&mut self, secs: f64) {
        self.position = secs.clamp(0.0, self.duration);
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn has_ended(&self) -> bool {
        self.position >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_advances_only_while_playing() {
        let mut player = SimulatedPlayer::new(100.0);
        player.advance(10.0);
        assert_eq!(player.current_time(), 0.0);
        player.play();
        player.advance(10.0);
        assert_eq!(player.current_time(), 10.0);
        player.pause();
        player.advance(10.0);
        assert_eq!(player.current_time(), 10.0);
    }

    #[test]
    fn ends_at_duration() {
        let mut player = SimulatedPlayer::new(30.0);
        player.play();
        player.advance(45.0);
        assert!(player.has_ended());
        assert!(!player.is_playing());
        assert_eq!(player.current_time(), 30.0);
    }

    #[test]
    fn seek_back_intent_clamps_at_zero() {
        let mut player = SimulatedPlayer::new(100.0);
        player.play();
        player.advance(10.0);
        apply_intents(
            &mut player,
            &[crate::quiz::PlaybackIntent::SeekBackBy { secs: 30.0 }],
        );
        assert_eq!(player.current_time(), 0.0);
    }
}
