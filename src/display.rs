// # Transport display
//
// UI-side model of the transport bar: slider, time labels and the play/pause
// button. Rendering is up to the front end; this only tracks what to show.

use crate::playback::{PlaybackProgress, PlaybackState};
use std::time::Duration;

/// Format a time in seconds as zero-padded `MM:SS`.
///
/// Minutes are not wrapped into hours. Negative or NaN input formats as `00:00`.
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_nan() { 0 } else { seconds.max(0.0) as u64 };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// What the play/pause button offers to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonGlyph {
    Play,
    Pause,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportDisplay {
    pub state: PlaybackState,
    pub slider_max: f64,
    pub slider_value: f64,
    pub elapsed_label: String,
    pub duration_label: String,
    pub last_error: Option<String>,
}

impl Default for TransportDisplay {
    fn default() -> Self {
        Self {
            state: PlaybackState::Idle,
            slider_max: 0.0,
            slider_value: 0.0,
            elapsed_label: format_timestamp(0.0),
            duration_label: format_timestamp(0.0),
            last_error: None,
        }
    }
}

impl TransportDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, progress: &PlaybackProgress) {
        match progress {
            PlaybackProgress::StateChanged { state } => {
                self.state = *state;
                match state {
                    PlaybackState::Loading => {
                        *self = Self {
                            state: *state,
                            ..Self::default()
                        };
                    }
                    PlaybackState::Playing => self.last_error = None,
                    _ => {}
                }
            }
            PlaybackProgress::DurationKnown { duration } => {
                self.slider_max = duration.as_secs_f64();
                self.duration_label = format_timestamp(self.slider_max);
            }
            PlaybackProgress::PositionTick { elapsed, position } => {
                self.slider_value = position.as_secs_f64();
                self.elapsed_label = format_timestamp(elapsed.as_secs_f64());
            }
            PlaybackProgress::LoadFailed { error } => {
                self.last_error = Some(error.to_string());
            }
        }
    }

    pub fn button(&self) -> ButtonGlyph {
        if self.state == PlaybackState::Playing {
            ButtonGlyph::Pause
        } else {
            ButtonGlyph::Play
        }
    }

    /// Slider position as a fraction of the asset, for drawing a bar
    pub fn ratio(&self) -> f64 {
        if self.slider_max > 0.0 {
            (self.slider_value / self.slider_max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Scrub target for a slider dragged to `ratio` of its length
    pub fn scrub_target(&self, ratio: f64) -> f64 {
        ratio.clamp(0.0, 1.0) * self.slider_max
    }
}

/// Duration as whole seconds for a label
pub fn format_duration(duration: Duration) -> String {
    format_timestamp(duration.as_secs_f64())
}
