use std::time::Duration;

use crate::animation::ease::accelerated;

/// How a description is revealed while its annotation is framed.
///
/// One mode applies to a whole run; it cannot change mid-presentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevealMode {
    /// One character per fixed interval, starting at the beginning of the cycle.
    Typewriter,
    /// Length follows zoom-in progress, sped up so the text completes before the zoom.
    #[default]
    ProgressCoupled,
}

/// Character cursor over the current description.
#[derive(Clone, Debug)]
pub struct TextReveal {
    mode: RevealMode,
    rate: f64,
    interval: Duration,
    text: String,
    len: usize,
    cursor: usize,
    started_at: Duration,
}

impl TextReveal {
    /// Reveal engine for one run.
    pub fn new(mode: RevealMode, rate: f64, interval: Duration) -> Self {
        Self {
            mode,
            rate,
            interval,
            text: String::new(),
            len: 0,
            cursor: 0,
            started_at: Duration::ZERO,
        }
    }

    /// Strategy fixed for this run.
    pub fn mode(&self) -> RevealMode {
        self.mode
    }

    /// Restart from empty for a new cycle beginning at `at`.
    pub fn begin(&mut self, text: &str, at: Duration) {
        self.text.clear();
        self.text.push_str(text);
        self.len = text.chars().count();
        self.cursor = 0;
        self.started_at = at;
    }

    /// Move the cursor for a sample at `at`.
    ///
    /// `zoom_in_progress` is the raw zoom-in progress while zooming in and `None` once the
    /// zoom-in has finished. The cursor never moves backwards within a cycle.
    pub fn advance(&mut self, at: Duration, zoom_in_progress: Option<f64>) -> usize {
        let target = match self.mode {
            RevealMode::ProgressCoupled => match zoom_in_progress {
                Some(p) => coupled_len(self.len, p, self.rate),
                None => self.len,
            },
            RevealMode::Typewriter => {
                typewriter_len(self.len, at.saturating_sub(self.started_at), self.interval)
            }
        };
        self.cursor = self.cursor.max(target).min(self.len);
        self.cursor
    }

    /// Show the whole description.
    pub fn complete(&mut self) {
        self.cursor = self.len;
    }

    /// Drop the description, as on stop or between laps.
    pub fn clear(&mut self) {
        self.text.clear();
        self.len = 0;
        self.cursor = 0;
    }

    /// Revealed character count.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// `true` once every character is shown.
    pub fn is_complete(&self) -> bool {
        self.cursor == self.len
    }

    /// Currently revealed prefix.
    pub fn visible(&self) -> &str {
        revealed_prefix(&self.text, self.cursor)
    }
}

/// Prefix of `text` holding its first `chars` characters.
pub fn revealed_prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Characters shown at raw zoom-in `progress` when reveal runs `rate` times faster.
pub fn coupled_len(len: usize, progress: f64, rate: f64) -> usize {
    let fraction = accelerated(progress, rate);
    ((fraction * len as f64).floor() as usize).min(len)
}

fn typewriter_len(len: usize, elapsed: Duration, interval: Duration) -> usize {
    if len == 0 {
        return 0;
    }
    let steps = if interval.is_zero() {
        len as u128
    } else {
        elapsed.as_nanos() / interval.as_nanos()
    };
    usize::try_from(steps.saturating_add(1))
        .unwrap_or(usize::MAX)
        .min(len)
}

#[cfg(test)]
#[path = "../../tests/unit/reveal/text.rs"]
mod tests;
