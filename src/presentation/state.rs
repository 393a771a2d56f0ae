use std::fmt;

/// Stored presentation phase. Advancing between items is instantaneous and never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Not playing.
    #[default]
    Idle,
    /// Zooming into the current item.
    ZoomIn,
    /// Item framed, caption shown.
    Hold,
    /// Zooming back out.
    ZoomOut,
    /// Pause after the last item, before wrapping.
    InterItemDelay,
}

impl Phase {
    /// `true` for the phases in which an annotation is framed.
    pub fn is_item_phase(self) -> bool {
        matches!(self, Self::ZoomIn | Self::Hold | Self::ZoomOut)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::ZoomIn => "zoom-in",
            Self::Hold => "hold",
            Self::ZoomOut => "zoom-out",
            Self::InterItemDelay => "inter-item-delay",
        };
        f.write_str(s)
    }
}

/// Observable playback state, owned by the presenter and changed only through its transitions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// Current phase.
    pub phase: Phase,
    /// Index of the current annotation.
    pub current_index: usize,
    /// `true` between `start` and `stop`.
    pub is_playing: bool,
    /// Revealed character count of the current description.
    pub text_cursor: usize,
    /// Completed laps since `start()`; incremented when wrapping back to index 0.
    pub laps: u64,
}

impl PlaybackState {
    /// Resting state used at construction and after `stop()`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
