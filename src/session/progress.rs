//! Staged progress reporting for a translation request.
//!
//! A request moves through a fixed sequence of stages, each with a label and
//! a percentage:
//!
//! ```text
//! Transcribing (20%) ─▶ Submitting (40%) ─▶ Generating (70%)
//!                          ─▶ Completing (90%) ─▶ Done (100%)
//! ```
//!
//! [`ProgressState`] only ever advances: a stage behind the current one is
//! ignored, so percentages are monotonically non-decreasing within one
//! request.  `clear` resets between requests.

// ---------------------------------------------------------------------------
// ProgressStage
// ---------------------------------------------------------------------------

/// One stage of a translation request, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgressStage {
    /// Input audio is being transcribed.
    Transcribing,
    /// The request is on the wire.
    Submitting,
    /// Translated speech is being generated.
    Generating,
    /// The result is being finalised locally.
    Completing,
    /// Everything landed.
    Done,
}

impl ProgressStage {
    /// All stages in request order.
    pub const SEQUENCE: [ProgressStage; 5] = [
        ProgressStage::Transcribing,
        ProgressStage::Submitting,
        ProgressStage::Generating,
        ProgressStage::Completing,
        ProgressStage::Done,
    ];

    /// Completion percentage shown for this stage.
    pub fn percent(&self) -> u8 {
        match self {
            ProgressStage::Transcribing => 20,
            ProgressStage::Submitting => 40,
            ProgressStage::Generating => 70,
            ProgressStage::Completing => 90,
            ProgressStage::Done => 100,
        }
    }

    /// Short status label for the UI.
    pub fn label(&self) -> &'static str {
        match self {
            ProgressStage::Transcribing => "Transcribing audio…",
            ProgressStage::Submitting => "Translating…",
            ProgressStage::Generating => "Generating speech…",
            ProgressStage::Completing => "Almost done…",
            ProgressStage::Done => "Done",
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressState
// ---------------------------------------------------------------------------

/// Forward-only progress indicator for the current request.
///
/// `None` between requests; the UI hides the progress bar when cleared.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProgressState {
    current: Option<ProgressStage>,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to `stage`.  A stage at or behind the current one is ignored,
    /// so the displayed percentage never moves backwards.
    pub fn advance(&mut self, stage: ProgressStage) {
        match self.current {
            Some(current) if stage <= current => {}
            _ => self.current = Some(stage),
        }
    }

    /// Reset between requests.
    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn stage(&self) -> Option<ProgressStage> {
        self.current
    }

    /// Current percentage, `0` when no request is in flight.
    pub fn percent(&self) -> u8 {
        self.current.map(|s| s.percent()).unwrap_or(0)
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
