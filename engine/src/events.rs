//! Events the engine emits for the UI layer

/// State changes surfaced to whatever renders the swap form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Display strings for both amount fields
    AmountsUpdated { from_text: String, to_text: String },
    /// Non-blocking notice naming a violated bound
    Advisory { message: String },
    /// An asset selection could not be honored; prior selection kept
    SelectionRejected { message: String },
}
