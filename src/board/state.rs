#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationPhase {
    Idle,
    Submitting,
    Materializing,
}

impl EvaluationPhase {
    pub fn is_submitting(self) -> bool {
        matches!(self, Self::Submitting)
    }
}

pub fn can_transition(from: EvaluationPhase, to: EvaluationPhase) -> bool {
    matches!(
        (from, to),
        (EvaluationPhase::Idle, EvaluationPhase::Submitting)
            | (EvaluationPhase::Submitting, EvaluationPhase::Idle)
            | (EvaluationPhase::Submitting, EvaluationPhase::Materializing)
            | (EvaluationPhase::Materializing, EvaluationPhase::Submitting)
            | (EvaluationPhase::Materializing, EvaluationPhase::Idle)
    ) || from == to
}

/// Flags the UI reads to drive cursors and the loading indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionFlags {
    pub is_drawing: bool,
    pub is_submitting: bool,
    pub reset_requested: bool,
}
