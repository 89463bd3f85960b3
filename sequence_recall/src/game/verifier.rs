//! Answer verification.

use serde::{Deserialize, Serialize};

use super::entities::Move;

/// Outcome of checking one submitted answer.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Verdict {
    pub correct: bool,
}

/// Compare a submitted sequence against the canonical one.
///
/// Correct iff equal element-wise and in length. Pure: replaying identical
/// inputs yields identical verdicts.
#[must_use]
pub fn verify(expected: &[Move], submitted: &[Move]) -> Verdict {
    Verdict {
        correct: expected == submitted,
    }
}
