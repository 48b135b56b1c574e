use serde::Serialize;
use thiserror::Error;

/// First disagreeing slot between a submitted and an expected answer
/// sequence. `index` is 0-based; slot ordering must be stable and tied to
/// the same question across calls for the comparison to mean anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub index: usize,
    pub submitted: String,
    pub expected: String,
}

/// The two sequences must be the same length; anything else is a caller
/// error, not a comparison.
#[derive(Debug, Error)]
#[error("answer count mismatch: {submitted} submitted, {expected} expected")]
pub struct AnswerCountMismatch {
    pub submitted: usize,
    pub expected: usize,
}

/// Scans slots left to right and reports the first one where the submitted
/// value differs from the expected value. Exact string equality, no trimming
/// or case folding. `Ok(None)` means every slot agrees; later mismatches are
/// never inspected.
pub fn locate(
    submitted: &[String],
    expected: &[String],
) -> Result<Option<Mismatch>, AnswerCountMismatch> {
    if submitted.len() != expected.len() {
        return Err(AnswerCountMismatch {
            submitted: submitted.len(),
            expected: expected.len(),
        });
    }

    for (index, (got, want)) in submitted.iter().zip(expected.iter()).enumerate() {
        if got != want {
            return Ok(Some(Mismatch {
                index,
                submitted: got.clone(),
                expected: want.clone(),
            }));
        }
    }

    Ok(None)
}

/// MCQ equality is membership, not position: the submitted answer (trimmed)
/// must exactly equal at least one accepted answer (each trimmed).
/// Case-sensitive.
pub fn mcq_answer_is_correct(submitted: &str, accepted: &[String]) -> bool {
    let submitted = submitted.trim();
    accepted.iter().any(|answer| answer.trim() == submitted)
}
