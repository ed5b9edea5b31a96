use crate::command::{ExitCode, Outcome};
use crate::lexer::Operator;
use crate::parser::{CommandLine, Segment};

/// Decide whether the segment after `op` runs, given the last executed status.
pub fn should_run(op: Operator, previous_status: ExitCode) -> bool {
    match op {
        Operator::Sequence => true,
        Operator::And => previous_status == 0,
        Operator::Or => previous_status != 0,
    }
}

/// Walk the segments of `line` left to right and run the ones that are due.
///
/// The first segment always runs. Every later one is gated by the operator in
/// front of it against the status of the last segment that actually ran, which
/// starts out as `initial`. Skipped and empty segments leave that status alone.
///
/// Returns the final status, or stops at the first [`Outcome::Exit`].
pub fn evaluate<F>(line: &CommandLine, initial: ExitCode, mut run: F) -> Outcome
where
    F: FnMut(&Segment) -> Outcome,
{
    let mut status = initial;

    for (i, segment) in line.segments.iter().enumerate() {
        if i > 0 {
            let op = line.operators[i - 1];
            if !should_run(op, status) {
                log::debug!("skipping segment {} after `{}` (status {})", i, op.as_str(), status);
                continue;
            }
        }
        if segment.is_empty() {
            continue;
        }

        match run(segment) {
            Outcome::Status(code) => status = code,
            exit @ Outcome::Exit(_) => return exit,
        }
    }

    Outcome::Status(status)
}
