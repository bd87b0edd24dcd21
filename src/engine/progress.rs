//! Client-side progress heuristic. The backend reports no percentage, so the
//! bar advances a fixed step per status line and stops short of complete
//! until the terminal event arrives.

pub const RUN_START: u8 = 10;
pub const STEP: u8 = 8;
pub const CEILING: u8 = 90;
pub const COMPLETE: u8 = 100;

/// Progress after one more status line. Never decreases.
pub fn advance(progress: u8) -> u8 {
    progress.max(progress.saturating_add(STEP).min(CEILING))
}

/// Progress after `n` status lines since the run started.
pub fn after_messages(n: usize) -> u8 {
    let steps = n.min(usize::from(CEILING));
    (usize::from(RUN_START) + usize::from(STEP) * steps).min(usize::from(CEILING)) as u8
}
