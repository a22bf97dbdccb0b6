use machi_common::SECONDS_PER_HOUR;

use super::{Need, Needs, NEED_MIN};

/// Decay only kicks in once strictly more than this many hours have passed.
pub const DECAY_THRESHOLD_HOURS: f64 = 1.0;

/// Needs after the time elapsed between `last_update` and `now`, or `None` when not
/// enough time has passed (nothing to write, clock left alone).
///
/// Each need loses `floor(elapsed_hours * rate)` and bottoms out at `NEED_MIN`.
pub fn decay(needs: Needs, last_update: i64, now: i64) -> Option<Needs> {
    let elapsed_hours = (now - last_update) as f64 / SECONDS_PER_HOUR as f64;
    if elapsed_hours <= DECAY_THRESHOLD_HOURS {
        return None;
    }

    let mut decayed = needs;
    for need in Need::ALL {
        let loss = (elapsed_hours * need.decay_per_hour() as f64).floor() as i64;
        decayed.set(need, (needs.get(need) - loss).max(NEED_MIN));
    }
    Some(decayed)
}
