//! Points and reaction-time statistics

use crate::consts::*;

/// Points for a wave: base + linear time bonus + streak bonus, rounded down to 10
///
/// `streak` is the streak *before* this hit is counted.
pub fn points_for_hit(reaction_ms: u64, streak: u32) -> u64 {
    let time_bonus = MAX_TIME_BONUS.saturating_sub(reaction_ms);
    let streak_bonus = u64::from(streak).saturating_mul(STREAK_BONUS);
    let raw = BASE_POINTS + time_bonus + streak_bonus;
    raw / POINTS_ROUNDING * POINTS_ROUNDING
}

/// Mean reaction time rounded to the nearest millisecond (halves round up), 0 if empty
pub fn average_reaction_ms(times: &[u64]) -> u64 {
    if times.is_empty() {
        return 0;
    }
    let n = times.len() as u128;
    let total: u128 = times.iter().map(|&t| u128::from(t)).sum();
    ((total + n / 2) / n) as u64
}
