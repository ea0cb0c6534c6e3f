/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Next strictly increasing millisecond id.
///
/// Uses the wall clock when it is ahead of `last`, otherwise `last + 1`,
/// so ids created within the same millisecond (or after the clock steps
/// backwards) stay unique and ordered.
pub fn next_millis_id(last: i64) -> i64 {
    now_millis().max(last.saturating_add(1))
}
