//! Wall-clock rendering of instance times.
//!
//! Times are whole minutes. Instance files may write them as `HH:MM`; reports print them the same way.
use crate::dataset::pizzabot::Time;

/// Minutes since midnight for `hours:minutes`, or `None` if `minutes` is not a valid minute or
/// the result does not fit in a `Time`.
pub fn from_hm(hours: i64, minutes: i64) -> Option<Time> {
  if !(0..60).contains(&minutes) || hours < 0 {
    return None;
  }
  hours.checked_mul(60)?.checked_add(minutes)
}

/// Format as `HH:MM`.  Hours are not wrapped at midnight, so `1500` renders as `25:00`.
pub fn format_hm(t: Time) -> String {
  let sign = if t < 0 { "-" } else { "" };
  let t = t.abs();
  format!("{}{:02}:{:02}", sign, t / 60, t % 60)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hm() {
    assert_eq!(from_hm(11, 5), Some(665));
    assert_eq!(from_hm(11, 60), None);
    assert_eq!(from_hm(i64::MAX / 60, 59), None);
    assert_eq!(from_hm(i64::MAX, 0), None);
    assert_eq!(format_hm(665), "11:05");
    assert_eq!(format_hm(0), "00:00");
    assert_eq!(format_hm(1500), "25:00");
    assert_eq!(format_hm(-5), "-00:05");
  }
}
