pub mod pizzabot;
use std::borrow::Cow;

/// Validated conversion from a parsed file.  `id` names the instance when the file does not.
pub trait TryFromRaw<T> where Self: Sized {
  type Error;

  fn try_from_raw(raw: T, id: Cow<str>) -> Result<Self, Self::Error>;
}
