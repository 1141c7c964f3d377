use std::fmt;
use std::str::FromStr;

use crate::data::*;
use crate::Error;

/// How freshness decays with the time elapsed between an order becoming ready and its delivery.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecayCurve {
    /// 1 at zero elapsed time, falling linearly to 0 at `horizon` and staying there.
    Linear { horizon: Time },
    /// Drops by `1/steps` at the start of each of `steps` equal intervals of `horizon`.
    Stepped { horizon: Time, steps: u32 },
}

impl Default for DecayCurve {
    fn default() -> Self {
        DecayCurve::Linear { horizon: instances::dataset::pizzabot::DEFAULT_HORIZON }
    }
}

impl DecayCurve {
    pub fn horizon(&self) -> Time {
        match *self {
            DecayCurve::Linear { horizon } | DecayCurve::Stepped { horizon, .. } => horizon,
        }
    }

    pub fn with_horizon(self, horizon: Time) -> Self {
        match self {
            DecayCurve::Linear { .. } => DecayCurve::Linear { horizon },
            DecayCurve::Stepped { steps, .. } => DecayCurve::Stepped { horizon, steps },
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.horizon() <= 0 {
            return Err(Error::Configuration(format!("freshness horizon must be positive (got {})", self.horizon())));
        }
        if let DecayCurve::Stepped { steps: 0, .. } = self {
            return Err(Error::Configuration("stepped decay needs at least one step".to_string()));
        }
        Ok(())
    }

    /// Smallest nonzero difference between two freshness values on integer times.
    pub fn resolution(&self) -> f64 {
        match *self {
            DecayCurve::Linear { horizon } => 1.0 / horizon as f64,
            DecayCurve::Stepped { steps, .. } => 1.0 / steps as f64,
        }
    }

    /// Freshness after `elapsed` minutes.  Non-positive elapsed time counts as perfectly fresh.
    pub fn score(&self, elapsed: Time) -> f64 {
        if elapsed <= 0 {
            return 1.0;
        }
        match *self {
            DecayCurve::Linear { horizon } => {
                if elapsed >= horizon { 0.0 } else { 1.0 - elapsed as f64 / horizon as f64 }
            },
            DecayCurve::Stepped { horizon, steps } => {
                let steps = steps as i64;
                // number of intervals started, ceil(elapsed * steps / horizon)
                let k = (elapsed * steps + horizon - 1) / horizon;
                if k >= steps { 0.0 } else { 1.0 - k as f64 / steps as f64 }
            },
        }
    }
}

/// Freshness of an order which became ready at `ready` and was delivered at `delivery`.
#[inline]
pub fn freshness(curve: &DecayCurve, delivery: Time, ready: Time) -> f64 {
    curve.score(delivery - ready)
}

impl fmt::Display for DecayCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecayCurve::Linear { .. } => f.write_str("linear"),
            DecayCurve::Stepped { steps, .. } => write!(f, "stepped:{}", steps),
        }
    }
}

/// Parses `linear` or `stepped:<steps>`.  The horizon is left at its default.
impl FromStr for DecayCurve {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let horizon = DecayCurve::default().horizon();
        let s = s.trim();
        if s.eq_ignore_ascii_case("linear") {
            return Ok(DecayCurve::Linear { horizon });
        }
        let mut parts = s.splitn(2, ':');
        match (parts.next(), parts.next()) {
            (Some(kind), Some(steps)) if kind.eq_ignore_ascii_case("stepped") => {
                let steps = steps.trim().parse()
                    .map_err(|_| Error::Configuration(format!("invalid number of steps: {:?}", steps)))?;
                Ok(DecayCurve::Stepped { horizon, steps })
            },
            _ => Err(Error::Configuration(format!("unknown decay curve {:?} (expected `linear` or `stepped:N`)", s)))
        }
    }
}
