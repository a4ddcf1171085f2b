//! Station labels and next-station suggestions.
//!
//! Labels are written `K/MMM` (kilometres / metres), e.g. `1/250` is 1250 m
//! along the line. `K+MMM` and bare metre values are accepted on input.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  survey::{Phase, Purpose, Survey},
};

/// A distance along the survey line, in metres.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Chainage(f64);

impl Chainage {
  pub fn from_metres(metres: f64) -> Self { Self(metres) }

  pub fn metres(self) -> f64 { self.0 }

  /// The station `multiple` metres further on.
  pub fn next(self, multiple: u32) -> Self { Self(self.0 + f64::from(multiple)) }
}

impl FromStr for Chainage {
  type Err = Error;

  fn from_str(label: &str) -> Result<Self> {
    let invalid = || Error::InvalidChainage(label.to_owned());
    let trimmed = label.trim();

    let metres = match trimmed.split_once(['/', '+']) {
      Some((km, m)) => {
        let km: f64 = km.trim().parse().map_err(|_| invalid())?;
        let m: f64 = m.trim().parse().map_err(|_| invalid())?;
        if km < 0.0 || m < 0.0 {
          return Err(invalid());
        }
        km * 1000.0 + m
      }
      None => trimmed.parse().map_err(|_| invalid())?,
    };

    if metres.is_finite() { Ok(Self(metres)) } else { Err(invalid()) }
  }
}

impl fmt::Display for Chainage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let km = (self.0 / 1000.0).floor();
    let m = self.0 - km * 1000.0;
    if m.fract() == 0.0 {
      write!(f, "{km}/{m:03}")
    } else {
      write!(f, "{km}/{m:07.3}")
    }
  }
}

// ─── Suggestions ─────────────────────────────────────────────────────────────

/// What the capture form should pre-fill for the next chainage row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextChainage {
  pub chainage: String,
  /// Offsets to reuse so every pass lines up on the same cross-section.
  pub offsets:  Vec<f64>,
}

/// Suggest the next station for `purpose`.
///
/// Actual passes advance the last recorded station by the survey's chainage
/// multiple and reuse its offsets. Proposal passes follow the stations of
/// `initial` in the order it recorded them; `None` once every station has a
/// design level.
pub fn next_chainage(
  survey: &Survey,
  purpose: &Purpose,
  initial: Option<&Purpose>,
) -> Option<NextChainage> {
  match purpose.phase {
    Phase::Proposal => {
      let (_, ch) = initial?
        .chainages()
        .find(|(_, ch)| purpose.find_chainage(&ch.chainage).is_none())?;
      Some(NextChainage {
        chainage: ch.chainage.clone(),
        offsets:  ch.offsets.clone(),
      })
    }
    Phase::Actual => {
      let Some((_, last)) = purpose.chainages().last() else {
        return Some(NextChainage {
          chainage: Chainage::from_metres(0.0).to_string(),
          offsets:  Vec::new(),
        });
      };
      let station = last.chainage.parse::<Chainage>().ok()?;
      Some(NextChainage {
        chainage: station.next(survey.chainage_multiple).to_string(),
        offsets:  last.offsets.clone(),
      })
    }
  }
}
