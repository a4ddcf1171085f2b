//! Millimetre rounding and forgiving numeric decoding.
//!
//! Field forms submit sights as whatever the input widget produced: numbers,
//! numeric strings, empty strings or `null`. The engine never rejects those;
//! anything that is not a finite number decodes to `0.0`.

use serde::{Deserialize, Deserializer, de::IgnoredAny};

/// Round to three decimal places and normalise `-0.0` to `0.0`.
pub fn round3(value: f64) -> f64 {
  let rounded = (value * 1000.0).round() / 1000.0;
  if rounded == 0.0 { 0.0 } else { rounded }
}

/// Parse a staff reading typed as text. Blank or garbage input reads as `0.0`.
pub fn parse_loose(text: &str) -> f64 {
  text
    .trim()
    .parse::<f64>()
    .ok()
    .filter(|v| v.is_finite())
    .unwrap_or(0.0)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
  Number(Option<f64>),
  Text(String),
  Other(IgnoredAny),
}

impl LooseNumber {
  fn value(self) -> f64 {
    match self {
      Self::Number(Some(v)) if v.is_finite() => v,
      Self::Text(s) => parse_loose(&s),
      _ => 0.0,
    }
  }
}

/// `deserialize_with` helper for a single sight, level or offset.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(LooseNumber::deserialize(deserializer)?.value())
}

/// `deserialize_with` helper for a list of readings. `null` reads as empty.
pub fn lenient_vec<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let items: Option<Vec<LooseNumber>> = Option::deserialize(deserializer)?;
  Ok(
    items
      .unwrap_or_default()
      .into_iter()
      .map(LooseNumber::value)
      .collect(),
  )
}
