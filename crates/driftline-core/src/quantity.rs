//! Quantity normalizer — converts unit-suffixed numeric tokens to seconds.
//!
//! Every offset/std-dev field across the chrony sourcestats and tracking
//! grammars goes through [`parse_quantity`]. PTP values are integers already
//! in nanoseconds and bypass this module entirely.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Full-token grammar: `[sign]digits[.digits][unit]`. Partial matches are
/// rejected; the unit alternation lists `ns` before `s` so the longest
/// suffix wins.
static RE_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<num>[+-]?\d+(?:\.\d+)?)(?P<unit>ns|us|ms|s)?$")
        .expect("hardcoded quantity regex must compile")
});

/// Parse a token like `-11us`, `-328ns`, `0.000424827`, `1.2ms` or `0.5s`
/// into seconds. A token without a unit suffix defaults to seconds.
///
/// Fails with [`Error::MalformedQuantity`] if the token does not match the
/// grammar exactly; this is fatal to the run.
pub fn parse_quantity(token: &str) -> Result<f64> {
    let token = token.trim();
    let caps = RE_QUANTITY
        .captures(token)
        .ok_or_else(|| Error::MalformedQuantity {
            token: token.to_string(),
        })?;

    let num: f64 = caps["num"].parse().map_err(|_| Error::MalformedQuantity {
        token: token.to_string(),
    })?;

    let scale = match caps.name("unit").map(|m| m.as_str()) {
        None | Some("s") => 1.0,
        Some("ms") => 1e-3,
        Some("us") => 1e-6,
        Some("ns") => 1e-9,
        // Unreachable while the regex alternation is the closed set above.
        Some(unit) => {
            return Err(Error::MalformedQuantity {
                token: format!("{token} (unknown unit {unit})"),
            })
        }
    };

    Ok(num * scale)
}
