use core::fmt;
use core::str::FromStr;

use crate::RootMarginError;

/// One side of a [`RootMargin`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarginLength {
    Px(f32),
    Percent(f32),
}

impl Default for MarginLength {
    fn default() -> Self {
        Self::Px(0.0)
    }
}

impl MarginLength {
    /// Resolves the length against the size of the matching root axis.
    pub fn resolve(self, axis_size: f32) -> f32 {
        match self {
            Self::Px(v) => v,
            Self::Percent(p) => axis_size * p / 100.0,
        }
    }
}

impl FromStr for MarginLength {
    type Err = RootMarginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RootMarginError::InvalidLength(s.to_owned());
        let parse = |num: &str| num.parse::<f32>().ok().filter(|v| v.is_finite());

        if let Some(num) = s.strip_suffix("px") {
            return parse(num).map(Self::Px).ok_or_else(invalid);
        }
        if let Some(num) = s.strip_suffix('%') {
            return parse(num).map(Self::Percent).ok_or_else(invalid);
        }
        // A unitless zero is the only bare number accepted.
        match parse(s) {
            Some(v) if v == 0.0 => Ok(Self::Px(0.0)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for MarginLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// Growth (or shrink, when negative) applied to the visibility root before intersecting.
///
/// Parsed from the CSS margin shorthand: one to four space separated `px` or `%` lengths, e.g.
/// `"0px"`, `"100px 0px"`, `"10% 5px 0px"`. An empty string is the same as `"0px"`.
///
/// With `feature = "serde"`, this type (de)serializes as its string form.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct RootMargin {
    pub top: MarginLength,
    pub right: MarginLength,
    pub bottom: MarginLength,
    pub left: MarginLength,
}

impl RootMargin {
    pub const ZERO: Self = Self {
        top: MarginLength::Px(0.0),
        right: MarginLength::Px(0.0),
        bottom: MarginLength::Px(0.0),
        left: MarginLength::Px(0.0),
    };

    pub fn uniform(length: MarginLength) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }
}

impl FromStr for RootMargin {
    type Err = RootMarginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split_whitespace()
            .map(str::parse::<MarginLength>)
            .collect::<Result<Vec<_>, _>>()?;

        let (top, right, bottom, left) = match parts.as_slice() {
            [] => return Ok(Self::ZERO),
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            _ => return Err(RootMarginError::ComponentCount(parts.len())),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

impl TryFrom<String> for RootMargin {
    type Error = RootMarginError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RootMargin> for String {
    fn from(value: RootMargin) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}
