use std::fmt;

use thiserror::Error;

/// Geographic centre and zoom level of a map view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
}

impl ViewportState {
    pub fn new(latitude: f64, longitude: f64, zoom: f64) -> Self {
        Self {
            latitude,
            longitude,
            zoom,
        }
    }
}

/// Fragment appended to the viewer URL after `#`.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Google position segment, `@` included.
    Google(String),
    /// `map=<zoom>/<lat>/<lon>`.
    Map(ViewportState),
    /// A token taken from the page that already uses the viewer's syntax.
    Verbatim(String),
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Google(segment) => write!(f, "google={segment}"),
            Fragment::Map(view) => write!(f, "map={}/{}/{}", view.zoom, view.latitude, view.longitude),
            Fragment::Verbatim(token) => f.write_str(token),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ViewportError {
    #[error("no {0} found in the page")]
    Missing(&'static str),
    #[error("{field} is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("derived {0} is not finite")]
    NotFinite(&'static str),
}

/// Parse a whole token as a decimal number, ignoring surrounding whitespace.
pub fn parse_number(field: &'static str, value: &str) -> Result<f64, ViewportError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| ViewportError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

/// Parse the leading integer of a token (`"10"`, `"10.5"`, `"1000m"` all give
/// their integer prefix).
pub fn parse_leading_integer(field: &'static str, value: &str) -> Result<f64, ViewportError> {
    let trimmed = value.trim_start();
    let digits_start = usize::from(trimmed.starts_with(['-', '+']));
    let digits_end = trimmed[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|offset| digits_start + offset)
        .unwrap_or(trimmed.len());

    if digits_end == digits_start {
        return Err(ViewportError::InvalidNumber {
            field,
            value: value.to_string(),
        });
    }
    parse_number(field, &trimmed[..digits_end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_fragment_uses_shortest_number_form() {
        let fragment = Fragment::Map(ViewportState::new(48.85, 2.35, 12.0));
        assert_eq!(fragment.to_string(), "map=12/48.85/2.35");

        let fragment = Fragment::Map(ViewportState::new(-33.8688, 151.2093, 9.5));
        assert_eq!(fragment.to_string(), "map=9.5/-33.8688/151.2093");
    }

    #[test]
    fn google_and_verbatim_fragments() {
        assert_eq!(
            Fragment::Google("@48.85,2.35,15z".into()).to_string(),
            "google=@48.85,2.35,15z"
        );
        assert_eq!(
            Fragment::Verbatim("map=15/48.85/2.35".into()).to_string(),
            "map=15/48.85/2.35"
        );
    }

    #[test]
    fn numbers_must_be_complete() {
        assert_eq!(parse_number("lat", " 48.85 "), Ok(48.85));
        assert!(parse_number("lat", "48.85x").is_err());
        assert!(parse_number("lat", "").is_err());
        assert!(parse_number("lat", "NaN").is_err());
    }

    #[test]
    fn leading_integer_ignores_the_tail() {
        assert_eq!(parse_leading_integer("lvl", "10"), Ok(10.0));
        assert_eq!(parse_leading_integer("lvl", "10.7"), Ok(10.0));
        assert_eq!(parse_leading_integer("distance", "1500m"), Ok(1500.0));
        assert_eq!(parse_leading_integer("lvl", " -3"), Ok(-3.0));
        assert_eq!(
            parse_leading_integer("lvl", "abc"),
            Err(ViewportError::InvalidNumber {
                field: "lvl",
                value: "abc".into()
            })
        );
        assert!(parse_leading_integer("lvl", "-").is_err());
    }
}
