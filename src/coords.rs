//! Coordinate normalization into ICRS decimal degrees.
//!
//! Pure functions: no I/O, no state.

/// Unit tag accompanying raw decimal coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    /// Both axes in decimal degrees.
    #[default]
    Degrees,
    /// Right ascension in hours, declination in degrees.
    HourAngle,
    /// Both axes in radians.
    Radians,
}

/// Which axis a raw angle belongs to. Sexagesimal RA is read as hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    RightAscension,
    Declination,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("non-finite coordinate (ra={ra}, dec={dec})")]
    NonFinite { ra: f64, dec: f64 },

    #[error("declination {0} is outside [-90, 90]")]
    DeclinationOutOfRange(f64),

    #[error("cannot parse angle '{0}'")]
    Unparseable(String),
}

/// Normalize a raw RA/Dec pair to `(ra_deg, dec_deg)`.
///
/// RA wraps into `[0, 360)`; declination must already lie within
/// `[-90, 90]` after unit conversion.
pub fn normalize(ra: f64, dec: f64, unit: AngleUnit) -> Result<(f64, f64), CoordinateError> {
    if !ra.is_finite() || !dec.is_finite() {
        return Err(CoordinateError::NonFinite { ra, dec });
    }

    let (ra_deg, dec_deg) = match unit {
        AngleUnit::Degrees => (ra, dec),
        AngleUnit::HourAngle => (ra * 15.0, dec),
        AngleUnit::Radians => (ra.to_degrees(), dec.to_degrees()),
    };

    if !(-90.0..=90.0).contains(&dec_deg) {
        return Err(CoordinateError::DeclinationOutOfRange(dec_deg));
    }

    Ok((wrap_degrees(ra_deg), dec_deg + 0.0))
}

/// Parse one raw angle field into the value `normalize` expects for `unit`.
///
/// Plain decimals pass through untouched. Sexagesimal text (`hh:mm:ss.s`,
/// `-dd mm ss`) is converted so that the result is in `unit`.
pub fn parse_angle(text: &str, axis: Axis, unit: AngleUnit) -> Result<f64, CoordinateError> {
    let text = text.trim();
    if let Ok(value) = text.parse::<f64>() {
        return Ok(value);
    }

    let value = parse_sexagesimal(text).ok_or_else(|| CoordinateError::Unparseable(text.into()))?;

    // Sexagesimal RA is hours, sexagesimal Dec is degrees; convert to `unit`.
    let degrees = match axis {
        Axis::RightAscension => value * 15.0,
        Axis::Declination => value,
    };
    Ok(match (unit, axis) {
        (AngleUnit::Degrees, _) | (AngleUnit::HourAngle, Axis::Declination) => degrees,
        (AngleUnit::HourAngle, Axis::RightAscension) => value,
        (AngleUnit::Radians, _) => degrees.to_radians(),
    })
}

/// `[+-]a:b:c` or `[+-]a b c` with one to three components.
fn parse_sexagesimal(text: &str) -> Option<f64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let parts: Vec<&str> = rest
        .split(|c: char| c == ':' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut value = 0.0;
    let mut scale = 1.0;
    for (i, part) in parts.iter().enumerate() {
        let component: f64 = part.parse().ok()?;
        if component < 0.0 || (i > 0 && component >= 60.0) {
            return None;
        }
        value += component / scale;
        scale *= 60.0;
    }

    Some(if negative { -value } else { value })
}

fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped + 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_pass_through() {
        let (ra, dec) = normalize(143.112_931, -0.033_82, AngleUnit::Degrees).unwrap();
        assert!((ra - 143.112_931).abs() < 1e-12);
        assert!((dec + 0.033_82).abs() < 1e-12);
    }

    #[test]
    fn ra_wraps_into_range() {
        let (ra, _) = normalize(-10.0, 0.0, AngleUnit::Degrees).unwrap();
        assert!((ra - 350.0).abs() < 1e-12);

        let (ra, _) = normalize(360.0, 0.0, AngleUnit::Degrees).unwrap();
        assert!(ra.abs() < 1e-12);
    }

    #[test]
    fn declination_out_of_range_is_rejected() {
        let err = normalize(10.0, 91.0, AngleUnit::Degrees).unwrap_err();
        assert_eq!(err, CoordinateError::DeclinationOutOfRange(91.0));
    }

    #[test]
    fn poles_are_accepted() {
        assert!(normalize(0.0, 90.0, AngleUnit::Degrees).is_ok());
        assert!(normalize(0.0, -90.0, AngleUnit::Degrees).is_ok());
    }

    #[test]
    fn non_finite_is_rejected() {
        assert!(matches!(
            normalize(f64::NAN, 0.0, AngleUnit::Degrees),
            Err(CoordinateError::NonFinite { .. })
        ));
        assert!(matches!(
            normalize(0.0, f64::INFINITY, AngleUnit::Degrees),
            Err(CoordinateError::NonFinite { .. })
        ));
    }

    #[test]
    fn hour_angle_scales_ra_only() {
        let (ra, dec) = normalize(10.0, 20.0, AngleUnit::HourAngle).unwrap();
        assert!((ra - 150.0).abs() < 1e-12);
        assert!((dec - 20.0).abs() < 1e-12);
    }

    #[test]
    fn radians_convert_both_axes() {
        let (ra, dec) =
            normalize(std::f64::consts::PI, -std::f64::consts::FRAC_PI_4, AngleUnit::Radians)
                .unwrap();
        assert!((ra - 180.0).abs() < 1e-9);
        assert!((dec + 45.0).abs() < 1e-9);
    }

    #[test]
    fn sexagesimal_ra_is_hours() {
        let ra = parse_angle("10:00:00", Axis::RightAscension, AngleUnit::Degrees).unwrap();
        assert!((ra - 150.0).abs() < 1e-9);
    }

    #[test]
    fn sexagesimal_dec_keeps_sign() {
        let dec = parse_angle("-00 30 00", Axis::Declination, AngleUnit::Degrees).unwrap();
        assert!((dec + 0.5).abs() < 1e-9);
    }

    #[test]
    fn sexagesimal_respects_target_unit() {
        let ra = parse_angle("10:30", Axis::RightAscension, AngleUnit::HourAngle).unwrap();
        assert!((ra - 10.5).abs() < 1e-9);
    }

    #[test]
    fn garbage_is_unparseable() {
        assert!(matches!(
            parse_angle("north", Axis::Declination, AngleUnit::Degrees),
            Err(CoordinateError::Unparseable(_))
        ));
        assert!(parse_angle("10:75:00", Axis::Declination, AngleUnit::Degrees).is_err());
    }
}
