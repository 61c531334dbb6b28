use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid latitude: {0}. Must be within [-90, 90]")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0}. Must be within [-180, 180]")]
    InvalidLongitude(f64),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

const MAX_TIMEZONE_LEN: usize = 64;

pub fn validate_latitude(latitude: f64) -> Result<(), ValidationError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::InvalidLatitude(latitude));
    }
    Ok(())
}

pub fn validate_longitude(longitude: f64) -> Result<(), ValidationError> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::InvalidLongitude(longitude));
    }
    Ok(())
}

/// Accepts IANA-shaped names ("Asia/Shanghai", "America/Argentina/Buenos_Aires",
/// "Etc/GMT+8", "UTC") and the provider's "auto".
pub fn validate_timezone(timezone: &str) -> Result<(), ValidationError> {
    let tz = timezone.trim();
    if tz.is_empty() {
        return Err(ValidationError::MissingParameter("timezone".to_string()));
    }

    let invalid = || ValidationError::InvalidTimezone(timezone.to_string());

    if tz.len() > MAX_TIMEZONE_LEN {
        return Err(invalid());
    }

    if !tz
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '+'))
    {
        return Err(invalid());
    }

    if tz.split('/').any(|segment| segment.is_empty()) {
        return Err(invalid());
    }

    Ok(())
}

pub fn validate_coordinates(
    latitude: f64,
    longitude: f64,
    timezone: &str,
) -> Result<(), ValidationError> {
    validate_latitude(latitude)?;
    validate_longitude(longitude)?;
    validate_timezone(timezone)?;
    Ok(())
}
