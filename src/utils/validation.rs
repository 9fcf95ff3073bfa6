use crate::utils::error::{ErrorKind, Result};
use chrono::NaiveDate;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ErrorKind::validation(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ErrorKind::validation(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(ErrorKind::validation(
            field_name,
            url_str,
            format!("Invalid URL format: {}", e),
        )),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ErrorKind::validation(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ErrorKind::validation(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// Rejects day numbers that do not exist in the given month (Feb 30, Apr 31, ...).
pub fn validate_calendar_date(field_name: &str, year: i32, month: u32, day: u32) -> Result<()> {
    if NaiveDate::from_ymd_opt(year, month, day).is_none() {
        return Err(ErrorKind::validation(
            field_name,
            format!("{}-{}-{}", year, month, day),
            "Date does not exist in the calendar",
        ));
    }
    Ok(())
}

/// A pillar is one heavenly stem followed by one earthly branch.
pub fn validate_pillar(field_name: &str, value: &str) -> Result<()> {
    if value.chars().count() != 2 {
        return Err(ErrorKind::validation(
            field_name,
            value,
            "Pillar must be a two-character stem-branch label",
        ));
    }
    Ok(())
}
