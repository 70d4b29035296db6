use crate::utils::error::{IntentError, Result};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> IntentError {
    IntentError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Gemini 端點只接受 http(s)
pub fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| invalid(field, value, format!("Invalid URL: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(
            field,
            value,
            format!("Expected http or https, got {}", scheme),
        )),
    }
}

pub fn validate_dir(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "Directory cannot be empty"));
    }
    if value.contains('\0') {
        return Err(invalid(field, value, "Directory contains a NUL byte"));
    }
    Ok(())
}

pub fn validate_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "Value cannot be blank"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field,
            value,
            format!("Expected a value in {}..={}", min, max),
        ));
    }
    Ok(())
}

/// 副檔名不分大小寫
pub fn validate_file_extension(field: &str, file: &str, allowed: &[&str]) -> Result<()> {
    let extension = Path::new(file).extension().and_then(|ext| ext.to_str());
    match extension {
        Some(ext) if allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)) => Ok(()),
        Some(ext) => Err(invalid(
            field,
            file,
            format!("Expected a .{} file, got .{}", allowed.join(" / ."), ext),
        )),
        None => Err(invalid(field, file, "File name has no extension")),
    }
}
