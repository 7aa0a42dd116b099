use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),
}

pub fn validate_identifier(name: &str) -> Result<(), SanitizeError> {
    if name.is_empty() {
        return Err(SanitizeError::InvalidIdentifier("empty".to_string()));
    }
    if name.len() > 128 {
        return Err(SanitizeError::InvalidIdentifier(format!(
            "too long: {}",
            name.len()
        )));
    }
    if name.contains(['"', '\x00', ';', '`', '\\']) {
        return Err(SanitizeError::InvalidIdentifier(format!(
            "forbidden characters in: {}",
            name
        )));
    }
    Ok(())
}

/// `"name"`, after validation.
pub fn quote_identifier(name: &str) -> Result<String, SanitizeError> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name))
}

/// `'value'` with embedded single quotes doubled.
pub fn quote_literal(value: &str) -> Result<String, SanitizeError> {
    if value.contains('\x00') {
        return Err(SanitizeError::InvalidLiteral("NUL byte".to_string()));
    }
    Ok(format!("'{}'", value.replace('\'', "''")))
}
