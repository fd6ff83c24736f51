use crate::error::CoreError;

/// Minimum number of non-empty choices a question must carry.
pub const MIN_CHOICES: usize = 2;

/// Trim `raw` and check it is non-empty and at most `max_len` characters.
pub fn required_text(field: &str, raw: &str, max_len: usize) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(CoreError::InvalidInput(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Drop blank entries, trim the rest, and enforce the choice count and length bounds.
pub fn choice_texts<S: AsRef<str>>(
    raw: &[S],
    max_len: usize,
    max_choices: usize,
) -> Result<Vec<String>, CoreError> {
    let kept: Vec<&str> = raw
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|c| !c.is_empty())
        .collect();

    if kept.len() < MIN_CHOICES {
        return Err(CoreError::InvalidInput(format!(
            "a question needs at least {MIN_CHOICES} non-empty choices"
        )));
    }
    if kept.len() > max_choices {
        return Err(CoreError::InvalidInput(format!(
            "a question may have at most {max_choices} choices"
        )));
    }
    kept.into_iter()
        .map(|c| required_text("choice", c, max_len))
        .collect()
}
