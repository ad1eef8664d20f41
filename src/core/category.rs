use crate::errors::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid category regex"));

const SHELL_SPECIALS: &[char] = &['!', '$', '`', '\\'];

/// Categories are plain tags: letters, digits, `_` and `-`.
pub fn validate_category(category: &str) -> AppResult<()> {
    if category.contains(SHELL_SPECIALS) {
        return Err(AppError::InvalidCategory(
            "category contains shell special characters (!$`\\) that may cause issues. \
             Use only alphanumeric characters, underscores (_), and hyphens (-)"
                .to_string(),
        ));
    }

    if !CATEGORY_RE.is_match(category) {
        return Err(AppError::InvalidCategory(
            "category must contain only alphanumeric characters, underscores (_), and hyphens (-)"
                .to_string(),
        ));
    }

    Ok(())
}
