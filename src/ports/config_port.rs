//! Configuration access port trait.

use chrono::NaiveDate;

use crate::domain::error::SimError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;

    /// `YYYY-MM-DD` value, `Ok(None)` when the key is absent or blank.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, SimError> {
        match self.get_string(section, key) {
            Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .map(Some)
                .map_err(|_| SimError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: "invalid date format (expected YYYY-MM-DD)".into(),
                }),
            _ => Ok(None),
        }
    }
}
