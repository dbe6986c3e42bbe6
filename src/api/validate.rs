use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::ApiError;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9a-zA-Z_.-]+)@([0-9a-zA-Z_-]+)(\.[0-9a-zA-Z_-]+){1,3}$").expect("email pattern compiles")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Parse a `YYYYMMDD` date; rejects anything that does not round-trip (e.g. 20230230)
pub fn parse_compact_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::parse_from_str(value, "%Y%m%d").ok()?;
    (date.format("%Y%m%d").to_string() == value).then_some(date)
}

/// Posting deadlines must be at least one day after `today`
pub fn parse_deadline(value: &str, today: NaiveDate) -> Result<NaiveDate, ApiError> {
    let deadline = parse_compact_date(value).ok_or_else(|| ApiError::bad_request("deadline must be YYYYMMDD"))?;
    if (deadline - today).num_days() < 1 {
        return Err(ApiError::bad_request("deadline must be at least one day ahead"));
    }
    Ok(deadline)
}

/// Fails with every field whose value is missing or blank
pub fn require_fields(fields: &[(&str, Option<&str>)]) -> Result<(), ApiError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.map(|v| v.trim().is_empty()).unwrap_or(true))
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::missing_fields(&missing))
    }
}

/// Unwrap a required value checked by `require_fields`
pub fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::missing_fields(&[name])),
    }
}

/// Integer id sent either as a JSON number or a numeric string
pub fn int_value(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numbers of a repeated query key (`?platform=1&platform=3`); blank entries are skipped
pub fn int_list(values: &[String], name: &str) -> Result<Vec<i64>, ApiError> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.parse().map_err(|_| ApiError::bad_request(format!("{} must be a number", name))))
        .collect()
}

/// Optional numeric query value; blank reads as absent
pub fn optional_int(value: Option<&str>, name: &str) -> Result<Option<i64>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{} must be a number", name))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("student@school.ac.kr"));
        assert!(is_valid_email("a.b-c_d@mail.com"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@a.b.c.d.e"));
        assert!(!is_valid_email("us er@mail.com"));
    }

    #[test]
    fn compact_dates_must_round_trip() {
        assert_eq!(parse_compact_date("20000229"), NaiveDate::from_ymd_opt(2000, 2, 29));
        assert!(parse_compact_date("20230230").is_none());
        assert!(parse_compact_date("2023-01-01").is_none());
        assert!(parse_compact_date("230101").is_none());
    }

    #[test]
    fn deadline_needs_a_day_of_margin() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert!(parse_deadline("20240510", today).is_err());
        assert!(parse_deadline("20240509", today).is_err());
        assert_eq!(parse_deadline("20240511", today).unwrap(), NaiveDate::from_ymd_opt(2024, 5, 11).unwrap());
    }

    #[test]
    fn repeated_keys_must_be_numbers() {
        let values = vec!["1".to_string(), " 3 ".to_string(), "".to_string()];
        assert_eq!(int_list(&values, "platform").unwrap(), vec![1, 3]);

        let err = int_list(&["abc".to_string()], "platform").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_json()["error"], true);

        assert_eq!(optional_int(Some(" 7 "), "classId").unwrap(), Some(7));
        assert_eq!(optional_int(Some(""), "classId").unwrap(), None);
        assert!(optional_int(Some("x"), "classId").is_err());
    }

    #[test]
    fn require_fields_reports_blank_and_missing() {
        assert!(require_fields(&[("id", Some("a")), ("code", Some("b"))]).is_ok());

        let err = require_fields(&[("id", Some(" ")), ("code", None), ("ok", Some("x"))]).unwrap_err();
        let body = err.to_json();
        assert!(body["field_errors"].get("id").is_some());
        assert!(body["field_errors"].get("code").is_some());
        assert!(body["field_errors"].get("ok").is_none());
    }

    #[test]
    fn ids_accept_numbers_and_numeric_strings() {
        assert_eq!(int_value(Some(&serde_json::json!(3))), Some(3));
        assert_eq!(int_value(Some(&serde_json::json!(" 7 "))), Some(7));
        assert_eq!(int_value(Some(&serde_json::json!("x"))), None);
        assert_eq!(int_value(Some(&serde_json::json!(true))), None);
        assert_eq!(int_value(None), None);
    }
}
