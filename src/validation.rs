//! Form field normalization and validation.
//!
//! Form values arrive as optional strings. Blank values are treated as absent;
//! failures carry the user-facing message shown in the page banner.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::datetime::parse_instant;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static E164: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+[1-9]\d{6,14}$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type Validated<T> = Result<T, ValidationError>;

/// Trimmed value, `None` when missing or blank.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

pub fn required(value: Option<&str>, message: &str) -> Validated<String> {
    optional(value).ok_or_else(|| ValidationError::new(message))
}

pub fn parse_id(value: Option<&str>, message: &str) -> Validated<Uuid> {
    let raw = required(value, message)?;
    Uuid::parse_str(&raw).map_err(|_| ValidationError::new("Identifiant invalide"))
}

pub fn optional_id(value: Option<&str>) -> Validated<Option<Uuid>> {
    optional(value)
        .map(|raw| Uuid::parse_str(&raw).map_err(|_| ValidationError::new("Identifiant invalide")))
        .transpose()
}

/// Parse a stored-vocabulary value such as `discharged` or `A+`.
pub fn parse_choice<T: FromStr>(value: Option<&str>, field: &str) -> Validated<T> {
    let raw = required(value, &format!("{field} requis"))?;
    T::from_str(&raw).map_err(|_| ValidationError::new(format!("{field} invalide: {raw}")))
}

pub fn optional_choice<T: FromStr>(value: Option<&str>, field: &str) -> Validated<Option<T>> {
    match optional(value) {
        Some(_) => parse_choice(value, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_datetime(value: Option<&str>, message: &str) -> Validated<DateTime<Utc>> {
    optional(value)
        .and_then(|raw| parse_instant(&raw))
        .ok_or_else(|| ValidationError::new(message))
}

/// Missing is fine; present but unparseable is an error.
pub fn optional_datetime(value: Option<&str>, message: &str) -> Validated<Option<DateTime<Utc>>> {
    match optional(value) {
        Some(raw) => parse_instant(&raw)
            .map(Some)
            .ok_or_else(|| ValidationError::new(message)),
        None => Ok(None),
    }
}

pub fn optional_date(value: Option<&str>) -> Validated<Option<NaiveDate>> {
    match optional(value) {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ValidationError::new("Date de naissance invalide")),
        None => Ok(None),
    }
}

pub fn optional_email(value: Option<&str>) -> Validated<Option<String>> {
    match optional(value) {
        Some(email) if EMAIL.is_match(&email) => Ok(Some(email)),
        Some(_) => Err(ValidationError::new("Adresse email invalide")),
        None => Ok(None),
    }
}

/// Build an E.164 number from a country code and a local number.
///
/// Non-digits are stripped from both parts. Both blank means no phone.
pub fn e164_phone(country_code: Option<&str>, number: Option<&str>) -> Validated<Option<String>> {
    let cc = optional(country_code);
    let num = optional(number);
    if cc.is_none() && num.is_none() {
        return Ok(None);
    }
    let digits = |s: Option<String>| -> String {
        s.unwrap_or_default().chars().filter(char::is_ascii_digit).collect()
    };
    let (cc, num) = (digits(cc), digits(num));
    let phone = format!("+{cc}{num}");
    if cc.is_empty() || num.is_empty() || !E164.is_match(&phone) {
        return Err(ValidationError::new("Numéro de téléphone invalide"));
    }
    Ok(Some(phone))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{BloodType, Gender};

    #[test]
    fn blank_is_absent() {
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(None), None);
        assert_eq!(optional(Some(" Léa ")), Some("Léa".into()));
        assert_eq!(required(Some(""), "Nom requis").unwrap_err().0, "Nom requis");
    }

    #[test]
    fn ids_must_be_uuids() {
        assert!(parse_id(Some("nope"), "ID manquant").is_err());
        assert_eq!(parse_id(None, "ID manquant").unwrap_err().0, "ID manquant");
        assert_eq!(optional_id(Some("")).unwrap(), None);
        let id = Uuid::new_v4();
        assert_eq!(optional_id(Some(&id.to_string())).unwrap(), Some(id));
    }

    #[test]
    fn choices_use_storage_vocabulary() {
        let g: Gender = parse_choice(Some("female"), "Genre").unwrap();
        assert_eq!(g, Gender::Female);
        let err = parse_choice::<Gender>(Some("f"), "Genre").unwrap_err();
        assert_eq!(err.0, "Genre invalide: f");
        assert_eq!(optional_choice::<BloodType>(Some(""), "Groupe").unwrap(), None);
        assert_eq!(
            optional_choice::<BloodType>(Some("AB-"), "Groupe").unwrap(),
            Some(BloodType::AbNegative)
        );
    }

    #[test]
    fn datetimes() {
        assert!(parse_datetime(Some("2024-05-01T10:00"), "bad").is_ok());
        assert_eq!(parse_datetime(Some("demain"), "bad").unwrap_err().0, "bad");
        assert_eq!(optional_datetime(Some(" "), "bad").unwrap(), None);
        assert!(optional_datetime(Some("x"), "bad").is_err());
    }

    #[test]
    fn email_shape() {
        assert_eq!(optional_email(Some("a@b.fr")).unwrap(), Some("a@b.fr".into()));
        assert!(optional_email(Some("a@b")).is_err());
        assert_eq!(optional_email(Some("")).unwrap(), None);
    }

    #[test]
    fn e164_building() {
        assert_eq!(
            e164_phone(Some("+33"), Some("6 12 34 56 78")).unwrap(),
            Some("+33612345678".into())
        );
        assert_eq!(e164_phone(None, Some("  ")).unwrap(), None);
        assert!(e164_phone(Some("33"), None).is_err());
        assert!(e164_phone(Some("0"), Some("612345678")).is_err());
        assert!(e164_phone(Some("33"), Some("12")).is_err());
    }
}
