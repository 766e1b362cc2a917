use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{OpError, OpResult};

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());
static STUDENT_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").unwrap());
static TEACHER_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^teacher\d{3}$").unwrap());
static COURSE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2,4}\d{3}$").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.+-]+@[A-Za-z0-9-]+\.[A-Za-z0-9-.]+$").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^1\d{10}$").unwrap());

pub fn username(value: &str) -> OpResult<()> {
    if value.is_empty() {
        return Err(OpError::validation("username must not be empty"));
    }
    if value.len() < 3 || value.len() > 20 {
        return Err(OpError::validation("username must be 3-20 characters"));
    }
    if !USERNAME_RE.is_match(value) {
        return Err(OpError::validation(
            "username may only contain letters, digits and underscores",
        ));
    }
    Ok(())
}

pub fn password(value: &str) -> OpResult<()> {
    if value.is_empty() {
        return Err(OpError::validation("password must not be empty"));
    }
    if value.len() < 6 || value.len() > 20 {
        return Err(OpError::validation("password must be 6-20 characters"));
    }
    Ok(())
}

pub fn student_id(value: &str) -> OpResult<()> {
    if !STUDENT_ID_RE.is_match(value) {
        return Err(OpError::validation("student id must be 10 digits"));
    }
    Ok(())
}

pub fn teacher_id(value: &str) -> OpResult<()> {
    if !TEACHER_ID_RE.is_match(value) {
        return Err(OpError::validation(
            "teacher id must look like teacher001",
        ));
    }
    Ok(())
}

pub fn course_id(value: &str) -> OpResult<()> {
    if !COURSE_ID_RE.is_match(value) {
        return Err(OpError::validation("course id must look like CS101"));
    }
    Ok(())
}

/// Email is optional; empty means not provided.
pub fn email(value: &str) -> OpResult<()> {
    if value.is_empty() {
        return Ok(());
    }
    if !EMAIL_RE.is_match(value) {
        return Err(OpError::validation("invalid email address"));
    }
    Ok(())
}

/// Phone is optional; empty means not provided.
pub fn phone(value: &str) -> OpResult<()> {
    if value.is_empty() {
        return Ok(());
    }
    if !PHONE_RE.is_match(value) {
        return Err(OpError::validation("invalid phone number"));
    }
    Ok(())
}

pub fn score(value: f64) -> OpResult<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(OpError::validation("score must be between 0 and 100"));
    }
    Ok(())
}

pub fn credits(value: f64) -> OpResult<()> {
    if !value.is_finite() || value <= 0.0 || value > 10.0 {
        return Err(OpError::validation("credits must be between 0 and 10"));
    }
    Ok(())
}

pub fn hours(value: i64) -> OpResult<()> {
    if value <= 0 || value > 200 {
        return Err(OpError::validation("hours must be between 0 and 200"));
    }
    Ok(())
}

pub fn capacity(value: i64) -> OpResult<()> {
    if value <= 0 || value > 500 {
        return Err(OpError::validation("capacity must be between 0 and 500"));
    }
    Ok(())
}

pub fn name(value: &str) -> OpResult<()> {
    let len = value.chars().count();
    if len < 2 || len > 20 {
        return Err(OpError::validation("name must be 2-20 characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_formats() {
        assert!(student_id("2021001001").is_ok());
        assert!(student_id("20210").is_err());
        assert!(teacher_id("teacher001").is_ok());
        assert!(teacher_id("prof001").is_err());
        assert!(course_id("CS101").is_ok());
        assert!(course_id("cs101").is_err());
        assert!(course_id("TOOLONG101").is_err());
    }

    #[test]
    fn optional_fields_accept_empty() {
        assert!(email("").is_ok());
        assert!(phone("").is_ok());
        assert!(email("not-an-email").is_err());
        assert!(phone("555").is_err());
    }

    #[test]
    fn score_range() {
        assert!(score(0.0).is_ok());
        assert!(score(100.0).is_ok());
        assert!(score(100.01).is_err());
        assert!(score(-0.5).is_err());
        assert!(score(f64::NAN).is_err());
    }
}
