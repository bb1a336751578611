//! Registration and login form schemas.
//!
//! Nothing routes to these yet; they only describe which fields an account
//! flow would accept. Each field runs its rules in order and stops at the
//! first failed `InputRequired`.

use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    InputRequired,
    Email,
    /// Inclusive bounds on the number of characters.
    Length { min: usize, max: usize },
}

impl Rule {
    fn check(&self, value: &str) -> Result<(), String> {
        match *self {
            Rule::InputRequired if value.is_empty() => Err("This field is required.".to_string()),
            Rule::InputRequired => Ok(()),
            Rule::Email if EMAIL.is_match(value) => Ok(()),
            Rule::Email => Err("Invalid email address.".to_string()),
            Rule::Length { min, max } => {
                let len = value.chars().count();
                if (min..=max).contains(&len) {
                    Ok(())
                } else {
                    Err(format!(
                        "Field must be between {} and {} characters long.",
                        min, max
                    ))
                }
            }
        }
    }
}

/// Messages per failing field, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    fn run(&mut self, name: &'static str, value: &str, rules: &[Rule]) {
        let mut messages = Vec::new();
        for rule in rules {
            if let Err(message) = rule.check(value) {
                messages.push(message);
                if *rule == Rule::InputRequired {
                    break;
                }
            }
        }

        if !messages.is_empty() {
            self.0.insert(name, messages);
        }
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

pub trait Validate {
    fn validate(&self) -> Result<(), FormErrors>;
}

#[derive(Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegistrationForm {
    pub const USERNAME: &'static [Rule] = &[Rule::InputRequired, Rule::Length { min: 4, max: 150 }];
    pub const EMAIL: &'static [Rule] = &[
        Rule::InputRequired,
        Rule::Email,
        Rule::Length { min: 6, max: 150 },
    ];
    pub const PASSWORD: &'static [Rule] = &[Rule::InputRequired, Rule::Length { min: 6, max: 150 }];
}

impl Validate for RegistrationForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.run("username", &self.username, Self::USERNAME);
        errors.run("email", &self.email, Self::EMAIL);
        errors.run("password", &self.password, Self::PASSWORD);
        errors.into_result()
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub const EMAIL: &'static [Rule] = &[Rule::InputRequired, Rule::Email];
    pub const PASSWORD: &'static [Rule] = &[Rule::InputRequired];
}

impl Validate for LoginForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.run("email", &self.email, Self::EMAIL);
        errors.run("password", &self.password, Self::PASSWORD);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(username: &str, email: &str, password: &str) -> RegistrationForm {
        RegistrationForm {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn valid_registration() {
        assert!(registration("alice", "alice@example.com", "hunter22")
            .validate()
            .is_ok());
    }

    #[test]
    fn registration_length_bounds_are_inclusive() {
        let long = "a".repeat(150);
        assert!(registration("abcd", "a@b.co", "secret").validate().is_ok());
        assert!(registration(&long, "a@b.co", &long).validate().is_ok());

        let errors = registration("abc", "a@b.co", "secret")
            .validate()
            .unwrap_err();
        assert_eq!(
            errors.field("username"),
            Some(&["Field must be between 4 and 150 characters long.".to_string()][..])
        );
        assert_eq!(errors.field("email"), None);

        let too_long = "a".repeat(151);
        let errors = registration("alice", "a@b.co", &too_long)
            .validate()
            .unwrap_err();
        assert!(errors.field("password").is_some());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(registration("żółw", "a@b.co", "secret").validate().is_ok());
    }

    #[test]
    fn empty_fields_only_report_required() {
        let errors = registration("", "", "").validate().unwrap_err();

        for field in ["username", "email", "password"] {
            assert_eq!(
                errors.field(field),
                Some(&["This field is required.".to_string()][..]),
                "{field}"
            );
        }
    }

    #[test]
    fn short_invalid_email_reports_every_failure() {
        let errors = registration("alice", "a@b", "secret").validate().unwrap_err();

        assert_eq!(
            errors.field("email"),
            Some(
                &[
                    "Invalid email address.".to_string(),
                    "Field must be between 6 and 150 characters long.".to_string(),
                ][..]
            )
        );
    }

    #[test]
    fn login_rules() {
        let ok = LoginForm {
            email: "bob@example.org".into(),
            password: "x".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = LoginForm {
            email: "not an email".into(),
            password: String::new(),
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(
            errors.field("email"),
            Some(&["Invalid email address.".to_string()][..])
        );
        assert_eq!(
            errors.field("password"),
            Some(&["This field is required.".to_string()][..])
        );
        assert_eq!(
            errors.to_string(),
            "email: Invalid email address.; password: This field is required."
        );
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let form: LoginForm = serde_json::from_str(r#"{"email": "bob@example.org"}"#).unwrap();
        let errors = form.validate().unwrap_err();

        assert!(errors.field("email").is_none());
        assert!(errors.field("password").is_some());
    }
}
