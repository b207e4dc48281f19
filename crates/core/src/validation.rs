//! Inline form validation.
//!
//! Validators never fail: they return the list of field errors for the form to
//! render next to each input. An empty list means the form may be submitted.

use serde::Serialize;

use crate::ClientInput;

/// Minimum accepted password length for registration and password change.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A single inline error attached to a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Registration form fields (attorney self-signup or client invitation).
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
    /// Required only for attorney signup, which also creates the firm.
    pub company_name: Option<&'a str>,
}

/// Loose email shape check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

fn require(errors: &mut Vec<FieldError>, field: &'static str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{label} is required")));
    }
}

fn check_email(errors: &mut Vec<FieldError>, email: &str) {
    if email.trim().is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    } else if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Enter a valid email address"));
    }
}

fn check_new_password(errors: &mut Vec<FieldError>, password: &str, confirm: &str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if password != confirm {
        errors.push(FieldError::new("confirmPassword", "Passwords do not match"));
    }
}

pub fn validate_client(input: &ClientInput) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, "firstName", &input.first_name, "First name");
    require(&mut errors, "lastName", &input.last_name, "Last name");
    check_email(&mut errors, &input.email);

    let a_number = input
        .alien_number
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(a_number) = a_number {
        let digits: String = a_number
            .trim_start_matches(['A', 'a'])
            .chars()
            .filter(|c| *c != '-')
            .collect();
        if !matches!(digits.len(), 8 | 9) || !digits.chars().all(|c| c.is_ascii_digit()) {
            errors.push(FieldError::new(
                "alienNumber",
                "A-Number must be 8 or 9 digits",
            ));
        }
    }

    errors
}

pub fn validate_registration(form: &RegistrationForm<'_>) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, "firstName", form.first_name, "First name");
    require(&mut errors, "lastName", form.last_name, "Last name");
    check_email(&mut errors, form.email);
    check_new_password(&mut errors, form.password, form.confirm_password);
    if let Some(company) = form.company_name {
        require(&mut errors, "companyName", company, "Company name");
    }
    errors
}

pub fn validate_password_change(current: &str, new: &str, confirm: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, "currentPassword", current, "Current password");
    check_new_password(&mut errors, new, confirm);
    if !current.is_empty() && current == new {
        errors.push(FieldError::new(
            "password",
            "New password must differ from the current one",
        ));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(errors: &[FieldError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email(" ana.lima@firm.co.uk "));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana@@example.com"));
        assert!(!is_valid_email("ana lima@example.com"));
    }

    #[test]
    fn client_form_reports_every_missing_field() {
        let errors = validate_client(&ClientInput::default());
        assert_eq!(fields(&errors), vec!["firstName", "lastName", "email"]);
    }

    #[test]
    fn client_form_checks_a_number() {
        let mut input = ClientInput {
            first_name: "Ana".into(),
            last_name: "Lima".into(),
            email: "ana@example.com".into(),
            alien_number: Some("A-123456789".into()),
            ..ClientInput::default()
        };
        assert!(validate_client(&input).is_empty());

        input.alien_number = Some("A12".into());
        assert_eq!(fields(&validate_client(&input)), vec!["alienNumber"]);

        input.alien_number = Some(String::new());
        assert!(validate_client(&input).is_empty());
    }

    #[test]
    fn registration_requires_matching_passwords_and_company_for_attorneys() {
        let form = RegistrationForm {
            first_name: "Ana",
            last_name: "Lima",
            email: "ana@example.com",
            password: "short",
            confirm_password: "other",
            company_name: Some(" "),
        };
        assert_eq!(
            fields(&validate_registration(&form)),
            vec!["password", "confirmPassword", "companyName"]
        );
    }

    #[test]
    fn password_change_rejects_reuse() {
        let errors = validate_password_change("hunter2hunter2", "hunter2hunter2", "hunter2hunter2");
        assert_eq!(fields(&errors), vec!["password"]);
    }
}
