// Request validation
// 서비스 호출 전에 입력값 형식을 검증합니다 (Validation 에러는 비즈니스 에러와 별개)
use std::sync::LazyLock;

use regex::Regex;

use crate::shared::config::PasswordPolicy;
use crate::shared::errors::AuthError;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid username regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("valid email regex")
});

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const EMAIL_MAX: usize = 254;
const PASSWORD_MAX: usize = 100;
const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";
const COMMON_PASSWORDS: [&str; 9] = [
    "password",
    "123456",
    "12345678",
    "qwerty",
    "abc123",
    "password123",
    "admin",
    "letmein",
    "welcome",
];

/// 사용자명 검증 후 trim된 값 반환
/// Validate a username and return it trimmed
pub fn validate_username(username: &str) -> Result<String, AuthError> {
    let username = username.trim();
    let len = username.chars().count();

    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(AuthError::validation(
            "username",
            format!(
                "Username must be between {} and {} characters",
                USERNAME_MIN, USERNAME_MAX
            ),
        ));
    }

    if !USERNAME_RE.is_match(username) {
        return Err(AuthError::validation(
            "username",
            "Username must contain only alphanumeric characters, underscores, and hyphens",
        ));
    }

    Ok(username.to_string())
}

/// 이메일 검증 (소문자 정규화는 하지 않음)
/// Validate an email address shape
pub fn validate_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim();

    if email.len() > EMAIL_MAX || !EMAIL_RE.is_match(email) {
        return Err(AuthError::validation("email", "Invalid email address"));
    }

    Ok(email.to_string())
}

/// 비밀번호 강도 검증
/// Check a password against the configured policy
pub fn validate_password(password: &str, policy: &PasswordPolicy) -> Result<(), AuthError> {
    let len = password.chars().count();

    if len < policy.min_length {
        return Err(AuthError::validation(
            "password",
            format!(
                "Password must be at least {} characters long",
                policy.min_length
            ),
        ));
    }

    if len > PASSWORD_MAX {
        return Err(AuthError::validation(
            "password",
            format!("Password must be at most {} characters long", PASSWORD_MAX),
        ));
    }

    if policy.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AuthError::validation(
            "password",
            "Password must contain at least one uppercase letter",
        ));
    }

    if policy.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AuthError::validation(
            "password",
            "Password must contain at least one lowercase letter",
        ));
    }

    if policy.require_digits && !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::validation(
            "password",
            "Password must contain at least one digit",
        ));
    }

    if policy.require_special && !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err(AuthError::validation(
            "password",
            "Password must contain at least one special character",
        ));
    }

    if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
        return Err(AuthError::validation("password", "Password is too common"));
    }

    Ok(())
}

pub fn require_non_empty(field: &str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::validation(field, format!("{} must not be empty", field)));
    }
    Ok(())
}
