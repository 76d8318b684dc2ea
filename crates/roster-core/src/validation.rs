//! Field validation rules for user input.
//!
//! Every rule fails with [`RosterError::Validation`] naming the offending
//! field. The same rules run on creation and on every update so a record
//! can never hold a value that creation would have rejected.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{RosterError, RosterResult};
use crate::models::user::{Profile, UserDraft, UserPatch};

/// Top-level domains accepted for email addresses.
pub const ALLOWED_EMAIL_TLDS: &[&str] = &["com", "org", "edu", "net", "gov"];

/// Nicknames that would impersonate a role or a system value.
pub const RESERVED_NICKNAMES: &[&str] = &[
    "admin",
    "moderator",
    "null",
    "manager",
    "anonymous",
    "authenticated",
];

pub const EMAIL_MAX_LEN: usize = 255;
pub const NICKNAME_MIN_LEN: usize = 3;
pub const NICKNAME_MAX_LEN: usize = 50;
pub const NAME_MAX_LEN: usize = 100;
pub const BIO_MAX_LEN: usize = 500;
pub const URL_MAX_LEN: usize = 255;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 50;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static NICKNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+$").expect("valid nickname regex"));
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("valid name regex"));
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("valid url regex"));
static PASSWORD_SPECIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).expect("valid special regex"));

/// Lowercase and check an email address. Returns the normalized form.
pub fn normalize_email(email: &str) -> RosterResult<String> {
    let normalized = email.trim().to_lowercase();
    if normalized.len() > EMAIL_MAX_LEN {
        return Err(RosterError::validation(
            "email",
            format!("must be at most {EMAIL_MAX_LEN} characters"),
        ));
    }
    if !EMAIL_RE.is_match(&normalized) {
        return Err(RosterError::validation("email", "value is not a valid email address"));
    }
    let tld_ok = normalized
        .rsplit_once('.')
        .is_some_and(|(_, tld)| ALLOWED_EMAIL_TLDS.contains(&tld));
    if !tld_ok {
        return Err(RosterError::validation(
            "email",
            "Email must end with one of the following domains: .com, .org, .edu, .net, .gov",
        ));
    }
    Ok(normalized)
}

pub fn validate_nickname(nickname: &str) -> RosterResult<()> {
    let len = nickname.chars().count();
    if !(NICKNAME_MIN_LEN..=NICKNAME_MAX_LEN).contains(&len) {
        return Err(RosterError::validation(
            "nickname",
            format!("must be between {NICKNAME_MIN_LEN} and {NICKNAME_MAX_LEN} characters"),
        ));
    }
    if !NICKNAME_RE.is_match(nickname) {
        return Err(RosterError::validation(
            "nickname",
            "may only contain letters, digits, underscores and hyphens",
        ));
    }
    if is_reserved_nickname(nickname) {
        return Err(RosterError::validation(
            "nickname",
            "This nickname is reserved and cannot be used.",
        ));
    }
    Ok(())
}

pub fn is_reserved_nickname(nickname: &str) -> bool {
    let lowered = nickname.to_lowercase();
    RESERVED_NICKNAMES.contains(&lowered.as_str())
}

fn validate_name(field: &str, value: &str) -> RosterResult<()> {
    if value.chars().count() > NAME_MAX_LEN {
        return Err(RosterError::validation(
            field,
            format!("must be at most {NAME_MAX_LEN} characters"),
        ));
    }
    if !NAME_RE.is_match(value) {
        return Err(RosterError::validation(
            field,
            "can only contain letters, spaces, hyphens, or apostrophes",
        ));
    }
    Ok(())
}

fn validate_bio(value: &str) -> RosterResult<()> {
    if value.chars().count() > BIO_MAX_LEN {
        return Err(RosterError::validation(
            "bio",
            format!("must be at most {BIO_MAX_LEN} characters"),
        ));
    }
    Ok(())
}

/// Generic URL shape check shared by every URL field.
fn parse_http_url(field: &str, value: &str) -> RosterResult<Url> {
    if value.len() > URL_MAX_LEN {
        return Err(RosterError::validation(
            field,
            format!("must be at most {URL_MAX_LEN} characters"),
        ));
    }
    if !URL_RE.is_match(value) {
        return Err(RosterError::validation(field, "Invalid URL format"));
    }
    let url = Url::parse(value).map_err(|_| RosterError::validation(field, "Invalid URL format"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(RosterError::validation(field, "must use http or https"));
    }
    Ok(url)
}

pub fn validate_profile_picture_url(value: &str) -> RosterResult<()> {
    let field = "profile_picture_url";
    let url = parse_http_url(field, value)?;
    let path = url.path().to_lowercase();
    if ![".jpg", ".jpeg", ".png"].iter().any(|ext| path.ends_with(ext)) {
        return Err(RosterError::validation(
            field,
            "must point to a valid image file (JPEG, PNG)",
        ));
    }
    Ok(())
}

pub fn validate_linkedin_url(value: &str) -> RosterResult<()> {
    let field = "linkedin_profile_url";
    let url = parse_http_url(field, value)?;
    if url.host_str() != Some("linkedin.com") || !url.path().starts_with("/in/") {
        return Err(RosterError::validation(field, "Invalid LinkedIn profile URL format"));
    }
    Ok(())
}

pub fn validate_github_url(value: &str) -> RosterResult<()> {
    let field = "github_profile_url";
    let url = parse_http_url(field, value)?;
    if url.host_str() != Some("github.com") {
        return Err(RosterError::validation(field, "Invalid GitHub profile URL format"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> RosterResult<()> {
    let field = "password";
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(RosterError::validation(
            field,
            format!("Password must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(RosterError::validation(
            field,
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(RosterError::validation(
            field,
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(RosterError::validation(field, "Password must contain at least one digit"));
    }
    if !PASSWORD_SPECIAL_RE.is_match(password) {
        return Err(RosterError::validation(
            field,
            "Password must contain at least one special character",
        ));
    }
    if password.contains(' ') {
        return Err(RosterError::validation(field, "Password must not contain spaces"));
    }
    Ok(())
}

pub fn validate_profile(profile: &Profile) -> RosterResult<()> {
    if let Some(ref v) = profile.first_name {
        validate_name("first_name", v)?;
    }
    if let Some(ref v) = profile.last_name {
        validate_name("last_name", v)?;
    }
    if let Some(ref v) = profile.bio {
        validate_bio(v)?;
    }
    if let Some(ref v) = profile.profile_picture_url {
        validate_profile_picture_url(v)?;
    }
    if let Some(ref v) = profile.linkedin_profile_url {
        validate_linkedin_url(v)?;
    }
    if let Some(ref v) = profile.github_profile_url {
        validate_github_url(v)?;
    }
    Ok(())
}

/// Validate a creation draft and return it with the email normalized.
pub fn validate_draft(draft: UserDraft) -> RosterResult<UserDraft> {
    let email = normalize_email(&draft.email)?;
    if let Some(ref nickname) = draft.nickname {
        validate_nickname(nickname)?;
    }
    validate_password(&draft.password)?;
    validate_profile(&draft.profile)?;
    Ok(UserDraft { email, ..draft })
}

/// Validate a partial update and return it with the email normalized.
///
/// Fails if no field is supplied.
pub fn validate_patch(patch: UserPatch) -> RosterResult<UserPatch> {
    if patch.is_empty() {
        return Err(RosterError::validation(
            "body",
            "At least one field must be provided for update",
        ));
    }
    let email = patch.email.as_deref().map(normalize_email).transpose()?;
    if let Some(ref nickname) = patch.nickname {
        validate_nickname(nickname)?;
    }
    validate_profile(&patch.profile)?;
    Ok(UserPatch { email, ..patch })
}
