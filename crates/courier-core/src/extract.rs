//! Textual fallback extraction of a recipient id.
//!
//! The correlation table is memory-only, so after a restart an admin
//! reply's target id is unknown. These rules recover the user id from the
//! visible text of the replied-to message instead. Ordered, first match
//! wins; each rule is pure and testable without the transport.

use regex::Regex;

use crate::domain::UserId;

type Rule = fn(&str) -> Option<UserId>;

/// Ordered extraction rules. The `UID:` tag written by the forwarder comes
/// first; looser diagnostic and link forms follow.
const RULES: &[Rule] = &[uid_tag, user_id_field, profile_link, generic_id_token];

/// Run the rules in order against the visible text of a replied-to message.
pub fn extract_user_id(text: &str) -> Option<UserId> {
    RULES.iter().find_map(|rule| rule(text))
}

fn capture_id(pattern: &str, text: &str) -> Option<UserId> {
    let re = Regex::new(pattern).expect("valid regex");
    let caps = re.captures(text)?;
    caps.get(1)?.as_str().parse::<i64>().ok().map(UserId)
}

/// `UID: 12345` — the identity tag embedded in every forwarded Header.
fn uid_tag(text: &str) -> Option<UserId> {
    capture_id(r"UID:\s*(\d+)", text)
}

/// `user_id = 12345` — diagnostic output form.
fn user_id_field(text: &str) -> Option<UserId> {
    capture_id(r"user_id\s*=\s*(\d+)", text)
}

/// `tg://user?id=12345` or any profile deep link carrying `?id=`.
fn profile_link(text: &str) -> Option<UserId> {
    capture_id(r"\?id=(\d+)", text)
}

/// Generic `ID: 12345` / `ID=12345` token. Word-anchored so it does not
/// match the tail of `UID:`.
fn generic_id_token(text: &str) -> Option<UserId> {
    capture_id(r"\bID\s*[:=]\s*(\d+)", text)
}
