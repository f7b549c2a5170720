//! Ref name validation, following git's `check-ref-format` rules closely
//! enough to keep ref names safe as map keys and path components.

use crate::error::{RemoteError, RemoteResult};

const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// Validate a full ref name such as `refs/heads/main`.
pub fn validate_ref_name(name: &str) -> RemoteResult<()> {
    let reject = |reason: &str| {
        Err(RemoteError::InvalidRefName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return reject("must not be empty");
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control()) {
        return reject(&format!("contains forbidden character {ch:?}"));
    }
    if name.contains("..") {
        return reject("must not contain '..'");
    }
    if name.contains("@{") {
        return reject("must not contain '@{'");
    }
    if name.starts_with('/') || name.ends_with('/') || name.contains("//") {
        return reject("empty path component");
    }
    if name.ends_with('.') || name.ends_with(".lock") {
        return reject("must not end with '.' or '.lock'");
    }
    if name.split('/').any(|c| c.starts_with('.')) {
        return reject("component starts with '.'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_refs() {
        for name in ["HEAD", "refs/heads/main", "refs/tags/v1.0", "refs/heads/feature/x-y"] {
            assert!(validate_ref_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_bad_refs() {
        for name in [
            "",
            "refs/heads/a b",
            "refs/heads/../x",
            "refs/heads/x.lock",
            "refs//heads",
            "/refs/heads/x",
            "refs/heads/.hidden",
            "refs/heads/x@{1}",
            "refs/heads/a:b",
        ] {
            assert!(validate_ref_name(name).is_err(), "{name:?}");
        }
    }
}
