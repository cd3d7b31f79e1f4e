//! HTTP status allow-lists.
//!
//! Every named request in a profile is judged against a small set of status
//! codes it is allowed to return. A 404 for a random product ID is expected
//! traffic, not a failure; a 409 on registration just means the random
//! username is already taken.

use std::fmt;

/// A set of acceptable HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusAllowList(&'static [u16]);

impl StatusAllowList {
    /// Only `200 OK`.
    pub const OK: Self = Self(&[200]);
    /// `200 OK` or `201 Created`.
    pub const OK_OR_CREATED: Self = Self(&[200, 201]);
    /// `200 OK` or `404 Not Found` (lookups by random ID).
    pub const OK_OR_NOT_FOUND: Self = Self(&[200, 404]);
    /// Registration: created, or `409 Conflict` when the user already exists.
    pub const REGISTRATION: Self = Self(&[200, 201, 409]);
    /// Login: `401 Unauthorized` means the service rejected the credentials.
    pub const LOGIN: Self = Self(&[200, 401]);

    /// Returns true if `status` is on the list.
    #[must_use]
    pub fn accepts(self, status: u16) -> bool {
        self.0.contains(&status)
    }
}

impl fmt::Display for StatusAllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, code) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{code}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_listed_codes_only() {
        let list = StatusAllowList::REGISTRATION;
        assert!(list.accepts(200));
        assert!(list.accepts(201));
        assert!(list.accepts(409));
        assert!(!list.accepts(400));
        assert!(!list.accepts(500));
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusAllowList::OK_OR_NOT_FOUND.to_string(), "200/404");
        assert_eq!(StatusAllowList::LOGIN.to_string(), "200/401");
        assert_eq!(StatusAllowList::OK.to_string(), "200");
    }
}
