//! Bearer credential check
//!
//! Tokens are static per deployment (`server.ron`). Each maps to a curator,
//! which is the scope instances are stored under.

use bevy::prelude::*;
use shared::{CuratorToken, PersistError};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct CuratorTokens {
    by_token: HashMap<String, String>,
}

impl CuratorTokens {
    pub fn new(tokens: &[CuratorToken]) -> Self {
        let by_token = tokens
            .iter()
            .filter(|t| !t.token.trim().is_empty())
            .map(|t| (t.token.trim().to_string(), t.curator.clone()))
            .collect::<HashMap<_, _>>();
        if by_token.is_empty() {
            warn!("No curator tokens configured; every request will be rejected");
        }
        Self { by_token }
    }

    /// Curator behind a bearer credential (`Bearer <token>` or the bare token).
    pub fn resolve(&self, bearer: &str) -> Result<&str, PersistError> {
        let token = bearer.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        if token.is_empty() {
            return Err(PersistError::Unauthorized);
        }
        self.by_token.get(token).map(String::as_str).ok_or(PersistError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> CuratorTokens {
        CuratorTokens::new(&[
            CuratorToken { token: "abc".into(), curator: "ana".into() },
            CuratorToken { token: "  ".into(), curator: "blank".into() },
        ])
    }

    #[test]
    fn accepts_bare_and_prefixed_tokens() {
        let t = tokens();
        assert_eq!(t.resolve("abc"), Ok("ana"));
        assert_eq!(t.resolve("Bearer abc"), Ok("ana"));
    }

    #[test]
    fn rejects_unknown_and_empty() {
        let t = tokens();
        assert_eq!(t.resolve("nope"), Err(PersistError::Unauthorized));
        assert_eq!(t.resolve(""), Err(PersistError::Unauthorized));
        assert_eq!(t.resolve("Bearer "), Err(PersistError::Unauthorized));
    }
}
