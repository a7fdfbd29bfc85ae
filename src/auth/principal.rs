//! Request principal
//!
//! The authenticated identity behind a request, together with the app
//! capability tokens it presented. Token signatures are checked by the issuer
//! side; this module only turns the raw claim text into typed claims.

/// One parsed app capability: an app identifier and its raw action names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCapabilityClaim {
    pub app: String,
    pub actions: Vec<String>,
}

/// Authenticated caller of a single request.
#[derive(Debug, Clone, Default)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
    pub app_claims: Vec<AppCapabilityClaim>,
    /// Raw tokens that failed to parse. Any entry here forces a scope denial.
    pub invalid_app_tokens: Vec<String>,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            ..Self::default()
        }
    }

    /// Records a presented token, sorting it into valid claims or invalid tokens.
    pub fn present_token(&mut self, raw: &str) {
        match parse_app_token(raw) {
            Some(claim) => self.app_claims.push(claim),
            None => self.invalid_app_tokens.push(raw.to_string()),
        }
    }

    pub fn with_claim(mut self, app: &str, actions: &[&str]) -> Self {
        self.app_claims.push(AppCapabilityClaim {
            app: app.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    pub fn has_any_app_capabilities(&self) -> bool {
        !self.app_claims.is_empty()
    }
}

/// Parses `app:<identifier>=<action>[,<action>...]`.
///
/// The identifier must be a single path segment. Action names are kept
/// verbatim; unknown ones are discarded later when the capability set is built.
pub fn parse_app_token(raw: &str) -> Option<AppCapabilityClaim> {
    let body = raw.trim().strip_prefix("app:")?;
    let (app, actions) = body.split_once('=')?;
    let app = app.trim();

    if app.is_empty()
        || app == "."
        || app == ".."
        || app.contains(['/', '\\', '\0'])
        || app.contains(char::is_whitespace)
    {
        return None;
    }

    let actions: Vec<String> = actions
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();

    if actions.is_empty() {
        return None;
    }

    Some(AppCapabilityClaim {
        app: app.to_string(),
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_token() {
        let claim = parse_app_token("app:shop.example=read, write").unwrap();
        assert_eq!(claim.app, "shop.example");
        assert_eq!(claim.actions, vec!["read", "write"]);
    }

    #[test]
    fn test_unknown_actions_survive_parsing() {
        let claim = parse_app_token("app:notes=read,teleport").unwrap();
        assert_eq!(claim.actions, vec!["read", "teleport"]);
    }

    #[test]
    fn test_malformed_tokens() {
        for raw in [
            "shop.example=read",
            "app:=read",
            "app:shop.example",
            "app:shop.example=",
            "app:../x=read",
            "app:a/b=read",
            "app:a b=read",
        ] {
            assert!(parse_app_token(raw).is_none(), "{raw}");
        }
    }

    #[test]
    fn test_present_token_sorts_claims() {
        let mut principal = Principal::new("u1", "alice");
        assert!(!principal.has_any_app_capabilities());
        principal.present_token("app:shop.example=read");
        principal.present_token("garbage");
        assert!(principal.has_any_app_capabilities());
        assert_eq!(principal.invalid_app_tokens, vec!["garbage"]);
    }
}
