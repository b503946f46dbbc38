//! Stargazer data models.

use serde::{Deserialize, Serialize};

/// A user who starred a repository.
///
/// GitHub returns the full user object; only the fields the SDK needs are
/// kept, unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stargazer {
    /// Login name, the stable handle used to query the user's stars
    pub login: String,
    /// Numeric user id
    #[serde(default)]
    pub id: u64,
    /// Profile URL
    #[serde(default)]
    pub html_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stargazer_deserialize() {
        let json = r#"[
            {
                "login": "octocat",
                "id": 1,
                "html_url": "https://github.com/octocat",
                "type": "User",
                "site_admin": false
            },
            {
                "login": "hubot",
                "id": 2
            }
        ]"#;

        let users: Vec<Stargazer> = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].login, "octocat");
        assert!(users[1].html_url.is_none());
    }
}
