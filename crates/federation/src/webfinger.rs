//! `WebFinger` documents and resource parsing.

use serde::{Deserialize, Serialize};

/// `WebFinger` query parameters.
#[derive(Debug, Deserialize)]
pub struct WebfingerQuery {
    pub resource: Option<String>,
}

/// `WebFinger` response (JRD).
#[derive(Debug, Serialize)]
pub struct WebfingerResponse {
    pub subject: String,
    pub aliases: Vec<String>,
    pub links: Vec<WebfingerLink>,
}

/// `WebFinger` link.
#[derive(Debug, Serialize)]
pub struct WebfingerLink {
    pub rel: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Account named by an `acct:` resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcctResource {
    pub username: String,
    pub domain: String,
}

/// Parse `acct:username@domain`.
///
/// A leading `@` on the username is tolerated. Anything with more or fewer
/// than one `@` separator, or an empty half, is rejected.
pub fn parse_resource(resource: &str) -> Option<AcctResource> {
    let acct = resource.strip_prefix("acct:")?;
    let acct = acct.strip_prefix('@').unwrap_or(acct);
    let (username, domain) = acct.split_once('@')?;

    if username.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }

    Some(AcctResource {
        username: username.to_string(),
        domain: domain.to_lowercase(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_acct_resource() {
        assert_eq!(
            parse_resource("acct:alice@blog.example"),
            Some(AcctResource {
                username: "alice".to_string(),
                domain: "blog.example".to_string(),
            })
        );
        assert_eq!(
            parse_resource("acct:@alice@Blog.Example").map(|r| r.domain),
            Some("blog.example".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse_resource("alice@blog.example"), None);
        assert_eq!(parse_resource("acct:alice"), None);
        assert_eq!(parse_resource("acct:@blog.example"), None);
        assert_eq!(parse_resource("acct:alice@"), None);
        assert_eq!(parse_resource("acct:a@b@c"), None);
        assert_eq!(parse_resource("https://blog.example/users/alice"), None);
    }
}
