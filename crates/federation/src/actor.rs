//! `ActivityPub` Person actor document for local users.

use activitypub_federation::kinds::actor::PersonType;
use fedblog_db::entities::user;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

/// `ActivityPub` Person actor.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApPerson {
    #[serde(rename = "@context")]
    pub context: Value,

    #[serde(rename = "type")]
    pub kind: PersonType,
    pub id: Url,
    pub preferred_username: String,
    pub inbox: Url,
    pub outbox: Url,
    pub followers: Url,
    pub following: Url,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<ApImage>,

    pub public_key: ApPublicKey,
}

/// `ActivityPub` Image object.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApImage {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// `ActivityPub` public key.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApPublicKey {
    pub id: String,
    pub owner: Url,
    pub public_key_pem: String,
}

impl ApPerson {
    /// Build the actor document of a local user.
    ///
    /// Collection URLs hang off the actor id. Avatars whose stored URL does
    /// not parse are left out rather than failing the whole document.
    pub fn from_user(
        base_url: &Url,
        user: &user::Model,
        public_key_pem: String,
    ) -> Result<Self, url::ParseError> {
        let id = actor_url(base_url, &user.username)?;
        let collection = |name: &str| Url::parse(&format!("{id}/{name}"));

        Ok(Self {
            context: json!([
                "https://www.w3.org/ns/activitystreams",
                "https://w3id.org/security/v1"
            ]),
            kind: PersonType::Person,
            preferred_username: user.username.clone(),
            inbox: collection("inbox")?,
            outbox: collection("outbox")?,
            followers: collection("followers")?,
            following: collection("following")?,
            name: Some(user.username.clone()),
            summary: user.biography.clone(),
            icon: user
                .pp
                .as_deref()
                .and_then(|pp| Url::parse(pp).ok())
                .map(|url| ApImage {
                    kind: "Image".to_string(),
                    url,
                    media_type: Some("image/png".to_string()),
                }),
            public_key: ApPublicKey {
                id: format!("{id}#main-key"),
                owner: id.clone(),
                public_key_pem,
            },
            id,
        })
    }
}

/// Canonical actor URL of a local user.
pub fn actor_url(base_url: &Url, username: &str) -> Result<Url, url::ParseError> {
    base_url.join(&format!("/users/{username}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn local_user(pp: Option<&str>) -> user::Model {
        user::Model {
            id: "01hzy".to_string(),
            username: "Alice".to_string(),
            username_lower: "alice".to_string(),
            email: "alice@blog.example".to_string(),
            password: "$argon2id$hash".to_string(),
            birthdate: None,
            biography: Some("Bonjour".to_string()),
            pp: pp.map(String::from),
            permission: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_person_document_shape() {
        let base = Url::parse("https://blog.example").unwrap();
        let person = ApPerson::from_user(
            &base,
            &local_user(Some("https://blog.example/public/users/01hzy.png")),
            "PEM".to_string(),
        )
        .unwrap();

        let json = serde_json::to_value(&person).unwrap();
        assert_eq!(json["type"], "Person");
        assert_eq!(json["id"], "https://blog.example/users/Alice");
        assert_eq!(json["preferredUsername"], "Alice");
        assert_eq!(json["summary"], "Bonjour");
        assert_eq!(json["inbox"], "https://blog.example/users/Alice/inbox");
        assert_eq!(json["followers"], "https://blog.example/users/Alice/followers");
        assert_eq!(json["icon"]["url"], "https://blog.example/public/users/01hzy.png");
        assert_eq!(json["publicKey"]["id"], "https://blog.example/users/Alice#main-key");
        assert_eq!(json["publicKey"]["publicKeyPem"], "PEM");
        assert_eq!(json["@context"][0], "https://www.w3.org/ns/activitystreams");
    }

    #[test]
    fn test_unparsable_avatar_is_skipped() {
        let base = Url::parse("https://blog.example").unwrap();
        let person =
            ApPerson::from_user(&base, &local_user(Some("not a url")), "PEM".to_string()).unwrap();
        assert!(person.icon.is_none());
    }
}
