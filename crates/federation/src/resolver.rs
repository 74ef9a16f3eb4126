//! Federation request resolution.
//!
//! A [`Resolver`] looks at an inbound request and decides whether it is a
//! federation request it can answer. [`Federation`] is the local resolver:
//! it serves `WebFinger`, `NodeInfo` and Person actor documents and leaves
//! everything else to the application router.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json,
    extract::Query,
    http::{HeaderMap, Method, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use fedblog_common::{AppError, RsaKeypair, generate_rsa_keypair};
use fedblog_db::entities::user;
use fedblog_db::repositories::{PostRepository, UserRepository};
use tracing::{debug, info};
use url::Url;

use crate::actor::{ApPerson, actor_url};
use crate::error::FederationError;
use crate::kv::KvStore;
use crate::nodeinfo::{
    NODEINFO_2_1_SCHEMA, NodeInfo, NodeInfoLink, NodeInfoMetadata, NodeInfoServices,
    NodeInfoSoftware, NodeInfoUsage, NodeInfoUsers, NodeInfoWellKnown,
};
use crate::webfinger::{WebfingerLink, WebfingerQuery, WebfingerResponse, parse_resource};

/// Media type of `ActivityPub` documents.
pub const ACTIVITY_JSON: &str = "application/activity+json";

/// JSON-LD media type accepted as an alternative to [`ACTIVITY_JSON`].
pub const LD_JSON: &str = "application/ld+json";

/// Outcome of offering a request to a resolver.
#[derive(Debug)]
pub enum Resolution {
    /// The resolver answered the request.
    Handled(Response),
    /// Not a federation request.
    NotFound,
    /// A federation resource exists but the client did not ask for a
    /// representation the resolver can produce.
    NotAcceptable,
}

/// Per-request data handed to the resolver, built only when needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Request target as received.
    pub url: String,
}

/// Decides whether a request belongs to federation.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Classify the request, answering it when it is a federation request.
    async fn resolve(
        &self,
        parts: &Parts,
        context: &(dyn Fn() -> RequestContext + Send + Sync),
    ) -> Result<Resolution, FederationError>;
}

/// Settings describing this instance to remote servers.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    /// Public base URL.
    pub base_url: Url,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

impl InstanceInfo {
    /// Host (and port, when explicit) used in `acct:` resources.
    #[must_use]
    pub fn domain(&self) -> String {
        let host = self.base_url.host_str().unwrap_or_default().to_lowercase();
        match self.base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        }
    }
}

/// Local federation resolver.
#[derive(Clone)]
pub struct Federation {
    instance: InstanceInfo,
    user_repo: UserRepository,
    post_repo: PostRepository,
    kv: Arc<dyn KvStore>,
}

impl Federation {
    /// Create a resolver for this instance.
    #[must_use]
    pub fn new(
        instance: InstanceInfo,
        user_repo: UserRepository,
        post_repo: PostRepository,
        kv: Arc<dyn KvStore>,
    ) -> Self {
        Self {
            instance,
            user_repo,
            post_repo,
            kv,
        }
    }

    async fn webfinger(&self, parts: &Parts) -> Result<Resolution, FederationError> {
        let resource = Query::<WebfingerQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.resource);

        let Some(resource) = resource else {
            return Ok(bad_request("Missing resource parameter"));
        };
        let Some(acct) = parse_resource(&resource) else {
            return Ok(bad_request("Invalid resource format"));
        };

        if acct.domain != self.instance.domain() {
            debug!(domain = %acct.domain, "WebFinger lookup for a foreign domain");
            return Ok(Resolution::NotFound);
        }

        let Some(user) = self.user_repo.find_by_username(&acct.username).await? else {
            info!(username = %acct.username, "User not found for WebFinger");
            return Ok(Resolution::NotFound);
        };

        let actor = actor_url(&self.instance.base_url, &user.username)?;
        let profile = self.instance.base_url.join(&format!("/@{}", user.username))?;

        let response = WebfingerResponse {
            subject: resource,
            aliases: vec![actor.to_string()],
            links: vec![
                WebfingerLink {
                    rel: "self".to_string(),
                    link_type: Some(ACTIVITY_JSON.to_string()),
                    href: Some(actor.to_string()),
                },
                WebfingerLink {
                    rel: "http://webfinger.net/rel/profile-page".to_string(),
                    link_type: Some("text/html".to_string()),
                    href: Some(profile.to_string()),
                },
            ],
        };

        Ok(Resolution::Handled(
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/jrd+json")],
                Json(response),
            )
                .into_response(),
        ))
    }

    fn nodeinfo_discovery(&self) -> Result<Resolution, FederationError> {
        let href = self.instance.base_url.join("/nodeinfo/2.1")?;
        let response = NodeInfoWellKnown {
            links: vec![NodeInfoLink {
                rel: NODEINFO_2_1_SCHEMA.to_string(),
                href: href.to_string(),
            }],
        };

        Ok(Resolution::Handled(Json(response).into_response()))
    }

    async fn nodeinfo(&self) -> Result<Resolution, FederationError> {
        let total = self.user_repo.count().await?;
        let local_posts = self.post_repo.count().await?;

        let response = NodeInfo {
            version: "2.1".to_string(),
            software: NodeInfoSoftware {
                name: "fedblog".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            protocols: vec!["activitypub".to_string()],
            services: NodeInfoServices::default(),
            usage: NodeInfoUsage {
                users: NodeInfoUsers { total },
                local_posts,
            },
            open_registrations: true,
            metadata: NodeInfoMetadata {
                node_name: self.instance.name.clone(),
                node_description: self.instance.description.clone(),
            },
        };

        Ok(Resolution::Handled(
            (
                StatusCode::OK,
                [(
                    header::CONTENT_TYPE,
                    "application/json; profile=\"http://nodeinfo.diaspora.software/ns/schema/2.1#\"",
                )],
                Json(response),
            )
                .into_response(),
        ))
    }

    async fn actor(&self, username: &str, headers: &HeaderMap) -> Result<Resolution, FederationError> {
        let Some(user) = self.user_repo.find_by_username(username).await? else {
            return Ok(Resolution::NotFound);
        };

        if !accepts_activity_json(headers) {
            return Ok(Resolution::NotAcceptable);
        }

        let keypair = self.keypair_for(&user).await?;
        let person = ApPerson::from_user(&self.instance.base_url, &user, keypair.public_key_pem)?;

        Ok(Resolution::Handled(
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/activity+json; charset=utf-8")],
                Json(person),
            )
                .into_response(),
        ))
    }

    /// Key pair of a local user, generated and stored on first use.
    async fn keypair_for(&self, user: &user::Model) -> Result<RsaKeypair, FederationError> {
        let key = format!("keypair::{}", user.id);

        if let Some(stored) = self.kv.get(&key).await? {
            return Ok(serde_json::from_value(stored)?);
        }

        let keypair = tokio::task::spawn_blocking(generate_rsa_keypair)
            .await
            .map_err(|e| AppError::Internal(format!("Key generation task failed: {e}")))??;

        self.kv
            .set(&key, serde_json::to_value(&keypair)?, None)
            .await?;
        info!(user_id = %user.id, "Generated actor key pair");

        Ok(keypair)
    }
}

#[async_trait]
impl Resolver for Federation {
    async fn resolve(
        &self,
        parts: &Parts,
        context: &(dyn Fn() -> RequestContext + Send + Sync),
    ) -> Result<Resolution, FederationError> {
        if parts.method != Method::GET && parts.method != Method::HEAD {
            return Ok(Resolution::NotFound);
        }

        let path = parts.uri.path();
        let resolution = match path {
            "/.well-known/webfinger" => self.webfinger(parts).await?,
            "/.well-known/nodeinfo" => self.nodeinfo_discovery()?,
            "/nodeinfo/2.1" => self.nodeinfo().await?,
            _ => match path.strip_prefix("/users/") {
                Some(username) if !username.is_empty() && !username.contains('/') => {
                    self.actor(username, &parts.headers).await?
                }
                _ => Resolution::NotFound,
            },
        };

        // Context data is only built for requests this resolver answers
        if let Resolution::Handled(response) = &resolution {
            let data = context();
            info!(
                url = %data.url,
                status = %response.status(),
                "Serving federation document"
            );
        }

        Ok(resolution)
    }
}

/// Whether the `Accept` header asks for an `ActivityPub` representation.
///
/// Media-type parameters such as `profile` are ignored.
#[must_use]
pub fn accepts_activity_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|range| {
            range
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
        .any(|media| media == ACTIVITY_JSON || media == LD_JSON)
}

fn bad_request(message: &'static str) -> Resolution {
    Resolution::Handled((StatusCode::BAD_REQUEST, message).into_response())
}
