//! `NodeInfo` documents.

use serde::Serialize;

/// Schema identifier of the only `NodeInfo` version served.
pub const NODEINFO_2_1_SCHEMA: &str = "http://nodeinfo.diaspora.software/ns/schema/2.1";

/// `NodeInfo` well-known response.
#[derive(Debug, Serialize)]
pub struct NodeInfoWellKnown {
    pub links: Vec<NodeInfoLink>,
}

/// `NodeInfo` link.
#[derive(Debug, Serialize)]
pub struct NodeInfoLink {
    pub rel: String,
    pub href: String,
}

/// `NodeInfo` 2.1 response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub version: String,
    pub software: NodeInfoSoftware,
    pub protocols: Vec<String>,
    pub services: NodeInfoServices,
    pub usage: NodeInfoUsage,
    pub open_registrations: bool,
    pub metadata: NodeInfoMetadata,
}

/// `NodeInfo` software information.
#[derive(Debug, Serialize)]
pub struct NodeInfoSoftware {
    pub name: String,
    pub version: String,
}

/// Third-party services this node talks to. Always empty here.
#[derive(Debug, Default, Serialize)]
pub struct NodeInfoServices {
    pub inbound: Vec<String>,
    pub outbound: Vec<String>,
}

/// `NodeInfo` usage statistics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfoUsage {
    pub users: NodeInfoUsers,
    pub local_posts: u64,
}

/// `NodeInfo` user statistics.
#[derive(Debug, Serialize)]
pub struct NodeInfoUsers {
    pub total: u64,
}

/// `NodeInfo` metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfoMetadata {
    pub node_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_description: Option<String>,
}
