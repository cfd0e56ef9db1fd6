//! Resource kinds, operations, and call parameters

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cf_console_provider::{FormPart, RequestBody};

use crate::error::CoreError;

/// Remote resource categories reachable through the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Zone,
    DnsRecord,
    Worker,
    PagesProject,
    KvNamespace,
    R2Bucket,
}

impl ResourceKind {
    pub const ALL: [Self; 6] = [
        Self::Zone,
        Self::DnsRecord,
        Self::Worker,
        Self::PagesProject,
        Self::KvNamespace,
        Self::R2Bucket,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zone => "zone",
            Self::DnsRecord => "dnsRecord",
            Self::Worker => "worker",
            Self::PagesProject => "pagesProject",
            Self::KvNamespace => "kvNamespace",
            Self::R2Bucket => "r2Bucket",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the camelCase name or its kebab-case spelling (`dns-record`).
impl FromStr for ResourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|kind| normalize(kind.as_str()) == wanted)
            .ok_or_else(|| CoreError::ValidationError(format!("unknown resource kind '{s}'")))
    }
}

/// Verbs a resource kind may support; the route table decides which pairs exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
    PurgeCache,
    Export,
    ListRoutes,
    CreateRoute,
    DeleteRoute,
    ListDeployments,
    CreateDeployment,
    GetDeployment,
    ListKeys,
    GetValue,
    PutValue,
    DeleteKey,
}

impl Operation {
    pub const ALL: [Self; 17] = [
        Self::List,
        Self::Get,
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::PurgeCache,
        Self::Export,
        Self::ListRoutes,
        Self::CreateRoute,
        Self::DeleteRoute,
        Self::ListDeployments,
        Self::CreateDeployment,
        Self::GetDeployment,
        Self::ListKeys,
        Self::GetValue,
        Self::PutValue,
        Self::DeleteKey,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::PurgeCache => "purgeCache",
            Self::Export => "export",
            Self::ListRoutes => "listRoutes",
            Self::CreateRoute => "createRoute",
            Self::DeleteRoute => "deleteRoute",
            Self::ListDeployments => "listDeployments",
            Self::CreateDeployment => "createDeployment",
            Self::GetDeployment => "getDeployment",
            Self::ListKeys => "listKeys",
            Self::GetValue => "getValue",
            Self::PutValue => "putValue",
            Self::DeleteKey => "deleteKey",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|op| normalize(op.as_str()) == wanted)
            .ok_or_else(|| CoreError::ValidationError(format!("unknown operation '{s}'")))
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parameters of one gateway call.
///
/// `path` fills `{placeholder}` segments of the route template; `query` is
/// appended as-is; `body` must match what the route expects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    pub path: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn path(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Text(body.into());
        self
    }

    #[must_use]
    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }
}
