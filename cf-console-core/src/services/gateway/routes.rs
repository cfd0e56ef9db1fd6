//! Route table: `(ResourceKind, Operation)` to an upstream endpoint

use std::collections::BTreeMap;

use cf_console_provider::{HttpMethod, RequestBody};

use crate::error::{CoreError, CoreResult};
use crate::types::{Operation, ResourceKind};

use HttpMethod::{Patch, Post, Put};
use Operation as Op;
use ResourceKind as Kind;

/// Placeholder filled from the current credential, never from caller params
pub const ACCOUNT_PLACEHOLDER: &str = "account_id";

/// Body a route accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    None,
    Json,
    /// JSON body that may be omitted; the default is sent instead.
    JsonOr(&'static str),
    Text,
    Multipart,
}

/// One upstream endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub method: HttpMethod,
    pub template: &'static str,
    pub body: BodyKind,
    /// Whether the call changes upstream state; mutating routes are never retried.
    pub mutating: bool,
    /// Whether a successful reply must carry a result.
    pub expects_result: bool,
    /// Merge `{"account": {"id": ...}}` into the JSON body.
    pub inject_account: bool,
}

impl Route {
    const fn read(template: &'static str) -> Self {
        Self {
            method: HttpMethod::Get,
            template,
            body: BodyKind::None,
            mutating: false,
            expects_result: true,
            inject_account: false,
        }
    }

    const fn write(method: HttpMethod, template: &'static str, body: BodyKind) -> Self {
        Self {
            method,
            template,
            body,
            mutating: true,
            expects_result: true,
            inject_account: false,
        }
    }

    const fn delete(template: &'static str) -> Self {
        Self {
            method: HttpMethod::Delete,
            template,
            body: BodyKind::None,
            mutating: true,
            expects_result: false,
            inject_account: false,
        }
    }

    const fn no_result(mut self) -> Self {
        self.expects_result = false;
        self
    }

    const fn with_account(mut self) -> Self {
        self.inject_account = true;
        self
    }

    /// Whether the call needs the upstream account id.
    #[must_use]
    pub fn needs_account(&self) -> bool {
        self.inject_account || self.placeholders().any(|p| p == ACCOUNT_PLACEHOLDER)
    }

    /// Placeholder names in template order
    pub fn placeholders(&self) -> impl Iterator<Item = &'static str> {
        self.template.split('/').filter_map(|segment| {
            segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
        })
    }

    /// Check caller params before any network traffic.
    pub fn check_params(&self, path: &BTreeMap<String, String>, body: &RequestBody) -> CoreResult<()> {
        let missing: Vec<&str> = self
            .placeholders()
            .filter(|p| *p != ACCOUNT_PLACEHOLDER)
            .filter(|p| path.get(*p).is_none_or(|v| v.is_empty()))
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "missing path parameter(s): {}",
                missing.join(", ")
            )));
        }

        let accepted = match (self.body, body) {
            (BodyKind::None | BodyKind::JsonOr(_), RequestBody::Empty)
            | (BodyKind::Json | BodyKind::JsonOr(_), RequestBody::Json(_))
            | (BodyKind::Text, RequestBody::Text(_))
            | (BodyKind::Multipart, RequestBody::Multipart(_)) => true,
            _ => false,
        };
        if !accepted {
            return Err(CoreError::ValidationError(format!(
                "{} {} expects {} body",
                self.method,
                self.template,
                self.body.describe()
            )));
        }
        Ok(())
    }

    /// Fill the template. Values are percent-encoded as single path segments.
    pub fn render(&self, path: &BTreeMap<String, String>, account_id: Option<&str>) -> CoreResult<String> {
        let mut rendered = String::with_capacity(self.template.len() + 32);
        for segment in self.template.split('/').filter(|s| !s.is_empty()) {
            rendered.push('/');
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(ACCOUNT_PLACEHOLDER) => {
                    let id = account_id.ok_or_else(|| {
                        CoreError::ValidationError("account id is not resolved".to_string())
                    })?;
                    rendered.push_str(&urlencoding::encode(id));
                }
                Some(name) => {
                    let value = path.get(name).ok_or_else(|| {
                        CoreError::ValidationError(format!("missing path parameter: {name}"))
                    })?;
                    rendered.push_str(&urlencoding::encode(value));
                }
                None => rendered.push_str(segment),
            }
        }
        Ok(rendered)
    }
}

impl BodyKind {
    fn describe(self) -> &'static str {
        match self {
            Self::None => "no",
            Self::Json => "a JSON",
            Self::JsonOr(_) => "an optional JSON",
            Self::Text => "a text",
            Self::Multipart => "a multipart",
        }
    }
}

const ZONES: &str = "/zones";
const ZONE: &str = "/zones/{zone_id}";
const DNS_RECORDS: &str = "/zones/{zone_id}/dns_records";
const DNS_RECORD: &str = "/zones/{zone_id}/dns_records/{record_id}";
const SCRIPTS: &str = "/accounts/{account_id}/workers/scripts";
const SCRIPT: &str = "/accounts/{account_id}/workers/scripts/{script_name}";
const WORKER_ROUTES: &str = "/zones/{zone_id}/workers/routes";
const WORKER_ROUTE: &str = "/zones/{zone_id}/workers/routes/{route_id}";
const PROJECTS: &str = "/accounts/{account_id}/pages/projects";
const PROJECT: &str = "/accounts/{account_id}/pages/projects/{project_name}";
const DEPLOYMENTS: &str = "/accounts/{account_id}/pages/projects/{project_name}/deployments";
const DEPLOYMENT: &str =
    "/accounts/{account_id}/pages/projects/{project_name}/deployments/{deployment_id}";
const NAMESPACES: &str = "/accounts/{account_id}/storage/kv/namespaces";
const NAMESPACE: &str = "/accounts/{account_id}/storage/kv/namespaces/{namespace_id}";
const KV_KEYS: &str = "/accounts/{account_id}/storage/kv/namespaces/{namespace_id}/keys";
const KV_VALUE: &str = "/accounts/{account_id}/storage/kv/namespaces/{namespace_id}/values/{key}";
const BUCKETS: &str = "/accounts/{account_id}/r2/buckets";
const BUCKET: &str = "/accounts/{account_id}/r2/buckets/{bucket_name}";

/// Every supported pair
pub const ROUTES: &[(ResourceKind, Operation, Route)] = &[
    (Kind::Zone, Op::List, Route::read(ZONES)),
    (Kind::Zone, Op::Get, Route::read(ZONE)),
    (Kind::Zone, Op::Create, Route::write(Post, ZONES, BodyKind::Json).with_account()),
    (Kind::Zone, Op::Delete, Route::delete(ZONE)),
    (
        Kind::Zone,
        Op::PurgeCache,
        Route::write(
            Post,
            "/zones/{zone_id}/purge_cache",
            BodyKind::JsonOr(r#"{"purge_everything":true}"#),
        ),
    ),
    (Kind::DnsRecord, Op::List, Route::read(DNS_RECORDS)),
    (Kind::DnsRecord, Op::Get, Route::read(DNS_RECORD)),
    (Kind::DnsRecord, Op::Create, Route::write(Post, DNS_RECORDS, BodyKind::Json)),
    (Kind::DnsRecord, Op::Update, Route::write(Patch, DNS_RECORD, BodyKind::Json)),
    (Kind::DnsRecord, Op::Delete, Route::delete(DNS_RECORD)),
    (Kind::DnsRecord, Op::Export, Route::read("/zones/{zone_id}/dns_records/export")),
    (Kind::Worker, Op::List, Route::read(SCRIPTS)),
    (Kind::Worker, Op::Get, Route::read(SCRIPT)),
    (Kind::Worker, Op::Create, Route::write(Put, SCRIPT, BodyKind::Multipart)),
    (Kind::Worker, Op::Delete, Route::delete(SCRIPT)),
    (Kind::Worker, Op::ListRoutes, Route::read(WORKER_ROUTES)),
    (Kind::Worker, Op::CreateRoute, Route::write(Post, WORKER_ROUTES, BodyKind::Json)),
    (Kind::Worker, Op::DeleteRoute, Route::delete(WORKER_ROUTE)),
    (Kind::PagesProject, Op::List, Route::read(PROJECTS)),
    (Kind::PagesProject, Op::Get, Route::read(PROJECT)),
    (Kind::PagesProject, Op::Create, Route::write(Post, PROJECTS, BodyKind::Json)),
    (Kind::PagesProject, Op::Delete, Route::delete(PROJECT)),
    (Kind::PagesProject, Op::ListDeployments, Route::read(DEPLOYMENTS)),
    (
        Kind::PagesProject,
        Op::CreateDeployment,
        Route::write(Post, DEPLOYMENTS, BodyKind::Multipart),
    ),
    (Kind::PagesProject, Op::GetDeployment, Route::read(DEPLOYMENT)),
    (Kind::KvNamespace, Op::List, Route::read(NAMESPACES)),
    (Kind::KvNamespace, Op::Create, Route::write(Post, NAMESPACES, BodyKind::Json)),
    (Kind::KvNamespace, Op::Delete, Route::delete(NAMESPACE)),
    (Kind::KvNamespace, Op::ListKeys, Route::read(KV_KEYS)),
    (Kind::KvNamespace, Op::GetValue, Route::read(KV_VALUE)),
    (
        Kind::KvNamespace,
        Op::PutValue,
        Route::write(Put, KV_VALUE, BodyKind::Text).no_result(),
    ),
    (Kind::KvNamespace, Op::DeleteKey, Route::delete(KV_VALUE)),
    (Kind::R2Bucket, Op::List, Route::read(BUCKETS)),
    (Kind::R2Bucket, Op::Get, Route::read(BUCKET)),
    (Kind::R2Bucket, Op::Create, Route::write(Post, BUCKETS, BodyKind::Json)),
    (Kind::R2Bucket, Op::Delete, Route::delete(BUCKET)),
];

/// Look up the route of a pair.
pub fn lookup(kind: ResourceKind, operation: Operation) -> CoreResult<Route> {
    ROUTES
        .iter()
        .find(|(k, op, _)| *k == kind && *op == operation)
        .map(|(_, _, route)| *route)
        .ok_or_else(|| {
            CoreError::ValidationError(format!("{kind} does not support operation {operation}"))
        })
}

/// Operations available for `kind`, in table order
pub fn operations_for(kind: ResourceKind) -> Vec<Operation> {
    ROUTES
        .iter()
        .filter(|(k, _, _)| *k == kind)
        .map(|(_, op, _)| *op)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn table_has_no_duplicate_pairs() {
        for (i, (kind, op, _)) in ROUTES.iter().enumerate() {
            let dupes = ROUTES[i + 1..]
                .iter()
                .filter(|(k, o, _)| k == kind && o == op)
                .count();
            assert_eq!(dupes, 0, "{kind}/{op} listed twice");
        }
    }

    #[test]
    fn every_kind_has_list() {
        for kind in ResourceKind::ALL {
            assert!(operations_for(kind).contains(&Op::List), "{kind}");
        }
    }

    #[test]
    fn unsupported_pair_is_validation_error() {
        assert!(matches!(
            lookup(Kind::R2Bucket, Op::PurgeCache),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn deletes_are_mutating_and_reads_are_not() {
        for (kind, op, route) in ROUTES {
            if route.method == HttpMethod::Get {
                assert!(!route.mutating, "{kind}/{op}");
            } else {
                assert!(route.mutating, "{kind}/{op}");
            }
        }
    }

    #[test]
    fn render_encodes_values() {
        let route = lookup(Kind::KvNamespace, Op::GetValue).unwrap();
        let path = route
            .render(&params(&[("namespace_id", "ns1"), ("key", "a/b c")]), Some("acc"))
            .unwrap();
        assert_eq!(
            path,
            "/accounts/acc/storage/kv/namespaces/ns1/values/a%2Fb%20c"
        );
    }

    #[test]
    fn missing_placeholder_is_reported() {
        let route = lookup(Kind::DnsRecord, Op::Update).unwrap();
        let result = route.check_params(&params(&[("zone_id", "z")]), &RequestBody::Json(json!({})));
        let Err(CoreError::ValidationError(message)) = result else {
            panic!("expected ValidationError, got {result:?}");
        };
        assert!(message.contains("record_id"), "{message}");
    }

    #[test]
    fn account_placeholder_is_not_a_caller_param() {
        let route = lookup(Kind::R2Bucket, Op::List).unwrap();
        assert!(route.needs_account());
        assert!(route.check_params(&BTreeMap::new(), &RequestBody::Empty).is_ok());
        assert!(!lookup(Kind::Zone, Op::List).unwrap().needs_account());
        assert!(lookup(Kind::Zone, Op::Create).unwrap().needs_account());
    }

    #[test]
    fn body_kind_mismatch() {
        let route = lookup(Kind::DnsRecord, Op::Create).unwrap();
        let path = params(&[("zone_id", "z")]);
        assert!(route.check_params(&path, &RequestBody::Empty).is_err());
        assert!(route
            .check_params(&path, &RequestBody::Text("x".into()))
            .is_err());

        let purge = lookup(Kind::Zone, Op::PurgeCache).unwrap();
        assert!(purge.check_params(&path, &RequestBody::Empty).is_ok());

        let list = lookup(Kind::Zone, Op::List).unwrap();
        assert!(list
            .check_params(&BTreeMap::new(), &RequestBody::Json(json!({})))
            .is_err());
    }
}
