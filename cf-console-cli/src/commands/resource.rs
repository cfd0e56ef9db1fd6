//! `cfc resource <kind> <operation> ...`

use std::path::Path;

use anyhow::Context;
use clap::Args;
use serde_json::Value;

use cf_console_app::AppState;
use cf_console_core::services::gateway::operations_for;
use cf_console_core::types::{FormPart, Operation, RequestParams, ResourceKind};

use super::{emit_record, parse_pair, read_inline_or_file};

#[derive(Args)]
pub struct ResourceArgs {
    /// zone, dnsRecord, worker, pagesProject, kvNamespace or r2Bucket
    kind: ResourceKind,

    /// Operation on the kind, e.g. list, get, create, purgeCache
    operation: Operation,

    /// Path parameter, e.g. --param zone_id=abc
    #[arg(long = "param", value_parser = parse_pair)]
    params: Vec<(String, String)>,

    /// Query parameter, e.g. --query per_page=50
    #[arg(long = "query", value_parser = parse_pair)]
    query: Vec<(String, String)>,

    /// JSON body, or @file
    #[arg(long, conflicts_with_all = ["text", "form", "file"])]
    body: Option<String>,

    /// Raw text body, or @file
    #[arg(long, conflicts_with_all = ["form", "file"])]
    text: Option<String>,

    /// Multipart text field, e.g. --form metadata=@meta.json
    #[arg(long = "form", value_parser = parse_pair)]
    form: Vec<(String, String)>,

    /// Multipart file field, e.g. --file worker.js=./dist/worker.js
    #[arg(long = "file", value_parser = parse_pair)]
    file: Vec<(String, String)>,
}

impl ResourceArgs {
    fn request_params(&self) -> anyhow::Result<RequestParams> {
        let mut params = RequestParams::new();
        for (key, value) in &self.params {
            params = params.path(key, value);
        }
        for (key, value) in &self.query {
            params = params.query(key, value);
        }

        if let Some(raw) = &self.body {
            let json: Value = serde_json::from_str(&read_inline_or_file(raw)?)
                .context("--body is not valid JSON")?;
            params = params.json(json);
        } else if let Some(raw) = &self.text {
            params = params.text(read_inline_or_file(raw)?);
        } else if !self.form.is_empty() || !self.file.is_empty() {
            let mut parts = Vec::with_capacity(self.form.len() + self.file.len());
            for (name, value) in &self.form {
                parts.push(FormPart::text(name, read_inline_or_file(value)?));
            }
            for (name, path) in &self.file {
                parts.push(file_part(name, Path::new(path))?);
            }
            params = params.multipart(parts);
        }
        Ok(params)
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js" | "mjs") => "application/javascript+module",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

fn file_part(name: &str, path: &Path) -> anyhow::Result<FormPart> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map_or_else(|| name.to_string(), |n| n.to_string_lossy().into_owned());
    Ok(FormPart::file(name, file_name, content_type_for(path), data))
}

/// Operations of `kind`, comma separated, or `None` when `operation` is one of them.
fn unsupported_hint(kind: ResourceKind, operation: Operation) -> Option<String> {
    let supported = operations_for(kind);
    if supported.contains(&operation) {
        return None;
    }
    Some(
        supported
            .iter()
            .map(|op| op.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

pub async fn run(state: &AppState, args: ResourceArgs) -> anyhow::Result<bool> {
    if let Some(supported) = unsupported_hint(args.kind, args.operation) {
        tracing::warn!("{} supports: {supported}", args.kind);
    }

    let params = args.request_params()?;
    let record = state.gateway.call(args.kind, args.operation, params).await;
    emit_record(&record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_console_core::types::RequestBody;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ResourceArgs,
    }

    fn parse(argv: &[&str]) -> ResourceArgs {
        Harness::try_parse_from(std::iter::once("cfc").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn params_and_json_body() {
        let args = parse(&[
            "dns-record",
            "create",
            "--param",
            "zone_id=z1",
            "--query",
            "per_page=5",
            "--body",
            r#"{"type":"A","name":"www","content":"192.0.2.1"}"#,
        ]);
        assert_eq!(args.kind, ResourceKind::DnsRecord);
        assert_eq!(args.operation, Operation::Create);

        let params = args.request_params().unwrap();
        assert_eq!(params.path.get("zone_id").map(String::as_str), Some("z1"));
        assert_eq!(params.query, vec![("per_page".to_string(), "5".to_string())]);
        assert!(matches!(params.body, RequestBody::Json(ref v) if v["type"] == "A"));
    }

    #[test]
    fn text_body_for_kv_values() {
        let args = parse(&[
            "kvNamespace",
            "putValue",
            "--param",
            "namespace_id=n1",
            "--param",
            "key=greeting",
            "--text",
            "hello",
        ]);
        let params = args.request_params().unwrap();
        assert_eq!(params.body, RequestBody::Text("hello".to_string()));
    }

    #[test]
    fn multipart_from_form_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("worker.js");
        std::fs::write(&script, "export default {}").unwrap();

        let file_arg = format!("worker.js={}", script.display());
        let args = parse(&[
            "worker",
            "create",
            "--param",
            "script_name=edge",
            "--form",
            r#"metadata={"main_module":"worker.js"}"#,
            "--file",
            &file_arg,
        ]);
        let params = args.request_params().unwrap();
        let RequestBody::Multipart(parts) = params.body else {
            panic!("expected multipart body");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "metadata");
        assert_eq!(parts[1].file_name.as_deref(), Some("worker.js"));
    }

    #[test]
    fn body_conflicts_with_text() {
        let parsed = Harness::try_parse_from(["cfc", "zone", "create", "--body", "{}", "--text", "x"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn hint_lists_operations_of_the_kind() {
        assert_eq!(unsupported_hint(ResourceKind::Zone, Operation::List), None);
        let hint = unsupported_hint(ResourceKind::Zone, Operation::PutValue).unwrap();
        assert!(hint.contains("list"), "{hint}");
        assert!(!hint.contains("putValue"), "{hint}");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(Harness::try_parse_from(["cfc", "bucket", "list"]).is_err());
    }
}
