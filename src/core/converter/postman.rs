#![allow(clippy::result_large_err)]

use super::schema::{infer_schema, typed_example};
use super::{ConversionOptions, Converter};
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::path::Path;
use thiserror::Error;

const OPENAPI_VERSION: &str = "3.0.0";
const DEFAULT_API_VERSION: &str = "1.0.0";

/// Headers that OpenAPI describes elsewhere (request body media type, security).
const RESERVED_HEADERS: [&str; 3] = ["content-type", "accept", "authorization"];

#[derive(Debug, Error)]
pub enum PostmanError {
    #[error("collection is neither JSON nor YAML: {0}")]
    Syntax(String),
    #[error("collection root must be an object")]
    NotAnObject,
    #[error("collection has no `info` object")]
    MissingInfo,
    #[error("collection has no `item` array")]
    MissingItems,
    #[error("failed to render OpenAPI YAML: {0}")]
    Render(#[from] serde_yaml::Error),
}

impl From<PostmanError> for AppError {
    fn from(err: PostmanError) -> Self {
        let code = match err {
            PostmanError::Render(_) => "CONV-POSTMAN-002",
            _ => "CONV-POSTMAN-001",
        };
        AppError::new(ErrorCategory::ConversionAttemptError, err.to_string()).with_code(code)
    }
}

/// Native Postman Collection v2.0/v2.1 to OpenAPI 3.0 converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostmanConverter;

impl PostmanConverter {
    pub fn new() -> Self {
        PostmanConverter
    }

    /// Render the collection text as an OpenAPI YAML document.
    pub fn render(input: &str, options: &ConversionOptions) -> Result<String, PostmanError> {
        let document = Self::build_document(input, options)?;
        Ok(serde_yaml::to_string(&document)?)
    }

    /// Build the OpenAPI document as a JSON value.
    pub fn build_document(input: &str, options: &ConversionOptions) -> Result<Value, PostmanError> {
        let collection = parse_collection(input)?;
        let root = collection.as_object().ok_or(PostmanError::NotAnObject)?;
        let info = root
            .get("info")
            .and_then(Value::as_object)
            .ok_or(PostmanError::MissingInfo)?;
        let items = root
            .get("item")
            .and_then(Value::as_array)
            .ok_or(PostmanError::MissingItems)?;

        let mut builder = DocumentBuilder::new(options);
        if let Some(auth) = root.get("auth") {
            builder.global_scheme = builder.register_auth(auth);
        }
        builder.walk(items, None);

        Ok(builder.finish(info, root.get("variable")))
    }
}

#[async_trait]
impl Converter for PostmanConverter {
    fn name(&self) -> &'static str {
        "postman"
    }

    /// Writes the document itself and returns nothing.
    async fn convert_to_file(
        &self,
        input: &str,
        destination: &Path,
        options: &ConversionOptions,
    ) -> Result<Option<String>, AppError> {
        let yaml = Self::render(input, options)?;
        crate::utils::files::write_artifact(destination, yaml.as_bytes()).await?;
        Ok(None)
    }

    async fn convert(
        &self,
        input: &str,
        options: &ConversionOptions,
    ) -> Result<Option<String>, AppError> {
        Ok(Some(Self::render(input, options)?))
    }
}

fn parse_collection(input: &str) -> Result<Value, PostmanError> {
    match serde_json::from_str::<Value>(input) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str::<Value>(input)
            .map_err(|yaml_err| PostmanError::Syntax(format!("{}; {}", json_err, yaml_err))),
    }
}

struct DocumentBuilder<'a> {
    options: &'a ConversionOptions,
    paths: IndexMap<String, Map<String, Value>>,
    tags: IndexMap<String, Option<String>>,
    security_schemes: Map<String, Value>,
    global_scheme: Option<String>,
    first_origin: Option<String>,
}

impl<'a> DocumentBuilder<'a> {
    fn new(options: &'a ConversionOptions) -> Self {
        Self {
            options,
            paths: IndexMap::new(),
            tags: IndexMap::new(),
            security_schemes: Map::new(),
            global_scheme: None,
            first_origin: None,
        }
    }

    /// Folders become tags; nested folders inherit their top-level folder's tag.
    fn walk(&mut self, items: &[Value], tag: Option<&str>) {
        for item in items {
            let name = item.get("name").and_then(Value::as_str).unwrap_or("");
            if let Some(children) = item.get("item").and_then(Value::as_array) {
                let folder_tag = match tag {
                    Some(parent) => parent.to_string(),
                    None => {
                        let tag_name = if name.is_empty() {
                            self.options.default_tag.clone()
                        } else {
                            name.to_string()
                        };
                        let description = description_text(item.get("description"));
                        let entry = self.tags.entry(tag_name.clone()).or_insert(None);
                        if entry.is_none() {
                            *entry = description;
                        }
                        tag_name
                    }
                };
                self.walk(children, Some(&folder_tag));
            } else if let Some(request) = item.get("request") {
                let tag_name = match tag {
                    Some(tag) => tag.to_string(),
                    None => {
                        let default_tag = self.options.default_tag.clone();
                        self.tags.entry(default_tag.clone()).or_insert(None);
                        default_tag
                    }
                };
                self.add_operation(item, request, &tag_name);
            }
        }
    }

    fn add_operation(&mut self, item: &Value, request: &Value, tag: &str) {
        let name = item.get("name").and_then(Value::as_str).unwrap_or("");
        let method = request
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("GET")
            .to_lowercase();
        let url = request.as_str().map(|raw| json!(raw)).unwrap_or_else(|| {
            request.get("url").cloned().unwrap_or(Value::Null)
        });

        if self.first_origin.is_none() {
            self.first_origin = url_origin(&url);
        }

        let (path, path_params) = openapi_path(&url);
        let mut operation = Map::new();
        operation.insert("tags".to_string(), json!([tag]));
        if !name.is_empty() {
            operation.insert("summary".to_string(), json!(name));
        }
        if let Some(description) = description_text(request.get("description")) {
            operation.insert("description".to_string(), json!(description));
        }

        let mut parameters = path_parameters(&path_params, url.get("variable"));
        parameters.extend(query_parameters(url.get("query")));
        parameters.extend(header_parameters(request.get("header")));
        if !parameters.is_empty() {
            operation.insert("parameters".to_string(), Value::Array(parameters));
        }

        if let Some(body) = request.get("body").and_then(request_body) {
            operation.insert("requestBody".to_string(), body);
        }

        if let Some(auth) = request.get("auth") {
            if auth.get("type").and_then(Value::as_str) == Some("noauth") {
                operation.insert("security".to_string(), json!([]));
            } else if let Some(scheme) = self.register_auth(auth) {
                if self.global_scheme.as_deref() != Some(scheme.as_str()) {
                    operation.insert("security".to_string(), json!([{ scheme: [] }]));
                }
            }
        }

        operation.insert(
            "responses".to_string(),
            responses(item.get("response").and_then(Value::as_array)),
        );

        let methods = self.paths.entry(path.clone()).or_default();
        if methods.contains_key(&method) {
            tracing::debug!(path = %path, method = %method, request = name, "duplicate operation skipped");
            return;
        }
        methods.insert(method, Value::Object(operation));
    }

    /// Register a security scheme for a Postman auth block and return its name.
    fn register_auth(&mut self, auth: &Value) -> Option<String> {
        let (name, scheme) = match auth.get("type").and_then(Value::as_str)? {
            "bearer" => ("bearerAuth", json!({"type": "http", "scheme": "bearer"})),
            "basic" => ("basicAuth", json!({"type": "http", "scheme": "basic"})),
            "apikey" => {
                let settings = auth.get("apikey");
                let key = auth_setting(settings, "key").unwrap_or_else(|| "X-API-Key".to_string());
                let location = auth_setting(settings, "in").unwrap_or_else(|| "header".to_string());
                (
                    "apiKeyAuth",
                    json!({"type": "apiKey", "name": key, "in": location}),
                )
            }
            _ => return None,
        };
        self.security_schemes
            .entry(name.to_string())
            .or_insert(scheme);
        Some(name.to_string())
    }

    fn finish(self, info: &Map<String, Value>, variables: Option<&Value>) -> Value {
        let mut document = Map::new();
        document.insert("openapi".to_string(), json!(OPENAPI_VERSION));

        let mut info_out = Map::new();
        info_out.insert(
            "title".to_string(),
            json!(info.get("name").and_then(Value::as_str).unwrap_or("API")),
        );
        if let Some(description) = description_text(info.get("description")) {
            info_out.insert("description".to_string(), json!(description));
        }
        let version = variable_value(variables, "version")
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        info_out.insert("version".to_string(), json!(version));
        document.insert("info".to_string(), Value::Object(info_out));

        let servers: Vec<Value> = if self.options.servers.is_empty() {
            self.first_origin
                .iter()
                .map(|origin| json!({ "url": origin }))
                .collect()
        } else {
            self.options
                .servers
                .iter()
                .map(|server| {
                    let mut entry = Map::new();
                    entry.insert("url".to_string(), json!(server.url));
                    if let Some(description) = &server.description {
                        entry.insert("description".to_string(), json!(description));
                    }
                    Value::Object(entry)
                })
                .collect()
        };
        if !servers.is_empty() {
            document.insert("servers".to_string(), Value::Array(servers));
        }

        if !self.tags.is_empty() {
            let tags: Vec<Value> = self
                .tags
                .into_iter()
                .map(|(name, description)| match description {
                    Some(description) => json!({"name": name, "description": description}),
                    None => json!({ "name": name }),
                })
                .collect();
            document.insert("tags".to_string(), Value::Array(tags));
        }

        let paths: Map<String, Value> = self
            .paths
            .into_iter()
            .map(|(path, methods)| (path, Value::Object(methods)))
            .collect();
        document.insert("paths".to_string(), Value::Object(paths));

        if !self.security_schemes.is_empty() {
            document.insert(
                "components".to_string(),
                json!({ "securitySchemes": self.security_schemes }),
            );
        }
        if let Some(scheme) = self.global_scheme {
            document.insert("security".to_string(), json!([{ scheme: [] }]));
        }

        Value::Object(document)
    }
}

/// Postman descriptions are either a string or `{ "content": ... }`.
fn description_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(text) => text.as_str(),
        Value::Object(map) => map.get("content").and_then(Value::as_str)?,
        _ => return None,
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn variable_value(variables: Option<&Value>, key: &str) -> Option<String> {
    variables?
        .as_array()?
        .iter()
        .find(|var| var.get("key").and_then(Value::as_str) == Some(key))
        .and_then(|var| var.get("value"))
        .and_then(|value| match value {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
}

fn auth_setting(settings: Option<&Value>, key: &str) -> Option<String> {
    match settings? {
        // v2.1: [{ "key": "...", "value": "..." }]
        Value::Array(entries) => entries
            .iter()
            .find(|entry| entry.get("key").and_then(Value::as_str) == Some(key))
            .and_then(|entry| entry.get("value"))
            .and_then(Value::as_str)
            .map(str::to_string),
        // v2.0: { "key": "...", "in": "..." }
        Value::Object(map) => map.get(key).and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Path portion of a raw Postman URL such as `{{baseUrl}}/users/:id?page=1`.
fn raw_path(raw: &str) -> String {
    let without_query = raw.split(['?', '#']).next().unwrap_or("");
    let without_scheme = match without_query.find("://") {
        Some(index) => &without_query[index + 3..],
        None => without_query,
    };
    match without_scheme.find('/') {
        Some(index) => without_scheme[index..].to_string(),
        None => String::new(),
    }
}

fn path_segments(url: &Value) -> Vec<String> {
    if let Some(segments) = url.get("path").and_then(Value::as_array) {
        return segments
            .iter()
            .filter_map(|segment| match segment {
                Value::String(text) => Some(text.clone()),
                Value::Object(map) => map.get("value").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect();
    }
    let raw = url
        .as_str()
        .or_else(|| url.get("raw").and_then(Value::as_str))
        .unwrap_or("");
    raw_path(raw)
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Convert Postman path segments to an OpenAPI template, returning the path
/// variable names in order of appearance.
fn openapi_path(url: &Value) -> (String, Vec<String>) {
    let mut params = Vec::new();
    let mut out = String::new();
    for segment in path_segments(url) {
        if segment.is_empty() {
            continue;
        }
        let variable = segment
            .strip_prefix(':')
            .or_else(|| segment.strip_prefix("{{").and_then(|s| s.strip_suffix("}}")))
            .filter(|name| !name.is_empty());
        out.push('/');
        match variable {
            Some(name) => {
                out.push('{');
                out.push_str(name);
                out.push('}');
                if !params.iter().any(|existing| existing == name) {
                    params.push(name.to_string());
                }
            }
            None => out.push_str(&segment),
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    (out, params)
}

/// `protocol://host` of a request, when it does not depend on variables.
fn url_origin(url: &Value) -> Option<String> {
    let origin = if let Some(host) = url.get("host") {
        let host = match host {
            Value::Array(parts) => parts
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("."),
            Value::String(text) => text.clone(),
            _ => return None,
        };
        let protocol = url.get("protocol").and_then(Value::as_str).unwrap_or("https");
        let port = url
            .get("port")
            .and_then(Value::as_str)
            .map(|port| format!(":{}", port))
            .unwrap_or_default();
        format!("{}://{}{}", protocol, host, port)
    } else {
        let raw = url.as_str().or_else(|| url.get("raw").and_then(Value::as_str))?;
        let scheme_end = raw.find("://")?;
        let rest = &raw[scheme_end + 3..];
        let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        format!("{}://{}", &raw[..scheme_end], &rest[..host_end])
    };
    (!origin.contains("{{")).then_some(origin)
}

fn path_parameters(names: &[String], variables: Option<&Value>) -> Vec<Value> {
    let variables = variables.and_then(Value::as_array);
    names
        .iter()
        .map(|name| {
            let declared = variables.and_then(|vars| {
                vars.iter()
                    .find(|var| var.get("key").and_then(Value::as_str) == Some(name.as_str()))
            });
            let mut param = Map::new();
            param.insert("name".to_string(), json!(name));
            param.insert("in".to_string(), json!("path"));
            param.insert("required".to_string(), json!(true));
            let example = declared
                .and_then(|var| var.get("value"))
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .map(typed_example);
            let schema = example
                .as_ref()
                .map(infer_schema)
                .unwrap_or_else(|| json!({"type": "string"}));
            param.insert("schema".to_string(), schema);
            if let Some(description) = declared.and_then(|var| description_text(var.get("description"))) {
                param.insert("description".to_string(), json!(description));
            }
            if let Some(example) = example {
                param.insert("example".to_string(), example);
            }
            Value::Object(param)
        })
        .collect()
}

fn query_parameters(query: Option<&Value>) -> Vec<Value> {
    key_value_entries(query)
        .map(|(key, value, entry)| {
            let mut param = Map::new();
            param.insert("name".to_string(), json!(key));
            param.insert("in".to_string(), json!("query"));
            let example = value.map(typed_example);
            let schema = example
                .as_ref()
                .map(infer_schema)
                .unwrap_or_else(|| json!({"type": "string"}));
            param.insert("schema".to_string(), schema);
            if let Some(description) = description_text(entry.get("description")) {
                param.insert("description".to_string(), json!(description));
            }
            if let Some(example) = example {
                param.insert("example".to_string(), example);
            }
            Value::Object(param)
        })
        .collect()
}

fn header_parameters(headers: Option<&Value>) -> Vec<Value> {
    key_value_entries(headers)
        .filter(|(key, _, _)| !RESERVED_HEADERS.contains(&key.to_lowercase().as_str()))
        .map(|(key, value, entry)| {
            let mut param = Map::new();
            param.insert("name".to_string(), json!(key));
            param.insert("in".to_string(), json!("header"));
            param.insert("schema".to_string(), json!({"type": "string"}));
            if let Some(description) = description_text(entry.get("description")) {
                param.insert("description".to_string(), json!(description));
            }
            if let Some(value) = value {
                param.insert("example".to_string(), json!(value));
            }
            Value::Object(param)
        })
        .collect()
}

/// `(key, non-empty value, entry)` for enabled Postman key/value entries.
fn key_value_entries<'a>(
    list: Option<&'a Value>,
) -> impl Iterator<Item = (&'a str, Option<&'a str>, &'a Value)> + 'a {
    list.and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|entry| entry.get("disabled").and_then(Value::as_bool) != Some(true))
        .filter_map(|entry| {
            let key = entry.get("key").and_then(Value::as_str)?;
            if key.is_empty() {
                return None;
            }
            let value = entry
                .get("value")
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty());
            Some((key, value, entry))
        })
}

fn request_body(body: &Value) -> Option<Value> {
    let (media_type, media) = match body.get("mode").and_then(Value::as_str)? {
        "raw" => raw_body(body)?,
        "urlencoded" => (
            "application/x-www-form-urlencoded",
            form_media(body.get("urlencoded"), false)?,
        ),
        "formdata" => ("multipart/form-data", form_media(body.get("formdata"), true)?),
        "graphql" => {
            let graphql = body.get("graphql")?;
            let variables = graphql
                .get("variables")
                .and_then(Value::as_str)
                .and_then(|text| serde_json::from_str::<Value>(text).ok())
                .unwrap_or_else(|| json!({}));
            let example = json!({
                "query": graphql.get("query").and_then(Value::as_str).unwrap_or(""),
                "variables": variables,
            });
            (
                "application/json",
                json!({"schema": infer_schema(&example), "example": example}),
            )
        }
        _ => return None,
    };
    Some(json!({ "content": { media_type: media } }))
}

fn raw_body(body: &Value) -> Option<(&'static str, Value)> {
    let raw = body.get("raw").and_then(Value::as_str)?;
    if raw.trim().is_empty() {
        return None;
    }
    let language = body
        .pointer("/options/raw/language")
        .and_then(Value::as_str);
    let parsed = serde_json::from_str::<Value>(raw).ok();
    match (language, parsed) {
        (Some("json") | None, Some(example)) if example.is_object() || example.is_array() => Some((
            "application/json",
            json!({"schema": infer_schema(&example), "example": example}),
        )),
        (Some("json"), _) => Some((
            "application/json",
            json!({"schema": {"type": "object"}, "example": raw}),
        )),
        (Some("xml"), _) => Some((
            "application/xml",
            json!({"schema": {"type": "string"}, "example": raw}),
        )),
        _ => Some((
            "text/plain",
            json!({"schema": {"type": "string"}, "example": raw}),
        )),
    }
}

fn form_media(fields: Option<&Value>, allow_files: bool) -> Option<Value> {
    let mut properties = Map::new();
    for field in fields
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|field| field.get("disabled").and_then(Value::as_bool) != Some(true))
    {
        let Some(key) = field.get("key").and_then(Value::as_str).filter(|k| !k.is_empty()) else {
            continue;
        };
        let is_file = allow_files && field.get("type").and_then(Value::as_str) == Some("file");
        let mut property = if is_file {
            json!({"type": "string", "format": "binary"})
        } else {
            let example = field
                .get("value")
                .and_then(Value::as_str)
                .map(typed_example);
            let mut property = match &example {
                Some(example) => infer_schema(example),
                None => json!({"type": "string"}),
            };
            if let (Some(example), Some(map)) = (example, property.as_object_mut()) {
                map.insert("example".to_string(), example);
            }
            property
        };
        if let (Some(description), Some(map)) =
            (description_text(field.get("description")), property.as_object_mut())
        {
            map.insert("description".to_string(), json!(description));
        }
        properties.insert(key.to_string(), property);
    }
    if properties.is_empty() {
        return None;
    }
    Some(json!({"schema": {"type": "object", "properties": properties}}))
}

fn responses(saved: Option<&Vec<Value>>) -> Value {
    let mut out = Map::new();
    for response in saved.into_iter().flatten() {
        let code = response
            .get("code")
            .and_then(Value::as_u64)
            .map(|code| code.to_string())
            .unwrap_or_else(|| "200".to_string());
        if out.contains_key(&code) {
            continue;
        }
        let description = response
            .get("name")
            .and_then(Value::as_str)
            .or_else(|| response.get("status").and_then(Value::as_str))
            .filter(|text| !text.is_empty())
            .unwrap_or("Response");
        let mut entry = Map::new();
        entry.insert("description".to_string(), json!(description));
        if let Some(body) = response
            .get("body")
            .and_then(Value::as_str)
            .filter(|body| !body.trim().is_empty())
        {
            let declared_type = key_value_entries(response.get("header"))
                .find(|(key, _, _)| key.eq_ignore_ascii_case("content-type"))
                .and_then(|(_, value, _)| value)
                .map(|value| value.split(';').next().unwrap_or(value).trim().to_string());
            let parsed = serde_json::from_str::<Value>(body).ok();
            let media_type = declared_type.unwrap_or_else(|| {
                if parsed.is_some() {
                    "application/json".to_string()
                } else {
                    "text/plain".to_string()
                }
            });
            let media = match parsed {
                Some(example) if media_type.contains("json") => {
                    json!({"schema": infer_schema(&example), "example": example})
                }
                _ => json!({"schema": {"type": "string"}, "example": body}),
            };
            entry.insert("content".to_string(), json!({ media_type: media }));
        }
        out.insert(code, Value::Object(entry));
    }
    if out.is_empty() {
        out.insert(
            "200".to_string(),
            json!({
                "description": "Successful response",
                "content": {"application/json": {}}
            }),
        );
    }
    Value::Object(out)
}
