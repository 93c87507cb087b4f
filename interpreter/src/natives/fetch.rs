use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;
use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Agent, RequestBuilder};

use crate::interpreter::Interpreter;
use crate::natives::error_object;
use crate::value::Value;

const TIMEOUT: Duration = Duration::from_secs(30);

struct Request {
    url: String,
    method: String,
    headers: Vec<(String, String)>,
    body: String,
}

/// `fetch(url, options?)`: a blocking HTTP request. Non-2xx responses are returned like any
/// other, with `ok` set to false; only transport failures become error objects.
pub(super) fn fetch(_: &mut Interpreter<'_>, args: &[Value]) -> Value {
    let request = match Request::from_args(args) {
        Ok(request) => request,
        Err(msg) => return error_object(msg),
    };

    debug!(method = %request.method, url = %request.url, "fetch");
    match request.send() {
        Ok(response) => response,
        Err(msg) => error_object(msg),
    }
}

impl Request {
    fn from_args(args: &[Value]) -> Result<Self, String> {
        if args.is_empty() || args.len() > 2 {
            return Err(String::from(
                "fetch requires 1 or 2 arguments (url, options?)",
            ));
        }

        let mut request = Request {
            url: args[0].to_string(),
            method: String::from("GET"),
            headers: Vec::new(),
            body: String::new(),
        };

        if let Some(options) = args.get(1) {
            let options = match options {
                Value::Object(options) => options,
                other => {
                    return Err(format!(
                        "second argument must be an options object, got {}",
                        other.type_name()
                    ))
                }
            };

            if let Some(method) = options.get("method") {
                request.method = method.to_string().to_uppercase();
            }
            if let Some(Value::Object(headers)) = options.get("headers") {
                request.headers = headers
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_string()))
                    .collect();
            }
            if let Some(body) = options.get("body") {
                request.body = body.to_string();
            }
        }

        Ok(request)
    }

    fn send(self) -> Result<Value, String> {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(TIMEOUT))
            .build()
            .into();

        match self.method.as_str() {
            "GET" | "HEAD" | "DELETE" | "OPTIONS" | "TRACE" => {
                let builder = match self.method.as_str() {
                    "GET" => agent.get(&self.url),
                    "HEAD" => agent.head(&self.url),
                    "DELETE" => agent.delete(&self.url),
                    "OPTIONS" => agent.options(&self.url),
                    _ => agent.trace(&self.url),
                };
                self.call_without_body(builder)
            }
            "POST" | "PUT" | "PATCH" => {
                let builder = match self.method.as_str() {
                    "POST" => agent.post(&self.url),
                    "PUT" => agent.put(&self.url),
                    _ => agent.patch(&self.url),
                };
                self.call_with_body(builder)
            }
            other => Err(format!("unsupported method: {}", other)),
        }
    }

    fn call_without_body(&self, mut builder: RequestBuilder<WithoutBody>) -> Result<Value, String> {
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder
            .call()
            .map_err(|err| format!("request to {} failed: {}", self.url, err))?;
        into_value(response)
    }

    fn call_with_body(&self, mut builder: RequestBuilder<WithBody>) -> Result<Value, String> {
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder
            .send(self.body.as_bytes())
            .map_err(|err| format!("request to {} failed: {}", self.url, err))?;
        into_value(response)
    }
}

// Repeated response headers are collected into an array, single ones stay strings.
fn into_value(mut response: ureq::http::Response<ureq::Body>) -> Result<Value, String> {
    let status = response.status();

    let mut grouped: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for (name, value) in response.headers() {
        grouped
            .entry(name.to_string())
            .or_default()
            .push(Value::from(value.to_str().unwrap_or("")));
    }
    let headers = grouped.into_iter().map(|(name, mut values)| {
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::array(values)
        };
        (name, value)
    });
    let headers = Value::object(headers);

    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|err| format!("failed to read response body: {}", err))?;

    let status_text = match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    };

    debug!(status = status.as_u16(), bytes = body.len(), "fetch finished");
    Ok(Value::object([
        ("status", Value::from(status.as_u16())),
        ("statusText", Value::from(status_text)),
        ("body", Value::from(body)),
        ("headers", headers),
        ("ok", Value::from(status.is_success())),
    ]))
}
