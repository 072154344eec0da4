use std::{fmt, str::FromStr};

use http::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use typed_builder::TypedBuilder;
use url::Url;

use crate::error::ConfigError;

/// Token replaced by the virtual user's index inside body field values.
pub const INDEX_PLACEHOLDER: &str = "{i}";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Whether requests with this method carry the templated JSON body.
    pub fn has_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(ConfigError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Replaces every occurrence of [`INDEX_PLACEHOLDER`] in `value` with `index`.
pub fn substitute(value: &str, index: usize) -> String {
    value.replace(INDEX_PLACEHOLDER, &index.to_string())
}

/// Ordered `field -> value` mapping rendered into a JSON object per user.
///
/// Values are plain strings; substitution is textual.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyTemplate {
    fields: Vec<(String, String)>,
}

impl BodyTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field. A repeated key replaces the earlier value but keeps its position.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
        self
    }

    /// Parses a `key=value` pair as given on the command line.
    pub fn parse_field(raw: &str) -> Result<(String, String), ConfigError> {
        match raw.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(ConfigError::InvalidField(raw.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn render(&self, index: usize) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(substitute(value, index))))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BodyTemplate {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(BodyTemplate::new(), |template, (k, v)| template.field(k, v))
    }
}

/// Everything a transport needs to put one request on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// The immutable request of one virtual user.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestSpec {
    pub index: usize,
    pub method: HttpMethod,
    pub url: String,
    pub origin: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body_template: BodyTemplate,
}

impl RequestSpec {
    /// Materializes headers and body for this user.
    ///
    /// `Origin` is only sent when the origin is non-blank. GET and DELETE never carry a body.
    pub fn prepare(&self) -> PreparedRequest {
        let mut headers = self.headers.clone();
        if let Some(origin) = self.origin.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
            headers.push(("Origin".to_string(), origin.to_string()));
        }

        let body = self
            .method
            .has_body()
            .then(|| Value::Object(self.body_template.render(self.index)));

        PreparedRequest {
            method: self.method,
            url: self.url.clone(),
            headers,
            body,
        }
    }
}

/// Shared shape of every virtual user's request; stamps out one [`RequestSpec`] per index.
#[derive(Clone, Debug, TypedBuilder)]
pub struct RequestTemplate {
    pub method: HttpMethod,
    #[builder(setter(into))]
    pub url: String,
    #[builder(default)]
    pub origin: Option<String>,
    #[builder(default)]
    pub headers: Vec<(String, String)>,
    #[builder(default)]
    pub body: BodyTemplate,
}

impl RequestTemplate {
    pub fn spec(&self, index: usize) -> RequestSpec {
        RequestSpec {
            index,
            method: self.method,
            url: self.url.clone(),
            origin: self.origin.clone(),
            headers: self.headers.clone(),
            body_template: self.body.clone(),
        }
    }

    /// One spec per virtual user, indices `1..=users` in order.
    pub fn specs(&self, users: usize) -> Vec<RequestSpec> {
        (1..=users).map(|index| self.spec(index)).collect()
    }

    /// Checks the target is an absolute http(s) URL with a host and that every extra
    /// header, `Origin` included, is legal on the wire.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason,
        };
        let url = Url::parse(&self.url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "unsupported scheme `{}`, expected http or https",
                url.scheme()
            )));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }

        for (name, value) in &self.headers {
            check_header(name, value)
                .map_err(|_| ConfigError::InvalidHeader(format!("{name}: {value}")))?;
        }
        if let Some(origin) = self.origin.as_deref().map(str::trim) {
            check_header("Origin", origin)
                .map_err(|_| ConfigError::InvalidHeader(format!("Origin: {origin}")))?;
        }
        Ok(())
    }
}

fn check_header(name: &str, value: &str) -> Result<(), http::Error> {
    HeaderName::from_bytes(name.as_bytes())?;
    HeaderValue::from_str(value)?;
    Ok(())
}

/// Parses a `Name: value` header as given on the command line.
///
/// The name must be a valid header token and the value visible ASCII (or tabs).
pub fn parse_header(raw: &str) -> Result<(String, String), ConfigError> {
    let (name, value) = raw
        .split_once(':')
        .map(|(name, value)| (name.trim(), value.trim()))
        .ok_or_else(|| ConfigError::InvalidHeader(raw.to_string()))?;
    check_header(name, value).map_err(|_| ConfigError::InvalidHeader(raw.to_string()))?;
    Ok((name.to_string(), value.to_string()))
}
