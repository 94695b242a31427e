//! HTTP middlewares.
//!
//! A middleware is declared as a section holding exactly one option block,
//! e.g. `middlewares.auth.basicAuth.users`. Decoding goes through
//! [`MiddlewareOptions`], where every block is optional, and is then narrowed
//! to the [`Middleware`] sum type.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::decode::{Field, Schema};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Middleware {
    AddPrefix(AddPrefix),
    StripPrefix(StripPrefix),
    BasicAuth(BasicAuth),
    MaxConn(MaxConn),
    RateLimit(RateLimit),
    RedirectScheme(RedirectScheme),
    Headers(Headers),
}

impl Middleware {
    /// Option block name, as written in labels and files.
    pub fn kind(&self) -> &'static str {
        match self {
            Middleware::AddPrefix(_) => "addPrefix",
            Middleware::StripPrefix(_) => "stripPrefix",
            Middleware::BasicAuth(_) => "basicAuth",
            Middleware::MaxConn(_) => "maxConn",
            Middleware::RateLimit(_) => "rateLimit",
            Middleware::RedirectScheme(_) => "redirectScheme",
            Middleware::Headers(_) => "headers",
        }
    }
}

/// Decode-side view of a middleware: every option block optional.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareOptions {
    pub add_prefix: Option<AddPrefix>,
    pub strip_prefix: Option<StripPrefix>,
    pub basic_auth: Option<BasicAuth>,
    pub max_conn: Option<MaxConn>,
    pub rate_limit: Option<RateLimit>,
    pub redirect_scheme: Option<RedirectScheme>,
    pub headers: Option<Headers>,
}

impl Schema for MiddlewareOptions {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::optional("addPrefix", |m| &mut m.add_prefix),
            Field::optional("stripPrefix", |m| &mut m.strip_prefix),
            Field::optional("basicAuth", |m| &mut m.basic_auth),
            Field::optional("maxConn", |m| &mut m.max_conn),
            Field::optional("rateLimit", |m| &mut m.rate_limit),
            Field::optional("redirectScheme", |m| &mut m.redirect_scheme),
            Field::optional("headers", |m| &mut m.headers),
        ]
    }
}

impl TryFrom<MiddlewareOptions> for Middleware {
    type Error = String;

    fn try_from(options: MiddlewareOptions) -> Result<Self, Self::Error> {
        let MiddlewareOptions {
            add_prefix,
            strip_prefix,
            basic_auth,
            max_conn,
            rate_limit,
            redirect_scheme,
            headers,
        } = options;

        let mut found: Vec<Middleware> = Vec::new();
        found.extend(add_prefix.map(Middleware::AddPrefix));
        found.extend(strip_prefix.map(Middleware::StripPrefix));
        found.extend(basic_auth.map(Middleware::BasicAuth));
        found.extend(max_conn.map(Middleware::MaxConn));
        found.extend(rate_limit.map(Middleware::RateLimit));
        found.extend(redirect_scheme.map(Middleware::RedirectScheme));
        found.extend(headers.map(Middleware::Headers));

        match found.len() {
            0 => Err("no middleware type is defined".to_string()),
            1 => Ok(found.remove(0)),
            _ => {
                let kinds: Vec<&str> = found.iter().map(Middleware::kind).collect();
                Err(format!("several middleware types are defined: {}", kinds.join(", ")))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddPrefix {
    pub prefix: String,
}

impl Schema for AddPrefix {
    fn fields() -> Vec<Field<Self>> {
        vec![Field::string("prefix", |m| &mut m.prefix)]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StripPrefix {
    pub prefixes: Vec<String>,
}

impl Schema for StripPrefix {
    fn fields() -> Vec<Field<Self>> {
        vec![Field::string_list("prefixes", |m| &mut m.prefixes)]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicAuth {
    pub users: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub realm: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub remove_header: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub header_field: String,
}

impl Schema for BasicAuth {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::string_list("users", |m| &mut m.users),
            Field::string("realm", |m| &mut m.realm),
            Field::bool("removeHeader", |m| &mut m.remove_header),
            Field::string("headerField", |m| &mut m.header_field),
        ]
    }
}

/// Connection limit keyed by the request attribute named in `extractor_func`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxConn {
    pub amount: i64,
    pub extractor_func: String,
}

impl Default for MaxConn {
    fn default() -> Self {
        Self {
            amount: 0,
            extractor_func: "request.host".to_string(),
        }
    }
}

impl Schema for MaxConn {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::number("amount", |m| &mut m.amount),
            Field::string("extractorFunc", |m| &mut m.extractor_func),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    pub average: u64,
    pub burst: u64,
    pub extractor_func: String,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            average: 0,
            burst: 1,
            extractor_func: "request.host".to_string(),
        }
    }
}

impl Schema for RateLimit {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::number("average", |m| &mut m.average),
            Field::number("burst", |m| &mut m.burst),
            Field::string("extractorFunc", |m| &mut m.extractor_func),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RedirectScheme {
    pub scheme: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub port: String,
    pub permanent: bool,
}

impl Schema for RedirectScheme {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::string("scheme", |m| &mut m.scheme),
            Field::string("port", |m| &mut m.port),
            Field::bool("permanent", |m| &mut m.permanent),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Headers {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_request_headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_response_headers: BTreeMap<String, String>,
}

impl Schema for Headers {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::string_map("customRequestHeaders", |m| &mut m.custom_request_headers),
            Field::string_map("customResponseHeaders", |m| &mut m.custom_response_headers),
        ]
    }
}
