//! Route specifiers.
//!
//! A specifier declares how one manager function is reached over HTTP:
//!
//! ```text
//! [verb=]function              plain:        VERB /api/<module>/<function>
//! [verb=]function:param        parametrized: VERB /api/<module>/<value>, binds param = value
//! [verb=]index.function        indexed:      VERB /api/<module>
//! ```
//!
//! The verb is a lower-case HTTP method and defaults to `post`.

use std::fmt;
use std::str::FromStr;

use axum::http::Method;

use super::matrix::MatrixError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKind {
    Plain,
    Parametrized { param: String },
    Indexed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub method: Method,
    pub function: String,
    pub kind: RouteKind,
}

fn parse_verb(verb: &str) -> Option<Method> {
    match verb.to_ascii_lowercase().as_str() {
        "get" => Some(Method::GET),
        "post" => Some(Method::POST),
        "put" => Some(Method::PUT),
        "patch" => Some(Method::PATCH),
        "delete" => Some(Method::DELETE),
        "head" => Some(Method::HEAD),
        "options" => Some(Method::OPTIONS),
        _ => None,
    }
}

impl RouteSpec {
    pub fn parse(spec: &str) -> Result<Self, MatrixError> {
        let invalid = |reason: &str| MatrixError::InvalidSpecifier {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let (verb, name) = match spec.split_once('=') {
            Some((verb, name)) => (verb.trim(), name.trim()),
            None => ("post", spec.trim()),
        };

        let method = parse_verb(verb).ok_or_else(|| invalid("unknown verb"))?;

        let (function, kind) = if let Some((function, param)) = name.split_once(':') {
            if param.is_empty() {
                return Err(invalid("empty parameter name"));
            }
            (
                function,
                RouteKind::Parametrized {
                    param: param.to_string(),
                },
            )
        } else if name.contains("index.") {
            let function = name.split('.').nth(1).unwrap_or_default();
            (function, RouteKind::Indexed)
        } else {
            (name, RouteKind::Plain)
        };

        if function.is_empty() {
            return Err(invalid("empty function name"));
        }

        Ok(Self {
            method,
            function: function.to_string(),
            kind,
        })
    }
}

impl FromStr for RouteSpec {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = self.method.as_str().to_ascii_lowercase();
        match &self.kind {
            RouteKind::Plain => write!(f, "{}={}", verb, self.function),
            RouteKind::Parametrized { param } => write!(f, "{}={}:{}", verb, self.function, param),
            RouteKind::Indexed => write!(f, "{}=index.{}", verb, self.function),
        }
    }
}
