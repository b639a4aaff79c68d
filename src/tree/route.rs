//! Route descriptors and URL resolution
//!
//! A route pattern is literal text with `<param>` placeholders and `( ... )`
//! optional groups, e.g. `/libs/<lib>(/<version>(/<level>))`. Descendants
//! inherit the nearest route and refine its conditions.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

/// Condition key that never takes part in URL substitution
pub const QUERY_STRING_CONDITION: &str = "query_string";

/// Routing descriptor carried by every node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub conditions: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub defaults: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of route resolution for one node
#[derive(Debug, Clone, PartialEq)]
pub enum RouteResolution {
    /// The node declared no route and shares its parent's
    Inherited(Route),
    /// The node refined the route; `url` is built from the merged conditions
    Resolved { route: Route, url: String },
}

impl RouteResolution {
    pub fn route(&self) -> &Route {
        match self {
            RouteResolution::Inherited(route) | RouteResolution::Resolved { route, .. } => route,
        }
    }
}

/// Normalize a node's declared route: a bare string is an `id` condition.
pub fn normalize_own_route(raw: &Value) -> Result<Value, ModelError> {
    match raw {
        Value::String(id) => {
            let mut conditions = Map::new();
            conditions.insert("id".to_string(), Value::String(id.clone()));
            let mut route = Map::new();
            route.insert("conditions".to_string(), Value::Object(conditions));
            Ok(Value::Object(route))
        }
        Value::Object(_) => Ok(raw.clone()),
        other => Err(ModelError::InvalidField {
            field: "route".to_string(),
            reason: format!("expected string or object, got {}", other),
        }),
    }
}

/// Deep-merge `overlay` into `base`; overlay wins on conflicts, objects merge key-wise.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value)
                    }
                    _ => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Resolve a node's route against its parent's resolved route.
///
/// `title` only labels the error when no pattern is reachable.
pub fn resolve_route(
    parent_route: Option<&Route>,
    own_route: Option<&Value>,
    title: &str,
) -> Result<RouteResolution, ModelError> {
    let Some(own_route) = own_route else {
        return match parent_route {
            Some(route) if route.pattern.is_some() => Ok(RouteResolution::Inherited(route.clone())),
            _ => Err(ModelError::RouteResolution {
                title: title.to_string(),
            }),
        };
    };

    let own_route = normalize_own_route(own_route)?;
    let mut merged = match parent_route {
        Some(route) => serde_json::to_value(route).map_err(|e| ModelError::InvalidField {
            field: "route".to_string(),
            reason: e.to_string(),
        })?,
        None => Value::Object(Map::new()),
    };
    deep_merge(&mut merged, &own_route);

    let route: Route = serde_json::from_value(merged).map_err(|e| ModelError::InvalidField {
        field: "route".to_string(),
        reason: e.to_string(),
    })?;
    if route.pattern.is_none() {
        return Err(ModelError::RouteResolution {
            title: title.to_string(),
        });
    }

    let mut params = route.conditions.clone();
    params.remove(QUERY_STRING_CONDITION);
    let url = build_url(&route, &params)?;
    Ok(RouteResolution::Resolved { route, url })
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Param(String),
    Optional(Vec<Token>),
}

fn parse_pattern(pattern: &str) -> Result<Vec<Token>, ModelError> {
    let invalid = |reason: &str| ModelError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let mut stack: Vec<Vec<Token>> = vec![Vec::new()];
    let mut literal = String::new();
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '<' | '(' | ')' => {
                if !literal.is_empty() {
                    if let Some(current) = stack.last_mut() {
                        current.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                }
                match c {
                    '<' => {
                        let name: String = chars.by_ref().take_while(|&c| c != '>').collect();
                        if name.is_empty() {
                            return Err(invalid("empty parameter name"));
                        }
                        if let Some(current) = stack.last_mut() {
                            current.push(Token::Param(name));
                        }
                    }
                    '(' => stack.push(Vec::new()),
                    _ => {
                        let group = stack.pop().ok_or_else(|| invalid("unbalanced ')'"))?;
                        let parent = stack.last_mut().ok_or_else(|| invalid("unbalanced ')'"))?;
                        parent.push(Token::Optional(group));
                    }
                }
            }
            _ => literal.push(c),
        }
    }

    if stack.len() != 1 {
        return Err(invalid("unclosed '('"));
    }
    let mut tokens = stack.pop().unwrap_or_default();
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, as `encodeURIComponent` does
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

struct UrlBuilder<'a> {
    route: &'a Route,
    params: &'a Map<String, Value>,
    used: Vec<String>,
}

impl UrlBuilder<'_> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.params
            .get(name)
            .and_then(scalar_to_string)
            .or_else(|| self.route.defaults.get(name).and_then(scalar_to_string))
    }

    /// Render tokens; `None` means a placeholder had no value.
    fn render(&mut self, tokens: &[Token], out: &mut String) -> Option<()> {
        for token in tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Param(name) => {
                    let value = self.lookup(name)?;
                    out.push_str(&encode_component(&value));
                    self.used.push(name.clone());
                }
                Token::Optional(group) => {
                    let mut part = String::new();
                    let used_before = self.used.len();
                    if self.render(group, &mut part).is_some() {
                        out.push_str(&part);
                    } else {
                        self.used.truncate(used_before);
                    }
                }
            }
        }
        Some(())
    }

    fn first_missing(&self, tokens: &[Token]) -> Option<String> {
        tokens.iter().find_map(|token| match token {
            Token::Param(name) if self.lookup(name).is_none() => Some(name.clone()),
            _ => None,
        })
    }
}

/// Build a URL by substituting `params` into the route pattern.
///
/// Parameters the pattern does not use are appended as a query string in key order.
pub fn build_url(route: &Route, params: &Map<String, Value>) -> Result<String, ModelError> {
    let pattern = route.pattern.as_deref().ok_or_else(|| ModelError::RouteResolution {
        title: route.name.clone().unwrap_or_default(),
    })?;
    let tokens = parse_pattern(pattern)?;

    let mut builder = UrlBuilder {
        route,
        params,
        used: Vec::new(),
    };
    let mut url = String::new();
    if builder.render(&tokens, &mut url).is_none() {
        let param = builder.first_missing(&tokens).unwrap_or_default();
        return Err(ModelError::MissingRouteParam {
            pattern: pattern.to_string(),
            param,
        });
    }

    let query: Vec<String> = params
        .iter()
        .filter(|(key, _)| key.as_str() != QUERY_STRING_CONDITION && !builder.used.contains(key))
        .filter_map(|(key, value)| {
            scalar_to_string(value)
                .map(|value| format!("{}={}", encode_component(key), encode_component(&value)))
        })
        .collect();
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query.join("&"));
    }

    Ok(url)
}
