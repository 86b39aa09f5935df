//! Check command: authorize one operation against a fixture.

use std::path::Path;

use anyhow::{Context, Result};
use fieldguard::{Identity, RequestContext, Response};
use serde_json::{Map, Value};

/// Runs `with_auth` for `operation`, using the fixture as the resolver result.
///
/// The response is printed as JSON in every case; a refused call also
/// fails the command.
pub fn run(
    project_dir: Option<&Path>,
    rules: Option<&Path>,
    operation: &str,
    kind: Option<&str>,
    identity: Option<&str>,
    result: Option<&Path>,
) -> Result<()> {
    let config = super::load_config(project_dir)?;
    let guard = config.guard(super::load_registry(&config, rules)?);
    let ctx = request_context(kind, identity)?;

    // Read lazily: a refusal without predicate rules never touches the fixture
    let attrs = Value::Object(Map::new());
    let outcome = guard.with_auth(operation, &attrs, &ctx, |_, _| {
        super::read_json(result).map_err(|e| format!("{e:#}"))
    });

    let refused = outcome.as_ref().err().cloned();
    println!("{}", serde_json::to_string_pretty(&Response::from(outcome))?);

    match refused {
        Some(err) => Err(err).with_context(|| format!("Operation '{operation}' refused")),
        None => Ok(()),
    }
}

fn request_context(kind: Option<&str>, identity: Option<&str>) -> Result<RequestContext> {
    let Some(kind) = kind else {
        return Ok(RequestContext::anonymous());
    };

    let attributes: Map<String, Value> = match identity {
        Some(json) => serde_json::from_str(json).context("--identity must be a JSON object")?,
        None => Map::new(),
    };

    let mut user = Identity::new(kind);
    for (key, value) in attributes {
        user = user.with_attribute(key, value);
    }

    Ok(RequestContext::for_user(user))
}
