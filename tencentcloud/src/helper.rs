//! Small helpers shared by resources: composite IDs, tag diffs, immutable
//! arguments and operation timing.

use std::collections::HashMap;
use std::time::Instant;

use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::Context;

/// Separator between the parts of a composite resource ID.
pub const FILED_SP: &str = "#";

pub fn compose_id(parts: &[&str]) -> String {
    parts.join(FILED_SP)
}

/// Split a composite ID into exactly `count` non-empty parts.
pub fn split_id(id: &str, count: usize) -> Result<Vec<String>, Diagnostic> {
    let parts: Vec<String> = id.split(FILED_SP).map(str::to_string).collect();
    if parts.len() != count || parts.iter().any(String::is_empty) {
        return Err(Diagnostic::error(
            "Invalid resource ID",
            format!(
                "id `{}` is broken, expected {} parts separated by `{}`",
                id, count, FILED_SP
            ),
        )
        .with_attribute(AttributePath::new("id")));
    }
    Ok(parts)
}

/// Tags to set and tag keys to remove when moving from `old` to `new`.
pub fn diff_tags(
    old: &HashMap<String, String>,
    new: &HashMap<String, String>,
) -> (HashMap<String, String>, Vec<String>) {
    let replace = new
        .iter()
        .filter(|(k, v)| old.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut delete: Vec<String> = old.keys().filter(|k| !new.contains_key(*k)).cloned().collect();
    delete.sort();

    (replace, delete)
}

/// One error per listed attribute whose planned value differs from state.
pub fn immutable_args_changed(
    prior: &DynamicValue,
    planned: &DynamicValue,
    names: &[&str],
) -> Vec<Diagnostic> {
    names
        .iter()
        .filter(|name| {
            let path = AttributePath::new(name);
            normalized(prior.get(&path)) != normalized(planned.get(&path))
        })
        .map(|name| {
            Diagnostic::error(
                format!("argument `{}` cannot be changed", name),
                format!("`{}` can only be set when the resource is created", name),
            )
            .with_attribute(AttributePath::new(name))
        })
        .collect()
}

// Sets arrive in no particular order.
fn normalized(value: Option<&Dynamic>) -> Dynamic {
    match value {
        None => Dynamic::Null,
        Some(Dynamic::List(items)) => {
            let mut items = items.clone();
            items.sort_by(|a, b| format!("{:?}", a).cmp(&format!("{:?}", b)));
            Dynamic::List(items)
        }
        Some(v) => v.clone(),
    }
}

/// Logs how long a resource operation took when dropped.
pub struct LogElapsed {
    operation: String,
    log_id: String,
    started: Instant,
}

pub fn log_elapsed(ctx: &Context, operation: impl Into<String>) -> LogElapsed {
    LogElapsed {
        operation: operation.into(),
        log_id: ctx.log_id().to_string(),
        started: Instant::now(),
    }
}

impl Drop for LogElapsed {
    fn drop(&mut self) {
        tracing::debug!(
            log_id = %self.log_id,
            "{} elapsed {}ms",
            self.operation,
            self.started.elapsed().as_millis()
        );
    }
}

/// Optional string attribute, empty strings treated as unset.
pub fn string_opt(value: &DynamicValue, path: &AttributePath) -> Option<String> {
    value
        .get_string_opt(path)
        .ok()
        .flatten()
        .filter(|s| !s.is_empty())
}

pub fn i64_opt(value: &DynamicValue, path: &AttributePath) -> Option<i64> {
    value.get_i64_opt(path).ok().flatten()
}

pub fn string_map(value: &DynamicValue, path: &AttributePath) -> HashMap<String, String> {
    value.get_string_map(path).unwrap_or_default()
}

pub fn string_list(value: &DynamicValue, path: &AttributePath) -> Vec<String> {
    value.get_string_list(path).unwrap_or_default()
}

/// Set a string attribute when the API returned a non-empty one, null otherwise.
pub fn set_string_opt(state: &mut DynamicValue, name: &str, value: Option<&str>) {
    let value = value.filter(|v| !v.is_empty()).map(Dynamic::from);
    let _ = state.set_value(&AttributePath::new(name), value.unwrap_or(Dynamic::Null));
}

pub fn set_i64_opt(state: &mut DynamicValue, name: &str, value: Option<i64>) {
    let _ = state.set_value(&AttributePath::new(name), value.map(Dynamic::from).unwrap_or(Dynamic::Null));
}

/// First element of a `max_items = 1` list block.
pub fn single_block<'a>(value: &'a DynamicValue, name: &str) -> Option<&'a Dynamic> {
    value.get(&AttributePath::new(name))?.as_list()?.first()
}

/// First element of a single-item block nested inside `block`.
pub fn field_block<'a>(block: &'a Dynamic, name: &str) -> Option<&'a Dynamic> {
    block.get(name)?.as_list()?.first()
}

pub fn field_string(block: &Dynamic, name: &str) -> Option<String> {
    block
        .get(name)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn field_i64(block: &Dynamic, name: &str) -> Option<i64> {
    block.get(name)?.as_i64()
}

pub fn field_f64(block: &Dynamic, name: &str) -> Option<f64> {
    block.get(name)?.as_f64()
}

pub fn field_string_list(block: &Dynamic, name: &str) -> Vec<String> {
    block
        .get(name)
        .and_then(Dynamic::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// A one-element list block; unset fields become null.
pub fn block_value<'a, I>(fields: I) -> Dynamic
where
    I: IntoIterator<Item = (&'a str, Option<Dynamic>)>,
{
    let fields: HashMap<String, Dynamic> = fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.unwrap_or(Dynamic::Null)))
        .collect();
    Dynamic::List(vec![Dynamic::Map(fields)])
}
