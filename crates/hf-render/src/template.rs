// SPDX-License-Identifier: MIT
//
// Template environment for extension artifacts, on top of minijinja.
//
// Templates use Jinja syntax. Beyond minijinja's builtins (`upper`, `lower`,
// `title`, `length`, `loop.*`, `{%- -%}` trimming, …) the environment adds:
//
//   default("x")   fallback when the value is undefined, none, or ""
//   json           pretty JSON; json(N) indents continuation lines by N
//   json_compact   single-line JSON
//   slug           lowercase-hyphen form
//
// Lookups are semi-strict: printing or iterating an undefined value fails
// the render, while `{% if missing %}` is simply false. Output is never
// HTML-escaped, whatever the artifact's extension.

use std::collections::HashSet;

use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// A template that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{template}:{line}: {message}")]
pub struct TemplateSyntaxError {
    pub template: String,
    pub line: usize,
    pub message: String,
}

/// A template that parsed but referenced something the context lacks, or
/// applied a filter to a value it cannot take.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{template}:{line}: `{path}` {reason}")]
pub struct TemplateBindingError {
    pub template: String,
    pub line: usize,
    /// Dotted lookup that failed; empty when the failure is not a lookup.
    pub path: String,
    pub reason: String,
}

// ─── Environment ─────────────────────────────────────────────────────────────

/// A fresh environment with the artifact filters and lookup rules.
#[must_use]
pub fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::SemiStrict);
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_filter("default", fallback);
    env.add_filter("json", json);
    env.add_filter("json_compact", json_compact);
    env.add_filter("slug", |text: &str| hf_theme::slugify(text));
    env
}

/// Parse `source` and register it under `name`.
///
/// # Errors
///
/// Unclosed blocks, stray tags, and malformed expressions, with the line
/// they were found on.
pub fn add(env: &mut Environment<'static>, name: &str, source: &str) -> Result<(), TemplateSyntaxError> {
    env.add_template_owned(name.to_string(), source.to_string())
        .map_err(|err| TemplateSyntaxError {
            template: name.to_string(),
            line: err.line().unwrap_or(1),
            message: reason(&err),
        })
}

/// Render the template registered as `name` against `context`.
///
/// # Errors
///
/// The first failed lookup or filter, named by template and line. The
/// `path` of an undefined lookup is recovered from the template's free
/// variables that `context` cannot resolve.
pub fn render(
    env: &Environment<'static>,
    name: &str,
    context: &serde_json::Value,
) -> Result<String, TemplateBindingError> {
    let template = env.get_template(name).map_err(|err| TemplateBindingError {
        template: name.to_string(),
        line: 0,
        path: String::new(),
        reason: err.to_string(),
    })?;
    template
        .render(Value::from_serialize(context))
        .map_err(|err| {
            let line = err.line().unwrap_or(1);
            let (path, reason) = if err.kind() == ErrorKind::UndefinedError {
                let free = template.undeclared_variables(true);
                (
                    unbound_path(&free, context, template.source(), line),
                    "is not defined".to_string(),
                )
            } else {
                (String::new(), reason(&err))
            };
            TemplateBindingError {
                template: name.to_string(),
                line,
                path,
                reason,
            }
        })
}

fn reason(err: &Error) -> String {
    err.detail().map_or_else(|| err.kind().to_string(), str::to_string)
}

/// The unresolvable free variable on `line`, else the first one in order.
fn unbound_path(free: &HashSet<String>, context: &serde_json::Value, source: &str, line: usize) -> String {
    let mut missing: Vec<&String> = free.iter().filter(|path| !resolves(context, path)).collect();
    missing.sort();
    let text = source.lines().nth(line.saturating_sub(1)).unwrap_or_default();
    missing
        .iter()
        .find(|path| text.contains(path.as_str()))
        .or_else(|| missing.first())
        .map_or_else(String::new, |path| (*path).clone())
}

fn resolves(context: &serde_json::Value, path: &str) -> bool {
    path.split('.')
        .try_fold(context, |value, key| value.get(key))
        .is_some_and(|value| !value.is_null())
}

// ─── Filters ─────────────────────────────────────────────────────────────────

fn fallback(value: &Value, other: Option<Value>) -> Value {
    let missing = value.is_undefined() || value.is_none() || value.as_str() == Some("");
    if missing { other.unwrap_or_else(|| Value::from("")) } else { value.clone() }
}

fn json(value: &Value, indent: Option<usize>) -> Result<String, Error> {
    let text = serde_json::to_string_pretty(value).map_err(json_error)?;
    Ok(match indent {
        Some(n) if n > 0 => text.replace('\n', &format!("\n{}", " ".repeat(n))),
        _ => text,
    })
}

fn json_compact(value: &Value) -> Result<String, Error> {
    serde_json::to_string(value).map_err(json_error)
}

fn json_error(err: serde_json::Error) -> Error {
    Error::new(ErrorKind::InvalidOperation, "value cannot be written as JSON").with_source(err)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
