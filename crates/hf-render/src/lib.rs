// SPDX-License-Identifier: MIT
//
// hf-render — turns a validated theme document into extension files.
//
//   template → minijinja environment: filters, lookup rules, error mapping
//   renderer → TemplateSet (builtin + user overlays), context, render()

pub mod renderer;
pub mod template;

pub use renderer::{
    DEFAULT_ENGINES_VERSION, Globals, RenderError, Screenshot, TemplateSet, context, render,
    render_with,
};
pub use template::{TemplateBindingError, TemplateSyntaxError};
