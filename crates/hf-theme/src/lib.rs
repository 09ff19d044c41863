//! # hf-theme — theme documents and their validation
//!
//! Loads YAML theme descriptions into [`ThemeDocument`]s, puts them into
//! canonical form, layers variants onto base themes, and validates them
//! against the VS Code UI vocabulary and WCAG contrast.
//!
//! # Flow
//!
//! ```text
//! YAML text
//!     │
//!     ▼
//! document.rs:   parse_theme → Complete(ThemeDocument) | Variant{extends, overrides}
//!     │
//!     ▼
//! merge.rs:      merge(base, overrides) / normalize(doc)
//!     │
//!     ▼
//! validate.rs:   validate(doc, config) → Validated { document, issues }
//! ```
//!
//! Nothing here touches the filesystem; callers hand in text and get values
//! back.

pub mod document;
pub mod font;
pub mod merge;
pub mod validate;
pub mod vocabulary;

pub use document::{
    Author, LoadError, ParsedTheme, ThemeDocument, ThemeKind, ThemeMetadata, TokenColorRule,
    TokenSettings, UiColorMap, parse_theme,
};
pub use font::FontStyle;
pub use merge::{ThemeOverrides, merge, normalize};
pub use validate::{
    InvalidConfiguration, Severity, Validated, ValidationConfig, ValidationIssue, slugify,
    validate,
};
