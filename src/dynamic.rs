//! Schema-less option setters.
//!
//! pdflayer accepts dozens of options (`margin_top`, `watermark_url`,
//! `no_images`, …) and adds new ones over time, so the client does not model
//! them one by one. Two entry points cover any option:
//!
//! * [`PdfLayer::call`] takes a setter name, `"setWatermarkInBackground"`,
//!   and stores the value under the snake-cased suffix,
//!   `watermark_in_background`.
//! * [`PdfLayer::assign`] stores the value under the name exactly as given.

use crate::client::PdfLayer;
use crate::error::PdfLayerError;
use crate::loader::DEFAULT_ORIENTATION;
use crate::params::ParamValue;
use tracing::debug;

/// Operations with a typed method of their own. A dynamic call to one of
/// these never falls through to the generic setter.
pub const RESERVED_OPERATIONS: &[&str] = &[
    "loadView",
    "loadFile",
    "stream",
    "output",
    "download",
    "save",
    "addParams",
    "setParams",
    "replaceParams",
    "seeParams",
    "seeRequestArgs",
];

impl PdfLayer {
    /// Dispatch a call by name.
    ///
    /// Named operations that take a single value (`setPaper`, `loadUrl`,
    /// `loadHTML`) run as if called directly. Any other `set<Name>` stores
    /// `value` under `snake_case(Name)`. Everything else fails before any
    /// network activity.
    pub fn call(
        &mut self,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<&mut Self, PdfLayerError> {
        let value = value.into();
        match name {
            "setPaper" | "setPaperSize" => {
                let layout = value.to_string();
                Ok(self.set_paper(&layout, DEFAULT_ORIENTATION))
            }
            "loadUrl" => {
                let url = value.to_string();
                Ok(self.load_url(&url))
            }
            "loadHTML" | "loadHtml" => Ok(self.load_html(value, None)),
            _ if RESERVED_OPERATIONS.contains(&name) => {
                Err(PdfLayerError::ReservedOperation { name: name.into() })
            }
            _ => {
                let key = setter_key(name)
                    .ok_or_else(|| PdfLayerError::UndefinedOperation { name: name.into() })?;
                debug!("{} → {}", name, key);
                self.params.set(key, value);
                Ok(self)
            }
        }
    }

    /// Set option `name` verbatim, with no case conversion.
    ///
    /// Every name goes to the parameter set, including names like `params`
    /// or `config` that match the client's own fields; those fields are
    /// only reachable through their typed methods.
    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.params.set(name, value);
        self
    }
}

/// The parameter key for a `set…` call, or `None` if `name` is not a setter.
pub fn setter_key(name: &str) -> Option<String> {
    let suffix = name.strip_prefix("set")?;
    if suffix.trim().is_empty() {
        return None;
    }
    Some(snake_case(suffix))
}

/// `WatermarkInBackground` → `watermark_in_background`.
///
/// Whitespace-separated words are capitalised and joined first, so
/// `"no images"` becomes `no_images`. Every uppercase letter after the first
/// character starts a new word, including letters inside acronyms
/// (`PDFTitle` → `p_d_f_title`).
pub fn snake_case(value: &str) -> String {
    let joined: String = value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();

    let mut out = String::with_capacity(joined.len() + 4);
    for (i, c) in joined.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}
