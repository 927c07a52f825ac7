//! # pdflayer-client
//!
//! Client for the [pdflayer](https://pdflayer.com) HTML-to-PDF conversion API.
//!
//! Build a [`PdfLayer`], point it at a document, pile on options, and ask for
//! the PDF. The client makes exactly one HTTP call per instance and caches
//! the bytes, so `output`, `stream`, `download` and `save` can be mixed
//! freely.
//!
//! ## Request Flow
//!
//! ```text
//! load_url / load_html / load_view / load_file
//! set_paper / call("setMarginTop", 10) / assign("no_images", true)
//!  │
//!  ├─ 1. Params     ordered option set, seeded from config (+ test=1 in sandbox)
//!  ├─ 2. Request    access_key + options → query; document_html/header_html → body
//!  ├─ 3. Transport  one form-encoded POST
//!  ├─ 4. Classify   {"error": {…}} → ServiceError, anything else is the PDF
//!  └─ 5. Cache      bytes kept for every later output call
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdflayer_client::{PdfLayer, PdfLayerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // PDF_LAYER_ACCESS_KEY, PDF_LAYER_SECRET_KEYWORD, APP_ENV, …
//!     let config = PdfLayerConfig::from_env()?;
//!     let mut pdf = PdfLayer::new(config)?;
//!     pdf.load_url("https://example.com/invoice/42")
//!         .set_paper("A4", "portrait")
//!         .call("setMarginTop", 20)?;
//!     let bytes = pdf.output().await?;
//!     eprintln!("{} bytes", bytes.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdflayer` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod classify;
pub mod client;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod loader;
pub mod params;
pub mod request;
pub mod response;
pub mod source;
pub mod transport;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{PdfLayer, PdfLayerBuilder};
pub use config::{PdfLayerConfig, PdfLayerConfigBuilder, DEFAULT_ENDPOINT};
pub use error::{ErrorKind, PdfLayerError, ServiceError};
pub use params::{ParamValue, ParameterStore};
pub use request::{PreparedRequest, RequestArg, RequestPart};
pub use response::{Disposition, PdfResponse};
pub use source::{Filesystem, LocalFilesystem, Resource};
pub use transport::{HttpTransport, Transport};
pub use view::ViewRenderer;
