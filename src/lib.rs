//! **SBOM document model and multi-format codec.**
//!
//! `sbom-convert` holds an in-memory software bill of materials (packages,
//! relationships and the source they were cataloged from) and moves it between
//! formats: the native JSON schema, **CycloneDX** (JSON and XML) and **SPDX**
//! (JSON and tag-value), plus a human-readable package table.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: the [`Sbom`] document. Package IDs are derived from package
//!   content, so the same package gets the same ID in every format.
//! - **[`formats`]**: the [`Format`] trait, the built-in codecs and the
//!   [`FormatRegistry`] that identifies unlabeled bytes.
//! - **[`pipeline`]**: read → identify → decode → encode to many destinations.
//! - **[`config`]**: YAML configuration with validation and a JSON Schema.
//!
//! ## Getting Started
//!
//! ```
//! use sbom_convert::formats::{self, FormatId};
//! use sbom_convert::model::{Package, PackageType, Sbom, Source};
//!
//! let mut builder = Sbom::builder(Source::directory("/src"));
//! builder.add_package(Package::new("left-pad", "1.0.0", PackageType::Npm)).unwrap();
//! let sbom = builder.build();
//!
//! let spdx = formats::registry().by_id(FormatId::SpdxJson).unwrap();
//! let bytes = formats::encode_to_vec(spdx.as_ref(), &sbom).unwrap();
//!
//! let found = formats::identify(&bytes).unwrap();
//! assert_eq!(found.id, FormatId::SpdxJson);
//!
//! let decoded = formats::decode(&bytes).unwrap();
//! assert_eq!(decoded.package_count(), 1);
//! ```
//!
//! ## Command-Line Interface (CLI)
//!
//! The `sbom-convert` binary wraps [`pipeline::convert`]:
//! `sbom-convert convert bom.cdx.json -o spdx-json=sbom.spdx.json -o table`.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
// Pedantic lints: allow categories that are design choices for this codebase
#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::module_name_repetitions,
    clippy::similar_names
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod formats;
pub mod model;
pub mod pipeline;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError, Validatable};
pub use error::{DestinationFailure, ErrorContext, Result, SbomError};
pub use formats::{
    Format, FormatError, FormatId, FormatOptions, FormatRegistry, Identification,
};
pub use model::{Package, PackageType, Relationship, RelationshipKind, Sbom, SbomBuilder, Source};
pub use pipeline::{convert, InputSource};
