//! Canonical document model.
//!
//! Every format decodes into and encodes from these structures; no decoder
//! ever hands its output straight to an encoder. A [`Sbom`] is assembled with
//! an [`SbomBuilder`], which keeps artifact identifiers and relationship
//! endpoints consistent, and is immutable afterwards:
//!
//! ```
//! use sbom_convert::model::{Endpoint, Package, PackageType, Relationship, RelationshipKind, Sbom, Source};
//!
//! let mut builder = Sbom::builder(Source::directory("/app"));
//! let id = builder.add_package(Package::new("left-pad", "1.0.0", PackageType::Npm)).unwrap();
//! builder
//!     .add_relationship(Relationship::new(Endpoint::Root, id, RelationshipKind::Contains))
//!     .unwrap();
//! let sbom = builder.build();
//! assert_eq!(sbom.package_count(), 1);
//! ```

mod identifiers;
mod license;
mod package;
mod purl;
mod relationship;
mod sbom;
mod source;

pub use identifiers::{ArtifactId, DocumentId};
pub use license::{LicenseClass, classify_license, is_spdx_expression};
pub use package::{Language, Location, Package, PackageMetadata, PackageType};
pub use purl::{derive_purl, package_type_from_purl};
pub use relationship::{Endpoint, ROOT_REFERENCE, Relationship, RelationshipKind};
pub use sbom::{IntegrityError, Sbom, SbomBuilder};
pub use source::{Descriptor, Scope, Source, SourceKind};
