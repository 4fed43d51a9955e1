use super::{
    ArtifactId, Descriptor, DocumentId, Endpoint, Package, Relationship, RelationshipKind, Source,
};
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

/// Violation of a document invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("relationship {kind} references missing artifact {id}")]
    MissingEndpoint { id: ArtifactId, kind: RelationshipKind },

    #[error("package {id} has a blank name")]
    BlankName { id: ArtifactId },
}

/// The canonical in-memory SBOM.
///
/// A `Sbom` is built once through [`SbomBuilder`] and is read-only
/// afterwards; encoders only ever see `&Sbom`, so a single document can be
/// encoded into several formats concurrently.
#[derive(Debug, Clone)]
pub struct Sbom {
    id: DocumentId,
    created: DateTime<Utc>,
    source: Source,
    descriptor: Descriptor,
    packages: IndexMap<ArtifactId, Package>,
    relationships: IndexSet<Relationship>,
}

impl Sbom {
    /// Start building a document for the given source.
    #[must_use]
    pub fn builder(source: Source) -> SbomBuilder {
        SbomBuilder::new(source)
    }

    #[must_use]
    pub const fn id(&self) -> DocumentId {
        self.id
    }

    /// Creation timestamp; the only timestamp encoders may emit.
    #[must_use]
    pub const fn created(&self) -> DateTime<Utc> {
        self.created
    }

    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    #[must_use]
    pub const fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Packages in insertion order.
    pub fn packages(&self) -> impl ExactSizeIterator<Item = &Package> {
        self.packages.values()
    }

    /// Packages ordered by name, version, type and ID.
    ///
    /// Encoders iterate this order so output is stable regardless of how the
    /// document was assembled.
    #[must_use]
    pub fn sorted_packages(&self) -> Vec<&Package> {
        let mut packages: Vec<&Package> = self.packages.values().collect();
        packages.sort_by(|a, b| {
            a.name()
                .cmp(b.name())
                .then_with(|| a.version().cmp(b.version()))
                .then_with(|| a.package_type().cmp(&b.package_type()))
                .then_with(|| a.id().cmp(b.id()))
        });
        packages
    }

    #[must_use]
    pub fn package(&self, id: &ArtifactId) -> Option<&Package> {
        self.packages.get(id)
    }

    #[must_use]
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Relationships in insertion order.
    pub fn relationships(&self) -> impl ExactSizeIterator<Item = &Relationship> {
        self.relationships.iter()
    }

    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Check referential integrity of every relationship.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        for rel in &self.relationships {
            check_endpoints(rel, |id| self.packages.contains_key(id))?;
        }
        Ok(())
    }

    /// Reopen the document for modification.
    #[must_use]
    pub fn into_builder(self) -> SbomBuilder {
        SbomBuilder {
            id: self.id,
            created: self.created,
            source: self.source,
            descriptor: self.descriptor,
            packages: self.packages,
            relationships: self.relationships,
        }
    }
}

fn check_endpoints(
    rel: &Relationship,
    exists: impl Fn(&ArtifactId) -> bool,
) -> Result<(), IntegrityError> {
    for endpoint in [&rel.from, &rel.to] {
        if let Endpoint::Artifact(id) = endpoint
            && !exists(id)
        {
            return Err(IntegrityError::MissingEndpoint {
                id: id.clone(),
                kind: rel.kind,
            });
        }
    }
    Ok(())
}

/// Builder that enforces the document invariants while it is assembled.
#[derive(Debug, Clone)]
#[must_use]
pub struct SbomBuilder {
    id: DocumentId,
    created: DateTime<Utc>,
    source: Source,
    descriptor: Descriptor,
    packages: IndexMap<ArtifactId, Package>,
    relationships: IndexSet<Relationship>,
}

impl SbomBuilder {
    /// New document with a random ID, stamped with the current time.
    pub fn new(source: Source) -> Self {
        Self {
            id: DocumentId::random(),
            created: Utc::now(),
            source,
            descriptor: Descriptor::default(),
            packages: IndexMap::new(),
            relationships: IndexSet::new(),
        }
    }

    pub const fn id(mut self, id: DocumentId) -> Self {
        self.id = id;
        self
    }

    pub const fn created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    pub fn descriptor(mut self, descriptor: Descriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Add a package and return its artifact ID.
    ///
    /// A package with the same identity as an existing one is not added
    /// again; the existing ID is returned. Two different packages that collide
    /// on the hash are kept apart by re-deriving the newcomer's ID. Packages
    /// whose name is empty or whitespace are rejected.
    pub fn add_package(&mut self, mut package: Package) -> Result<ArtifactId, IntegrityError> {
        if package.name().trim().is_empty() {
            return Err(IntegrityError::BlankName {
                id: package.id().clone(),
            });
        }

        let mut salt = 0;
        loop {
            match self.packages.get(package.id()) {
                None => break,
                Some(existing) if existing.same_identity(&package) => {
                    tracing::debug!(
                        "Duplicate package {}@{} ignored",
                        package.name(),
                        package.version()
                    );
                    return Ok(existing.id().clone());
                }
                Some(_) => {
                    salt += 1;
                    package.rederive_id(salt);
                }
            }
        }

        let id = package.id().clone();
        self.packages.insert(id.clone(), package);
        Ok(id)
    }

    /// Add a relationship.
    ///
    /// Returns `Ok(false)` when the same triple is already present.
    pub fn add_relationship(&mut self, relationship: Relationship) -> Result<bool, IntegrityError> {
        check_endpoints(&relationship, |id| self.packages.contains_key(id))?;
        Ok(self.relationships.insert(relationship))
    }

    /// Remove a package together with every relationship that touches it.
    pub fn remove_package(&mut self, id: &ArtifactId) -> Option<Package> {
        let removed = self.packages.shift_remove(id)?;
        let endpoint = Endpoint::Artifact(id.clone());
        self.relationships
            .retain(|rel| rel.from != endpoint && rel.to != endpoint);
        Some(removed)
    }

    #[must_use]
    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.packages.contains_key(id)
    }

    /// Freeze the document.
    #[must_use]
    pub fn build(self) -> Sbom {
        Sbom {
            id: self.id,
            created: self.created,
            source: self.source,
            descriptor: self.descriptor,
            packages: self.packages,
            relationships: self.relationships,
        }
    }
}
