use super::attribute::{Attribute, AttributeId};
use super::entity::Entity;
use super::tag::{Language, Package, Tag};
use crate::errors::{MetadataError, MetadataResult};
use crate::version::{resolve_key, MolgenisVersion};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Schema of one export run.
///
/// Attributes of all entities live in one arena and are addressed by
/// [`AttributeId`]; entities and compound attributes hold ordered id lists.
/// The repository is assembled once from the server's metadata response
/// and is read-only afterwards.
///
/// Superclass and reference keys are resolved under the identity rule of
/// the server [`version`](Self::version) the schema came from: full names
/// before [`MolgenisVersion::VERSION_3`], opaque ids from then on.
///
/// A deserialized repository is not trusted; run
/// [`check_integrity`](Self::check_integrity) before relying on its trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRepository {
    #[serde(default = "default_version")]
    version: MolgenisVersion,
    entities: Vec<Entity>,
    attributes: Vec<Attribute>,
    packages: Vec<Package>,
    languages: Vec<Language>,
}

fn default_version() -> MolgenisVersion {
    MolgenisVersion::VERSION_3
}

impl Default for MetadataRepository {
    fn default() -> Self {
        Self::for_version(default_version())
    }
}

impl MetadataRepository {
    /// Create an empty repository keyed by entity id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty repository for a schema served by `version`.
    pub fn for_version(version: MolgenisVersion) -> Self {
        Self {
            version,
            entities: Vec::new(),
            attributes: Vec::new(),
            packages: Vec::new(),
            languages: Vec::new(),
        }
    }

    /// Re-key the repository for `version`.
    pub fn with_version(mut self, version: MolgenisVersion) -> Self {
        self.version = version;
        self
    }

    /// Server version whose identity rule keys this repository.
    pub fn version(&self) -> MolgenisVersion {
        self.version
    }

    /// Register a package.
    pub fn add_package(&mut self, package: Package) {
        self.packages.push(package);
    }

    /// Register a language. Languages are unique by code.
    pub fn add_language(&mut self, language: Language) {
        if !self.languages.iter().any(|l| l.code == language.code) {
            self.languages.push(language);
        }
    }

    /// Register an entity. Attributes are attached with [`add_attribute`](Self::add_attribute).
    pub fn add_entity(&mut self, mut entity: Entity) {
        entity.attributes.clear();
        self.entities.push(entity);
    }

    /// Attach a top-level attribute to the most recently added entity keyed `entity_key`.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::UnknownEntity`] if no entity matches and
    /// [`MetadataError::DuplicateAttribute`] if the name is already declared
    /// anywhere in the entity's attribute tree.
    pub fn add_attribute(
        &mut self,
        entity_key: &str,
        attribute: Attribute,
    ) -> MetadataResult<AttributeId> {
        let position = self
            .entities
            .iter()
            .rposition(|e| resolve_key(e, self.version) == entity_key)
            .ok_or_else(|| MetadataError::UnknownEntity(entity_key.to_string()))?;

        let id = self.insert_attribute(position, attribute, None)?;
        self.entities[position].attributes.push(id);
        Ok(id)
    }

    /// Attach `attribute` as the last child of a compound attribute.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::NotCompound`] if `compound` is not a
    /// compound attribute of this repository.
    pub fn add_part(
        &mut self,
        compound: AttributeId,
        attribute: Attribute,
    ) -> MetadataResult<AttributeId> {
        let parent = self
            .attributes
            .get(compound.0)
            .ok_or_else(|| MetadataError::NotCompound(format!("#{}", compound.0)))?;
        if !parent.data_type.is_compound() {
            return Err(MetadataError::NotCompound(parent.name.clone()));
        }

        let owner = parent.entity.clone();
        let position = self
            .entities
            .iter()
            .rposition(|e| e.id == owner)
            .ok_or(MetadataError::UnknownEntity(owner))?;

        let id = self.insert_attribute(position, attribute, Some(compound))?;
        self.attributes[compound.0].parts.push(id);
        Ok(id)
    }

    fn insert_attribute(
        &mut self,
        position: usize,
        mut attribute: Attribute,
        compound: Option<AttributeId>,
    ) -> MetadataResult<AttributeId> {
        let entity = &self.entities[position];
        if self
            .declared_attributes(entity)
            .iter()
            .any(|a| a.name == attribute.name)
        {
            return Err(MetadataError::DuplicateAttribute {
                entity: entity.full_name.clone(),
                attribute: attribute.name,
            });
        }

        attribute.entity = entity.id.clone();
        attribute.parts.clear();
        attribute.compound = compound;

        let id = AttributeId(self.attributes.len());
        self.attributes.push(attribute);
        Ok(id)
    }

    /// All entities in declaration order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entity keyed `key` under the repository's version.
    pub fn entity(&self, key: &str) -> Option<&Entity> {
        self.entity_by_key(key, self.version)
    }

    /// First entity whose version-resolved key equals `key`.
    pub fn entity_by_key(&self, key: &str, version: MolgenisVersion) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| resolve_key(e, version) == key)
    }

    /// Look up an attribute by handle, returning `None` for foreign handles.
    pub fn get_attribute(&self, id: AttributeId) -> Option<&Attribute> {
        self.attributes.get(id.0)
    }

    /// Registered packages.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Registered languages.
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the repository holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The entity followed by its superclasses, root superclass first.
    ///
    /// Stops at a missing superclass or when the chain loops back.
    pub fn lineage<'a>(&'a self, entity: &'a Entity) -> Vec<&'a Entity> {
        let mut chain = vec![entity];
        let mut seen: HashSet<&str> = HashSet::from([entity.id.as_str()]);
        let mut current = entity;

        while let Some(parent) = current.extends.as_deref().and_then(|key| self.entity(key)) {
            if !seen.insert(parent.id.as_str()) {
                break;
            }
            chain.push(parent);
            current = parent;
        }

        chain.reverse();
        chain
    }

    /// Own attribute tree of `entity`, depth-first, compound nodes included.
    pub fn declared_attributes(&self, entity: &Entity) -> Vec<&Attribute> {
        let mut out = Vec::new();
        self.walk(&entity.attributes, false, &mut out);
        out
    }

    /// Leaf attributes of `entity` including inherited ones.
    ///
    /// Superclass attributes come first, then each tree is walked depth-first
    /// in declared order. Compound nodes are never yielded.
    pub fn flatten(&self, entity: &Entity) -> Vec<&Attribute> {
        let mut out = Vec::new();
        for ancestor in self.lineage(entity) {
            self.walk(&ancestor.attributes, true, &mut out);
        }
        out
    }

    /// Depth-first pre-order over the trees under `roots`. Unknown ids and
    /// nodes reached a second time are skipped.
    fn walk<'a>(&'a self, roots: &[AttributeId], leaves_only: bool, out: &mut Vec<&'a Attribute>) {
        let mut seen: HashSet<AttributeId> = HashSet::new();
        let mut stack: Vec<AttributeId> = roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let Some(attribute) = self.attributes.get(id.0) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            if attribute.data_type.is_compound() {
                if !leaves_only {
                    out.push(attribute);
                }
                stack.extend(attribute.parts.iter().rev().copied());
            } else {
                out.push(attribute);
            }
        }
    }

    /// The attribute whose value identifies instances of `entity`.
    pub fn id_attribute(&self, entity: &Entity) -> Option<&Attribute> {
        self.flatten(entity)
            .into_iter()
            .find(|a| a.flags.id_attribute)
    }

    /// Keys of the entities `entity` cannot be understood without:
    /// its superclass and every reference target of its leaf attributes.
    pub fn dependencies<'a>(&'a self, entity: &'a Entity) -> Vec<&'a str> {
        let mut deps: Vec<&str> = Vec::new();
        let candidates = entity.extends.as_deref().into_iter().chain(
            self.flatten(entity)
                .into_iter()
                .filter_map(|a| a.ref_entity.as_deref()),
        );
        let own_key = resolve_key(entity, self.version);
        for key in candidates {
            if key != own_key && !deps.contains(&key) {
                deps.push(key);
            }
        }
        deps
    }

    /// Subset of this repository holding the requested entities and
    /// everything they depend on, in original declaration order.
    ///
    /// An empty request keeps every entity. Requested names, superclasses
    /// and references are all compared against keys resolved under
    /// `version`, which the result is keyed by. Names that match nothing
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::IncompleteMetadata`] when a kept entity
    /// depends on an entity this repository does not contain.
    pub fn filtered(&self, names: &[String], version: MolgenisVersion) -> MetadataResult<Self> {
        if version != self.version {
            return self.clone().with_version(version).filtered(names, version);
        }

        let mut keep = vec![false; self.entities.len()];
        let mut queue: VecDeque<usize> = VecDeque::new();

        for (index, entity) in self.entities.iter().enumerate() {
            if names.is_empty() || names.iter().any(|n| n == resolve_key(entity, version)) {
                keep[index] = true;
                queue.push_back(index);
            }
        }

        while let Some(index) = queue.pop_front() {
            let entity = &self.entities[index];
            for dep in self.dependencies(entity) {
                let target = self
                    .entities
                    .iter()
                    .position(|e| resolve_key(e, version) == dep)
                    .ok_or_else(|| MetadataError::IncompleteMetadata {
                        entity: resolve_key(entity, version).to_string(),
                        missing: dep.to_string(),
                    })?;
                if !keep[target] {
                    keep[target] = true;
                    queue.push_back(target);
                }
            }
        }

        let entities: Vec<Entity> = self
            .entities
            .iter()
            .zip(keep)
            .filter_map(|(entity, kept)| kept.then(|| entity.clone()))
            .collect();

        let mut needed: HashSet<&str> = HashSet::new();
        for entity in &entities {
            let mut package = entity.package.as_deref();
            while let Some(name) = package {
                if !needed.insert(name) {
                    break;
                }
                package = self
                    .packages
                    .iter()
                    .find(|p| p.id == name)
                    .and_then(|p| p.parent.as_deref());
            }
        }
        let packages = self
            .packages
            .iter()
            .filter(|p| needed.contains(p.id.as_str()))
            .cloned()
            .collect();

        Ok(Self {
            version,
            entities,
            attributes: self.attributes.clone(),
            packages,
            languages: self.languages.clone(),
        })
    }

    /// Check structural invariants of the schema.
    ///
    /// # Errors
    ///
    /// - [`MetadataError::CorruptAttributeTree`] as for [`check_integrity`](Self::check_integrity)
    /// - [`MetadataError::CyclicInheritance`] for a looping superclass chain
    /// - [`MetadataError::IncompleteMetadata`] for unresolved superclass or reference targets
    /// - [`MetadataError::IdAttribute`] when a concrete entity does not have exactly one id attribute
    pub fn validate(&self) -> MetadataResult<()> {
        self.check_integrity()?;
        for entity in &self.entities {
            let chain = self.lineage(entity);
            let root = chain[0];
            if let Some(parent) = root.extends.as_deref() {
                if self.entity(parent).is_some() {
                    return Err(MetadataError::CyclicInheritance(entity.full_name.clone()));
                }
            }

            for dep in self.dependencies(entity) {
                if self.entity(dep).is_none() {
                    return Err(MetadataError::IncompleteMetadata {
                        entity: entity.full_name.clone(),
                        missing: dep.to_string(),
                    });
                }
            }

            if !entity.abstract_class {
                let count = self
                    .flatten(entity)
                    .iter()
                    .filter(|a| a.flags.id_attribute)
                    .count();
                if count != 1 {
                    return Err(MetadataError::IdAttribute {
                        entity: entity.full_name.clone(),
                        count,
                    });
                }
            }
        }
        Ok(())
    }

    /// Check that the attribute arena forms one tree per entity.
    ///
    /// Every id an entity or compound attribute lists must exist, be listed
    /// only once across the repository, and point back at its entity and
    /// parent. Only compound attributes may have parts. This is the guard
    /// for repositories that were deserialized rather than built.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::CorruptAttributeTree`] naming the first broken entity.
    pub fn check_integrity(&self) -> MetadataResult<()> {
        let mut seen = vec![false; self.attributes.len()];

        for entity in &self.entities {
            let corrupt = |reason: String| MetadataError::CorruptAttributeTree {
                entity: entity.full_name.clone(),
                reason,
            };
            let mut stack: Vec<(AttributeId, Option<AttributeId>)> =
                entity.attributes.iter().map(|id| (*id, None)).collect();

            while let Some((id, parent)) = stack.pop() {
                let attribute = self
                    .attributes
                    .get(id.0)
                    .ok_or_else(|| corrupt(format!("attribute #{} does not exist", id.0)))?;
                if std::mem::replace(&mut seen[id.0], true) {
                    return Err(corrupt(format!(
                        "attribute '{}' is reached more than once",
                        attribute.name
                    )));
                }
                if attribute.entity != entity.id {
                    return Err(corrupt(format!(
                        "attribute '{}' belongs to '{}'",
                        attribute.name, attribute.entity
                    )));
                }
                if attribute.compound != parent {
                    return Err(corrupt(format!(
                        "attribute '{}' has a wrong parent link",
                        attribute.name
                    )));
                }
                if !attribute.parts.is_empty() && !attribute.data_type.is_compound() {
                    return Err(corrupt(format!(
                        "attribute '{}' has parts but is not compound",
                        attribute.name
                    )));
                }
                stack.extend(attribute.parts.iter().map(|part| (*part, Some(id))));
            }
        }
        Ok(())
    }

    /// Distinct tags used by packages, entities and attributes, first-seen order.
    pub fn tags(&self) -> Vec<&Tag> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut tags = Vec::new();

        let package_tags = self.packages.iter().flat_map(|p| p.tags.iter());
        let entity_tags = self.entities.iter().flat_map(|e| {
            e.tags.iter().chain(
                self.declared_attributes(e)
                    .into_iter()
                    .flat_map(|a| a.tags.iter()),
            )
        });

        for tag in package_tags.chain(entity_tags) {
            if seen.insert(tag.id.as_str()) {
                tags.push(tag);
            }
        }
        tags
    }
}
