use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::{
    error::{Error, Result},
    types::{Collection, Document, DocumentSummary},
};

/// Separator between collection and document in a qualified reference.
pub const QUALIFIER: char = ':';

/// Immutable snapshot of every collection found by a scan.
///
/// Collection names are unique across the registry and document names are
/// unique within a collection; [`Registry::insert`] refuses anything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Registry {
    collections: BTreeMap<String, Collection>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from already-parsed collections.
    pub fn from_collections(collections: impl IntoIterator<Item = Collection>) -> Result<Self> {
        let mut registry = Self::new();
        for collection in collections {
            registry.insert(collection)?;
        }
        Ok(registry)
    }

    /// Add a collection, enforcing both uniqueness invariants.
    pub fn insert(&mut self, collection: Collection) -> Result<()> {
        let mut seen = HashSet::new();
        for doc in &collection.documents {
            if !seen.insert(doc.name.as_str()) {
                return Err(Error::DuplicateName {
                    collection: collection.name.clone(),
                    name: doc.name.clone(),
                });
            }
        }

        if let Some(existing) = self.collections.get(&collection.name) {
            return Err(Error::DuplicateCollection {
                name: collection.name.clone(),
                first: existing.path.clone(),
                second: collection.path,
            });
        }
        self.collections.insert(collection.name.clone(), collection);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.collections.values().map(|c| c.documents.len()).sum()
    }

    /// Collections in name order.
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    pub fn get_collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// List the documents of one collection in discovery order.
    pub fn list(&self, collection: &str) -> Result<Vec<DocumentSummary>> {
        self.collections
            .get(collection)
            .map(Collection::summaries)
            .ok_or_else(|| Error::collection_not_found(collection))
    }

    /// Find a document by collection and name.
    pub fn find(&self, collection: &str, name: &str) -> Result<&Document> {
        self.collections
            .get(collection)
            .ok_or_else(|| Error::collection_not_found(collection))?
            .get(name)
            .ok_or_else(|| Error::not_found(collection, name))
    }

    /// Resolve `collection:name`, or a bare `name` that only one collection holds.
    pub fn resolve(&self, reference: &str) -> Result<(&Collection, &Document)> {
        if let Some((collection, name)) = reference.split_once(QUALIFIER) {
            let doc = self.find(collection, name)?;
            let owner = self
                .collections
                .get(collection)
                .ok_or_else(|| Error::collection_not_found(collection))?;
            return Ok((owner, doc));
        }

        let mut matches = self
            .collections
            .values()
            .filter_map(|c| c.get(reference).map(|d| (c, d)));
        match (matches.next(), matches.next()) {
            (Some(found), None) => Ok(found),
            (None, _) => Err(Error::not_found("*", reference)),
            (Some(first), Some(second)) => {
                let mut collections = vec![first.0.name.clone(), second.0.name.clone()];
                collections.extend(matches.map(|(c, _)| c.name.clone()));
                Err(Error::Ambiguous {
                    name: reference.to_string(),
                    collections,
                })
            },
        }
    }

    /// Every model-invoked skill, by collection name then discovery order.
    pub fn skills(&self) -> impl Iterator<Item = (&Collection, &Document)> {
        self.collections.values().flat_map(|c| {
            c.documents
                .iter()
                .filter(|d| d.is_skill())
                .map(move |d| (c, d))
        })
    }
}
