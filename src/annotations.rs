//! Annotations link objects such as genes or proteins to ontology terms
//!
//! An [`AnnotationSet`] holds all [`Annotation`]s of one source (e.g. one
//! GAF file) and indexes them by term, by object id and by object symbol.
//! Every distinct annotated object is represented once as a [`DbObject`].
//!
//! The objects that are analysed together form a [`QuerySet`], usually
//! created from user supplied ids or symbols with [`AnnotationSet::query_set`].
use core::fmt::Debug;
use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

use indexmap::IndexMap;

use crate::ontology::TermId;
use crate::parser;
use crate::{next_generation, EnrichResult, DEFAULT_NUM_ANNOTATIONS};

mod annotation;
mod config;

pub use annotation::Annotation;
pub use config::AnnotationSetConfig;

shared_str_id!(
    /// Identifier of an annotated object, e.g. `MGI:87853`
    ObjectId
);

/// A distinct annotated object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbObject {
    db: String,
    id: ObjectId,
    symbol: String,
}

impl DbObject {
    fn from_annotation(annotation: &Annotation) -> Self {
        Self {
            db: annotation.db().to_string(),
            id: annotation.object_id().clone(),
            symbol: annotation.symbol().to_string(),
        }
    }

    pub fn db(&self) -> &str {
        &self.db
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

/// A named set of distinct objects that is tested for enrichment
///
/// # Examples
///
/// ```
/// use ontoenrich::{ObjectId, QuerySet};
///
/// let query = QuerySet::new("cluster 1", ["MGI:1", "MGI:2", "MGI:1"].map(ObjectId::from));
/// assert_eq!(query.len(), 2);
/// assert!(query.contains("MGI:2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySet {
    name: String,
    ids: HashSet<ObjectId>,
}

impl QuerySet {
    pub fn new<I: IntoIterator<Item = ObjectId>>(name: &str, ids: I) -> Self {
        Self {
            name: name.to_string(),
            ids: ids.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ids(&self) -> &HashSet<ObjectId> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}

/// All annotations of one source, indexed for lookup
///
/// The index is built while annotations are added. Every added annotation
/// gives the set a new [`AnnotationSet::generation`], so results that were
/// cached for an earlier state are never reused.
///
/// # Examples
///
/// ```
/// use ontoenrich::{Annotation, AnnotationSet};
///
/// let mut annotations = AnnotationSet::default();
/// annotations.push(Annotation::new("MGI", "MGI:1", "Pax6", "GO:0001654", "IMP"));
/// annotations.push(Annotation::new("MGI", "MGI:1", "Pax6", "GO:0007420", "IDA"));
/// annotations.push(Annotation::new("MGI", "MGI:2", "Sox2", "GO:0001654", "IEA"));
///
/// assert_eq!(annotations.len(), 3);
/// assert_eq!(annotations.annotations_for_term("GO:0001654").len(), 2);
///
/// let (ids, unresolved) = annotations.resolve(["Pax6", "MGI:2", "Shh"]);
/// assert_eq!(ids.len(), 2);
/// assert!(unresolved.contains("Shh"));
/// ```
pub struct AnnotationSet {
    config: AnnotationSetConfig,
    by_term: IndexMap<TermId, Vec<Annotation>>,
    objects: IndexMap<ObjectId, DbObject>,
    symbols: HashMap<String, ObjectId>,
    attributes: IndexMap<String, String>,
    comments: Vec<String>,
    len: usize,
    generation: u64,
}

impl Default for AnnotationSet {
    fn default() -> Self {
        Self::new(AnnotationSetConfig::default())
    }
}

impl Debug for AnnotationSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AnnotationSet {} with {} annotations of {} objects",
            self.config.name(),
            self.len,
            self.objects.len()
        )
    }
}

impl AnnotationSet {
    /// Constructs a new, empty annotation set
    pub fn new(config: AnnotationSetConfig) -> Self {
        Self {
            config,
            by_term: IndexMap::new(),
            objects: IndexMap::new(),
            symbols: HashMap::new(),
            attributes: IndexMap::new(),
            comments: Vec::new(),
            len: 0,
            generation: next_generation(),
        }
    }

    /// Loads all annotations of a GAF file
    ///
    /// # Errors
    ///
    /// - [`EnrichError::CannotOpenFile`](crate::EnrichError::CannotOpenFile) if the file cannot be read
    /// - [`EnrichError::InvalidInput`](crate::EnrichError::InvalidInput) if a record has less than 7 columns
    pub fn from_gaf<P: AsRef<Path>>(path: P, config: AnnotationSetConfig) -> EnrichResult<Self> {
        parser::gaf::load_file(path.as_ref(), config)
    }

    /// Loads all annotations from GAF formatted data
    ///
    /// # Errors
    ///
    /// Same as [`AnnotationSet::from_gaf`]
    pub fn from_gaf_reader<R: BufRead>(
        reader: R,
        config: AnnotationSetConfig,
    ) -> EnrichResult<Self> {
        parser::gaf::load(reader, config)
    }

    /// Adds an annotation and indexes its object
    ///
    /// The first annotation of an object defines its [`DbObject`].
    pub fn push(&mut self, annotation: Annotation) {
        let id = annotation.object_id();
        if !self.objects.contains_key(id) {
            let object = DbObject::from_annotation(&annotation);
            self.symbols
                .insert(object.symbol.clone(), object.id.clone());
            self.objects.insert(object.id.clone(), object);
        }
        self.by_term
            .entry(annotation.term_id().clone())
            .or_insert_with(|| Vec::with_capacity(DEFAULT_NUM_ANNOTATIONS))
            .push(annotation);
        self.len += 1;
        self.generation = next_generation();
    }

    pub fn config(&self) -> &AnnotationSetConfig {
        &self.config
    }

    /// Returns the number of annotations
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the set has no annotations
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A number that changes whenever an annotation is added
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Iterates all annotations, grouped by term
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.by_term.values().flatten()
    }

    /// Returns the direct annotations of a term
    pub fn annotations_for_term(&self, term: &str) -> &[Annotation] {
        self.by_term
            .get(term)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates the ids of all terms with at least one annotation
    pub fn annotated_terms(&self) -> impl Iterator<Item = &TermId> {
        self.by_term.keys()
    }

    pub fn object(&self, id: &str) -> Option<&DbObject> {
        self.objects.get(id)
    }

    /// Returns the id of the object with the given symbol
    pub fn object_by_symbol(&self, symbol: &str) -> Option<&ObjectId> {
        self.symbols.get(symbol)
    }

    /// Iterates all distinct objects in the order they were first annotated
    pub fn objects(&self) -> impl Iterator<Item = &DbObject> {
        self.objects.values()
    }

    /// The ids of all annotated objects
    pub fn object_ids(&self) -> HashSet<ObjectId> {
        self.objects.keys().cloned().collect()
    }

    /// Returns the [`DbObject`]s of the given ids, unknown ids are skipped
    pub fn db_objects<'a, I: IntoIterator<Item = &'a ObjectId>>(&self, ids: I) -> Vec<&DbObject> {
        ids.into_iter()
            .filter_map(|id| self.objects.get(id))
            .collect()
    }

    /// Turns labels, i.e. object ids or symbols, into distinct object ids
    ///
    /// Labels are first matched against ids, then against symbols.
    /// Returns the resolved ids and the labels that could not be resolved.
    pub fn resolve<I, S>(&self, labels: I) -> (HashSet<ObjectId>, HashSet<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids = HashSet::new();
        let mut not_found = HashSet::new();
        for label in labels {
            let label = label.as_ref();
            if let Some((id, _)) = self.objects.get_key_value(label) {
                ids.insert(id.clone());
            } else if let Some(id) = self.symbols.get(label) {
                ids.insert(id.clone());
            } else {
                not_found.insert(label.to_string());
            }
        }
        (ids, not_found)
    }

    /// Resolves the labels and returns them as a named [`QuerySet`]
    ///
    /// The labels that could not be resolved are returned as well.
    pub fn query_set<I, S>(&self, name: &str, labels: I) -> (QuerySet, HashSet<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (ids, not_found) = self.resolve(labels);
        (QuerySet::new(name, ids), not_found)
    }

    /// Returns the link to an object, as configured in [`AnnotationSetConfig::with_link_url`]
    pub fn object_url(&self, id: &str) -> Option<String> {
        self.config.url_for(id)
    }

    /// Header attributes, e.g. `gaf-version`
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    /// Free text comments of the source file
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn add_comment(&mut self, comment: &str) {
        self.comments.push(comment.to_string());
    }
}

impl<'a> IntoIterator for &'a AnnotationSet {
    type Item = &'a Annotation;
    type IntoIter = std::iter::Flatten<indexmap::map::Values<'a, TermId, Vec<Annotation>>>;
    fn into_iter(self) -> Self::IntoIter {
        self.by_term.values().flatten()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn annotations() -> AnnotationSet {
        let mut set = AnnotationSet::new(AnnotationSetConfig::new("test").with_link_url("u/%s"));
        set.push(Annotation::new("DB", "ID:1", "Abc", "T:1", "IDA"));
        set.push(Annotation::new("DB", "ID:1", "Renamed", "T:2", "IDA"));
        set.push(Annotation::new("DB", "ID:2", "Xyz", "T:2", "IEA"));
        set.push(Annotation::new("DB", "ID:3", "Def", "T:3", "ND").with_qualifier("NOT"));
        set
    }

    #[test]
    fn index_by_term() {
        let set = annotations();
        assert_eq!(set.len(), 4);
        assert_eq!(set.annotations_for_term("T:2").len(), 2);
        assert!(set.annotations_for_term("T:404").is_empty());
        assert_eq!(set.annotated_terms().count(), 3);
        assert_eq!(set.iter().count(), 4);
        assert_eq!((&set).into_iter().count(), 4);
    }

    #[test]
    fn first_annotation_defines_object() {
        let set = annotations();
        assert_eq!(set.objects().count(), 3);
        assert_eq!(set.object("ID:1").unwrap().symbol(), "Abc");
        assert!(set.object_by_symbol("Renamed").is_none());
        assert_eq!(set.object_by_symbol("Xyz").unwrap().as_str(), "ID:2");
    }

    #[test]
    fn resolve_ids_and_symbols() {
        let set = annotations();
        let (ids, not_found) = set.resolve(vec!["ID:1", "Abc", "Xyz", "nope", "nope"]);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("ID:1"));
        assert!(ids.contains("ID:2"));
        assert_eq!(not_found.len(), 1);
    }

    #[test]
    fn db_objects_skip_unknown() {
        let set = annotations();
        let ids = vec![ObjectId::new("ID:3"), ObjectId::new("ID:9")];
        let objects = set.db_objects(&ids);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].symbol(), "Def");
    }

    #[test]
    fn generation_changes_on_push() {
        let mut set = annotations();
        let before = set.generation();
        set.push(Annotation::new("DB", "ID:4", "New", "T:1", "IDA"));
        assert_ne!(before, set.generation());
    }

    #[test]
    fn empty_sets_have_distinct_generations() {
        let first = AnnotationSet::default();
        let second = AnnotationSet::default();
        assert_ne!(first.generation(), 0);
        assert_ne!(first.generation(), second.generation());
        assert!(first.is_empty());
    }

    #[test]
    fn attributes_and_comments() {
        let mut set = annotations();
        set.set_attribute("gaf-version", "2.2");
        set.add_comment("generated for tests");
        assert_eq!(set.attribute("gaf-version"), Some("2.2"));
        assert_eq!(set.comments().len(), 1);
        assert_eq!(set.object_url("ID:1").unwrap(), "u/ID:1");
    }
}
