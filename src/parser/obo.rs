use std::io::BufRead;
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::ontology::{Ontology, OntologyConfig, Relation};
use crate::parser::{line_error, open};
use crate::{EnrichError, EnrichResult};

/// Namespace of terms without `namespace` tag, if the header has no `default-namespace`
const FALLBACK_NAMESPACE: &str = "ontology";

#[derive(Debug, Clone, PartialEq, Eq)]
enum StanzaKind {
    Header,
    Term,
    Other(String),
}

/// The tag-value pairs of one block of an OBO file
///
/// Repeated tags, such as `is_a`, keep all values in file order.
#[derive(Debug)]
struct Stanza {
    kind: StanzaKind,
    tags: Vec<(String, String)>,
}

impl Stanza {
    fn new(kind: StanzaKind) -> Self {
        Self {
            kind,
            tags: Vec::new(),
        }
    }

    fn first(&self, tag: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, value)| value.as_str())
    }

    fn all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |(t, _)| t == tag)
            .map(|(_, value)| value.as_str())
    }
}

/// Splits a line into tag and value
///
/// Returns `None` for comments and lines without a tag
fn parse_tag(line: &str) -> Option<(&str, &str)> {
    if line.starts_with('!') {
        return None;
    }
    line.split_once(':')
        .map(|(tag, value)| (tag.trim(), value.trim()))
}

/// Splits a reference of the form `GO:0008150 ! biological_process`
///
/// The trailing comment is optional
fn split_comment(value: &str) -> (&str, &str) {
    match value.split_once('!') {
        Some((id, name)) => (id.trim(), name.trim()),
        None => (value.trim(), ""),
    }
}

/// Returns the quoted text of a definition such as `"Text." [GOC:go_curators]`
///
/// Escaped characters are unescaped. Values without quotes are returned as is.
fn quoted_text(value: &str) -> String {
    let Some(rest) = value.strip_prefix('"') else {
        return value.to_string();
    };
    let mut text = String::with_capacity(rest.len());
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    text.push(escaped);
                }
            }
            '"' => break,
            c => text.push(c),
        }
    }
    text
}

/// Streams an OBO file stanza by stanza into an [`Ontology`]
struct OboLoader {
    ontology: Ontology,
    default_namespace: String,
    stanza: Option<Stanza>,
    count: usize,
}

impl OboLoader {
    fn new(config: OntologyConfig) -> Self {
        let default_namespace = if config.name().is_empty() {
            FALLBACK_NAMESPACE.to_string()
        } else {
            config.name().to_string()
        };
        Self {
            ontology: Ontology::new(config),
            default_namespace,
            stanza: None,
            count: 0,
        }
    }

    fn line(&mut self, line: &str) -> EnrichResult<()> {
        let line = line.trim();
        if line.is_empty() {
            // the header ends with the first stanza, not with a blank line
            if self.in_header() {
                return Ok(());
            }
            return self.finish_stanza();
        }
        if let Some(kind) = line.strip_prefix('[') {
            self.finish_stanza()?;
            let kind = kind.split(']').next().unwrap_or_default();
            self.stanza = Some(Stanza::new(match kind {
                "Term" => StanzaKind::Term,
                other => StanzaKind::Other(other.to_string()),
            }));
            return Ok(());
        }
        match parse_tag(line) {
            Some((tag, value)) => {
                let kind = if self.count == 0 {
                    StanzaKind::Header
                } else {
                    StanzaKind::Other(String::new())
                };
                self.stanza
                    .get_or_insert_with(|| Stanza::new(kind))
                    .tags
                    .push((tag.to_string(), value.to_string()));
            }
            None => trace!("Ignoring line {}", line),
        }
        Ok(())
    }

    fn in_header(&self) -> bool {
        self.stanza
            .as_ref()
            .is_some_and(|stanza| stanza.kind == StanzaKind::Header)
    }

    fn finish_stanza(&mut self) -> EnrichResult<()> {
        let Some(stanza) = self.stanza.take() else {
            return Ok(());
        };
        self.count += 1;
        match stanza.kind {
            StanzaKind::Header => self.header(&stanza),
            StanzaKind::Term => self.term(&stanza)?,
            StanzaKind::Other(ref kind) => trace!("Ignoring [{}] stanza", kind),
        }
        Ok(())
    }

    fn header(&mut self, stanza: &Stanza) {
        for (tag, value) in &stanza.tags {
            self.ontology.header_mut().set(tag, value);
        }
        if let Some(namespace) = stanza.first("default-namespace") {
            self.default_namespace = namespace.to_string();
        }
    }

    fn term(&mut self, stanza: &Stanza) -> EnrichResult<()> {
        let obsolete = stanza.first("is_obsolete") == Some("true");
        let id = stanza
            .first("id")
            .ok_or_else(|| EnrichError::InvalidInput("term stanza without id".to_string()))?;
        if obsolete && self.ontology.config().is_cull_obsolete() {
            trace!("Skipping obsolete term {}", id);
            return Ok(());
        }
        let name = stanza.first("name").unwrap_or_default();
        let namespace = stanza
            .first("namespace")
            .unwrap_or(self.default_namespace.as_str());

        let ontology = &mut self.ontology;
        ontology.add_term(id, name);
        ontology.set_name(id, name)?;
        ontology.set_obsolete(id, obsolete)?;
        ontology.set_namespace(id, namespace)?;

        for value in stanza.all("is_a") {
            let (parent, parent_name) = split_comment(value);
            ontology.add_term(parent, parent_name);
            ontology.add_relationship(id, Relation::IsA, parent)?;
        }

        for value in stanza.all("relationship") {
            let (target, parent_name) = split_comment(value);
            let mut tokens = target.split_whitespace();
            let (Some(relation), Some(parent), None) =
                (tokens.next(), tokens.next(), tokens.next())
            else {
                warn!("Unable to parse relationship of {}: {}", id, value);
                continue;
            };
            let relation = Relation::from(relation);
            if relation == Relation::PartOf || relation.is_regulatory() {
                ontology.add_term(parent, parent_name);
                ontology.add_relationship(id, relation, parent)?;
            } else {
                trace!("Ignoring {} relationship of {}", relation, id);
            }
        }

        if !ontology.config().is_load_minimal() {
            if let Some(definition) = stanza.first("def") {
                ontology.set_definition(id, quoted_text(definition))?;
            }
        }
        Ok(())
    }

    fn finish(mut self) -> EnrichResult<Ontology> {
        self.finish_stanza()?;
        self.ontology.finalize()?;
        debug!(
            "Loaded {} terms in {} namespaces",
            self.ontology.len(),
            self.ontology.namespaces().count()
        );
        Ok(self.ontology)
    }
}

/// Reads an ontology from OBO formatted data
pub(crate) fn load<R: BufRead>(reader: R, config: OntologyConfig) -> EnrichResult<Ontology> {
    let mut loader = OboLoader::new(config);
    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|_| line_error("OBO", number))?;
        loader.line(&line)?;
    }
    loader.finish()
}

/// Reads an ontology from an OBO file
pub(crate) fn load_file(path: &Path, config: OntologyConfig) -> EnrichResult<Ontology> {
    load(open(path)?, config)
}
