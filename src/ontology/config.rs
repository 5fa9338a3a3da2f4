/// Settings of an [`Ontology`](crate::Ontology)
///
/// # Examples
///
/// ```
/// use ontoenrich::ontology::OntologyConfig;
///
/// let config = OntologyConfig::new("GO")
///     .with_link_url("http://amigo.geneontology.org/amigo/term/%s")
///     .cull_obsolete(true);
///
/// assert_eq!(config.name(), "GO");
/// assert!(config.is_cull_obsolete());
/// assert!(!config.is_load_minimal());
/// assert_eq!(
///     config.url_for("GO:0008150").unwrap(),
///     "http://amigo.geneontology.org/amigo/term/GO:0008150"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OntologyConfig {
    name: String,
    link_url: Option<String>,
    cull_obsolete: bool,
    load_minimal: bool,
}

impl OntologyConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Sets the URL template for term links, `%s` is replaced by the term id
    #[must_use]
    pub fn with_link_url(mut self, template: &str) -> Self {
        self.link_url = Some(template.to_string());
        self
    }

    /// Skip obsolete terms when loading an OBO file
    #[must_use]
    pub fn cull_obsolete(mut self, cull: bool) -> Self {
        self.cull_obsolete = cull;
        self
    }

    /// Only load the structure of the ontology, without term definitions
    #[must_use]
    pub fn load_minimal(mut self, minimal: bool) -> Self {
        self.load_minimal = minimal;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn link_url(&self) -> Option<&str> {
        self.link_url.as_deref()
    }

    pub fn is_cull_obsolete(&self) -> bool {
        self.cull_obsolete
    }

    pub fn is_load_minimal(&self) -> bool {
        self.load_minimal
    }

    /// Returns the link for a term id, if a link template is configured
    pub fn url_for(&self, id: &str) -> Option<String> {
        self.link_url
            .as_ref()
            .map(|template| template.replace("%s", id))
    }
}
