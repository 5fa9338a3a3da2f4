/// Settings of an [`AnnotationSet`](crate::AnnotationSet)
///
/// # Examples
///
/// ```
/// use ontoenrich::annotations::AnnotationSetConfig;
///
/// let config = AnnotationSetConfig::new("MGI")
///     .with_link_url("http://www.informatics.jax.org/marker/%s");
///
/// assert_eq!(
///     config.url_for("MGI:87853").unwrap(),
///     "http://www.informatics.jax.org/marker/MGI:87853"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSetConfig {
    name: String,
    link_url: Option<String>,
}

impl AnnotationSetConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            link_url: None,
        }
    }

    /// Sets the URL template for object links, `%s` is replaced by the object id
    #[must_use]
    pub fn with_link_url(mut self, template: &str) -> Self {
        self.link_url = Some(template.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn link_url(&self) -> Option<&str> {
        self.link_url.as_deref()
    }

    /// Returns the link for an object id, if a link template is configured
    pub fn url_for(&self, id: &str) -> Option<String> {
        self.link_url
            .as_ref()
            .map(|template| template.replace("%s", id))
    }
}
