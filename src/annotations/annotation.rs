use crate::annotations::ObjectId;
use crate::ontology::TermId;
use crate::{EnrichError, EnrichResult, NEGATION_QUALIFIER};

/// Minimum number of columns of an annotation record
pub(crate) const MIN_COLUMNS: usize = 7;

/// A link between an annotated object (gene, protein, ...) and an ontology term
///
/// The fields follow the GAF 2.x columns. Optional columns are `None` if
/// they are missing or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    db: String,
    object_id: ObjectId,
    symbol: String,
    qualifier: String,
    term_id: TermId,
    reference: String,
    evidence_code: String,
    with_from: Option<String>,
    aspect: Option<String>,
    object_name: Option<String>,
    object_type: Option<String>,
    taxon: Option<String>,
}

fn optional(columns: &[&str], idx: usize) -> Option<String> {
    columns
        .get(idx)
        .map(|col| col.trim())
        .filter(|col| !col.is_empty())
        .map(str::to_string)
}

impl Annotation {
    /// Constructs an annotation with an empty qualifier
    ///
    /// The evidence code is stored in upper case.
    pub fn new(
        db: &str,
        object_id: &str,
        symbol: &str,
        term_id: &str,
        evidence_code: &str,
    ) -> Self {
        Self {
            db: db.to_string(),
            object_id: ObjectId::new(object_id),
            symbol: symbol.to_string(),
            qualifier: String::new(),
            term_id: TermId::new(term_id),
            reference: String::new(),
            evidence_code: evidence_code.to_uppercase(),
            with_from: None,
            aspect: None,
            object_name: None,
            object_type: None,
            taxon: None,
        }
    }

    /// Sets the qualifier, e.g. `NOT` or `contributes_to`
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: &str) -> Self {
        self.qualifier = qualifier.to_string();
        self
    }

    /// Parses the columns of a GAF record
    ///
    /// # Errors
    ///
    /// [`EnrichError::InvalidInput`] if there are less than 7 columns
    ///
    /// # Examples
    ///
    /// ```
    /// use ontoenrich::Annotation;
    ///
    /// let line = "MGI\tMGI:87853\tA\tNOT\tGO:0005515\tPMID:1\tipi\tUniProt:P1\tF";
    /// let columns: Vec<&str> = line.split('\t').collect();
    /// let annotation = Annotation::from_columns(&columns).unwrap();
    ///
    /// assert_eq!(annotation.symbol(), "A");
    /// assert_eq!(annotation.evidence_code(), "IPI");
    /// assert!(annotation.is_negated());
    /// assert_eq!(annotation.aspect(), Some("F"));
    /// assert_eq!(annotation.taxon(), None);
    /// ```
    pub fn from_columns(columns: &[&str]) -> EnrichResult<Self> {
        if columns.len() < MIN_COLUMNS {
            return Err(EnrichError::InvalidInput(format!(
                "annotation needs at least {MIN_COLUMNS} columns, found {}",
                columns.len()
            )));
        }
        Ok(Self {
            db: columns[0].trim().to_string(),
            object_id: ObjectId::new(columns[1].trim()),
            symbol: columns[2].trim().to_string(),
            qualifier: columns[3].trim().to_string(),
            term_id: TermId::new(columns[4].trim()),
            reference: columns[5].trim().to_string(),
            evidence_code: columns[6].trim().to_uppercase(),
            with_from: optional(columns, 7),
            aspect: optional(columns, 8),
            object_name: optional(columns, 9),
            object_type: optional(columns, 11),
            taxon: optional(columns, 12),
        })
    }

    pub fn db(&self) -> &str {
        &self.db
    }

    pub fn object_id(&self) -> &ObjectId {
        &self.object_id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn term_id(&self) -> &TermId {
        &self.term_id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The evidence code, always in upper case
    pub fn evidence_code(&self) -> &str {
        &self.evidence_code
    }

    pub fn with_from(&self) -> Option<&str> {
        self.with_from.as_deref()
    }

    pub fn aspect(&self) -> Option<&str> {
        self.aspect.as_deref()
    }

    pub fn object_name(&self) -> Option<&str> {
        self.object_name.as_deref()
    }

    pub fn object_type(&self) -> Option<&str> {
        self.object_type.as_deref()
    }

    pub fn taxon(&self) -> Option<&str> {
        self.taxon.as_deref()
    }

    /// Returns `true` if the qualifier negates the annotation
    ///
    /// A qualifier can hold several `|` separated values, the annotation
    /// is negated if any of them is `NOT`.
    pub fn is_negated(&self) -> bool {
        self.qualifier
            .split('|')
            .any(|token| token.trim() == NEGATION_QUALIFIER)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn too_few_columns() {
        let columns = vec!["DB", "ID", "SYM", "", "GO:1", "REF"];
        assert!(matches!(
            Annotation::from_columns(&columns),
            Err(EnrichError::InvalidInput(_))
        ));
    }

    #[test]
    fn full_record() {
        let line = "UniProtKB\tA0A024RBG1\tNUDT4B\tenables\tGO:0003723\tGO_REF:0000043\tIEA\tUniProtKB-KW:KW-0694\tF\tDiphosphoinositol polyphosphate phosphohydrolase NUDT4B\tNUDT4B\tprotein\ttaxon:9606\t20230306\tUniProt\t\t\n";
        let columns: Vec<&str> = line.split('\t').collect();
        let annotation = Annotation::from_columns(&columns).unwrap();
        assert_eq!(annotation.db(), "UniProtKB");
        assert_eq!(annotation.object_id().as_str(), "A0A024RBG1");
        assert_eq!(annotation.term_id().as_str(), "GO:0003723");
        assert_eq!(annotation.qualifier(), "enables");
        assert!(!annotation.is_negated());
        assert_eq!(annotation.object_type(), Some("protein"));
        assert_eq!(annotation.taxon(), Some("taxon:9606"));
    }

    #[test]
    fn negation_in_any_token() {
        let a =
            Annotation::new("DB", "1", "A", "GO:1", "iDa").with_qualifier("contributes_to|NOT");
        assert!(a.is_negated());
        assert_eq!(a.evidence_code(), "IDA");
        let b = Annotation::new("DB", "1", "A", "GO:1", "IDA").with_qualifier("NOTABLE");
        assert!(!b.is_negated());
    }
}
