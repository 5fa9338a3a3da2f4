use std::io::BufRead;
use std::path::Path;

use tracing::{debug, trace};

use crate::annotations::{Annotation, AnnotationSet, AnnotationSetConfig};
use crate::parser::{line_error, open};
use crate::EnrichResult;

/// A single line of a GAF file
#[derive(Debug, PartialEq)]
enum Line<'a> {
    /// `! free text`
    Comment(&'a str),
    /// `!name: value`
    Attribute(&'a str, &'a str),
    /// blank lines and header lines without content
    Empty,
    Record(Annotation),
}

fn parse_line(line: &str) -> EnrichResult<Line<'_>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(comment) = line.strip_prefix("! ") {
        return Ok(Line::Comment(comment));
    }
    if let Some(header) = line.strip_prefix('!') {
        return Ok(match header.split_once(':') {
            Some((name, value)) => Line::Attribute(name.trim(), value.trim()),
            None => Line::Empty,
        });
    }
    if line.trim().is_empty() {
        return Ok(Line::Empty);
    }
    let columns: Vec<&str> = line.split('\t').collect();
    Ok(Line::Record(Annotation::from_columns(&columns)?))
}

/// Reads all annotations from GAF formatted data
pub(crate) fn load<R: BufRead>(
    reader: R,
    config: AnnotationSetConfig,
) -> EnrichResult<AnnotationSet> {
    let mut annotations = AnnotationSet::new(config);
    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|_| line_error("GAF", number))?;
        match parse_line(&line)? {
            Line::Comment(comment) => annotations.add_comment(comment),
            Line::Attribute(name, value) => annotations.set_attribute(name, value),
            Line::Empty => trace!("Ignoring line {}", number + 1),
            Line::Record(annotation) => annotations.push(annotation),
        }
    }
    debug!(
        "Loaded {} annotations of {} objects",
        annotations.len(),
        annotations.objects().count()
    );
    Ok(annotations)
}

/// Reads all annotations of a GAF file
pub(crate) fn load_file(path: &Path, config: AnnotationSetConfig) -> EnrichResult<AnnotationSet> {
    load(open(path)?, config)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::EnrichError;

    #[test]
    fn comment_lines() {
        assert_eq!(parse_line("! hello world").unwrap(), Line::Comment("hello world"));
    }

    #[test]
    fn attribute_lines() {
        assert_eq!(
            parse_line("!gaf-version: 2.2\n").unwrap(),
            Line::Attribute("gaf-version", "2.2")
        );
        assert_eq!(
            parse_line("!Submission Date: 10/16/2009").unwrap(),
            Line::Attribute("Submission Date", "10/16/2009")
        );
        assert_eq!(parse_line("!").unwrap(), Line::Empty);
        assert_eq!(parse_line("").unwrap(), Line::Empty);
    }

    #[test]
    fn record_lines() {
        let line = "MGI\tMGI:1\tPax6\t\tGO:1\tREF\tida\r\n";
        let Line::Record(annotation) = parse_line(line).unwrap() else {
            panic!("expected a record");
        };
        assert_eq!(annotation.symbol(), "Pax6");
        assert_eq!(annotation.evidence_code(), "IDA");
    }

    #[test]
    fn short_records_fail() {
        assert!(matches!(
            parse_line("MGI\tMGI:1\tPax6"),
            Err(EnrichError::InvalidInput(_))
        ));
    }

    #[test]
    fn load_from_reader() {
        let data = "!gaf-version: 2.2\n\
            ! a comment\n\
            \n\
            DB\t1\tA\t\tT:1\tR\tIDA\n\
            DB\t2\tB\tNOT\tT:1\tR\tIMP\n";
        let set = load(data.as_bytes(), AnnotationSetConfig::new("t")).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.attribute("gaf-version"), Some("2.2"));
        assert_eq!(set.comments(), &["a comment".to_string()]);
        assert!(set.annotations_for_term("T:1")[1].is_negated());
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            load_file(Path::new("does/not/exist.gaf"), AnnotationSetConfig::default()),
            Err(EnrichError::CannotOpenFile(_))
        ));
    }
}
