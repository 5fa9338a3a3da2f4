use std::process;

use ontoenrich::dag::RedundantEdgeFinder;
use ontoenrich::ontology::OntologyConfig;
use ontoenrich::Ontology;

fn term_name<'a>(ontology: &'a Ontology, id: &str) -> &'a str {
    ontology.term(id).map_or("", |term| term.name())
}

/// Prints every edge of an ontology that is implied by a longer path
fn main() {
    simple_logger::init_with_env().unwrap();

    let Some(path) = std::env::args().nth(1) else {
        println!("Show redundant edges of an ontology\n\n");
        println!("Usage\nredundant_edges <OBO FILE>");
        process::exit(1)
    };

    let ontology = Ontology::from_obo(&path, OntologyConfig::new("ontology").load_minimal(true))
        .expect("the ontology must be readable");

    let redundant = RedundantEdgeFinder::find(ontology.dag());
    for (parent, child, relation) in &redundant {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            child,
            term_name(&ontology, child.as_str()),
            relation,
            parent,
            term_name(&ontology, parent.as_str())
        );
    }
    println!(
        "\nRedundant edges: {} of {}",
        redundant.len(),
        ontology.dag().edges().count()
    );
}
