use std::process;

use ontoenrich::annotations::AnnotationSetConfig;
use ontoenrich::ontology::OntologyConfig;
use ontoenrich::{AnalysisMode, AnnotationSet, EnrichmentAnalyzer, Ontology, QuerySet};

/// Parses query sets of the form `name=ID1,ID2,Symbol3`
fn query_sets(annotations: &AnnotationSet, args: &[String]) -> Vec<QuerySet> {
    args.iter()
        .enumerate()
        .map(|(idx, arg)| {
            let (name, labels) = arg
                .split_once('=')
                .map_or((format!("set {}", idx + 1), arg.as_str()), |(name, labels)| {
                    (name.to_string(), labels)
                });
            let (query, unresolved) = annotations.query_set(&name, labels.split(','));
            for label in unresolved {
                println!("{name}: {label} is not annotated");
            }
            query
        })
        .collect()
}

fn main() {
    simple_logger::init_with_env().unwrap();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        println!("Show enriched ontology terms of one or more query sets\n\n");
        println!("Usage\nenrichment <OBO FILE> <GAF FILE> <MODE> <QUERY SET>...");
        println!("\nenrichment go.obo mgi.gaf enrichment Pax6,Sox2,Shh");
        println!("\nenrichment go.obo mgi.gaf dep eye=Pax6,Sox2 limb=Shh,Fgf8\n");
        process::exit(1)
    }

    let ontology = Ontology::from_obo(&args[1], OntologyConfig::new("ontology"))
        .expect("the ontology must be readable");
    let annotations = AnnotationSet::from_gaf(&args[2], AnnotationSetConfig::new("annotations"))
        .expect("the annotations must be readable");
    let mode: AnalysisMode = args[3].parse().expect("invalid analysis mode");
    let query_sets = query_sets(&annotations, &args[4..]);

    let mut analyzer = EnrichmentAnalyzer::new();
    let analysis = analyzer
        .analyze(&query_sets, None, &ontology, &annotations, &["IEA"], mode)
        .expect("every namespace must have a root");

    for (namespace, results) in analysis.iter() {
        println!("\n### {namespace} ###");
        println!("term\tname\tquery set\tk\tn\tK\tN\tp\tq\tgenes");
        for result in results.iter().take(20) {
            let genes: Vec<&str> = result.objects().iter().map(|o| o.symbol()).collect();
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:e}\t{}\t{}",
                result.term(),
                result.term_name(),
                result.query_set(),
                result.count(),
                result.query_size(),
                result.term_size(),
                result.universe_size(),
                result.pvalue(),
                result
                    .qvalue()
                    .map_or_else(|| "-".to_string(), |q| format!("{q:e}")),
                genes.join(",")
            );
        }
    }
}
