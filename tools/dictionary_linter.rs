/// Dictionary Linter — checks a word dictionary (and optionally a template)
/// before a real run.
///
/// Usage: dictionary_linter <dictionary> [--template <path>]

use clap::Parser;
use madlib::core::dictionary::Dictionary;
use madlib::core::lint::{lint_dictionary, lint_template};
use madlib::schema::category::Category;
use std::path::PathBuf;
use std::process;

#[derive(Debug, Parser)]
#[command(name = "dictionary_linter")]
#[command(about = "Validate a madlib dictionary and the placeholders of a template")]
struct Args {
    /// Dictionary to check (.json or .ron)
    dictionary: PathBuf,

    /// Template whose placeholders should be checked against the dictionary
    #[arg(long)]
    template: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .init();

    let dictionary = match Dictionary::load(&args.dictionary) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    println!("Loaded {} words", dictionary.len());
    for category in Category::ALL {
        let count = dictionary.pool(category).map_or(0, |pool| pool.len());
        println!("  {:<10} {}", category.name(), count);
    }

    let mut report = lint_dictionary(&dictionary);

    if let Some(ref path) = args.template {
        let template = std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("ERROR: Failed to read template '{}': {}", path.display(), e);
            process::exit(1);
        });
        let template_report = lint_template(&dictionary, &template);
        report.errors.extend(template_report.errors);
        report.warnings.extend(template_report.warnings);
    }

    println!("\n=== Dictionary Lint Report ===\n");

    if report.is_clean() {
        println!("All checks passed!");
    }

    for warning in &report.warnings {
        println!("WARNING: {}", warning);
    }

    for error in &report.errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );

    if report.errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}
