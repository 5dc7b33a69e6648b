//! Menu-driven mode, entered when no subcommand is given.
//!
//! Loads the source once, then walks the user through the municipality,
//! commune, and leader selectors the same way the dashboard does: picking
//! a municipality rescopes the commune list.

use aprehensys_ai::InsightOptions;
use aprehensys_analytics_models::{FilterSelection, Selection};
use aprehensys_apprehension_models::Apprehension;
use aprehensys_source::source_def::SourceDefinition;
use dialoguer::{Confirm, Input, Select};

enum Action {
    Summary,
    Insights,
    Sources,
    Serve,
}

impl Action {
    const ALL: &[Self] = &[Self::Summary, Self::Insights, Self::Sources, Self::Serve];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Summary => "Show summary",
            Self::Insights => "Generate AI insights",
            Self::Sources => "Show source definition",
            Self::Serve => "Start API server",
        }
    }
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if a prompt fails, the source cannot be loaded, or
/// the selected operation fails.
pub async fn run(definition: SourceDefinition) -> Result<(), Box<dyn std::error::Error>> {
    println!("Aprehensys");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Summary => {
            let records = load(definition).await?;
            let selection = prompt_selection(&records)?;
            crate::print_summary(&records, &selection, false)?;
        }
        Action::Insights => {
            let records = load(definition).await?;
            let selection = prompt_selection(&records)?;
            crate::print_insights(&records, &selection, &InsightOptions::default()).await?;
        }
        Action::Sources => print!("{}", toml::to_string_pretty(&definition)?),
        Action::Serve => {
            let definition = ensure_url(definition)?;
            if Confirm::new()
                .with_prompt("Start server?")
                .default(true)
                .interact()?
            {
                crate::serve(definition).await?;
            } else {
                println!("Cancelled.");
            }
        }
    }

    Ok(())
}

async fn load(definition: SourceDefinition) -> Result<Vec<Apprehension>, Box<dyn std::error::Error>> {
    let definition = ensure_url(definition)?;
    crate::load_records(&definition).await
}

/// Prompts for a URL if the definition does not have one yet.
fn ensure_url(definition: SourceDefinition) -> Result<SourceDefinition, Box<dyn std::error::Error>> {
    if definition.require_url().is_ok() {
        return Ok(definition);
    }

    let url: String = Input::new()
        .with_prompt("CSV export URL")
        .interact_text()?;
    Ok(definition.with_url_override(Some(url)))
}

fn prompt_selection(records: &[Apprehension]) -> Result<FilterSelection, Box<dyn std::error::Error>> {
    let mut selection = FilterSelection::default();

    let options = aprehensys_analytics::filter_options(records, &selection);
    selection.select_municipality(pick("Municipality", &options.municipalities)?);

    if !selection.municipality.is_all() {
        let options = aprehensys_analytics::filter_options(records, &selection);
        selection.select_commune(pick("Commune", &options.communes)?);
    }

    let options = aprehensys_analytics::filter_options(records, &selection);
    selection.select_leader(pick("Operation leader", &options.leaders)?);

    Ok(selection)
}

fn pick(prompt: &str, values: &[String]) -> Result<Selection, Box<dyn std::error::Error>> {
    let idx = Select::new()
        .with_prompt(prompt)
        .items(values)
        .default(0)
        .max_length(20)
        .interact()?;
    Ok(Selection::from_param(values.get(idx).map(String::as_str)))
}
