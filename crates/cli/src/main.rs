use anyhow::Context;
use clap::{Parser, Subcommand};
use phr_core::{
    CoreConfig, DeleteOutcome, DetailController, DetailForm, DetailView, EntityType,
    ListController, Navigation, PhrError, QuickAddController, RecordId, RecordStore, RestStore,
    SingletonController, StoreConfig,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "phr")]
#[command(about = "Personal health record CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List entity types and their fields
    Entities,
    /// List the records of an entity, grouped as the app shows them
    List {
        /// Entity name, e.g. medications or family-history
        entity: String,
    },
    /// Add a record from a name alone
    QuickAdd {
        entity: String,
        /// Name of the new record
        name: String,
    },
    /// Show one record
    Show {
        entity: String,
        id: String,
        /// Include "Show more" fields
        #[arg(long)]
        all: bool,
        /// Print the stored row as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a record from field=value pairs
    Add {
        entity: String,
        /// Field assignments, e.g. name=Aspirin dosage=75mg
        values: Vec<String>,
    },
    /// Edit a record with field=value pairs
    Edit {
        entity: String,
        id: String,
        values: Vec<String>,
    },
    /// Delete a record
    Delete {
        entity: String,
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show a singleton entity's section summaries
    Singleton {
        /// social-history or personal-information
        entity: String,
    },
    /// Edit one section of a singleton entity
    Section {
        entity: String,
        /// Section key, e.g. smoking
        section: String,
        values: Vec<String>,
        /// Child row as `field=value` pairs joined by `;`. Repeat once per row; any rows given
        /// replace the stored ones
        #[arg(long = "row", value_name = "FIELD=VALUE;...")]
        rows: Vec<String>,
    },
}

/// Split a `field=value` argument. The value may be empty or contain further `=` signs.
fn parse_assignment(raw: &str) -> anyhow::Result<(String, String)> {
    let (field, value) = raw
        .split_once('=')
        .with_context(|| format!("expected field=value, got {raw}"))?;
    let field = field.trim();
    if field.is_empty() {
        anyhow::bail!("missing field name in {raw}");
    }
    Ok((field.to_owned(), value.to_owned()))
}

/// Split a `--row` argument into its `field=value` pairs. Empty segments are ignored.
fn parse_row(raw: &str) -> anyhow::Result<Vec<(String, String)>> {
    raw.split(';')
        .filter(|part| !part.trim().is_empty())
        .map(parse_assignment)
        .collect()
}

fn parse_entity(raw: &str) -> anyhow::Result<EntityType> {
    Ok(raw.parse::<EntityType>()?)
}

fn apply<S: RecordStore + ?Sized>(
    form: &mut DetailForm<S>,
    values: &[String],
) -> anyhow::Result<()> {
    for raw in values {
        let (field, value) = parse_assignment(raw)?;
        form.set(&field, value)?;
    }
    Ok(())
}

fn apply_rows<S: RecordStore + ?Sized>(
    form: &mut DetailForm<S>,
    rows: &[String],
) -> anyhow::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    form.clear_child_rows()?;
    for raw in rows {
        let index = form.add_child_row()?;
        for (field, value) in parse_row(raw)? {
            form.set_child(index, &field, value)?;
        }
    }
    Ok(())
}

/// Submit a form and print field errors the way the app shows them under each input.
async fn submit<S: RecordStore + ?Sized>(form: &mut DetailForm<S>) -> anyhow::Result<()> {
    match form.submit().await {
        Ok(navigation) => {
            print_navigation(&navigation);
            Ok(())
        }
        Err(PhrError::Validation(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("  {field}: {message}");
            }
            anyhow::bail!("form has missing required fields")
        }
        Err(e) => Err(e.into()),
    }
}

fn print_navigation(navigation: &Navigation) {
    match navigation {
        Navigation::List { entity } => println!("Saved. Back to {}.", entity.schema().title),
        Navigation::Detail { entity, id } => println!("Saved {} {id}.", entity.singular()),
        Navigation::Singleton { entity } => println!("Saved. Back to {}.", entity.schema().title),
    }
}

fn print_view(view: &DetailView) {
    let marker = if view.incomplete() { " (Incomplete)" } else { "" };
    println!("{}{marker}  [{}]", view.title(), view.id());
    for row in view.rows() {
        println!("  {}: {}", row.label, row.value);
    }
}

fn confirm_on_stdin(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("phr_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'phr --help' for commands");
        return Ok(());
    };

    if let Commands::Entities = command {
        for entity in EntityType::ALL {
            let schema = entity.schema();
            let kind = if entity.is_singleton() {
                "singleton"
            } else if entity.is_child() {
                "child"
            } else {
                "list"
            };
            println!("{} ({kind}): {}", entity.collection(), schema.title);
            for spec in schema.fields {
                let required = if spec.required { " *" } else { "" };
                println!("    {} [{}]{required}", spec.name, spec.kind.name());
            }
        }
        return Ok(());
    }

    let store_cfg = StoreConfig::from_env_values(
        std::env::var("PHR_STORE_URL").ok(),
        std::env::var("PHR_PUBLISHABLE_KEY").ok(),
        std::env::var("PHR_REQUEST_TIMEOUT_SECS").ok(),
    )?;
    let cfg = Arc::new(CoreConfig::new(store_cfg.request_timeout())?);
    let store: Arc<dyn RecordStore> = Arc::new(RestStore::new(&store_cfg)?);
    tracing::debug!(
        store = %store_cfg.base_url(),
        timeout_secs = cfg.request_timeout().as_secs(),
        "resolved store"
    );

    match command {
        Commands::Entities => {}
        Commands::List { entity } => {
            let entity = parse_entity(&entity)?;
            let snapshot = ListController::new(store, cfg).load(entity).await?;
            if snapshot.is_empty() {
                println!("No {} found.", entity.plural());
            }
            for bucket in snapshot.buckets() {
                if bucket.cards.is_empty() {
                    continue;
                }
                println!("{}", bucket.label);
                for card in bucket.cards {
                    let dot = if card.incomplete { "*" } else { " " };
                    match card.subtitle {
                        Some(subtitle) => {
                            println!(" {dot} {}  {subtitle}  [{}]", card.title, card.id)
                        }
                        None => println!(" {dot} {}  [{}]", card.title, card.id),
                    }
                }
            }
        }
        Commands::QuickAdd { entity, name } => {
            let entity = parse_entity(&entity)?;
            let mut snapshot = ListController::new(store.clone(), cfg.clone())
                .load(entity)
                .await?;
            let mut input = name;
            match QuickAddController::new(store, cfg)
                .submit(&mut snapshot, &mut input)
                .await?
            {
                Some(record) => println!("Added {} {}", entity.singular(), record.id),
                None => println!("Nothing to add."),
            }
        }
        Commands::Show {
            entity,
            id,
            all,
            json,
        } => {
            let entity = parse_entity(&entity)?;
            let mut view = DetailController::new(store, cfg)
                .load(entity, &RecordId::new(id))
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(view.record())?);
            } else {
                if all {
                    view.toggle_show_more();
                }
                print_view(&view);
            }
        }
        Commands::Add { entity, values } => {
            let entity = parse_entity(&entity)?;
            let mut form = DetailForm::add(store, cfg, entity)?;
            apply(&mut form, &values)?;
            submit(&mut form).await?;
        }
        Commands::Edit { entity, id, values } => {
            let entity = parse_entity(&entity)?;
            let mut form = DetailForm::edit(store, cfg, entity, RecordId::new(id)).await?;
            apply(&mut form, &values)?;
            submit(&mut form).await?;
        }
        Commands::Delete { entity, id, yes } => {
            let entity = parse_entity(&entity)?;
            let controller = DetailController::new(store, cfg);
            let view = controller.load(entity, &RecordId::new(id)).await?;
            let outcome = controller
                .delete(&view, |prompt| yes || confirm_on_stdin(prompt))
                .await?;
            match outcome {
                DeleteOutcome::Deleted(navigation) => {
                    tracing::debug!(collection = entity.collection(), id = %view.id(), "deleted");
                    print_navigation(&navigation);
                }
                DeleteOutcome::Cancelled => {
                    tracing::debug!(
                        collection = entity.collection(),
                        id = %view.id(),
                        "delete cancelled"
                    );
                    println!("Cancelled.");
                }
            }
        }
        Commands::Singleton { entity } => {
            let entity = parse_entity(&entity)?;
            let (record, summaries) = SingletonController::new(store, cfg)
                .summaries(entity)
                .await?;
            println!("{}  [{}]", entity.schema().title, record.id);
            for summary in summaries {
                println!("  {}:", summary.title);
                for line in summary.text.lines() {
                    println!("    {line}");
                }
            }
        }
        Commands::Section {
            entity,
            section,
            values,
            rows,
        } => {
            let entity = parse_entity(&entity)?;
            let record = SingletonController::new(store.clone(), cfg.clone())
                .load(entity)
                .await?;
            let mut form =
                DetailForm::edit_section(store, cfg, entity, record.id, &section).await?;
            apply(&mut form, &values)?;
            apply_rows(&mut form, &rows)?;
            submit(&mut form).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("name=Aspirin").unwrap(),
            ("name".to_owned(), "Aspirin".to_owned())
        );
        assert_eq!(
            parse_assignment("details=a=b").unwrap(),
            ("details".to_owned(), "a=b".to_owned())
        );
        assert_eq!(
            parse_assignment("dosage=").unwrap(),
            ("dosage".to_owned(), String::new())
        );
    }

    #[test]
    fn test_parse_assignment_rejects_malformed() {
        assert!(parse_assignment("Aspirin").is_err());
        assert!(parse_assignment("=value").is_err());
    }

    #[test]
    fn test_cli_parses_delete_flags() {
        let cli = Cli::try_parse_from(["phr", "delete", "surgeries", "42", "--yes"]).unwrap();
        match cli.command {
            Some(Commands::Delete { entity, id, yes }) => {
                assert_eq!(entity, "surgeries");
                assert_eq!(id, "42");
                assert!(yes);
            }
            _ => panic!("expected delete command"),
        }
    }

    #[test]
    fn test_parse_row_splits_pairs() {
        assert_eq!(
            parse_row("drug_type=other;custom_drug_name=Kratom; frequency=Weekly;").unwrap(),
            vec![
                ("drug_type".to_owned(), "other".to_owned()),
                ("custom_drug_name".to_owned(), "Kratom".to_owned()),
                ("frequency".to_owned(), "Weekly".to_owned()),
            ]
        );
        assert!(parse_row("drug_type").is_err());
    }

    #[test]
    fn test_cli_parses_section_rows() {
        let cli = Cli::try_parse_from([
            "phr",
            "section",
            "social-history",
            "drugs",
            "uses_recreational_drugs=yes",
            "--row",
            "drug_type=cannabis;frequency=Weekly",
            "--row",
            "drug_type=cocaine;frequency=Daily or almost daily",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Section { values, rows, .. }) => {
                assert_eq!(values, vec!["uses_recreational_drugs=yes"]);
                assert_eq!(rows.len(), 2);
            }
            _ => panic!("expected section command"),
        }
    }

    #[test]
    fn test_parse_entity_accepts_hyphens() {
        assert_eq!(
            parse_entity("family-history").unwrap(),
            EntityType::FamilyHistory
        );
        assert!(parse_entity("vitals").is_err());
    }
}
