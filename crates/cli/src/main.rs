use anyhow::{Context, Result};
use clap::{Arg, Command};

mod commands;

fn build_cli() -> Command {
    Command::new("shelfmark")
        .version("0.1.0")
        .about("Personal library catalog manager")
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("PATH")
                .help("Path to the database file")
                .default_value("shelfmark.db")
                .global(true),
        )
        .subcommand(Command::new("init").about("Initialize the database and create tables"))
        .subcommand(
            Command::new("resync")
                .about("Drop and recreate all tables, destroying every record")
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .help("Skip confirmation prompt")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("libraries").about("List all libraries"))
        .subcommand(
            Command::new("create-library")
                .about("Create a new library")
                .arg(Arg::new("name").required(true).value_name("NAME").help("Library name")),
        )
        .subcommand(
            Command::new("show")
                .about("Show a library's catalog")
                .arg(Arg::new("library").required(true).value_name("NAME").help("Library name")),
        )
        .subcommand(
            Command::new("import")
                .about("Import a catalog CSV into a library")
                .arg(Arg::new("file").required(true).value_name("FILE").help("Path to the CSV file"))
                .arg(
                    Arg::new("library")
                        .short('l')
                        .long("library")
                        .required(true)
                        .value_name("NAME")
                        .help("Target library name (created if missing)"),
                ),
        )
}

async fn ensure_database_ready(db_path: &str) -> Result<()> {
    use shelfmark_database::connection::{connect, DatabaseConfig};
    use shelfmark_database::run_migrations;

    let config = DatabaseConfig::new(db_path);
    let pool = connect(config).await.context("Failed to connect to database")?;
    run_migrations(&pool).await.context("Failed to apply database migrations")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = build_cli().get_matches();
    let db_path = matches
        .get_one::<String>("database")
        .map(|s| s.as_str())
        .unwrap_or("shelfmark.db");
    ensure_database_ready(db_path).await.context("Failed to initialize database")?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db_path);
            Ok(())
        }
        Some(("resync", sub_matches)) => commands::resync(db_path, sub_matches).await,
        Some(("libraries", _)) => commands::list_libraries(db_path).await,
        Some(("create-library", sub_matches)) => commands::create_library(db_path, sub_matches).await,
        Some(("show", sub_matches)) => commands::show_library(db_path, sub_matches).await,
        Some(("import", sub_matches)) => commands::import_csv(db_path, sub_matches).await,
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
