use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use shelfmark_catalog::{
    AuthorService, ImportRow, Importer, LibraryService, QueryOptions, SeriesService, StoryService,
    VolumeService,
};
use shelfmark_core::{AppError, Library};
use shelfmark_database::connection::{connect, DatabaseConfig};
use shelfmark_database::{resync as resync_schema, DbPool};
use std::io::Write;
use std::path::Path;

async fn connect_db(db_path: &str) -> Result<DbPool> {
    let config = DatabaseConfig::new(db_path);
    connect(config).await.context("Failed to connect to database")
}

/// Drop and recreate the whole schema
pub async fn resync(db_path: &str, matches: &ArgMatches) -> Result<()> {
    if !matches.get_flag("force") {
        print!(
            "This will destroy every record in {}. Type 'yes' to continue: ",
            db_path
        );
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if answer.trim() != "yes" {
            println!("Aborted.");
            return Ok(());
        }
    }

    let pool = connect_db(db_path).await?;
    resync_schema(&pool).await.context("Failed to resync schema")?;
    println!("{} schema recreated, all records removed", style("Done:").bold().green());
    Ok(())
}

/// List all libraries with their names
pub async fn list_libraries(db_path: &str) -> Result<()> {
    let pool = connect_db(db_path).await?;
    let libraries = LibraryService::new(pool)
        .all(&QueryOptions::default())
        .await
        .context("Failed to list libraries")?;

    if libraries.is_empty() {
        println!("No libraries. Use 'create-library' to add one.");
        return Ok(());
    }

    println!("\n{} Libraries", style(libraries.len()).bold().cyan());
    println!("{}", "=".repeat(60));
    for library in libraries {
        println!("  {}  {}", style(library.id).dim(), style(library.name).bold());
    }
    Ok(())
}

/// Create a new library
pub async fn create_library(db_path: &str, matches: &ArgMatches) -> Result<()> {
    let name = matches
        .get_one::<String>("name")
        .ok_or_else(|| anyhow::anyhow!("Library name is required"))?;

    let pool = connect_db(db_path).await?;
    let library = LibraryService::new(pool)
        .insert(Library::new(name))
        .await
        .context("Failed to create library")?;

    println!(
        "Created library {} ({})",
        style(&library.name).bold(),
        library.id
    );
    Ok(())
}

/// Show entity counts for one library
pub async fn show_library(db_path: &str, matches: &ArgMatches) -> Result<()> {
    let name = matches
        .get_one::<String>("library")
        .ok_or_else(|| anyhow::anyhow!("Library name is required"))?;

    let pool = connect_db(db_path).await?;
    let library = LibraryService::new(pool.clone())
        .exact(name, &QueryOptions::default())
        .await
        .with_context(|| format!("No library named '{}'", name))?;

    let options = QueryOptions::default();
    let authors = AuthorService::new(pool.clone())
        .name(library.id, "", &options)
        .await?;
    let series = SeriesService::new(pool.clone())
        .name(library.id, "", &options)
        .await?;
    let stories = StoryService::new(pool.clone())
        .name(library.id, "", &options)
        .await?;
    let volumes = VolumeService::new(pool)
        .name(library.id, "", &options)
        .await?;

    println!("\n{}", style(&library.name).bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  Authors: {}", authors.len());
    println!("  Series:  {}", series.len());
    println!("  Stories: {}", stories.len());
    println!("  Volumes: {}", volumes.len());
    Ok(())
}

/// Import a catalog CSV into a library, creating it if needed
pub async fn import_csv(db_path: &str, matches: &ArgMatches) -> Result<()> {
    let file = matches
        .get_one::<String>("file")
        .ok_or_else(|| anyhow::anyhow!("CSV file path is required"))?;
    let library_name = matches
        .get_one::<String>("library")
        .ok_or_else(|| anyhow::anyhow!("Library name is required"))?;

    if !Path::new(file).exists() {
        bail!("File not found: {}", file);
    }

    let pool = connect_db(db_path).await?;
    let library = acquire_library(&pool, library_name).await?;

    let mut reader = csv::Reader::from_path(file)
        .with_context(|| format!("Failed to open {}", file))?;

    let mut importer = Importer::new(pool, library.id);
    for (index, record) in reader.deserialize::<ImportRow>().enumerate() {
        let row = record.with_context(|| format!("Malformed CSV row {}", index + 2))?;
        importer
            .process_row(&row)
            .await
            .with_context(|| format!("Failed to import row {}", index + 2))?;
    }

    let counts = importer.counts();
    log::info!(
        "Imported {} rows into library '{}'",
        counts.count_rows,
        library.name
    );
    println!(
        "{} {}",
        style("Import complete:").bold().green(),
        serde_json::to_string_pretty(&counts)?
    );
    Ok(())
}

async fn acquire_library(pool: &DbPool, name: &str) -> Result<Library> {
    let libraries = LibraryService::new(pool.clone());
    match libraries.exact(name, &QueryOptions::default()).await {
        Ok(library) => Ok(library),
        Err(AppError::NotFound { .. }) => {
            let library = libraries
                .insert(Library::new(name))
                .await
                .context("Failed to create target library")?;
            println!("Created library {}", style(&library.name).bold());
            Ok(library)
        }
        Err(e) => Err(e).context("Failed to look up target library"),
    }
}
