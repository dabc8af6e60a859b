//! Import engine integration tests

use shelfmark_catalog::{
    AuthorService, ImportRow, Importer, LibraryService, QueryOptions, SeriesService, StoryService,
    VolumeService,
};
use shelfmark_core::{Library, Media};
use shelfmark_database::{create_test_db, run_migrations, DbPool};

async fn setup() -> (DbPool, Library) {
    let pool = create_test_db().await.unwrap();
    run_migrations(&pool).await.unwrap();
    let library = LibraryService::new(pool.clone())
        .insert(Library::new("Test Library"))
        .await
        .unwrap();
    (pool, library)
}

fn row(
    first: &str,
    last: &str,
    name: &str,
    series: Option<&str>,
    ordinal: Option<&str>,
) -> ImportRow {
    ImportRow {
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        name: Some(name.to_string()),
        series_name: series.map(str::to_string),
        series_ordinal: ordinal.map(str::to_string),
        ..ImportRow::default()
    }
}

#[tokio::test]
async fn test_single_row_creates_full_graph() {
    let (pool, library) = setup().await;
    let mut importer = Importer::new(pool.clone(), library.id);

    importer
        .process_row(&row(
            "Bam Bam",
            "Rubble",
            "Hunt the Wumpus",
            Some("Wumpus Saga"),
            Some("1"),
        ))
        .await
        .unwrap();

    let counts = importer.counts();
    assert_eq!(counts.count_rows, 1);
    assert_eq!(counts.count_authors, 1);
    assert_eq!(counts.count_stories, 1);
    assert_eq!(counts.count_volumes, 1);
    assert_eq!(counts.count_series, 1);
    assert_eq!(counts.count_authors_series, 1);
    assert_eq!(counts.count_authors_stories, 1);
    assert_eq!(counts.count_authors_volumes, 1);
    assert_eq!(counts.count_series_stories, 1);
    assert_eq!(counts.count_volumes_stories, 1);

    let authors = AuthorService::new(pool.clone());
    let author = authors
        .exact(library.id, "Bam Bam", "Rubble", &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(
        authors
            .stories(author.id, &QueryOptions::default())
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        authors
            .series(author.id, &QueryOptions::default())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let (pool, library) = setup().await;

    let rows = vec![
        row(
            "Bam Bam",
            "Rubble",
            "Hunt the Wumpus",
            Some("Wumpus Saga"),
            Some("1"),
        ),
        row(
            "Bam Bam",
            "Rubble",
            "Return of the Wumpus",
            Some("Wumpus Saga"),
            Some("2"),
        ),
        row("Fred", "Flintstone", "Quarry Days", None, None),
    ];

    let mut importer = Importer::new(pool.clone(), library.id);
    for r in &rows {
        importer.process_row(r).await.unwrap();
    }
    let first_run = importer.counts();
    assert_eq!(first_run.count_rows, 3);
    assert_eq!(first_run.count_authors, 2);
    assert_eq!(first_run.count_stories, 3);
    assert_eq!(first_run.count_volumes, 3);
    assert_eq!(first_run.count_series, 1);

    // Second pass over identical data creates nothing
    let mut importer = Importer::new(pool.clone(), library.id);
    for r in &rows {
        importer.process_row(r).await.unwrap();
    }
    let second_run = importer.counts();
    assert_eq!(second_run.count_rows, 3);
    assert_eq!(second_run.count_authors, 0);
    assert_eq!(second_run.count_stories, 0);
    assert_eq!(second_run.count_volumes, 0);
    assert_eq!(second_run.count_series, 0);
    assert_eq!(second_run.count_authors_series, 0);
    assert_eq!(second_run.count_authors_stories, 0);
    assert_eq!(second_run.count_authors_volumes, 0);
    assert_eq!(second_run.count_series_stories, 0);
    assert_eq!(second_run.count_volumes_stories, 0);

    // And the entity set is unchanged
    let stories = StoryService::new(pool.clone());
    assert_eq!(
        stories.all(&QueryOptions::default()).await.unwrap().len(),
        3
    );
    let series = SeriesService::new(pool);
    assert_eq!(series.all(&QueryOptions::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_names_use_placeholder() {
    let (pool, library) = setup().await;
    let mut importer = Importer::new(pool.clone(), library.id);

    let anonymous = ImportRow {
        name: Some("Orphan Tale".to_string()),
        ..ImportRow::default()
    };
    importer.process_row(&anonymous).await.unwrap();

    let authors = AuthorService::new(pool);
    let author = authors
        .exact(library.id, "?", "?", &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(author.first_name, "?");
    assert_eq!(author.last_name, "?");

    // A second anonymous row reuses the placeholder author
    importer
        .process_row(&ImportRow {
            name: Some("Another Tale".to_string()),
            ..ImportRow::default()
        })
        .await
        .unwrap();
    assert_eq!(importer.counts().count_authors, 1);
}

#[tokio::test]
async fn test_titleless_row_links_author_to_series_only() {
    let (pool, library) = setup().await;
    let mut importer = Importer::new(pool.clone(), library.id);

    let r = ImportRow {
        first_name: Some("Wilma".to_string()),
        last_name: Some("Flintstone".to_string()),
        series_name: Some("Bedrock Chronicles".to_string()),
        ..ImportRow::default()
    };
    importer.process_row(&r).await.unwrap();

    let counts = importer.counts();
    assert_eq!(counts.count_authors, 1);
    assert_eq!(counts.count_series, 1);
    assert_eq!(counts.count_authors_series, 1);
    assert_eq!(counts.count_stories, 0);
    assert_eq!(counts.count_volumes, 0);
    assert_eq!(counts.count_series_stories, 0);

    let stories = StoryService::new(pool);
    assert!(stories.all(&QueryOptions::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_media_classification_and_read_flag() {
    let (pool, library) = setup().await;
    let mut importer = Importer::new(pool.clone(), library.id);

    let kindle = ImportRow {
        first_name: Some("Fred".to_string()),
        last_name: Some("Flintstone".to_string()),
        name: Some("Quarry Days".to_string()),
        box_label: Some("Kindle".to_string()),
        read: Some("x".to_string()),
        ..ImportRow::default()
    };
    importer.process_row(&kindle).await.unwrap();

    let boxed = ImportRow {
        first_name: Some("Fred".to_string()),
        last_name: Some("Flintstone".to_string()),
        name: Some("Bowling Night".to_string()),
        box_label: Some("Attic Box 3".to_string()),
        read: Some("no".to_string()),
        notes: Some("water damaged".to_string()),
        ..ImportRow::default()
    };
    importer.process_row(&boxed).await.unwrap();

    let volumes = VolumeService::new(pool);
    let ebook = volumes
        .exact(library.id, "Quarry Days", &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(ebook.media, Media::Kindle);
    assert!(ebook.location.is_none());
    assert!(ebook.read);

    let paper = volumes
        .exact(library.id, "Bowling Night", &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(paper.media, Media::Book);
    assert_eq!(paper.location.as_deref(), Some("Attic Box 3"));
    // Only the exact sentinel marks a volume read
    assert!(!paper.read);
    assert_eq!(paper.notes.as_deref(), Some("water damaged"));
}

#[tokio::test]
async fn test_shared_story_across_rows_reuses_entities() {
    let (pool, library) = setup().await;
    let mut importer = Importer::new(pool.clone(), library.id);

    // Two authors contributing to the same anthology
    importer
        .process_row(&row("Fred", "Flintstone", "Bedrock Anthology", None, None))
        .await
        .unwrap();
    importer
        .process_row(&row("Barney", "Rubble", "Bedrock Anthology", None, None))
        .await
        .unwrap();

    let counts = importer.counts();
    assert_eq!(counts.count_authors, 2);
    assert_eq!(counts.count_stories, 1);
    assert_eq!(counts.count_volumes, 1);
    // Both rows linked their author, the volume-story edge only once
    assert_eq!(counts.count_authors_stories, 2);
    assert_eq!(counts.count_authors_volumes, 2);
    assert_eq!(counts.count_volumes_stories, 1);
}
