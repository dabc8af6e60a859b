//! Service-layer integration tests

use shelfmark_catalog::{
    compose, AuthorPatch, AuthorService, LibraryService, QueryOptions, SeriesService, StoryService,
    VolumeService,
};
use shelfmark_core::{AppError, Author, Library, Media, Series, Story, Volume};
use shelfmark_database::{create_test_db, run_migrations, DbPool};
use std::collections::HashMap;

async fn setup() -> (DbPool, Library) {
    let pool = create_test_db().await.unwrap();
    run_migrations(&pool).await.unwrap();
    let library = LibraryService::new(pool.clone())
        .insert(Library::new("Test Library"))
        .await
        .unwrap();
    (pool, library)
}

fn options() -> QueryOptions {
    QueryOptions::default()
}

#[tokio::test]
async fn test_author_uniqueness_within_library() {
    let (pool, library) = setup().await;
    let authors = AuthorService::new(pool);

    authors
        .insert(Author::new(library.id, "Bam Bam", "Rubble"))
        .await
        .unwrap();

    let err = authors
        .insert(Author::new(library.id, "Bam Bam", "Rubble"))
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("is already in use within this Library"));

    // Failed insert left nothing behind
    let all = authors.all(&options()).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_remove_then_find_is_missing() {
    let (pool, library) = setup().await;
    let authors = AuthorService::new(pool);

    let author = authors
        .insert(Author::new(library.id, "Bam Bam", "Rubble"))
        .await
        .unwrap();

    let removed = authors.remove(author.id).await.unwrap();
    assert_eq!(removed.id, author.id);

    let err = authors.find(author.id, &options()).await.unwrap_err();
    assert_eq!(err.to_string(), format!("Missing Author {}", author.id));
}

#[tokio::test]
async fn test_update_revalidates_uniqueness_excluding_self() {
    let (pool, library) = setup().await;
    let authors = AuthorService::new(pool);

    let fred = authors
        .insert(Author::new(library.id, "Fred", "Flintstone"))
        .await
        .unwrap();
    authors
        .insert(Author::new(library.id, "Wilma", "Flintstone"))
        .await
        .unwrap();

    // Saving under its own name is fine
    let patch = AuthorPatch {
        notes: Some("prolific".to_string()),
        ..AuthorPatch::default()
    };
    let updated = authors.update(fred.id, patch).await.unwrap();
    assert_eq!(updated.notes.as_deref(), Some("prolific"));
    assert_eq!(updated.version, 2);

    // Renaming onto another author's name is not
    let patch = AuthorPatch {
        first_name: Some("Wilma".to_string()),
        ..AuthorPatch::default()
    };
    let err = authors.update(fred.id, patch).await.unwrap_err();
    assert!(err
        .to_string()
        .contains("is already in use within this Library"));
}

#[tokio::test]
async fn test_cross_library_association_rejected() {
    let (pool, library) = setup().await;
    let libraries = LibraryService::new(pool.clone());
    let authors = AuthorService::new(pool.clone());
    let stories = StoryService::new(pool);

    let other = libraries.insert(Library::new("Other Library")).await.unwrap();

    let author = authors
        .insert(Author::new(library.id, "Fred", "Flintstone"))
        .await
        .unwrap();
    let story = stories
        .insert(Story::new(other.id, "Quarry Days"))
        .await
        .unwrap();

    let err = authors.stories_add(author.id, story.id).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));

    // No join row was created
    let listed = authors.stories(author.id, &options()).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_add_remove_round_trip() {
    let (pool, library) = setup().await;
    let authors = AuthorService::new(pool.clone());
    let stories = StoryService::new(pool);

    let author = authors
        .insert(Author::new(library.id, "Barney", "Rubble"))
        .await
        .unwrap();
    let story = stories
        .insert(Story::new(library.id, "Bowling Night"))
        .await
        .unwrap();

    authors.stories_add(author.id, story.id).await.unwrap();
    assert_eq!(authors.stories(author.id, &options()).await.unwrap().len(), 1);

    let returned = authors.stories_remove(author.id, story.id).await.unwrap();
    assert_eq!(returned.id, story.id);
    assert!(authors.stories(author.id, &options()).await.unwrap().is_empty());

    // Removing again is a client error, not a no-op
    let err = authors.stories_remove(author.id, story.id).await.unwrap_err();
    assert!(err.to_string().contains("is not associated with"));
}

#[tokio::test]
async fn test_duplicate_add_rejected_with_both_ids() {
    let (pool, library) = setup().await;
    let authors = AuthorService::new(pool.clone());
    let series = SeriesService::new(pool);

    let author = authors
        .insert(Author::new(library.id, "Wilma", "Flintstone"))
        .await
        .unwrap();
    let saga = series
        .insert(Series::new(library.id, "Bedrock Chronicles"))
        .await
        .unwrap();

    authors.series_add(author.id, saga.id).await.unwrap();
    let err = authors.series_add(author.id, saga.id).await.unwrap_err();

    assert!(matches!(err, AppError::DuplicateAssociation { .. }));
    let message = err.to_string();
    assert!(message.contains(&author.id.as_string()));
    assert!(message.contains(&saga.id.as_string()));

    // Exactly one association remains
    assert_eq!(authors.series(author.id, &options()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_pagination_preserves_canonical_order() {
    let (pool, library) = setup().await;
    let authors = AuthorService::new(pool);

    for (first, last) in [
        ("Fred", "Flintstone"),
        ("Barney", "Rubble"),
        ("Bam Bam", "Rubble"),
    ] {
        authors
            .insert(Author::new(library.id, first, last))
            .await
            .unwrap();
    }

    let everyone = authors.all(&options()).await.unwrap();
    assert_eq!(everyone.len(), 3);
    // Canonical order: last name, then first name
    assert_eq!(everyone[0].first_name, "Fred");
    assert_eq!(everyone[1].first_name, "Bam Bam");
    assert_eq!(everyone[2].first_name, "Barney");

    let tail = authors
        .all(&QueryOptions {
            offset: Some(1),
            ..QueryOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].id, everyone[1].id);
    assert_eq!(tail[1].id, everyone[2].id);
}

#[tokio::test]
async fn test_exact_match_arity() {
    let (pool, library) = setup().await;
    let stories = StoryService::new(pool);

    let err = stories
        .exact(library.id, "Hunt the Wumpus", &options())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    let story = stories
        .insert(Story::new(library.id, "Hunt the Wumpus"))
        .await
        .unwrap();
    let found = stories
        .exact(library.id, "Hunt the Wumpus", &options())
        .await
        .unwrap();
    assert_eq!(found.id, story.id);
}

#[tokio::test]
async fn test_name_search_is_case_insensitive_substring() {
    let (pool, library) = setup().await;
    let stories = StoryService::new(pool);

    stories
        .insert(Story::new(library.id, "Hunt the Wumpus"))
        .await
        .unwrap();
    stories
        .insert(Story::new(library.id, "Quarry Days"))
        .await
        .unwrap();

    let hits = stories.name(library.id, "wumpus", &options()).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Hunt the Wumpus");

    let none = stories.name(library.id, "zzz", &options()).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_eager_loading_via_composed_options() {
    let (pool, library) = setup().await;
    let authors = AuthorService::new(pool.clone());
    let stories = StoryService::new(pool);

    let author = authors
        .insert(Author::new(library.id, "Fred", "Flintstone"))
        .await
        .unwrap();
    let story = stories
        .insert(Story::new(library.id, "Quarry Days"))
        .await
        .unwrap();
    authors.stories_add(author.id, story.id).await.unwrap();

    let mut params = HashMap::new();
    params.insert("withLibrary".to_string(), String::new());
    params.insert("withStories".to_string(), String::new());
    let opts = compose(&QueryOptions::default(), &params).unwrap();

    let loaded = authors.find(author.id, &opts).await.unwrap();
    assert_eq!(loaded.library.as_ref().map(|l| l.id), Some(library.id));
    let attached = loaded.stories.unwrap();
    assert_eq!(attached.len(), 1);
    assert_eq!(attached[0].id, story.id);

    // Without flags, nothing is attached
    let bare = authors.find(author.id, &options()).await.unwrap();
    assert!(bare.library.is_none());
    assert!(bare.stories.is_none());
}

#[tokio::test]
async fn test_series_story_ordinal_and_relationship_search() {
    let (pool, library) = setup().await;
    let series = SeriesService::new(pool.clone());
    let stories = StoryService::new(pool);

    let saga = series
        .insert(Series::new(library.id, "Wumpus Saga"))
        .await
        .unwrap();
    let first = stories
        .insert(Story::new(library.id, "Hunt the Wumpus"))
        .await
        .unwrap();
    let second = stories
        .insert(Story::new(library.id, "Return of the Wumpus"))
        .await
        .unwrap();

    series.stories_add(saga.id, first.id, Some(1)).await.unwrap();
    series.stories_add(saga.id, second.id, Some(2)).await.unwrap();

    let listed = series.stories(saga.id, &options()).await.unwrap();
    assert_eq!(listed.len(), 2);

    let found = series
        .stories_exact(saga.id, "Hunt the Wumpus", &options())
        .await
        .unwrap();
    assert_eq!(found.id, first.id);

    let hits = series
        .stories_name(saga.id, "return", &options())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, second.id);
}

#[tokio::test]
async fn test_library_remove_cascades() {
    let (pool, library) = setup().await;
    let libraries = LibraryService::new(pool.clone());
    let authors = AuthorService::new(pool.clone());
    let volumes = VolumeService::new(pool);

    let author = authors
        .insert(Author::new(library.id, "Fred", "Flintstone"))
        .await
        .unwrap();
    let volume = volumes
        .insert(Volume::new(library.id, "Collected Works", Media::Book))
        .await
        .unwrap();
    authors.volumes_add(author.id, volume.id).await.unwrap();

    libraries.remove(library.id).await.unwrap();

    assert!(matches!(
        authors.find(author.id, &options()).await,
        Err(AppError::NotFound { .. })
    ));
    assert!(matches!(
        volumes.find(volume.id, &options()).await,
        Err(AppError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_relationship_listing_from_both_directions() {
    let (pool, library) = setup().await;
    let authors = AuthorService::new(pool.clone());
    let volumes = VolumeService::new(pool);

    let author = authors
        .insert(Author::new(library.id, "Barney", "Rubble"))
        .await
        .unwrap();
    let volume = volumes
        .insert(Volume::new(library.id, "Boxed Set", Media::Kindle))
        .await
        .unwrap();

    // One join row serves both directions
    authors.volumes_add(author.id, volume.id).await.unwrap();

    let from_author = authors.volumes(author.id, &options()).await.unwrap();
    assert_eq!(from_author.len(), 1);
    assert_eq!(from_author[0].id, volume.id);

    let from_volume = volumes.authors(volume.id, &options()).await.unwrap();
    assert_eq!(from_volume.len(), 1);
    assert_eq!(from_volume[0].id, author.id);

    // And removing from the other direction clears it for both
    volumes.authors_remove(volume.id, author.id).await.unwrap();
    assert!(authors.volumes(author.id, &options()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_library_exact_and_name_search() {
    let (pool, _library) = setup().await;
    let libraries = LibraryService::new(pool);

    libraries.insert(Library::new("Beach House")).await.unwrap();

    let found = libraries.exact("Test Library", &options()).await.unwrap();
    assert_eq!(found.name, "Test Library");

    let hits = libraries.name("house", &options()).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Beach House");

    let err = libraries.exact("No Such Place", &options()).await.unwrap_err();
    assert_eq!(err.to_string(), "Missing Library No Such Place");
}
