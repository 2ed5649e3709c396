use async_trait::async_trait;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cinetrack_importer::domain::{
    EntityId, LinkRecord, LinkType, NaturalKey, NewEntity, NewEpisode, NewTitle,
};
use cinetrack_importer::error::{ImportError, Result};
use cinetrack_importer::importer::resolver::DEFAULT_PASSWORD;
use cinetrack_importer::importer::Importer;
use cinetrack_importer::storage::{DataStore, InMemoryStore};

fn write_csv(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

const FULL_CATALOG: &str = "\
type,username,email,title,year,genre,name,studio_name,platform_name,season,episode,rating,comment,follower,followed,amount
user,alice,alice@example.com,,,,,,,,,,,,,
user,bob,,,,,,,,,,,,,,
movie,,,Heat,1995,,,,,,,,,,,
genre,,,,,Crime,,,,,,,,,,
cast,,,,,,Al Pacino,,,,,,,,,
studio,,,,,,,Warner Bros,,,,,,,,
platform,,,,,,,,Netflix,,,,,,,
episode,,,Severance,,,,,,1,1,,,,,
review,alice,,Heat,,,,,,,,9/10,great,,,
movie_cast,,,Heat,,,Al Pacino,,,,,,,,,
movie_genre,,,Heat,,Crime,,,,,,,,,,
movie_studio,,,Heat,,,,Warner Bros,,,,,,,,
movie_platform,,,Heat,,,,,Netflix,,,,,,,
distribution,,,Heat,,,,Warner Bros,Netflix,,,,,,,
follow,,,,,,,,,,,,,alice,bob,
donation,bob,,,,,,,,,,,,,,25.5
";

#[tokio::test]
async fn full_catalog_import_covers_every_record_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "catalog.csv", FULL_CATALOG);

    let store = Arc::new(InMemoryStore::new());
    let report = Importer::new(store.clone()).import_file(&path).await;

    assert_eq!(report.inserted, 16);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed, 0);
    assert!(report.diagnostics.is_empty());

    assert_eq!(store.user_count(), 2);
    // Heat plus the Severance series stub created by its episode row
    assert_eq!(store.title_count(), 2);
    assert_eq!(store.genre_count(), 1);
    assert_eq!(store.person_count(), 1);
    assert_eq!(store.studio_count(), 1);
    assert_eq!(store.platform_count(), 1);
    assert_eq!(store.episode_count(), 1);
    assert_eq!(store.review_count(), 1);
    assert_eq!(store.donation_count(), 1);
    for link_type in [
        LinkType::TitleCast,
        LinkType::TitleGenre,
        LinkType::TitleStudio,
        LinkType::TitlePlatform,
        LinkType::Distribution,
        LinkType::UserFollow,
    ] {
        assert_eq!(store.link_count(link_type), 1, "{:?}", link_type);
    }
}

#[tokio::test]
async fn second_run_resolves_without_duplicating() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "catalog.csv", FULL_CATALOG);

    let store = Arc::new(InMemoryStore::new());
    let importer = Importer::new(store.clone());
    importer.import_file(&path).await;
    let second = importer.import_file(&path).await;

    // Entity-creating rows all resolve to existing rows; append-only
    // reviews/donations and the already-satisfied links count as inserted
    assert_eq!(second.skipped, 8);
    assert_eq!(second.inserted, 8);
    assert_eq!(second.failed, 0);

    assert_eq!(store.user_count(), 2);
    assert_eq!(store.title_count(), 2);
    assert_eq!(store.genre_count(), 1);
    assert_eq!(store.person_count(), 1);
    assert_eq!(store.studio_count(), 1);
    assert_eq!(store.platform_count(), 1);
    assert_eq!(store.episode_count(), 1);
    for link_type in [
        LinkType::TitleCast,
        LinkType::TitleGenre,
        LinkType::TitleStudio,
        LinkType::TitlePlatform,
        LinkType::Distribution,
        LinkType::UserFollow,
    ] {
        assert_eq!(store.link_count(link_type), 1, "{:?}", link_type);
    }
    // Append-only records doubled
    assert_eq!(store.review_count(), 2);
    assert_eq!(store.donation_count(), 2);
}

#[tokio::test]
async fn duplicate_cast_links_are_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "links.csv",
        "type,title,actor\n\
         movie_cast,Heat,Al Pacino\n\
         movie_cast,Heat,Al Pacino\n",
    );

    let store = Arc::new(InMemoryStore::new());
    let report = Importer::new(store.clone()).import_file(&path).await;

    // The second row is success, not an error: the link already exists
    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(store.link_count(LinkType::TitleCast), 1);
    assert_eq!(store.title_count(), 1);
    assert_eq!(store.person_count(), 1);
}

#[tokio::test]
async fn malformed_row_is_isolated_from_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "mixed.csv",
        "type,genre_name,title\n\
         genre,Drama,\n\
         genre,Crime,\n\
         movie,,\n\
         genre,Noir,\n",
    );

    let store = Arc::new(InMemoryStore::new());
    let report = Importer::new(store.clone()).import_file(&path).await;

    assert_eq!(report.inserted, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(store.genre_count(), 3);
    assert_eq!(store.title_count(), 0);
}

#[tokio::test]
async fn unknown_type_tag_is_skipped_not_failed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "unknown.csv",
        "type,title\nspaceship,Heat\n,Heat\n",
    );

    let report = Importer::new(Arc::new(InMemoryStore::new()))
        .import_file(&path)
        .await;

    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn missing_source_is_a_single_fatal_diagnostic() {
    let report = Importer::new(Arc::new(InMemoryStore::new()))
        .import_file(std::path::Path::new("/definitely/not/here.csv"))
        .await;

    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed, 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn review_ratings_normalize_across_encodings() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "ratings.csv",
        "type,username,title,rating\n\
         review,u1,Film,8\n\
         review,u2,Film,8.5\n\
         review,u3,Film,80\n\
         review,u4,Film,8/10\n\
         review,u5,Film,80%\n\
         review,u6,Film,11/10\n\
         review,u7,Film,abc\n",
    );

    let store = Arc::new(InMemoryStore::new());
    let report = Importer::new(store.clone()).import_file(&path).await;

    assert_eq!(report.inserted, 7);
    assert_eq!(report.failed, 0);

    let ratings: Vec<Option<f64>> = store.reviews().iter().map(|r| r.rating).collect();
    assert_eq!(
        ratings,
        vec![
            Some(8.0),
            Some(8.5),
            Some(8.0),
            Some(8.0),
            Some(8.0),
            Some(9.9),
            None,
        ]
    );

    // The referenced users and title were fabricated as stubs
    assert_eq!(store.user_count(), 7);
    assert_eq!(store.title_count(), 1);
    assert_eq!(store.find_user("u1").unwrap().password, DEFAULT_PASSWORD);
}

#[tokio::test]
async fn cancellation_before_the_run_processes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "cancel.csv",
        "type,genre_name\ngenre,Drama\ngenre,Crime\n",
    );

    let cancel = Arc::new(AtomicBool::new(true));
    let store = Arc::new(InMemoryStore::new());
    let report = Importer::new(store.clone())
        .with_cancel_flag(cancel)
        .import_file(&path)
        .await;

    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed, 0);
    assert_eq!(store.genre_count(), 0);
}

#[tokio::test]
async fn contains_episode_links_an_imported_episode() {
    let dir = tempfile::tempdir().unwrap();

    // Seed a series with one episode, then link the episode by raw id
    let store = Arc::new(InMemoryStore::new());
    let title_id = store
        .create(NewEntity::Title(NewTitle {
            name: "Severance".to_string(),
            release_date: None,
            language: None,
            description: None,
        }))
        .await
        .unwrap();
    let episode_id = store
        .create(NewEntity::Episode(NewEpisode {
            title_id,
            season: 1,
            episode_number: Some(1),
            episode_title: None,
            air_date: None,
        }))
        .await
        .unwrap();

    let path = write_csv(
        &dir,
        "contains.csv",
        &format!("type,episode_id,title\ncontains_episode,{},Severance\n", episode_id.0),
    );
    let report = Importer::new(store.clone()).import_file(&path).await;

    assert_eq!(report.inserted, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(store.link_count(LinkType::ContainsEpisode), 1);
    assert_eq!(store.title_count(), 1);
}

/// Store that raises the caller's cancel flag as soon as the first write
/// lands, the way an operator stop arrives mid-run.
struct CancellingStore {
    inner: InMemoryStore,
    cancel: Arc<AtomicBool>,
}

#[async_trait]
impl DataStore for CancellingStore {
    async fn find_by_natural_key(&self, key: &NaturalKey) -> Result<Option<EntityId>> {
        self.inner.find_by_natural_key(key).await
    }

    async fn create(&self, entity: NewEntity) -> Result<EntityId> {
        let id = self.inner.create(entity).await?;
        self.cancel.store(true, Ordering::Relaxed);
        Ok(id)
    }

    async fn link_exists(
        &self,
        link_type: LinkType,
        id_a: EntityId,
        id_b: EntityId,
    ) -> Result<bool> {
        self.inner.link_exists(link_type, id_a, id_b).await
    }

    async fn create_link(&self, link: LinkRecord) -> Result<()> {
        self.inner.create_link(link).await
    }
}

#[tokio::test]
async fn cancellation_between_records_keeps_committed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "midrun.csv",
        "type,genre_name\ngenre,Drama\ngenre,Crime\ngenre,Noir\n",
    );

    let cancel = Arc::new(AtomicBool::new(false));
    let store = Arc::new(CancellingStore {
        inner: InMemoryStore::new(),
        cancel: cancel.clone(),
    });
    let report = Importer::new(store.clone())
        .with_cancel_flag(cancel)
        .import_file(&path)
        .await;

    // The first row commits before the stop lands; the rest never run
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed, 0);
    assert_eq!(store.inner.genre_count(), 1);
}

/// Store whose writes always fail, for exercising per-record failure
/// accounting.
struct FailingStore;

#[async_trait]
impl DataStore for FailingStore {
    async fn find_by_natural_key(&self, _key: &NaturalKey) -> Result<Option<EntityId>> {
        Ok(None)
    }

    async fn create(&self, _entity: NewEntity) -> Result<EntityId> {
        Err(ImportError::Persistence("disk full".to_string()))
    }

    async fn link_exists(
        &self,
        _link_type: LinkType,
        _id_a: EntityId,
        _id_b: EntityId,
    ) -> Result<bool> {
        Ok(false)
    }

    async fn create_link(&self, _link: LinkRecord) -> Result<()> {
        Err(ImportError::Persistence("disk full".to_string()))
    }
}

#[tokio::test]
async fn store_failures_are_counted_with_row_context() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "failing.csv",
        "type,genre_name\ngenre,Drama\ngenre,Crime\n",
    );

    let report = Importer::new(Arc::new(FailingStore)).import_file(&path).await;

    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed, 2);
    assert_eq!(report.diagnostics.len(), 2);
    assert_eq!(report.diagnostics[0].row_number, 1);
    assert_eq!(report.diagnostics[0].type_tag, "genre");
    assert!(report.diagnostics[0].message.contains("disk full"));
    assert_eq!(report.diagnostics[1].row_number, 2);
    assert_eq!(report.exit_code(), 1);
}

/// Store that hangs on lookups, for exercising the per-record timeout.
struct StalledStore;

#[async_trait]
impl DataStore for StalledStore {
    async fn find_by_natural_key(&self, _key: &NaturalKey) -> Result<Option<EntityId>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(None)
    }

    async fn create(&self, _entity: NewEntity) -> Result<EntityId> {
        Ok(EntityId(1))
    }

    async fn link_exists(
        &self,
        _link_type: LinkType,
        _id_a: EntityId,
        _id_b: EntityId,
    ) -> Result<bool> {
        Ok(false)
    }

    async fn create_link(&self, _link: LinkRecord) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn stalled_persistence_fails_the_record_not_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "stalled.csv",
        "type,genre_name,title\ngenre,Drama,\nspaceship,,x\n",
    );

    let report = Importer::new(Arc::new(StalledStore))
        .with_timeout(Duration::from_millis(20))
        .import_file(&path)
        .await;

    // The stalled genre row fails; the run continues to the next record
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 1);
    assert!(report.diagnostics[0].message.contains("timed out"));
}
