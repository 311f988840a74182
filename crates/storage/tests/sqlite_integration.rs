use chrono::Duration;
use quiz_core::time::fixed_now;
use storage::repository::{BestScore, BestScoreRepository, Storage};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_best_score_starts_empty_and_roundtrips() {
    let repo = connect("memdb_best_roundtrip").await;
    assert_eq!(repo.get_best().await.unwrap(), None);

    let best = BestScore::new(8, 10, fixed_now());
    repo.save_best(&best).await.unwrap();

    let fetched = repo.get_best().await.unwrap().expect("stored");
    assert_eq!(fetched, best);
    assert_eq!(fetched.percentage, 80);

    repo.clear_best().await.unwrap();
    assert_eq!(repo.get_best().await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_record_if_better_is_strict() {
    let repo = connect("memdb_best_strict").await;
    let later = fixed_now() + Duration::hours(1);

    assert!(repo.record_if_better(&BestScore::new(3, 5, fixed_now())).await.unwrap());
    assert!(!repo.record_if_better(&BestScore::new(6, 10, later)).await.unwrap());
    assert!(!repo.record_if_better(&BestScore::new(2, 5, later)).await.unwrap());

    let kept = repo.get_best().await.unwrap().unwrap();
    assert_eq!(kept.score, 3);
    assert_eq!(kept.achieved_at, fixed_now());

    assert!(repo.record_if_better(&BestScore::new(9, 10, later)).await.unwrap());
    let replaced = repo.get_best().await.unwrap().unwrap();
    assert_eq!(replaced.percentage, 90);
    assert_eq!(replaced.achieved_at, later);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_best_migrate_twice").await;
    repo.save_best(&BestScore::new(1, 2, fixed_now())).await.unwrap();
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.get_best().await.unwrap().unwrap().percentage, 50);
}

#[tokio::test]
async fn storage_sqlite_wires_best_score_repository() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage_wiring?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage
        .best_scores
        .save_best(&BestScore::new(4, 4, fixed_now()))
        .await
        .unwrap();
    let best = storage.best_scores.get_best().await.unwrap().unwrap();
    assert_eq!(best.percentage, 100);
}
