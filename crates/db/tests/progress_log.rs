use chrono::{Duration, Utc};

use raboneko_core::{LogType, NewProgressLog, Product};
use raboneko_db::{connect_with_settings, migrations, ProgressLogRepository, SqlProgressLogRepository};

async fn repository() -> SqlProgressLogRepository {
    // One connection: an in-memory database exists per connection.
    let pool =
        connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect to in-memory sqlite");
    migrations::run_pending(&pool).await.expect("apply migrations");
    SqlProgressLogRepository::new(pool)
}

#[tokio::test]
async fn create_round_trips_the_record() {
    let repository = repository().await;

    let created = repository
        .create(NewProgressLog {
            user_id: "123456789012345678".to_owned(),
            log_type: LogType::BugFix,
            product: Product::TauOs,
            summary: "fixed crash".to_owned(),
        })
        .await
        .expect("insert");

    assert_eq!(created.id, 1);
    assert_eq!(created.log_type, LogType::BugFix);
    assert_eq!(created.product, Product::TauOs);

    let window_start = created.created_at - Duration::seconds(1);
    let window_end = created.created_at + Duration::seconds(1);
    let found = repository.find_in_window(window_start, window_end).await.expect("query");

    assert_eq!(found, vec![created]);
}

#[tokio::test]
async fn ids_are_assigned_monotonically() {
    let repository = repository().await;

    for summary in ["one", "two", "three"] {
        repository
            .create(NewProgressLog {
                user_id: "123456789012345678".to_owned(),
                log_type: LogType::Feature,
                product: Product::Terra,
                summary: summary.to_owned(),
            })
            .await
            .expect("insert");
    }

    let now = Utc::now();
    let found = repository
        .find_in_window(now - Duration::minutes(1), now + Duration::minutes(1))
        .await
        .expect("query");

    let ids: Vec<i64> = found.iter().map(|log| log.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn window_excludes_records_outside_the_range() {
    let repository = repository().await;

    let created = repository
        .create(NewProgressLog {
            user_id: "123456789012345678".to_owned(),
            log_type: LogType::Release,
            product: Product::Andaman,
            summary: "shipped".to_owned(),
        })
        .await
        .expect("insert");

    let stale_start = created.created_at - Duration::days(14);
    let stale_end = created.created_at - Duration::days(7);
    let found = repository.find_in_window(stale_start, stale_end).await.expect("query");

    assert!(found.is_empty());
}
