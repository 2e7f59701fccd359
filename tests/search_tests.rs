//! Integration tests for the search path: free-text predicates,
//! whitelisted sorting, and pagination against a live store.

mod common;

use chrono::NaiveDate;
use cinelog::Database;
use cinelog::db::{FilmFilter, PersonFilter};
use cinelog::query::{Page, SortKey};
use pretty_assertions::assert_eq;

use common::{film, person_born, test_db};

async fn seed_titles(db: &Database) {
    film(db, "Fresh Air", 2001).await;
    film(db, "Mango Tango", 1998).await;
    film(db, "Banana Split", 2005).await;
}

fn titles(items: &[cinelog::db::FilmRecord]) -> Vec<&str> {
    items.iter().map(|f| f.title.as_str()).collect()
}

#[tokio::test]
async fn test_title_search_matches_any_token() {
    let db = test_db().await;
    seed_titles(&db).await;

    let page = db
        .films()
        .search(
            &FilmFilter {
                title: Some("mango fresh".to_string()),
                ..Default::default()
            },
            &[],
            &Page::default(),
        )
        .await
        .unwrap();

    // Default order is title ASC; one token hit is enough.
    assert_eq!(titles(&page.items), vec!["Fresh Air", "Mango Tango"]);
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_absent_or_blank_filter_matches_everything() {
    let db = test_db().await;
    seed_titles(&db).await;

    let all = db
        .films()
        .search(&FilmFilter::default(), &[], &Page::default())
        .await
        .unwrap();
    assert_eq!(all.total, 3);

    let blank = db
        .films()
        .search(
            &FilmFilter {
                title: Some("   ".to_string()),
                ..Default::default()
            },
            &[],
            &Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(blank.total, 3);
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let db = test_db().await;
    seed_titles(&db).await;

    let page = db
        .films()
        .search(
            &FilmFilter {
                title: Some("BANANA".to_string()),
                ..Default::default()
            },
            &[],
            &Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(titles(&page.items), vec!["Banana Split"]);
}

#[tokio::test]
async fn test_release_bounds_are_strict() {
    let db = test_db().await;
    seed_titles(&db).await;

    // "Fresh Air" is released exactly on 2001-06-01; a strict before-bound
    // at that date excludes it.
    let page = db
        .films()
        .search(
            &FilmFilter {
                released_before: NaiveDate::from_ymd_opt(2001, 6, 1),
                ..Default::default()
            },
            &[],
            &Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(titles(&page.items), vec!["Mango Tango"]);

    let page = db
        .films()
        .search(
            &FilmFilter {
                released_after: NaiveDate::from_ymd_opt(2001, 6, 1),
                ..Default::default()
            },
            &[],
            &Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(titles(&page.items), vec!["Banana Split"]);
}

#[tokio::test]
async fn test_filters_combine_with_and() {
    let db = test_db().await;
    seed_titles(&db).await;

    let page = db
        .films()
        .search(
            &FilmFilter {
                title: Some("mango banana".to_string()),
                released_after: NaiveDate::from_ymd_opt(2000, 1, 1),
                ..Default::default()
            },
            &[],
            &Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(titles(&page.items), vec!["Banana Split"]);
}

#[tokio::test]
async fn test_sort_whitelist_drops_unknown_fields() {
    let db = test_db().await;
    seed_titles(&db).await;

    // "secret_column" is silently dropped; the surviving key wins.
    let page = db
        .films()
        .search(
            &FilmFilter::default(),
            &[SortKey::asc("secret_column"), SortKey::desc("title")],
            &Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(
        titles(&page.items),
        vec!["Mango Tango", "Fresh Air", "Banana Split"]
    );
}

#[tokio::test]
async fn test_sort_falls_back_to_default_when_nothing_survives() {
    let db = test_db().await;
    seed_titles(&db).await;

    let page = db
        .films()
        .search(
            &FilmFilter::default(),
            &[SortKey::asc("drop_table"), SortKey::desc("password")],
            &Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(
        titles(&page.items),
        vec!["Banana Split", "Fresh Air", "Mango Tango"]
    );
}

#[tokio::test]
async fn test_sort_by_release_date() {
    let db = test_db().await;
    seed_titles(&db).await;

    let page = db
        .films()
        .search(
            &FilmFilter::default(),
            &[SortKey::desc("release_date")],
            &Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(
        titles(&page.items),
        vec!["Banana Split", "Fresh Air", "Mango Tango"]
    );
}

#[tokio::test]
async fn test_pagination_pages_through_results() {
    let db = test_db().await;
    seed_titles(&db).await;

    let first = db
        .films()
        .search(
            &FilmFilter::default(),
            &[],
            &Page {
                limit: Some(2),
                offset: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.total, 3);
    assert!(first.has_more());

    let second = db
        .films()
        .search(
            &FilmFilter::default(),
            &[],
            &Page {
                limit: Some(2),
                offset: Some(2),
            },
        )
        .await
        .unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(!second.has_more());
}

#[tokio::test]
async fn test_person_search_by_name_and_birth_range() {
    let db = test_db().await;
    person_born(&db, "Greta Garbo", 1905, 9, 18).await;
    person_born(&db, "Cary Grant", 1904, 1, 18).await;
    person_born(&db, "Grace Kelly", 1929, 11, 12).await;

    let page = db
        .people()
        .search(
            &PersonFilter {
                name: Some("garbo".to_string()),
                ..Default::default()
            },
            &[],
            &Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Greta Garbo");

    let page = db
        .people()
        .search(
            &PersonFilter {
                born_before: NaiveDate::from_ymd_opt(1905, 9, 18),
                ..Default::default()
            },
            &[],
            &Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Cary Grant");

    let page = db
        .people()
        .search(
            &PersonFilter {
                born_after: NaiveDate::from_ymd_opt(1905, 9, 18),
                ..Default::default()
            },
            &[SortKey::asc("date_of_birth")],
            &Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Grace Kelly");
}

#[tokio::test]
async fn test_file_backed_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("catalog.db").display());

    let db = Database::connect(&url).await.unwrap();
    let created = film(&db, "Persistent Picture", 2020).await;
    drop(db);

    // Reconnecting re-runs the idempotent schema bootstrap and finds the
    // same data.
    let db = Database::connect(&url).await.unwrap();
    let found = db.films().get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found, created);
}
