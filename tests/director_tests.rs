//! Integration tests for director association maintenance.
//!
//! The core property throughout: a person appears in a film's director
//! set exactly when the film appears in that person's directed films.

mod common;

use std::collections::HashSet;

use assert_matches::assert_matches;
use cinelog::db::{FilmRecord, PersonRecord};
use cinelog::{CatalogError, Database, EntityKind};
use uuid::Uuid;

use common::{film, person, test_db};

/// Check the bidirectional invariant across every (film, person) pair.
async fn assert_bidirectional(db: &Database, films: &[FilmRecord], people: &[PersonRecord]) {
    for f in films {
        let director_ids: HashSet<Uuid> = db
            .directors()
            .directors_of(f.id)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        for p in people {
            let directed: HashSet<Uuid> = db
                .directors()
                .films_directed_by(p.id)
                .await
                .unwrap()
                .iter()
                .map(|f| f.id)
                .collect();
            assert_eq!(
                director_ids.contains(&p.id),
                directed.contains(&f.id),
                "invariant broken for film {} / person {}",
                f.title,
                p.name
            );
        }
    }
}

#[tokio::test]
async fn test_set_director_links_both_sides() {
    let db = test_db().await;
    let f = film(&db, "Heat", 1995).await;
    let p = person(&db, "Michael Mann").await;

    db.directors().set_director(f.id, p.id).await.unwrap();

    let directors = db.directors().directors_of(f.id).await.unwrap();
    assert_eq!(directors.len(), 1);
    assert_eq!(directors[0].id, p.id);

    let directed = db.directors().films_directed_by(p.id).await.unwrap();
    assert_eq!(directed.len(), 1);
    assert_eq!(directed[0].id, f.id);

    assert_bidirectional(&db, &[f], &[p]).await;
}

#[tokio::test]
async fn test_set_director_is_idempotent() {
    let db = test_db().await;
    let f = film(&db, "Heat", 1995).await;
    let p = person(&db, "Michael Mann").await;

    db.directors().set_director(f.id, p.id).await.unwrap();
    db.directors().set_director(f.id, p.id).await.unwrap();

    assert_eq!(db.directors().directors_of(f.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_set_director_requires_both_endpoints() {
    let db = test_db().await;
    let f = film(&db, "Heat", 1995).await;
    let p = person(&db, "Michael Mann").await;

    let err = db
        .directors()
        .set_director(Uuid::new_v4(), p.id)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        CatalogError::NotFound {
            kind: EntityKind::Film,
            ..
        }
    );

    let err = db
        .directors()
        .set_director(f.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        CatalogError::NotFound {
            kind: EntityKind::Person,
            ..
        }
    );
}

#[tokio::test]
async fn test_replace_director_set() {
    let db = test_db().await;
    let f = film(&db, "The Matrix", 1999).await;
    let a = person(&db, "Director A").await;
    let b = person(&db, "Director B").await;
    let c = person(&db, "Director C").await;

    db.directors().set_director(f.id, a.id).await.unwrap();
    db.directors().set_director(f.id, b.id).await.unwrap();

    let result = db
        .directors()
        .update_directors(f.id, &[b.id, c.id])
        .await
        .unwrap();
    let result_ids: Vec<Uuid> = result.iter().map(|p| p.id).collect();
    assert_eq!(result_ids, vec![b.id, c.id]);

    let directors: HashSet<Uuid> = db
        .directors()
        .directors_of(f.id)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(directors, HashSet::from([b.id, c.id]));

    // A lost the film, C gained it, B kept it, on the person side too.
    assert!(db.directors().films_directed_by(a.id).await.unwrap().is_empty());
    assert_eq!(db.directors().films_directed_by(b.id).await.unwrap().len(), 1);
    assert_eq!(db.directors().films_directed_by(c.id).await.unwrap().len(), 1);

    assert_bidirectional(&db, &[f], &[a, b, c]).await;
}

#[tokio::test]
async fn test_replace_reports_every_missing_id() {
    let db = test_db().await;
    let f = film(&db, "The Matrix", 1999).await;
    let a = person(&db, "Director A").await;
    let ghost1 = Uuid::new_v4();
    let ghost2 = Uuid::new_v4();

    let err = db
        .directors()
        .update_directors(f.id, &[a.id, ghost1, ghost2])
        .await
        .unwrap_err();
    match err {
        CatalogError::NotFoundMany { kind, ids } => {
            assert_eq!(kind, EntityKind::Person);
            assert_eq!(ids, vec![ghost1, ghost2]);
        }
        other => panic!("expected NotFoundMany, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_replace_leaves_directors_untouched() {
    let db = test_db().await;
    let f = film(&db, "The Matrix", 1999).await;
    let a = person(&db, "Director A").await;
    db.directors().set_director(f.id, a.id).await.unwrap();

    let err = db
        .directors()
        .update_directors(f.id, &[Uuid::new_v4()])
        .await
        .unwrap_err();
    assert_matches!(err, CatalogError::NotFoundMany { .. });

    let directors = db.directors().directors_of(f.id).await.unwrap();
    assert_eq!(directors.len(), 1);
    assert_eq!(directors[0].id, a.id);
}

#[tokio::test]
async fn test_replace_with_empty_clears_both_sides() {
    let db = test_db().await;
    let f = film(&db, "The Matrix", 1999).await;
    let a = person(&db, "Director A").await;
    let b = person(&db, "Director B").await;
    db.directors().set_director(f.id, a.id).await.unwrap();
    db.directors().set_director(f.id, b.id).await.unwrap();

    let result = db.directors().update_directors(f.id, &[]).await.unwrap();
    assert!(result.is_empty());
    assert!(db.directors().directors_of(f.id).await.unwrap().is_empty());
    assert!(db.directors().films_directed_by(a.id).await.unwrap().is_empty());
    assert!(db.directors().films_directed_by(b.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_replace_on_missing_film_fails() {
    let db = test_db().await;
    let a = person(&db, "Director A").await;

    let err = db
        .directors()
        .update_directors(Uuid::new_v4(), &[a.id])
        .await
        .unwrap_err();
    assert_matches!(
        err,
        CatalogError::NotFound {
            kind: EntityKind::Film,
            ..
        }
    );
}

#[tokio::test]
async fn test_delete_director_is_idempotent() {
    let db = test_db().await;
    let f = film(&db, "Heat", 1995).await;
    let p = person(&db, "Michael Mann").await;
    db.directors().set_director(f.id, p.id).await.unwrap();

    assert!(db.directors().delete_director(f.id, p.id).await.unwrap());
    assert!(!db.directors().delete_director(f.id, p.id).await.unwrap());
    assert!(db.directors().directors_of(f.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_directors_clears_film_only() {
    let db = test_db().await;
    let f1 = film(&db, "Heat", 1995).await;
    let f2 = film(&db, "Collateral", 2004).await;
    let p = person(&db, "Michael Mann").await;
    db.directors().set_director(f1.id, p.id).await.unwrap();
    db.directors().set_director(f2.id, p.id).await.unwrap();

    let removed = db.directors().delete_directors(f1.id).await.unwrap();
    assert_eq!(removed, 1);
    assert!(db.directors().directors_of(f1.id).await.unwrap().is_empty());

    // The other film's pairing survives.
    let directed = db.directors().films_directed_by(p.id).await.unwrap();
    assert_eq!(directed.len(), 1);
    assert_eq!(directed[0].id, f2.id);
}

#[tokio::test]
async fn test_film_delete_removes_its_director_links() {
    let db = test_db().await;
    let f = film(&db, "Heat", 1995).await;
    let p = person(&db, "Michael Mann").await;
    db.directors().set_director(f.id, p.id).await.unwrap();

    assert!(db.films().delete(f.id).await.unwrap());
    assert!(db.directors().films_directed_by(p.id).await.unwrap().is_empty());
}
