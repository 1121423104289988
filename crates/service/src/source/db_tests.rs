use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use configs::DiscoveryConfig;
use models::{bookmark, location, review, service_category, technician, user};

use super::*;
use crate::discovery::{ProximitySearchCoordinator, SearchStrategy};
use crate::filters::{BookmarkFilter, CategoryFilter, ReviewFilter, TechnicianFilter};
use crate::geo::{Coordinate, EARTH_RADIUS_KM};
use crate::pagination::{Keyed, PageLimits, PageRequest, PaginatedQueryExecutor};
use crate::test_support::get_db;

async fn seed_technician(db: &sea_orm::DatabaseConnection, tag: &str, n: usize) -> Result<technician::Model> {
    let u = user::create(db, &format!("{tag}_{n}@example.com"), "Test", "Tech", None).await?;
    Ok(technician::create(db, u.id, &format!("{tag} fitter"), None, None).await?)
}

#[tokio::test]
async fn keyset_listing_walks_every_technician_once() -> Result<()> {
    let Some(db) = get_db().await else { return Ok(()) };
    let tag = format!("tag{}", Uuid::new_v4().simple());
    let mut created = Vec::new();
    for n in 0..5 {
        created.push(seed_technician(&db, &tag, n).await?);
    }
    created.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));

    let exec = PaginatedQueryExecutor::new(
        Arc::new(SeaOrmRecordSource::<technician::Entity>::new(db.clone())),
        PageLimits::default(),
    );
    let filter = TechnicianFilter::new(Some(tag.clone()), None)?.condition();
    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let page = exec
            .list_page(&PageRequest { cursor: cursor.clone(), limit: Some(2), filter: filter.clone() })
            .await?;
        assert_eq!(page.total_count, 5);
        seen.extend(page.items.into_iter().map(|t| t.id));
        if !page.has_next_page {
            break;
        }
        cursor = page.next_cursor;
    }
    let expected: Vec<Uuid> = created.iter().map(|t| t.id).collect();
    assert_eq!(seen, expected);
    Ok(())
}

#[tokio::test]
async fn categories_list_by_name() -> Result<()> {
    let Some(db) = get_db().await else { return Ok(()) };
    let tag = format!("cat{}", Uuid::new_v4().simple());
    for name in ["c", "a", "b"] {
        service_category::create(&db, &format!("{tag} {name}"), None).await?;
    }
    let exec = PaginatedQueryExecutor::new(
        Arc::new(SeaOrmRecordSource::<service_category::Entity>::new(db.clone())),
        PageLimits::default(),
    );
    let filter = CategoryFilter::new(Some(tag.clone())).condition();
    let p1 = exec.list_page(&PageRequest::first(filter.clone(), Some(2))).await?;
    let p2 = exec.list_page(&PageRequest::after(p1.next_cursor.clone().unwrap(), filter, Some(2))).await?;
    let names: Vec<String> = p1.items.iter().chain(p2.items.iter()).map(|c| c.name.clone()).collect();
    assert_eq!(names, vec![format!("{tag} a"), format!("{tag} b"), format!("{tag} c")]);
    assert!(!p2.has_next_page);
    Ok(())
}

/// Technicians 10, 1 and 4 km north of the returned center, plus one with
/// no location. Returns the ids of the 1 km and 4 km technicians.
async fn seed_ring(db: &sea_orm::DatabaseConnection, tag: &str) -> Result<(Coordinate, Vec<Uuid>)> {
    let center = Coordinate::new(6.5244, 3.3792)?;
    let mut ids = Vec::new();
    for (n, km) in [10.0, 1.0, 4.0].into_iter().enumerate() {
        let t = seed_technician(db, tag, n).await?;
        location::upsert(db, t.id, center.lat() + (km / EARTH_RADIUS_KM).to_degrees(), center.lng()).await?;
        ids.push(t.id);
    }
    // located nowhere, must never appear
    seed_technician(db, tag, 99).await?;
    Ok((center, vec![ids[1], ids[2]]))
}

async fn nearby_ids(
    source: &Arc<SeaOrmTechnicianGeoSource>,
    strategy: SearchStrategy,
    center: Coordinate,
    filter: &TechnicianFilter,
) -> Result<Vec<(Uuid, f64)>> {
    let coord = ProximitySearchCoordinator::new(source.clone(), strategy, DiscoveryConfig::default())?;
    let found = coord.find_nearby(center, Some(5.0), filter).await?;
    Ok(found.iter().map(|r| (r.record.technician.id, r.distance_km)).collect())
}

#[tokio::test]
async fn range_and_scan_strategies_agree_on_database() -> Result<()> {
    let Some(db) = get_db().await else { return Ok(()) };
    let tag = format!("geo{}", Uuid::new_v4().simple());
    let (center, expected) = seed_ring(&db, &tag).await?;

    let source = Arc::new(SeaOrmTechnicianGeoSource::new(db.clone(), false));
    let filter = TechnicianFilter::new(Some(tag.clone()), None)?;
    for strategy in [SearchStrategy::BoundingBox, SearchStrategy::FullScan] {
        let found = nearby_ids(&source, strategy, center, &filter).await?;
        let got: Vec<Uuid> = found.iter().map(|(id, _)| *id).collect();
        assert_eq!(got, expected, "{strategy}");
        assert!((found[0].1 - 1.0).abs() < 1e-3);
    }
    Ok(())
}

#[tokio::test]
async fn postgis_matches_bounding_box_when_installed() -> Result<()> {
    let Some(db) = get_db().await else { return Ok(()) };
    let source = Arc::new(SeaOrmTechnicianGeoSource::probe(db.clone()).await?);
    if !source.capabilities().spatial_query {
        eprintln!("skip: postgis not installed");
        return Ok(());
    }
    let tag = format!("gis{}", Uuid::new_v4().simple());
    let (center, expected) = seed_ring(&db, &tag).await?;
    let filter = TechnicianFilter::new(Some(tag.clone()), None)?;

    let native = nearby_ids(&source, SearchStrategy::SpatialIndex, center, &filter).await?;
    let bbox = nearby_ids(&source, SearchStrategy::BoundingBox, center, &filter).await?;
    let native_ids: Vec<Uuid> = native.iter().map(|(id, _)| *id).collect();
    assert_eq!(native_ids, expected);
    assert_eq!(native_ids, bbox.iter().map(|(id, _)| *id).collect::<Vec<_>>());
    for ((_, a), (_, b)) in native.iter().zip(&bbox) {
        assert!((a - b).abs() < 1e-3, "{a} vs {b}");
    }
    Ok(())
}

#[tokio::test]
async fn review_and_bookmark_pages_embed_related_records() -> Result<()> {
    let Some(db) = get_db().await else { return Ok(()) };
    let tag = format!("rel{}", Uuid::new_v4().simple());
    let author = user::create(&db, &format!("{tag}_author@example.com"), "Author", "One", None).await?;
    let t = seed_technician(&db, &tag, 0).await?;
    for n in 0..3 {
        review::create(&db, author.id, t.id, 3 + n, Some(&format!("{tag} visit {n}"))).await?;
    }
    bookmark::create(&db, author.id, t.id).await?;

    let reviews = PaginatedQueryExecutor::new(
        Arc::new(EmbeddingRecordSource::<ReviewWithParties>::new(db.clone())),
        PageLimits::default(),
    );
    let filter = ReviewFilter::new(Some(tag.clone()), None, None).condition();
    let p1 = reviews.list_page(&PageRequest::first(filter.clone(), Some(2))).await?;
    assert_eq!(p1.total_count, 3);
    assert!(p1.has_next_page);
    let p2 = reviews.list_page(&PageRequest::after(p1.next_cursor.clone().unwrap(), filter, Some(2))).await?;
    let all: Vec<&ReviewWithParties> = p1.items.iter().chain(p2.items.iter()).collect();
    assert_eq!(all.len(), 3);
    assert_eq!(all.iter().map(|r| r.review.rating).collect::<Vec<_>>(), vec![5, 4, 3]);
    for r in &all {
        assert_eq!(r.user.as_ref().map(|u| u.id), Some(author.id));
        assert_eq!(r.technician.as_ref().map(|x| x.id), Some(t.id));
    }

    let bookmarks = PaginatedQueryExecutor::new(
        Arc::new(EmbeddingRecordSource::<BookmarkWithTechnician>::new(db.clone())),
        PageLimits::default(),
    );
    let page = bookmarks
        .list_page(&PageRequest::first(BookmarkFilter::new(author.id, None).condition(), None))
        .await?;
    assert_eq!(page.items.len(), 1);
    let embedded = page.items[0].technician.as_ref().expect("technician embedded");
    assert_eq!(embedded.technician.id, t.id);
    assert_eq!(embedded.user.as_ref().map(|u| u.id), Some(t.user_id));
    Ok(())
}
