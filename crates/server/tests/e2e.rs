use std::net::SocketAddr;

use axum::Router;
use migration::MigratorTrait;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::Value;
use tokio::net::TcpListener;
use uuid::Uuid;

use configs::{DiscoveryConfig, PaginationConfig};
use models::{bookmark, location, review, service_category, technician, user};
use server::{routes, state::ServerState};
use service::Marketplace;

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

struct TestApp {
    base_url: String,
    db: sea_orm::DatabaseConnection,
}

async fn start_server() -> anyhow::Result<Option<TestApp>> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(None);
    }
    let _ = dotenvy::dotenv();
    let db = match models::db::connect_from_env().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return Ok(None);
        }
    };
    migration::Migrator::up(&db, None).await?;

    let marketplace = Marketplace::connect(db.clone(), PaginationConfig::default(), DiscoveryConfig::default()).await;
    let app: Router = routes::build_router(ServerState::new(marketplace), cors());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(Some(TestApp { base_url, db }))
}

async fn get_json(url: String) -> anyhow::Result<(HttpStatusCode, Value)> {
    let res = reqwest::get(url).await?;
    let status = res.status();
    Ok((status, res.json().await?))
}

#[tokio::test]
async fn e2e_technician_pages_and_nearby() -> anyhow::Result<()> {
    let Some(app) = start_server().await? else { return Ok(()) };
    let tag = format!("e2e{}", Uuid::new_v4().simple());
    let (lat, lng) = (6.5244, 3.3792);
    let mut nearest = None;
    for n in 0..3 {
        let u = user::create(&app.db, &format!("{tag}_{n}@example.com"), "Ngozi", "Eze", None).await?;
        let t = technician::create(&app.db, u.id, &format!("{tag} welder"), None, None).await?;
        // 0, 1 and 2 hundredths of a degree north: about 0, 1.1 and 2.2 km
        location::upsert(&app.db, t.id, lat + 0.01 * n as f64, lng).await?;
        if n == 0 {
            nearest = Some(t.id);
        }
    }

    let (status, p1) = get_json(format!("{}/api/technicians?filter={tag}&limit=2", app.base_url)).await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(p1["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(p1["total_count"], 3);
    assert_eq!(p1["has_next_page"], true);
    let cursor = p1["next_cursor"].as_str().unwrap_or_default().to_string();

    let (_, p2) = get_json(format!("{}/api/technicians?filter={tag}&limit=2&cursor={cursor}", app.base_url)).await?;
    assert_eq!(p2["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(p2["has_next_page"], false);
    assert!(p2["next_cursor"].is_null());

    let (_, off) = get_json(format!("{}/api/technicians/offset?filter={tag}&skip=1&take=2", app.base_url)).await?;
    assert_eq!(off["has_next_page"], false);
    assert!(off.get("next_skip").is_none());

    let (status, near) =
        get_json(format!("{}/api/technicians/nearby?lat={lat}&lng={lng}&radius_km=2&filter={tag}", app.base_url)).await?;
    assert_eq!(status, HttpStatusCode::OK);
    let near = near.as_array().cloned().unwrap_or_default();
    assert_eq!(near.len(), 2);
    assert_eq!(near[0]["record"]["id"], nearest.map(|id| id.to_string()).unwrap_or_default());
    assert!(near[0]["distance_km"].as_f64() <= near[1]["distance_km"].as_f64());
    Ok(())
}

#[tokio::test]
async fn e2e_bookmarks_and_categories() -> anyhow::Result<()> {
    let Some(app) = start_server().await? else { return Ok(()) };
    let tag = format!("e2e{}", Uuid::new_v4().simple());
    let owner = user::create(&app.db, &format!("{tag}_owner@example.com"), "Ife", "Ade", None).await?;
    for n in 0..3 {
        let u = user::create(&app.db, &format!("{tag}_{n}@example.com"), "Tunde", "Bello", None).await?;
        let t = technician::create(&app.db, u.id, "Painter", None, None).await?;
        bookmark::create(&app.db, owner.id, t.id).await?;
    }
    service_category::create(&app.db, &format!("{tag} b"), None).await?;
    service_category::create(&app.db, &format!("{tag} a"), None).await?;

    let (status, marks) =
        get_json(format!("{}/api/users/{}/bookmarks/offset?page=1&page_size=2", app.base_url, owner.id)).await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(marks["total_count"], 3);
    assert_eq!(marks["next_skip"], 2);
    let first = &marks["items"][0];
    assert_eq!(first["user_id"], owner.id.to_string());
    assert_eq!(first["technician"]["profession"], "Painter");
    assert_eq!(first["technician"]["user"]["last_name"], "Bello");

    let (status, body) = get_json(format!("{}/api/users/{}/bookmarks", app.base_url, Uuid::new_v4())).await?;
    assert_eq!(status, HttpStatusCode::NOT_FOUND);
    assert_eq!(body["code"], 2005);

    let (_, cats) = get_json(format!("{}/api/service-categories?filter={tag}", app.base_url)).await?;
    assert_eq!(cats["items"][0]["name"], format!("{tag} a"));
    assert_eq!(cats["items"][1]["name"], format!("{tag} b"));
    Ok(())
}

#[tokio::test]
async fn e2e_reviews_embed_author_and_technician() -> anyhow::Result<()> {
    let Some(app) = start_server().await? else { return Ok(()) };
    let tag = format!("e2e{}", Uuid::new_v4().simple());
    let author = user::create(&app.db, &format!("{tag}_author@example.com"), "Kemi", "Ola", None).await?;
    let owner = user::create(&app.db, &format!("{tag}_tech@example.com"), "Sola", "Ade", None).await?;
    let t = technician::create(&app.db, owner.id, "Tiler", None, None).await?;
    let written = review::create(&app.db, author.id, t.id, 4, Some(&format!("{tag} neat work"))).await?;

    let (status, page) = get_json(format!("{}/api/reviews?filter={tag}", app.base_url)).await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(page["total_count"], 1);
    let item = &page["items"][0];
    assert_eq!(item["id"], written.id.to_string());
    assert_eq!(item["rating"], 4);
    assert_eq!(item["user"]["email"], author.email);
    assert_eq!(item["technician"]["id"], t.id.to_string());
    Ok(())
}
