//! Database-backed checks of the actor attribution path. Each test gets a
//! fresh database with migrations applied; run with DATABASE_URL set and
//! `cargo test -- --ignored`.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Acquire, PgPool};

use common::{app_with_pool, seed_user, send, token_for};
use school_api::audit::AuditAttribution;
use school_api::context::{Actor, RequestContext};
use school_api::database::models::{Department, DepartmentPayload};
use school_api::database::{Database, Repository, SessionScope, TransactionHook};
use school_api::types::Role;

fn department(name: &str) -> DepartmentPayload {
    DepartmentPayload {
        name: Some(name.to_string()),
        description: None,
    }
}

async fn last_audit_actor(pool: &PgPool, table: &str) -> Option<String> {
    sqlx::query_scalar::<_, Option<String>>(
        "SELECT actor FROM audit_log WHERE table_name = $1 ORDER BY id DESC LIMIT 1",
    )
    .bind(table)
    .fetch_one(pool)
    .await
    .expect("audit row")
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn write_with_actor_is_attributed(pool: PgPool) -> anyhow::Result<()> {
    let db = Database::new(pool.clone()).with_hook(AuditAttribution::default());
    let ctx = RequestContext::for_actor(Actor::new("alice"));

    let row = Repository::<Department>::new(&db)
        .create(Some(&ctx), &department("Mathematics"))
        .await?;

    assert_eq!(row.updated_by.as_deref(), Some("alice"));
    assert_eq!(last_audit_actor(&pool, "departments").await.as_deref(), Some("alice"));
    Ok(())
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn write_without_context_has_no_actor(pool: PgPool) -> anyhow::Result<()> {
    let db = Database::new(pool.clone()).with_hook(AuditAttribution::default());

    let row = Repository::<Department>::new(&db)
        .create(None, &department("History"))
        .await?;
    assert_eq!(row.updated_by, None);

    let anonymous = RequestContext::anonymous();
    Repository::<Department>::new(&db)
        .update(Some(&anonymous), row.id, &department("World History"))
        .await?;

    assert_eq!(last_audit_actor(&pool, "departments").await, None);
    Ok(())
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn hostile_actor_is_stored_verbatim(pool: PgPool) -> anyhow::Result<()> {
    let actor = "o'brien; DROP TABLE students; --";
    let db = Database::new(pool.clone()).with_hook(AuditAttribution::default());
    let ctx = RequestContext::for_actor(Actor::new(actor));

    let row = Repository::<Department>::new(&db)
        .create(Some(&ctx), &department("Art"))
        .await?;

    assert_eq!(row.updated_by.as_deref(), Some(actor));
    let students: i64 = sqlx::query_scalar("SELECT count(*) FROM students").fetch_one(&pool).await?;
    assert_eq!(students, 0);
    Ok(())
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn failed_attribution_does_not_block_the_write(pool: PgPool) -> anyhow::Result<()> {
    // Custom settings need a dotted name; this one is rejected by the server
    let db = Database::new(pool.clone()).with_hook(AuditAttribution::new("not_a_setting"));
    let ctx = RequestContext::for_actor(Actor::new("alice"));

    let row = Repository::<Department>::new(&db)
        .create(Some(&ctx), &department("Music"))
        .await?;

    assert_eq!(row.updated_by, None);
    let stored: i64 = sqlx::query_scalar("SELECT count(*) FROM departments WHERE name = 'Music'")
        .fetch_one(&pool)
        .await?;
    assert_eq!(stored, 1);
    Ok(())
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn attribution_does_not_leak_to_the_next_transaction(pool: PgPool) -> anyhow::Result<()> {
    // One connection, so the second transaction reuses the first one's session
    let single = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(pool.connect_options().as_ref().clone())
        .await?;
    let db = Database::new(single.clone()).with_hook(AuditAttribution::default());

    let alice = RequestContext::for_actor(Actor::new("alice"));
    Repository::<Department>::new(&db)
        .create(Some(&alice), &department("Biology"))
        .await?;

    let row = Repository::<Department>::new(&db)
        .create(None, &department("Chemistry"))
        .await?;

    assert_eq!(row.updated_by, None);
    let leftover: Option<String> = sqlx::query_scalar("SELECT nullif(current_setting('app.audit_user', true), '')")
        .fetch_one(&single)
        .await?;
    assert_eq!(leftover, None);
    Ok(())
}

struct CountingHook(Arc<AtomicUsize>);

#[async_trait]
impl TransactionHook for CountingHook {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn after_begin(&self, _scope: &mut dyn SessionScope, _ctx: Option<&RequestContext>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn hooks_fire_once_per_transaction_not_per_savepoint(pool: PgPool) -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let db = Database::new(pool.clone())
        .with_hook(AuditAttribution::default())
        .with_hook(CountingHook(calls.clone()));
    let ctx = RequestContext::for_actor(Actor::new("alice"));

    let mut tx = db.begin(Some(&ctx)).await?;
    {
        let mut savepoint = tx.begin().await?;
        sqlx::query("INSERT INTO departments (name) VALUES ('Drama')")
            .execute(&mut *savepoint)
            .await?;
        savepoint.commit().await?;
    }
    tx.commit().await?;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // The savepoint's write still sees the outer transaction's actor
    assert_eq!(last_audit_actor(&pool, "departments").await.as_deref(), Some("alice"));
    Ok(())
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn authenticated_request_records_the_caller(pool: PgPool) -> anyhow::Result<()> {
    let alice_id = seed_user(&pool, "alice", "wonderland", Role::Staff).await;
    let app = app_with_pool(pool.clone());
    let token = token_for("alice", alice_id, Role::Staff);

    let (status, body) = send(&app, Method::POST, "/api/departments", Some(&token), Some(json!({ "name": "Geography" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["updated_by"], "alice");

    let id = body["data"]["id"].as_i64().unwrap();
    let admin_token = token_for("root", 999, Role::Admin);
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/audit?table=departments&row_id={}", id),
        Some(&admin_token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["actor"], "alice");
    assert_eq!(body["data"][0]["action"], "INSERT");
    Ok(())
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn create_class_succeeds_when_attribution_fails(pool: PgPool) -> anyhow::Result<()> {
    let db = Database::new(pool.clone()).with_hook(AuditAttribution::new("not_a_setting"));
    let config = school_api::config::config();
    let app = school_api::app::router(school_api::app::AppState::new(db, config), config);
    let token = token_for("alice", 1, Role::Staff);

    let department_id: i32 = sqlx::query_scalar("INSERT INTO departments (name) VALUES ('Maths') RETURNING id")
        .fetch_one(&pool)
        .await?;
    let subject_id: i32 = sqlx::query_scalar(
        "INSERT INTO subjects (department_id, name, code) VALUES ($1, 'Algebra', 'ALG') RETURNING id",
    )
    .bind(department_id)
    .fetch_one(&pool)
    .await?;
    let year_id: i32 = sqlx::query_scalar(
        "INSERT INTO school_years (name, starts_on, ends_on) VALUES ('2024', '2024-09-01', '2025-06-30') RETURNING id",
    )
    .fetch_one(&pool)
    .await?;
    let term_id: i32 = sqlx::query_scalar(
        "INSERT INTO terms (school_year_id, name, starts_on, ends_on) VALUES ($1, 'Fall', '2024-09-01', '2024-12-20') RETURNING id",
    )
    .bind(year_id)
    .fetch_one(&pool)
    .await?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/classes",
        Some(&token),
        Some(json!({ "subject_id": subject_id, "term_id": term_id, "name": "Algebra I" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Algebra I");
    assert!(body["data"]["updated_by"].is_null());
    Ok(())
}
