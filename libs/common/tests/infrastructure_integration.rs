//! Schema check against a live PostgreSQL instance
//!
//! Applies the clinic migrations and verifies the tables the session and
//! check-in code relies on. Run with `cargo test -- --ignored`.

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use sqlx::migrate::Migrator;
use std::path::Path;

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_clinic_schema_is_migrated() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::from_env()?).await?;
    assert!(health_check(&pool).await?);

    let migrations = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../services/clinic/migrations");
    let migrator = Migrator::new(migrations).await?;

    // Applying twice is a no-op
    run_migrations(&pool, &migrator).await?;
    run_migrations(&pool, &migrator).await?;

    for table in ["users", "sessions", "system_settings"] {
        let found: Option<String> = sqlx::query_scalar("SELECT to_regclass($1)::text")
            .bind(format!("public.{}", table))
            .fetch_one(&pool)
            .await?;
        assert_eq!(found.as_deref(), Some(table), "missing table {}", table);
    }

    Ok(())
}
