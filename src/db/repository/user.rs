use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use sqlx::SqlitePool;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// User Repository
// ============================================================================

pub struct UserRepository;

fn user_from_row(r: &SqliteRow) -> AppResult<User> {
    let role: String = r.get("role");
    let role = role.parse::<Role>().map_err(|e| {
        tracing::warn!("User row has an unreadable role: {}", e);
        AppError::Internal(anyhow::anyhow!(e))
    })?;

    Ok(User {
        id: r.get("id"),
        display_name: r.get("display_name"),
        role,
        lang: r.get("lang"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

impl UserRepository {
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, display_name, role, lang, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Create or replace the profile for `user.id`, keeping the original
    /// creation time.
    pub async fn upsert(pool: &SqlitePool, user: UpsertUser) -> AppResult<User> {
        let now = Utc::now().naive_utc();

        let row = sqlx::query(
            r#"
            INSERT INTO users (id, display_name, role, lang, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                display_name = excluded.display_name,
                role = excluded.role,
                lang = excluded.lang,
                updated_at = excluded.updated_at
            RETURNING id, display_name, role, lang, created_at, updated_at
            "#,
        )
        .bind(&user.id)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(&user.lang)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        user_from_row(&row)
    }

    /// All users holding `role`, oldest account first.
    pub async fn find_by_role(pool: &SqlitePool, role: Role) -> AppResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, display_name, role, lang, created_at, updated_at
            FROM users
            WHERE role = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(role.as_str())
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        rows.iter().map(user_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn profile(id: &str, name: &str, role: Role) -> UpsertUser {
        UpsertUser {
            id: id.to_string(),
            display_name: name.to_string(),
            role,
            lang: None,
        }
    }

    #[tokio::test]
    async fn upsert_creates_then_updates() {
        let pool = test_pool().await;

        let created = UserRepository::upsert(&pool, profile("u1", "Thandi", Role::Student))
            .await
            .unwrap();
        assert_eq!(created.role, Role::Student);

        let updated = UserRepository::upsert(
            &pool,
            UpsertUser {
                lang: Some("af".to_string()),
                ..profile("u1", "Thandi M.", Role::Student)
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.display_name, "Thandi M.");
        assert_eq!(updated.lang.as_deref(), Some("af"));
        assert_eq!(updated.created_at, created.created_at);

        let found = UserRepository::find_by_id(&pool, "u1").await.unwrap();
        assert_eq!(found.map(|u| u.display_name), Some("Thandi M.".to_string()));
        assert!(UserRepository::find_by_id(&pool, "nope")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn find_by_role_filters() {
        let pool = test_pool().await;
        UserRepository::upsert(&pool, profile("s1", "A", Role::Student))
            .await
            .unwrap();
        UserRepository::upsert(&pool, profile("c1", "Acme", Role::Company))
            .await
            .unwrap();
        UserRepository::upsert(&pool, profile("s2", "B", Role::Student))
            .await
            .unwrap();

        let students = UserRepository::find_by_role(&pool, Role::Student)
            .await
            .unwrap();
        let ids: Vec<&str> = students.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"s1") && ids.contains(&"s2"));
    }
}
