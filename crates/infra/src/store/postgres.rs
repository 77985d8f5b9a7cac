//! Postgres-backed stores.
//!
//! ## Error mapping
//!
//! | SQLx error | Code | StoreError |
//! |------------|------|------------|
//! | Database (unique violation on `accounts_username_key`) | `23505` | `Duplicate { field: "username" }` |
//! | Database (unique violation on `accounts_email_key`) | `23505` | `Duplicate { field: "email" }` |
//! | Database (other) | any | `Backend` |
//! | PoolTimedOut / PoolClosed / Io / Tls | n/a | `Unavailable` |
//! | Other | n/a | `Backend` |
//!
//! ## Compare-and-swap
//!
//! Item writes are a single `UPDATE ... WHERE id = $1 AND revision = $2`.
//! When no row comes back a follow-up read tells "gone" from "moved on".

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;

use storefront_auth::{Account, NewAccount, Role};
use storefront_core::{AccountId, ItemId, Revision};
use storefront_inventory::{InventoryItem, ItemFields, Price, SearchFilter};

use super::{CredentialStore, InventoryStore, StoreError};

const ITEM_COLUMNS: &str = "id, name, category, price_cents, quantity, image_url, revision";

/// Open a connection pool; `acquire_timeout` bounds how long a call may wait
/// for a free connection.
pub async fn connect(url: &str, acquire_timeout: std::time::Duration) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(acquire_timeout)
        .connect(url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Apply the bundled schema. Idempotent.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(include_str!("../../migrations/0001_init.sql"))
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("migrate", e))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self), err)]
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, roles
            FROM accounts
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_username", e))?;

        row.map(|r| account_from_row(&r)).transpose()
    }

    #[instrument(skip(self), fields(username = %account.username()), err)]
    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError> {
        let id = AccountId::new();
        let roles: Vec<String> = account.roles().iter().map(|r| r.as_str().to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, email, password_hash, roles)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.as_uuid())
        .bind(account.username())
        .bind(account.email())
        .bind(account.password_hash())
        .bind(&roles)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_account", e))?;

        Ok(account.into_account(id))
    }
}

#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_revision(&self, id: ItemId) -> Result<Option<Revision>, StoreError> {
        let revision: Option<i64> =
            sqlx::query_scalar("SELECT revision FROM inventory_items WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("current_revision", e))?;

        revision.map(revision_from_column).transpose()
    }

    /// Explain a CAS write that matched no row.
    async fn missed_write(&self, id: ItemId, expected: Revision) -> StoreError {
        match self.current_revision(id).await {
            Ok(Some(actual)) => StoreError::RevisionMismatch { expected, actual },
            Ok(None) => StoreError::NotFound,
            Err(err) => err,
        }
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(skip(self, fields), err)]
    async fn insert(&self, fields: ItemFields) -> Result<InventoryItem, StoreError> {
        let id = ItemId::new();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO inventory_items (id, name, category, price_cents, quantity, image_url, revision)
            VALUES ($1, $2, $3, $4, $5, $6, 0)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(&fields.name)
        .bind(&fields.category)
        .bind(price_to_column(fields.price)?)
        .bind(i64::from(fields.quantity))
        .bind(&fields.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;

        item_from_row(&row)
    }

    async fn get(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_item", e))?;

        row.map(|r| item_from_row(&r)).transpose()
    }

    async fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;

        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<InventoryItem>, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE TRUE"
        ));

        if let Some(name) = &filter.name {
            query
                .push(" AND name ILIKE ")
                .push_bind(format!("%{}%", escape_like(name)));
        }
        if let Some(category) = &filter.category {
            query
                .push(" AND lower(category) = lower(")
                .push_bind(category.clone())
                .push(")");
        }
        if let Some(min) = filter.min_price {
            query.push(" AND price_cents >= ").push_bind(price_to_column(min)?);
        }
        if let Some(max) = filter.max_price {
            query.push(" AND price_cents <= ").push_bind(price_to_column(max)?);
        }
        query.push(" ORDER BY id");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("search_items", e))?;

        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self, fields), fields(item_id = %id, expected = %expected), err)]
    async fn update_if_revision(
        &self,
        id: ItemId,
        expected: Revision,
        fields: ItemFields,
    ) -> Result<InventoryItem, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE inventory_items
            SET name = $3, category = $4, price_cents = $5, quantity = $6, image_url = $7,
                revision = revision + 1
            WHERE id = $1 AND revision = $2
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(revision_to_column(expected)?)
        .bind(&fields.name)
        .bind(&fields.category)
        .bind(price_to_column(fields.price)?)
        .bind(i64::from(fields.quantity))
        .bind(&fields.image_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        match row {
            Some(row) => item_from_row(&row),
            None => Err(self.missed_write(id, expected).await),
        }
    }

    #[instrument(skip(self), fields(item_id = %id, expected = %expected), err)]
    async fn delete_if_revision(&self, id: ItemId, expected: Revision) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1 AND revision = $2")
            .bind(id.as_uuid())
            .bind(revision_to_column(expected)?)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(self.missed_write(id, expected).await)
        }
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    let roles: Vec<String> = column(row, "roles")?;
    Ok(Account {
        id: AccountId::from_uuid(column(row, "id")?),
        username: column(row, "username")?,
        email: column(row, "email")?,
        password_hash: column(row, "password_hash")?,
        roles: roles.into_iter().map(Role::new).collect::<BTreeSet<_>>(),
    })
}

fn item_from_row(row: &PgRow) -> Result<InventoryItem, StoreError> {
    let price_cents: i64 = column(row, "price_cents")?;
    let quantity: i64 = column(row, "quantity")?;
    let revision: i64 = column(row, "revision")?;

    let fields = ItemFields {
        name: column(row, "name")?,
        category: column(row, "category")?,
        price: Price::from_minor_units(
            u64::try_from(price_cents)
                .map_err(|_| StoreError::Backend(format!("negative price_cents {price_cents}")))?,
        ),
        quantity: u32::try_from(quantity)
            .map_err(|_| StoreError::Backend(format!("quantity {quantity} out of range")))?,
        image_url: column(row, "image_url")?,
    };

    Ok(InventoryItem::new(
        ItemId::from_uuid(column(row, "id")?),
        fields,
        revision_from_column(revision)?,
    ))
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Backend(format!("failed to decode column '{name}': {e}")))
}

fn price_to_column(price: Price) -> Result<i64, StoreError> {
    i64::try_from(price.minor_units())
        .map_err(|_| StoreError::Backend(format!("price {price} exceeds column range")))
}

fn revision_to_column(revision: Revision) -> Result<i64, StoreError> {
    i64::try_from(revision.value())
        .map_err(|_| StoreError::Backend(format!("revision {revision} exceeds column range")))
}

fn revision_from_column(value: i64) -> Result<Revision, StoreError> {
    u64::try_from(value)
        .map(Revision::new)
        .map_err(|_| StoreError::Backend(format!("negative revision {value}")))
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                match db_err.constraint() {
                    Some("accounts_username_key") => {
                        return StoreError::Duplicate { field: "username" };
                    }
                    Some("accounts_email_key") => return StoreError::Duplicate { field: "email" },
                    _ => {}
                }
            }
            StoreError::Backend(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {operation}: {e}")),
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("ladoo"), "ladoo");
    }

    #[test]
    fn pool_failures_are_unavailable() {
        assert!(matches!(
            map_sqlx_error("op", sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error("op", sqlx::Error::RowNotFound),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn negative_revision_column_is_rejected() {
        assert!(revision_from_column(-1).is_err());
        assert_eq!(revision_from_column(3).unwrap(), Revision::new(3));
    }
}
