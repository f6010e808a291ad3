use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ItemId, Money, MovementId};
use sqlx::{PgPool, Postgres, Row, postgres::PgRow, query::Query};
use uuid::Uuid;

use crate::{
    LedgerError, MovementQuery, MovementType, Result, StockMovement,
    store::{MovementStore, MovementStream, validate_movement},
};

const STREAM_PAGE_SIZE: i64 = 500;

const SELECT_COLUMNS: &str = "SELECT seq, id, inventory_item_id, movement_type, quantity, previous_quantity, new_quantity, reference_type, reference_id, reason, notes, unit_cost_cents, total_cost_cents, actor, movement_date FROM stock_movements";

/// PostgreSQL-backed movement store.
///
/// Ledger order is the `seq` column, assigned on insert.
#[derive(Clone)]
pub struct PostgresMovementStore {
    pool: PgPool,
}

impl PostgresMovementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_movement(row: PgRow) -> Result<StockMovement> {
        let movement_type: String = row.try_get("movement_type")?;

        Ok(StockMovement {
            id: MovementId::from_uuid(row.try_get::<Uuid, _>("id")?),
            inventory_item_id: ItemId::from_uuid(row.try_get::<Uuid, _>("inventory_item_id")?),
            movement_type: movement_type.parse::<MovementType>()?,
            quantity: row.try_get("quantity")?,
            previous_quantity: row.try_get("previous_quantity")?,
            new_quantity: row.try_get("new_quantity")?,
            reference_type: row.try_get("reference_type")?,
            reference_id: row.try_get("reference_id")?,
            reason: row.try_get("reason")?,
            notes: row.try_get("notes")?,
            unit_cost: Money::from_cents(row.try_get("unit_cost_cents")?),
            total_cost: Money::from_cents(row.try_get("total_cost_cents")?),
            actor: row.try_get("actor")?,
            movement_date: row.try_get::<DateTime<Utc>, _>("movement_date")?,
        })
    }

    /// Appends the WHERE clause for a query's filters.
    fn push_filters(sql: &mut String, query: &MovementQuery, param_count: &mut usize) {
        sql.push_str(" WHERE 1=1");
        if query.item_id.is_some() {
            *param_count += 1;
            sql.push_str(&format!(" AND inventory_item_id = ${param_count}"));
        }
        if query.movement_types.is_some() {
            *param_count += 1;
            sql.push_str(&format!(" AND movement_type = ANY(${param_count})"));
        }
        if query.reference_type.is_some() {
            *param_count += 1;
            sql.push_str(&format!(" AND reference_type = ${param_count}"));
        }
        if query.reference_id.is_some() {
            *param_count += 1;
            sql.push_str(&format!(" AND reference_id = ${param_count}"));
        }
        if query.from_date.is_some() {
            *param_count += 1;
            sql.push_str(&format!(" AND movement_date >= ${param_count}"));
        }
        if query.to_date.is_some() {
            *param_count += 1;
            sql.push_str(&format!(" AND movement_date <= ${param_count}"));
        }
    }

    /// Binds filter parameters in the same order `push_filters` numbered them.
    fn bind_filters<'q>(
        mut sqlx_query: Query<'q, Postgres, sqlx::postgres::PgArguments>,
        query: &MovementQuery,
    ) -> Query<'q, Postgres, sqlx::postgres::PgArguments> {
        if let Some(id) = query.item_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(ref types) = query.movement_types {
            let names: Vec<String> = types.iter().map(|t| t.as_str().to_string()).collect();
            sqlx_query = sqlx_query.bind(names);
        }
        if let Some(ref reference_type) = query.reference_type {
            sqlx_query = sqlx_query.bind(reference_type.clone());
        }
        if let Some(reference_id) = query.reference_id {
            sqlx_query = sqlx_query.bind(reference_id);
        }
        if let Some(from) = query.from_date {
            sqlx_query = sqlx_query.bind(from);
        }
        if let Some(to) = query.to_date {
            sqlx_query = sqlx_query.bind(to);
        }
        sqlx_query
    }
}

#[async_trait]
impl MovementStore for PostgresMovementStore {
    async fn record(&self, movement: StockMovement) -> Result<MovementId> {
        validate_movement(&movement)?;

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, inventory_item_id, movement_type, quantity, previous_quantity, new_quantity,
                reference_type, reference_id, reason, notes, unit_cost_cents, total_cost_cents,
                actor, movement_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(movement.id.as_uuid())
        .bind(movement.inventory_item_id.as_uuid())
        .bind(movement.movement_type.as_str())
        .bind(movement.quantity)
        .bind(movement.previous_quantity)
        .bind(movement.new_quantity)
        .bind(&movement.reference_type)
        .bind(movement.reference_id)
        .bind(&movement.reason)
        .bind(&movement.notes)
        .bind(movement.unit_cost.cents())
        .bind(movement.total_cost.cents())
        .bind(&movement.actor)
        .bind(movement.movement_date)
        .execute(&self.pool)
        .await?;

        metrics::counter!("ledger_movements_recorded_total").increment(1);
        Ok(movement.id)
    }

    async fn get(&self, id: MovementId) -> Result<Option<StockMovement>> {
        let row: Option<PgRow> = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_movement).transpose()
    }

    async fn movements_for_item(&self, item_id: ItemId) -> Result<Vec<StockMovement>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE inventory_item_id = $1 ORDER BY seq ASC"
        ))
        .bind(item_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_movement).collect()
    }

    async fn query(&self, query: MovementQuery) -> Result<Vec<StockMovement>> {
        let mut sql = String::from(SELECT_COLUMNS);
        let mut param_count = 0;
        Self::push_filters(&mut sql, &query, &mut param_count);

        if query.newest_first {
            sql.push_str(" ORDER BY seq DESC");
        } else {
            sql.push_str(" ORDER BY seq ASC");
        }

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = Self::bind_filters(sqlx::query(&sql), &query);
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_movement).collect()
    }

    async fn count(&self, query: MovementQuery) -> Result<u64> {
        let mut sql = String::from("SELECT COUNT(*) AS total FROM stock_movements");
        let mut param_count = 0;
        Self::push_filters(&mut sql, &query, &mut param_count);

        let row = Self::bind_filters(sqlx::query(&sql), &query)
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get("total")?;
        Ok(total as u64)
    }

    async fn stream_all(&self) -> Result<MovementStream> {
        use futures_util::{StreamExt, stream};

        // Keyset pagination over seq so the stream owns its pool handle.
        let pool = self.pool.clone();
        let pages = stream::unfold(Some(0_i64), move |cursor| {
            let pool = pool.clone();
            async move {
                let after = cursor?;
                let rows = match sqlx::query(&format!(
                    "{SELECT_COLUMNS} WHERE seq > $1 ORDER BY seq ASC LIMIT $2"
                ))
                .bind(after)
                .bind(STREAM_PAGE_SIZE)
                .fetch_all(&pool)
                .await
                {
                    Ok(rows) => rows,
                    Err(e) => return Some((vec![Err(LedgerError::Database(e))], None)),
                };

                let next = if (rows.len() as i64) < STREAM_PAGE_SIZE {
                    None
                } else {
                    rows.last().and_then(|row| row.try_get::<i64, _>("seq").ok())
                };
                let batch: Vec<_> = rows
                    .into_iter()
                    .map(PostgresMovementStore::row_to_movement)
                    .collect();
                if batch.is_empty() {
                    return None;
                }
                Some((batch, next))
            }
        });

        Ok(Box::pin(pages.flat_map(stream::iter)))
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM stock_movements WHERE movement_date < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        tracing::info!(purged = result.rows_affected(), %cutoff, "Purged movements");
        Ok(result.rows_affected())
    }
}
