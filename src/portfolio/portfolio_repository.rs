use diesel::prelude::*;
use std::sync::Arc;

use super::portfolio_model::{PortfolioSnapshot, PortfolioSnapshotDB};
use super::portfolio_traits::SnapshotRepositoryTrait;
use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::portfolio_snapshots;

/// Diesel/SQLite implementation of the snapshot store.
pub struct SnapshotRepository {
    pool: Arc<DbPool>,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl SnapshotRepositoryTrait for SnapshotRepository {
    fn upsert_snapshot(&self, snapshot: &PortfolioSnapshot) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::replace_into(portfolio_snapshots::table)
            .values(PortfolioSnapshotDB::from(snapshot))
            .execute(&mut conn)?;

        Ok(())
    }

    fn list_snapshots(&self) -> Result<Vec<PortfolioSnapshot>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = portfolio_snapshots::table
            .select(PortfolioSnapshotDB::as_select())
            .order(portfolio_snapshots::snapshot_date.asc())
            .load::<PortfolioSnapshotDB>(&mut conn)?;

        Ok(rows.into_iter().map(PortfolioSnapshot::from).collect())
    }
}
