// SPDX-License-Identifier: MIT OR Apache-2.0

use sqlx::{FromRow, query, query_as};

use crate::sqlite::{SqliteError, SqliteStore};
use crate::{HierarchyStore, HierarchyWriter, Slug, Unit, UnitId, UnitKind};

/// A single unit row as it is queried from the database.
#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
struct UnitRow {
    id: String,
    slug: String,
    name: Option<String>,
    superior_id: Option<String>,
}

impl From<UnitRow> for Unit {
    fn from(row: UnitRow) -> Self {
        Unit {
            id: row.id.into(),
            slug: row.slug.into(),
            name: row.name,
            superior_id: row.superior_id.map(UnitId::from),
        }
    }
}

/// Both hierarchies share the same schema but live in separate tables.
fn table(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Billet => "billets_v1",
        UnitKind::Position => "positions_v1",
    }
}

impl HierarchyStore for SqliteStore {
    type Error = SqliteError;

    async fn find_unit_by_slug(
        &self,
        slug: &Slug,
        kind: UnitKind,
    ) -> Result<Option<Unit>, Self::Error> {
        let row = query_as::<_, UnitRow>(&format!(
            "
            SELECT
                id,
                slug,
                name,
                superior_id
            FROM
                {}
            WHERE
                slug = ?
            ",
            table(kind)
        ))
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Unit::from))
    }

    async fn find_subordinates(
        &self,
        unit_id: &UnitId,
        kind: UnitKind,
    ) -> Result<Vec<Unit>, Self::Error> {
        let rows = query_as::<_, UnitRow>(&format!(
            "
            SELECT
                id,
                slug,
                name,
                superior_id
            FROM
                {}
            WHERE
                superior_id = ?
            ORDER BY
                slug
            ",
            table(kind)
        ))
        .bind(unit_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Unit::from).collect())
    }

    async fn list_units(&self, kind: UnitKind) -> Result<Vec<Unit>, Self::Error> {
        let rows = query_as::<_, UnitRow>(&format!(
            "
            SELECT
                id,
                slug,
                name,
                superior_id
            FROM
                {}
            ORDER BY
                slug
            ",
            table(kind)
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Unit::from).collect())
    }
}

impl HierarchyWriter for SqliteStore {
    async fn insert_unit(&self, kind: UnitKind, unit: &Unit) -> Result<bool, Self::Error> {
        let result = query(&format!(
            "
            INSERT OR IGNORE
            INTO
                {} (
                    id,
                    slug,
                    name,
                    superior_id
                )
            VALUES
                (?, ?, ?, ?)
            ",
            table(kind)
        ))
        .bind(unit.id.as_str())
        .bind(unit.slug.as_str())
        .bind(unit.name.as_deref())
        .bind(unit.superior_id.as_ref().map(UnitId::as_str))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_superior(
        &self,
        kind: UnitKind,
        unit_id: &UnitId,
        superior_id: Option<&UnitId>,
    ) -> Result<bool, Self::Error> {
        let result = query(&format!(
            "
            UPDATE
                {}
            SET
                superior_id = ?
            WHERE
                id = ?
            ",
            table(kind)
        ))
        .bind(superior_id.map(UnitId::as_str))
        .bind(unit_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_slug(
        &self,
        kind: UnitKind,
        unit_id: &UnitId,
        slug: &Slug,
    ) -> Result<bool, Self::Error> {
        // A slug collision violates the UNIQUE constraint, the row is then skipped instead of
        // failing the statement.
        let result = query(&format!(
            "
            UPDATE OR IGNORE
                {}
            SET
                slug = ?
            WHERE
                id = ?
            ",
            table(kind)
        ))
        .bind(slug.as_str())
        .bind(unit_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_unit(&self, kind: UnitKind, unit_id: &UnitId) -> Result<bool, Self::Error> {
        // Start a transaction.
        //
        // Any changes after this point, and before `commit()`, will be rolled back in the event of
        // an error.
        let mut tx = self.pool.begin().await?;

        query(&format!(
            "
            UPDATE
                {}
            SET
                superior_id = NULL
            WHERE
                superior_id = ?
            ",
            table(kind)
        ))
        .bind(unit_id.as_str())
        .execute(&mut *tx)
        .await?;

        let result = query(&format!(
            "
            DELETE FROM
                {}
            WHERE
                id = ?
            ",
            table(kind)
        ))
        .bind(unit_id.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}
