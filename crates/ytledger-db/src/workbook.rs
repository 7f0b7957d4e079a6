//! A [`SheetStore`] backed by the `sheets` table.
//!
//! Each sheet is one JSONB document holding the serialized [`Sheet`]. Every
//! mutating primitive loads the document under a row lock, applies the change
//! in memory and writes it back in the same transaction.

use sqlx::PgPool;
use ytledger_sheet::{
    CellFormat, CellRef, CellValue, ClearMode, GridRange, Sheet, SheetError, SheetStore,
};

use crate::DbError;

#[derive(Debug, Clone)]
pub struct PgWorkbook {
    pool: PgPool,
}

fn backend(e: impl Into<DbError>) -> SheetError {
    SheetError::Backend(Box::new(e.into()))
}

fn decode(name: &str, document: serde_json::Value) -> Result<Sheet, SheetError> {
    serde_json::from_value(document).map_err(|source| {
        backend(DbError::MalformedDocument {
            sheet: name.to_owned(),
            source,
        })
    })
}

fn encode(sheet: &Sheet) -> Result<serde_json::Value, SheetError> {
    serde_json::to_value(sheet).map_err(|source| {
        backend(DbError::MalformedDocument {
            sheet: sheet.name().to_owned(),
            source,
        })
    })
}

impl PgWorkbook {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load(&self, name: &str) -> Result<Sheet, SheetError> {
        let document = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT document FROM sheets WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or_else(|| SheetError::SheetNotFound(name.to_owned()))?;

        decode(name, document)
    }

    async fn mutate<T, F>(&self, name: &str, apply: F) -> Result<T, SheetError>
    where
        F: FnOnce(&mut Sheet) -> Result<T, SheetError> + Send,
        T: Send,
    {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let document = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT document FROM sheets WHERE name = $1 FOR UPDATE",
        )
        .bind(name)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or_else(|| SheetError::SheetNotFound(name.to_owned()))?;

        let mut sheet = decode(name, document)?;
        let output = apply(&mut sheet)?;

        sqlx::query("UPDATE sheets SET document = $1, updated_at = NOW() WHERE name = $2")
            .bind(encode(&sheet)?)
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(output)
    }
}

impl SheetStore for PgWorkbook {
    async fn sheet_names(&self) -> Result<Vec<String>, SheetError> {
        sqlx::query_scalar::<_, String>("SELECT name FROM sheets ORDER BY position, name")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)
    }

    async fn has_sheet(&self, sheet: &str) -> Result<bool, SheetError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM sheets WHERE name = $1)")
            .bind(sheet)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)
    }

    async fn insert_sheet(&mut self, sheet: &str, position: Option<usize>) -> Result<bool, SheetError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let mut names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sheets ORDER BY position, name FOR UPDATE",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;

        if names.iter().any(|n| n == sheet) {
            return Ok(false);
        }

        let at = position.map_or(names.len(), |p| p.min(names.len()));
        names.insert(at, sheet.to_owned());

        sqlx::query("INSERT INTO sheets (name, position, document) VALUES ($1, $2, $3)")
            .bind(sheet)
            .bind(i32::try_from(at).unwrap_or(i32::MAX))
            .bind(encode(&Sheet::new(sheet))?)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        for (position, name) in (0i32..).zip(&names) {
            sqlx::query("UPDATE sheets SET position = $1 WHERE name = $2")
                .bind(position)
                .bind(name)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)?;
        tracing::debug!(sheet, position = at, "created sheet");
        Ok(true)
    }

    async fn delete_sheet(&mut self, sheet: &str) -> Result<bool, SheetError> {
        let result = sqlx::query("DELETE FROM sheets WHERE name = $1")
            .bind(sheet)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn last_row(&self, sheet: &str) -> Result<u32, SheetError> {
        Ok(self.load(sheet).await?.last_row())
    }

    async fn last_column(&self, sheet: &str) -> Result<u32, SheetError> {
        Ok(self.load(sheet).await?.last_column())
    }

    async fn read_range(&self, sheet: &str, range: GridRange) -> Result<Vec<Vec<CellValue>>, SheetError> {
        Ok(self.load(sheet).await?.read_range(&range))
    }

    async fn read_formulas(
        &self,
        sheet: &str,
        range: GridRange,
    ) -> Result<Vec<Vec<Option<String>>>, SheetError> {
        Ok(self.load(sheet).await?.read_formulas(&range))
    }

    async fn write_values(
        &mut self,
        sheet: &str,
        start: CellRef,
        values: Vec<Vec<CellValue>>,
    ) -> Result<(), SheetError> {
        self.mutate(sheet, |s| {
            s.write_values(start, &values);
            Ok(())
        })
        .await
    }

    async fn set_formula(&mut self, sheet: &str, at: CellRef, formula: &str) -> Result<(), SheetError> {
        self.mutate(sheet, |s| {
            s.set_formula(at, formula);
            Ok(())
        })
        .await
    }

    async fn append_row(&mut self, sheet: &str, values: Vec<CellValue>) -> Result<u32, SheetError> {
        self.mutate(sheet, |s| Ok(s.append_row(&values))).await
    }

    async fn sort_range(
        &mut self,
        sheet: &str,
        range: GridRange,
        column: u32,
        ascending: bool,
    ) -> Result<(), SheetError> {
        self.mutate(sheet, |s| s.sort(&range, column, ascending)).await
    }

    async fn clear_range(&mut self, sheet: &str, range: GridRange, mode: ClearMode) -> Result<(), SheetError> {
        self.mutate(sheet, |s| {
            s.clear(&range, mode);
            Ok(())
        })
        .await
    }

    async fn merge_range(&mut self, sheet: &str, range: GridRange) -> Result<(), SheetError> {
        self.mutate(sheet, |s| s.merge(range)).await
    }

    async fn unmerge_range(&mut self, sheet: &str, range: GridRange) -> Result<(), SheetError> {
        self.mutate(sheet, |s| {
            s.unmerge(&range);
            Ok(())
        })
        .await
    }

    async fn format_range(
        &mut self,
        sheet: &str,
        range: GridRange,
        format: CellFormat,
    ) -> Result<(), SheetError> {
        self.mutate(sheet, |s| {
            s.format(&range, &format);
            Ok(())
        })
        .await
    }

    async fn freeze_rows(&mut self, sheet: &str, rows: u32) -> Result<(), SheetError> {
        self.mutate(sheet, |s| {
            s.freeze_rows(rows);
            Ok(())
        })
        .await
    }
}
