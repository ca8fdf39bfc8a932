//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | `StoreError` |
//! |------------|-----------------|--------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (foreign key violation) | `23503` | `Integrity` |
//! | Database (check constraint violation) | `23514` | `Integrity` |
//! | anything else | | `Backend` |
//!
//! Ledger mutations lock the rows they read with `SELECT ... FOR UPDATE`;
//! idempotency keys take a transaction-scoped advisory lock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use medstock_auth::{Operator, Role};
use medstock_catalog::{Cabinet, Input, InputDraft, Medicine, MedicineDraft, Resident};
use medstock_core::{
    CabinetId, Casela, IdempotencyKey, InputId, MedicineId, MovementId, OperatorId, StockRowId,
};
use medstock_ledger::{
    Direction, ExitMatch, ItemKind, ItemRef, MovementFilter, MovementRecord, MovementType,
    NewMovement, NewStockRow, StockFilter, StockRow, StockType,
};

use super::r#trait::{StockReference, Store, StoreError, StoreTx};

const STOCK_COLUMNS: &str =
    "id, medicine_id, input_id, cabinet_id, quantity, expiry, origin, stock_type, casela";

const MOVEMENT_COLUMNS: &str = "id, movement_type, direction, occurred_at, operator_id, \
     medicine_id, input_id, cabinet_id, quantity, casela, expiry, idempotency_key";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PostgresTx { tx }))
    }
}

struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn insert_medicine(&mut self, draft: &MedicineDraft) -> Result<Medicine, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO medicines (name, dosage, unit, active_substance, minimum_stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.dosage)
        .bind(&draft.unit)
        .bind(&draft.active_substance)
        .bind(draft.minimum_stock)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_medicine", e))?;

        let id: i64 = row.try_get("id").map_err(decode_error)?;
        Ok(draft.clone().into_medicine(MedicineId::new(id)))
    }

    async fn get_medicine(&mut self, id: MedicineId) -> Result<Option<Medicine>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, dosage, unit, active_substance, minimum_stock FROM medicines WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("get_medicine", e))?;
        row.as_ref().map(medicine_from).transpose()
    }

    async fn list_medicines(&mut self) -> Result<Vec<Medicine>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, dosage, unit, active_substance, minimum_stock FROM medicines ORDER BY id",
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_medicines", e))?;
        rows.iter().map(medicine_from).collect()
    }

    async fn update_medicine(&mut self, medicine: &Medicine) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE medicines
            SET name = $2, dosage = $3, unit = $4, active_substance = $5, minimum_stock = $6
            WHERE id = $1
            "#,
        )
        .bind(medicine.id.get())
        .bind(&medicine.name)
        .bind(&medicine.dosage)
        .bind(&medicine.unit)
        .bind(&medicine.active_substance)
        .bind(medicine.minimum_stock)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_medicine", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_medicine(&mut self, id: MedicineId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM medicines WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_medicine", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_input(&mut self, draft: &InputDraft) -> Result<Input, StoreError> {
        let row = sqlx::query(
            "INSERT INTO inputs (name, description, minimum_stock) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.minimum_stock)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_input", e))?;

        let id: i64 = row.try_get("id").map_err(decode_error)?;
        Ok(draft.clone().into_input(InputId::new(id)))
    }

    async fn get_input(&mut self, id: InputId) -> Result<Option<Input>, StoreError> {
        let row = sqlx::query("SELECT id, name, description, minimum_stock FROM inputs WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("get_input", e))?;
        row.as_ref().map(input_from).transpose()
    }

    async fn list_inputs(&mut self) -> Result<Vec<Input>, StoreError> {
        let rows = sqlx::query("SELECT id, name, description, minimum_stock FROM inputs ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list_inputs", e))?;
        rows.iter().map(input_from).collect()
    }

    async fn update_input(&mut self, input: &Input) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE inputs SET name = $2, description = $3, minimum_stock = $4 WHERE id = $1",
        )
        .bind(input.id.get())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.minimum_stock)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_input", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_input(&mut self, id: InputId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM inputs WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_input", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_cabinet(&mut self, cabinet: &Cabinet) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO cabinets (id, category) VALUES ($1, $2)")
            .bind(cabinet.id.get())
            .bind(&cabinet.category)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_cabinet", e))?;
        Ok(())
    }

    async fn get_cabinet(&mut self, id: CabinetId) -> Result<Option<Cabinet>, StoreError> {
        let row = sqlx::query("SELECT id, category FROM cabinets WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("get_cabinet", e))?;
        row.as_ref().map(cabinet_from).transpose()
    }

    async fn list_cabinets(&mut self) -> Result<Vec<Cabinet>, StoreError> {
        let rows = sqlx::query("SELECT id, category FROM cabinets ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list_cabinets", e))?;
        rows.iter().map(cabinet_from).collect()
    }

    async fn update_cabinet(&mut self, cabinet: &Cabinet) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE cabinets SET category = $2 WHERE id = $1")
            .bind(cabinet.id.get())
            .bind(&cabinet.category)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_cabinet", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_cabinet(&mut self, id: CabinetId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cabinets WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_cabinet", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_resident(&mut self, resident: &Resident) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO residents (casela, name) VALUES ($1, $2)")
            .bind(resident.casela.get())
            .bind(&resident.name)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_resident", e))?;
        Ok(())
    }

    async fn get_resident(&mut self, casela: Casela) -> Result<Option<Resident>, StoreError> {
        let row = sqlx::query("SELECT casela, name FROM residents WHERE casela = $1")
            .bind(casela.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("get_resident", e))?;
        row.as_ref().map(resident_from).transpose()
    }

    async fn list_residents(&mut self) -> Result<Vec<Resident>, StoreError> {
        let rows = sqlx::query("SELECT casela, name FROM residents ORDER BY casela")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list_residents", e))?;
        rows.iter().map(resident_from).collect()
    }

    async fn update_resident(&mut self, resident: &Resident) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE residents SET name = $2 WHERE casela = $1")
            .bind(resident.casela.get())
            .bind(&resident.name)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_resident", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_resident(&mut self, casela: Casela) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM residents WHERE casela = $1")
            .bind(casela.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_resident", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_stock_references(&mut self, target: StockReference) -> Result<i64, StoreError> {
        let query = match target {
            StockReference::Medicine(id) => {
                sqlx::query("SELECT COUNT(*) AS n FROM stock_rows WHERE medicine_id = $1").bind(id.get())
            }
            StockReference::Input(id) => {
                sqlx::query("SELECT COUNT(*) AS n FROM stock_rows WHERE input_id = $1").bind(id.get())
            }
            StockReference::Cabinet(id) => {
                sqlx::query("SELECT COUNT(*) AS n FROM stock_rows WHERE cabinet_id = $1").bind(id.get())
            }
            StockReference::Resident(casela) => {
                sqlx::query("SELECT COUNT(*) AS n FROM stock_rows WHERE casela = $1").bind(casela.get())
            }
        };
        let row = query
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("count_stock_references", e))?;
        row.try_get("n").map_err(decode_error)
    }

    #[instrument(skip(self, row), fields(item = %row.item, cabinet = %row.cabinet), err)]
    async fn upsert_stock_row(&mut self, row: &NewStockRow) -> Result<StockRow, StoreError> {
        let (medicine_id, input_id) = item_columns(row.item);
        let sql = format!(
            r#"
            INSERT INTO stock_rows (medicine_id, input_id, cabinet_id, quantity, expiry, origin, stock_type, casela)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT ON CONSTRAINT stock_rows_key
            DO UPDATE SET quantity = stock_rows.quantity + EXCLUDED.quantity
            RETURNING {STOCK_COLUMNS}
            "#
        );
        let stored = sqlx::query(&sql)
            .bind(medicine_id)
            .bind(input_id)
            .bind(row.cabinet.get())
            .bind(row.quantity)
            .bind(row.expiry)
            .bind(&row.origin)
            .bind(row.stock_type.map(StockType::as_str))
            .bind(row.casela.map(Casela::get))
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("upsert_stock_row", e))?;
        stock_row_from(&stored)
    }

    #[instrument(skip(self), err)]
    async fn lock_exit_rows(&mut self, m: &ExitMatch) -> Result<Vec<StockRow>, StoreError> {
        let (medicine_id, input_id) = item_columns(m.item);
        let sql = format!(
            r#"
            SELECT {STOCK_COLUMNS}
            FROM stock_rows
            WHERE medicine_id IS NOT DISTINCT FROM $1::bigint
                AND input_id IS NOT DISTINCT FROM $2::bigint
                AND cabinet_id = $3
                AND casela IS NOT DISTINCT FROM $4::int
            ORDER BY id
            FOR UPDATE
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(medicine_id)
            .bind(input_id)
            .bind(m.cabinet.get())
            .bind(m.casela.map(Casela::get))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_exit_rows", e))?;
        rows.iter().map(stock_row_from).collect()
    }

    #[instrument(skip(self), fields(cabinet = %cabinet), err)]
    async fn lock_cabinet_rows(&mut self, cabinet: CabinetId) -> Result<Vec<StockRow>, StoreError> {
        let sql = format!("SELECT {STOCK_COLUMNS} FROM stock_rows WHERE cabinet_id = $1 ORDER BY id FOR UPDATE");
        let rows = sqlx::query(&sql)
            .bind(cabinet.get())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_cabinet_rows", e))?;
        rows.iter().map(stock_row_from).collect()
    }

    async fn set_stock_quantity(&mut self, id: StockRowId, quantity: i64) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE stock_rows SET quantity = $2 WHERE id = $1")
            .bind(id.get())
            .bind(quantity)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("set_stock_quantity", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(format!("stock row {id} vanished")));
        }
        Ok(())
    }

    async fn delete_stock_rows(&mut self, ids: &[StockRowId]) -> Result<(), StoreError> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        sqlx::query("DELETE FROM stock_rows WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_stock_rows", e))?;
        Ok(())
    }

    async fn list_stock(&mut self, filter: &StockFilter) -> Result<Vec<StockRow>, StoreError> {
        let (medicine_id, input_id) = match filter.item {
            Some(item) => item_columns(item),
            None => (None, None),
        };
        let sql = format!(
            r#"
            SELECT {STOCK_COLUMNS}
            FROM stock_rows
            WHERE ($1::int IS NULL OR cabinet_id = $1)
                AND ($2::text IS NULL
                    OR ($2 = 'medicine' AND medicine_id IS NOT NULL)
                    OR ($2 = 'input' AND input_id IS NOT NULL))
                AND ($3::bigint IS NULL OR medicine_id = $3)
                AND ($4::bigint IS NULL OR input_id = $4)
                AND ($5::int IS NULL OR casela = $5)
                AND ($6::text IS NULL OR stock_type = $6)
                AND (NOT $7::bool OR quantity = 0)
            ORDER BY cabinet_id, id
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(filter.cabinet.map(CabinetId::get))
            .bind(filter.item_kind.map(ItemKind::as_str))
            .bind(medicine_id)
            .bind(input_id)
            .bind(filter.casela.map(Casela::get))
            .bind(filter.stock_type.map(StockType::as_str))
            .bind(filter.zero_quantity)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list_stock", e))?;
        rows.iter().map(stock_row_from).collect()
    }

    #[instrument(skip(self, movement), fields(movement_type = movement.movement_type.as_str(), item = %movement.item), err)]
    async fn insert_movement(&mut self, movement: &NewMovement) -> Result<MovementRecord, StoreError> {
        let (medicine_id, input_id) = item_columns(movement.item);
        let sql = format!(
            r#"
            INSERT INTO movements (
                movement_type, direction, occurred_at, operator_id, medicine_id, input_id,
                cabinet_id, quantity, casela, expiry, idempotency_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {MOVEMENT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(movement.movement_type.as_str())
            .bind(movement.direction.as_str())
            .bind(movement.occurred_at)
            .bind(movement.operator.get())
            .bind(medicine_id)
            .bind(input_id)
            .bind(movement.cabinet.get())
            .bind(movement.quantity)
            .bind(movement.casela.map(Casela::get))
            .bind(movement.expiry)
            .bind(*movement.idempotency_key.as_uuid())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_movement", e))?;
        movement_from(&row)
    }

    async fn list_movements(&mut self, filter: &MovementFilter) -> Result<Vec<MovementRecord>, StoreError> {
        let (medicine_id, input_id) = match filter.item {
            Some(item) => item_columns(item),
            None => (None, None),
        };
        let sql = format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM movements
            WHERE ($1::text IS NULL OR movement_type = $1)
                AND ($2::text IS NULL OR direction = $2)
                AND ($3::bigint IS NULL OR medicine_id = $3)
                AND ($4::bigint IS NULL OR input_id = $4)
                AND ($5::text IS NULL
                    OR ($5 = 'medicine' AND medicine_id IS NOT NULL)
                    OR ($5 = 'input' AND input_id IS NOT NULL))
                AND ($6::int IS NULL OR cabinet_id = $6)
                AND ($7::int IS NULL OR casela = $7)
                AND ($8::timestamptz IS NULL OR occurred_at >= $8)
                AND ($9::timestamptz IS NULL OR occurred_at < $9)
            ORDER BY occurred_at DESC, id DESC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(filter.movement_type.map(MovementType::as_str))
            .bind(filter.direction.map(Direction::as_str))
            .bind(medicine_id)
            .bind(input_id)
            .bind(filter.item_kind.map(ItemKind::as_str))
            .bind(filter.cabinet.map(CabinetId::get))
            .bind(filter.casela.map(Casela::get))
            .bind(filter.from)
            .bind(filter.to)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list_movements", e))?;
        rows.iter().map(movement_from).collect()
    }

    async fn movements_by_key(&mut self, key: IdempotencyKey) -> Result<Vec<MovementRecord>, StoreError> {
        let sql = format!("SELECT {MOVEMENT_COLUMNS} FROM movements WHERE idempotency_key = $1 ORDER BY id");
        let rows = sqlx::query(&sql)
            .bind(*key.as_uuid())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("movements_by_key", e))?;
        rows.iter().map(movement_from).collect()
    }

    async fn lock_idempotency_key(&mut self, key: IdempotencyKey) -> Result<(), StoreError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(key.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_idempotency_key", e))?;
        Ok(())
    }

    async fn insert_operator(
        &mut self,
        login: &str,
        password_hash: &str,
        role: &Role,
    ) -> Result<Operator, StoreError> {
        let row = sqlx::query(
            "INSERT INTO operators (login, password_hash, role) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(login)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_operator", e))?;

        let id: i64 = row.try_get("id").map_err(decode_error)?;
        Ok(Operator {
            id: OperatorId::new(id),
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            role: role.clone(),
        })
    }

    async fn find_operator(&mut self, login: &str) -> Result<Option<Operator>, StoreError> {
        let row = sqlx::query("SELECT id, login, password_hash, role FROM operators WHERE login = $1")
            .bind(login)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_operator", e))?;
        row.as_ref().map(operator_from).transpose()
    }

    async fn count_operators(&mut self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM operators")
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("count_operators", e))?;
        row.try_get("n").map_err(decode_error)
    }

    async fn list_operators(&mut self) -> Result<Vec<Operator>, StoreError> {
        let rows = sqlx::query("SELECT id, login, password_hash, role FROM operators ORDER BY login")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list_operators", e))?;
        rows.iter().map(operator_from).collect()
    }

    #[instrument(skip(self, password_hash), err)]
    async fn set_operator_password(
        &mut self,
        login: &str,
        password_hash: &str,
    ) -> Result<Option<Operator>, StoreError> {
        let row = sqlx::query(
            "UPDATE operators SET password_hash = $2 WHERE login = $1 RETURNING id, login, password_hash, role",
        )
        .bind(login)
        .bind(password_hash)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("set_operator_password", e))?;
        row.as_ref().map(operator_from).transpose()
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn item_columns(item: ItemRef) -> (Option<i64>, Option<i64>) {
    (
        item.medicine_id().map(MedicineId::get),
        item.input_id().map(InputId::get),
    )
}

fn medicine_from(row: &PgRow) -> Result<Medicine, StoreError> {
    Ok(Medicine {
        id: MedicineId::new(row.try_get("id").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
        dosage: row.try_get("dosage").map_err(decode_error)?,
        unit: row.try_get("unit").map_err(decode_error)?,
        active_substance: row.try_get("active_substance").map_err(decode_error)?,
        minimum_stock: row.try_get("minimum_stock").map_err(decode_error)?,
    })
}

fn input_from(row: &PgRow) -> Result<Input, StoreError> {
    Ok(Input {
        id: InputId::new(row.try_get("id").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
        description: row.try_get("description").map_err(decode_error)?,
        minimum_stock: row.try_get("minimum_stock").map_err(decode_error)?,
    })
}

fn cabinet_from(row: &PgRow) -> Result<Cabinet, StoreError> {
    Ok(Cabinet {
        id: CabinetId::new(row.try_get("id").map_err(decode_error)?),
        category: row.try_get("category").map_err(decode_error)?,
    })
}

fn resident_from(row: &PgRow) -> Result<Resident, StoreError> {
    Ok(Resident {
        casela: Casela::new(row.try_get("casela").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
    })
}

fn operator_from(row: &PgRow) -> Result<Operator, StoreError> {
    let role: String = row.try_get("role").map_err(decode_error)?;
    Ok(Operator {
        id: OperatorId::new(row.try_get("id").map_err(decode_error)?),
        login: row.try_get("login").map_err(decode_error)?,
        password_hash: row.try_get("password_hash").map_err(decode_error)?,
        role: Role::new(role),
    })
}

fn stock_row_from(row: &PgRow) -> Result<StockRow, StoreError> {
    let id: i64 = row.try_get("id").map_err(decode_error)?;
    let medicine_id: Option<i64> = row.try_get("medicine_id").map_err(decode_error)?;
    let input_id: Option<i64> = row.try_get("input_id").map_err(decode_error)?;
    let item = ItemRef::from_columns(medicine_id, input_id)
        .ok_or_else(|| StoreError::Decode(format!("stock row {id} does not reference exactly one item")))?;
    let stock_type: Option<String> = row.try_get("stock_type").map_err(decode_error)?;
    let stock_type = stock_type
        .map(|s| StockType::parse(&s).ok_or_else(|| StoreError::Decode(format!("unknown stock type '{s}'"))))
        .transpose()?;
    let casela: Option<i32> = row.try_get("casela").map_err(decode_error)?;
    let expiry: Option<NaiveDate> = row.try_get("expiry").map_err(decode_error)?;

    Ok(StockRow {
        id: StockRowId::new(id),
        item,
        cabinet: CabinetId::new(row.try_get("cabinet_id").map_err(decode_error)?),
        quantity: row.try_get("quantity").map_err(decode_error)?,
        expiry,
        origin: row.try_get("origin").map_err(decode_error)?,
        stock_type,
        casela: casela.map(Casela::new),
    })
}

fn movement_from(row: &PgRow) -> Result<MovementRecord, StoreError> {
    let id: i64 = row.try_get("id").map_err(decode_error)?;
    let medicine_id: Option<i64> = row.try_get("medicine_id").map_err(decode_error)?;
    let input_id: Option<i64> = row.try_get("input_id").map_err(decode_error)?;
    let item = ItemRef::from_columns(medicine_id, input_id)
        .ok_or_else(|| StoreError::Decode(format!("movement {id} does not reference exactly one item")))?;
    let movement_type: String = row.try_get("movement_type").map_err(decode_error)?;
    let direction: String = row.try_get("direction").map_err(decode_error)?;
    let occurred_at: DateTime<Utc> = row.try_get("occurred_at").map_err(decode_error)?;
    let casela: Option<i32> = row.try_get("casela").map_err(decode_error)?;
    let key: uuid::Uuid = row.try_get("idempotency_key").map_err(decode_error)?;

    Ok(MovementRecord {
        id: MovementId::new(id),
        movement_type: MovementType::parse(&movement_type)
            .ok_or_else(|| StoreError::Decode(format!("unknown movement type '{movement_type}'")))?,
        direction: Direction::parse(&direction)
            .ok_or_else(|| StoreError::Decode(format!("unknown direction '{direction}'")))?,
        occurred_at,
        operator: OperatorId::new(row.try_get("operator_id").map_err(decode_error)?),
        item,
        cabinet: CabinetId::new(row.try_get("cabinet_id").map_err(decode_error)?),
        quantity: row.try_get("quantity").map_err(decode_error)?,
        casela: casela.map(Casela::new),
        expiry: row.try_get("expiry").map_err(decode_error)?,
        idempotency_key: IdempotencyKey::from_uuid(key),
    })
}

fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Decode(err.to_string())
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                Some("23503") | Some("23514") => StoreError::Integrity(msg),
                Some("22003") => StoreError::OutOfRange(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
