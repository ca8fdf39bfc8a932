use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument};

use medstock_catalog::{
    Cabinet, CabinetDraft, Input, InputDraft, Medicine, MedicineDraft, Resident, ResidentDraft,
    validate_category, validate_name,
};
use medstock_core::{CabinetId, Casela, DomainError, InputId, MedicineId};
use medstock_ledger::ItemRef;

use super::{ServiceError, finish};
use crate::store::{StockReference, Store, StoreError, StoreTx};

/// CRUD for medicines, inputs, cabinets and residents.
///
/// Deletes are refused with `InUse` while any stock row (of any quantity)
/// still references the entity.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    // ── medicines ────────────────────────────────────────────────────────

    #[instrument(skip(self, draft), err)]
    pub async fn create_medicine(&self, draft: MedicineDraft) -> Result<Medicine, ServiceError> {
        let draft = draft.validated()?;
        let mut tx = self.store.begin().await?;
        let result = tx.insert_medicine(&draft).await.map_err(ServiceError::from);
        let medicine = finish(tx, result).await?;
        info!(medicine_id = %medicine.id, name = %medicine.name, "medicine created");
        Ok(medicine)
    }

    pub async fn get_medicine(&self, id: MedicineId) -> Result<Medicine, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .get_medicine(id)
            .await
            .map_err(ServiceError::from)
            .and_then(|m| m.ok_or_else(|| DomainError::not_found(format!("medicine {id}")).into()));
        finish(tx, result).await
    }

    pub async fn list_medicines(&self) -> Result<Vec<Medicine>, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = tx.list_medicines().await.map_err(ServiceError::from);
        finish(tx, result).await
    }

    #[instrument(skip(self, draft), fields(medicine_id = %id), err)]
    pub async fn update_medicine(
        &self,
        id: MedicineId,
        draft: MedicineDraft,
    ) -> Result<Medicine, ServiceError> {
        let medicine = draft.validated()?.into_medicine(id);
        let mut tx = self.store.begin().await?;
        let result = match tx.update_medicine(&medicine).await {
            Ok(true) => Ok(medicine),
            Ok(false) => Err(DomainError::not_found(format!("medicine {id}")).into()),
            Err(e) => Err(e.into()),
        };
        finish(tx, result).await
    }

    #[instrument(skip(self), fields(medicine_id = %id), err)]
    pub async fn delete_medicine(&self, id: MedicineId) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = delete_guarded(
            tx.as_mut(),
            StockReference::Medicine(id),
            format!("medicine {id}"),
        )
        .await;
        finish(tx, result).await
    }

    // ── inputs ───────────────────────────────────────────────────────────

    #[instrument(skip(self, draft), err)]
    pub async fn create_input(&self, draft: InputDraft) -> Result<Input, ServiceError> {
        let draft = draft.validated()?;
        let mut tx = self.store.begin().await?;
        let result = tx.insert_input(&draft).await.map_err(ServiceError::from);
        let input = finish(tx, result).await?;
        info!(input_id = %input.id, name = %input.name, "input created");
        Ok(input)
    }

    pub async fn get_input(&self, id: InputId) -> Result<Input, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .get_input(id)
            .await
            .map_err(ServiceError::from)
            .and_then(|i| i.ok_or_else(|| DomainError::not_found(format!("input {id}")).into()));
        finish(tx, result).await
    }

    pub async fn list_inputs(&self) -> Result<Vec<Input>, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = tx.list_inputs().await.map_err(ServiceError::from);
        finish(tx, result).await
    }

    #[instrument(skip(self, draft), fields(input_id = %id), err)]
    pub async fn update_input(&self, id: InputId, draft: InputDraft) -> Result<Input, ServiceError> {
        let input = draft.validated()?.into_input(id);
        let mut tx = self.store.begin().await?;
        let result = match tx.update_input(&input).await {
            Ok(true) => Ok(input),
            Ok(false) => Err(DomainError::not_found(format!("input {id}")).into()),
            Err(e) => Err(e.into()),
        };
        finish(tx, result).await
    }

    #[instrument(skip(self), fields(input_id = %id), err)]
    pub async fn delete_input(&self, id: InputId) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let result =
            delete_guarded(tx.as_mut(), StockReference::Input(id), format!("input {id}")).await;
        finish(tx, result).await
    }

    // ── cabinets ─────────────────────────────────────────────────────────

    #[instrument(skip(self, draft), err)]
    pub async fn create_cabinet(&self, draft: CabinetDraft) -> Result<Cabinet, ServiceError> {
        let cabinet = draft.validated()?;
        let mut tx = self.store.begin().await?;
        let result = match tx.insert_cabinet(&cabinet).await {
            Ok(()) => Ok(cabinet),
            Err(StoreError::Duplicate(_)) => Err(DomainError::duplicate(format!(
                "cabinet {} already exists",
                cabinet.id
            ))
            .into()),
            Err(e) => Err(e.into()),
        };
        let cabinet = finish(tx, result).await?;
        info!(cabinet = %cabinet.id, category = %cabinet.category, "cabinet created");
        Ok(cabinet)
    }

    pub async fn get_cabinet(&self, id: CabinetId) -> Result<Cabinet, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .get_cabinet(id)
            .await
            .map_err(ServiceError::from)
            .and_then(|c| c.ok_or_else(|| DomainError::not_found(format!("cabinet {id}")).into()));
        finish(tx, result).await
    }

    pub async fn list_cabinets(&self) -> Result<Vec<Cabinet>, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = tx.list_cabinets().await.map_err(ServiceError::from);
        finish(tx, result).await
    }

    /// Change the category; the cabinet number is the key and never changes.
    #[instrument(skip(self), fields(cabinet = %id), err)]
    pub async fn update_cabinet(&self, id: CabinetId, category: &str) -> Result<Cabinet, ServiceError> {
        let cabinet = Cabinet {
            id,
            category: validate_category(category)?,
        };
        let mut tx = self.store.begin().await?;
        let result = match tx.update_cabinet(&cabinet).await {
            Ok(true) => Ok(cabinet),
            Ok(false) => Err(DomainError::not_found(format!("cabinet {id}")).into()),
            Err(e) => Err(e.into()),
        };
        finish(tx, result).await
    }

    #[instrument(skip(self), fields(cabinet = %id), err)]
    pub async fn delete_cabinet(&self, id: CabinetId) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let result =
            delete_guarded(tx.as_mut(), StockReference::Cabinet(id), format!("cabinet {id}")).await;
        finish(tx, result).await
    }

    // ── residents ────────────────────────────────────────────────────────

    #[instrument(skip(self, draft), err)]
    pub async fn create_resident(&self, draft: ResidentDraft) -> Result<Resident, ServiceError> {
        let resident = draft.validated()?;
        let mut tx = self.store.begin().await?;
        let result = match tx.insert_resident(&resident).await {
            Ok(()) => Ok(resident),
            Err(StoreError::Duplicate(_)) => Err(DomainError::duplicate(format!(
                "casela {} already assigned",
                resident.casela
            ))
            .into()),
            Err(e) => Err(e.into()),
        };
        finish(tx, result).await
    }

    pub async fn get_resident(&self, casela: Casela) -> Result<Resident, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .get_resident(casela)
            .await
            .map_err(ServiceError::from)
            .and_then(|r| {
                r.ok_or_else(|| DomainError::not_found(format!("resident in casela {casela}")).into())
            });
        finish(tx, result).await
    }

    pub async fn list_residents(&self) -> Result<Vec<Resident>, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = tx.list_residents().await.map_err(ServiceError::from);
        finish(tx, result).await
    }

    /// Rename a resident; the casela is the key and never changes.
    #[instrument(skip(self, name), fields(casela = %casela), err)]
    pub async fn update_resident(&self, casela: Casela, name: &str) -> Result<Resident, ServiceError> {
        let resident = Resident {
            casela,
            name: validate_name(name)?,
        };
        let mut tx = self.store.begin().await?;
        let result = match tx.update_resident(&resident).await {
            Ok(true) => Ok(resident),
            Ok(false) => Err(DomainError::not_found(format!("resident in casela {casela}")).into()),
            Err(e) => Err(e.into()),
        };
        finish(tx, result).await
    }

    #[instrument(skip(self), fields(casela = %casela), err)]
    pub async fn delete_resident(&self, casela: Casela) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = delete_guarded(
            tx.as_mut(),
            StockReference::Resident(casela),
            format!("resident in casela {casela}"),
        )
        .await;
        finish(tx, result).await
    }

    /// Display names for every catalog item, for reports.
    pub async fn item_names(&self) -> Result<HashMap<ItemRef, String>, ServiceError> {
        let mut tx = self.store.begin().await?;
        let result = load_item_names(tx.as_mut()).await;
        finish(tx, result).await
    }
}

async fn load_item_names(tx: &mut dyn StoreTx) -> Result<HashMap<ItemRef, String>, ServiceError> {
    let mut names = HashMap::new();
    for m in tx.list_medicines().await? {
        names.insert(ItemRef::Medicine(m.id), format!("{} {}", m.name, m.dosage));
    }
    for i in tx.list_inputs().await? {
        names.insert(ItemRef::Input(i.id), i.name);
    }
    Ok(names)
}

async fn delete_guarded(
    tx: &mut dyn StoreTx,
    target: StockReference,
    label: String,
) -> Result<(), ServiceError> {
    let references = tx.count_stock_references(target).await?;
    if references > 0 {
        return Err(DomainError::in_use(format!(
            "{label} is referenced by {references} stock row(s)"
        ))
        .into());
    }

    let deleted = match target {
        StockReference::Medicine(id) => tx.delete_medicine(id).await,
        StockReference::Input(id) => tx.delete_input(id).await,
        StockReference::Cabinet(id) => tx.delete_cabinet(id).await,
        StockReference::Resident(casela) => tx.delete_resident(casela).await,
    };
    match deleted {
        Ok(true) => {
            info!(entry = %label, "catalog entry deleted");
            Ok(())
        }
        Ok(false) => Err(DomainError::not_found(label).into()),
        // A stock row slipped in after the count.
        Err(StoreError::Integrity(_)) => Err(DomainError::in_use(label).into()),
        Err(e) => Err(e.into()),
    }
}
