//! Service-level tests against the in-memory store.
//!
//! Flow under test: command → service → unit of work → stock rows + movement log.
//!
//! Verifies:
//! - ledger arithmetic and FIFO draw order
//! - exactly one movement per mutation, and rollback when that write fails
//! - idempotent replay
//! - all-or-nothing relocation

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, TimeZone, Utc};

    use medstock_auth::{OperatorDraft, Role};
    use medstock_catalog::{CabinetDraft, InputDraft, MedicineDraft, ResidentDraft};
    use medstock_core::{CabinetId, Casela, DomainError, IdempotencyKey, OperatorId};
    use medstock_ledger::{
        Destinations, Direction, ItemRef, MedicineAttrs, MovementFilter, MovementType,
        RecordEntry, RecordExit, RelocateCabinet, RelocationState, StockFilter,
    };

    use crate::config::StockSettings;
    use crate::services::{
        CatalogService, MovementLog, OperatorDirectory, RelocationCoordinator, ServiceError,
        StockLedger,
    };
    use crate::store::{InMemoryStore, Store};

    struct Fixture {
        store: InMemoryStore,
        catalog: CatalogService,
        ledger: StockLedger,
        log: MovementLog,
        relocation: RelocationCoordinator,
    }

    fn setup() -> Fixture {
        let store = InMemoryStore::new();
        let shared: Arc<dyn Store> = Arc::new(store.clone());
        Fixture {
            store,
            catalog: CatalogService::new(shared.clone()),
            ledger: StockLedger::new(shared.clone(), StockSettings::default()),
            log: MovementLog::new(shared.clone()),
            relocation: RelocationCoordinator::new(shared),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2025, 3, 1)
    }

    fn domain(err: ServiceError) -> DomainError {
        match err {
            ServiceError::Domain(e) => e,
            other => panic!("expected a domain error, got {other:?}"),
        }
    }

    impl Fixture {
        async fn cabinet(&self, n: i32) -> CabinetId {
            self.catalog
                .create_cabinet(CabinetDraft {
                    id: CabinetId::new(n),
                    category: "Geral".to_string(),
                })
                .await
                .unwrap()
                .id
        }

        async fn medicine(&self, name: &str, minimum_stock: i64) -> ItemRef {
            let m = self
                .catalog
                .create_medicine(MedicineDraft {
                    name: name.to_string(),
                    dosage: "500".to_string(),
                    unit: "mg".to_string(),
                    active_substance: name.to_string(),
                    minimum_stock,
                })
                .await
                .unwrap();
            ItemRef::Medicine(m.id)
        }

        async fn input(&self, name: &str) -> ItemRef {
            let i = self
                .catalog
                .create_input(InputDraft {
                    name: name.to_string(),
                    description: None,
                    minimum_stock: 0,
                })
                .await
                .unwrap();
            ItemRef::Input(i.id)
        }

        async fn resident(&self, casela: i32) -> Casela {
            self.catalog
                .create_resident(ResidentDraft {
                    casela: Casela::new(casela),
                    name: format!("Resident {casela}"),
                })
                .await
                .unwrap()
                .casela
        }

        async fn quantities(&self, item: ItemRef, cabinet: CabinetId) -> Vec<i64> {
            let filter = StockFilter {
                item: Some(item),
                cabinet: Some(cabinet),
                ..StockFilter::default()
            };
            self.ledger
                .query_stock(&filter, today())
                .await
                .unwrap()
                .into_iter()
                .map(|v| v.row.quantity)
                .collect()
        }

        async fn movement_count(&self) -> usize {
            self.log.list(&MovementFilter::default()).await.unwrap().len()
        }
    }

    fn entry(item: ItemRef, cabinet: CabinetId, quantity: i64, attrs: Option<MedicineAttrs>) -> RecordEntry {
        RecordEntry {
            idempotency_key: IdempotencyKey::new(),
            operator: OperatorId::new(1),
            item,
            cabinet,
            quantity,
            attrs,
            occurred_at: Utc::now(),
        }
    }

    fn exit(item: ItemRef, cabinet: CabinetId, quantity: i64, casela: Option<Casela>) -> RecordExit {
        RecordExit {
            idempotency_key: IdempotencyKey::new(),
            operator: OperatorId::new(1),
            item,
            cabinet,
            quantity,
            casela,
            occurred_at: Utc::now(),
        }
    }

    fn relocate(origin: CabinetId, destinations: Destinations) -> RelocateCabinet {
        RelocateCabinet {
            idempotency_key: IdempotencyKey::new(),
            operator: OperatorId::new(1),
            origin,
            destinations,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn entries_and_exits_balance_and_never_go_negative() {
        let f = setup();
        let cab = f.cabinet(1).await;
        let gauze = f.input("Gaze").await;

        f.ledger.record_entry(entry(gauze, cab, 10, None)).await.unwrap();
        f.ledger.record_entry(entry(gauze, cab, 5, None)).await.unwrap();
        f.ledger.record_exit(exit(gauze, cab, 12, None)).await.unwrap();
        assert_eq!(f.quantities(gauze, cab).await, vec![3]);

        let err = domain(f.ledger.record_exit(exit(gauze, cab, 4, None)).await.unwrap_err());
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                requested: 4,
                available: 3
            }
        );
        assert_eq!(f.quantities(gauze, cab).await, vec![3]);
        assert_eq!(f.movement_count().await, 3);
    }

    #[tokio::test]
    async fn every_mutation_records_one_matching_movement() {
        let f = setup();
        let cab = f.cabinet(2).await;
        let med = f.medicine("Dipirona", 0).await;

        let receipt = f
            .ledger
            .record_entry(entry(med, cab, 7, Some(MedicineAttrs::general(Some(date(2026, 1, 1))))))
            .await
            .unwrap();
        assert_eq!(receipt.movements.len(), 1);
        let m = &receipt.movements[0];
        assert_eq!((m.movement_type, m.direction), (MovementType::Entry, Direction::In));
        assert_eq!((m.item, m.cabinet, m.quantity), (med, cab, 7));
        assert_eq!(m.expiry, Some(date(2026, 1, 1)));

        let receipt = f.ledger.record_exit(exit(med, cab, 2, None)).await.unwrap();
        let m = &receipt.movements[0];
        assert_eq!((m.movement_type, m.direction), (MovementType::Exit, Direction::Out));
        assert_eq!((m.item, m.cabinet, m.quantity), (med, cab, 2));
        assert_eq!(f.movement_count().await, 2);
    }

    #[tokio::test]
    async fn failed_movement_write_rolls_the_entry_back() {
        let f = setup();
        let cab = f.cabinet(1).await;
        let gauze = f.input("Gaze").await;

        f.store.fail_movement_writes_after(0);
        let err = f.ledger.record_entry(entry(gauze, cab, 10, None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
        f.store.clear_injected_failures();

        assert!(f.quantities(gauze, cab).await.is_empty());
        assert_eq!(f.movement_count().await, 0);
    }

    #[tokio::test]
    async fn fifo_exit_spans_batches_by_expiry() {
        let f = setup();
        let cab = f.cabinet(3).await;
        let med = f.medicine("Losartana", 0).await;

        // Later batch first, to show order comes from expiry and not insertion.
        f.ledger
            .record_entry(entry(med, cab, 30, Some(MedicineAttrs::general(Some(date(2025, 6, 1))))))
            .await
            .unwrap();
        f.ledger
            .record_entry(entry(med, cab, 50, Some(MedicineAttrs::general(Some(date(2025, 1, 1))))))
            .await
            .unwrap();

        let receipt = f.ledger.record_exit(exit(med, cab, 60, None)).await.unwrap();
        assert_eq!(receipt.movements[0].quantity, 60);
        assert_eq!(receipt.movements[0].expiry, Some(date(2025, 1, 1)));

        let views = f
            .ledger
            .query_stock(
                &StockFilter {
                    item: Some(med),
                    ..StockFilter::default()
                },
                today(),
            )
            .await
            .unwrap();
        let mut by_expiry: Vec<_> = views.iter().map(|v| (v.row.expiry, v.row.quantity)).collect();
        by_expiry.sort();
        assert_eq!(
            by_expiry,
            vec![(Some(date(2025, 1, 1)), 0), (Some(date(2025, 6, 1)), 20)]
        );
    }

    #[tokio::test]
    async fn small_exit_only_touches_the_earliest_batch() {
        let f = setup();
        let cab = f.cabinet(3).await;
        let med = f.medicine("Losartana", 0).await;
        for (qty, expiry) in [(10, date(2025, 2, 1)), (10, date(2025, 4, 1))] {
            f.ledger
                .record_entry(entry(med, cab, qty, Some(MedicineAttrs::general(Some(expiry)))))
                .await
                .unwrap();
        }

        let receipt = f.ledger.record_exit(exit(med, cab, 4, None)).await.unwrap();
        assert_eq!(receipt.rows.len(), 1);
        assert_eq!(receipt.rows[0].expiry, Some(date(2025, 2, 1)));
        assert_eq!(receipt.rows[0].quantity, 6);
    }

    #[tokio::test]
    async fn entries_with_the_same_key_merge_into_one_row() {
        let f = setup();
        let cab = f.cabinet(1).await;
        let med = f.medicine("Dipirona", 0).await;
        let attrs = MedicineAttrs::general(Some(date(2026, 5, 1)));

        f.ledger.record_entry(entry(med, cab, 4, Some(attrs.clone()))).await.unwrap();
        f.ledger.record_entry(entry(med, cab, 6, Some(attrs))).await.unwrap();
        assert_eq!(f.quantities(med, cab).await, vec![10]);
    }

    #[tokio::test]
    async fn individual_stock_is_kept_apart_from_general_stock() {
        let f = setup();
        let cab = f.cabinet(1).await;
        let med = f.medicine("Insulina", 0).await;
        let casela = f.resident(12).await;

        f.ledger
            .record_entry(entry(med, cab, 5, Some(MedicineAttrs::individual(casela, None))))
            .await
            .unwrap();
        f.ledger.record_entry(entry(med, cab, 3, None)).await.unwrap();

        let err = domain(f.ledger.record_exit(exit(med, cab, 4, None)).await.unwrap_err());
        assert!(matches!(err, DomainError::InsufficientStock { available: 3, .. }));

        f.ledger.record_exit(exit(med, cab, 4, Some(casela))).await.unwrap();
        let individual = f
            .ledger
            .query_stock(
                &StockFilter {
                    casela: Some(casela),
                    ..StockFilter::default()
                },
                today(),
            )
            .await
            .unwrap();
        assert_eq!(individual.len(), 1);
        assert_eq!(individual[0].row.quantity, 1);
        assert_eq!(individual[0].resident_name.as_deref(), Some("Resident 12"));
    }

    #[tokio::test]
    async fn entry_errors_follow_the_taxonomy() {
        let f = setup();
        let cab = f.cabinet(1).await;
        let med = f.medicine("Dipirona", 0).await;
        let gauze = f.input("Gaze").await;

        let err = domain(f.ledger.record_entry(entry(med, cab, 0, None)).await.unwrap_err());
        assert_eq!(err, DomainError::InvalidQuantity(0));

        let err = domain(
            f.ledger
                .record_entry(entry(med, CabinetId::new(99), 1, None))
                .await
                .unwrap_err(),
        );
        assert!(matches!(err, DomainError::UnknownReference(_)));

        let err = domain(
            f.ledger
                .record_entry(entry(med, cab, 1, Some(MedicineAttrs::individual(Casela::new(40), None))))
                .await
                .unwrap_err(),
        );
        assert!(matches!(err, DomainError::UnknownReference(_)));

        let mut orphan = MedicineAttrs::general(None);
        orphan.stock_type = medstock_ledger::StockType::Individual;
        let err = domain(f.ledger.record_entry(entry(med, cab, 1, Some(orphan))).await.unwrap_err());
        assert!(matches!(err, DomainError::InvalidAssociation(_)));

        let err = domain(
            f.ledger
                .record_entry(entry(gauze, cab, 1, Some(MedicineAttrs::general(None))))
                .await
                .unwrap_err(),
        );
        assert!(matches!(err, DomainError::InvalidAssociation(_)));

        assert_eq!(f.movement_count().await, 0);
    }

    #[tokio::test]
    async fn exit_for_an_unknown_resident_is_an_unknown_reference() {
        let f = setup();
        let cab = f.cabinet(1).await;
        let med = f.medicine("Dipirona", 0).await;
        f.ledger.record_entry(entry(med, cab, 10, None)).await.unwrap();

        let err = domain(
            f.ledger
                .record_exit(exit(med, cab, 1, Some(Casela::new(99))))
                .await
                .unwrap_err(),
        );
        assert!(matches!(err, DomainError::UnknownReference(_)));
        assert_eq!(f.quantities(med, cab).await, vec![10]);
        assert_eq!(f.movement_count().await, 1);
    }

    #[tokio::test]
    async fn entry_that_would_overflow_a_row_is_rejected_whole() {
        let f = setup();
        let cab = f.cabinet(1).await;
        let gauze = f.input("Gaze").await;
        f.ledger.record_entry(entry(gauze, cab, i64::MAX, None)).await.unwrap();

        let err = domain(f.ledger.record_entry(entry(gauze, cab, 1, None)).await.unwrap_err());
        assert!(matches!(err, DomainError::QuantityOverflow(_)));
        assert_eq!(f.quantities(gauze, cab).await, vec![i64::MAX]);
        assert_eq!(f.movement_count().await, 1);

        let summary = f.ledger.summary(Utc::now().date_naive()).await.unwrap();
        assert_eq!(summary.distribution.inputs, i64::MAX);
    }

    #[tokio::test]
    async fn replaying_an_entry_key_changes_nothing() {
        let f = setup();
        let cab = f.cabinet(1).await;
        let gauze = f.input("Gaze").await;
        let cmd = entry(gauze, cab, 10, None);

        let first = f.ledger.record_entry(cmd.clone()).await.unwrap();
        let second = f.ledger.record_entry(cmd.clone()).await.unwrap();
        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(first.movements, second.movements);
        assert_eq!(f.quantities(gauze, cab).await, vec![10]);
        assert_eq!(f.movement_count().await, 1);

        let mut reused = exit(gauze, cab, 1, None);
        reused.idempotency_key = cmd.idempotency_key;
        let err = domain(f.ledger.record_exit(reused).await.unwrap_err());
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(f.quantities(gauze, cab).await, vec![10]);
    }

    #[tokio::test]
    async fn relocating_a_cabinet_moves_everything() {
        let f = setup();
        let origin = f.cabinet(5).await;
        let destination = f.cabinet(7).await;
        let gauze = f.input("Gaze").await;
        f.ledger.record_entry(entry(gauze, origin, 10, None)).await.unwrap();
        let before = f.movement_count().await;

        let outcome = f
            .relocation
            .relocate(relocate(
                origin,
                Destinations {
                    medicines: None,
                    inputs: Some(destination),
                },
            ))
            .await
            .unwrap();

        assert_eq!(outcome.state, RelocationState::Done);
        assert_eq!(outcome.moved_rows, 1);
        assert_eq!(outcome.movements.len(), 2);
        assert!(outcome.movements.iter().all(|m| m.movement_type == MovementType::Relocation));
        assert_eq!(outcome.movements[0].direction, Direction::Out);
        assert_eq!(outcome.movements[0].cabinet, origin);
        assert_eq!(outcome.movements[1].direction, Direction::In);
        assert_eq!(outcome.movements[1].cabinet, destination);

        assert!(f.quantities(gauze, origin).await.is_empty());
        assert_eq!(f.quantities(gauze, destination).await, vec![10]);
        assert_eq!(f.movement_count().await, before + 2);

        // Origin is now free to go.
        f.catalog.delete_cabinet(origin).await.unwrap();
    }

    #[tokio::test]
    async fn relocation_needs_a_destination_per_kind() {
        let f = setup();
        let origin = f.cabinet(5).await;
        let med = f.medicine("Dipirona", 0).await;
        let gauze = f.input("Gaze").await;
        f.ledger.record_entry(entry(med, origin, 3, None)).await.unwrap();
        f.ledger.record_entry(entry(gauze, origin, 2, None)).await.unwrap();

        let inspection = f.relocation.inspect(origin).await.unwrap();
        assert!(inspection.info.has_medicine_stock && inspection.info.has_input_stock);
        assert_eq!(
            inspection.next,
            RelocationState::AwaitDestinations {
                medicines: true,
                inputs: true
            }
        );

        let err = domain(
            f.relocation
                .relocate(relocate(origin, Destinations::default()))
                .await
                .unwrap_err(),
        );
        assert_eq!(
            err,
            DomainError::DestinationsRequired {
                medicines: true,
                inputs: true
            }
        );

        let err = domain(
            f.relocation
                .relocate(relocate(
                    origin,
                    Destinations {
                        medicines: Some(origin),
                        inputs: Some(origin),
                    },
                ))
                .await
                .unwrap_err(),
        );
        assert!(matches!(err, DomainError::RelocationIncomplete(_)));

        let err = domain(
            f.relocation
                .relocate(relocate(
                    origin,
                    Destinations {
                        medicines: Some(CabinetId::new(77)),
                        inputs: Some(CabinetId::new(77)),
                    },
                ))
                .await
                .unwrap_err(),
        );
        assert!(matches!(err, DomainError::RelocationIncomplete(_)));
        assert_eq!(f.quantities(med, origin).await, vec![3]);
    }

    #[tokio::test]
    async fn relocation_is_all_or_nothing() {
        let f = setup();
        let origin = f.cabinet(5).await;
        let destination = f.cabinet(7).await;
        let med = f.medicine("Dipirona", 0).await;
        let gauze = f.input("Gaze").await;
        f.ledger.record_entry(entry(med, origin, 3, None)).await.unwrap();
        f.ledger.record_entry(entry(gauze, origin, 2, None)).await.unwrap();
        let before = f.movement_count().await;

        // Let the first out/in pair through, fail on the third write.
        f.store.fail_movement_writes_after(2);
        let err = domain(
            f.relocation
                .relocate(relocate(
                    origin,
                    Destinations {
                        medicines: Some(destination),
                        inputs: Some(destination),
                    },
                ))
                .await
                .unwrap_err(),
        );
        f.store.clear_injected_failures();

        assert!(matches!(err, DomainError::RelocationIncomplete(_)));
        assert_eq!(f.quantities(med, origin).await, vec![3]);
        assert_eq!(f.quantities(gauze, origin).await, vec![2]);
        assert!(f.quantities(med, destination).await.is_empty());
        assert_eq!(f.movement_count().await, before);
    }

    #[tokio::test]
    async fn relocation_clears_known_empty_rows_and_replays() {
        let f = setup();
        let origin = f.cabinet(5).await;
        let gauze = f.input("Gaze").await;
        f.ledger.record_entry(entry(gauze, origin, 2, None)).await.unwrap();
        f.ledger.record_exit(exit(gauze, origin, 2, None)).await.unwrap();

        let inspection = f.relocation.inspect(origin).await.unwrap();
        assert_eq!(inspection.next, RelocationState::Execute);

        let cmd = relocate(origin, Destinations::default());
        let outcome = f.relocation.relocate(cmd.clone()).await.unwrap();
        assert_eq!(outcome.moved_rows, 0);
        assert!(f.quantities(gauze, origin).await.is_empty());

        let again = f.relocation.relocate(cmd).await.unwrap();
        assert_eq!(again.state, RelocationState::Done);
    }

    #[tokio::test]
    async fn catalog_deletes_are_guarded_by_stock_rows() {
        let f = setup();
        let cab = f.cabinet(1).await;
        let med = f.medicine("Dipirona", 0).await;
        f.ledger.record_entry(entry(med, cab, 1, None)).await.unwrap();
        f.ledger.record_exit(exit(med, cab, 1, None)).await.unwrap();

        // A known-empty row still counts as a reference.
        let err = domain(f.catalog.delete_cabinet(cab).await.unwrap_err());
        assert!(matches!(err, DomainError::InUse(_)));
        let ItemRef::Medicine(med_id) = med else {
            unreachable!()
        };
        let err = domain(f.catalog.delete_medicine(med_id).await.unwrap_err());
        assert!(matches!(err, DomainError::InUse(_)));

        let err = domain(
            f.catalog
                .create_cabinet(CabinetDraft {
                    id: cab,
                    category: "Outra".to_string(),
                })
                .await
                .unwrap_err(),
        );
        assert!(matches!(err, DomainError::DuplicateCatalogKey(_)));

        let err = domain(f.catalog.delete_cabinet(CabinetId::new(42)).await.unwrap_err());
        assert!(matches!(err, DomainError::NotFound(_)));

        let updated = f.catalog.update_cabinet(cab, "  Controlados ").await.unwrap();
        assert_eq!(updated.category, "Controlados");
    }

    #[tokio::test]
    async fn stock_query_evaluates_relative_predicates() {
        let f = setup();
        let cab = f.cabinet(1).await;
        let low = f.medicine("Baixo", 10).await;
        let ok = f.medicine("Normal", 2).await;

        f.ledger
            .record_entry(entry(low, cab, 8, Some(MedicineAttrs::general(Some(date(2025, 2, 1))))))
            .await
            .unwrap();
        f.ledger
            .record_entry(entry(ok, cab, 50, Some(MedicineAttrs::general(Some(date(2025, 3, 20))))))
            .await
            .unwrap();

        let below = f
            .ledger
            .query_stock(
                &StockFilter {
                    below_minimum: true,
                    ..StockFilter::default()
                },
                today(),
            )
            .await
            .unwrap();
        assert_eq!(below.len(), 1);
        assert_eq!(below[0].row.item, low);

        let expired = f
            .ledger
            .query_stock(
                &StockFilter {
                    expired: true,
                    ..StockFilter::default()
                },
                today(),
            )
            .await
            .unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].item_name, "Baixo");

        let soon = f
            .ledger
            .query_stock(
                &StockFilter {
                    expiring_within_days: Some(30),
                    ..StockFilter::default()
                },
                today(),
            )
            .await
            .unwrap();
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].row.item, ok);

        let summary = f.ledger.summary(today()).await.unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.expired, 1);
        assert_eq!(summary.distribution.general_medicines, 58);
    }

    #[tokio::test]
    async fn movement_log_filters_newest_first() {
        let f = setup();
        let cab = f.cabinet(1).await;
        let gauze = f.input("Gaze").await;
        let med = f.medicine("Dipirona", 0).await;

        let t0 = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        for (i, item) in [gauze, med, gauze].into_iter().enumerate() {
            let mut cmd = entry(item, cab, 1, None);
            cmd.occurred_at = t0 + chrono::Duration::hours(i as i64);
            f.ledger.record_entry(cmd).await.unwrap();
        }

        let inputs = f
            .log
            .list(&MovementFilter {
                item_kind: Some(medstock_ledger::ItemKind::Input),
                ..MovementFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs[0].occurred_at > inputs[1].occurred_at);

        let window = f
            .log
            .list(
                &MovementFilter::default()
                    .within_last_days(t0 + chrono::Duration::hours(1), 0)
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(window.len(), 2);
    }

    #[tokio::test]
    async fn operators_register_authenticate_and_bootstrap() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let directory = OperatorDirectory::new(store);

        let admin = directory
            .ensure_bootstrap_admin("admin", "admin-pass")
            .await
            .unwrap()
            .expect("first admin");
        assert!(admin.role.is_admin());
        assert!(directory
            .ensure_bootstrap_admin("admin", "admin-pass")
            .await
            .unwrap()
            .is_none());

        directory
            .register(OperatorDraft {
                login: "Maria".to_string(),
                password: "secret1".to_string(),
                role: Role::OPERATOR,
            })
            .await
            .unwrap();
        let err = directory
            .register(OperatorDraft {
                login: "maria".to_string(),
                password: "secret1".to_string(),
                role: Role::OPERATOR,
            })
            .await
            .unwrap_err();
        assert!(matches!(domain(err), DomainError::DuplicateCatalogKey(_)));

        let maria = directory.authenticate(" MARIA ", "secret1").await.unwrap();
        assert_eq!(maria.login, "maria");
        assert!(matches!(
            directory.authenticate("maria", "wrong!").await,
            Err(ServiceError::Auth(_))
        ));
        assert!(matches!(
            directory.authenticate("nobody", "secret1").await,
            Err(ServiceError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn password_reset_replaces_the_old_password() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let directory = OperatorDirectory::new(store);
        directory
            .register(OperatorDraft {
                login: "joana".to_string(),
                password: "first-pass".to_string(),
                role: Role::OPERATOR,
            })
            .await
            .unwrap();

        let err = directory.reset_password("joana", "abc").await.unwrap_err();
        assert!(matches!(domain(err), DomainError::Validation(_)));
        let err = directory.reset_password("ghost", "new-pass").await.unwrap_err();
        assert!(matches!(domain(err), DomainError::NotFound(_)));

        let joana = directory.reset_password(" Joana ", "new-pass").await.unwrap();
        assert_eq!(joana.login, "joana");
        assert!(directory.authenticate("joana", "first-pass").await.is_err());
        assert!(directory.authenticate("joana", "new-pass").await.is_ok());

        let logins: Vec<String> = directory.list().await.unwrap().into_iter().map(|o| o.login).collect();
        assert_eq!(logins, vec!["joana".to_string()]);
    }
}
