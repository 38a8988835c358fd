use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::NaiveDate;
use stockbook::{
    core::inventory::Inventory,
    error::LedgerError,
    persist::{Collection, CollectionWrite, PersistError, PersistResult, Record, RecordStore, memory::MemoryStore},
    record::{DateChange, ProductDraft, SaleDraft, SaleKey},
};

const DAY: &str = "2024-03-15";

fn fixed_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date")
}

/// Memory store whose commits fail while `fail` is set.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail: AtomicBool,
}

impl RecordStore for FlakyStore {
    fn load(&self, collection: Collection) -> Vec<Record> {
        self.inner.load(collection)
    }

    fn commit(&self, writes: Vec<CollectionWrite>) -> PersistResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistError::Message("disk unavailable".to_string()));
        }
        self.inner.commit(writes)
    }
}

fn product(name: &str, stock: u32, origin: &str) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        stock,
        origin: origin.to_string(),
    }
}

fn sale(product: &str, quantity: u32, client: Option<&str>) -> SaleDraft {
    SaleDraft {
        product: product.to_string(),
        quantity,
        client: client.map(str::to_string),
    }
}

fn stock_of(inv: &Inventory, name: &str) -> u32 {
    inv.products().find(name).map(|p| p.stock).expect("product exists")
}

fn seeded() -> (Arc<FlakyStore>, Inventory) {
    let store = Arc::new(FlakyStore::default());
    let inv = Inventory::new(store.clone()).with_clock(fixed_day);
    inv.products().create(product("Apple", 10, "Farm A")).expect("seed");
    (store, inv)
}

#[test]
fn sale_takes_stock_and_cancel_restores_it() {
    let (_, inv) = seeded();

    let sold = inv.sales().create(sale("Apple", 3, Some("Bob"))).expect("sale");
    assert_eq!(sold.product, "Apple");
    assert_eq!(sold.quantity, 3);
    assert_eq!(sold.client, "Bob");
    assert_eq!(sold.origin, "Farm A");
    assert_eq!(sold.date, DAY);
    assert!(sold.id.is_some());
    assert_eq!(stock_of(&inv, "Apple"), 7);
    assert_eq!(inv.sales().list(), vec![sold.clone()]);

    let cancelled = inv
        .sales()
        .cancel(SaleKey::new("Apple", "Bob", DAY).expect("key"))
        .expect("cancel");
    assert_eq!(cancelled, sold);
    assert_eq!(stock_of(&inv, "Apple"), 10);
    assert!(inv.sales().list().is_empty());
}

#[test]
fn overselling_is_rejected_without_writes() {
    let (_, inv) = seeded();

    let err = inv.sales().create(sale("Apple", 15, Some("Bob"))).unwrap_err();
    assert_eq!(
        err,
        LedgerError::InsufficientStock {
            product: "Apple".to_string(),
            requested: 15,
            available: 10,
        }
    );
    assert_eq!(stock_of(&inv, "Apple"), 10);
    assert!(inv.sales().list().is_empty());

    inv.sales().create(sale("Apple", 10, Some("Bob"))).expect("exact stock");
    assert_eq!(stock_of(&inv, "Apple"), 0);
}

#[test]
fn unknown_product_and_zero_quantity_are_rejected() {
    let (_, inv) = seeded();
    assert!(matches!(
        inv.sales().create(sale("Plum", 1, None)).unwrap_err(),
        LedgerError::NotFound(_)
    ));
    assert!(matches!(
        inv.sales().create(sale("Apple", 0, None)).unwrap_err(),
        LedgerError::InvalidInput(_)
    ));
    assert!(inv.sales().list().is_empty());
}

#[test]
fn missing_or_empty_client_uses_sentinel() {
    let (_, inv) = seeded();
    let a = inv.sales().create(sale("Apple", 1, None)).expect("sale");
    let b = inv.sales().create(sale("Apple", 1, Some(""))).expect("sale");
    assert_eq!(a.client, "Sin nombre");
    assert_eq!(b.client, "Sin nombre");

    let custom = Inventory::new(Arc::new(MemoryStore::new())).with_default_client("walk-in");
    custom.products().create(product("Fig", 2, "Farm C")).expect("seed");
    let c = custom.sales().create(sale("Fig", 1, None)).expect("sale");
    assert_eq!(c.client, "walk-in");
}

#[test]
fn sale_keeps_origin_snapshot_after_product_edit() {
    let (_, inv) = seeded();
    inv.sales().create(sale("Apple", 2, Some("Bob"))).expect("sale");
    inv.products()
        .update(
            "Apple",
            stockbook::record::ProductPatch {
                origin: Some("Farm Z".to_string()),
                ..Default::default()
            },
        )
        .expect("update");

    assert_eq!(inv.sales().list()[0].origin, "Farm A");
}

#[test]
fn change_date_moves_first_match_only() {
    let (_, inv) = seeded();
    inv.sales().create(sale("Apple", 1, Some("Bob"))).expect("sale");
    inv.sales().create(sale("Apple", 2, Some("Bob"))).expect("sale");

    let moved = inv
        .sales()
        .change_date(DateChange::new("Apple", "Bob", DAY, "2024-03-01").expect("change"))
        .expect("change date");
    assert_eq!(moved.date, "2024-03-01");
    assert_eq!(moved.quantity, 1);

    let sales = inv.sales().list();
    assert_eq!(sales[0].date, "2024-03-01");
    assert_eq!(sales[1].date, DAY);
    assert_eq!(stock_of(&inv, "Apple"), 7);

    let missing = inv
        .sales()
        .change_date(DateChange::new("Apple", "Ana", DAY, "2024-03-02").expect("change"))
        .unwrap_err();
    assert_eq!(missing, LedgerError::NotFound("sale not found".to_string()));
}

#[test]
fn cancel_without_match_is_not_found() {
    let (_, inv) = seeded();
    inv.sales().create(sale("Apple", 1, Some("Bob"))).expect("sale");

    let err = inv
        .sales()
        .cancel(SaleKey::new("Apple", "Bob", "2000-01-01").expect("key"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
    assert_eq!(inv.sales().list().len(), 1);
    assert_eq!(stock_of(&inv, "Apple"), 9);
}

#[test]
fn cancel_of_deleted_product_keeps_the_sale() {
    let (_, inv) = seeded();
    inv.sales().create(sale("Apple", 4, Some("Bob"))).expect("sale");
    inv.products().delete("Apple").expect("delete");

    let err = inv
        .sales()
        .cancel(SaleKey::new("Apple", "Bob", DAY).expect("key"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
    assert_eq!(inv.sales().list().len(), 1);
}

#[test]
fn failed_commit_changes_neither_collection() {
    let (store, inv) = seeded();
    inv.sales().create(sale("Apple", 2, Some("Bob"))).expect("sale");

    store.fail.store(true, Ordering::SeqCst);
    let err = inv.sales().create(sale("Apple", 3, Some("Ana"))).unwrap_err();
    assert!(matches!(err, LedgerError::Persistence { .. }));
    let err = inv
        .sales()
        .cancel(SaleKey::new("Apple", "Bob", DAY).expect("key"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Persistence { .. }));
    store.fail.store(false, Ordering::SeqCst);

    assert_eq!(stock_of(&inv, "Apple"), 8);
    let sales = inv.sales().list();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].client, "Bob");
}
