use std::{fs, sync::Arc};

use serde_json::json;
use stockbook::{
    core::inventory::Inventory,
    error::LedgerError,
    persist::{Collection, CollectionWrite, Record, RecordStore, json::JsonFileStore},
    record::{ProductDraft, SaleDraft},
};

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().expect("object literal")
}

fn apple() -> ProductDraft {
    ProductDraft {
        name: "Apple".to_string(),
        stock: 10,
        origin: "Farm A".to_string(),
    }
}

#[test]
fn missing_empty_and_corrupt_files_read_as_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::open(dir.path().join("data")).expect("open");
    assert!(store.load(Collection::Products).is_empty());

    fs::create_dir_all(dir.path().join("data")).expect("mkdir");
    fs::write(store.path_for(Collection::Products), "").expect("write");
    fs::write(store.path_for(Collection::Persons), "{ broken").expect("write");
    fs::write(store.path_for(Collection::Sales), r#"{"not": "a list"}"#).expect("write");
    for collection in Collection::ALL {
        assert!(store.load(collection).is_empty(), "{collection:?}");
    }
}

#[test]
fn ledger_writes_pretty_utf8_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let inv = Inventory::new(Arc::new(JsonFileStore::open(dir.path()).expect("open")));
    inv.products()
        .create(ProductDraft {
            name: "Ñame".to_string(),
            stock: 2,
            origin: "Córdoba".to_string(),
        })
        .expect("create");

    let text = fs::read_to_string(dir.path().join("products.json")).expect("read");
    assert!(text.starts_with("[\n    {\n        \"name\": \"Ñame\""));
    assert!(text.contains("\"origin\": \"Córdoba\""));
    assert!(text.ends_with("]\n"));
}

#[test]
fn sale_commit_updates_both_files_and_leaves_no_journal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let inv = Inventory::new(Arc::new(JsonFileStore::open(dir.path()).expect("open")));
    inv.products().create(apple()).expect("create");
    inv.sales()
        .create(SaleDraft {
            product: "Apple".to_string(),
            quantity: 4,
            client: Some("Bob".to_string()),
        })
        .expect("sale");

    assert!(!dir.path().join(".commit.journal").exists());

    let reopened = Inventory::new(Arc::new(JsonFileStore::open(dir.path()).expect("reopen")));
    assert_eq!(reopened.products().find("Apple").map(|p| p.stock), Some(6));
    assert_eq!(reopened.sales().list().len(), 1);
}

#[test]
fn interrupted_commit_is_rolled_forward_on_open() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("products.json"),
        r#"[{"name": "Apple", "stock": 10, "origin": "Farm A"}]"#,
    )
    .expect("seed");

    let journal = json!({
        "format_version": 1,
        "writes": [
            CollectionWrite {
                collection: Collection::Products,
                records: vec![record(json!({"name": "Apple", "stock": 7, "origin": "Farm A"}))],
            },
            CollectionWrite {
                collection: Collection::Sales,
                records: vec![record(json!({
                    "product": "Apple", "quantity": 3, "client": "Bob",
                    "origin": "Farm A", "date": "2024-01-01"
                }))],
            },
        ],
    });
    fs::write(
        dir.path().join(".commit.journal"),
        serde_json::to_vec(&journal).expect("encode"),
    )
    .expect("journal");

    let store = JsonFileStore::open(dir.path()).expect("open");
    assert!(!dir.path().join(".commit.journal").exists());
    let inv = Inventory::new(Arc::new(store));
    assert_eq!(inv.products().find("Apple").map(|p| p.stock), Some(7));
    assert_eq!(inv.sales().list().len(), 1);
}

#[test]
fn legacy_spanish_files_are_understood() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("products.json"),
        r#"[{"nombre": "Pera", "stock": 5, "origen": "Huerta"}]"#,
    )
    .expect("seed");
    fs::write(
        dir.path().join("sales.json"),
        r#"[{"producto": "Pera", "cantidad": 2, "cliente": "Ana", "origen": "Huerta", "fecha": "2024-05-01"}]"#,
    )
    .expect("seed");

    let inv = Inventory::new(Arc::new(JsonFileStore::open(dir.path()).expect("open")));
    assert_eq!(inv.products().find("Pera").map(|p| p.stock), Some(5));
    assert_eq!(inv.sales_by_origin(None)["Huerta"], 2);
}

#[test]
fn unwritable_directory_surfaces_persistence_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").expect("write");

    let inv = Inventory::new(Arc::new(JsonFileStore::open(blocker.join("data")).expect("open")));
    let err = inv.products().create(apple()).unwrap_err();
    assert!(matches!(err, LedgerError::Persistence { .. }));
    assert!(inv.products().list().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_never_undo_committed_sales() {
    use std::sync::atomic::{AtomicBool, Ordering};

    use stockbook::runtime::handle::{RuntimeConfig, spawn_inventory};

    const INITIAL: u32 = 10_000;
    const SALES: u32 = 300;

    let dir = tempfile::tempdir().expect("tempdir");
    let inv = Inventory::new(Arc::new(JsonFileStore::open(dir.path()).expect("open")));
    let handle = spawn_inventory(inv, RuntimeConfig::default());
    handle
        .create_product(ProductDraft {
            name: "Apple".to_string(),
            stock: INITIAL,
            origin: "Farm A".to_string(),
        })
        .await
        .expect("create");

    let stop = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..6)
        .map(|_| {
            let handle = handle.clone();
            let stop = Arc::clone(&stop);
            tokio::spawn(async move {
                while !stop.load(Ordering::SeqCst) {
                    handle.sales_by_origin(None).await.expect("read");
                }
            })
        })
        .collect();

    for _ in 0..SALES {
        handle
            .record_sale(SaleDraft {
                product: "Apple".to_string(),
                quantity: 1,
                client: None,
            })
            .await
            .expect("sale");
    }
    stop.store(true, Ordering::SeqCst);
    for reader in readers {
        reader.await.expect("reader");
    }

    let stored = handle.sales().await.expect("sales").len() as u32;
    let stock = handle.product("Apple").await.expect("read").expect("exists").stock;
    assert_eq!(stored, SALES);
    assert_eq!(stock + stored, INITIAL);
    assert!(!dir.path().join(".commit.journal").exists());
    handle.shutdown().await.expect("shutdown");
}
