use std::{collections::BTreeMap, sync::Arc};

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use crate::{
    core::inventory::Inventory,
    error::LedgerError,
    record::{DateChange, Person, PersonPatch, Product, ProductDraft, ProductPatch, Sale, SaleDraft, SaleKey},
    stats::Ranking,
    types::DateRange,
};

use super::events::InventoryEvent;

/// Failure seen by a caller of [`InventoryHandle`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The ledger rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The service is unreachable: shut down or its task is gone.
    #[error("inventory service is not running")]
    ChannelClosed,
    /// A blocking ledger task panicked or was cancelled.
    #[error("ledger task failed: {0}")]
    Join(String),
}

/// Queue and channel sizes for [`spawn_inventory`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Pending mutations before senders wait.
    pub command_queue_bound: usize,
    /// Events buffered per subscriber before the oldest are dropped.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

/// Cloneable handle to the single-writer inventory service.
///
/// Mutations are queued to one task and applied in arrival order, so
/// in-process callers never lose each other's updates. Reads and statistics
/// bypass the queue and run on the blocking pool.
pub struct InventoryHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<InventoryEvent>,
    inventory: Arc<Inventory>,
}

impl Clone for InventoryHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
            inventory: Arc::clone(&self.inventory),
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T, RuntimeError>>;

enum Command {
    CreateProduct {
        draft: ProductDraft,
        resp: Reply<Product>,
    },
    UpdateProduct {
        name: String,
        patch: ProductPatch,
        resp: Reply<Product>,
    },
    DeleteProduct {
        name: String,
        resp: Reply<String>,
    },
    CreatePerson {
        person: Person,
        resp: Reply<Person>,
    },
    UpdatePerson {
        name: String,
        patch: PersonPatch,
        resp: Reply<Person>,
    },
    DeletePerson {
        name: String,
        resp: Reply<String>,
    },
    RecordSale {
        draft: SaleDraft,
        resp: Reply<Sale>,
    },
    ChangeSaleDate {
        change: DateChange,
        resp: Reply<Sale>,
    },
    CancelSale {
        key: SaleKey,
        resp: Reply<Sale>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Starts the command loop on the current tokio runtime.
pub fn spawn_inventory(inventory: Inventory, config: RuntimeConfig) -> InventoryHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<InventoryEvent>(config.event_capacity);
    let inventory = Arc::new(inventory);

    let events_tx_loop = events_tx.clone();
    let inventory_loop = Arc::clone(&inventory);

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            if let Some(resp) = handle_command(cmd, &inventory_loop, &events_tx_loop).await {
                cmd_rx.close();
                let _ = resp.send(());
                break;
            }
        }
        debug!("inventory command loop stopped");
    });

    InventoryHandle {
        cmd_tx,
        events_tx,
        inventory,
    }
}

impl InventoryHandle {
    /// Subscribes to events committed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<InventoryEvent> {
        self.events_tx.subscribe()
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    async fn read<T, F>(&self, f: F) -> Result<T, RuntimeError>
    where
        F: FnOnce(&Inventory) -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.cmd_tx.is_closed() {
            return Err(RuntimeError::ChannelClosed);
        }
        let inventory = Arc::clone(&self.inventory);
        tokio::task::spawn_blocking(move || f(&inventory))
            .await
            .map_err(|err| RuntimeError::Join(err.to_string()))
    }

    /// See [`crate::core::products::ProductLedger::create`].
    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product, RuntimeError> {
        self.request(|resp| Command::CreateProduct { draft, resp }).await
    }

    /// See [`crate::core::products::ProductLedger::update`].
    pub async fn update_product(
        &self,
        name: impl Into<String>,
        patch: ProductPatch,
    ) -> Result<Product, RuntimeError> {
        let name = name.into();
        self.request(|resp| Command::UpdateProduct { name, patch, resp })
            .await
    }

    /// See [`crate::core::products::ProductLedger::delete`].
    pub async fn delete_product(&self, name: impl Into<String>) -> Result<String, RuntimeError> {
        let name = name.into();
        self.request(|resp| Command::DeleteProduct { name, resp }).await
    }

    /// See [`crate::core::persons::PersonLedger::create`].
    pub async fn create_person(&self, person: Person) -> Result<Person, RuntimeError> {
        self.request(|resp| Command::CreatePerson { person, resp }).await
    }

    /// See [`crate::core::persons::PersonLedger::update`].
    pub async fn update_person(
        &self,
        name: impl Into<String>,
        patch: PersonPatch,
    ) -> Result<Person, RuntimeError> {
        let name = name.into();
        self.request(|resp| Command::UpdatePerson { name, patch, resp })
            .await
    }

    /// See [`crate::core::persons::PersonLedger::delete`].
    pub async fn delete_person(&self, name: impl Into<String>) -> Result<String, RuntimeError> {
        let name = name.into();
        self.request(|resp| Command::DeletePerson { name, resp }).await
    }

    /// See [`crate::core::sales::SalesLedger::create`].
    pub async fn record_sale(&self, draft: SaleDraft) -> Result<Sale, RuntimeError> {
        self.request(|resp| Command::RecordSale { draft, resp }).await
    }

    /// See [`crate::core::sales::SalesLedger::change_date`].
    pub async fn change_sale_date(&self, change: DateChange) -> Result<Sale, RuntimeError> {
        self.request(|resp| Command::ChangeSaleDate { change, resp })
            .await
    }

    /// See [`crate::core::sales::SalesLedger::cancel`].
    pub async fn cancel_sale(&self, key: SaleKey) -> Result<Sale, RuntimeError> {
        self.request(|resp| Command::CancelSale { key, resp }).await
    }

    /// All products.
    pub async fn products(&self) -> Result<Vec<Product>, RuntimeError> {
        self.read(|inv| inv.products().list()).await
    }

    /// Product by exact name.
    pub async fn product(&self, name: impl Into<String>) -> Result<Option<Product>, RuntimeError> {
        let name = name.into();
        self.read(move |inv| inv.products().find(&name)).await
    }

    /// All persons.
    pub async fn persons(&self) -> Result<Vec<Person>, RuntimeError> {
        self.read(|inv| inv.persons().list()).await
    }

    /// All sales.
    pub async fn sales(&self) -> Result<Vec<Sale>, RuntimeError> {
        self.read(|inv| inv.sales().list()).await
    }

    /// Units sold per day.
    pub async fn sales_by_day(
        &self,
        range: Option<DateRange>,
    ) -> Result<BTreeMap<String, u64>, RuntimeError> {
        self.read(move |inv| inv.sales_by_day(range.as_ref())).await
    }

    /// Products ranked by units sold.
    pub async fn top_products(&self, range: Option<DateRange>) -> Result<Ranking, RuntimeError> {
        self.read(move |inv| inv.top_products(range.as_ref())).await
    }

    /// Units sold per current product origin.
    pub async fn sales_by_origin(
        &self,
        range: Option<DateRange>,
    ) -> Result<BTreeMap<String, u64>, RuntimeError> {
        self.read(move |inv| inv.sales_by_origin(range.as_ref())).await
    }

    /// Stops the command loop after queued mutations finish. Later calls
    /// fail with [`RuntimeError::ChannelClosed`].
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

/// Applies one mutation. Returns the shutdown reply when the loop should
/// stop.
async fn handle_command(
    cmd: Command,
    inventory: &Arc<Inventory>,
    events_tx: &broadcast::Sender<InventoryEvent>,
) -> Option<oneshot::Sender<()>> {
    match cmd {
        Command::CreateProduct { draft, resp } => {
            let res = run_blocking(inventory, move |inv| inv.products().create(draft)).await;
            emit(events_tx, &res, |p| InventoryEvent::ProductCreated { name: p.name.clone() });
            let _ = resp.send(res);
        }
        Command::UpdateProduct { name, patch, resp } => {
            let res = run_blocking(inventory, move |inv| inv.products().update(&name, patch)).await;
            emit(events_tx, &res, |p| InventoryEvent::ProductUpdated { name: p.name.clone() });
            let _ = resp.send(res);
        }
        Command::DeleteProduct { name, resp } => {
            let deleted = name.clone();
            let res = run_blocking(inventory, move |inv| inv.products().delete(&name)).await;
            emit(events_tx, &res, |_| InventoryEvent::ProductDeleted { name: deleted });
            let _ = resp.send(res);
        }
        Command::CreatePerson { person, resp } => {
            let res = run_blocking(inventory, move |inv| inv.persons().create(person)).await;
            emit(events_tx, &res, |p| InventoryEvent::PersonCreated { name: p.name.clone() });
            let _ = resp.send(res);
        }
        Command::UpdatePerson { name, patch, resp } => {
            let res = run_blocking(inventory, move |inv| inv.persons().update(&name, patch)).await;
            emit(events_tx, &res, |p| InventoryEvent::PersonUpdated { name: p.name.clone() });
            let _ = resp.send(res);
        }
        Command::DeletePerson { name, resp } => {
            let deleted = name.clone();
            let res = run_blocking(inventory, move |inv| inv.persons().delete(&name)).await;
            emit(events_tx, &res, |_| InventoryEvent::PersonDeleted { name: deleted });
            let _ = resp.send(res);
        }
        Command::RecordSale { draft, resp } => {
            let res = run_blocking(inventory, move |inv| inv.sales().create(draft)).await;
            emit(events_tx, &res, |s| InventoryEvent::SaleRecorded {
                product: s.product.clone(),
                quantity: s.quantity,
                client: s.client.clone(),
            });
            let _ = resp.send(res);
        }
        Command::ChangeSaleDate { change, resp } => {
            let res = run_blocking(inventory, move |inv| inv.sales().change_date(change)).await;
            emit(events_tx, &res, |s| InventoryEvent::SaleRedated {
                product: s.product.clone(),
                date: s.date.clone(),
            });
            let _ = resp.send(res);
        }
        Command::CancelSale { key, resp } => {
            let res = run_blocking(inventory, move |inv| inv.sales().cancel(key)).await;
            emit(events_tx, &res, |s| InventoryEvent::SaleCancelled {
                product: s.product.clone(),
                quantity: s.quantity,
            });
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => return Some(resp),
    }

    None
}

async fn run_blocking<T, F>(inventory: &Arc<Inventory>, f: F) -> Result<T, RuntimeError>
where
    F: FnOnce(&Inventory) -> Result<T, LedgerError> + Send + 'static,
    T: Send + 'static,
{
    let inventory = Arc::clone(inventory);
    tokio::task::spawn_blocking(move || f(&inventory))
        .await
        .map_err(|err| RuntimeError::Join(err.to_string()))?
        .map_err(RuntimeError::from)
}

fn emit<T>(
    events_tx: &broadcast::Sender<InventoryEvent>,
    res: &Result<T, RuntimeError>,
    event: impl FnOnce(&T) -> InventoryEvent,
) {
    if let Ok(value) = res {
        let _ = events_tx.send(event(value));
    }
}
