use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::{
    error::LedgerError,
    persist::{Collection, RecordStore},
    record::{DateChange, Product, Sale, SaleDraft, SaleKey},
    types::{DEFAULT_CLIENT, SaleId, format_date, local_today},
};

use super::{collection::Loaded, products::ProductLedger};

/// Log of sales. Recording a sale takes stock from the product and
/// cancelling one puts it back; both sides are committed together.
#[derive(Clone)]
pub struct SalesLedger {
    store: Arc<dyn RecordStore>,
    products: ProductLedger,
    default_client: String,
    today: fn() -> NaiveDate,
}

impl SalesLedger {
    /// Builds a ledger over `store`, adjusting stock through `products`.
    pub fn new(store: Arc<dyn RecordStore>, products: ProductLedger) -> Self {
        Self {
            store,
            products,
            default_client: DEFAULT_CLIENT.to_string(),
            today: local_today,
        }
    }

    /// Replaces the sentinel client used when a sale names none.
    pub fn with_default_client(mut self, client: impl Into<String>) -> Self {
        self.default_client = client.into();
        self
    }

    /// Replaces the source of the current date.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    fn load(&self) -> Loaded<Sale> {
        Loaded::load(self.store.as_ref(), Collection::Sales)
    }

    /// All well-formed sales in ledger order.
    pub fn list(&self) -> Vec<Sale> {
        self.load().records
    }

    /// Records a sale dated today.
    ///
    /// Fails with `NotFound` for an unknown product and `InsufficientStock`
    /// when the product holds fewer units than requested; in both cases
    /// nothing is written.
    pub fn create(&self, draft: SaleDraft) -> Result<Sale, LedgerError> {
        let client = draft
            .client
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.default_client.clone());
        let date = format_date((self.today)());

        let mut products = self.products.load();
        let product = find_product(&mut products.records, &draft.product)?;
        product.take_stock(draft.quantity)?;

        let sale = Sale {
            id: Some(SaleId::now_v7()),
            product: product.name.clone(),
            quantity: draft.quantity,
            client,
            origin: product.origin.clone(),
            date,
            extra: Default::default(),
        };

        let mut sales = self.load();
        sales.records.push(sale.clone());
        self.commit(products, sales, "could not record the sale")?;

        info!(
            product = %sale.product,
            quantity = sale.quantity,
            client = %sale.client,
            date = %sale.date,
            "sale recorded"
        );
        Ok(sale)
    }

    /// Moves the first sale matching `change.key` to `change.new_date`.
    /// Nothing else on the sale changes.
    pub fn change_date(&self, change: DateChange) -> Result<Sale, LedgerError> {
        let mut sales = self.load();
        let sale = sales
            .records
            .iter_mut()
            .find(|s| change.key.matches(s))
            .ok_or_else(sale_not_found)?;
        sale.date = change.new_date;
        let updated = sale.clone();

        let write = sales
            .into_write()
            .map_err(|err| LedgerError::persistence("could not save the date change", err))?;
        self.store
            .commit(vec![write])
            .map_err(|err| LedgerError::persistence("could not save the date change", err))?;

        info!(product = %updated.product, client = %updated.client, date = %updated.date, "sale re-dated");
        Ok(updated)
    }

    /// Removes the first sale matching `key` and returns its units to the
    /// product.
    ///
    /// Fails with `NotFound` when no sale matches or when the product has
    /// since been deleted; the sale then stays recorded.
    pub fn cancel(&self, key: SaleKey) -> Result<Sale, LedgerError> {
        let mut sales = self.load();
        let idx = sales
            .records
            .iter()
            .position(|s| key.matches(s))
            .ok_or_else(sale_not_found)?;
        if sales.records[idx].quantity == 0 {
            return Err(LedgerError::InvalidInput(
                "recorded sale quantity is not positive".to_string(),
            ));
        }
        let sale = sales.records.remove(idx);

        let mut products = self.products.load();
        let product = find_product(&mut products.records, &sale.product).map_err(|_| {
            LedgerError::NotFound(format!(
                "product \"{}\" not found, cannot restore its stock",
                sale.product
            ))
        })?;
        product.restore_stock(sale.quantity)?;

        self.commit(products, sales, "could not cancel the sale")?;

        info!(product = %sale.product, quantity = sale.quantity, client = %sale.client, "sale cancelled");
        Ok(sale)
    }

    fn commit(
        &self,
        products: Loaded<Product>,
        sales: Loaded<Sale>,
        context: &str,
    ) -> Result<(), LedgerError> {
        let writes = vec![products.into_write(), sales.into_write()]
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| LedgerError::persistence(context, err))?;
        self.store
            .commit(writes)
            .map_err(|err| LedgerError::persistence(context, err))
    }
}

fn find_product<'a>(products: &'a mut [Product], name: &str) -> Result<&'a mut Product, LedgerError> {
    products
        .iter_mut()
        .find(|p| p.name == name)
        .ok_or_else(|| super::products::not_found(name))
}

fn sale_not_found() -> LedgerError {
    LedgerError::NotFound("sale not found".to_string())
}
