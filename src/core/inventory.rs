use std::{collections::BTreeMap, sync::Arc};

use chrono::NaiveDate;

use crate::{
    persist::RecordStore,
    stats::{self, Ranking},
    types::DateRange,
};

use super::{persons::PersonLedger, products::ProductLedger, sales::SalesLedger};

/// The three ledgers over one injected store. Build it once at startup and
/// hand it to request handlers.
#[derive(Clone)]
pub struct Inventory {
    products: ProductLedger,
    persons: PersonLedger,
    sales: SalesLedger,
}

impl Inventory {
    /// Builds every ledger over `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let products = ProductLedger::new(Arc::clone(&store));
        let persons = PersonLedger::new(Arc::clone(&store));
        let sales = SalesLedger::new(store, products.clone());
        Self {
            products,
            persons,
            sales,
        }
    }

    /// Replaces the sentinel client on new sales.
    pub fn with_default_client(mut self, client: impl Into<String>) -> Self {
        self.sales = self.sales.with_default_client(client);
        self
    }

    /// Replaces the date source used to stamp new sales.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.sales = self.sales.with_clock(today);
        self
    }

    /// Product ledger.
    pub fn products(&self) -> &ProductLedger {
        &self.products
    }

    /// Person ledger.
    pub fn persons(&self) -> &PersonLedger {
        &self.persons
    }

    /// Sales ledger.
    pub fn sales(&self) -> &SalesLedger {
        &self.sales
    }

    /// See [`stats::sales_by_day`].
    pub fn sales_by_day(&self, range: Option<&DateRange>) -> BTreeMap<String, u64> {
        stats::sales_by_day(&self.sales.list(), range)
    }

    /// See [`stats::top_products`].
    pub fn top_products(&self, range: Option<&DateRange>) -> Ranking {
        stats::top_products(&self.sales.list(), range)
    }

    /// See [`stats::sales_by_origin`].
    pub fn sales_by_origin(&self, range: Option<&DateRange>) -> BTreeMap<String, u64> {
        stats::sales_by_origin(&self.sales.list(), &self.products.list(), range)
    }
}
