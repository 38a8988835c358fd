use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    error::LedgerError,
    persist::{Collection, RecordStore},
    record::{Product, ProductDraft, ProductPatch},
};

use super::collection::Loaded;

/// CRUD over products keyed by unique name.
///
/// Every call re-reads the whole collection and mutations write it back in
/// full; there is no locking between callers.
#[derive(Clone)]
pub struct ProductLedger {
    store: Arc<dyn RecordStore>,
}

impl ProductLedger {
    /// Builds a ledger over `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub(crate) fn load(&self) -> Loaded<Product> {
        Loaded::load(self.store.as_ref(), Collection::Products)
    }

    /// All products in ledger order.
    pub fn list(&self) -> Vec<Product> {
        self.load().records
    }

    /// First product whose name matches exactly.
    pub fn find(&self, name: &str) -> Option<Product> {
        debug!(product = name, "product lookup");
        self.load().records.into_iter().find(|p| p.name == name)
    }

    /// Adds a product. Fails with `Conflict` when the name is taken.
    pub fn create(&self, draft: ProductDraft) -> Result<Product, LedgerError> {
        let mut products = self.load();
        if products.records.iter().any(|p| p.name == draft.name) {
            return Err(LedgerError::Conflict(format!(
                "product \"{}\" already exists",
                draft.name
            )));
        }

        let product = Product::from(draft);
        products.records.push(product.clone());
        self.persist(products, "could not save the product")?;

        info!(product = %product.name, stock = product.stock, origin = %product.origin, "product created");
        Ok(product)
    }

    /// Overwrites the fields set in `patch` on the first product named
    /// `name`.
    ///
    /// Renaming onto another product's name fails with `Conflict`.
    pub fn update(&self, name: &str, patch: ProductPatch) -> Result<Product, LedgerError> {
        let mut products = self.load();
        if let Some(new_name) = patch.name.as_deref() {
            if new_name != name && products.records.iter().any(|p| p.name == new_name) {
                return Err(LedgerError::Conflict(format!(
                    "product \"{new_name}\" already exists"
                )));
            }
        }

        let rec = products
            .records
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| not_found(name))?;
        patch.apply_to(rec);
        let updated = rec.clone();
        self.persist(products, "could not update the product")?;

        info!(product = name, stock = updated.stock, "product updated");
        Ok(updated)
    }

    /// Removes every product named `name`. Sales referring to it stay.
    pub fn delete(&self, name: &str) -> Result<String, LedgerError> {
        let mut products = self.load();
        let before = products.records.len();
        products.records.retain(|p| p.name != name);
        if products.records.len() == before {
            return Err(not_found(name));
        }

        self.persist(products, "could not delete the product")?;
        info!(product = name, "product deleted");
        Ok(format!("product \"{name}\" deleted"))
    }

    fn persist(&self, products: Loaded<Product>, context: &str) -> Result<(), LedgerError> {
        let write = products
            .into_write()
            .map_err(|err| LedgerError::persistence(context, err))?;
        self.store
            .commit(vec![write])
            .map_err(|err| LedgerError::persistence(context, err))
    }
}

pub(crate) fn not_found(name: &str) -> LedgerError {
    LedgerError::NotFound(format!("product \"{name}\" not found"))
}
