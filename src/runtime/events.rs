//! Runtime event stream payloads.

use crate::types::Quantity;

/// Events emitted by the single-writer loop after a mutation commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryEvent {
    /// A product was added.
    ProductCreated {
        /// Product name.
        name: String,
    },
    /// A product changed; `name` is the name after the change.
    ProductUpdated {
        /// Product name.
        name: String,
    },
    /// A product was removed.
    ProductDeleted {
        /// Product name.
        name: String,
    },
    /// A person was added.
    PersonCreated {
        /// Person name.
        name: String,
    },
    /// A person changed.
    PersonUpdated {
        /// Person name.
        name: String,
    },
    /// A person was removed.
    PersonDeleted {
        /// Person name.
        name: String,
    },
    /// A sale was recorded and stock taken.
    SaleRecorded {
        /// Product sold.
        product: String,
        /// Units sold.
        quantity: Quantity,
        /// Buyer.
        client: String,
    },
    /// A sale moved to another day.
    SaleRedated {
        /// Product sold.
        product: String,
        /// New sale day.
        date: String,
    },
    /// A sale was removed and its stock restored.
    SaleCancelled {
        /// Product sold.
        product: String,
        /// Units returned to stock.
        quantity: Quantity,
    },
}
