//! Product, person, and sale records plus their boundary payloads.
//!
//! Stored records derive serde and accept the legacy field names found in
//! older data files. Payloads arriving from a transport are validated once
//! here through the `from_json` constructors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::LedgerError,
    types::{Quantity, SaleId, parse_date},
};

/// Stocked product, keyed by unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique, case-sensitive name.
    #[serde(alias = "nombre")]
    pub name: String,
    /// Units on hand.
    pub stock: Quantity,
    /// Where the product comes from.
    #[serde(default, alias = "origen")]
    pub origin: String,
    /// Keys not known to this version, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Removes `quantity` units, refusing to go below zero.
    pub fn take_stock(&mut self, quantity: Quantity) -> Result<(), LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidInput(
                "quantity must be greater than zero".to_string(),
            ));
        }
        if self.stock < quantity {
            return Err(LedgerError::InsufficientStock {
                product: self.name.clone(),
                requested: quantity,
                available: self.stock,
            });
        }
        self.stock -= quantity;
        Ok(())
    }

    /// Puts `quantity` units back.
    pub fn restore_stock(&mut self, quantity: Quantity) -> Result<(), LedgerError> {
        self.stock = self.stock.checked_add(quantity).ok_or_else(|| {
            LedgerError::InvalidInput(format!("stock of \"{}\" would overflow", self.name))
        })?;
        Ok(())
    }
}

/// Validated payload for creating a [`Product`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    /// Unique name.
    pub name: String,
    /// Initial stock.
    pub stock: Quantity,
    /// Origin label.
    pub origin: String,
}

impl ProductDraft {
    /// Validates a JSON object carrying `name`, `stock`, and `origin`.
    pub fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let invalid = || {
            LedgerError::InvalidInput(
                "name (text), stock (integer) and origin (text) are required".to_string(),
            )
        };
        let obj = value.as_object().ok_or_else(invalid)?;
        let name = field(obj, "name", "nombre").and_then(Value::as_str).ok_or_else(invalid)?;
        let stock = field(obj, "stock", "stock").ok_or_else(invalid)?;
        let origin = field(obj, "origin", "origen").and_then(Value::as_str).ok_or_else(invalid)?;

        Ok(Self {
            name: non_empty(name, "name")?,
            stock: as_stock(stock)?,
            origin: origin.to_string(),
        })
    }
}

impl From<ProductDraft> for Product {
    fn from(draft: ProductDraft) -> Self {
        Self {
            name: draft.name,
            stock: draft.stock,
            origin: draft.origin,
            extra: Map::new(),
        }
    }
}

/// Sparse product update where each `Some` field overwrites the record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductPatch {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement stock.
    pub stock: Option<Quantity>,
    /// Replacement origin.
    pub origin: Option<String>,
}

impl ProductPatch {
    /// Validates a JSON object holding any subset of the product fields.
    pub fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let obj = object(value)?;
        let mut patch = Self::default();
        for (key, v) in obj {
            match key.as_str() {
                "name" | "nombre" => patch.name = Some(non_empty(text(v, "name")?, "name")?),
                "stock" => patch.stock = Some(as_stock(v)?),
                "origin" | "origen" => patch.origin = Some(text(v, "origin")?.to_string()),
                other => return Err(unknown_field(other)),
            }
        }
        Ok(patch)
    }

    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies this patch in place to `rec`.
    pub fn apply_to(&self, rec: &mut Product) {
        if let Some(v) = &self.name {
            rec.name = v.clone();
        }
        if let Some(v) = self.stock {
            rec.stock = v;
        }
        if let Some(v) = &self.origin {
            rec.origin = v.clone();
        }
    }
}

/// Customer or employee, keyed by unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Unique, case-sensitive name.
    #[serde(alias = "nombre")]
    pub name: String,
    /// Keys not known to this version, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Person {
    /// Validates a JSON object carrying a non-empty `name`.
    pub fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let missing = || LedgerError::InvalidInput("name is required".to_string());
        let obj = value.as_object().ok_or_else(missing)?;
        let name = field(obj, "name", "nombre").ok_or_else(missing)?;
        Ok(Self {
            name: non_empty(text(name, "name")?, "name")?,
            extra: Map::new(),
        })
    }
}

/// Sparse person update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonPatch {
    /// Replacement name.
    pub name: Option<String>,
}

impl PersonPatch {
    /// Validates a JSON object holding an optional `name`.
    pub fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let obj = object(value)?;
        let mut patch = Self::default();
        for (key, v) in obj {
            match key.as_str() {
                "name" | "nombre" => patch.name = Some(non_empty(text(v, "name")?, "name")?),
                other => return Err(unknown_field(other)),
            }
        }
        Ok(patch)
    }

    /// Applies this patch in place to `rec`.
    pub fn apply_to(&self, rec: &mut Person) {
        if let Some(v) = &self.name {
            rec.name = v.clone();
        }
    }
}

/// Recorded sale. `product` is a by-name reference and `origin` is a copy
/// taken when the sale was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Generated identifier; absent on records written before ids existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SaleId>,
    /// Product name.
    #[serde(alias = "producto")]
    pub product: String,
    /// Units sold.
    #[serde(alias = "cantidad")]
    pub quantity: Quantity,
    /// Client name or the sentinel client.
    #[serde(alias = "cliente")]
    pub client: String,
    /// Product origin at sale time.
    #[serde(default, alias = "origen")]
    pub origin: String,
    /// Sale day, `YYYY-MM-DD`.
    #[serde(alias = "fecha")]
    pub date: String,
    /// Keys not known to this version, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Validated payload for recording a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDraft {
    /// Product name.
    pub product: String,
    /// Units to sell, always positive.
    pub quantity: Quantity,
    /// Client; `None` resolves to the sentinel client.
    pub client: Option<String>,
}

impl SaleDraft {
    /// Validates `{"product": {"name": ..}, "quantity": n, "client": ..}`.
    pub fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let invalid = || {
            LedgerError::InvalidInput(
                "product (object with name) and quantity (integer) are required".to_string(),
            )
        };
        let obj = value.as_object().ok_or_else(invalid)?;
        let product = field(obj, "product", "producto")
            .and_then(Value::as_object)
            .ok_or_else(invalid)?;
        let quantity = field(obj, "quantity", "cantidad")
            .filter(|v| v.is_i64() || v.is_u64())
            .ok_or_else(invalid)?;

        let name = field(product, "name", "nombre").and_then(Value::as_str);
        let quantity = quantity.as_u64().filter(|q| *q > 0);
        let (Some(name), Some(quantity)) = (name, quantity) else {
            return Err(LedgerError::InvalidInput(
                "product name (text) and quantity (> 0) are required".to_string(),
            ));
        };
        let quantity = Quantity::try_from(quantity)
            .map_err(|_| LedgerError::InvalidInput(format!("quantity {quantity} is too large")))?;

        let client = match field(obj, "client", "cliente") {
            None | Some(Value::Null) => None,
            Some(v) => Some(text(v, "client")?.to_string()),
        };

        Ok(Self {
            product: name.to_string(),
            quantity,
            client,
        })
    }
}

/// Exact-match selector for a sale: first sale in ledger order wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleKey {
    /// Product name.
    pub product: String,
    /// Client name.
    pub client: String,
    /// Sale day.
    pub date: String,
}

impl SaleKey {
    /// Builds a key, requiring every part to be non-empty.
    pub fn new(
        product: impl Into<String>,
        client: impl Into<String>,
        date: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        let key = Self {
            product: product.into(),
            client: client.into(),
            date: date.into(),
        };
        if key.product.is_empty() || key.client.is_empty() || key.date.is_empty() {
            return Err(LedgerError::InvalidInput(
                "product, client and date are required".to_string(),
            ));
        }
        Ok(key)
    }

    /// Validates `{"product", "client", "date"}`.
    pub fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let obj = object(value)?;
        Self::new(
            opt_text(obj, "product", "producto"),
            opt_text(obj, "client", "cliente"),
            opt_text(obj, "date", "fecha"),
        )
    }

    /// True when `sale` carries exactly this product, client, and date.
    pub fn matches(&self, sale: &Sale) -> bool {
        sale.product == self.product && sale.client == self.client && sale.date == self.date
    }
}

/// Request to move a sale to another day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateChange {
    /// Sale currently dated `key.date`.
    pub key: SaleKey,
    /// Replacement day, `YYYY-MM-DD`.
    pub new_date: String,
}

impl DateChange {
    /// Builds a change request; all four parts must be non-empty and the
    /// new date must parse.
    pub fn new(
        product: impl Into<String>,
        client: impl Into<String>,
        old_date: impl Into<String>,
        new_date: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        let missing = || {
            LedgerError::InvalidInput(
                "product, client, old_date and new_date are required".to_string(),
            )
        };
        let new_date = new_date.into();
        let key = SaleKey::new(product, client, old_date).map_err(|_| missing())?;
        if new_date.is_empty() {
            return Err(missing());
        }
        if parse_date(&new_date).is_none() {
            return Err(LedgerError::InvalidInput(format!(
                "new_date \"{new_date}\" is not in YYYY-MM-DD form"
            )));
        }
        Ok(Self { key, new_date })
    }

    /// Validates `{"product", "client", "old_date", "new_date"}`.
    pub fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let obj = object(value)?;
        Self::new(
            opt_text(obj, "product", "producto"),
            opt_text(obj, "client", "cliente"),
            opt_text(obj, "old_date", "fecha_anterior"),
            opt_text(obj, "new_date", "nueva_fecha"),
        )
    }
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str, legacy: &str) -> Option<&'a Value> {
    obj.get(key).or_else(|| obj.get(legacy))
}

fn opt_text<'a>(obj: &'a Map<String, Value>, key: &str, legacy: &str) -> &'a str {
    field(obj, key, legacy).and_then(Value::as_str).unwrap_or_default()
}

fn object(value: &Value) -> Result<&Map<String, Value>, LedgerError> {
    value
        .as_object()
        .ok_or_else(|| LedgerError::InvalidInput("request body must be an object".to_string()))
}

fn text<'a>(value: &'a Value, name: &str) -> Result<&'a str, LedgerError> {
    value
        .as_str()
        .ok_or_else(|| LedgerError::InvalidInput(format!("{name} must be text")))
}

fn non_empty(value: &str, name: &str) -> Result<String, LedgerError> {
    if value.is_empty() {
        return Err(LedgerError::InvalidInput(format!("{name} must not be empty")));
    }
    Ok(value.to_string())
}

fn as_stock(value: &Value) -> Result<Quantity, LedgerError> {
    if !(value.is_i64() || value.is_u64()) {
        return Err(LedgerError::InvalidInput("stock must be an integer".to_string()));
    }
    value
        .as_u64()
        .and_then(|v| Quantity::try_from(v).ok())
        .ok_or_else(|| LedgerError::InvalidInput(format!("stock {value} is out of range")))
}

fn unknown_field(name: &str) -> LedgerError {
    LedgerError::InvalidInput(format!("unknown field \"{name}\""))
}
