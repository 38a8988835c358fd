//! Transport-independent request boundary.
//!
//! [`route`] turns a method, path, query, and JSON body into a validated
//! [`Request`]; [`handle`] runs it against an [`Inventory`] and classifies
//! the outcome. A transport only has to move bytes and map
//! [`Status::http_code`].

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::{
    core::inventory::Inventory,
    error::{LedgerError, Status},
    record::{DateChange, Person, PersonPatch, ProductDraft, ProductPatch, SaleDraft, SaleKey},
    types::DateRange,
};

/// Validated boundary operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `GET /products`
    ListProducts,
    /// `GET /products/{name}`
    GetProduct(String),
    /// `POST /products`
    CreateProduct(ProductDraft),
    /// `PUT /products/{name}`
    UpdateProduct {
        /// Product to change.
        name: String,
        /// Fields to overwrite.
        patch: ProductPatch,
    },
    /// `DELETE /products/{name}`
    DeleteProduct(String),
    /// `GET /persons`
    ListPersons,
    /// `GET /persons/{name}`
    GetPerson(String),
    /// `POST /persons`
    CreatePerson(Person),
    /// `PUT /persons/{name}`
    UpdatePerson {
        /// Person to change.
        name: String,
        /// Fields to overwrite.
        patch: PersonPatch,
    },
    /// `DELETE /persons/{name}`
    DeletePerson(String),
    /// `GET /sales`
    ListSales,
    /// `POST /sales`
    CreateSale(SaleDraft),
    /// `PUT /sales/change-date`
    ChangeSaleDate(DateChange),
    /// `DELETE /sales/cancel`
    CancelSale(SaleKey),
    /// `GET /stats/sales-by-day`
    SalesByDay(Option<DateRange>),
    /// `GET /stats/top-products`
    TopProducts(Option<DateRange>),
    /// `GET /stats/sales-by-origin`
    SalesByOrigin(Option<DateRange>),
}

/// Result payload plus its status class.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Outcome class.
    pub status: Status,
    /// JSON payload; `{"error": ..}` on failure.
    pub body: Value,
}

impl Response {
    fn json<T: Serialize>(status: Status, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self { status, body },
            Err(err) => Self {
                status: Status::ServerError,
                body: json!({ "error": format!("could not encode response: {err}") }),
            },
        }
    }

    fn message(text: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            body: json!({ "message": text.into() }),
        }
    }

    fn error(status: Status, text: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": text.into() }),
        }
    }

    /// Error response for a ledger failure.
    pub fn from_error(err: &LedgerError) -> Self {
        Self::error(err.status(), err.to_string())
    }

    /// The message carried by an error body, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

/// Maps a method, path, query pairs, and optional JSON body onto a
/// [`Request`]. Unknown routes answer `NotFound`; bad payloads answer
/// `InvalidInput`.
pub fn route(
    method: &str,
    path: &str,
    query: &[(&str, &str)],
    payload: Option<Value>,
) -> Result<Request, Response> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let body = || {
        payload
            .clone()
            .ok_or_else(|| LedgerError::InvalidInput("missing request body".to_string()))
    };
    let range = || {
        let get = |key: &str| query.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
        DateRange::from_bounds(get("start"), get("end"))
    };

    let request = match (method, segments.as_slice()) {
        ("GET", ["products"]) => Ok(Request::ListProducts),
        ("POST", ["products"]) => body().and_then(|b| ProductDraft::from_json(&b)).map(Request::CreateProduct),
        ("GET", ["products", name]) => Ok(Request::GetProduct(name.to_string())),
        ("PUT", ["products", name]) => body()
            .and_then(|b| ProductPatch::from_json(&b))
            .map(|patch| Request::UpdateProduct {
                name: name.to_string(),
                patch,
            }),
        ("DELETE", ["products", name]) => Ok(Request::DeleteProduct(name.to_string())),

        ("GET", ["persons"]) => Ok(Request::ListPersons),
        ("POST", ["persons"]) => body().and_then(|b| Person::from_json(&b)).map(Request::CreatePerson),
        ("GET", ["persons", name]) => Ok(Request::GetPerson(name.to_string())),
        ("PUT", ["persons", name]) => body()
            .and_then(|b| PersonPatch::from_json(&b))
            .map(|patch| Request::UpdatePerson {
                name: name.to_string(),
                patch,
            }),
        ("DELETE", ["persons", name]) => Ok(Request::DeletePerson(name.to_string())),

        ("GET", ["sales"]) => Ok(Request::ListSales),
        ("POST", ["sales"]) => body().and_then(|b| SaleDraft::from_json(&b)).map(Request::CreateSale),
        ("PUT", ["sales", "change-date"]) => {
            body().and_then(|b| DateChange::from_json(&b)).map(Request::ChangeSaleDate)
        }
        ("DELETE", ["sales", "cancel"]) => body().and_then(|b| SaleKey::from_json(&b)).map(Request::CancelSale),

        ("GET", ["stats", "sales-by-day"]) => Ok(Request::SalesByDay(range())),
        ("GET", ["stats", "top-products"]) => Ok(Request::TopProducts(range())),
        ("GET", ["stats", "sales-by-origin"]) => Ok(Request::SalesByOrigin(range())),

        _ => {
            return Err(Response::error(
                Status::NotFound,
                format!("no route for {method} {path}"),
            ));
        }
    };

    request.map_err(|err| Response::from_error(&err))
}

/// Runs `request` against `inventory`.
pub fn handle(inventory: &Inventory, request: Request) -> Response {
    let outcome = match request {
        Request::ListProducts => Ok(Response::json(Status::Ok, &inventory.products().list())),
        Request::GetProduct(name) => inventory
            .products()
            .find(&name)
            .map(|p| Response::json(Status::Ok, &p))
            .ok_or_else(|| LedgerError::NotFound(format!("product \"{name}\" not found"))),
        Request::CreateProduct(draft) => inventory
            .products()
            .create(draft)
            .map(|p| Response::json(Status::Created, &p)),
        Request::UpdateProduct { name, patch } => inventory
            .products()
            .update(&name, patch)
            .map(|p| Response::json(Status::Ok, &p)),
        Request::DeleteProduct(name) => inventory.products().delete(&name).map(Response::message),

        Request::ListPersons => Ok(Response::json(Status::Ok, &inventory.persons().list())),
        Request::GetPerson(name) => inventory
            .persons()
            .find(&name)
            .map(|p| Response::json(Status::Ok, &p))
            .ok_or_else(|| LedgerError::NotFound(format!("person \"{name}\" not found"))),
        Request::CreatePerson(person) => inventory
            .persons()
            .create(person)
            .map(|p| Response::json(Status::Created, &p)),
        Request::UpdatePerson { name, patch } => inventory
            .persons()
            .update(&name, patch)
            .map(|p| Response::json(Status::Ok, &p)),
        Request::DeletePerson(name) => inventory.persons().delete(&name).map(Response::message),

        Request::ListSales => Ok(Response::json(Status::Ok, &inventory.sales().list())),
        Request::CreateSale(draft) => inventory
            .sales()
            .create(draft)
            .map(|s| Response::json(Status::Created, &s)),
        Request::ChangeSaleDate(change) => inventory
            .sales()
            .change_date(change)
            .map(|_| Response::message("sale date updated")),
        Request::CancelSale(key) => inventory
            .sales()
            .cancel(key)
            .map(|_| Response::message("sale cancelled and stock restored")),

        Request::SalesByDay(range) => Ok(Response::json(
            Status::Ok,
            &inventory.sales_by_day(range.as_ref()),
        )),
        Request::TopProducts(range) => {
            let ranking: Map<String, Value> = inventory
                .top_products(range.as_ref())
                .into_iter()
                .map(|(name, total)| (name, Value::from(total)))
                .collect();
            Ok(Response::json(Status::Ok, &ranking))
        }
        Request::SalesByOrigin(range) => Ok(Response::json(
            Status::Ok,
            &inventory.sales_by_origin(range.as_ref()),
        )),
    };

    outcome.unwrap_or_else(|err| Response::from_error(&err))
}
