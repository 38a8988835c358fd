use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{Value, json};
use stockbook::{
    api::{Request, Response, handle, route},
    core::inventory::Inventory,
    error::Status,
    persist::memory::MemoryStore,
};

fn fixed_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 20).expect("valid date")
}

fn call(inv: &Inventory, method: &str, path: &str, query: &[(&str, &str)], body: Option<Value>) -> Response {
    match route(method, path, query, body) {
        Ok(request) => handle(inv, request),
        Err(rejected) => rejected,
    }
}

fn inventory() -> Inventory {
    Inventory::new(Arc::new(MemoryStore::new())).with_clock(fixed_day)
}

#[test]
fn product_routes_follow_status_classes() {
    let inv = inventory();
    let body = json!({"name": "Apple", "stock": 10, "origin": "Farm A"});

    let created = call(&inv, "POST", "/products", &[], Some(body.clone()));
    assert_eq!(created.status, Status::Created);
    assert_eq!(created.status.http_code(), 201);
    assert_eq!(created.body, body);

    let dup = call(&inv, "POST", "/products", &[], Some(body));
    assert_eq!(dup.status.http_code(), 409);
    assert!(dup.error_message().is_some());

    let listed = call(&inv, "GET", "/products", &[], None);
    assert_eq!(listed.body.as_array().map(Vec::len), Some(1));

    let found = call(&inv, "GET", "/products/Apple", &[], None);
    assert_eq!(found.body["stock"], 10);
    assert_eq!(call(&inv, "GET", "/products/Plum", &[], None).status, Status::NotFound);

    let updated = call(&inv, "PUT", "/products/Apple", &[], Some(json!({"stock": 4})));
    assert_eq!(updated.status, Status::Ok);
    assert_eq!(updated.body["stock"], 4);

    let deleted = call(&inv, "DELETE", "/products/Apple", &[], None);
    assert_eq!(deleted.status, Status::Ok);
    assert!(deleted.body["message"].as_str().is_some());
}

#[test]
fn malformed_payloads_are_invalid_input() {
    let inv = inventory();
    for (method, path, body) in [
        ("POST", "/products", Some(json!({"name": "Apple", "stock": "10", "origin": "A"}))),
        ("POST", "/products", None),
        ("PUT", "/products/Apple", Some(json!({"colour": "red"}))),
        ("POST", "/persons", Some(json!({}))),
        ("POST", "/sales", Some(json!({"product": {"name": "Apple"}, "quantity": 0}))),
        ("PUT", "/sales/change-date", Some(json!({"product": "Apple", "client": "Bob", "old_date": "2024-01-01"}))),
        ("DELETE", "/sales/cancel", Some(json!({"product": "Apple"}))),
    ] {
        let res = call(&inv, method, path, &[], body);
        assert_eq!(res.status.http_code(), 400, "{method} {path}");
        assert!(res.error_message().is_some());
    }
}

#[test]
fn unknown_route_is_not_found() {
    let inv = inventory();
    let res = call(&inv, "PATCH", "/products", &[], None);
    assert_eq!(res.status, Status::NotFound);
    assert!(matches!(
        route("GET", "/stats", &[], None),
        Err(Response {
            status: Status::NotFound,
            ..
        })
    ));
}

#[test]
fn sale_flow_and_statistics_over_routes() {
    let inv = inventory();
    call(&inv, "POST", "/products", &[], Some(json!({"name": "Apple", "stock": 10, "origin": "Farm A"})));
    call(&inv, "POST", "/products", &[], Some(json!({"name": "Pear", "stock": 5, "origin": "Farm B"})));

    let sold = call(
        &inv,
        "POST",
        "/sales",
        &[],
        Some(json!({"product": {"name": "Apple"}, "quantity": 3, "client": "Bob"})),
    );
    assert_eq!(sold.status, Status::Created);
    assert_eq!(sold.body["date"], "2024-02-20");
    assert_eq!(sold.body["origin"], "Farm A");

    let short = call(&inv, "POST", "/sales", &[], Some(json!({"product": {"name": "Pear"}, "quantity": 6})));
    assert_eq!(short.status.http_code(), 400);

    call(&inv, "POST", "/sales", &[], Some(json!({"product": {"name": "Pear"}, "quantity": 3})));
    call(&inv, "POST", "/sales", &[], Some(json!({"product": {"name": "Apple"}, "quantity": 1})));

    let top = call(&inv, "GET", "/stats/top-products", &[], None);
    let order: Vec<_> = top.body.as_object().expect("object").keys().cloned().collect();
    assert_eq!(order, ["Apple", "Pear"]);
    assert_eq!(top.body["Apple"], 4);

    let moved = call(
        &inv,
        "PUT",
        "/sales/change-date",
        &[],
        Some(json!({"product": "Apple", "client": "Bob", "old_date": "2024-02-20", "new_date": "2024-02-01"})),
    );
    assert_eq!(moved.status, Status::Ok);

    let by_day = call(&inv, "GET", "/stats/sales-by-day", &[], None);
    assert_eq!(by_day.body, json!({"2024-02-01": 3, "2024-02-20": 4}));

    let ranged = call(
        &inv,
        "GET",
        "/stats/sales-by-origin",
        &[("start", "2024-02-10"), ("end", "2024-02-28")],
        None,
    );
    assert_eq!(ranged.body, json!({"Farm A": 1, "Farm B": 3}));

    let only_start = call(&inv, "GET", "/stats/sales-by-origin", &[("start", "2024-02-10")], None);
    assert_eq!(only_start.body, json!({"Farm A": 4, "Farm B": 3}));

    let bad = call(
        &inv,
        "GET",
        "/stats/sales-by-day",
        &[("start", "yesterday"), ("end", "2024-02-28")],
        None,
    );
    assert_eq!(bad.status, Status::Ok);
    assert_eq!(bad.body, json!({}));

    let cancelled = call(
        &inv,
        "DELETE",
        "/sales/cancel",
        &[],
        Some(json!({"product": "Apple", "client": "Bob", "date": "2024-02-01"})),
    );
    assert_eq!(cancelled.status, Status::Ok);
    let apple = call(&inv, "GET", "/products/Apple", &[], None);
    assert_eq!(apple.body["stock"], 9);
}

#[test]
fn routed_requests_are_typed() {
    assert_eq!(route("GET", "/persons", &[], None), Ok(Request::ListPersons));
    assert_eq!(
        route("DELETE", "/persons/Ana", &[], None),
        Ok(Request::DeletePerson("Ana".to_string()))
    );
    assert_eq!(route("GET", "/stats/top-products", &[], None), Ok(Request::TopProducts(None)));
}
