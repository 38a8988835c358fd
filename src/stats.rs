//! Read-only sales statistics.
//!
//! Every aggregation takes an optional inclusive [`DateRange`]. Sales whose
//! date does not parse are skipped, never fatal.

use std::collections::BTreeMap;

use hashbrown::HashMap;

use crate::{
    record::{Product, Sale},
    types::{DateRange, parse_date},
};

/// Product totals ordered from most to least units sold.
pub type Ranking = Vec<(String, u64)>;

fn counted(sale: &Sale, range: Option<&DateRange>) -> bool {
    let Some(date) = parse_date(&sale.date) else {
        return false;
    };
    range.is_none_or(|r| r.contains(date))
}

/// Units sold per day, keyed by `YYYY-MM-DD`.
pub fn sales_by_day(sales: &[Sale], range: Option<&DateRange>) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    for sale in sales.iter().filter(|s| counted(s, range)) {
        *totals.entry(sale.date.clone()).or_insert(0) += u64::from(sale.quantity);
    }
    totals
}

/// Units sold per product, descending by total. Ties keep the order in
/// which the products first appear in `sales`.
pub fn top_products(sales: &[Sale], range: Option<&DateRange>) -> Ranking {
    let mut ranking: Ranking = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for sale in sales.iter().filter(|s| counted(s, range)) {
        let idx = *slot.entry(sale.product.as_str()).or_insert_with(|| {
            ranking.push((sale.product.clone(), 0));
            ranking.len() - 1
        });
        ranking[idx].1 += u64::from(sale.quantity);
    }

    ranking.sort_by(|a, b| b.1.cmp(&a.1));
    ranking
}

/// Units sold per product origin.
///
/// The origin comes from the current `products`, not from the copy stored
/// on the sale. Sales of products that no longer exist, or whose origin is
/// empty, are left out.
pub fn sales_by_origin(
    sales: &[Sale],
    products: &[Product],
    range: Option<&DateRange>,
) -> BTreeMap<String, u64> {
    let mut origin_of: HashMap<&str, &str> = HashMap::with_capacity(products.len());
    for product in products {
        origin_of.entry(product.name.as_str()).or_insert(product.origin.as_str());
    }

    let mut totals = BTreeMap::new();
    for sale in sales.iter().filter(|s| counted(s, range)) {
        let Some(origin) = origin_of.get(sale.product.as_str()).filter(|o| !o.is_empty()) else {
            continue;
        };
        *totals.entry((*origin).to_string()).or_insert(0) += u64::from(sale.quantity);
    }
    totals
}
