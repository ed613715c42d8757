//! Document and schema fixtures shared by the integration tests.

#![allow(dead_code)]

use docserde::prelude::*;

pub fn names(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

pub fn doc(json: serde_json::Value) -> DocValue {
    DocValue::from_json(&json)
}

/// `[(0,"a",INT),(1,"b",STRING)]`
pub fn ab_table(props: &Properties) -> Result<SerDeProperties> {
    SerDeProperties::new(props, &names(&["a", "b"]), &[DataType::Int, DataType::String])
}

/// Order documents with `lines` line items each.
pub fn order_documents(count: usize, lines: usize) -> Vec<DocValue> {
    (0..count)
        .map(|i| {
            let items: Vec<serde_json::Value> = (0..lines)
                .map(|l| {
                    serde_json::json!({
                        "sku": format!("sku-{}", l),
                        "qty": (l % 5) + 1,
                        "price": 9.5 + l as f64,
                    })
                })
                .collect();
            doc(serde_json::json!({
                "order_id": i,
                "customer": {"name": format!("customer-{}", i % 7), "tier": "gold"},
                "items": items,
            }))
        })
        .collect()
}

/// Schema and options flattening `order_documents` to one row per line item.
pub fn order_table() -> Result<SerDeProperties> {
    let props = Properties::new()
        .with("ion.customer.path_extractor", "(customer name)")
        .with("ion.sku.path_extractor", "(items * sku)")
        .with("ion.qty.path_extractor", "(items * qty)")
        .with("ion.price.path_extractor", "(items * price)");
    SerDeProperties::new(
        &props,
        &names(&["order_id", "customer", "sku", "qty", "price"]),
        &[
            DataType::BigInt,
            DataType::String,
            DataType::String,
            DataType::SmallInt,
            DataType::Double,
        ],
    )
}
