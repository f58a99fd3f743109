//! Saborite admin panel: product catalog, customer list and order entry.

mod catalog;
mod pdv;

use std::time::Duration;

use panelbot_core::{Customer, Product, SessionProfile, SubmissionOutcome, Timings};

use crate::detail::{expand_details, DetailOutcome};
use crate::driver::PageDriver;
use crate::error::BrowserError;
use crate::order::{OrderRequest, OrderSequencer};
use crate::retry::RetryPolicy;
use crate::table::{read_all, DataTable, PageWalker, RawRow, RowMapper};

pub use catalog::{ProductMapper, ProductModal};
pub use pdv::SaboritePdv;

const TABLE_ID: &str = "DataTables_Table_0";
const PRODUCTS_PATH: &str = "/adm/produtos/lista/";
const CUSTOMERS_PATH: &str = "/adm/usuarios/lista/";
const CUSTOMERS_SETTLE: Duration = Duration::from_secs(2);

/// Customer rows: id, name, phone, then blocked / bot / campaign toggles in
/// cells 4 to 6.
pub struct CustomerMapper;

impl RowMapper for CustomerMapper {
    type Record = Customer;

    fn map(&self, row: &RawRow) -> Option<Customer> {
        if row.cells.len() < 7 {
            return None;
        }
        let flag = |index: usize| row.cells[index].checked.unwrap_or(false);
        Some(Customer {
            id: row.cells[0].text.clone(),
            name: row.cells[1].text.clone(),
            phone: row.cells[2].text.clone(),
            blocked: flag(4),
            allow_bot: flag(5),
            allow_campaigns: flag(6),
        })
    }
}

/// Every product on every reachable page, each expanded with its modal
/// detail. A product whose modal fails keeps empty detail lists; failures are
/// counted per page in the logs.
///
/// # Errors
///
/// [`BrowserError::TableNotFound`] when the product table never renders, or
/// any driver error outside per-product expansion.
pub async fn scrape_products(
    driver: &dyn PageDriver,
    profile: &SessionProfile,
    timings: &Timings,
) -> Result<Vec<Product>, BrowserError> {
    let url = profile.url(PRODUCTS_PATH);
    tracing::info!(%url, "loading product list");
    driver.goto(&url).await?;

    let table = DataTable::new(driver, TABLE_ID, timings);
    table.ensure_present().await?;

    let mapper = ProductMapper::new(&profile.base_url);
    let modal = ProductModal::new(driver, timings);
    let mut walker = PageWalker::start(&table).await?;
    let mut products = Vec::new();
    let mut detail_failures = 0usize;

    while let Some(page) = walker.next_page(&mapper).await? {
        let mut page_failures = 0usize;
        for expanded in expand_details(&modal, page).await {
            if matches!(expanded.detail, DetailOutcome::Failed(_)) {
                page_failures += 1;
            }
            let mut product = expanded.record;
            product.detail = expanded.detail.into_extracted().unwrap_or_default();
            products.push(product);
        }
        if page_failures > 0 {
            tracing::warn!(
                page = walker.cursor().current(),
                failures = page_failures,
                "product details missing for some rows on this page"
            );
        }
        detail_failures += page_failures;
    }

    tracing::info!(
        products = products.len(),
        detail_failures,
        pages = walker.cursor().current(),
        total_pages = walker.cursor().total(),
        "product list scraped"
    );
    Ok(products)
}

/// # Errors
///
/// [`BrowserError::TableNotFound`] when the customer table never renders.
pub async fn scrape_customers(
    driver: &dyn PageDriver,
    profile: &SessionProfile,
    timings: &Timings,
) -> Result<Vec<Customer>, BrowserError> {
    let url = profile.url(CUSTOMERS_PATH);
    tracing::info!(%url, "loading customer list");
    driver.goto(&url).await?;
    driver.settle(CUSTOMERS_SETTLE).await;

    let table = DataTable::new(driver, TABLE_ID, timings);
    table.ensure_present().await?;
    let customers = read_all(&table, &CustomerMapper).await?;

    tracing::info!(customers = customers.len(), "customer list scraped");
    Ok(customers)
}

/// Enters one order on the point-of-sale screen.
///
/// # Errors
///
/// See [`OrderSequencer::submit`].
pub async fn submit_order(
    driver: &dyn PageDriver,
    profile: &SessionProfile,
    timings: &Timings,
    request: &OrderRequest,
) -> Result<SubmissionOutcome, BrowserError> {
    let form = SaboritePdv::new(driver, profile, timings);
    let policy = RetryPolicy::new(timings.line_add_attempts, timings.retry_backoff());
    OrderSequencer::new(&form, policy).submit(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RawCell;
    use crate::test_support::FakePage;
    use serde_json::json;

    fn customer_row(flags: [bool; 3]) -> RawRow {
        let mut cells: Vec<RawCell> = ["9", "Ana Lima", "(11) 98888-7777", "12/03/2024"]
            .iter()
            .map(|text| RawCell {
                text: (*text).to_owned(),
                ..RawCell::default()
            })
            .collect();
        cells.extend(flags.iter().map(|&checked| RawCell {
            checked: Some(checked),
            ..RawCell::default()
        }));
        RawRow { group: None, cells }
    }

    #[test]
    fn maps_customer_flags_from_checkbox_cells() {
        let customer = CustomerMapper.map(&customer_row([false, true, true])).unwrap();
        assert_eq!(customer.id, "9");
        assert_eq!(customer.name, "Ana Lima");
        assert_eq!(customer.phone, "(11) 98888-7777");
        assert!(!customer.blocked);
        assert!(customer.allow_bot);
        assert!(customer.allow_campaigns);
    }

    #[test]
    fn short_customer_rows_are_rejected() {
        let mut row = customer_row([true, true, true]);
        row.cells.truncate(5);
        assert!(CustomerMapper.map(&row).is_none());
    }

    #[tokio::test]
    async fn missing_product_table_is_reported() {
        let page = FakePage::default();
        let err = scrape_products(
            &page,
            &SessionProfile::saborite("https://s.example.com"),
            &Timings::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BrowserError::TableNotFound { .. }));
        assert_eq!(
            page.calls()[0],
            "goto https://s.example.com/adm/produtos/lista/"
        );
    }

    fn product_rows(ids: std::ops::RangeInclusive<u32>) -> serde_json::Value {
        serde_json::Value::Array(
            ids.map(|id| {
                json!({
                    "group": "Pizzas",
                    "cells": [{ "text": id.to_string() }, { "lead": format!("Produto {id}") }]
                })
            })
            .collect(),
        )
    }

    fn pager(active: &str) -> serde_json::Value {
        json!([
            { "label": "Anterior", "previous": true, "disabled": active == "1" },
            { "label": "1", "active": active == "1" },
            { "label": "2", "active": active == "2" },
            { "label": "3", "active": active == "3" },
            { "label": "Próximo", "next": true, "disabled": active == "3" }
        ])
    }

    #[tokio::test]
    async fn products_across_three_pages_keep_failed_modals() {
        let page = FakePage::with_present(&[
            "#DataTables_Table_0",
            "#DataTables_Table_0 tbody tr",
            ".modal-content",
            r#"button[onclick*="setProduto({id: 1});"]"#,
            r#"button[onclick*="setProduto({id: 2});"]"#,
        ]);
        page.push_evaluation(json!(["1", "2", "3"]));
        page.push_evaluation(product_rows(1..=10));
        // product 1: both tabs read
        page.push_evaluation(json!(null));
        page.push_evaluation(json!([{
            "descricao": "Grande", "qtd_atacado": "", "preco_atacado": "",
            "preco_custo": "20,00", "preco": "49,90"
        }]));
        page.push_evaluation(json!(null));
        page.push_evaluation(json!([]));
        // product 2: variations script returns garbage
        page.push_evaluation(json!(null));
        page.push_evaluation(json!("erro"));
        // page 2
        page.push_evaluation(pager("1"));
        page.push_evaluation(json!(true));
        page.push_evaluation(pager("2"));
        page.push_evaluation(product_rows(11..=20));
        // page 3
        page.push_evaluation(pager("2"));
        page.push_evaluation(json!(true));
        page.push_evaluation(pager("3"));
        page.push_evaluation(product_rows(21..=24));

        let products = scrape_products(
            &page,
            &SessionProfile::saborite("https://s.example.com"),
            &Timings::default(),
        )
        .await
        .unwrap();

        assert_eq!(products.len(), 24);
        let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"1"));
        assert_eq!(ids.last(), Some(&"24"));
        assert_eq!(products[0].detail.variations[0].description, "Grande");
        assert!(products[1].detail.variations.is_empty());
        assert!(products[2].detail.variations.is_empty());
        assert_eq!(products[23].category.as_deref(), Some("Pizzas"));
    }

    #[tokio::test]
    async fn customers_single_page() {
        let page = FakePage::with_present(&["#DataTables_Table_0"]);
        page.push_evaluation(serde_json::json!([]));
        page.push_evaluation(serde_json::json!([
            {
                "group": null,
                "cells": [
                    { "text": "1" }, { "text": "Ana" }, { "text": "119" }, { "text": "" },
                    { "checked": true }, { "checked": false }, { "checked": false }
                ]
            },
            { "group": null, "cells": [{ "text": "sem dados" }] }
        ]));

        let customers = scrape_customers(
            &page,
            &SessionProfile::saborite("https://s.example.com"),
            &Timings::default(),
        )
        .await
        .unwrap();

        assert_eq!(customers.len(), 1);
        assert!(customers[0].blocked);
    }
}
