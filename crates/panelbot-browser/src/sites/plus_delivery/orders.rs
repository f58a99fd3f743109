//! Recent orders on the PlusDelivery dashboard and their detail panel.

use std::time::Duration;

use async_trait::async_trait;
use panelbot_core::{Order, Timings};

use crate::detail::{expand_details, DetailOutcome, DetailView, Expanded};
use crate::driver::{PageDriver, WaitState};
use crate::error::BrowserError;
use crate::table::{read_all, PlainTable, RawRow, RowMapper};

const ORDERS_TABLE: &str = "#listaPedidos";
const ORDER_ROWS: &str = "#listaPedidos tr";
const DETAIL_PANEL: &str = ".ta_visualizar_pedido";
const DETAIL_TIMEOUT: Duration = Duration::from_secs(10);
const DETAIL_OPEN_SETTLE: Duration = Duration::from_secs(2);
const BETWEEN_ORDERS_SETTLE: Duration = Duration::from_secs(1);

pub const DETAILS_UNAVAILABLE: &str = "Detalhes não disponíveis";
pub const DETAILS_FAILED: &str = "Erro ao coletar detalhes";

fn detail_button(order_id: &str) -> String {
    format!(r#"#btnDetalhePedido[identificacao="{order_id}"]"#)
}

/// Order rows: `# id`, customer, date/time, status.
pub struct OrderMapper;

impl RowMapper for OrderMapper {
    type Record = Order;

    fn map(&self, row: &RawRow) -> Option<Order> {
        let text = |index: usize| {
            row.cells
                .get(index)
                .map(|cell| cell.text.trim().to_owned())
                .unwrap_or_default()
        };
        let first = row.cells.first()?;
        let status = text(3);
        Some(Order {
            id: first.text.trim().replacen("# ", "", 1),
            customer: text(1),
            placed_at: text(2),
            status: (!status.is_empty()).then_some(status),
            details: None,
        })
    }
}

/// Side panel opened from an order's detail button; yields its markup.
pub struct OrderDetailPanel<'a> {
    driver: &'a dyn PageDriver,
}

impl<'a> OrderDetailPanel<'a> {
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver) -> Self {
        Self { driver }
    }

    async fn read_markup(&self) -> Result<String, BrowserError> {
        self.driver
            .inner_html(DETAIL_PANEL)
            .await?
            .ok_or_else(|| BrowserError::ElementNotFound {
                selector: DETAIL_PANEL.to_owned(),
            })
    }
}

#[async_trait]
impl DetailView<Order> for OrderDetailPanel<'_> {
    type Detail = String;

    fn describe(&self, record: &Order) -> String {
        format!("#{}", record.id)
    }

    async fn available(&self, record: &Order) -> Result<bool, BrowserError> {
        self.driver.exists(&detail_button(&record.id)).await
    }

    async fn open(&self, record: &Order) -> Result<(), BrowserError> {
        self.driver.click(&detail_button(&record.id)).await?;
        self.driver.settle(DETAIL_OPEN_SETTLE).await;
        self.driver
            .wait_for(DETAIL_PANEL, WaitState::Visible, DETAIL_TIMEOUT)
            .await
    }

    async fn extract(&self, _record: &Order) -> Result<String, BrowserError> {
        self.read_markup().await
    }

    async fn close(&self, _record: &Order) -> Result<(), BrowserError> {
        self.driver.settle(BETWEEN_ORDERS_SETTLE).await;
        Ok(())
    }
}

fn with_details(expanded: Expanded<Order, String>) -> Order {
    let Expanded { mut record, detail } = expanded;
    record.details = Some(match detail {
        DetailOutcome::Extracted(markup) => markup,
        DetailOutcome::Skipped => DETAILS_UNAVAILABLE.to_owned(),
        DetailOutcome::Failed(_) => DETAILS_FAILED.to_owned(),
    });
    record
}

async fn ensure_orders_table(driver: &dyn PageDriver, timings: &Timings) -> Result<(), BrowserError> {
    driver.settle(timings.table_settle()).await;
    if driver.exists(ORDERS_TABLE).await? {
        Ok(())
    } else {
        Err(BrowserError::TableNotFound {
            selector: ORDERS_TABLE.to_owned(),
        })
    }
}

/// The first `limit` orders in table order, each with its detail markup.
///
/// # Errors
///
/// [`BrowserError::TableNotFound`] when the dashboard has no order table.
pub async fn list_orders(
    driver: &dyn PageDriver,
    timings: &Timings,
    limit: usize,
) -> Result<Vec<Order>, BrowserError> {
    ensure_orders_table(driver, timings).await?;

    let mut orders = read_all(&PlainTable::new(driver, ORDER_ROWS), &OrderMapper).await?;
    tracing::info!(orders = orders.len(), limit, "order table read");
    orders.truncate(limit);

    let panel = OrderDetailPanel::new(driver);
    Ok(expand_details(&panel, orders)
        .await
        .into_iter()
        .map(with_details)
        .collect())
}

/// One order by id with its detail markup.
///
/// # Errors
///
/// [`BrowserError::OrderNotFound`] when no detail button or row carries the
/// id; panel failures propagate.
pub async fn find_order(
    driver: &dyn PageDriver,
    timings: &Timings,
    order_id: &str,
) -> Result<Order, BrowserError> {
    ensure_orders_table(driver, timings).await?;

    let not_found = || BrowserError::OrderNotFound {
        id: order_id.to_owned(),
    };
    if !driver.exists(&detail_button(order_id)).await? {
        return Err(not_found());
    }

    let mut order = read_all(&PlainTable::new(driver, ORDER_ROWS), &OrderMapper)
        .await?
        .into_iter()
        .find(|order| order.id == order_id)
        .ok_or_else(not_found)?;

    let panel = OrderDetailPanel::new(driver);
    panel.open(&order).await?;
    order.details = Some(panel.read_markup().await?);
    tracing::info!(order_id, "order detail read");
    Ok(order)
}
