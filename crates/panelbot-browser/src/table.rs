//! Paginated reads of DataTables-rendered admin tables.
//!
//! A [`TableSource`] exposes the three things pagination needs (page labels,
//! the rows of the current page, and a way to turn the page). [`PageWalker`]
//! drives a source page by page so callers can act on each page's records
//! while its rows are still on screen (detail modals are opened from the
//! row's own buttons).

use std::time::Duration;

use async_trait::async_trait;
use panelbot_core::{PageCursor, Timings};
use serde::Deserialize;

use crate::driver::{decode, js_literal, PageDriver, WaitState};
use crate::error::BrowserError;

const PAGINATION_BUTTONS: &str = ".paginate_button.page-item";
const PAGINATION_ITEMS: &str =
    ".paginate_button.page-item:not(.previous):not(.next):not(.disabled)";
const GROUP_ROW_CLASS: &str = "dtrg-start";
const PAGE_TURN_SETTLE: Duration = Duration::from_millis(500);

/// Snapshot of one `<td>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawCell {
    /// Trimmed `textContent` of the whole cell.
    pub text: String,
    /// First text node of the cell's `.col` block, when it has one.
    pub lead: Option<String>,
    /// Trimmed text of a `p.small` note.
    pub note: String,
    /// Trimmed text of a `.hide` span.
    pub hidden: String,
    /// State of the first checkbox, when the cell has one.
    pub checked: Option<bool>,
    /// Raw `src` of the first image.
    pub image: Option<String>,
    /// `onclick` attributes of every element in the cell, in DOM order.
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRow {
    /// Label of the nearest preceding group header row on this page.
    pub group: Option<String>,
    pub cells: Vec<RawCell>,
}

/// One DataTables pagination button, as rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageButton {
    pub label: String,
    pub disabled: bool,
    pub active: bool,
    pub previous: bool,
    pub next: bool,
}

/// How [`DataTable::go_to_page`] reaches a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTurn {
    /// The numbered button at this position.
    Direct(usize),
    /// The enabled "next" button at this position.
    Next(usize),
}

/// Picks the button that leads to `page`.
///
/// A numbered button matches by its label, never by position: DataTables
/// interleaves disabled "…" buttons once there are many pages.
#[must_use]
pub fn plan_page_turn(buttons: &[PageButton], page: u32) -> Option<PageTurn> {
    let wanted = page.to_string();
    if let Some(idx) = buttons.iter().position(|b| {
        !b.previous && !b.next && !b.disabled && b.label.trim() == wanted
    }) {
        return Some(PageTurn::Direct(idx));
    }
    buttons
        .iter()
        .position(|b| b.next && !b.disabled)
        .map(PageTurn::Next)
}

/// Label of the active numbered button, if any.
fn active_label(buttons: &[PageButton]) -> Option<&str> {
    buttons
        .iter()
        .find(|b| b.active && !b.previous && !b.next)
        .map(|b| b.label.trim())
}

/// Turns a raw row into a typed record, or rejects it.
pub trait RowMapper: Send + Sync {
    type Record: Send;

    fn map(&self, row: &RawRow) -> Option<Self::Record>;
}

#[async_trait]
pub trait TableSource: Send + Sync {
    /// Text of every numbered pagination item.
    async fn page_labels(&self) -> Result<Vec<String>, BrowserError>;

    /// Data rows of the current page, in DOM order, excluding group headers.
    async fn rows(&self) -> Result<Vec<RawRow>, BrowserError>;

    /// Moves to page `page` (1-based). `false` means no control could get there.
    async fn go_to_page(&self, page: u32) -> Result<bool, BrowserError>;
}

/// Highest numeric pagination label, or 1 when there are none.
/// Non-numeric labels ("…") count as zero.
#[must_use]
pub fn max_page_label(labels: &[String]) -> u32 {
    labels
        .iter()
        .map(|label| label.trim().parse::<u32>().unwrap_or(0))
        .max()
        .map_or(1, |max| max.max(1))
}

/// A DataTables table on the driver's current page, addressed by element id.
pub struct DataTable<'a> {
    driver: &'a dyn PageDriver,
    table_id: &'static str,
    element_timeout: Duration,
}

impl<'a> DataTable<'a> {
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, table_id: &'static str, timings: &Timings) -> Self {
        Self {
            driver,
            table_id,
            element_timeout: timings.element_timeout(),
        }
    }

    fn row_selector(&self) -> String {
        format!("#{} tbody tr", self.table_id)
    }

    /// Fails with [`BrowserError::TableNotFound`] unless the table is attached.
    ///
    /// # Errors
    ///
    /// See above.
    pub async fn ensure_present(&self) -> Result<(), BrowserError> {
        let selector = format!("#{}", self.table_id);
        match self
            .driver
            .wait_for(&selector, WaitState::Attached, self.element_timeout)
            .await
        {
            Ok(()) => Ok(()),
            Err(BrowserError::Timeout { .. }) => Err(BrowserError::TableNotFound { selector }),
            Err(err) => Err(err),
        }
    }

    async fn buttons(&self) -> Result<Vec<PageButton>, BrowserError> {
        let script = format!(
            "Array.from(document.querySelectorAll({})).map(el => ({{ \
             label: el.textContent.trim(), \
             disabled: el.classList.contains('disabled'), \
             active: el.classList.contains('active'), \
             previous: el.classList.contains('previous'), \
             next: el.classList.contains('next') }}))",
            js_literal(PAGINATION_BUTTONS)
        );
        decode(self.driver.evaluate(&script).await?, "pagination buttons")
    }

    async fn click_button(&self, index: usize) -> Result<bool, BrowserError> {
        let script = format!(
            "(() => {{ const el = document.querySelectorAll({})[{index}]; if (!el) return false; \
             (el.querySelector('a') || el).click(); return true; }})()",
            js_literal(PAGINATION_BUTTONS)
        );
        Ok(self.driver.evaluate(&script).await?.as_bool().unwrap_or(false))
    }
}

#[async_trait]
impl TableSource for DataTable<'_> {
    async fn page_labels(&self) -> Result<Vec<String>, BrowserError> {
        let script = format!(
            "Array.from(document.querySelectorAll({})).map(el => el.textContent.trim())",
            js_literal(PAGINATION_ITEMS)
        );
        decode(self.driver.evaluate(&script).await?, "pagination labels")
    }

    async fn rows(&self) -> Result<Vec<RawRow>, BrowserError> {
        let script = format!(
            r#"(() => {{
  const out = [];
  let group = null;
  for (const row of document.querySelectorAll({rows})) {{
    if (row.classList.contains({group_class})) {{
      const th = row.querySelector('th') || row;
      group = th.textContent.trim();
      continue;
    }}
    const cells = Array.from(row.querySelectorAll('td')).map(td => {{
      const col = td.querySelector('.col');
      const small = td.querySelector('p.small');
      const hide = td.querySelector('.hide');
      const box = td.querySelector('input[type="checkbox"]');
      const img = td.querySelector('img');
      return {{
        text: td.textContent.trim(),
        lead: col && col.childNodes.length ? col.childNodes[0].textContent.trim() : null,
        note: small ? small.textContent.trim() : '',
        hidden: hide ? hide.textContent.trim() : '',
        checked: box ? box.checked : null,
        image: img ? img.getAttribute('src') : null,
        actions: Array.from(td.querySelectorAll('[onclick]')).map(el => el.getAttribute('onclick')),
      }};
    }});
    if (cells.length > 0) out.push({{ group, cells }});
  }}
  return out;
}})()"#,
            rows = js_literal(&self.row_selector()),
            group_class = js_literal(GROUP_ROW_CLASS),
        );
        decode(self.driver.evaluate(&script).await?, "table rows")
    }

    async fn go_to_page(&self, page: u32) -> Result<bool, BrowserError> {
        let buttons = self.buttons().await?;
        let Some(turn) = plan_page_turn(&buttons, page) else {
            tracing::debug!(page, "no page button and next is disabled");
            return Ok(false);
        };
        let index = match turn {
            PageTurn::Direct(index) => index,
            PageTurn::Next(index) => {
                tracing::debug!(page, "direct page button missing, using next");
                index
            }
        };
        if !self.click_button(index).await? {
            return Ok(false);
        }

        self.driver
            .wait_for(
                &self.row_selector(),
                WaitState::Attached,
                self.element_timeout,
            )
            .await?;
        self.driver.settle(PAGE_TURN_SETTLE).await;

        let after = self.buttons().await?;
        let active = active_label(&after);
        if active == Some(page.to_string().as_str()) {
            Ok(true)
        } else {
            tracing::warn!(page, active = ?active, "page turn did not land on the requested page");
            Ok(false)
        }
    }
}

/// An unpaginated table whose rows are read with `innerText`, as rendered.
pub struct PlainTable<'a> {
    driver: &'a dyn PageDriver,
    row_selector: &'static str,
}

impl<'a> PlainTable<'a> {
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, row_selector: &'static str) -> Self {
        Self {
            driver,
            row_selector,
        }
    }
}

#[async_trait]
impl TableSource for PlainTable<'_> {
    async fn page_labels(&self) -> Result<Vec<String>, BrowserError> {
        Ok(Vec::new())
    }

    async fn rows(&self) -> Result<Vec<RawRow>, BrowserError> {
        let script = format!(
            "Array.from(document.querySelectorAll({})).map(row => ({{ group: null, \
             cells: Array.from(row.querySelectorAll('td')).map(td => ({{ text: (td.innerText || '').trim() }})) }}))\
             .filter(row => row.cells.length > 0)",
            js_literal(self.row_selector)
        );
        decode(self.driver.evaluate(&script).await?, self.row_selector)
    }

    async fn go_to_page(&self, _page: u32) -> Result<bool, BrowserError> {
        Ok(false)
    }
}

/// Walks a table forward one page at a time without revisiting pages.
pub struct PageWalker<'a, S: TableSource + ?Sized> {
    source: &'a S,
    cursor: PageCursor,
    started: bool,
    stalled: bool,
}

impl<'a, S: TableSource + ?Sized> PageWalker<'a, S> {
    /// Counts pages and positions the walker before page 1.
    ///
    /// # Errors
    ///
    /// Propagates errors reading the pagination controls.
    pub async fn start(source: &'a S) -> Result<Self, BrowserError> {
        let total = max_page_label(&source.page_labels().await?);
        tracing::info!(total_pages = total, "table pagination counted");
        Ok(Self {
            source,
            cursor: PageCursor::new(total),
            started: false,
            stalled: false,
        })
    }

    #[must_use]
    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    /// `true` once a page turn failed before the last page was reached.
    #[must_use]
    pub fn stalled(&self) -> bool {
        self.stalled
    }

    /// Records of the next page, or `None` when the walk is over.
    ///
    /// # Errors
    ///
    /// Propagates driver errors; a page that cannot be reached ends the walk
    /// instead of failing it.
    pub async fn next_page<M: RowMapper>(
        &mut self,
        mapper: &M,
    ) -> Result<Option<Vec<M::Record>>, BrowserError> {
        if self.stalled {
            return Ok(None);
        }
        if self.started {
            let Some(next) = self.cursor.peek_next() else {
                return Ok(None);
            };
            if !self.source.go_to_page(next).await? {
                tracing::warn!(
                    page = next,
                    total_pages = self.cursor.total(),
                    "could not reach page, stopping pagination"
                );
                self.stalled = true;
                return Ok(None);
            }
            self.cursor.advance();
        }
        self.started = true;

        let rows = self.source.rows().await?;
        let row_count = rows.len();
        let records: Vec<M::Record> = rows.iter().filter_map(|row| mapper.map(row)).collect();
        tracing::info!(
            page = self.cursor.current(),
            total_pages = self.cursor.total(),
            rows = row_count,
            records = records.len(),
            "table page read"
        );
        Ok(Some(records))
    }
}

/// Reads every reachable page of `source` into one list.
///
/// # Errors
///
/// Propagates driver errors from [`PageWalker`].
pub async fn read_all<S, M>(source: &S, mapper: &M) -> Result<Vec<M::Record>, BrowserError>
where
    S: TableSource + ?Sized,
    M: RowMapper,
{
    let mut walker = PageWalker::start(source).await?;
    let mut records = Vec::new();
    while let Some(page) = walker.next_page(mapper).await? {
        records.extend(page);
    }
    Ok(records)
}
