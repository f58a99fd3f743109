pub mod chromium;
pub mod detail;
pub mod driver;
pub mod error;
pub mod order;
pub mod retry;
pub mod session;
pub mod sites;
pub mod table;

#[cfg(test)]
mod test_support;

pub use chromium::ChromiumLauncher;
pub use detail::{expand_details, DetailOutcome, DetailView, Expanded};
pub use driver::{BrowserLauncher, Modifiers, PageDriver, WaitState};
pub use error::BrowserError;
pub use order::{
    CustomerChoice, NewCustomer, OrderRequest, OrderSequencer, OrderStage, PaymentOption,
};
pub use retry::RetryPolicy;
pub use session::establish_session;
pub use table::{DataTable, PageWalker, PlainTable, RowMapper, TableSource};
