//! PlusDelivery admin dashboard: recent orders and menus.
//!
//! Both views live on the page reached right after login, so these flows
//! never navigate to a listing URL themselves.

mod menus;
mod orders;

pub use menus::{list_menus, MenuProducts};
pub use orders::{
    find_order, list_orders, OrderDetailPanel, OrderMapper, DETAILS_FAILED, DETAILS_UNAVAILABLE,
};

/// Orders returned by [`list_orders`] when the caller gives no limit.
pub const DEFAULT_ORDER_LIMIT: usize = 10;
