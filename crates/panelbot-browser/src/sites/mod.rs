pub mod plus_delivery;
pub mod saborite;
