pub mod product_ids;

pub use product_ids::ProductIds;
