pub mod product_queries;
pub mod visibility_queries;
