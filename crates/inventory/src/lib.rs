//! `bazaar-inventory`: product catalogue and warehouse stock ledger.
//!
//! Quantity rules live here; storage is reached only through
//! [`ProductRepository`].

pub mod ledger;
pub mod product;
pub mod repository;
pub mod service;

pub use ledger::{InventoryLedger, product_pagination, stock_delta};
pub use product::{
    Decrement, NewProduct, Product, ProductChanges, ProductDraft, ProductFilter, ProductPatch,
    ProductSortField, StockMovement, StockReport, StockStatus, sort_products,
};
pub use repository::ProductRepository;
pub use service::{ProductListQuery, ProductsService};

#[cfg(test)]
pub use repository::MockProductRepository;
