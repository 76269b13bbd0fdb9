//! `bazaar-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the promotion
//! lifecycle and the inventory ledger (no infrastructure concerns).

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod pagination;
pub mod repository;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::{Entity, sort_with_id_tiebreak};
pub use error::{DomainError, DomainResult, ErrorKind, Reason};
pub use id::{ProductId, PromotionId, UserId};
pub use pagination::{
    OrderBy, PageRequest, PaginatedResult, Pagination, PaginationConfig, PaginationFilter,
    SortDirection, SortField, SortRequest, SortWhitelist,
};
pub use repository::{Page, RepositoryError, RepositoryResult};
pub use validation::{Patch, ValidationPipeline};
