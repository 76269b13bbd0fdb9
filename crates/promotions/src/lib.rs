//! `bazaar-promotions`: supplier promotions and their approval lifecycle.

pub mod lifecycle;
pub mod promotion;
pub mod repository;
pub mod service;

pub use lifecycle::{CreationPath, LifecycleEngine, promotion_pagination};
pub use promotion::{
    NewPromotion, Promotion, PromotionChanges, PromotionDraft, PromotionFilter, PromotionPatch,
    PromotionQuery, PromotionSortField, PromotionStatus, Removal, sort_promotions,
};
pub use repository::PromotionRepository;
pub use service::{PromotionListQuery, PromotionsService};

#[cfg(test)]
pub use repository::MockPromotionRepository;
