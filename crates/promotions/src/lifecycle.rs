//! Promotion state machine: creation vs. proposal, field and status updates,
//! soft deletion and listing.
//!
//! Callers are expected to have authorized the principal already; the engine
//! only enforces domain rules.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use bazaar_auth::{Principal, Role, UserDirectory};
use bazaar_core::{
    Clock, DomainError, DomainResult, OrderBy, PageRequest, PaginatedResult, PaginationConfig,
    PaginationFilter, PromotionId, Reason, SortRequest, SortWhitelist, UserId,
    ValidationPipeline,
    validation::{is_chronological, is_future_date, is_non_blank, is_non_empty_payload},
};

use crate::{
    NewPromotion, Promotion, PromotionChanges, PromotionDraft, PromotionFilter, PromotionPatch,
    PromotionQuery, PromotionRepository, PromotionSortField, PromotionStatus, Removal,
};

/// How a promotion enters the system.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CreationPath {
    /// Admin-tier creation on behalf of a supplier; starts APPROVED.
    Direct,
    /// Supplier proposal; starts PENDING and must start in the future.
    Proposal,
}

impl CreationPath {
    pub fn for_role(role: Role) -> Self {
        if role.is_admin_tier() {
            CreationPath::Direct
        } else {
            CreationPath::Proposal
        }
    }

    pub fn initial_status(self) -> PromotionStatus {
        match self {
            CreationPath::Direct => PromotionStatus::Approved,
            CreationPath::Proposal => PromotionStatus::Pending,
        }
    }
}

fn creation_rules(path: CreationPath) -> ValidationPipeline<NewPromotion> {
    let rules = ValidationPipeline::new().rule(
        "title",
        Reason::ValidationFailed,
        "title must not be blank",
        |p: &NewPromotion| is_non_blank(&p.title),
    );
    let rules = match path {
        CreationPath::Direct => rules,
        CreationPath::Proposal => rules.temporal_rule(
            "startDate",
            Reason::PastStartDate,
            "start date must be in the future",
            |p: &NewPromotion, now| is_future_date(p.start_date, now),
        ),
    };
    rules.rule(
        "endDate",
        Reason::InvalidDateRange,
        "end date must be after start date",
        |p: &NewPromotion| is_chronological(p.start_date, p.end_date),
    )
}

fn patch_rules() -> ValidationPipeline<PromotionPatch> {
    ValidationPipeline::new()
        .rule(
            "body",
            Reason::ValidationFailed,
            "at least one field must be supplied",
            |p: &PromotionPatch| is_non_empty_payload(p),
        )
        .rule(
            "title",
            Reason::ValidationFailed,
            "title must not be blank",
            |p: &PromotionPatch| p.title.as_deref().is_none_or(is_non_blank),
        )
}

fn date_range_rules() -> ValidationPipeline<(DateTime<Utc>, DateTime<Utc>)> {
    ValidationPipeline::new().rule(
        "endDate",
        Reason::InvalidDateRange,
        "end date must be after start date",
        |(start, end): &(DateTime<Utc>, DateTime<Utc>)| is_chronological(*start, *end),
    )
}

pub fn promotion_pagination(config: PaginationConfig) -> PaginationFilter<PromotionSortField> {
    PaginationFilter::new(
        SortWhitelist::new(PromotionSortField::ALL, PromotionSortField::DEFAULT_ORDER),
        config,
    )
}

pub struct LifecycleEngine<R, D, C> {
    repository: R,
    directory: D,
    clock: C,
    pagination: PaginationFilter<PromotionSortField>,
    direct_rules: ValidationPipeline<NewPromotion>,
    proposal_rules: ValidationPipeline<NewPromotion>,
    patch_rules: ValidationPipeline<PromotionPatch>,
    date_rules: ValidationPipeline<(DateTime<Utc>, DateTime<Utc>)>,
}

impl<R, D, C> LifecycleEngine<R, D, C>
where
    R: PromotionRepository,
    D: UserDirectory,
    C: Clock,
{
    pub fn new(repository: R, directory: D, clock: C, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            directory,
            clock,
            pagination: promotion_pagination(pagination),
            direct_rules: creation_rules(CreationPath::Direct),
            proposal_rules: creation_rules(CreationPath::Proposal),
            patch_rules: patch_rules(),
            date_rules: date_range_rules(),
        }
    }

    /// Create (admin tier) or propose (supplier) a promotion.
    ///
    /// On the direct path `target_supplier` names the owner and falls back to
    /// the actor; a proposal is always owned by the proposing supplier.
    pub async fn create_or_propose(
        &self,
        dto: NewPromotion,
        actor: &Principal,
        target_supplier: Option<UserId>,
    ) -> DomainResult<Promotion> {
        let path = CreationPath::for_role(actor.role);
        let now = self.clock.now();

        let rules = match path {
            CreationPath::Direct => &self.direct_rules,
            CreationPath::Proposal => &self.proposal_rules,
        };
        rules.validate(&dto, now)?;

        let supplier_id = match path {
            CreationPath::Direct => target_supplier.unwrap_or(actor.id),
            CreationPath::Proposal => actor.id,
        };
        self.require_supplier(supplier_id).await?;

        let draft = PromotionDraft {
            title: dto.title,
            description: dto.description,
            start_date: dto.start_date,
            end_date: dto.end_date,
            status: path.initial_status(),
            supplier_id,
            created_at: now,
        };
        let promotion = self
            .repository
            .create(draft)
            .await
            .map_err(|e| e.into_domain(Reason::PromotionNotFound))?;

        info!(
            promotion_id = %promotion.id,
            supplier_id = %promotion.supplier_id,
            actor_id = %actor.id,
            status = %promotion.status,
            "promotion created"
        );
        Ok(promotion)
    }

    pub async fn get(&self, id: PromotionId) -> DomainResult<Promotion> {
        debug!(promotion_id = %id, "loading promotion");
        self.load_live(id).await
    }

    pub async fn update_fields(
        &self,
        id: PromotionId,
        patch: PromotionPatch,
    ) -> DomainResult<Promotion> {
        let now = self.clock.now();
        self.patch_rules.validate(&patch, now)?;

        let current = self.load_live(id).await?;
        self.date_rules.validate(&patch.merged_dates(&current), now)?;

        let updated = self
            .repository
            .update(id, PromotionChanges::from_patch(patch, now))
            .await
            .map_err(|e| e.into_domain(Reason::PromotionNotFound))?;

        info!(promotion_id = %id, "promotion updated");
        Ok(updated)
    }

    /// Overwrite the status without checking the source state. Changing an
    /// already reviewed promotion is logged as an override.
    pub async fn update_status(
        &self,
        id: PromotionId,
        status: PromotionStatus,
    ) -> DomainResult<Promotion> {
        let current = self.load_live(id).await?;
        if current.status != PromotionStatus::Pending {
            warn!(
                promotion_id = %id,
                from = %current.status,
                to = %status,
                "overriding a reviewed promotion status"
            );
        }

        let updated = self
            .repository
            .update(id, PromotionChanges::status(status, self.clock.now()))
            .await
            .map_err(|e| e.into_domain(Reason::PromotionNotFound))?;

        info!(promotion_id = %id, status = %updated.status, "promotion status changed");
        Ok(updated)
    }

    /// Soft delete. Live promotions (approved and within their window) are
    /// protected; the live check and the write are one repository step.
    pub async fn delete(&self, id: PromotionId) -> DomainResult<Promotion> {
        let removal = self
            .repository
            .soft_delete_unless_live(id, self.clock.now())
            .await
            .map_err(|e| e.into_domain(Reason::PromotionNotFound))?;

        match removal {
            Removal::Deleted(deleted) => {
                info!(promotion_id = %id, "promotion deleted");
                Ok(deleted)
            }
            Removal::Live => {
                warn!(promotion_id = %id, "refusing to delete an active promotion");
                Err(DomainError::conflict(
                    Reason::CannotDeleteActivePromotion,
                    "an approved promotion cannot be deleted while it is running",
                ))
            }
        }
    }

    pub async fn list_all(
        &self,
        filter: PromotionFilter,
        sort: Option<&SortRequest>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Promotion>> {
        self.list(PromotionQuery::from(filter), sort, page).await
    }

    pub async fn list_by_supplier(
        &self,
        supplier_id: UserId,
        sort: Option<&SortRequest>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Promotion>> {
        let query = PromotionQuery {
            supplier_id: Some(supplier_id),
            ..PromotionQuery::default()
        };
        self.list(query, sort, page).await
    }

    async fn list(
        &self,
        query: PromotionQuery,
        sort: Option<&SortRequest>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Promotion>> {
        let order: OrderBy<PromotionSortField> = self.pagination.resolve_sort(sort)?;
        let window = self.pagination.paginate(page);
        let query = PromotionQuery {
            include_deleted: false,
            ..query
        };

        let found = self
            .repository
            .find_many(query, order, window)
            .await
            .map_err(|e| e.into_domain(Reason::PromotionNotFound))?;

        debug!(total = found.total, page = window.page, "promotions listed");
        Ok(PaginatedResult::new(found.items, found.total, window))
    }

    async fn load_live(&self, id: PromotionId) -> DomainResult<Promotion> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(|e| e.into_domain(Reason::PromotionNotFound))?
            .filter(|p| !p.is_deleted)
            .ok_or(DomainError::not_found(Reason::PromotionNotFound))
    }

    async fn require_supplier(&self, id: UserId) -> DomainResult<()> {
        let user = self
            .directory
            .find_user(id)
            .await
            .map_err(|e| e.into_domain(Reason::UserNotFound))?;
        match user {
            Some(user) if user.role == Role::Supplier => Ok(()),
            _ => {
                warn!(user_id = %id, "supplier could not be resolved");
                Err(DomainError::not_found(Reason::UserNotFound))
            }
        }
    }
}
