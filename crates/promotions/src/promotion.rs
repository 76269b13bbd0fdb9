use core::cmp::Ordering;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{
    DomainError, Entity, OrderBy, Patch, PromotionId, SortDirection, SortField, UserId,
    sort_with_id_tiebreak, validation::text_present,
};

/// Promotion approval state.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl PromotionStatus {
    pub const ALL: [PromotionStatus; 3] = [
        PromotionStatus::Pending,
        PromotionStatus::Approved,
        PromotionStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionStatus::Pending => "PENDING",
            PromotionStatus::Approved => "APPROVED",
            PromotionStatus::Rejected => "REJECTED",
        }
    }
}

impl core::fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromotionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown promotion status '{s}'")))
    }
}

/// A time-bounded marketing offer owned by a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: PromotionId,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PromotionStatus,
    pub supplier_id: UserId,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// Approved and inside its date window at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == PromotionStatus::Approved
            && !self.is_deleted
            && self.start_date <= now
            && now <= self.end_date
    }
}

impl Entity for Promotion {
    type Id = PromotionId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Caller payload for creating (or proposing) a promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromotion {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl PromotionPatch {
    /// Effective date pair once this patch is applied over `current`.
    pub fn merged_dates(&self, current: &Promotion) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.start_date.unwrap_or(current.start_date),
            self.end_date.unwrap_or(current.end_date),
        )
    }
}

impl Patch for PromotionPatch {
    fn present_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if text_present(self.title.as_deref()) {
            fields.push("title");
        }
        if text_present(self.description.as_deref()) {
            fields.push("description");
        }
        if self.start_date.is_some() {
            fields.push("startDate");
        }
        if self.end_date.is_some() {
            fields.push("endDate");
        }
        fields
    }
}

/// Fully-formed record handed to the repository on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionDraft {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PromotionStatus,
    pub supplier_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Column-level changes applied by the repository; `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<PromotionStatus>,
    pub is_deleted: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl PromotionChanges {
    pub fn touch(updated_at: DateTime<Utc>) -> Self {
        Self {
            title: None,
            description: None,
            start_date: None,
            end_date: None,
            status: None,
            is_deleted: None,
            updated_at,
        }
    }

    pub fn from_patch(patch: PromotionPatch, updated_at: DateTime<Utc>) -> Self {
        Self {
            title: patch.title,
            description: patch.description,
            start_date: patch.start_date,
            end_date: patch.end_date,
            ..Self::touch(updated_at)
        }
    }

    pub fn status(status: PromotionStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            status: Some(status),
            ..Self::touch(updated_at)
        }
    }

    pub fn soft_delete(updated_at: DateTime<Utc>) -> Self {
        Self {
            is_deleted: Some(true),
            ..Self::touch(updated_at)
        }
    }

    /// Apply onto an in-memory copy.
    pub fn apply(self, promotion: &mut Promotion) {
        if let Some(title) = self.title {
            promotion.title = title;
        }
        if let Some(description) = self.description {
            promotion.description = description;
        }
        if let Some(start) = self.start_date {
            promotion.start_date = start;
        }
        if let Some(end) = self.end_date {
            promotion.end_date = end;
        }
        if let Some(status) = self.status {
            promotion.status = status;
        }
        if let Some(deleted) = self.is_deleted {
            promotion.is_deleted = deleted;
        }
        promotion.updated_at = self.updated_at;
    }
}

/// Outcome of a guarded soft delete.
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    Deleted(Promotion),
    /// Approved and running at the requested instant; nothing was written.
    Live,
}

/// Caller-facing list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionFilter {
    pub status: Option<PromotionStatus>,
    pub supplier_id: Option<UserId>,
    /// Case-insensitive substring match on the title.
    pub title: Option<String>,
}

/// Repository-level query; deleted rows are excluded unless `include_deleted`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionQuery {
    pub status: Option<PromotionStatus>,
    pub supplier_id: Option<UserId>,
    pub title_contains: Option<String>,
    pub include_deleted: bool,
}

impl PromotionQuery {
    pub fn matches(&self, promotion: &Promotion) -> bool {
        if promotion.is_deleted && !self.include_deleted {
            return false;
        }
        if self.status.is_some_and(|s| s != promotion.status) {
            return false;
        }
        if self.supplier_id.is_some_and(|s| s != promotion.supplier_id) {
            return false;
        }
        match self.title_contains.as_deref() {
            Some(needle) => promotion
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

impl From<PromotionFilter> for PromotionQuery {
    fn from(filter: PromotionFilter) -> Self {
        Self {
            status: filter.status,
            supplier_id: filter.supplier_id,
            title_contains: filter.title.filter(|t| !t.trim().is_empty()),
            include_deleted: false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PromotionSortField {
    Id,
    Title,
    StartDate,
    EndDate,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl PromotionSortField {
    pub const ALL: [PromotionSortField; 7] = [
        PromotionSortField::Id,
        PromotionSortField::Title,
        PromotionSortField::StartDate,
        PromotionSortField::EndDate,
        PromotionSortField::Status,
        PromotionSortField::CreatedAt,
        PromotionSortField::UpdatedAt,
    ];

    pub const DEFAULT_ORDER: OrderBy<PromotionSortField> = OrderBy {
        field: PromotionSortField::CreatedAt,
        direction: SortDirection::Desc,
    };

    fn compare(&self, a: &Promotion, b: &Promotion) -> Ordering {
        match self {
            PromotionSortField::Id => a.id.cmp(&b.id),
            PromotionSortField::Title => a.title.cmp(&b.title),
            PromotionSortField::StartDate => a.start_date.cmp(&b.start_date),
            PromotionSortField::EndDate => a.end_date.cmp(&b.end_date),
            PromotionSortField::Status => a.status.as_str().cmp(b.status.as_str()),
            PromotionSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            PromotionSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

impl SortField for PromotionSortField {
    fn key(&self) -> &'static str {
        match self {
            PromotionSortField::Id => "id",
            PromotionSortField::Title => "title",
            PromotionSortField::StartDate => "startDate",
            PromotionSortField::EndDate => "endDate",
            PromotionSortField::Status => "status",
            PromotionSortField::CreatedAt => "createdAt",
            PromotionSortField::UpdatedAt => "updatedAt",
        }
    }
}

/// Sort in place by `order`, breaking ties by ascending id.
pub fn sort_promotions(items: &mut [Promotion], order: OrderBy<PromotionSortField>) {
    sort_with_id_tiebreak(items, order.direction, |a, b| order.field.compare(a, b));
}
