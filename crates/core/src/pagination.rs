//! Shared pagination and sorting contract.
//!
//! Page/limit are normalized here (absent or non-positive values fall back to
//! the configured defaults). Sort fields are validated against a per-entity
//! whitelist supplied at construction; an unknown field is an error, never a
//! silent fallback.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult, Reason};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_MAX_LIMIT: u64 = 100;

/// Largest offset any backend is asked to skip; fits a signed 64-bit column.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Page size limits, normally produced by infra configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

/// Raw, caller-supplied page request.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }
}

/// Normalized offset window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Normalize with the stock defaults (page 1, limit 10).
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self::with_config(page, limit, &PaginationConfig::default())
    }

    pub fn with_config(page: Option<i64>, limit: Option<i64>, config: &PaginationConfig) -> Self {
        let page = match page {
            Some(p) if p > 0 => p.unsigned_abs(),
            _ => DEFAULT_PAGE,
        };
        let limit = match limit {
            Some(l) if l > 0 => l.unsigned_abs(),
            _ => config.default_limit,
        };
        Self {
            page,
            limit: limit.clamp(1, config.max_limit.max(1)),
        }
    }

    /// Rows to skip, capped at [`MAX_OFFSET`]. Pages past the end are simply
    /// empty.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit).min(MAX_OFFSET)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }

    /// Slice an already ordered collection down to this window.
    pub fn window<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(limit).collect()
    }
}

/// One page of results plus the pre-pagination match count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages: pagination.total_pages(total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Raw, caller-supplied ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRequest {
    pub sort_by: Option<String>,
    pub direction: Option<SortDirection>,
}

impl SortRequest {
    pub fn by(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            sort_by: Some(field.into()),
            direction: Some(direction),
        }
    }
}

/// A sortable field of some entity, named by its external (camelCase) key.
pub trait SortField: Copy + Eq + core::fmt::Debug + Send + Sync + 'static {
    fn key(&self) -> &'static str;
}

/// Validated ordering, ready to hand to a repository.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrderBy<F> {
    pub field: F,
    pub direction: SortDirection,
}

/// Immutable whitelist of sortable fields for one entity.
#[derive(Debug, Clone)]
pub struct SortWhitelist<F: SortField> {
    allowed: Vec<F>,
    default_order: OrderBy<F>,
}

impl<F: SortField> SortWhitelist<F> {
    pub fn new(allowed: impl IntoIterator<Item = F>, default_order: OrderBy<F>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            default_order,
        }
    }

    pub fn allowed(&self) -> &[F] {
        &self.allowed
    }

    pub fn lookup(&self, key: &str) -> Option<F> {
        self.allowed.iter().copied().find(|f| f.key() == key)
    }
}

/// Pagination + sort resolution for one entity.
#[derive(Debug, Clone)]
pub struct PaginationFilter<F: SortField> {
    whitelist: SortWhitelist<F>,
    config: PaginationConfig,
}

impl<F: SortField> PaginationFilter<F> {
    pub fn new(whitelist: SortWhitelist<F>, config: PaginationConfig) -> Self {
        Self { whitelist, config }
    }

    pub fn paginate(&self, request: PageRequest) -> Pagination {
        Pagination::with_config(request.page, request.limit, &self.config)
    }

    /// Resolve a caller ordering against the whitelist.
    ///
    /// No `sort_by` selects the entity default; an unknown one is rejected with
    /// `INVALID_SORT_PARAM`.
    pub fn resolve_sort(&self, request: Option<&SortRequest>) -> DomainResult<OrderBy<F>> {
        let Some(request) = request else {
            return Ok(self.whitelist.default_order);
        };
        let Some(key) = request.sort_by.as_deref() else {
            return Ok(OrderBy {
                field: self.whitelist.default_order.field,
                direction: request
                    .direction
                    .unwrap_or(self.whitelist.default_order.direction),
            });
        };
        let field = self.whitelist.lookup(key).ok_or_else(|| {
            let allowed: Vec<&str> = self.whitelist.allowed().iter().map(|f| f.key()).collect();
            DomainError::invalid_input(
                Reason::InvalidSortParam,
                format!("cannot sort by '{key}'; allowed: {}", allowed.join(", ")),
            )
        })?;
        Ok(OrderBy {
            field,
            direction: request.direction.unwrap_or_default(),
        })
    }
}
