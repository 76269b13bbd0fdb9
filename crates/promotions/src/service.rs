use serde::{Deserialize, Serialize};

use bazaar_auth::{Action, AuthorizationPolicy, Principal, ResourceClass, UserDirectory};
use bazaar_core::{
    Clock, DomainError, DomainResult, PageRequest, PaginatedResult, PaginationConfig, PromotionId,
    SortRequest, UserId,
};

use crate::{
    LifecycleEngine, NewPromotion, Promotion, PromotionFilter, PromotionPatch,
    PromotionRepository, PromotionStatus,
};

/// Query-string shaped list request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionListQuery {
    #[serde(flatten)]
    pub filter: PromotionFilter,
    #[serde(flatten)]
    pub sort: SortRequest,
    #[serde(flatten)]
    pub page: PageRequest,
}

/// Entry point for promotion operations.
///
/// Every call authorizes the principal first, then parses raw ids, then hands
/// off to the [`LifecycleEngine`]. A denied call never reaches validation or
/// storage.
pub struct PromotionsService<R, D, C> {
    policy: AuthorizationPolicy,
    engine: LifecycleEngine<R, D, C>,
}

impl<R, D, C> PromotionsService<R, D, C>
where
    R: PromotionRepository,
    D: UserDirectory,
    C: Clock,
{
    pub fn new(
        policy: AuthorizationPolicy,
        repository: R,
        directory: D,
        clock: C,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            policy,
            engine: LifecycleEngine::new(repository, directory, clock, pagination),
        }
    }

    fn authorize<'p>(
        &self,
        principal: Option<&'p Principal>,
        action: Action,
    ) -> DomainResult<&'p Principal> {
        self.policy
            .authorize(principal, action, ResourceClass::Promotion)?;
        principal.ok_or(DomainError::Unauthorized)
    }

    /// Admin-tier callers create approved promotions for `supplier_id`;
    /// suppliers propose pending ones for themselves.
    pub async fn create_promotion(
        &self,
        principal: Option<&Principal>,
        dto: NewPromotion,
        supplier_id: Option<i64>,
    ) -> DomainResult<Promotion> {
        let actor = self.authorize(principal, Action::Create)?;
        let target = supplier_id.map(UserId::try_from).transpose()?;
        self.engine.create_or_propose(dto, actor, target).await
    }

    pub async fn get_promotion(
        &self,
        principal: Option<&Principal>,
        id: i64,
    ) -> DomainResult<Promotion> {
        self.authorize(principal, Action::Read)?;
        self.engine.get(PromotionId::try_from(id)?).await
    }

    pub async fn update_promotion(
        &self,
        principal: Option<&Principal>,
        id: i64,
        patch: PromotionPatch,
    ) -> DomainResult<Promotion> {
        self.authorize(principal, Action::Update)?;
        self.engine
            .update_fields(PromotionId::try_from(id)?, patch)
            .await
    }

    pub async fn update_promotion_status(
        &self,
        principal: Option<&Principal>,
        id: i64,
        status: PromotionStatus,
    ) -> DomainResult<Promotion> {
        self.authorize(principal, Action::StatusUpdate)?;
        self.engine
            .update_status(PromotionId::try_from(id)?, status)
            .await
    }

    pub async fn delete_promotion(
        &self,
        principal: Option<&Principal>,
        id: i64,
    ) -> DomainResult<Promotion> {
        self.authorize(principal, Action::Delete)?;
        self.engine.delete(PromotionId::try_from(id)?).await
    }

    pub async fn list_promotions(
        &self,
        principal: Option<&Principal>,
        query: PromotionListQuery,
    ) -> DomainResult<PaginatedResult<Promotion>> {
        self.authorize(principal, Action::ListAll)?;
        self.engine
            .list_all(query.filter, Some(&query.sort), query.page)
            .await
    }

    /// Promotions owned by the calling supplier.
    pub async fn list_my_promotions(
        &self,
        principal: Option<&Principal>,
        sort: SortRequest,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Promotion>> {
        let actor = self.authorize(principal, Action::ListMine)?;
        self.engine
            .list_by_supplier(actor.id, Some(&sort), page)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use bazaar_auth::{Role, UserRecord};
    use bazaar_core::{ErrorKind, FixedClock, Reason, RepositoryResult};
    use chrono::{Duration, TimeZone, Utc};

    use crate::MockPromotionRepository;

    /// Fails the test if consulted.
    struct UntouchedDirectory;

    #[async_trait]
    impl UserDirectory for UntouchedDirectory {
        async fn find_user(&self, id: UserId) -> RepositoryResult<Option<UserRecord>> {
            panic!("directory consulted for {id}");
        }
    }

    fn silent_repository() -> MockPromotionRepository {
        let mut repository = MockPromotionRepository::new();
        repository.expect_create().never();
        repository.expect_find_by_id().never();
        repository.expect_find_many().never();
        repository.expect_update().never();
        repository.expect_delete().never();
        repository
    }

    fn service() -> PromotionsService<MockPromotionRepository, UntouchedDirectory, FixedClock> {
        PromotionsService::new(
            AuthorizationPolicy::default(),
            silent_repository(),
            UntouchedDirectory,
            FixedClock::new(Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap()),
            PaginationConfig::default(),
        )
    }

    fn dto() -> NewPromotion {
        let start = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        NewPromotion {
            title: "Back to school".into(),
            description: String::new(),
            start_date: start,
            end_date: start + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn anonymous_calls_never_reach_storage() {
        let service = service();
        let errors = [
            service.create_promotion(None, dto(), None).await.unwrap_err(),
            service.get_promotion(None, 1).await.unwrap_err(),
            service
                .update_promotion(None, 1, PromotionPatch::default())
                .await
                .unwrap_err(),
            service
                .update_promotion_status(None, 1, PromotionStatus::Approved)
                .await
                .unwrap_err(),
            service.delete_promotion(None, 1).await.unwrap_err(),
            service
                .list_promotions(None, PromotionListQuery::default())
                .await
                .unwrap_err(),
            service
                .list_my_promotions(None, SortRequest::default(), PageRequest::default())
                .await
                .unwrap_err(),
        ];
        for err in errors {
            assert_eq!(err, DomainError::Unauthorized);
        }
    }

    #[tokio::test]
    async fn forbidden_roles_never_reach_storage() {
        let service = service();
        let supplier = Principal::new(UserId::new(2), "s@example.com", Role::Supplier);
        let manager = Principal::new(UserId::new(3), "w@example.com", Role::WarehouseManager);
        let admin = Principal::new(UserId::new(1), "a@example.com", Role::Admin);

        let err = service
            .delete_promotion(Some(&supplier), 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = service
            .update_promotion_status(Some(&supplier), 1, PromotionStatus::Approved)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Reason::Forbidden);

        let err = service
            .create_promotion(Some(&manager), dto(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = service
            .list_my_promotions(Some(&admin), SortRequest::default(), PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn malformed_ids_fail_before_storage() {
        let service = service();
        let admin = Principal::new(UserId::new(1), "a@example.com", Role::SuperAdmin);

        for id in [0, -4] {
            let err = service.get_promotion(Some(&admin), id).await.unwrap_err();
            assert_eq!(err.reason(), Reason::InvalidId);
        }
        let err = service
            .create_promotion(Some(&admin), dto(), Some(0))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Reason::InvalidId);
    }

    #[tokio::test]
    async fn invalid_payloads_fail_before_storage() {
        let service = service();
        let admin = Principal::new(UserId::new(1), "a@example.com", Role::Admin);

        let err = service
            .update_promotion(Some(&admin), 5, PromotionPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Reason::ValidationFailed);

        let mut inverted = dto();
        inverted.end_date = inverted.start_date;
        let err = service
            .create_promotion(Some(&admin), inverted, Some(2))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Reason::InvalidDateRange);

        let err = service
            .list_promotions(
                Some(&admin),
                PromotionListQuery {
                    sort: SortRequest {
                        sort_by: Some("password".into()),
                        direction: None,
                    },
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Reason::InvalidSortParam);
    }

    #[test]
    fn list_query_reads_flat_camel_case_keys() {
        let query: PromotionListQuery = serde_json::from_value(serde_json::json!({
            "status": "PENDING",
            "title": "sale",
            "sortBy": "startDate",
            "direction": "asc",
            "page": 2,
            "limit": 5
        }))
        .unwrap();
        assert_eq!(query.filter.status, Some(PromotionStatus::Pending));
        assert_eq!(query.sort.sort_by.as_deref(), Some("startDate"));
        assert_eq!(query.page, PageRequest::new(2, 5));
    }
}
