//! End-to-end flows through the wired services over the in-memory stores.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};

use bazaar_auth::{Principal, Role, UserRecord};
use bazaar_core::{
    DomainError, ErrorKind, FixedClock, PageRequest, Reason, SortDirection, SortRequest, UserId,
};
use bazaar_infra::{InMemoryServices, InMemoryStores, InfraConfig};
use bazaar_inventory::{NewProduct, ProductFilter, ProductListQuery, StockStatus};
use bazaar_promotions::{NewPromotion, PromotionListQuery, PromotionPatch, PromotionStatus};

const SUPERADMIN: UserId = UserId::new(1);
const SUPPLIER: UserId = UserId::new(2);
const MANAGER: UserId = UserId::new(3);

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 15, 12, 0, 0).unwrap()
}

fn user(id: UserId, role: Role) -> (Principal, UserRecord) {
    let email = format!("{}@example.com", role.as_str().to_lowercase());
    (
        Principal::new(id, email.clone(), role),
        UserRecord { id, email, role },
    )
}

struct World {
    clock: Arc<FixedClock>,
    services: InMemoryServices<Arc<FixedClock>>,
    superadmin: Principal,
    supplier: Principal,
    manager: Principal,
}

fn world() -> Result<World> {
    bazaar_observability::init();

    let stores = InMemoryStores::new();
    let (superadmin, superadmin_record) = user(SUPERADMIN, Role::SuperAdmin);
    let (supplier, supplier_record) = user(SUPPLIER, Role::Supplier);
    let (manager, manager_record) = user(MANAGER, Role::WarehouseManager);
    for record in [superadmin_record, supplier_record, manager_record] {
        stores.users.upsert(record)?;
    }

    let clock = Arc::new(FixedClock::new(now()));
    let services = stores.services(&InfraConfig::default(), clock.clone());
    Ok(World {
        clock,
        services,
        superadmin,
        supplier,
        manager,
    })
}

fn promotion(start: DateTime<Utc>, end: DateTime<Utc>) -> NewPromotion {
    NewPromotion {
        title: "Harvest festival".into(),
        description: "Seasonal discounts".into(),
        start_date: start,
        end_date: end,
    }
}

#[tokio::test]
async fn superadmin_direct_create_skips_future_start_rule() -> Result<()> {
    let w = world()?;
    let created = w
        .services
        .promotions
        .create_promotion(
            Some(&w.superadmin),
            promotion(now() - Duration::days(1), now() + Duration::days(1)),
            Some(SUPPLIER.get() as i64),
        )
        .await?;

    assert_eq!(created.status, PromotionStatus::Approved);
    assert_eq!(created.supplier_id, SUPPLIER);
    Ok(())
}

#[tokio::test]
async fn supplier_proposal_with_past_start_is_rejected_and_not_stored() -> Result<()> {
    let w = world()?;
    let err = w
        .services
        .promotions
        .create_promotion(
            Some(&w.supplier),
            promotion(now() - Duration::days(1), now() + Duration::days(1)),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(err.reason(), Reason::PastStartDate);

    let mine = w
        .services
        .promotions
        .list_my_promotions(Some(&w.supplier), SortRequest::default(), PageRequest::default())
        .await?;
    assert_eq!(mine.total, 0);
    Ok(())
}

#[tokio::test]
async fn proposal_review_and_deletion_lifecycle() -> Result<()> {
    let w = world()?;
    let promotions = &w.services.promotions;

    let proposed = promotions
        .create_promotion(
            Some(&w.supplier),
            promotion(now() + Duration::days(1), now() + Duration::days(8)),
            None,
        )
        .await?;
    assert_eq!(proposed.status, PromotionStatus::Pending);
    let id = proposed.id.get() as i64;

    let approved = promotions
        .update_promotion_status(Some(&w.superadmin), id, PromotionStatus::Approved)
        .await?;
    assert_eq!(approved.status, PromotionStatus::Approved);

    // Two days on, the approved promotion is running.
    w.clock.advance(Duration::days(2));
    let err = promotions
        .delete_promotion(Some(&w.superadmin), id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.reason(), Reason::CannotDeleteActivePromotion);

    let moved = promotions
        .update_promotion(
            Some(&w.superadmin),
            id,
            PromotionPatch {
                start_date: Some(now() + Duration::days(20)),
                end_date: Some(now() + Duration::days(30)),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(moved.start_date, now() + Duration::days(20));

    let deleted = promotions.delete_promotion(Some(&w.superadmin), id).await?;
    assert!(deleted.is_deleted);

    let err = promotions
        .get_promotion(Some(&w.supplier), id)
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::not_found(Reason::PromotionNotFound));
    Ok(())
}

#[tokio::test]
async fn active_promotion_cannot_be_deleted() -> Result<()> {
    let w = world()?;
    let running = w
        .services
        .promotions
        .create_promotion(
            Some(&w.superadmin),
            promotion(now() - Duration::days(2), now() + Duration::days(2)),
            Some(SUPPLIER.get() as i64),
        )
        .await?;

    let err = w
        .services
        .promotions
        .delete_promotion(Some(&w.superadmin), running.id.get() as i64)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.reason(), Reason::CannotDeleteActivePromotion);

    // After the window closes the same promotion may go.
    w.clock.advance(Duration::days(3));
    w.services
        .promotions
        .delete_promotion(Some(&w.superadmin), running.id.get() as i64)
        .await?;
    Ok(())
}

#[tokio::test]
async fn unknown_sort_field_is_invalid_input() -> Result<()> {
    let w = world()?;
    let err = w
        .services
        .promotions
        .list_promotions(
            Some(&w.superadmin),
            PromotionListQuery {
                sort: SortRequest::by("notAField", SortDirection::Asc),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(err.reason(), Reason::InvalidSortParam);
    Ok(())
}

#[tokio::test]
async fn admin_cannot_target_a_non_supplier() -> Result<()> {
    let w = world()?;
    let err = w
        .services
        .promotions
        .create_promotion(
            Some(&w.superadmin),
            promotion(now() + Duration::days(1), now() + Duration::days(2)),
            Some(MANAGER.get() as i64),
        )
        .await
        .unwrap_err();
    assert_eq!(err.reason(), Reason::UserNotFound);
    Ok(())
}

#[tokio::test]
async fn warehouse_flow_tracks_stock_status() -> Result<()> {
    let w = world()?;
    let products = &w.services.products;

    let product = products
        .create_product(
            Some(&w.superadmin),
            NewProduct {
                name: "Olive oil".into(),
                description: Some("Cold pressed".into()),
                price: 11.5,
                quantity: 0,
                category: Some("pantry".into()),
                sku: Some("OIL-1L".into()),
            },
        )
        .await?;
    let id = product.id.get() as i64;
    assert_eq!(product.created_by_id, SUPERADMIN);

    let status = products.get_product_status(Some(&w.manager), id).await?;
    assert_eq!(status.status, StockStatus::OutOfStock);

    let stocked = products.add_product_quantity(Some(&w.manager), id, 5).await?;
    assert_eq!(stocked.quantity, 5);
    assert_eq!(stocked.updated_by_id, Some(MANAGER));

    let err = products
        .purchase_product(Some(&w.superadmin), id, 6)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.reason(), Reason::InsufficientStock);

    let bought = products.purchase_product(Some(&w.superadmin), id, 5).await?;
    assert_eq!(bought.quantity, 0);

    let listed = products
        .list_products(
            Some(&w.supplier),
            ProductListQuery {
                filter: ProductFilter {
                    category: Some("pantry".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(listed.total, 1);

    products.delete_product(Some(&w.superadmin), id).await?;
    let err = products
        .get_product(Some(&w.superadmin), id)
        .await
        .unwrap_err();
    assert_eq!(err.reason(), Reason::ProductNotFound);
    Ok(())
}

#[tokio::test]
async fn duplicate_sku_surfaces_as_conflict() -> Result<()> {
    let w = world()?;
    let dto = NewProduct {
        name: "Tea".into(),
        description: None,
        price: 3.0,
        quantity: 1,
        category: None,
        sku: Some("TEA".into()),
    };
    w.services
        .products
        .create_product(Some(&w.superadmin), dto.clone())
        .await?;
    let err = w
        .services
        .products
        .create_product(Some(&w.superadmin), dto)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.reason(), Reason::AlreadyExists);
    Ok(())
}
