use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{
    Entity, OrderBy, Patch, ProductId, SortDirection, SortField, UserId, sort_with_id_tiebreak,
    validation::{number_present, text_present},
};

/// A stocked item.
///
/// `quantity` is the single source of truth for availability; see
/// [`StockStatus::of`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: u64,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub is_active: bool,
    pub created_by_id: UserId,
    pub updated_by_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::of(self.quantity)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Available,
    OutOfStock,
}

impl StockStatus {
    pub fn of(quantity: u64) -> Self {
        if quantity > 0 {
            StockStatus::Available
        } else {
            StockStatus::OutOfStock
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            StockStatus::Available => "Product is available",
            StockStatus::OutOfStock => "Product is out of stock",
        }
    }
}

/// Derived availability snapshot, recomputed from `quantity` on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReport {
    pub id: ProductId,
    pub name: String,
    pub quantity: u64,
    pub is_active: bool,
    pub status: StockStatus,
    pub message: String,
}

impl From<&Product> for StockReport {
    fn from(product: &Product) -> Self {
        let status = product.stock_status();
        Self {
            id: product.id,
            name: product.name.clone(),
            quantity: product.quantity,
            is_active: product.quantity > 0,
            status,
            message: status.message().to_string(),
        }
    }
}

/// Caller payload for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub is_active: Option<bool>,
}

impl Patch for ProductPatch {
    fn present_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if text_present(self.name.as_deref()) {
            fields.push("name");
        }
        if text_present(self.description.as_deref()) {
            fields.push("description");
        }
        if number_present(self.price) {
            fields.push("price");
        }
        if self.quantity.is_some() {
            fields.push("quantity");
        }
        if text_present(self.category.as_deref()) {
            fields.push("category");
        }
        if text_present(self.sku.as_deref()) {
            fields.push("sku");
        }
        if self.is_active.is_some() {
            fields.push("isActive");
        }
        fields
    }
}

/// Fully-formed record handed to the repository on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: u64,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub is_active: bool,
    pub created_by_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Column-level changes; `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<u64>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub is_active: Option<bool>,
    pub updated_by_id: UserId,
    pub updated_at: DateTime<Utc>,
}

impl ProductChanges {
    /// Convert an already validated patch.
    pub fn from_patch(patch: ProductPatch, actor: UserId, at: DateTime<Utc>) -> Self {
        Self {
            name: patch.name,
            description: patch.description,
            price: patch.price,
            quantity: patch.quantity.and_then(|q| u64::try_from(q).ok()),
            category: patch.category,
            sku: patch.sku,
            is_active: patch.is_active,
            updated_by_id: actor,
            updated_at: at,
        }
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(category) = self.category {
            product.category = Some(category);
        }
        if let Some(sku) = self.sku {
            product.sku = Some(sku);
        }
        if let Some(active) = self.is_active {
            product.is_active = active;
        }
        product.updated_by_id = Some(self.updated_by_id);
        product.updated_at = self.updated_at;
    }
}

/// Stamp recorded alongside a quantity movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub amount: u64,
    pub actor: UserId,
    pub at: DateTime<Utc>,
}

/// Outcome of a conditional decrement.
#[derive(Debug, Clone, PartialEq)]
pub enum Decrement {
    Applied(Product),
    Insufficient { available: u64 },
}

/// Caller-facing list filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub category: Option<String>,
    pub is_active: Option<bool>,
    /// Case-insensitive substring match on the name.
    pub name: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub quantity: Option<u64>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category.as_deref() {
            if product.category.as_deref() != Some(category) {
                return false;
            }
        }
        if self.is_active.is_some_and(|a| a != product.is_active) {
            return false;
        }
        if let Some(needle) = self.name.as_deref() {
            if !product.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        self.quantity.is_none_or(|q| q == product.quantity)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProductSortField {
    Id,
    Name,
    Price,
    Quantity,
    Category,
    CreatedAt,
    UpdatedAt,
}

impl ProductSortField {
    pub const ALL: [ProductSortField; 7] = [
        ProductSortField::Id,
        ProductSortField::Name,
        ProductSortField::Price,
        ProductSortField::Quantity,
        ProductSortField::Category,
        ProductSortField::CreatedAt,
        ProductSortField::UpdatedAt,
    ];

    pub const DEFAULT_ORDER: OrderBy<ProductSortField> = OrderBy {
        field: ProductSortField::CreatedAt,
        direction: SortDirection::Desc,
    };

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            ProductSortField::Id => a.id.cmp(&b.id),
            ProductSortField::Name => a.name.cmp(&b.name),
            ProductSortField::Price => a.price.total_cmp(&b.price),
            ProductSortField::Quantity => a.quantity.cmp(&b.quantity),
            ProductSortField::Category => a.category.cmp(&b.category),
            ProductSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            ProductSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

impl SortField for ProductSortField {
    fn key(&self) -> &'static str {
        match self {
            ProductSortField::Id => "id",
            ProductSortField::Name => "name",
            ProductSortField::Price => "price",
            ProductSortField::Quantity => "quantity",
            ProductSortField::Category => "category",
            ProductSortField::CreatedAt => "createdAt",
            ProductSortField::UpdatedAt => "updatedAt",
        }
    }
}

/// Sort in place by `order`, breaking ties by ascending id.
pub fn sort_products(items: &mut [Product], order: OrderBy<ProductSortField>) {
    sort_with_id_tiebreak(items, order.direction, |a, b| order.field.compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn product(id: u64, name: &str, price: f64, quantity: u64) -> Product {
        let at = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();
        Product {
            id: ProductId::new(id),
            name: name.into(),
            description: None,
            price,
            quantity,
            category: Some("tools".into()),
            sku: None,
            is_active: true,
            created_by_id: UserId::new(1),
            updated_by_id: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn stock_status_follows_quantity() {
        let empty = product(1, "Hammer", 10.0, 0);
        let report = StockReport::from(&empty);
        assert_eq!(report.status, StockStatus::OutOfStock);
        assert!(!report.is_active);
        assert_eq!(report.message, "Product is out of stock");

        let stocked = product(2, "Saw", 20.0, 3);
        let report = StockReport::from(&stocked);
        assert_eq!(report.status, StockStatus::Available);
        assert!(report.is_active);
    }

    #[test]
    fn nan_price_does_not_count_as_present() {
        let patch = ProductPatch {
            price: Some(f64::NAN),
            ..Default::default()
        };
        assert!(patch.present_fields().is_empty());
    }

    #[test]
    fn filter_combines_every_criterion() {
        let p = product(1, "Claw Hammer", 12.5, 4);
        assert!(ProductFilter::default().matches(&p));
        assert!(ProductFilter {
            category: Some("tools".into()),
            name: Some("hammer".into()),
            min_price: Some(10.0),
            max_price: Some(15.0),
            quantity: Some(4),
            is_active: Some(true),
        }
        .matches(&p));
        assert!(!ProductFilter {
            max_price: Some(12.0),
            ..Default::default()
        }
        .matches(&p));
        assert!(!ProductFilter {
            category: Some("garden".into()),
            ..Default::default()
        }
        .matches(&p));
    }

    #[test]
    fn price_sort_is_total_with_id_tiebreak() {
        let mut items = vec![
            product(3, "c", 5.0, 1),
            product(1, "a", 9.0, 1),
            product(2, "b", 5.0, 1),
        ];
        sort_products(
            &mut items,
            OrderBy {
                field: ProductSortField::Price,
                direction: SortDirection::Asc,
            },
        );
        let ids: Vec<u64> = items.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
