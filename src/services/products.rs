use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    prelude::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::product::{self, Entity as Product, ProductCategory},
    errors::ServiceError,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 50))]
    pub sku: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub min_stock_level: Option<i32>,
    pub category: Option<ProductCategory>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub min_stock_level: Option<i32>,
    pub category: Option<ProductCategory>,
    pub is_active: Option<bool>,
}

/// Product catalog and stock levels.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price must not be negative".to_string(),
            ));
        }

        let existing = Product::find()
            .filter(product::Column::Sku.eq(&input.sku))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product with SKU {} already exists",
                input.sku
            )));
        }

        let now = Utc::now();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(input.sku),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            cost: Set(input.cost.unwrap_or(Decimal::ZERO)),
            stock_quantity: Set(input.stock_quantity.unwrap_or(0)),
            min_stock_level: Set(input.min_stock_level.unwrap_or(0)),
            category: Set(input.category.unwrap_or(ProductCategory::Other)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<product::Model>, ServiceError> {
        Product::find()
            .order_by_asc(product::Column::Name)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn count_products(&self) -> Result<u64, ServiceError> {
        Product::find().count(&*self.db).await.map_err(Into::into)
    }

    /// Products at or below their minimum stock level, for reorder reports.
    #[instrument(skip(self))]
    pub async fn list_low_stock(&self) -> Result<Vec<product::Model>, ServiceError> {
        Product::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(
                Expr::col(product::Column::StockQuantity)
                    .lte(Expr::col(product::Column::MinStockLevel)),
            )
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let model = self.get_product(product_id).await?;
        let mut active: product::ActiveModel = model.into();

        if let Some(v) = input.name {
            active.name = Set(v);
        }
        if let Some(v) = input.description {
            active.description = Set(Some(v));
        }
        if let Some(v) = input.price {
            if v < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price must not be negative".to_string(),
                ));
            }
            active.price = Set(v);
        }
        if let Some(v) = input.cost {
            active.cost = Set(v);
        }
        if let Some(v) = input.min_stock_level {
            active.min_stock_level = Set(v);
        }
        if let Some(v) = input.category {
            active.category = Set(v);
        }
        if let Some(v) = input.is_active {
            active.is_active = Set(v);
        }
        active.updated_at = Set(Utc::now());

        active.update(&*self.db).await.map_err(Into::into)
    }

    /// Adjusts stock by a signed delta (receiving or correcting inventory).
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        product_id: Uuid,
        delta: i32,
    ) -> Result<product::Model, ServiceError> {
        let model = self.get_product(product_id).await?;
        let adjusted = model.stock_quantity + delta;
        if adjusted < 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "Product {}: adjustment of {} would leave negative stock",
                model.sku, delta
            )));
        }
        let mut active: product::ActiveModel = model.into();
        active.stock_quantity = Set(adjusted);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await.map_err(Into::into)
    }
}
