//! Product Service - catalogue management and stock levels

use sea_orm::sea_query::SelectStatement;
use sea_orm::*;

use crate::domain::validation::{non_negative, require_len};
use crate::domain::{DomainError, ImageUpload, Page, PageRequest};
use crate::models::order_item::{self, Entity as OrderItem};
use crate::models::product::{self, Entity as Product};
use crate::models::user;
use crate::services::farmer_service::find_farmer;
use crate::services::fetch_page;
use crate::services::upload_service::Uploads;

/// Create-or-update form. Without `id` a new product is created.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub id: Option<i32>,
    pub name: String,
    pub price: f64,
    pub stock_qty: f64,
    pub unit: String,
    pub farmer_id: Option<i32>,
    pub is_organic: Option<bool>,
    pub picture: Option<ImageUpload>,
}

pub async fn list_public(
    db: &DatabaseConnection,
    request: PageRequest,
) -> Result<Page<product::Model>, DomainError> {
    let select = Product::find()
        .filter(product::Column::StockQty.gt(0.0))
        .order_by_asc(product::Column::Name)
        .order_by_asc(product::Column::Id);
    fetch_page(db, select, request).await
}

/// Admins see everything (optionally one farmer), farmers only their own
pub async fn list_products(
    db: &DatabaseConnection,
    actor: &user::Model,
    farmer_id: Option<i32>,
    request: PageRequest,
) -> Result<Page<product::Model>, DomainError> {
    let scope = if actor.is_admin() {
        farmer_id
    } else {
        Some(linked_farmer(actor)?)
    };

    let mut select = Product::find();
    if let Some(farmer_id) = scope {
        select = select.filter(product::Column::FarmerId.eq(farmer_id));
    }
    let select = select
        .order_by_asc(product::Column::Name)
        .order_by_asc(product::Column::Id);
    fetch_page(db, select, request).await
}

pub async fn get_product(db: &DatabaseConnection, id: i32) -> Result<product::Model, DomainError> {
    Product::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Product"))
}

fn linked_farmer(actor: &user::Model) -> Result<i32, DomainError> {
    actor.farmer_id.ok_or_else(|| {
        DomainError::Forbidden("No farmer profile is linked to this account".to_string())
    })
}

pub fn ensure_owner(actor: &user::Model, product: &product::Model) -> Result<(), DomainError> {
    if actor.is_admin() || actor.farmer_id == Some(product.farmer_id) {
        Ok(())
    } else {
        Err(DomainError::Forbidden(
            "Not authorized to modify this product".to_string(),
        ))
    }
}

/// Ids of a farmer's products, as a subquery for `in_subquery` filters
pub(crate) fn farmer_product_ids(farmer_id: i32) -> SelectStatement {
    Product::find()
        .select_only()
        .column(product::Column::Id)
        .filter(product::Column::FarmerId.eq(farmer_id))
        .into_query()
}

pub async fn upsert_product(
    db: &DatabaseConnection,
    uploads: Uploads<'_>,
    actor: &user::Model,
    form: ProductForm,
) -> Result<product::Model, DomainError> {
    let name = require_len("name", &form.name, 1, 100)?;
    let unit = require_len("unit", &form.unit, 1, 20)?;
    let price = non_negative("price", form.price)?;
    let stock_qty = non_negative("stock_qty", form.stock_qty)?;

    let farmer_id = if actor.is_admin() {
        let farmer_id = form
            .farmer_id
            .ok_or_else(|| DomainError::Validation("farmer_id is required".to_string()))?;
        find_farmer(db, farmer_id).await?.id
    } else {
        linked_farmer(actor)?
    };

    let existing = match form.id {
        Some(id) => {
            let product = get_product(db, id).await?;
            ensure_owner(actor, &product)?;
            Some(product)
        }
        None => None,
    };

    let image_url = match &form.picture {
        Some(picture) => Some(uploads.store(picture).await?),
        None => None,
    };

    let saved = match existing {
        Some(product) => {
            let old_image = product.image_url.clone();
            let mut active: product::ActiveModel = product.into();
            active.name = Set(name);
            active.price = Set(price);
            active.stock_qty = Set(stock_qty);
            active.unit = Set(unit);
            active.farmer_id = Set(farmer_id);
            if let Some(is_organic) = form.is_organic {
                active.is_organic = Set(is_organic);
            }
            if image_url.is_some() {
                active.image_url = Set(image_url.clone());
            }
            let updated = uploads
                .discard_on_error(image_url.as_deref(), active.update(db).await)
                .await?;
            if let Some(old) = old_image.filter(|old| updated.image_url.as_ref() != Some(old)) {
                uploads.discard(&old).await;
            }
            tracing::info!("Updated product {} ({})", updated.id, updated.name);
            updated
        }
        None => {
            let inserted = product::ActiveModel {
                name: Set(name),
                price: Set(price),
                stock_qty: Set(stock_qty),
                unit: Set(unit),
                farmer_id: Set(farmer_id),
                is_organic: Set(form.is_organic.unwrap_or(true)),
                image_url: Set(image_url.clone()),
                ..Default::default()
            }
            .insert(db)
            .await;
            let created = uploads
                .discard_on_error(image_url.as_deref(), inserted)
                .await?;
            tracing::info!("Created product {} ({}) for farmer {}", created.id, created.name, farmer_id);
            created
        }
    };

    Ok(saved)
}

pub async fn update_stock(
    db: &DatabaseConnection,
    actor: &user::Model,
    id: i32,
    qty: f64,
) -> Result<f64, DomainError> {
    if qty < 0.0 {
        return Err(DomainError::BadRequest(
            "Stock quantity cannot be negative".to_string(),
        ));
    }
    let qty = non_negative("qty", qty)?;

    let product = get_product(db, id).await?;
    ensure_owner(actor, &product)?;

    let mut active: product::ActiveModel = product.into();
    active.stock_qty = Set(qty);
    let updated = active.update(db).await?;

    tracing::info!("Stock of product {} set to {}", updated.id, updated.stock_qty);
    Ok(updated.stock_qty)
}

pub async fn set_image(
    db: &DatabaseConnection,
    uploads: Uploads<'_>,
    actor: &user::Model,
    id: i32,
    picture: &ImageUpload,
) -> Result<String, DomainError> {
    let product = get_product(db, id).await?;
    ensure_owner(actor, &product)?;

    let url = uploads.store(picture).await?;
    let old_image = product.image_url.clone();

    let mut active: product::ActiveModel = product.into();
    active.image_url = Set(Some(url.clone()));
    uploads
        .discard_on_error(Some(&url), active.update(db).await)
        .await?;

    if let Some(old) = old_image {
        uploads.discard(&old).await;
    }
    Ok(url)
}

pub async fn delete_product(
    db: &DatabaseConnection,
    uploads: Uploads<'_>,
    actor: &user::Model,
    id: i32,
) -> Result<(), DomainError> {
    let product = get_product(db, id).await?;
    ensure_owner(actor, &product)?;

    let ordered = OrderItem::find()
        .filter(order_item::Column::ProductId.eq(id))
        .count(db)
        .await?;
    if ordered > 0 {
        return Err(DomainError::BadRequest(
            "Cannot delete a product that appears in orders".to_string(),
        ));
    }

    Product::delete_by_id(id).exec(db).await?;
    if let Some(url) = &product.image_url {
        uploads.discard(url).await;
    }

    tracing::info!("Deleted product {} ({})", product.id, product.name);
    Ok(())
}
