//! Order Service - checkout, fulfilment and cancellation
//!
//! Stock moves only inside a transaction together with the order row, so a
//! failed checkout never leaves a partial decrement behind.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::domain::validation::{in_range, non_negative, require_len, validate_email};
use crate::domain::{DomainError, OrderStatus, Page, PageRequest};
use crate::models::order::{self, Entity as Order};
use crate::models::order_item::{self, Entity as OrderItem};
use crate::models::product::{self, Entity as Product};
use crate::models::user;
use crate::services::fetch_page;
use crate::services::product_service::{ensure_owner, farmer_product_ids};

pub const MAX_ITEM_QUANTITY: i64 = 1000;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct OrderItemRequest {
    pub product_id: i32,
    pub quantity: i32,
    /// Unit price shown to the customer
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub address: String,
    pub total_price: f64,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct OrderItemView {
    pub id: i32,
    pub product_id: i32,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub price_at_time: f64,
    pub is_harvested: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct OrderWithItems {
    pub id: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub address: String,
    pub total_price: f64,
    pub status: String,
    pub created_at: String,
    pub delivery_date: Option<String>,
    pub items: Vec<OrderItemView>,
}

/// Filter parameters for listing orders
#[derive(Debug, Default, Clone)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub farmer_id: Option<i32>,
}

fn short_stock(product: &product::Model) -> DomainError {
    DomainError::BadRequest(format!(
        "Only {} {} of {} left!",
        product.stock_qty, product.unit, product.name
    ))
}

fn validate_order(request: &CreateOrderRequest) -> Result<(String, String, String), DomainError> {
    let name = require_len("customer_name", &request.customer_name, 2, 100)?;
    let email = validate_email(&request.customer_email)?;
    let address = require_len("address", &request.address, 10, 500)?;
    non_negative("total_price", request.total_price)?;

    if request.items.is_empty() {
        return Err(DomainError::Validation(
            "Order must contain at least one item".to_string(),
        ));
    }
    for item in &request.items {
        in_range("product_id", item.product_id.into(), 1, i32::MAX.into())?;
        in_range("quantity", item.quantity.into(), 1, MAX_ITEM_QUANTITY)?;
        non_negative("price", item.price)?;
    }
    Ok((name, email, address))
}

/// Place an order, taking each item's quantity out of stock
pub async fn create_order(
    db: &DatabaseConnection,
    request: CreateOrderRequest,
) -> Result<i32, DomainError> {
    let (customer_name, customer_email, address) = validate_order(&request)?;

    let txn = db.begin().await?;

    for item in &request.items {
        let product = Product::find_by_id(item.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Product {} not found", item.product_id)))?;

        let qty = f64::from(item.quantity);
        if product.stock_qty < qty {
            return Err(short_stock(&product));
        }

        // Guarded decrement: a concurrent order that got there first leaves no row to update
        let result = Product::update_many()
            .col_expr(
                product::Column::StockQty,
                Expr::col(product::Column::StockQty).sub(qty),
            )
            .filter(product::Column::Id.eq(product.id))
            .filter(product::Column::StockQty.gte(qty))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(short_stock(&product));
        }
    }

    let order = order::ActiveModel {
        customer_name: Set(customer_name),
        customer_email: Set(customer_email),
        address: Set(address),
        total_price: Set(request.total_price),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        created_at: Set(Utc::now().to_rfc3339()),
        delivery_date: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let items: Vec<order_item::ActiveModel> = request
        .items
        .iter()
        .map(|item| order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            price_at_time: Set(item.price),
            is_harvested: Set(false),
            ..Default::default()
        })
        .collect();
    OrderItem::insert_many(items).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        "Order {} placed by {} ({} items, total {})",
        order.id,
        order.customer_email,
        request.items.len(),
        order.total_price
    );
    Ok(order.id)
}

/// Orders newest first. Farmers only see orders that contain their products.
pub async fn list_orders(
    db: &DatabaseConnection,
    actor: &user::Model,
    filter: OrderFilter,
    request: PageRequest,
) -> Result<Page<OrderWithItems>, DomainError> {
    let status = filter
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()?;

    let scope = if actor.is_admin() {
        filter.farmer_id
    } else {
        Some(actor.farmer_id.ok_or_else(|| {
            DomainError::Forbidden("No farmer profile is linked to this account".to_string())
        })?)
    };

    let mut condition = Condition::all();
    if let Some(status) = status {
        condition = condition.add(order::Column::Status.eq(status.as_str()));
    }
    if let Some(farmer_id) = scope {
        let farmer_orders = OrderItem::find()
            .select_only()
            .column(order_item::Column::OrderId)
            .filter(order_item::Column::ProductId.in_subquery(farmer_product_ids(farmer_id)))
            .into_query();
        condition = condition.add(order::Column::Id.in_subquery(farmer_orders));
    }

    let select = Order::find()
        .filter(condition)
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id);
    let page = fetch_page(db, select, request).await?;

    let items = attach_items(db, page.items).await?;
    Ok(Page {
        success: page.success,
        items,
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
    })
}

/// Load items for a batch of orders with their product names
async fn attach_items(
    db: &DatabaseConnection,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderWithItems>, DomainError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.is_in(order_ids))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;

    let product_ids: Vec<i32> = items
        .iter()
        .map(|i| i.product_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let mut product_names: HashMap<i32, String> = HashMap::new();
    if !product_ids.is_empty() {
        for product in Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await?
        {
            product_names.insert(product.id, product.name);
        }
    }

    let mut items_by_order: HashMap<i32, Vec<OrderItemView>> = HashMap::new();
    for item in items {
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItemView {
                id: item.id,
                product_id: item.product_id,
                product_name: product_names.get(&item.product_id).cloned(),
                quantity: item.quantity,
                price_at_time: item.price_at_time,
                is_harvested: item.is_harvested,
            });
    }

    Ok(orders
        .into_iter()
        .map(|o| OrderWithItems {
            items: items_by_order.remove(&o.id).unwrap_or_default(),
            id: o.id,
            customer_name: o.customer_name,
            customer_email: o.customer_email,
            address: o.address,
            total_price: o.total_price,
            status: o.status,
            created_at: o.created_at,
            delivery_date: o.delivery_date,
        })
        .collect())
}

/// Public lookup; the email must match the one on the order
pub async fn track_order(
    db: &DatabaseConnection,
    order_id: Option<&str>,
    email: Option<&str>,
) -> Result<OrderWithItems, DomainError> {
    let order_id = order_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| DomainError::Validation("order_id is required".to_string()))?
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| DomainError::Validation("order_id must be a positive integer".to_string()))?;
    let email = validate_email(
        email.ok_or_else(|| DomainError::Validation("email is required".to_string()))?,
    )?;
    let not_found = || DomainError::not_found("Order");

    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .filter(|o| o.customer_email.to_lowercase() == email)
        .ok_or_else(not_found)?;

    attach_items(db, vec![order])
        .await?
        .pop()
        .ok_or_else(not_found)
}

async fn find_order<C: ConnectionTrait>(db: &C, id: i32) -> Result<order::Model, DomainError> {
    Order::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Order"))
}

fn current_status(order: &order::Model) -> Result<OrderStatus, DomainError> {
    order
        .status
        .parse()
        .map_err(|_| DomainError::Internal(format!("Order {} has unknown status '{}'", order.id, order.status)))
}

/// Mark cancelled and put every item's quantity back on the shelf
async fn cancel_in(txn: &DatabaseTransaction, order: order::Model) -> Result<(), DomainError> {
    match current_status(&order)? {
        OrderStatus::Cancelled => {
            return Err(DomainError::BadRequest("Order is already cancelled".to_string()))
        }
        OrderStatus::Delivered => {
            return Err(DomainError::BadRequest(
                "Cannot cancel a delivered order".to_string(),
            ))
        }
        _ => {}
    }

    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .all(txn)
        .await?;
    for item in &items {
        Product::update_many()
            .col_expr(
                product::Column::StockQty,
                Expr::col(product::Column::StockQty).add(f64::from(item.quantity)),
            )
            .filter(product::Column::Id.eq(item.product_id))
            .exec(txn)
            .await?;
    }

    let id = order.id;
    let mut active: order::ActiveModel = order.into();
    active.status = Set(OrderStatus::Cancelled.as_str().to_string());
    active.update(txn).await?;

    tracing::info!("Order {} cancelled, stock restored for {} items", id, items.len());
    Ok(())
}

pub async fn cancel_order(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let txn = db.begin().await?;
    let order = find_order(&txn, id).await?;
    cancel_in(&txn, order).await?;
    txn.commit().await?;
    Ok(())
}

pub async fn update_status(
    db: &DatabaseConnection,
    id: i32,
    status: &str,
    delivery_date: Option<&str>,
) -> Result<OrderStatus, DomainError> {
    let new_status: OrderStatus = status.parse()?;
    let delivery_date = delivery_date
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map(|date| date.format("%Y-%m-%d").to_string())
                .map_err(|_| {
                    DomainError::Validation("delivery_date must be formatted YYYY-MM-DD".to_string())
                })
        })
        .transpose()?;

    let txn = db.begin().await?;
    let order = find_order(&txn, id).await?;

    if current_status(&order)? == OrderStatus::Cancelled {
        return Err(DomainError::BadRequest(
            "Cannot change the status of a cancelled order".to_string(),
        ));
    }

    if new_status == OrderStatus::Cancelled {
        cancel_in(&txn, order).await?;
    } else {
        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status.as_str().to_string());
        if delivery_date.is_some() {
            active.delivery_date = Set(delivery_date);
        }
        active.update(&txn).await?;
    }

    txn.commit().await?;

    tracing::info!("Order {} moved to {}", id, new_status);
    Ok(new_status)
}

/// Admins, or the farmer growing the item's product, tick items off
pub async fn mark_harvested(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i32,
    item_id: i32,
    harvested: bool,
) -> Result<order_item::Model, DomainError> {
    let item = OrderItem::find_by_id(item_id)
        .filter(order_item::Column::OrderId.eq(order_id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Order item"))?;

    let product = Product::find_by_id(item.product_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Product"))?;
    ensure_owner(actor, &product)?;

    let mut active: order_item::ActiveModel = item.into();
    active.is_harvested = Set(harvested);
    let updated = active.update(db).await?;

    tracing::info!(
        "Item {} of order {} marked {}",
        item_id,
        order_id,
        if harvested { "harvested" } else { "not harvested" }
    );
    Ok(updated)
}
