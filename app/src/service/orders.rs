use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, LoaderTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    auth::Identity,
    common::{ApiError, ApiResult},
    entity::{order, order_item, part, user},
    service::non_blank,
    sms::SmsClient,
};

/// Largest quantity a single order line may carry.
pub const MAX_LINE_QTY: i32 = 10_000;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct OrderItemInput {
    #[validate(length(min = 1, message = "Order item name is required"))]
    pub name: String,
    #[serde(deserialize_with = "crate::serde::deserialize_number")]
    #[validate(range(min = 1, max = MAX_LINE_QTY, message = "Quantity must be between 1 and 10000"))]
    pub qty: i32,
    #[serde(deserialize_with = "crate::serde::deserialize_number")]
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
    /// The part the line was bought from, kept for display only.
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub product: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateOrderInput {
    #[serde(default)]
    #[validate(nested)]
    pub order_items: Vec<OrderItemInput>,
    #[serde(default)]
    pub shipping_address: serde_json::Value,
    pub payment_method: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_date")]
    pub collection_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Buyer {
    pub id: i32,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub price: f64,
    pub shop_id: i32,
}

impl From<&part::Model> for ProductSummary {
    fn from(part: &part::Model) -> Self {
        ProductSummary {
            id: part.id,
            name: part.name.clone(),
            image: part.images.0.first().cloned(),
            price: part.price,
            shop_id: part.shop_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub name: String,
    pub qty: i32,
    /// Price at checkout; later catalog changes never touch it.
    pub price: f64,
    pub product_id: Option<i32>,
    /// `null` when the part has since been removed.
    pub product: Option<ProductSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: i32,
    pub user: Buyer,
    pub order_items: Vec<OrderItemView>,
    pub shipping_address: serde_json::Value,
    pub payment_method: Option<String>,
    pub phone: Option<String>,
    pub collection_date: Option<NaiveDate>,
    pub total_price: f64,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub sms_sent_at: Option<DateTime<Utc>>,
    pub sms_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn total_price(items: &[order_item::Model]) -> f64 {
    items.iter().map(|i| f64::from(i.qty) * i.price).sum()
}

fn confirmation_text(order: &order::Model, items: &[order_item::Model]) -> String {
    let quantity: i64 = items.iter().map(|i| i64::from(i.qty)).sum();
    let mut text = format!(
        "Order #{} confirmed: {} item(s), total {:.2}",
        order.id,
        quantity,
        total_price(items)
    );
    if let Some(date) = order.collection_date {
        text.push_str(&format!(", collect on {}", date.format("%Y-%m-%d")));
    }
    if let Some(method) = &order.payment_method {
        text.push_str(&format!(", payment: {method}"));
    }
    text.push('.');
    text
}

/// Loads line items, purchasers and still-existing parts for a batch of orders.
async fn views(db: &DatabaseConnection, orders: Vec<order::Model>) -> ApiResult<Vec<OrderView>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let items_by_order = orders
        .load_many(
            order_item::Entity::find().order_by_asc(order_item::Column::Id),
            db,
        )
        .await?;
    let buyers = orders.load_one(user::Entity, db).await?;

    let part_ids: HashSet<i32> = items_by_order
        .iter()
        .flatten()
        .filter_map(|i| i.product_id)
        .collect();
    let parts: HashMap<i32, part::Model> = if part_ids.is_empty() {
        HashMap::new()
    } else {
        part::Entity::find()
            .filter(part::Column::Id.is_in(part_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    Ok(orders
        .into_iter()
        .zip(items_by_order)
        .zip(buyers)
        .map(|((order, items), buyer)| {
            OrderView {
                id: order.id,
                user: Buyer {
                    id: order.user_id,
                    name: buyer.as_ref().map(|u| u.name.clone()),
                    email: buyer.map(|u| u.email),
                },
                total_price: total_price(&items),
                order_items: items
                    .into_iter()
                    .map(|item| OrderItemView {
                        product: item
                            .product_id
                            .and_then(|id| parts.get(&id))
                            .map(ProductSummary::from),
                        name: item.name,
                        qty: item.qty,
                        price: item.price,
                        product_id: item.product_id,
                    })
                    .collect(),
                shipping_address: order.shipping_address,
                payment_method: order.payment_method,
                phone: order.phone,
                collection_date: order.collection_date,
                is_paid: order.is_paid,
                paid_at: order.paid_at,
                is_delivered: order.is_delivered,
                delivered_at: order.delivered_at,
                sms_sent_at: order.sms_sent_at,
                sms_error: order.sms_error,
                created_at: order.created_at,
                updated_at: order.updated_at,
            }
        })
        .collect())
}

async fn view(db: &DatabaseConnection, order: order::Model) -> ApiResult<OrderView> {
    views(db, vec![order])
        .await?
        .pop()
        .ok_or_else(|| ApiError::not_found("Order"))
}

async fn find_order(db: &DatabaseConnection, id: i32) -> ApiResult<order::Model> {
    order::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))
}

/// Records the order with its line-item snapshot, then tries to text the buyer.
/// A failed text is written onto the order and never undoes it.
pub async fn create_order(
    db: &DatabaseConnection,
    sms: &SmsClient,
    actor: &Identity,
    input: CreateOrderInput,
) -> ApiResult<OrderView> {
    if input.order_items.is_empty() {
        return Err(ApiError::validation("No order items"));
    }

    let now = Utc::now();
    let txn = db.begin().await?;

    let order = order::ActiveModel {
        user_id: Set(actor.id),
        shipping_address: Set(match input.shipping_address {
            serde_json::Value::Null => serde_json::json!({}),
            address => address,
        }),
        payment_method: Set(non_blank(input.payment_method)),
        phone: Set(non_blank(input.phone)),
        collection_date: Set(input.collection_date),
        is_paid: Set(false),
        paid_at: Set(None),
        is_delivered: Set(false),
        delivered_at: Set(None),
        sms_sent_at: Set(None),
        sms_error: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(input.order_items.len());
    for item in input.order_items {
        let item = order_item::ActiveModel {
            order_id: Set(order.id),
            name: Set(item.name.trim().to_string()),
            qty: Set(item.qty),
            price: Set(item.price),
            product_id: Set(item.product),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;

    tracing::info!(order = order.id, user = actor.id, items = items.len(), "order placed");

    let text = confirmation_text(&order, &items);
    let destination = order.phone.clone().unwrap_or_default();

    let mut active = order.into_active_model();
    match sms.send(&destination, &text).await {
        Ok(receipt) => {
            tracing::info!(to = %receipt.to, "order confirmation sent");
            active.sms_sent_at = Set(Some(Utc::now()));
        }
        Err(err) => {
            tracing::warn!(error = %err, "order confirmation not sent");
            active.sms_error = Set(Some(err.to_string()));
        }
    }
    let order = active.update(db).await?;

    view(db, order).await
}

pub async fn get_order(db: &DatabaseConnection, actor: &Identity, id: i32) -> ApiResult<OrderView> {
    let order = find_order(db, id).await?;
    actor.require_owner_or_admin(order.user_id)?;

    view(db, order).await
}

/// Marks the order paid. Paying twice keeps the first timestamp.
pub async fn pay_order(db: &DatabaseConnection, actor: &Identity, id: i32) -> ApiResult<OrderView> {
    let order = find_order(db, id).await?;
    actor.require_owner_or_admin(order.user_id)?;

    let order = if order.is_paid {
        order
    } else {
        let now = Utc::now();
        let mut active = order.into_active_model();
        active.is_paid = Set(true);
        active.paid_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(db).await?
    };

    view(db, order).await
}

pub async fn my_orders(db: &DatabaseConnection, actor: &Identity) -> ApiResult<Vec<OrderView>> {
    let orders = order::Entity::find()
        .filter(order::Column::UserId.eq(actor.id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;

    views(db, orders).await
}

pub async fn deliver_order(
    db: &DatabaseConnection,
    actor: &Identity,
    id: i32,
) -> ApiResult<OrderView> {
    actor.require_admin()?;

    let order = find_order(db, id).await?;
    let order = if order.is_delivered {
        order
    } else {
        let now = Utc::now();
        let mut active = order.into_active_model();
        active.is_delivered = Set(true);
        active.delivered_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(db).await?
    };

    tracing::info!(order = id, "order delivered");

    view(db, order).await
}
