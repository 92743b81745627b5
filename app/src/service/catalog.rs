//! Parts catalog: filtered listing with keyword search, facet values, authoring
//! scoped to the vendor's shop, and reviews with their rating aggregate.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    LoaderTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    auth::Identity,
    common::{ApiError, ApiResult},
    entity::{
        part::{self, StringList},
        review, shop,
    },
    geo::GeoJsonPoint,
    params::{PAGE_SIZE, PaginationParams, page_count},
    service::{conflict_on_unique, non_blank, shops},
};

const DEFAULT_PART_NAME: &str = "Bike Part";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartFilters {
    pub company: Option<String>,
    pub model: Option<String>,
    pub brand: Option<String>,
    #[serde(rename = "type")]
    pub part_type: Option<String>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub shop: Option<i32>,
    pub keyword: Option<String>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub page: Option<u64>,
}

/// The part's shop as shown next to it: enough to locate it on a map.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSummary {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub location: GeoJsonPoint,
    pub location_set: bool,
}

impl From<&shop::Model> for ShopSummary {
    fn from(shop: &shop::Model) -> Self {
        let location = shop.location();
        ShopSummary {
            id: shop.id,
            name: shop.name.clone(),
            address: shop.address.clone(),
            phone: shop.phone.clone(),
            website: shop.website.clone(),
            location: location.into(),
            location_set: !location.is_unset(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartView {
    pub id: i32,
    pub name: String,
    pub model: Option<String>,
    pub company: Option<String>,
    pub brand: Option<String>,
    #[serde(rename = "type")]
    pub part_type: Option<String>,
    pub vehicle_year: Option<i32>,
    pub compatibility: Vec<String>,
    pub count_in_stock: i32,
    pub price: f64,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub rating: f64,
    pub num_reviews: i32,
    pub vendor_id: i32,
    pub shop_id: i32,
    /// `null` when the owning shop no longer exists.
    pub shop: Option<ShopSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<review::Model>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PartView {
    fn new(part: part::Model, shop: Option<&shop::Model>) -> Self {
        PartView {
            id: part.id,
            name: part.name,
            model: part.model,
            company: part.company,
            brand: part.brand,
            part_type: part.part_type,
            vehicle_year: part.vehicle_year,
            compatibility: part.compatibility.0,
            count_in_stock: part.count_in_stock,
            price: part.price,
            images: part.images.0,
            description: part.description,
            rating: part.rating,
            num_reviews: part.num_reviews,
            vendor_id: part.vendor_id,
            shop_id: part.shop_id,
            shop: shop.map(ShopSummary::from),
            reviews: None,
            created_at: part.created_at,
            updated_at: part.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<PartView>,
    pub page: u64,
    pub pages: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePartInput {
    pub name: Option<String>,
    pub model: Option<String>,
    /// Several models fan out into one part per model.
    #[serde(default)]
    pub models: Vec<String>,
    pub company: Option<String>,
    pub brand: Option<String>,
    #[serde(rename = "type")]
    pub part_type: Option<String>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub vehicle_year: Option<i32>,
    #[serde(default)]
    pub compatibility: Vec<String>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    #[validate(range(min = 0, message = "countInStock must not be negative"))]
    pub count_in_stock: Option<i32>,
    #[serde(deserialize_with = "crate::serde::deserialize_number")]
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    /// Prepended to `images`.
    pub image_url: Option<String>,
    pub description: Option<String>,
    /// Only administrators choose the shop; vendors always list in their own.
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub shop: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePartInput {
    pub name: Option<String>,
    pub model: Option<String>,
    pub company: Option<String>,
    pub brand: Option<String>,
    #[serde(rename = "type")]
    pub part_type: Option<String>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub vehicle_year: Option<i32>,
    pub compatibility: Option<Vec<String>>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    #[validate(range(min = 0, message = "countInStock must not be negative"))]
    pub count_in_stock: Option<i32>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ReviewInput {
    #[serde(deserialize_with = "crate::serde::deserialize_number")]
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    pub comment: Option<String>,
}

/// A fanned-out creation reports ids only; a single creation returns the part.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CreatedParts {
    Single(Box<PartView>),
    Many { created: Vec<i32> },
}

/// Escapes `LIKE` wildcards so the keyword matches only as a literal substring.
pub fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring match against any of the searchable text columns.
/// Column and pattern are both folded by the database's `lower()`.
fn keyword_condition(keyword: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(keyword));

    [
        part::Column::Name,
        part::Column::Model,
        part::Column::Company,
        part::Column::Brand,
        part::Column::PartType,
    ]
    .into_iter()
    .fold(Condition::any(), |any, column| {
        any.add(Expr::cust_with_exprs(
            r"LOWER($1) LIKE LOWER($2) ESCAPE '\'",
            [Expr::col(column).into(), Expr::val(pattern.clone()).into()],
        ))
    })
}

fn filter_condition(filters: &PartFilters) -> Condition {
    let equalities = [
        (part::Column::Company, &filters.company),
        (part::Column::Model, &filters.model),
        (part::Column::Brand, &filters.brand),
        (part::Column::PartType, &filters.part_type),
    ];

    let mut condition = equalities
        .into_iter()
        .filter_map(|(column, value)| non_blank(value.clone()).map(|v| column.eq(v)))
        .fold(Condition::all(), |all, expr| all.add(expr));

    if let Some(shop) = filters.shop {
        condition = condition.add(part::Column::ShopId.eq(shop));
    }

    if let Some(keyword) = non_blank(filters.keyword.clone()) {
        condition = condition.add(keyword_condition(&keyword));
    }

    condition
}

pub async fn list_parts(db: &DatabaseConnection, filters: &PartFilters) -> ApiResult<ProductPage> {
    let pagination = PaginationParams::new(filters.page.unwrap_or(1));

    let paginator = part::Entity::find()
        .filter(filter_condition(filters))
        .order_by_asc(part::Column::Id)
        .paginate(db, PAGE_SIZE);

    let total = paginator.num_items().await?;
    let pages = page_count(total, PAGE_SIZE);
    let parts = if pagination.index() < pages {
        paginator.fetch_page(pagination.index()).await?
    } else {
        Vec::new()
    };
    let shops = parts.load_one(shop::Entity, db).await?;

    let products = parts
        .into_iter()
        .zip(shops)
        .map(|(part, shop)| PartView::new(part, shop.as_ref()))
        .collect();

    Ok(ProductPage {
        products,
        page: pagination.page,
        pages,
        total,
    })
}

async fn find_part(db: &DatabaseConnection, id: i32) -> ApiResult<part::Model> {
    part::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))
}

pub async fn get_part(db: &DatabaseConnection, id: i32) -> ApiResult<PartView> {
    let (part, shop) = part::Entity::find_by_id(id)
        .find_also_related(shop::Entity)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    let reviews = part
        .find_related(review::Entity)
        .order_by_asc(review::Column::Id)
        .all(db)
        .await?;

    let mut view = PartView::new(part, shop.as_ref());
    view.reviews = Some(reviews);

    Ok(view)
}

/// Distinct non-empty values of a text column, optionally within one company.
async fn distinct_values(
    db: &DatabaseConnection,
    column: part::Column,
    company: Option<&str>,
) -> ApiResult<Vec<String>> {
    let mut select = part::Entity::find()
        .select_only()
        .column(column)
        .distinct()
        .filter(column.is_not_null())
        .filter(column.ne(""));

    if let Some(company) = company {
        select = select.filter(part::Column::Company.eq(company));
    }

    Ok(select
        .order_by_asc(column)
        .into_tuple::<String>()
        .all(db)
        .await?)
}

pub async fn distinct_companies(db: &DatabaseConnection) -> ApiResult<Vec<String>> {
    distinct_values(db, part::Column::Company, None).await
}

pub async fn distinct_models(db: &DatabaseConnection, company: &str) -> ApiResult<Vec<String>> {
    let company = company.trim();
    if company.is_empty() {
        return Err(ApiError::validation("company is required"));
    }
    distinct_values(db, part::Column::Model, Some(company)).await
}

pub async fn distinct_brands(db: &DatabaseConnection) -> ApiResult<Vec<String>> {
    distinct_values(db, part::Column::Brand, None).await
}

pub async fn distinct_types(db: &DatabaseConnection) -> ApiResult<Vec<String>> {
    distinct_values(db, part::Column::PartType, None).await
}

/// Trimmed, non-empty, first occurrence wins.
pub fn fan_out_models(models: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    models
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty() && seen.insert(m.to_string()))
        .map(str::to_string)
        .collect()
}

/// Explicit name, else "<company> <model>", else a generic label.
pub fn display_name(name: Option<&str>, company: Option<&str>, model: Option<&str>) -> String {
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    let derived = [company, model]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if derived.is_empty() {
        DEFAULT_PART_NAME.to_string()
    } else {
        derived
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn with_image_url(mut images: Vec<String>, image_url: Option<String>) -> Vec<String> {
    if let Some(url) = non_blank(image_url) {
        images.retain(|i| *i != url);
        images.insert(0, url);
    }
    images
}

/// The shop a new part goes into. Vendors are pinned to their own shop.
async fn target_shop(
    db: &DatabaseConnection,
    actor: &Identity,
    requested: Option<i32>,
) -> ApiResult<shop::Model> {
    if actor.is_vendor() {
        return shops::find_by_vendor(db, actor.id)
            .await?
            .ok_or_else(|| ApiError::validation("Create/update your shop first"));
    }

    let id = requested.ok_or_else(|| ApiError::validation("shop is required"))?;
    shops::find_by_id(db, id).await
}

pub async fn create_part(
    db: &DatabaseConnection,
    actor: &Identity,
    input: CreatePartInput,
) -> ApiResult<CreatedParts> {
    actor.require_vendor_or_admin()?;

    let shop = target_shop(db, actor, input.shop).await?;
    if shop.location().is_unset() {
        return Err(ApiError::validation(
            "Set your shop location before adding parts",
        ));
    }

    let models = fan_out_models(&input.models);
    let images = with_image_url(clean_list(input.images.clone()), input.image_url.clone());
    let compatibility = clean_list(input.compatibility.clone());
    let company = non_blank(input.company.clone());
    let now = Utc::now();

    let draft = |model: Option<String>| part::ActiveModel {
        name: Set(display_name(
            input.name.as_deref(),
            company.as_deref(),
            model.as_deref(),
        )),
        model: Set(model),
        company: Set(company.clone()),
        brand: Set(non_blank(input.brand.clone())),
        part_type: Set(non_blank(input.part_type.clone())),
        vehicle_year: Set(input.vehicle_year),
        compatibility: Set(StringList(compatibility.clone())),
        count_in_stock: Set(input.count_in_stock.unwrap_or(0)),
        price: Set(input.price),
        images: Set(StringList(images.clone())),
        description: Set(non_blank(input.description.clone())),
        rating: Set(0.0),
        num_reviews: Set(0),
        vendor_id: Set(shop.vendor_id),
        shop_id: Set(shop.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    if models.len() > 1 {
        let mut created = Vec::with_capacity(models.len());
        for model in models {
            let part = draft(Some(model)).insert(db).await?;
            created.push(part.id);
        }

        tracing::info!(shop = shop.id, count = created.len(), "parts created");

        return Ok(CreatedParts::Many { created });
    }

    let model = models
        .into_iter()
        .next()
        .or_else(|| non_blank(input.model.clone()));
    let part = draft(model).insert(db).await?;

    tracing::info!(part = part.id, shop = shop.id, "part created");

    Ok(CreatedParts::Single(Box::new(PartView::new(part, Some(&shop)))))
}

/// Administrators act on any part; vendors only on parts of their own shop.
async fn authorize_part(
    db: &DatabaseConnection,
    actor: &Identity,
    part: &part::Model,
) -> ApiResult<()> {
    if actor.is_admin() {
        return Ok(());
    }

    if actor.is_vendor() {
        let own = shops::find_by_vendor(db, actor.id).await?;
        if own.is_some_and(|shop| shop.id == part.shop_id) {
            return Ok(());
        }
    }

    tracing::warn!(part = part.id, user = actor.id, "part change refused");
    Err(ApiError::forbidden())
}

pub async fn update_part(
    db: &DatabaseConnection,
    actor: &Identity,
    id: i32,
    input: UpdatePartInput,
) -> ApiResult<PartView> {
    let part = find_part(db, id).await?;
    authorize_part(db, actor, &part).await?;

    let images = match (input.images, input.image_url) {
        (None, None) => None,
        (images, image_url) => Some(with_image_url(
            images.map(clean_list).unwrap_or_else(|| part.images.0.clone()),
            image_url,
        )),
    };

    let mut active = part.into_active_model();
    if let Some(name) = non_blank(input.name) {
        active.name = Set(name);
    }
    if input.model.is_some() {
        active.model = Set(non_blank(input.model));
    }
    if input.company.is_some() {
        active.company = Set(non_blank(input.company));
    }
    if input.brand.is_some() {
        active.brand = Set(non_blank(input.brand));
    }
    if input.part_type.is_some() {
        active.part_type = Set(non_blank(input.part_type));
    }
    if let Some(year) = input.vehicle_year {
        active.vehicle_year = Set(Some(year));
    }
    if let Some(compatibility) = input.compatibility {
        active.compatibility = Set(StringList(clean_list(compatibility)));
    }
    if let Some(count) = input.count_in_stock {
        active.count_in_stock = Set(count);
    }
    if let Some(price) = input.price {
        active.price = Set(price);
    }
    if let Some(images) = images {
        active.images = Set(StringList(images));
    }
    if input.description.is_some() {
        active.description = Set(non_blank(input.description));
    }
    active.updated_at = Set(Utc::now());

    let part = active.update(db).await?;
    let shop = shop::Entity::find_by_id(part.shop_id).one(db).await?;

    tracing::info!(part = part.id, user = actor.id, "part updated");

    Ok(PartView::new(part, shop.as_ref()))
}

pub async fn delete_part(db: &DatabaseConnection, actor: &Identity, id: i32) -> ApiResult<()> {
    let part = find_part(db, id).await?;
    authorize_part(db, actor, &part).await?;

    let txn = db.begin().await?;
    review::Entity::delete_many()
        .filter(review::Column::PartId.eq(part.id))
        .exec(&txn)
        .await?;
    part::Entity::delete_by_id(part.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(part = id, user = actor.id, "part deleted");

    Ok(())
}

/// One review per user and part. The rating mean and count are recomputed
/// in the same transaction as the insert.
pub async fn add_review(
    db: &DatabaseConnection,
    actor: &Identity,
    part_id: i32,
    input: ReviewInput,
) -> ApiResult<review::Model> {
    let already_reviewed = || ApiError::validation("Product already reviewed");

    let txn = db.begin().await?;

    let part = part::Entity::find_by_id(part_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;

    let existing = review::Entity::find()
        .filter(review::Column::PartId.eq(part.id))
        .filter(review::Column::UserId.eq(actor.id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(already_reviewed());
    }

    let review = review::ActiveModel {
        part_id: Set(part.id),
        user_id: Set(actor.id),
        name: Set(actor.name.clone()),
        rating: Set(input.rating),
        comment: Set(non_blank(input.comment)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match conflict_on_unique(e, "") {
        ApiError::Conflict(_) => already_reviewed(),
        other => other,
    })?;

    let ratings: Vec<i32> = review::Entity::find()
        .select_only()
        .column(review::Column::Rating)
        .filter(review::Column::PartId.eq(part.id))
        .into_tuple()
        .all(&txn)
        .await?;

    let count = ratings.len() as i32;
    let mean = if count == 0 {
        0.0
    } else {
        ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / f64::from(count)
    };

    let mut active = part.into_active_model();
    active.rating = Set(mean);
    active.num_reviews = Set(count);
    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(part = part_id, user = actor.id, rating = input.rating, "review added");

    Ok(review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entity::user::Role, geo::GeoPoint, service::fixtures};

    fn brake_pads(price: f64) -> CreatePartInput {
        CreatePartInput {
            company: Some("Honda".into()),
            model: Some("Shine".into()),
            brand: Some("Bosch".into()),
            part_type: Some("Brake".into()),
            price,
            count_in_stock: Some(4),
            ..Default::default()
        }
    }

    async fn single(db: &DatabaseConnection, actor: &Identity, input: CreatePartInput) -> PartView {
        match create_part(db, actor, input).await.unwrap() {
            CreatedParts::Single(part) => *part,
            CreatedParts::Many { .. } => panic!("expected a single part"),
        }
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("a.b*(c)$"), "a.b*(c)$");
    }

    #[test]
    fn fan_out_trims_and_dedupes() {
        let models = ["Shine ", "", "  ", "Unicorn", "Shine", "SP 125"].map(String::from);
        assert_eq!(fan_out_models(&models), vec!["Shine", "Unicorn", "SP 125"]);
    }

    #[test]
    fn names_fall_back_to_company_and_model() {
        assert_eq!(display_name(Some(" Pads "), Some("Honda"), None), "Pads");
        assert_eq!(display_name(None, Some("Honda"), Some("Shine")), "Honda Shine");
        assert_eq!(display_name(Some(""), None, Some("Shine")), "Shine");
        assert_eq!(display_name(None, None, None), "Bike Part");
    }

    #[test]
    fn unknown_part_fields_are_rejected() {
        let spoofed = serde_json::json!({"price": 10, "vendor": 99});
        assert!(serde_json::from_value::<CreatePartInput>(spoofed).is_err());

        let ok = serde_json::json!({"price": "10.5", "type": "Brake", "imageUrl": "/uploads/a.png"});
        let input: CreatePartInput = serde_json::from_value(ok).unwrap();
        assert_eq!(input.price, 10.5);
        assert_eq!(input.part_type.as_deref(), Some("Brake"));
    }

    #[test]
    fn reviews_cannot_name_their_author() {
        let forged = serde_json::json!({"rating": 5, "user": 9});
        assert!(serde_json::from_value::<ReviewInput>(forged).is_err());

        let plain = serde_json::json!({"rating": "4", "comment": "ok"});
        assert_eq!(serde_json::from_value::<ReviewInput>(plain).unwrap().rating, 4);
    }

    #[tokio::test]
    async fn several_models_fan_out_into_parts() {
        let db = fixtures::db().await;
        let (vendor, shop) = fixtures::vendor_with_shop(&db, "v@example.com").await;

        let created = create_part(
            &db,
            &vendor,
            CreatePartInput {
                models: ["Shine", "Unicorn", "Shine", " SP 125 "].map(String::from).to_vec(),
                ..brake_pads(450.0)
            },
        )
        .await
        .unwrap();

        let CreatedParts::Many { created } = created else {
            panic!("expected fan-out");
        };
        assert_eq!(created.len(), 3);

        let page = list_parts(&db, &PartFilters::default()).await.unwrap();
        assert_eq!(page.total, 3);
        let mut models: Vec<_> = page.products.iter().filter_map(|p| p.model.clone()).collect();
        models.sort();
        assert_eq!(models, vec!["SP 125", "Shine", "Unicorn"]);
        for part in &page.products {
            assert_eq!(part.shop_id, shop.id);
            assert_eq!(part.vendor_id, vendor.id);
            assert_eq!(part.price, 450.0);
            assert_eq!(part.name, format!("Honda {}", part.model.as_deref().unwrap()));
        }
    }

    #[tokio::test]
    async fn single_model_list_creates_one_part() {
        let db = fixtures::db().await;
        let (vendor, _) = fixtures::vendor_with_shop(&db, "v@example.com").await;

        let part = single(
            &db,
            &vendor,
            CreatePartInput {
                models: vec!["Activa".into(), "".into()],
                image_url: Some("/uploads/pad.png".into()),
                images: vec!["/uploads/side.png".into()],
                ..brake_pads(120.0)
            },
        )
        .await;

        assert_eq!(part.model.as_deref(), Some("Activa"));
        assert_eq!(part.images, vec!["/uploads/pad.png", "/uploads/side.png"]);
        assert!(part.shop.is_some());
    }

    #[tokio::test]
    async fn vendor_needs_a_located_shop() {
        let db = fixtures::db().await;
        let vendor = fixtures::user(&db, "v@example.com", Role::Vendor).await;
        let actor = fixtures::identity(&vendor);

        let err = create_part(&db, &actor, brake_pads(10.0)).await.unwrap_err();
        assert_eq!(err.public_message(), "Create/update your shop first");

        fixtures::shop(&db, vendor.id, GeoPoint::UNSET).await;
        let err = create_part(&db, &actor, brake_pads(10.0)).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(err.public_message().contains("location"));
    }

    #[tokio::test]
    async fn vendor_cannot_choose_another_shop() {
        let db = fixtures::db().await;
        let (vendor, own) = fixtures::vendor_with_shop(&db, "v@example.com").await;
        let (_, other) = fixtures::vendor_with_shop(&db, "o@example.com").await;

        let part = single(
            &db,
            &vendor,
            CreatePartInput {
                shop: Some(other.id),
                ..brake_pads(10.0)
            },
        )
        .await;
        assert_eq!(part.shop_id, own.id);
    }

    #[tokio::test]
    async fn admin_creates_in_named_shop_with_its_vendor() {
        let db = fixtures::db().await;
        let (vendor, shop) = fixtures::vendor_with_shop(&db, "v@example.com").await;
        let admin = fixtures::identity(&fixtures::user(&db, "a@example.com", Role::Admin).await);

        let err = create_part(&db, &admin, brake_pads(10.0)).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let part = single(
            &db,
            &admin,
            CreatePartInput {
                shop: Some(shop.id),
                ..brake_pads(10.0)
            },
        )
        .await;
        assert_eq!(part.vendor_id, vendor.id);
    }

    #[tokio::test]
    async fn customers_cannot_author_parts() {
        let db = fixtures::db().await;
        let customer = fixtures::identity(&fixtures::user(&db, "c@example.com", Role::Customer).await);
        let err = create_part(&db, &customer, brake_pads(10.0)).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn filters_and_keyword_combine() {
        let db = fixtures::db().await;
        let (vendor, _) = fixtures::vendor_with_shop(&db, "v@example.com").await;

        single(&db, &vendor, brake_pads(100.0)).await;
        single(
            &db,
            &vendor,
            CreatePartInput {
                name: Some("Chain 50%_kit".into()),
                company: Some("Bajaj".into()),
                model: Some("Pulsar".into()),
                part_type: Some("Chain".into()),
                price: 900.0,
                ..Default::default()
            },
        )
        .await;

        let by_company = PartFilters {
            company: Some("Honda".into()),
            ..Default::default()
        };
        assert_eq!(list_parts(&db, &by_company).await.unwrap().total, 1);

        let keyword = |kw: &str| PartFilters {
            keyword: Some(kw.into()),
            ..Default::default()
        };
        assert_eq!(list_parts(&db, &keyword("bOsCh")).await.unwrap().total, 1);
        assert_eq!(list_parts(&db, &keyword("pulsar")).await.unwrap().total, 1);
        assert_eq!(list_parts(&db, &keyword("50%_")).await.unwrap().total, 1);
        assert_eq!(list_parts(&db, &keyword("%")).await.unwrap().total, 1);
        assert_eq!(list_parts(&db, &keyword("_")).await.unwrap().total, 1);
        assert_eq!(list_parts(&db, &keyword(".*")).await.unwrap().total, 0);
        assert_eq!(list_parts(&db, &keyword("(")).await.unwrap().total, 0);

        let mixed = PartFilters {
            company: Some("Honda".into()),
            keyword: Some("chain".into()),
            ..Default::default()
        };
        assert_eq!(list_parts(&db, &mixed).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn keyword_folding_matches_the_column_folding() {
        let db = fixtures::db().await;
        let (vendor, _) = fixtures::vendor_with_shop(&db, "v@example.com").await;
        single(
            &db,
            &vendor,
            CreatePartInput {
                brand: Some("Łuk Moto".into()),
                price: 120.0,
                ..Default::default()
            },
        )
        .await;

        let keyword = |kw: &str| PartFilters {
            keyword: Some(kw.into()),
            ..Default::default()
        };
        assert_eq!(list_parts(&db, &keyword("ŁUK MOTO")).await.unwrap().total, 1);
        assert_eq!(list_parts(&db, &keyword("Łuk")).await.unwrap().total, 1);
        assert_eq!(list_parts(&db, &keyword("moto")).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn listing_paginates_by_ten() {
        let db = fixtures::db().await;
        let (vendor, _) = fixtures::vendor_with_shop(&db, "v@example.com").await;
        for i in 0..23 {
            single(&db, &vendor, brake_pads(f64::from(i))).await;
        }

        let first = list_parts(&db, &PartFilters::default()).await.unwrap();
        assert_eq!((first.page, first.pages, first.total), (1, 3, 23));
        assert_eq!(first.products.len(), 10);
        assert!(first.products[0].shop.as_ref().unwrap().location_set);

        let last = list_parts(
            &db,
            &PartFilters {
                page: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(last.products.len(), 3);
    }

    #[tokio::test]
    async fn pages_past_the_end_are_empty() {
        let db = fixtures::db().await;
        let (vendor, _) = fixtures::vendor_with_shop(&db, "v@example.com").await;
        single(&db, &vendor, brake_pads(10.0)).await;

        let filters: PartFilters =
            serde_json::from_value(serde_json::json!({"page": "18446744073709551615"})).unwrap();
        let page = list_parts(&db, &filters).await.unwrap();

        assert!(page.products.is_empty());
        assert_eq!((page.pages, page.total), (1, 1));
        assert_eq!(page.page, crate::params::pagination::MAX_PAGE);
    }

    #[tokio::test]
    async fn facets_skip_empty_values() {
        let db = fixtures::db().await;
        let (vendor, _) = fixtures::vendor_with_shop(&db, "v@example.com").await;
        single(&db, &vendor, brake_pads(1.0)).await;
        single(
            &db,
            &vendor,
            CreatePartInput {
                company: Some("Honda".into()),
                model: Some("Unicorn".into()),
                brand: Some("  ".into()),
                price: 2.0,
                ..Default::default()
            },
        )
        .await;
        single(
            &db,
            &vendor,
            CreatePartInput {
                company: Some("TVS".into()),
                price: 3.0,
                ..Default::default()
            },
        )
        .await;

        assert_eq!(distinct_companies(&db).await.unwrap(), vec!["Honda", "TVS"]);
        assert_eq!(
            distinct_models(&db, "Honda").await.unwrap(),
            vec!["Shine", "Unicorn"]
        );
        assert!(distinct_models(&db, "TVS").await.unwrap().is_empty());
        assert_eq!(distinct_brands(&db).await.unwrap(), vec!["Bosch"]);
        assert_eq!(distinct_types(&db).await.unwrap(), vec!["Brake"]);
        assert!(matches!(
            distinct_models(&db, " ").await.unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn only_the_owning_vendor_edits() {
        let db = fixtures::db().await;
        let (owner, _) = fixtures::vendor_with_shop(&db, "v@example.com").await;
        let (intruder, _) = fixtures::vendor_with_shop(&db, "i@example.com").await;
        let admin = fixtures::identity(&fixtures::user(&db, "a@example.com", Role::Admin).await);
        let part = single(&db, &owner, brake_pads(100.0)).await;

        let patch = UpdatePartInput {
            price: Some(80.0),
            ..Default::default()
        };
        assert!(matches!(
            update_part(&db, &intruder, part.id, patch.clone()).await.unwrap_err(),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            delete_part(&db, &intruder, part.id).await.unwrap_err(),
            ApiError::Forbidden(_)
        ));

        let updated = update_part(&db, &owner, part.id, patch).await.unwrap();
        assert_eq!(updated.price, 80.0);
        assert_eq!(updated.model.as_deref(), Some("Shine"));

        delete_part(&db, &admin, part.id).await.unwrap();
        assert!(matches!(
            get_part(&db, part.id).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn reviews_keep_the_mean_and_reject_repeats() {
        let db = fixtures::db().await;
        let (vendor, _) = fixtures::vendor_with_shop(&db, "v@example.com").await;
        let part = single(&db, &vendor, brake_pads(100.0)).await;
        let alice = fixtures::identity(&fixtures::user(&db, "alice@example.com", Role::Customer).await);
        let bob = fixtures::identity(&fixtures::user(&db, "bob@example.com", Role::Customer).await);

        let review = |rating| ReviewInput {
            rating,
            comment: Some("ok".into()),
        };

        add_review(&db, &alice, part.id, review(5)).await.unwrap();
        add_review(&db, &bob, part.id, review(2)).await.unwrap();

        let err = add_review(&db, &alice, part.id, review(1)).await.unwrap_err();
        assert_eq!(err.public_message(), "Product already reviewed");

        let part = get_part(&db, part.id).await.unwrap();
        assert_eq!(part.num_reviews, 2);
        assert_eq!(part.rating, 3.5);
        assert_eq!(part.reviews.as_ref().unwrap().len(), 2);

        assert!(matches!(
            add_review(&db, &alice, 999, review(4)).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }
}
