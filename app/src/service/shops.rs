use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, LoaderTrait, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    auth::Identity,
    common::{ApiError, ApiResult},
    entity::{
        part, review, shop,
        user::{self, Role},
    },
    geo::{self, GeoJsonPoint, GeoPoint},
    service::non_blank,
};

#[derive(Debug, Clone, Serialize)]
pub struct VendorSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<&user::Model> for VendorSummary {
    fn from(user: &user::Model) -> Self {
        VendorSummary {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopView {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub vendor_id: i32,
    pub vendor: Option<VendorSummary>,
    pub location: GeoJsonPoint,
    /// False while the shop still sits on the unset placeholder point.
    pub location_set: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShopView {
    fn new(shop: shop::Model, vendor: Option<&user::Model>, center: Option<GeoPoint>) -> Self {
        let location = shop.location();
        let distance_km = center
            .zip(location.known())
            .map(|(center, point)| geo::haversine_km(center, point));

        ShopView {
            id: shop.id,
            name: shop.name,
            address: shop.address,
            phone: shop.phone,
            website: shop.website,
            vendor_id: shop.vendor_id,
            vendor: vendor.map(VendorSummary::from),
            location: location.into(),
            location_set: !location.is_unset(),
            distance_km,
            created_at: shop.created_at,
            updated_at: shop.updated_at,
        }
    }
}

/// `lat`, `lng` and `radius` (km) together narrow the listing; any missing one lists all shops.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ShopQuery {
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub lng: Option<f64>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    #[validate(range(min = 0.0, message = "radius must not be negative"))]
    pub radius: Option<f64>,
}

impl ShopQuery {
    pub fn center(&self) -> Option<GeoPoint> {
        self.lat.zip(self.lng).map(|(lat, lng)| GeoPoint::new(lat, lng))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewShop {
    #[validate(length(min = 1, message = "Shop name is required"))]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub longitude: Option<f64>,
    /// Administrators create shops on behalf of a vendor.
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub vendor_id: Option<i32>,
}

/// Partial update: only the fields present are written.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ShopUpdate {
    /// Target shop for administrators using `PUT /shops/me`.
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub id: Option<i32>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_number")]
    pub longitude: Option<f64>,
}

/// Both coordinates or neither.
fn coordinates(latitude: Option<f64>, longitude: Option<f64>) -> ApiResult<Option<GeoPoint>> {
    match (latitude, longitude) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => {
            let point = GeoPoint::new(lat, lng);
            if point.is_valid() {
                Ok(Some(point))
            } else {
                Err(ApiError::validation("Coordinates are out of range"))
            }
        }
        _ => Err(ApiError::validation(
            "Latitude and longitude must be provided together",
        )),
    }
}

pub async fn find_by_vendor<C: ConnectionTrait>(
    conn: &C,
    vendor_id: i32,
) -> ApiResult<Option<shop::Model>> {
    Ok(shop::Entity::find()
        .filter(shop::Column::VendorId.eq(vendor_id))
        .order_by_asc(shop::Column::Id)
        .one(conn)
        .await?)
}

pub async fn find_by_id<C: ConnectionTrait>(conn: &C, id: i32) -> ApiResult<shop::Model> {
    shop::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found("Shop"))
}

/// Shop for a freshly provisioned vendor, placed on the unset point.
pub async fn provision_shop<C: ConnectionTrait>(
    conn: &C,
    vendor_id: i32,
    name: &str,
    phone: Option<String>,
) -> ApiResult<shop::Model> {
    let now = Utc::now();

    Ok(shop::ActiveModel {
        name: Set(name.to_string()),
        address: Set(None),
        phone: Set(phone),
        website: Set(None),
        vendor_id: Set(vendor_id),
        longitude: Set(GeoPoint::UNSET.lng),
        latitude: Set(GeoPoint::UNSET.lat),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?)
}

async fn view(db: &DatabaseConnection, shop: shop::Model) -> ApiResult<ShopView> {
    let vendor = shop.find_related(user::Entity).one(db).await?;
    Ok(ShopView::new(shop, vendor.as_ref(), None))
}

/// All shops, or those inside a spherical cap of `radius` km around (`lat`, `lng`).
pub async fn list_shops(db: &DatabaseConnection, query: &ShopQuery) -> ApiResult<Vec<ShopView>> {
    let center = query.center();
    if center.is_some_and(|c| !c.is_valid()) {
        return Err(ApiError::validation("Coordinates are out of range"));
    }
    let cap = center.zip(query.radius);

    let mut select = shop::Entity::find().order_by_asc(shop::Column::Id);

    if let Some((center, radius)) = cap {
        let (south, north) = geo::latitude_band(center, radius);
        select = select
            .filter(shop::Column::Latitude.between(south, north))
            .filter(
                Condition::any()
                    .add(shop::Column::Latitude.ne(0.0))
                    .add(shop::Column::Longitude.ne(0.0)),
            );
    }

    let shops: Vec<shop::Model> = select
        .all(db)
        .await?
        .into_iter()
        .filter(|shop| match cap {
            Some((center, radius)) => geo::within_radius(center, radius, shop.location()),
            None => true,
        })
        .collect();

    let vendors = shops.load_one(user::Entity, db).await?;

    Ok(shops
        .into_iter()
        .zip(vendors)
        .map(|(shop, vendor)| ShopView::new(shop, vendor.as_ref(), center))
        .collect())
}

pub async fn get_shop(db: &DatabaseConnection, id: i32) -> ApiResult<ShopView> {
    let shop = find_by_id(db, id).await?;
    view(db, shop).await
}

/// Vendors get their own shop; administrators name the shop they mean.
async fn resolve_my_shop(
    db: &DatabaseConnection,
    actor: &Identity,
    shop_id: Option<i32>,
) -> ApiResult<shop::Model> {
    actor.require_vendor_or_admin()?;

    if actor.is_admin() {
        let id = shop_id
            .ok_or_else(|| ApiError::validation("Shop id is required for administrators"))?;
        return find_by_id(db, id).await;
    }

    find_by_vendor(db, actor.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Shop"))
}

pub async fn get_my_shop(
    db: &DatabaseConnection,
    actor: &Identity,
    shop_id: Option<i32>,
) -> ApiResult<ShopView> {
    let shop = resolve_my_shop(db, actor, shop_id).await?;
    view(db, shop).await
}

async fn apply_update(
    db: &DatabaseConnection,
    shop: shop::Model,
    update: ShopUpdate,
) -> ApiResult<shop::Model> {
    let location = coordinates(update.latitude, update.longitude)?;

    let mut active = shop.into_active_model();
    if let Some(name) = update.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("Shop name cannot be empty"));
        }
        active.name = Set(name.to_string());
    }
    if update.address.is_some() {
        active.address = Set(non_blank(update.address));
    }
    if update.phone.is_some() {
        active.phone = Set(non_blank(update.phone));
    }
    if update.website.is_some() {
        active.website = Set(non_blank(update.website));
    }
    if let Some(point) = location {
        active.longitude = Set(point.lng);
        active.latitude = Set(point.lat);
    }
    active.updated_at = Set(Utc::now());

    Ok(active.update(db).await?)
}

pub async fn update_my_shop(
    db: &DatabaseConnection,
    actor: &Identity,
    update: ShopUpdate,
) -> ApiResult<ShopView> {
    let shop = resolve_my_shop(db, actor, update.id).await?;
    let shop = apply_update(db, shop, update).await?;

    tracing::info!(shop = shop.id, user = actor.id, "shop updated");

    view(db, shop).await
}

pub async fn update_shop(
    db: &DatabaseConnection,
    actor: &Identity,
    id: i32,
    update: ShopUpdate,
) -> ApiResult<ShopView> {
    let shop = find_by_id(db, id).await?;
    actor.require_owner_or_admin(shop.vendor_id)?;

    let shop = apply_update(db, shop, update).await?;

    tracing::info!(shop = shop.id, user = actor.id, "shop updated");

    view(db, shop).await
}

/// One shop per vendor. Vendors open their own; administrators open one for a vendor.
pub async fn create_shop(
    db: &DatabaseConnection,
    actor: &Identity,
    input: NewShop,
) -> ApiResult<ShopView> {
    actor.require_vendor_or_admin()?;

    let location = coordinates(input.latitude, input.longitude)?
        .ok_or_else(|| ApiError::validation("Missing coordinates"))?;

    let vendor_id = if actor.is_admin() {
        let vendor_id = input
            .vendor_id
            .ok_or_else(|| ApiError::validation("vendorId is required for administrators"))?;
        let vendor = user::Entity::find_by_id(vendor_id).one(db).await?;
        if !matches!(vendor, Some(ref v) if v.role == Role::Vendor) {
            return Err(ApiError::validation("vendorId must reference a vendor"));
        }
        vendor_id
    } else {
        actor.id
    };

    if find_by_vendor(db, vendor_id).await?.is_some() {
        return Err(ApiError::Conflict(
            "Shop already exists for this vendor".to_string(),
        ));
    }

    let now = Utc::now();
    let shop = shop::ActiveModel {
        name: Set(input.name.trim().to_string()),
        address: Set(non_blank(input.address)),
        phone: Set(non_blank(input.phone)),
        website: Set(non_blank(input.website)),
        vendor_id: Set(vendor_id),
        longitude: Set(location.lng),
        latitude: Set(location.lat),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(shop = shop.id, vendor = vendor_id, "shop created");

    view(db, shop).await
}

/// Removes the shop with its parts and their reviews.
pub async fn delete_shop(db: &DatabaseConnection, actor: &Identity, id: i32) -> ApiResult<()> {
    let shop = find_by_id(db, id).await?;
    actor.require_owner_or_admin(shop.vendor_id)?;

    let txn = db.begin().await?;

    let part_ids: Vec<i32> = part::Entity::find()
        .filter(part::Column::ShopId.eq(shop.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    if !part_ids.is_empty() {
        review::Entity::delete_many()
            .filter(review::Column::PartId.is_in(part_ids.clone()))
            .exec(&txn)
            .await?;
        part::Entity::delete_many()
            .filter(part::Column::Id.is_in(part_ids))
            .exec(&txn)
            .await?;
    }

    shop::Entity::delete_by_id(shop.id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(shop = id, user = actor.id, "shop deleted");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fixtures;

    fn near(lat: f64, lng: f64, radius: f64) -> ShopQuery {
        ShopQuery {
            lat: Some(lat),
            lng: Some(lng),
            radius: Some(radius),
        }
    }

    #[tokio::test]
    async fn radius_query_finds_nearby_shop_only() {
        let db = fixtures::db().await;
        let (_, bangalore) = fixtures::vendor_with_shop(&db, "blr@example.com").await;
        let chennai_vendor = fixtures::user(&db, "maa@example.com", Role::Vendor).await;
        fixtures::shop(&db, chennai_vendor.id, GeoPoint::new(13.0827, 80.2707)).await;
        let unplaced = fixtures::user(&db, "new@example.com", Role::Vendor).await;
        provision_shop(&db, unplaced.id, "New", None).await.unwrap();

        let all = list_shops(&db, &ShopQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|s| s.distance_km.is_none()));

        let nearby = list_shops(&db, &near(12.97, 77.59, 1.0)).await.unwrap();
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].id, bangalore.id);
        assert_eq!(nearby[0].location.coordinates, [77.5946, 12.9716]);
        assert_eq!(nearby[0].vendor.as_ref().unwrap().email, "blr@example.com");
        let d = nearby[0].distance_km.unwrap();
        assert!(d > 0.4 && d < 0.6, "got {d}");

        assert!(list_shops(&db, &near(12.97, 77.59, 0.01)).await.unwrap().is_empty());
        assert_eq!(list_shops(&db, &near(12.97, 77.59, 400.0)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unset_shops_never_match_a_radius() {
        let db = fixtures::db().await;
        let vendor = fixtures::user(&db, "v@example.com", Role::Vendor).await;
        provision_shop(&db, vendor.id, "Placeholder", None).await.unwrap();

        let found = list_shops(&db, &near(0.001, 0.001, 50.0)).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn lone_coordinate_is_rejected() {
        let db = fixtures::db().await;
        let (vendor, _) = fixtures::vendor_with_shop(&db, "v@example.com").await;

        let err = update_my_shop(
            &db,
            &vendor,
            ShopUpdate {
                latitude: Some(10.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn partial_update_touches_given_fields() {
        let db = fixtures::db().await;
        let (vendor, shop) = fixtures::vendor_with_shop(&db, "v@example.com").await;

        let updated = update_my_shop(
            &db,
            &vendor,
            ShopUpdate {
                phone: Some("080-123".into()),
                latitude: Some(13.0),
                longitude: Some(77.6),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.id, shop.id);
        assert_eq!(updated.phone.as_deref(), Some("080-123"));
        assert_eq!(updated.address, shop.address);
        assert_eq!(updated.location.coordinates, [77.6, 13.0]);
        assert!(updated.location_set);
    }

    #[tokio::test]
    async fn admin_must_name_the_shop() {
        let db = fixtures::db().await;
        let (_, shop) = fixtures::vendor_with_shop(&db, "v@example.com").await;
        let admin = fixtures::identity(&fixtures::user(&db, "a@example.com", Role::Admin).await);

        assert!(matches!(
            get_my_shop(&db, &admin, None).await.unwrap_err(),
            ApiError::Validation(_)
        ));
        assert_eq!(get_my_shop(&db, &admin, Some(shop.id)).await.unwrap().id, shop.id);
    }

    #[tokio::test]
    async fn vendor_without_shop_gets_not_found() {
        let db = fixtures::db().await;
        let vendor = fixtures::identity(&fixtures::user(&db, "v@example.com", Role::Vendor).await);
        let customer = fixtures::identity(&fixtures::user(&db, "c@example.com", Role::Customer).await);

        assert!(matches!(
            get_my_shop(&db, &vendor, None).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            get_my_shop(&db, &customer, None).await.unwrap_err(),
            ApiError::Forbidden(_)
        ));
    }

    #[tokio::test]
    async fn vendors_open_one_shop_with_coordinates() {
        let db = fixtures::db().await;
        let vendor = fixtures::identity(&fixtures::user(&db, "v@example.com", Role::Vendor).await);

        let missing = create_shop(
            &db,
            &vendor,
            NewShop {
                name: "Gears".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(missing.public_message(), "Missing coordinates");

        let input = NewShop {
            name: "Gears".into(),
            latitude: Some(12.9),
            longitude: Some(77.5),
            ..Default::default()
        };
        let shop = create_shop(&db, &vendor, input.clone()).await.unwrap();
        assert_eq!(shop.vendor_id, vendor.id);

        let again = create_shop(&db, &vendor, input).await.unwrap_err();
        assert!(matches!(again, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn only_owner_or_admin_updates_and_deletes() {
        let db = fixtures::db().await;
        let (_, shop) = fixtures::vendor_with_shop(&db, "owner@example.com").await;
        let (other, _) = fixtures::vendor_with_shop(&db, "other@example.com").await;
        let admin = fixtures::identity(&fixtures::user(&db, "a@example.com", Role::Admin).await);

        let err = update_shop(&db, &other, shop.id, ShopUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert!(matches!(
            delete_shop(&db, &other, shop.id).await.unwrap_err(),
            ApiError::Forbidden(_)
        ));

        delete_shop(&db, &admin, shop.id).await.unwrap();
        assert!(matches!(
            get_shop(&db, shop.id).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }
}
