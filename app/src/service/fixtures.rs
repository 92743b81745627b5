use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::{
    auth::{Identity, Passwords},
    database,
    entity::{
        shop,
        user::{self, Role},
    },
    geo::GeoPoint,
};

pub async fn db() -> DatabaseConnection {
    database::in_memory().await.unwrap()
}

pub fn passwords() -> Passwords {
    Passwords::new(4)
}

pub async fn user(db: &DatabaseConnection, email: &str, role: Role) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        name: Set(email.split('@').next().unwrap_or(email).to_string()),
        email: Set(email.to_string()),
        password_hash: Set(passwords().hash("secret").await.unwrap()),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub fn identity(user: &user::Model) -> Identity {
    Identity::from(user)
}

pub async fn shop(db: &DatabaseConnection, vendor_id: i32, location: GeoPoint) -> shop::Model {
    let now = Utc::now();
    shop::ActiveModel {
        name: Set(format!("Shop of {vendor_id}")),
        address: Set(Some("MG Road".to_string())),
        phone: Set(None),
        website: Set(None),
        vendor_id: Set(vendor_id),
        longitude: Set(location.lng),
        latitude: Set(location.lat),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// A vendor with a located shop in Bangalore.
pub async fn vendor_with_shop(db: &DatabaseConnection, email: &str) -> (Identity, shop::Model) {
    let vendor = user(db, email, Role::Vendor).await;
    let shop = shop(db, vendor.id, GeoPoint::new(12.9716, 77.5946)).await;
    (identity(&vendor), shop)
}
