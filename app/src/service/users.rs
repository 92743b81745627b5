use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    auth::{Identity, Passwords},
    common::{ApiError, ApiResult},
    config::AuthConfig,
    entity::{
        shop,
        user::{self, Role, normalize_email},
    },
    service::{conflict_on_unique, non_blank, shops},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&user::Model> for UserView {
    fn from(user: &user::Model) -> Self {
        UserView {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginInput {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileInput {
    pub name: Option<String>,
    #[validate(email(message = "email is not valid"))]
    pub email: Option<String>,
    #[validate(length(min = 4, message = "Password too short"))]
    pub password: Option<String>,
    pub current_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VendorInput {
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub vendor_name: String,
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub shop_name: String,
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub contact_number: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordInput {
    pub id: Option<i32>,
    pub email: Option<String>,
    #[validate(length(min = 4, message = "Password too short"))]
    pub password: String,
}

/// Self-registration always yields a customer. Only an administrator may ask for
/// another role, and an unknown role quietly falls back to customer.
pub fn resolve_role(actor: Option<&Identity>, requested: Option<&str>) -> Role {
    match actor {
        Some(actor) if actor.is_admin() => requested.and_then(Role::parse).unwrap_or(Role::Customer),
        _ => Role::Customer,
    }
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> ApiResult<Option<user::Model>> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> ApiResult<user::Model> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))
}

pub async fn register(
    db: &DatabaseConnection,
    passwords: &Passwords,
    actor: Option<&Identity>,
    input: RegisterInput,
) -> ApiResult<user::Model> {
    let role = resolve_role(actor, input.role.as_deref());
    let email = normalize_email(&input.email);

    if find_by_email(db, &email).await?.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let now = Utc::now();
    let user = user::ActiveModel {
        name: Set(input.name.trim().to_string()),
        email: Set(email),
        password_hash: Set(passwords.hash(&input.password).await?),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| conflict_on_unique(e, "User already exists"))?;

    tracing::info!(user = user.id, role = role.as_str(), "user registered");

    Ok(user)
}

pub async fn login(
    db: &DatabaseConnection,
    passwords: &Passwords,
    input: LoginInput,
) -> ApiResult<user::Model> {
    let invalid = || ApiError::validation("Invalid credentials");

    let user = find_by_email(db, &input.email).await?.ok_or_else(invalid)?;

    if !passwords.verify(&input.password, &user.password_hash).await? {
        return Err(invalid());
    }

    Ok(user)
}

/// Changing email or password needs the current password; a name change does not.
pub async fn update_profile(
    db: &DatabaseConnection,
    passwords: &Passwords,
    actor: &Identity,
    input: ProfileInput,
) -> ApiResult<user::Model> {
    let current = find_by_id(db, actor.id).await?;

    let email = input
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty() && *e != current.email);
    let password = input.password.filter(|p| !p.is_empty());

    if email.is_some() || password.is_some() {
        let Some(current_password) = input.current_password.as_deref().filter(|p| !p.is_empty())
        else {
            return Err(ApiError::validation("Current password is required"));
        };
        if !passwords.verify(current_password, &current.password_hash).await? {
            return Err(ApiError::validation("Current password is incorrect"));
        }
    }

    if let Some(email) = &email {
        if find_by_email(db, email).await?.is_some() {
            return Err(ApiError::Conflict("Email already in use".to_string()));
        }
    }

    let password_hash = match password {
        Some(password) => Some(passwords.hash(&password).await?),
        None => None,
    };

    let mut active = current.into_active_model();
    if let Some(name) = non_blank(input.name) {
        active.name = Set(name);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(hash) = password_hash {
        active.password_hash = Set(hash);
    }
    active.updated_at = Set(Utc::now());

    let user = active
        .update(db)
        .await
        .map_err(|e| conflict_on_unique(e, "Email already in use"))?;

    Ok(user)
}

pub async fn list_users(db: &DatabaseConnection) -> ApiResult<Vec<UserView>> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;

    Ok(users.iter().map(UserView::from).collect())
}

/// Creates a vendor account together with its shop. The shop starts on the
/// unset location, so the vendor has to place it before listing parts.
pub async fn create_vendor(
    db: &DatabaseConnection,
    passwords: &Passwords,
    input: VendorInput,
) -> ApiResult<(user::Model, shop::Model)> {
    if input.password != input.confirm_password {
        return Err(ApiError::validation("Passwords do not match"));
    }

    let email = normalize_email(&input.email);
    if find_by_email(db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already in use".to_string()));
    }

    let password_hash = passwords.hash(&input.password).await?;
    let now = Utc::now();

    let txn = db.begin().await?;

    let vendor = user::ActiveModel {
        name: Set(input.vendor_name.trim().to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(Role::Vendor),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| conflict_on_unique(e, "Email already in use"))?;

    let shop = shops::provision_shop(
        &txn,
        vendor.id,
        input.shop_name.trim(),
        Some(input.contact_number.trim().to_string()),
    )
    .await?;

    txn.commit().await?;

    tracing::info!(vendor = vendor.id, shop = shop.id, "vendor provisioned");

    Ok((vendor, shop))
}

pub async fn reset_password(
    db: &DatabaseConnection,
    passwords: &Passwords,
    input: ResetPasswordInput,
) -> ApiResult<user::Model> {
    let user = match (input.id, non_blank(input.email)) {
        (Some(id), _) => find_by_id(db, id).await?,
        (None, Some(email)) => find_by_email(db, &email)
            .await?
            .ok_or_else(|| ApiError::not_found("User"))?,
        (None, None) => return Err(ApiError::validation("User id or email is required")),
    };

    let mut active = user.into_active_model();
    active.password_hash = Set(passwords.hash(&input.password).await?);
    active.updated_at = Set(Utc::now());

    let user = active.update(db).await?;

    tracing::info!(user = user.id, "password reset by administrator");

    Ok(user)
}

/// Makes sure the configured administrator exists and still holds the admin role.
/// An existing account keeps its password.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    passwords: &Passwords,
    config: &AuthConfig,
) -> ApiResult<()> {
    let Some(password) = config.admin_password() else {
        tracing::info!("no administrator password configured, skipping admin seeding");
        return Ok(());
    };

    match find_by_email(db, config.admin_email()).await? {
        None => {
            let now = Utc::now();
            let admin = user::ActiveModel {
                name: Set(config.admin_name().to_string()),
                email: Set(normalize_email(config.admin_email())),
                password_hash: Set(passwords.hash(password).await?),
                role: Set(Role::Admin),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
            tracing::info!(user = admin.id, "seeded administrator account");
        }
        Some(admin) if admin.role != Role::Admin => {
            let id = admin.id;
            let mut active = admin.into_active_model();
            active.role = Set(Role::Admin);
            active.updated_at = Set(Utc::now());
            active.update(db).await?;
            tracing::warn!(user = id, "administrator role restored");
        }
        Some(_) => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fixtures;

    fn register_input(email: &str, role: Option<&str>) -> RegisterInput {
        RegisterInput {
            name: "Ravi".to_string(),
            email: email.to_string(),
            password: "hunter22".to_string(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn request_bodies_are_closed() {
        let with_role = serde_json::json!({
            "name": "Ravi", "email": "r@example.com", "password": "pw", "role": "vendor"
        });
        let input: RegisterInput = serde_json::from_value(with_role).unwrap();
        assert_eq!(input.role.as_deref(), Some("vendor"));

        let escalated = serde_json::json!({
            "name": "Ravi", "email": "r@example.com", "password": "pw", "isAdmin": true
        });
        assert!(serde_json::from_value::<RegisterInput>(escalated).is_err());

        let profile = serde_json::json!({"name": "Ravi", "role": "admin"});
        assert!(serde_json::from_value::<ProfileInput>(profile).is_err());

        let reset = serde_json::json!({"id": 3, "password": "abcd", "role": "admin"});
        assert!(serde_json::from_value::<ResetPasswordInput>(reset).is_err());
    }

    #[test]
    fn self_registration_never_escalates() {
        assert_eq!(resolve_role(None, Some("admin")), Role::Customer);
        assert_eq!(resolve_role(None, Some("vendor")), Role::Customer);
    }

    #[tokio::test]
    async fn anonymous_register_with_admin_role_stores_customer() {
        let db = fixtures::db().await;
        let user = register(&db, &fixtures::passwords(), None, register_input("A@Example.com ", Some("admin")))
            .await
            .unwrap();

        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.email, "a@example.com");
    }

    #[tokio::test]
    async fn admin_can_register_other_roles() {
        let db = fixtures::db().await;
        let admin = fixtures::identity(&fixtures::user(&db, "root@example.com", Role::Admin).await);
        let passwords = fixtures::passwords();

        let vendor = register(&db, &passwords, Some(&admin), register_input("v@example.com", Some("vendor")))
            .await
            .unwrap();
        assert_eq!(vendor.role, Role::Vendor);

        let fallback = register(&db, &passwords, Some(&admin), register_input("x@example.com", Some("owner")))
            .await
            .unwrap();
        assert_eq!(fallback.role, Role::Customer);

        let customer = fixtures::identity(&fixtures::user(&db, "c@example.com", Role::Customer).await);
        let forced = register(&db, &passwords, Some(&customer), register_input("y@example.com", Some("admin")))
            .await
            .unwrap();
        assert_eq!(forced.role, Role::Customer);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_case_insensitively() {
        let db = fixtures::db().await;
        let passwords = fixtures::passwords();
        register(&db, &passwords, None, register_input("dup@example.com", None))
            .await
            .unwrap();

        let err = register(&db, &passwords, None, register_input("DUP@example.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_checks_password() {
        let db = fixtures::db().await;
        let passwords = fixtures::passwords();
        register(&db, &passwords, None, register_input("l@example.com", None))
            .await
            .unwrap();

        let ok = login(
            &db,
            &passwords,
            LoginInput {
                email: "L@example.com".into(),
                password: "hunter22".into(),
            },
        )
        .await;
        assert!(ok.is_ok());

        let err = login(
            &db,
            &passwords,
            LoginInput {
                email: "l@example.com".into(),
                password: "nope".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.public_message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn email_change_requires_current_password() {
        let db = fixtures::db().await;
        let passwords = fixtures::passwords();
        let user = fixtures::user(&db, "p@example.com", Role::Customer).await;
        let actor = fixtures::identity(&user);

        let renamed = update_profile(
            &db,
            &passwords,
            &actor,
            ProfileInput {
                name: Some("New Name".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "New Name");

        let err = update_profile(
            &db,
            &passwords,
            &actor,
            ProfileInput {
                email: Some("q@example.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = update_profile(
            &db,
            &passwords,
            &actor,
            ProfileInput {
                email: Some("q@example.com".into()),
                current_password: Some("wrong".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.public_message(), "Current password is incorrect");

        let moved = update_profile(
            &db,
            &passwords,
            &actor,
            ProfileInput {
                email: Some("Q@example.com".into()),
                current_password: Some("secret".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.email, "q@example.com");
    }

    #[tokio::test]
    async fn vendor_provisioning_creates_unplaced_shop() {
        let db = fixtures::db().await;
        let (vendor, shop) = create_vendor(
            &db,
            &fixtures::passwords(),
            VendorInput {
                vendor_name: "Spares Co".into(),
                shop_name: "Spares Co Store".into(),
                contact_number: "9876543210".into(),
                email: "spares@example.com".into(),
                password: "pass1234".into(),
                confirm_password: "pass1234".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(vendor.role, Role::Vendor);
        assert_eq!(shop.vendor_id, vendor.id);
        assert!(shop.location().is_unset());
        assert_eq!(shop.phone.as_deref(), Some("9876543210"));
    }

    #[tokio::test]
    async fn vendor_provisioning_checks_password_confirmation() {
        let db = fixtures::db().await;
        let err = create_vendor(
            &db,
            &fixtures::passwords(),
            VendorInput {
                vendor_name: "Spares Co".into(),
                shop_name: "Spares Co Store".into(),
                contact_number: "9876543210".into(),
                email: "spares@example.com".into(),
                password: "pass1234".into(),
                confirm_password: "pass9999".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.public_message(), "Passwords do not match");
        assert!(list_users(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_resets_password_by_email() {
        let db = fixtures::db().await;
        let passwords = fixtures::passwords();
        fixtures::user(&db, "r@example.com", Role::Customer).await;

        reset_password(
            &db,
            &passwords,
            ResetPasswordInput {
                id: None,
                email: Some(" R@example.com ".into()),
                password: "fresh".into(),
            },
        )
        .await
        .unwrap();

        let user = login(
            &db,
            &passwords,
            LoginInput {
                email: "r@example.com".into(),
                password: "fresh".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(user.email, "r@example.com");

        let missing = reset_password(
            &db,
            &passwords,
            ResetPasswordInput {
                id: Some(999),
                email: None,
                password: "fresh".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(missing, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn admin_seeding_creates_then_repairs_role() {
        let db = fixtures::db().await;
        let passwords = fixtures::passwords();
        let config: AuthConfig = serde_json::from_value(serde_json::json!({
            "admin_email": "boss@example.com",
            "admin_password": "admin123"
        }))
        .unwrap();

        ensure_admin(&db, &passwords, &config).await.unwrap();
        let admin = find_by_email(&db, "boss@example.com").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);

        let mut active = admin.into_active_model();
        active.role = Set(Role::Customer);
        active.update(&db).await.unwrap();

        ensure_admin(&db, &passwords, &config).await.unwrap();
        let admin = find_by_email(&db, "boss@example.com").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(list_users(&db).await.unwrap().len(), 1);
    }
}
