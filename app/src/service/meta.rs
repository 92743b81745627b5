use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    auth::Identity,
    common::{ApiError, ApiResult},
    entity::{company_meta, model_meta},
    service::{conflict_on_unique, non_blank},
};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CompanyMetaInput {
    #[validate(length(min = 1, message = "company is required"))]
    pub company: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ModelMetaInput {
    #[validate(length(min = 1, message = "company and model are required"))]
    pub company: String,
    #[validate(length(min = 1, message = "company and model are required"))]
    pub model: String,
    pub image: Option<String>,
}

pub async fn list_companies(db: &DatabaseConnection) -> ApiResult<Vec<company_meta::Model>> {
    Ok(company_meta::Entity::find()
        .order_by_asc(company_meta::Column::Company)
        .all(db)
        .await?)
}

pub async fn list_models(
    db: &DatabaseConnection,
    company: &str,
) -> ApiResult<Vec<model_meta::Model>> {
    let company = company.trim();
    if company.is_empty() {
        return Err(ApiError::validation("company is required"));
    }

    Ok(model_meta::Entity::find()
        .filter(model_meta::Column::Company.eq(company))
        .order_by_asc(model_meta::Column::Model)
        .all(db)
        .await?)
}

/// Create-or-replace keyed by company name.
pub async fn upsert_company(
    db: &DatabaseConnection,
    actor: &Identity,
    input: CompanyMetaInput,
) -> ApiResult<company_meta::Model> {
    actor.require_vendor_or_admin()?;

    let company = input.company.trim().to_string();
    if company.is_empty() {
        return Err(ApiError::validation("company is required"));
    }

    let now = Utc::now();
    let existing = company_meta::Entity::find()
        .filter(company_meta::Column::Company.eq(company.as_str()))
        .one(db)
        .await?;

    let saved = match existing {
        Some(meta) => {
            let mut active = meta.into_active_model();
            active.image = Set(non_blank(input.image));
            active.updated_by = Set(Some(actor.id));
            active.updated_at = Set(now);
            active.update(db).await?
        }
        None => company_meta::ActiveModel {
            company: Set(company),
            image: Set(non_blank(input.image)),
            updated_by: Set(Some(actor.id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| conflict_on_unique(e, "Duplicate company"))?,
    };

    tracing::info!(company = %saved.company, user = actor.id, "company metadata saved");

    Ok(saved)
}

/// Create-or-replace keyed by (company, model).
pub async fn upsert_model(
    db: &DatabaseConnection,
    actor: &Identity,
    input: ModelMetaInput,
) -> ApiResult<model_meta::Model> {
    actor.require_vendor_or_admin()?;

    let company = input.company.trim().to_string();
    let model = input.model.trim().to_string();
    if company.is_empty() || model.is_empty() {
        return Err(ApiError::validation("company and model are required"));
    }

    let now = Utc::now();
    let existing = model_meta::Entity::find()
        .filter(model_meta::Column::Company.eq(company.as_str()))
        .filter(model_meta::Column::Model.eq(model.as_str()))
        .one(db)
        .await?;

    let saved = match existing {
        Some(meta) => {
            let mut active = meta.into_active_model();
            active.image = Set(non_blank(input.image));
            active.updated_by = Set(Some(actor.id));
            active.updated_at = Set(now);
            active.update(db).await?
        }
        None => model_meta::ActiveModel {
            company: Set(company),
            model: Set(model),
            image: Set(non_blank(input.image)),
            updated_by: Set(Some(actor.id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| conflict_on_unique(e, "Duplicate company/model combination"))?,
    };

    tracing::info!(
        company = %saved.company,
        model = %saved.model,
        user = actor.id,
        "model metadata saved"
    );

    Ok(saved)
}
