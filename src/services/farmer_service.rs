//! Farmer Service - farmer profiles and their login accounts

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Serialize;

use crate::domain::validation::{require_len, validate_email, validate_password};
use crate::domain::{DomainError, ImageUpload, UserRole};
use crate::infrastructure::auth::hash_password;
use crate::models::farmer::{self, Entity as Farmer};
use crate::models::order_item::{self, Entity as OrderItem};
use crate::models::product::{self, Entity as Product};
use crate::models::user::{self, Entity as User};
use crate::services::auth_service::ensure_email_free;
use crate::services::product_service::farmer_product_ids;
use crate::services::upload_service::Uploads;

/// Farmer profile with its catalogue
#[derive(Debug, Serialize)]
pub struct FarmerWithProducts {
    pub id: i32,
    pub name: String,
    pub bio: Option<String>,
    pub location: String,
    pub profile_pic: Option<String>,
    pub products: Vec<product::Model>,
}

/// Admin form for onboarding a farmer
#[derive(Debug, Default)]
pub struct NewFarmer {
    pub name: String,
    pub email: String,
    pub password: String,
    pub location: String,
    pub bio: String,
    pub picture: Option<ImageUpload>,
}

/// Partial profile update; `None` leaves a field untouched
#[derive(Debug, Default)]
pub struct FarmerUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub picture: Option<ImageUpload>,
}

#[derive(Debug, Serialize)]
pub struct CreatedFarmer {
    pub farmer_id: i32,
    pub user_id: i32,
}

pub async fn list_farmers(db: &DatabaseConnection) -> Result<Vec<farmer::Model>, DomainError> {
    Ok(Farmer::find()
        .order_by_asc(farmer::Column::Name)
        .all(db)
        .await?)
}

pub async fn find_farmer<C: ConnectionTrait>(db: &C, id: i32) -> Result<farmer::Model, DomainError> {
    Farmer::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Farmer"))
}

pub async fn get_farmer(db: &DatabaseConnection, id: i32) -> Result<FarmerWithProducts, DomainError> {
    let farmer = find_farmer(db, id).await?;
    let products = farmer
        .find_related(Product)
        .order_by_asc(product::Column::Name)
        .all(db)
        .await?;

    Ok(FarmerWithProducts {
        id: farmer.id,
        name: farmer.name,
        bio: farmer.bio,
        location: farmer.location,
        profile_pic: farmer.profile_pic,
        products,
    })
}

pub async fn register_farmer(
    db: &DatabaseConnection,
    uploads: Uploads<'_>,
    form: NewFarmer,
) -> Result<CreatedFarmer, DomainError> {
    let name = require_len("name", &form.name, 2, 100)?;
    let location = require_len("location", &form.location, 5, 200)?;
    let bio = require_len("bio", &form.bio, 10, 1000)?;
    let email = validate_email(&form.email)?;
    validate_password(&form.password)?;
    ensure_email_free(db, &email).await?;

    let hashed_password = hash_password(&form.password)?;
    let profile_pic = match &form.picture {
        Some(picture) => Some(uploads.store(picture).await?),
        None => None,
    };

    let created = insert_with_login(
        db,
        farmer::ActiveModel {
            name: Set(name),
            bio: Set(Some(bio)),
            location: Set(location),
            profile_pic: Set(profile_pic.clone()),
            ..Default::default()
        },
        email,
        hashed_password,
    )
    .await;
    let (farmer, user) = uploads
        .discard_on_error(profile_pic.as_deref(), created)
        .await?;

    tracing::info!("Onboarded farmer {} ({}) with login {}", farmer.id, farmer.name, user.email);
    Ok(CreatedFarmer {
        farmer_id: farmer.id,
        user_id: user.id,
    })
}

/// Profile plus its farmer-role login, committed together
async fn insert_with_login(
    db: &DatabaseConnection,
    profile: farmer::ActiveModel,
    email: String,
    hashed_password: String,
) -> Result<(farmer::Model, user::Model), DomainError> {
    let txn = db.begin().await?;

    let farmer = profile.insert(&txn).await?;
    let user = user::ActiveModel {
        email: Set(email),
        hashed_password: Set(hashed_password),
        role: Set(UserRole::Farmer.as_str().to_string()),
        farmer_id: Set(Some(farmer.id)),
        created_at: Set(Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok((farmer, user))
}

/// Admins may edit any profile, farmers only the one they are linked to
pub fn ensure_can_manage(actor: &user::Model, farmer_id: i32) -> Result<(), DomainError> {
    if actor.is_admin() || actor.farmer_id == Some(farmer_id) {
        Ok(())
    } else {
        Err(DomainError::Forbidden(
            "Not authorized to manage this farmer".to_string(),
        ))
    }
}

pub async fn update_farmer(
    db: &DatabaseConnection,
    uploads: Uploads<'_>,
    actor: &user::Model,
    id: i32,
    changes: FarmerUpdate,
) -> Result<farmer::Model, DomainError> {
    ensure_can_manage(actor, id)?;
    let existing = find_farmer(db, id).await?;
    let old_picture = existing.profile_pic.clone();

    let mut active: farmer::ActiveModel = existing.into();
    if let Some(name) = changes.name.as_deref() {
        active.name = Set(require_len("name", name, 2, 100)?);
    }
    if let Some(location) = changes.location.as_deref() {
        active.location = Set(require_len("location", location, 5, 200)?);
    }
    if let Some(bio) = changes.bio.as_deref() {
        active.bio = Set(Some(require_len("bio", bio, 10, 1000)?));
    }
    let new_picture = match &changes.picture {
        Some(picture) => Some(uploads.store(picture).await?),
        None => None,
    };
    if new_picture.is_some() {
        active.profile_pic = Set(new_picture.clone());
    }

    let updated = uploads
        .discard_on_error(new_picture.as_deref(), active.update(db).await)
        .await?;

    if let Some(old) = old_picture.filter(|old| updated.profile_pic.as_ref() != Some(old)) {
        uploads.discard(&old).await;
    }

    tracing::info!("Updated farmer {}", updated.id);
    Ok(updated)
}

/// Detach linked logins and drop the catalogue along with the profile
pub async fn delete_farmer(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let txn = db.begin().await?;
    find_farmer(&txn, id).await?;

    let ordered = OrderItem::find()
        .filter(order_item::Column::ProductId.in_subquery(farmer_product_ids(id)))
        .count(&txn)
        .await?;
    if ordered > 0 {
        return Err(DomainError::BadRequest(
            "Cannot delete a farmer whose products appear in orders".to_string(),
        ));
    }

    User::update_many()
        .col_expr(user::Column::FarmerId, Expr::value(Option::<i32>::None))
        .filter(user::Column::FarmerId.eq(id))
        .exec(&txn)
        .await?;
    let removed = Product::delete_many()
        .filter(product::Column::FarmerId.eq(id))
        .exec(&txn)
        .await?;
    Farmer::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!("Deleted farmer {} and {} products", id, removed.rows_affected);
    Ok(())
}
