use chrono::Utc;
use sea_orm::*;

use crate::domain::validation::validate_email;
use crate::domain::{DomainError, UserRole};
use crate::infrastructure::auth::hash_password;
use crate::infrastructure::config::Config;
use crate::models::farmer::{self, Entity as Farmer};
use crate::models::product::{self, Entity as Product};
use crate::models::user::{self, Entity as User};

pub const DEMO_ADMIN_EMAIL: &str = "admin@kaayaka.in";
pub const DEMO_ADMIN_PASSWORD: &str = "AdminPass123!";

/// (name, price, unit, stock)
const DEMO_PRODUCTS: [(&str, f64, &str, f64); 3] = [
    ("Organic Alphonso Mango", 15.0, "kg", 50.0),
    ("Farm Fresh Spinach", 2.5, "bunch", 30.0),
    ("Heirloom Carrots", 3.0, "kg", 100.0),
];

/// Bootstrap admin and demo catalogue. Safe to run on every start.
pub async fn seed(db: &DatabaseConnection, config: &Config) -> Result<(), DomainError> {
    let credentials = match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => Some((email.clone(), password.clone())),
        _ if config.seed_demo => {
            tracing::warn!("SEED_DEMO without ADMIN_EMAIL/ADMIN_PASSWORD, using demo admin credentials");
            Some((DEMO_ADMIN_EMAIL.to_string(), DEMO_ADMIN_PASSWORD.to_string()))
        }
        _ => None,
    };

    let Some((email, password)) = credentials else {
        return Ok(());
    };
    let farmer_id = ensure_admin(db, &email, &password).await?;

    if config.seed_demo {
        let created = seed_demo_products(db, farmer_id).await?;
        if created > 0 {
            tracing::info!("Seeded {} demo products", created);
        }
    }
    Ok(())
}

/// Create the admin account and its "Community Admin" profile when missing.
/// Returns the farmer profile demo products attach to.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<i32, DomainError> {
    let email = validate_email(email)?;

    if let Some(existing) = User::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(db)
        .await?
    {
        tracing::info!("Admin {} already exists, skipping", email);
        if let Some(farmer_id) = existing.farmer_id {
            return Ok(farmer_id);
        }
        let first = Farmer::find()
            .order_by_asc(farmer::Column::Id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::Internal("No farmer profile to attach demo data to".to_string()))?;
        return Ok(first.id);
    }

    let hashed_password = hash_password(password)?;
    let txn = db.begin().await?;

    let farmer = farmer::ActiveModel {
        name: Set("Community Admin".to_string()),
        location: Set("Main Office".to_string()),
        bio: Set(Some("System administrator and community manager.".to_string())),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    user::ActiveModel {
        email: Set(email.clone()),
        hashed_password: Set(hashed_password),
        role: Set(UserRole::Admin.as_str().to_string()),
        farmer_id: Set(Some(farmer.id)),
        created_at: Set(Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!("Created admin {} with farmer profile {}", email, farmer.id);
    Ok(farmer.id)
}

/// Only seeds an empty catalogue; returns how many products were inserted
pub async fn seed_demo_products(db: &DatabaseConnection, farmer_id: i32) -> Result<usize, DomainError> {
    if Product::find().count(db).await? > 0 {
        tracing::info!("Products already exist, skipping demo seed");
        return Ok(0);
    }

    let products: Vec<product::ActiveModel> = DEMO_PRODUCTS
        .iter()
        .map(|(name, price, unit, stock)| product::ActiveModel {
            name: Set(name.to_string()),
            price: Set(*price),
            unit: Set(unit.to_string()),
            stock_qty: Set(*stock),
            is_organic: Set(true),
            farmer_id: Set(farmer_id),
            ..Default::default()
        })
        .collect();
    let count = products.len();
    Product::insert_many(products).exec(db).await?;
    Ok(count)
}
