use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    // Every pooled connection to `:memory:` would open its own empty database
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    } else {
        options.max_connections(10);
    }

    let db = Database::connect(options).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    db.execute(Statement::from_string(
        backend,
        "PRAGMA foreign_keys = ON".to_owned(),
    ))
    .await?;

    // Create farmers table
    db.execute(Statement::from_string(
        backend,
        r#"
        CREATE TABLE IF NOT EXISTS farmers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            bio TEXT,
            location TEXT NOT NULL DEFAULT '',
            profile_pic TEXT
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create users table
    db.execute(Statement::from_string(
        backend,
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            hashed_password TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'farmer' CHECK (role IN ('admin', 'farmer')),
            farmer_id INTEGER,
            created_at TEXT NOT NULL,
            FOREIGN KEY (farmer_id) REFERENCES farmers(id) ON DELETE SET NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create products table
    db.execute(Statement::from_string(
        backend,
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            price REAL NOT NULL CHECK (price >= 0),
            unit TEXT NOT NULL,
            stock_qty REAL NOT NULL DEFAULT 0 CHECK (stock_qty >= 0),
            is_organic BOOLEAN NOT NULL DEFAULT 1,
            image_url TEXT,
            farmer_id INTEGER NOT NULL,
            FOREIGN KEY (farmer_id) REFERENCES farmers(id) ON DELETE CASCADE
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create orders table
    db.execute(Statement::from_string(
        backend,
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_name TEXT NOT NULL,
            customer_email TEXT NOT NULL,
            address TEXT NOT NULL,
            total_price REAL NOT NULL CHECK (total_price >= 0),
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'confirmed', 'packed', 'delivered', 'cancelled')),
            created_at TEXT NOT NULL,
            delivery_date TEXT
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create order_items table
    db.execute(Statement::from_string(
        backend,
        r#"
        CREATE TABLE IF NOT EXISTS order_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL,
            product_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity > 0),
            price_at_time REAL NOT NULL CHECK (price_at_time >= 0),
            is_harvested BOOLEAN NOT NULL DEFAULT 0,
            FOREIGN KEY (order_id) REFERENCES orders(id) ON DELETE CASCADE,
            FOREIGN KEY (product_id) REFERENCES products(id) ON DELETE RESTRICT
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Migration: harvest tracking arrived after the first deployments.
    // If the column exists this fails, so the error is ignored (simple migration strategy)
    let _ = db
        .execute(Statement::from_string(
            backend,
            "ALTER TABLE order_items ADD COLUMN is_harvested BOOLEAN NOT NULL DEFAULT 0".to_owned(),
        ))
        .await;

    for index in [
        "CREATE INDEX IF NOT EXISTS idx_products_farmer ON products(farmer_id)",
        "CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id)",
        "CREATE INDEX IF NOT EXISTS idx_order_items_product ON order_items(product_id)",
        "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status)",
    ] {
        db.execute(Statement::from_string(backend, index.to_owned()))
            .await?;
    }

    tracing::debug!("Database schema is up to date");
    Ok(())
}
