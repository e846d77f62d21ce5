mod common;

use axum::http::{Method, StatusCode};
use common::{create_product, order_payload, setup, PNG_BYTES};
use organic_farm::models::product;
use sea_orm::{ConnectionTrait, EntityTrait};

#[tokio::test]
async fn test_public_list_hides_sold_out_products() {
    let app = setup().await;
    let (farmer, _, _) = app.farmer("grower@test.com").await;
    create_product(app.db(), farmer.id, "Carrots", 10.0).await;
    create_product(app.db(), farmer.id, "Beetroot", 0.0).await;
    create_product(app.db(), farmer.id, "Apples", 3.0).await;

    let res = app.get("/api/v1/products/public", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["total"], 2);
    assert_eq!(res.body["page"], 1);
    assert_eq!(res.body["page_size"], 20);
    assert_eq!(res.body["total_pages"], 1);
    let names: Vec<&str> = res.body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Apples", "Carrots"]);
}

#[tokio::test]
async fn test_public_list_pagination() {
    let app = setup().await;
    let (farmer, _, _) = app.farmer("grower@test.com").await;
    for i in 0..5 {
        create_product(app.db(), farmer.id, &format!("Product {}", i), 1.0).await;
    }

    let res = app.get("/api/v1/products/public?page=3&page_size=2", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["total"], 5);
    assert_eq!(res.body["total_pages"], 3);
    assert_eq!(res.body["items"].as_array().unwrap().len(), 1);

    let res = app.get("/api/v1/products/public?page_size=0", None).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = app.get("/api/v1/products/public?page_size=101", None).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let res = app
        .get("/api/v1/products/public?page=18446744073709551615&page_size=100", None)
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["detail"], "page is out of range");
}

#[tokio::test]
async fn test_list_requires_auth_and_scopes_farmers() {
    let app = setup().await;
    let (_, admin_token) = app.admin().await;
    let (mine, _, token) = app.farmer("mine@test.com").await;
    let (theirs, _, _) = app.farmer("theirs@test.com").await;
    create_product(app.db(), mine.id, "Kale", 5.0).await;
    create_product(app.db(), theirs.id, "Leeks", 5.0).await;

    let res = app.get("/api/v1/products/", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.get("/api/v1/products/", Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["total"], 1);
    assert_eq!(res.body["items"][0]["name"], "Kale");

    // A farmer cannot widen the scope with farmer_id
    let res = app
        .get(&format!("/api/v1/products?farmer_id={}", theirs.id), Some(&token))
        .await;
    assert_eq!(res.body["total"], 1);
    assert_eq!(res.body["items"][0]["name"], "Kale");

    let res = app.get("/api/v1/products/", Some(&admin_token)).await;
    assert_eq!(res.body["total"], 2);
    let res = app
        .get(&format!("/api/v1/products/?farmer_id={}", theirs.id), Some(&admin_token))
        .await;
    assert_eq!(res.body["total"], 1);
    assert_eq!(res.body["items"][0]["name"], "Leeks");
}

#[tokio::test]
async fn test_get_product() {
    let app = setup().await;
    let (farmer, _, _) = app.farmer("grower@test.com").await;
    let p = create_product(app.db(), farmer.id, "Radish", 7.0).await;

    let res = app.get(&format!("/api/v1/products/{}", p.id), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Radish");
    assert_eq!(res.body["stock_qty"], 7.0);

    let res = app.get("/api/v1/products/9999", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["detail"], "Product not found");
}

#[tokio::test]
async fn test_farmer_creates_and_updates_own_product() {
    let app = setup().await;
    let (farmer, _, token) = app.farmer("grower@test.com").await;
    let (other, _, _) = app.farmer("other@test.com").await;

    // farmer_id pointing elsewhere is ignored for farmers
    let res = app
        .multipart(
            Method::POST,
            "/api/v1/products/upsert",
            Some(&token),
            &[
                ("name", "Organic Tomatoes"),
                ("price", "3.5"),
                ("stock_qty", "40"),
                ("unit", "kg"),
                ("farmer_id", &other.id.to_string()),
            ],
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "success");
    let id = res.body["product_id"].as_i64().unwrap() as i32;

    let created = product::Entity::find_by_id(id).one(app.db()).await.unwrap().unwrap();
    assert_eq!(created.farmer_id, farmer.id);
    assert!(created.is_organic);
    assert_eq!(created.price, 3.5);

    let res = app
        .multipart(
            Method::POST,
            "/api/v1/products/",
            Some(&token),
            &[
                ("id", &id.to_string()),
                ("name", "Cherry Tomatoes"),
                ("price", "4"),
                ("stock_qty", "12.5"),
                ("unit", "box"),
                ("is_organic", "false"),
            ],
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let updated = product::Entity::find_by_id(id).one(app.db()).await.unwrap().unwrap();
    assert_eq!(updated.name, "Cherry Tomatoes");
    assert_eq!(updated.stock_qty, 12.5);
    assert_eq!(updated.unit, "box");
    assert!(!updated.is_organic);
}

#[tokio::test]
async fn test_upsert_rules() {
    let app = setup().await;
    let (_, admin_token) = app.admin().await;
    let (farmer, _, token) = app.farmer("grower@test.com").await;
    let (other, _, _) = app.farmer("other@test.com").await;
    let foreign = create_product(app.db(), other.id, "Garlic", 5.0).await;

    // Someone else's product
    let res = app
        .multipart(
            Method::POST,
            "/api/v1/products/upsert",
            Some(&token),
            &[
                ("id", &foreign.id.to_string()),
                ("name", "Mine now"),
                ("price", "1"),
                ("stock_qty", "1"),
                ("unit", "kg"),
            ],
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    // Missing product
    let res = app
        .multipart(
            Method::POST,
            "/api/v1/products/upsert",
            Some(&token),
            &[("id", "9999"), ("name", "Ghost"), ("price", "1"), ("stock_qty", "1"), ("unit", "kg")],
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    // Field validation
    for fields in [
        [("name", "Beans"), ("price", "-1"), ("stock_qty", "1"), ("unit", "kg")],
        [("name", "Beans"), ("price", "1"), ("stock_qty", "-3"), ("unit", "kg")],
        [("name", "Beans"), ("price", "abc"), ("stock_qty", "1"), ("unit", "kg")],
        [("name", "Beans"), ("price", "1"), ("stock_qty", "1"), ("unit", "a-very-long-unit-name-indeed")],
    ] {
        let res = app
            .multipart(Method::POST, "/api/v1/products/upsert", Some(&token), &fields, None)
            .await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY, "{:?}", fields);
    }

    // Admins must name an existing farmer
    let res = app
        .multipart(
            Method::POST,
            "/api/v1/products/upsert",
            Some(&admin_token),
            &[("name", "Beans"), ("price", "1"), ("stock_qty", "1"), ("unit", "kg")],
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = app
        .multipart(
            Method::POST,
            "/api/v1/products/upsert",
            Some(&admin_token),
            &[("name", "Beans"), ("price", "1"), ("stock_qty", "1"), ("unit", "kg"), ("farmer_id", "9999")],
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = app
        .multipart(
            Method::POST,
            "/api/v1/products/upsert",
            Some(&admin_token),
            &[
                ("name", "Beans"),
                ("price", "1"),
                ("stock_qty", "1"),
                ("unit", "kg"),
                ("farmer_id", &farmer.id.to_string()),
            ],
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_stock() {
    let app = setup().await;
    let (farmer, _, token) = app.farmer("grower@test.com").await;
    let (_, _, other_token) = app.farmer("other@test.com").await;
    let p = create_product(app.db(), farmer.id, "Peas", 10.0).await;

    let res = app
        .empty(Method::PATCH, &format!("/api/v1/products/{}/stock?qty=25", p.id), Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "success");
    assert_eq!(res.body["new_qty"], 25.0);

    let res = app
        .empty(Method::PATCH, &format!("/api/v1/products/{}/stock?qty=-5", p.id), Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["detail"], "Stock quantity cannot be negative");

    let res = app
        .empty(Method::PATCH, "/api/v1/products/9999/stock?qty=5", Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .empty(Method::PATCH, &format!("/api/v1/products/{}/stock?qty=1", p.id), Some(&other_token))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let stored = product::Entity::find_by_id(p.id).one(app.db()).await.unwrap().unwrap();
    assert_eq!(stored.stock_qty, 25.0);
}

#[tokio::test]
async fn test_image_upload_is_sniffed_and_stored() {
    let app = setup().await;
    let (farmer, _, token) = app.farmer("grower@test.com").await;
    let p = create_product(app.db(), farmer.id, "Pumpkin", 2.0).await;
    let uri = format!("/api/v1/products/{}/image", p.id);

    let res = app
        .multipart(Method::POST, &uri, Some(&token), &[], Some(("pumpkin.png", PNG_BYTES)))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let url = res.body["image_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with(".png"));

    let name = url.trim_start_matches("/uploads/");
    assert!(app.uploads.path().join(name).exists());

    let stored = product::Entity::find_by_id(p.id).one(app.db()).await.unwrap().unwrap();
    assert_eq!(stored.image_url.as_deref(), Some(url.as_str()));

    // The stored file is served back
    let served = app.get(&url, None).await;
    assert_eq!(served.status, StatusCode::OK);

    // A PDF renamed to .png is still rejected
    let res = app
        .multipart(Method::POST, &uri, Some(&token), &[], Some(("fake.png", b"%PDF-1.4 not an image")))
        .await;
    assert_eq!(res.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let res = app.multipart(Method::POST, &uri, Some(&token), &[], None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_insert_leaves_no_stored_image() {
    let app = setup().await;
    let (_, _, token) = app.farmer("grower@test.com").await;
    app.db()
        .execute_unprepared(
            "CREATE TRIGGER reject_products BEFORE INSERT ON products \
             BEGIN SELECT RAISE(ABORT, 'products are read-only'); END",
        )
        .await
        .unwrap();

    let res = app
        .multipart(
            Method::POST,
            "/api/v1/products/upsert",
            Some(&token),
            &[("name", "Squash"), ("price", "2"), ("stock_qty", "8"), ("unit", "kg")],
            Some(("squash.png", PNG_BYTES)),
        )
        .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(std::fs::read_dir(app.uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_oversized_image_is_rejected() {
    let app = common::setup_with(|config| config.max_image_bytes = 16).await;
    let (farmer, _, token) = app.farmer("grower@test.com").await;
    let p = create_product(app.db(), farmer.id, "Melon", 2.0).await;

    let mut big = PNG_BYTES.to_vec();
    big.extend_from_slice(&[0u8; 64]);
    let res = app
        .multipart(
            Method::POST,
            &format!("/api/v1/products/{}/image", p.id),
            Some(&token),
            &[],
            Some(("melon.png", &big)),
        )
        .await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_delete_product() {
    let app = setup().await;
    let (farmer, _, token) = app.farmer("grower@test.com").await;
    let unsold = create_product(app.db(), farmer.id, "Chard", 5.0).await;
    let sold = create_product(app.db(), farmer.id, "Onions", 5.0).await;

    let res = app
        .json(Method::POST, "/api/v1/orders/", None, order_payload(&[(sold.id, 1)]))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .empty(Method::DELETE, &format!("/api/v1/products/{}", sold.id), Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .empty(Method::DELETE, &format!("/api/v1/products/{}", unsold.id), Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(product::Entity::find_by_id(unsold.id)
        .one(app.db())
        .await
        .unwrap()
        .is_none());
}
