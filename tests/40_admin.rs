mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use storefront_api::auth::TokenService;
use storefront_api::database::models::Role;
use storefront_api::database::Store;

#[tokio::test]
async fn admin_routes_reject_missing_invalid_and_non_admin_tokens() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let (_, user_token) = server.user("u@x.com").await?;
    let forged = TokenService::new("some-other-secret", chrono::Duration::days(7)).issue(1, Role::Admin)?;

    for path in ["/admin/users", "/admin/orders", "/admin/stats"] {
        let res = server.client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);

        let res = server.client.get(server.url(path)).bearer_auth(&forged).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);

        let res = server.client.get(server.url(path)).bearer_auth(&user_token).send().await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{}", path);
    }
    Ok(())
}

#[tokio::test]
async fn non_admin_cannot_change_roles() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let (user_id, user_token) = server.user("u@x.com").await?;

    let res = server
        .client
        .patch(server.url(&format!("/admin/users/{}/role", user_id)))
        .bearer_auth(&user_token)
        .json(&json!({ "role": "ADMIN" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let users = server.store.list_users().await?;
    assert!(users.iter().all(|u| u.role == Role::User));
    Ok(())
}

#[tokio::test]
async fn admin_lists_users_without_passwords() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.user("first@x.com").await?;
    let (_, admin) = server.admin("admin@x.com").await?;

    let users: Value = server
        .client
        .get(server.url("/admin/users"))
        .bearer_auth(&admin)
        .send()
        .await?
        .json()
        .await?;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["email"], "admin@x.com");
    assert_eq!(users[0]["role"], "ADMIN");
    assert!(users.iter().all(|u| u.get("password").is_none()));
    assert!(users.iter().all(|u| u.get("createdAt").is_some()));
    Ok(())
}

#[tokio::test]
async fn set_role_validates_and_updates() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let (user_id, _) = server.user("u@x.com").await?;
    let (_, admin) = server.admin("admin@x.com").await?;
    let url = server.url(&format!("/admin/users/{}/role", user_id));

    let res = server
        .client
        .patch(&url)
        .bearer_auth(&admin)
        .json(&json!({ "role": "FOO" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let user = server.store.find_user_by_email("u@x.com").await?.unwrap();
    assert_eq!(user.role, Role::User);

    let res = server
        .client
        .patch(&url)
        .bearer_auth(&admin)
        .json(&json!({ "role": "ADMIN" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "id": user_id, "email": "u@x.com", "role": "ADMIN" }));

    let res = server
        .client
        .patch(server.url("/admin/users/9999/role"))
        .bearer_auth(&admin)
        .json(&json!({ "role": "USER" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn admin_orders_include_owner_and_items() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let product_id = server.create_product("Mug", None, 5.0).await?["id"].as_i64().unwrap();
    let (buyer_id, buyer) = server.user("buyer@x.com").await?;
    let (_, admin) = server.admin("admin@x.com").await?;

    server
        .client
        .post(server.url("/orders"))
        .bearer_auth(&buyer)
        .json(&json!({ "items": [{ "productId": product_id, "quantity": 3 }] }))
        .send()
        .await?;

    let orders: Value = server
        .client
        .get(server.url("/admin/orders"))
        .bearer_auth(&admin)
        .send()
        .await?
        .json()
        .await?;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["user"], json!({ "id": buyer_id, "email": "buyer@x.com" }));
    assert_eq!(orders[0]["items"][0]["product"]["name"], "Mug");
    Ok(())
}

#[tokio::test]
async fn stats_aggregate_the_store() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let (_, admin) = server.admin("admin@x.com").await?;

    let empty: Value = server
        .client
        .get(server.url("/admin/stats"))
        .bearer_auth(&admin)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(empty["totalSales"].as_f64(), Some(0.0));
    assert_eq!(empty["totalOrders"], 0);
    assert_eq!(empty["totalUsers"], 1);
    assert_eq!(empty["totalProducts"], 0);

    let a = server.create_product("A", None, 5.0).await?["id"].as_i64().unwrap();
    server.create_product("B", None, 7.0).await?;
    let (_, buyer) = server.user("buyer@x.com").await?;
    for quantity in [1, 3] {
        server
            .client
            .post(server.url("/orders"))
            .bearer_auth(&buyer)
            .json(&json!({ "items": [{ "productId": a, "quantity": quantity }] }))
            .send()
            .await?;
    }

    let stats: Value = server
        .client
        .get(server.url("/admin/stats"))
        .bearer_auth(&admin)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(stats["totalSales"].as_f64(), Some(20.0));
    assert_eq!(stats["totalOrders"], 2);
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["totalProducts"], 2);
    Ok(())
}
