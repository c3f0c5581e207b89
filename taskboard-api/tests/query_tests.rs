/// End-to-end tests for the query endpoint
///
/// Requests go through the complete router (identity middleware, tracing,
/// CORS and error mapping) on an in-memory store.

mod common;

use axum::http::StatusCode;
use common::{ids, TestContext, PASSWORD};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "connected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_register_login_and_me() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;

    let me = ctx.data(&token, json!({ "operation": "me" })).await;
    assert_eq!(me["username"], "alice");
    assert!(me.get("passwordHash").is_none());

    let (status, body) = ctx
        .query(
            None,
            json!({ "operation": "login", "username": "alice", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["id"], me["id"]);
    assert!(body["data"]["token"].is_string());
}

#[tokio::test]
async fn test_login_failures() {
    let ctx = TestContext::new();
    ctx.register("alice").await;

    let long_name = "x".repeat(60);
    for (username, password) in [
        ("alice", "Wr0ng!pass"),
        ("nobody", PASSWORD),
        ("ab", "x"),
        (long_name.as_str(), PASSWORD),
    ] {
        let (status, body) = ctx
            .query(
                None,
                json!({ "operation": "login", "username": username, "password": password }),
            )
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_credentials");
    }
}

#[tokio::test]
async fn test_register_conflict_and_weak_password() {
    let ctx = TestContext::new();
    ctx.register("alice").await;

    let (status, body) = ctx
        .query(
            None,
            json!({ "operation": "register", "username": "alice", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = ctx
        .query(
            None,
            json!({ "operation": "register", "username": "bob", "password": "password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_anonymous_requests() {
    let ctx = TestContext::new();

    let (status, body) = ctx.query(None, json!({ "operation": "me" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": null }));

    let (status, body) = ctx
        .query(Some("not-a-token"), json!({ "operation": "boards" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "not_authenticated");
}

#[tokio::test]
async fn test_malformed_bodies() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;

    let (status, body) = ctx.send(Some(&token), "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = ctx
        .query(Some(&token), json!({ "operation": "dropEverything" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .query(Some(&token), json!({ "operation": "addBoard", "title": "" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "title");
}

#[tokio::test]
async fn test_board_crud() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;

    let board = ctx
        .data(&token, json!({ "operation": "addBoard", "title": "Roadmap" }))
        .await;
    assert_eq!(board["title"], "Roadmap");
    assert_eq!(board["lists"], json!([]));
    let board_id = board["id"].as_str().unwrap().to_string();

    let renamed = ctx
        .data(
            &token,
            json!({ "operation": "updateBoard", "id": board_id, "title": "Plan" }),
        )
        .await;
    assert_eq!(renamed["title"], "Plan");

    let boards = ctx.data(&token, json!({ "operation": "boards" })).await;
    assert_eq!(ids(&boards), vec![board_id.clone()]);

    let deleted = ctx
        .data(&token, json!({ "operation": "deleteBoard", "id": board_id }))
        .await;
    assert_eq!(deleted, json!(true));

    let boards = ctx.data(&token, json!({ "operation": "boards" })).await;
    assert_eq!(boards, json!([]));
}

#[tokio::test]
async fn test_lists_and_tasks() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;

    let board = ctx
        .data(&token, json!({ "operation": "addBoard", "title": "Sprint" }))
        .await;
    let list = ctx
        .data(
            &token,
            json!({ "operation": "addList", "boardId": board["id"], "title": "Todo" }),
        )
        .await;
    assert_eq!(list["boardId"], board["id"]);

    let task = ctx
        .data(
            &token,
            json!({ "operation": "addTask", "listId": list["id"], "title": "Write tests" }),
        )
        .await;
    assert_eq!(task["completed"], false);
    assert_eq!(task["listId"], list["id"]);

    let updated = ctx
        .data(
            &token,
            json!({ "operation": "updateTask", "id": task["id"], "title": "Write more tests" }),
        )
        .await;
    assert_eq!(updated["title"], "Write more tests");

    let toggled = ctx
        .data(
            &token,
            json!({ "operation": "toggleTaskCompletion", "taskId": task["id"] }),
        )
        .await;
    assert_eq!(toggled["completed"], true);

    let renamed = ctx
        .data(
            &token,
            json!({ "operation": "updateList", "id": list["id"], "title": "Doing" }),
        )
        .await;
    assert_eq!(renamed["title"], "Doing");
    assert_eq!(ids(&renamed["tasks"]), vec![task["id"].as_str().unwrap()]);

    let deleted = ctx
        .data(&token, json!({ "operation": "deleteTask", "id": task["id"] }))
        .await;
    assert_eq!(deleted, json!(true));

    let deleted = ctx
        .data(&token, json!({ "operation": "deleteList", "id": list["id"] }))
        .await;
    assert_eq!(deleted, json!(true));

    let boards = ctx.data(&token, json!({ "operation": "boards" })).await;
    assert_eq!(boards[0]["lists"], json!([]));
}

#[tokio::test]
async fn test_move_task() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;

    let board = ctx
        .data(&token, json!({ "operation": "addBoard", "title": "Sprint" }))
        .await;
    let a = ctx
        .data(
            &token,
            json!({ "operation": "addList", "boardId": board["id"], "title": "A" }),
        )
        .await;
    let b = ctx
        .data(
            &token,
            json!({ "operation": "addList", "boardId": board["id"], "title": "B" }),
        )
        .await;

    let mut tasks = Vec::new();
    for (list, title) in [(&a, "t1"), (&a, "t2"), (&a, "t3"), (&b, "t4")] {
        let task = ctx
            .data(
                &token,
                json!({ "operation": "addTask", "listId": list["id"], "title": title }),
            )
            .await;
        tasks.push(task["id"].as_str().unwrap().to_string());
    }

    let boards = ctx
        .data(
            &token,
            json!({
                "operation": "moveTask",
                "taskId": tasks[1],
                "sourceListId": a["id"],
                "destListId": b["id"],
                "newIndex": 0
            }),
        )
        .await;

    let lists = &boards[0]["lists"];
    assert_eq!(ids(&lists[0]["tasks"]), vec![tasks[0].clone(), tasks[2].clone()]);
    assert_eq!(ids(&lists[1]["tasks"]), vec![tasks[1].clone(), tasks[3].clone()]);
}

#[tokio::test]
async fn test_other_users_entities_look_missing() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;

    let board = ctx
        .data(&alice, json!({ "operation": "addBoard", "title": "Private" }))
        .await;
    let list = ctx
        .data(
            &alice,
            json!({ "operation": "addList", "boardId": board["id"], "title": "Todo" }),
        )
        .await;

    let (foreign_status, foreign) = ctx
        .query(
            Some(&bob),
            json!({ "operation": "updateList", "id": list["id"], "title": "Mine" }),
        )
        .await;
    let (missing_status, missing) = ctx
        .query(
            Some(&bob),
            json!({ "operation": "updateList", "id": Uuid::new_v4(), "title": "Mine" }),
        )
        .await;

    assert_eq!(foreign_status, StatusCode::NOT_FOUND);
    assert_eq!(missing_status, StatusCode::NOT_FOUND);
    assert_eq!(foreign, missing);
    assert_eq!(foreign["message"], "List not found");

    let boards = ctx.data(&bob, json!({ "operation": "boards" })).await;
    assert_eq!(boards, json!([]));
}
