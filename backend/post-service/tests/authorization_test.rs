//! Integration Tests: Authorization
//!
//! Coverage:
//! - Owner / stranger / admin matrix for edit and delete
//! - NotFound takes precedence over ownership
//! - Unauthenticated callers never get an identity
//! - Denied requests leave the stored post untouched

mod common;

use common::TestApp;
use crypto_core::jwt::Role;
use post_service::domain::{CreatePostInput, DeletePostInput, EditPostInput};
use post_service::repository::PostGateway;
use post_service::ServiceError;
use uuid::Uuid;

#[tokio::test]
async fn test_stranger_cannot_delete_but_admin_can() {
    let app = TestApp::new();
    let a = app.login("A", Role::Normal).await;
    let b = app.login("B", Role::Normal).await;
    let c = app.login("C", Role::Admin).await;

    let post = app
        .service
        .create_post(
            &a,
            CreatePostInput {
                content: "mine".to_string(),
            },
        )
        .await
        .unwrap();

    let err = app
        .service
        .delete_post(&b, DeletePostInput { post_id: post.id })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(ref reason) if reason == "not owner"));
    assert!(app.gateway.find_post(post.id).await.unwrap().is_some());

    app.service
        .delete_post(&c, DeletePostInput { post_id: post.id })
        .await
        .unwrap();
    assert!(app.gateway.find_post(post.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_owner_can_delete_own_post() {
    let app = TestApp::new();
    let a = app.login("A", Role::Normal).await;
    let post = app
        .service
        .create_post(
            &a,
            CreatePostInput {
                content: "short-lived".to_string(),
            },
        )
        .await
        .unwrap();

    app.service
        .delete_post(&a, DeletePostInput { post_id: post.id })
        .await
        .unwrap();

    // second delete sees nothing
    let err = app
        .service
        .delete_post(&a, DeletePostInput { post_id: post.id })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_only_creator_can_edit() {
    let app = TestApp::new();
    let a = app.login("A", Role::Normal).await;
    let admin = app.login("root", Role::Admin).await;
    let post = app
        .service
        .create_post(
            &a,
            CreatePostInput {
                content: "v1".to_string(),
            },
        )
        .await
        .unwrap();

    let err = app
        .service
        .edit_post(
            &admin,
            EditPostInput {
                post_id: post.id,
                content: "admin rewrite".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let edited = app
        .service
        .edit_post(
            &a,
            EditPostInput {
                post_id: post.id,
                content: "v2".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.content, "v2");
    assert_eq!(edited.creator.id, a.id);
    assert!(edited.updated_at >= post.updated_at);
    assert_eq!(edited.created_at, post.created_at);
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found_for_non_owner() {
    let app = TestApp::new();
    let stranger = app.login("B", Role::Normal).await;

    let err = app
        .service
        .delete_post(
            &stranger,
            DeletePostInput {
                post_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_unauthenticated_credentials_are_rejected() {
    let app = TestApp::new();

    for credential in [None, Some(""), Some("Bearer nope"), Some("a.b.c")] {
        let err = app.resolver.resolve(credential).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)), "{credential:?}");
        assert_eq!(err.status_code(), 401);
    }
}

#[tokio::test]
async fn test_listing_shows_creator_and_newest_first() {
    let app = TestApp::new();
    let a = app.login("Alice", Role::Normal).await;
    let b = app.login("Bob", Role::Normal).await;

    let first = app
        .service
        .create_post(
            &a,
            CreatePostInput {
                content: "first".to_string(),
            },
        )
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = app
        .service
        .create_post(
            &b,
            CreatePostInput {
                content: "second".to_string(),
            },
        )
        .await
        .unwrap();

    let listed = app.service.list_posts(&a).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[0].creator.name, "Bob");
    assert_eq!(listed[1].id, first.id);
    assert_eq!(listed[1].creator.name, "Alice");
    assert_eq!((listed[1].likes, listed[1].dislikes), (0, 0));
}
