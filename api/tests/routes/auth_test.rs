#[cfg(test)]
mod tests {
    use crate::helpers::{body_json, make_test_app};
    use axum::{
        body::Body as AxumBody,
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use db::models::user::{Model as UserModel, UserRole};
    use serde_json::json;
    use serial_test::serial;
    use tower::ServiceExt;

    fn login_request(username: &str, password: &str) -> Request<AxumBody> {
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(CONTENT_TYPE, "application/json")
            .body(AxumBody::from(
                json!({ "username": username, "password": password }).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn login_success_returns_token() {
        let app = make_test_app().await;
        let user = UserModel::create(&app.db, "u12345678", "u@test.com", "secret123", UserRole::Student)
            .await
            .unwrap();

        let response = app
            .router
            .oneshot(login_request("u12345678", "secret123"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], user.id);
        assert_eq!(json["data"]["role"], "student");
        assert!(json["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert!(json["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    #[serial]
    async fn login_wrong_password_is_unauthorized() {
        let app = make_test_app().await;
        UserModel::create(&app.db, "u87654321", "v@test.com", "secret123", UserRole::Student)
            .await
            .unwrap();

        let response = app
            .router
            .oneshot(login_request("u87654321", "nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    #[serial]
    async fn login_empty_fields_is_bad_request() {
        let app = make_test_app().await;

        let response = app.router.oneshot(login_request("", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
