#[cfg(test)]
mod tests {
    use crate::helpers::{bearer, body_json, make_test_app};
    use axum::{
        body::Body as AxumBody,
        http::{
            Request, StatusCode,
            header::{AUTHORIZATION, CONTENT_TYPE},
        },
    };
    use db::models::{
        session_instance::Model as SessionInstanceModel,
        student_enrollment::Model as EnrollmentModel,
        user::{Model as UserModel, UserRole},
    };
    use serde_json::{Value, json};
    use serial_test::serial;
    use tower::ServiceExt;

    fn admin_request(method: &str, uri: &str, auth: &str, body: Value) -> Request<AxumBody> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, "application/json")
            .body(AxumBody::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn admin_builds_a_timetable_and_materialises_it() {
        let app = make_test_app().await;
        let admin = UserModel::create(&app.db, "admin", "admin@test.com", "password", UserRole::Admin)
            .await
            .unwrap();
        let auth = bearer(admin.id, UserRole::Admin);

        let response = app
            .router
            .clone()
            .oneshot(admin_request(
                "POST",
                "/api/admin/users",
                &auth,
                json!({ "username": "s1", "email": "s1@test.com", "password": "password1", "role": "student" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let student_id = body_json(response).await["data"]["id"].as_i64().unwrap();

        let response = app
            .router
            .clone()
            .oneshot(admin_request(
                "POST",
                "/api/admin/users",
                &auth,
                json!({ "username": "l1", "email": "l1@test.com", "password": "password1", "role": "lecturer" }),
            ))
            .await
            .unwrap();
        let lecturer_id = body_json(response).await["data"]["id"].as_i64().unwrap();

        let response = app
            .router
            .clone()
            .oneshot(admin_request(
                "POST",
                "/api/admin/classes",
                &auth,
                json!({ "class_code": "COS301", "class_name": "Software Engineering" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let class_id = body_json(response).await["data"]["id"].as_i64().unwrap();

        let response = app
            .router
            .clone()
            .oneshot(admin_request(
                "POST",
                &format!("/api/admin/classes/{class_id}/timetable"),
                &auth,
                json!({ "session_title": "Lecture", "day_of_week": "monday", "start_time": "09:00:00", "end_time": "10:00:00" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .router
            .clone()
            .oneshot(admin_request(
                "POST",
                &format!("/api/admin/classes/{class_id}/lecturers"),
                &auth,
                json!({ "lecturer_id": lecturer_id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .router
            .clone()
            .oneshot(admin_request(
                "POST",
                &format!("/api/admin/classes/{class_id}/students"),
                &auth,
                json!({ "student_id": student_id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // 2026-10-19 is a Monday
        let response = app
            .router
            .clone()
            .oneshot(admin_request("POST", "/api/admin/materialize", &auth, json!({ "date": "2026-10-19" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["created"], 1);

        let again = app
            .router
            .clone()
            .oneshot(admin_request("POST", "/api/admin/materialize", &auth, json!({ "date": "2026-10-19" })))
            .await
            .unwrap();
        assert_eq!(body_json(again).await["data"]["created"], 0);

        let monday = chrono::NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let sessions = SessionInstanceModel::list_for_classes_on(&app.db, &[class_id], monday)
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);

        let response = app
            .router
            .oneshot(admin_request(
                "DELETE",
                &format!("/api/admin/classes/{class_id}/students/{student_id}"),
                &auth,
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["status"], "dropped");
        assert!(
            !EnrollmentModel::is_enrolled(&app.db, student_id, class_id)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    #[serial]
    async fn admin_write_errors_map_to_status_codes() {
        let app = make_test_app().await;
        let admin = UserModel::create(&app.db, "admin", "admin@test.com", "password", UserRole::Admin)
            .await
            .unwrap();
        let student = UserModel::create(&app.db, "s2", "s2@test.com", "password", UserRole::Student)
            .await
            .unwrap();
        let auth = bearer(admin.id, UserRole::Admin);

        // duplicate username
        let response = app
            .router
            .clone()
            .oneshot(admin_request(
                "POST",
                "/api/admin/users",
                &auth,
                json!({ "username": "s2", "email": "other@test.com", "password": "password1", "role": "student" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // invalid email
        let response = app
            .router
            .clone()
            .oneshot(admin_request(
                "POST",
                "/api/admin/users",
                &auth,
                json!({ "username": "s3", "email": "not-an-email", "password": "password1", "role": "student" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // missing class
        let response = app
            .router
            .clone()
            .oneshot(admin_request(
                "POST",
                "/api/admin/classes/999/students",
                &auth,
                json!({ "student_id": student.id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .router
            .clone()
            .oneshot(admin_request(
                "POST",
                "/api/admin/classes",
                &auth,
                json!({ "class_code": "COS999", "class_name": "Test" }),
            ))
            .await
            .unwrap();
        let class_id = body_json(response).await["data"]["id"].as_i64().unwrap();

        // a student can't be assigned as lecturer
        let response = app
            .router
            .clone()
            .oneshot(admin_request(
                "POST",
                &format!("/api/admin/classes/{class_id}/lecturers"),
                &auth,
                json!({ "lecturer_id": student.id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // end before start
        let response = app
            .router
            .clone()
            .oneshot(admin_request(
                "POST",
                &format!("/api/admin/classes/{class_id}/timetable"),
                &auth,
                json!({ "session_title": "Lab", "day_of_week": "friday", "start_time": "11:00:00", "end_time": "10:00:00" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // not enrolled
        let response = app
            .router
            .oneshot(admin_request(
                "DELETE",
                &format!("/api/admin/classes/{class_id}/students/{}", student.id),
                &auth,
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn admin_routes_reject_other_roles() {
        let app = make_test_app().await;

        let response = app
            .router
            .oneshot(admin_request(
                "POST",
                "/api/admin/classes",
                &bearer(7, UserRole::Lecturer),
                json!({ "class_code": "X", "class_name": "Y" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
