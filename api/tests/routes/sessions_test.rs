#[cfg(test)]
mod tests {
    use crate::helpers::{bearer, body_json, make_test_app, make_test_app_with};
    use axum::{
        body::Body as AxumBody,
        http::{
            Request, StatusCode,
            header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE},
        },
    };
    use chrono::{Local, NaiveTime};
    use db::models::{
        attendance_record::Model as AttendanceRecordModel,
        session_instance::SessionStatus,
        user::{Model as UserModel, UserRole},
    };
    use db::test_utils::{SessionFixture, seed_session};
    use sea_orm::DatabaseConnection;
    use serial_test::serial;
    use services::verification::VerificationResult;
    use tower::ServiceExt;

    const BOUNDARY: &str = "----attendance-test-boundary";

    /// A session that spans the whole of today, so `Local::now()` is always inside it.
    async fn all_day(db: &DatabaseConnection, tag: &str, status: SessionStatus) -> SessionFixture {
        seed_session(
            db,
            tag,
            Local::now().date_naive(),
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
            status,
        )
        .await
    }

    fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"face.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn check_in_request(session_id: i64, auth: Option<String>, body: Vec<u8>) -> Request<AxumBody> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/api/sessions/{session_id}/check-in"))
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(AxumBody::from(body)).unwrap()
    }

    fn authed(method: &str, uri: String, auth: String) -> Request<AxumBody> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, auth)
            .body(AxumBody::empty())
            .unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn check_in_records_attendance_once() {
        let app = make_test_app().await;
        let fx = all_day(&app.db, "chk", SessionStatus::InProgress).await;
        let auth = bearer(fx.student.id, UserRole::Student);

        let response = app
            .router
            .clone()
            .oneshot(check_in_request(fx.instance.id, Some(auth.clone()), multipart_body("image", b"jpeg")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "present");
        assert_eq!(json["data"]["session_instance_id"], fx.instance.id);
        assert!(json["data"]["check_in_time"].is_string());

        let again = app
            .router
            .clone()
            .oneshot(check_in_request(fx.instance.id, Some(auth.clone()), multipart_body("image", b"jpeg")))
            .await
            .unwrap();
        assert_eq!(again.status(), StatusCode::CONFLICT);
        let json = body_json(again).await;
        assert_eq!(json["success"], false);

        let status = app
            .router
            .oneshot(authed("GET", format!("/api/sessions/{}/status", fx.instance.id), auth))
            .await
            .unwrap();
        assert_eq!(status.status(), StatusCode::OK);
        let json = body_json(status).await;
        assert_eq!(json["data"]["marked"], true);
        assert_eq!(json["data"]["status"], "present");
    }

    #[tokio::test]
    #[serial]
    async fn check_in_without_image_is_bad_request() {
        let app = make_test_app().await;
        let fx = all_day(&app.db, "noimg", SessionStatus::InProgress).await;

        let response = app
            .router
            .clone()
            .oneshot(check_in_request(
                fx.instance.id,
                Some(bearer(fx.student.id, UserRole::Student)),
                multipart_body("other", b"jpeg"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let empty = app
            .router
            .oneshot(check_in_request(
                fx.instance.id,
                Some(bearer(fx.student.id, UserRole::Student)),
                multipart_body("image", b""),
            ))
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let stored = AttendanceRecordModel::find_for(&app.db, fx.student.id, fx.instance.id)
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn check_in_requires_student_token() {
        let app = make_test_app().await;
        let fx = all_day(&app.db, "guard", SessionStatus::InProgress).await;

        let anonymous = app
            .router
            .clone()
            .oneshot(check_in_request(fx.instance.id, None, multipart_body("image", b"jpeg")))
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let lecturer = app
            .router
            .oneshot(check_in_request(
                fx.instance.id,
                Some(bearer(fx.lecturer.id, UserRole::Lecturer)),
                multipart_body("image", b"jpeg"),
            ))
            .await
            .unwrap();
        assert_eq!(lecturer.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn check_in_rejections_map_to_status_codes() {
        let app = make_test_app().await;
        let scheduled = all_day(&app.db, "sched", SessionStatus::Scheduled).await;
        let running = all_day(&app.db, "run", SessionStatus::InProgress).await;

        // not started
        let response = app
            .router
            .clone()
            .oneshot(check_in_request(
                scheduled.instance.id,
                Some(bearer(scheduled.student.id, UserRole::Student)),
                multipart_body("image", b"jpeg"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // enrolled elsewhere
        let response = app
            .router
            .clone()
            .oneshot(check_in_request(
                running.instance.id,
                Some(bearer(scheduled.student.id, UserRole::Student)),
                multipart_body("image", b"jpeg"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // no such session
        let response = app
            .router
            .oneshot(check_in_request(
                9999,
                Some(bearer(running.student.id, UserRole::Student)),
                multipart_body("image", b"jpeg"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn failed_verification_is_unprocessable() {
        let app = make_test_app_with(VerificationResult {
            matched: true,
            confidence: 0.3,
        })
        .await;
        let fx = all_day(&app.db, "lowconf", SessionStatus::InProgress).await;

        let response = app
            .router
            .oneshot(check_in_request(
                fx.instance.id,
                Some(bearer(fx.student.id, UserRole::Student)),
                multipart_body("image", b"jpeg"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let stored = AttendanceRecordModel::find_for(&app.db, fx.student.id, fx.instance.id)
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn available_sessions_lists_todays_classes() {
        let app = make_test_app().await;
        let fx = all_day(&app.db, "avail", SessionStatus::InProgress).await;

        let response = app
            .router
            .oneshot(authed(
                "GET",
                "/api/sessions/available".to_string(),
                bearer(fx.student.id, UserRole::Student),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let sessions = json["data"].as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["session_instance_id"], fx.instance.id);
        assert_eq!(sessions[0]["class_code"], "CLS_avail");
        assert_eq!(sessions[0]["checked_in"], false);
    }

    #[tokio::test]
    #[serial]
    async fn lecturer_starts_and_ends_session() {
        let app = make_test_app().await;
        let fx = all_day(&app.db, "life", SessionStatus::Scheduled).await;
        let lecturer = bearer(fx.lecturer.id, UserRole::Lecturer);

        let started = app
            .router
            .clone()
            .oneshot(authed("POST", format!("/api/sessions/{}/start", fx.instance.id), lecturer.clone()))
            .await
            .unwrap();
        assert_eq!(started.status(), StatusCode::OK);
        let json = body_json(started).await;
        assert_eq!(json["data"]["status"], "in_progress");

        let restart = app
            .router
            .clone()
            .oneshot(authed("POST", format!("/api/sessions/{}/start", fx.instance.id), lecturer.clone()))
            .await
            .unwrap();
        assert_eq!(restart.status(), StatusCode::CONFLICT);

        let ended = app
            .router
            .clone()
            .oneshot(authed("POST", format!("/api/sessions/{}/end", fx.instance.id), lecturer.clone()))
            .await
            .unwrap();
        assert_eq!(ended.status(), StatusCode::OK);
        let json = body_json(ended).await;
        assert_eq!(json["data"]["instance"]["status"], "completed");
        assert_eq!(json["data"]["absentees"], 1);

        let roll = app
            .router
            .oneshot(authed("GET", format!("/api/sessions/{}/records", fx.instance.id), lecturer))
            .await
            .unwrap();
        assert_eq!(roll.status(), StatusCode::OK);
        let json = body_json(roll).await;
        let rows = json["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["username"], "stud_life");
        assert_eq!(rows[0]["status"], "absent");
    }

    #[tokio::test]
    #[serial]
    async fn unassigned_lecturer_cannot_manage_session() {
        let app = make_test_app().await;
        let fx = all_day(&app.db, "other", SessionStatus::Scheduled).await;
        let stranger = UserModel::create(&app.db, "stranger", "s@test.com", "password", UserRole::Lecturer)
            .await
            .unwrap();

        let response = app
            .router
            .clone()
            .oneshot(authed(
                "POST",
                format!("/api/sessions/{}/start", fx.instance.id),
                bearer(stranger.id, UserRole::Lecturer),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let student = app
            .router
            .oneshot(authed(
                "POST",
                format!("/api/sessions/{}/start", fx.instance.id),
                bearer(fx.student.id, UserRole::Student),
            ))
            .await
            .unwrap();
        assert_eq!(student.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn records_export_is_csv() {
        let app = make_test_app().await;
        let fx = all_day(&app.db, "csv", SessionStatus::InProgress).await;

        app.router
            .clone()
            .oneshot(check_in_request(
                fx.instance.id,
                Some(bearer(fx.student.id, UserRole::Student)),
                multipart_body("image", b"jpeg"),
            ))
            .await
            .unwrap();

        let response = app
            .router
            .oneshot(authed(
                "GET",
                format!("/api/sessions/{}/records/export", fx.instance.id),
                bearer(fx.lecturer.id, UserRole::Lecturer),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/csv")
        );
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION].to_str().unwrap(),
            format!("attachment; filename=\"attendance_session_{}.csv\"", fx.instance.id)
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let csv = String::from_utf8(body.to_vec()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("session_instance_id,student_id,username,status,check_in_time,confidence,notes")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with(&format!("{},{},stud_csv,present,", fx.instance.id, fx.student.id)));
        assert!(row.contains(",0.92,"));
        assert_eq!(lines.next(), None);
    }

    #[tokio::test]
    #[serial]
    async fn available_lists_slots_created_after_startup() {
        use chrono::Datelike;
        use db::models::timetable_session::{Model as TimetableModel, Weekday};

        let app = make_test_app().await;
        let fx = all_day(&app.db, "fresh_slot", SessionStatus::Scheduled).await;
        TimetableModel::create(
            &app.db,
            fx.class.id,
            "Evening lab",
            Weekday::from(Local::now().date_naive().weekday()),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        )
        .await
        .unwrap();

        let response = app
            .router
            .clone()
            .oneshot(authed(
                "GET",
                "/api/sessions/available".into(),
                bearer(fx.student.id, UserRole::Student),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let sessions = json["data"].as_array().unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().any(|s| s["session_title"] == "Evening lab"));
    }

    fn put_record(session_id: i64, student_id: i64, auth: String, body: serde_json::Value) -> Request<AxumBody> {
        Request::builder()
            .method("PUT")
            .uri(format!("/api/sessions/{session_id}/records/{student_id}"))
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, "application/json")
            .body(AxumBody::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn lecturer_overrides_a_status_with_notes() {
        let app = make_test_app().await;
        let fx = all_day(&app.db, "override", SessionStatus::InProgress).await;
        let lecturer = bearer(fx.lecturer.id, UserRole::Lecturer);

        let response = app
            .router
            .clone()
            .oneshot(put_record(
                fx.instance.id,
                fx.student.id,
                lecturer.clone(),
                serde_json::json!({ "status": "late", "notes": "Lab ran over, excused" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "late");
        assert_eq!(json["data"]["marked_by"], fx.lecturer.id);

        let roll = app
            .router
            .clone()
            .oneshot(authed("GET", format!("/api/sessions/{}/records", fx.instance.id), lecturer.clone()))
            .await
            .unwrap();
        let json = body_json(roll).await;
        assert_eq!(json["data"][0]["status"], "late");
        assert_eq!(json["data"][0]["notes"], "Lab ran over, excused");

        let export = app
            .router
            .clone()
            .oneshot(authed("GET", format!("/api/sessions/{}/records/export", fx.instance.id), lecturer.clone()))
            .await
            .unwrap();
        let body = axum::body::to_bytes(export.into_body(), usize::MAX)
            .await
            .unwrap();
        let csv = String::from_utf8(body.to_vec()).unwrap();
        assert!(csv.contains(",stud_override,late,"));
        assert!(csv.contains("\"Lab ran over, excused\""));

        // later change to absent keeps the notes
        let response = app
            .router
            .clone()
            .oneshot(put_record(
                fx.instance.id,
                fx.student.id,
                lecturer,
                serde_json::json!({ "status": "absent" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "absent");
        assert_eq!(json["data"]["notes"], "Lab ran over, excused");
    }

    #[tokio::test]
    #[serial]
    async fn override_is_staff_only() {
        let app = make_test_app().await;
        let fx = all_day(&app.db, "override_auth", SessionStatus::InProgress).await;
        let stranger = UserModel::create(&app.db, "lect_stranger_ovr", "so@test.com", "pw", UserRole::Lecturer)
            .await
            .unwrap();

        let student = app
            .router
            .clone()
            .oneshot(put_record(
                fx.instance.id,
                fx.student.id,
                bearer(fx.student.id, UserRole::Student),
                serde_json::json!({ "status": "present" }),
            ))
            .await
            .unwrap();
        assert_eq!(student.status(), StatusCode::FORBIDDEN);

        let other_lecturer = app
            .router
            .clone()
            .oneshot(put_record(
                fx.instance.id,
                fx.student.id,
                bearer(stranger.id, UserRole::Lecturer),
                serde_json::json!({ "status": "present" }),
            ))
            .await
            .unwrap();
        assert_eq!(other_lecturer.status(), StatusCode::FORBIDDEN);

        let bad_status = app
            .router
            .clone()
            .oneshot(put_record(
                fx.instance.id,
                fx.student.id,
                bearer(fx.lecturer.id, UserRole::Lecturer),
                serde_json::json!({ "status": "excused" }),
            ))
            .await
            .unwrap();
        assert!(bad_status.status().is_client_error());

        let records = AttendanceRecordModel::list_for_session(&app.db, fx.instance.id)
            .await
            .unwrap();
        assert!(records.is_empty());
    }
}
