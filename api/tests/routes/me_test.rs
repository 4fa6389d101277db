#[cfg(test)]
mod tests {
    use crate::helpers::{bearer, body_json, make_test_app};
    use axum::{
        body::Body as AxumBody,
        http::{Request, StatusCode, header::AUTHORIZATION},
    };
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use db::models::{
        attendance_record::Model as AttendanceRecordModel, session_instance::SessionStatus,
        student_enrollment::Model as EnrollmentModel, user::UserRole,
    };
    use db::test_utils::seed_session;
    use serial_test::serial;
    use tower::ServiceExt;

    #[tokio::test]
    #[serial]
    async fn history_lists_own_records() {
        let app = make_test_app().await;
        let fx = seed_session(
            &app.db,
            "hist",
            NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            SessionStatus::Completed,
        )
        .await;
        let when = Utc.with_ymd_and_hms(2026, 10, 12, 9, 10, 0).unwrap();
        AttendanceRecordModel::insert_present(&app.db, fx.student.id, fx.instance.id, when, Some(0.81))
            .await
            .unwrap();

        let req = Request::builder()
            .method("GET")
            .uri("/api/me/attendance")
            .header(AUTHORIZATION, bearer(fx.student.id, UserRole::Student))
            .body(AxumBody::empty())
            .unwrap();

        let response = app.router.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let entries = json["data"]["records"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["session_instance_id"], fx.instance.id);
        assert_eq!(entries[0]["session_date"], "2026-10-12");
        assert_eq!(entries[0]["class_code"], "CLS_hist");
        assert_eq!(entries[0]["status"], "present");
        assert_eq!(json["data"]["summary"]["total"], 1);
        assert_eq!(json["data"]["summary"]["percentage"], 100.0);
    }

    #[tokio::test]
    #[serial]
    async fn summary_and_status_filter() {
        let app = make_test_app().await;
        let date = NaiveDate::from_ymd_opt(2026, 10, 13).unwrap();
        let first = seed_session(
            &app.db,
            "filter_a",
            date,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            SessionStatus::Completed,
        )
        .await;
        let second = seed_session(
            &app.db,
            "filter_b",
            date,
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            SessionStatus::Completed,
        )
        .await;
        EnrollmentModel::enroll(&app.db, first.student.id, second.class.id)
            .await
            .unwrap();
        let when = Utc.with_ymd_and_hms(2026, 10, 13, 9, 5, 0).unwrap();
        AttendanceRecordModel::insert_present(&app.db, first.student.id, first.instance.id, when, Some(0.9))
            .await
            .unwrap();
        AttendanceRecordModel::mark_absentees(&app.db, second.instance.id, &[first.student.id])
            .await
            .unwrap();

        let auth = bearer(first.student.id, UserRole::Student);
        let get = |uri: &str| {
            Request::builder()
                .method("GET")
                .uri(uri)
                .header(AUTHORIZATION, auth.clone())
                .body(AxumBody::empty())
                .unwrap()
        };

        let response = app.router.clone().oneshot(get("/api/me/attendance")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["data"]["records"].as_array().unwrap().len(), 2);
        assert_eq!(json["data"]["summary"]["total"], 2);
        assert_eq!(json["data"]["summary"]["present"], 1);
        assert_eq!(json["data"]["summary"]["absent"], 1);
        assert_eq!(json["data"]["summary"]["late"], 0);
        assert_eq!(json["data"]["summary"]["percentage"], 50.0);

        let response = app
            .router
            .clone()
            .oneshot(get("/api/me/attendance?status=absent"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let records = json["data"]["records"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["session_instance_id"], second.instance.id);
        assert_eq!(json["data"]["summary"]["total"], 2);

        let response = app
            .router
            .clone()
            .oneshot(get("/api/me/attendance?status=excused"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[serial]
    async fn summary_without_records_is_zero_percent() {
        let app = make_test_app().await;
        let fx = seed_session(
            &app.db,
            "empty",
            NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            SessionStatus::Scheduled,
        )
        .await;

        let req = Request::builder()
            .method("GET")
            .uri("/api/me/attendance")
            .header(AUTHORIZATION, bearer(fx.student.id, UserRole::Student))
            .body(AxumBody::empty())
            .unwrap();
        let response = app.router.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["summary"]["total"], 0);
        assert_eq!(json["data"]["summary"]["percentage"], 0.0);
        assert!(json["data"]["records"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn history_is_for_students_only() {
        let app = make_test_app().await;

        let req = Request::builder()
            .method("GET")
            .uri("/api/me/attendance")
            .header(AUTHORIZATION, bearer(1, UserRole::Lecturer))
            .body(AxumBody::empty())
            .unwrap();

        let response = app.router.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
