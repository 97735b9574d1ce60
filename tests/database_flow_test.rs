mod common;

use axum::http::{Request, StatusCode};
use axum::body::Body;
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;
use tower::ServiceExt;

use common::{
    authorized, body_json, json_request, multipart_upload, simulated_analysis, test_config,
    test_database, unique_email,
};
use zumbafit::api::{create_routes, AppState};
use zumbafit::auth::AuthService;
use zumbafit::models::{NewVideo, ProcessingStatus};
use zumbafit::services::{AdminService, ReportService, VideoService};

fn get_as(uri: &str, token: &str) -> Request<Body> {
    authorized(Request::builder().uri(uri), token)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
#[serial]
async fn test_register_login_upload_and_review() {
    let Some(pool) = test_database().await else {
        return;
    };

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let state = AppState::new(pool.clone(), simulated_analysis(), &config);
    let app = create_routes(state);

    let email = unique_email("dancer");

    // Register
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            json!({"name": "Dancer", "email": email, "password": "zumba2024"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let user_id = body["user"]["user_id"].as_i64().unwrap();

    // Duplicate email
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            json!({"name": "Other", "email": email, "password": "zumba2024"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Wrong password
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({"email": email, "password": "wrong12345"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Login
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({"email": email, "password": "zumba2024"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    // No feedback yet
    let response = app
        .clone()
        .oneshot(get_as(&format!("/feedback/personalized/{}", user_id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Upload; no model is loaded so the analysis is simulated
    let request = multipart_upload(
        "/video/upload",
        &token,
        "my squat.mp4",
        "video/mp4",
        b"not decoded in simulation mode",
        Some("Squat"),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let upload = body_json(response).await;
    let video_id = upload["video_id"].as_i64().unwrap();
    assert_eq!(upload["is_simulated"], true);
    assert!(!upload["improvement_suggestions"].as_array().unwrap().is_empty());

    // Stored under <uuid>_<name>
    let stored: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(stored.len(), 1);
    let stored_name = stored[0].as_ref().unwrap().file_name();
    assert!(stored_name.to_string_lossy().ends_with("_my_squat.mp4"));

    // Listed with its feedback
    let response = app
        .clone()
        .oneshot(get_as(&format!("/video/user/{}", user_id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list["total_count"], 1);
    assert_eq!(list["videos"][0]["feedback_text"], upload["feedback"]);

    // Details
    let response = app
        .clone()
        .oneshot(get_as(&format!("/video/{}", video_id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let details = body_json(response).await;
    assert_eq!(details["user_name"], "Dancer");
    assert_eq!(details["processing_status"], "processed");
    assert_eq!(details["exercise_type"], "Squat");

    // Personalized feedback now exists
    let response = app
        .clone()
        .oneshot(get_as(&format!("/feedback/personalized/{}", user_id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let personalized = body_json(response).await;
    assert_eq!(personalized["feedback"]["video_id"], video_id);
    assert!(!personalized["improvement_suggestions"].as_array().unwrap().is_empty());

    println!("✓ register, login, upload and review flow");
}

#[tokio::test]
#[serial]
async fn test_failed_analysis_is_recorded() {
    let Some(pool) = test_database().await else {
        return;
    };

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let auth = AuthService::new(pool.clone(), &config.jwt_secret);
    let email = unique_email("failing");
    auth.register(zumbafit::auth::RegisterRequest {
        name: "Failing".to_string(),
        email: email.clone(),
        password: "zumba2024".to_string(),
    })
    .await
    .unwrap();
    let login = auth
        .login(zumbafit::auth::LoginRequest {
            email,
            password: "zumba2024".to_string(),
        })
        .await
        .unwrap();

    // A loaded model makes the pipeline decode the file, and an empty file has no frames
    let analysis = common::analysis_with(common::FixedClassifier::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
    let app = create_routes(AppState::new(pool.clone(), analysis, &config));

    let request = multipart_upload("/video/upload", &login.access_token, "empty.mp4", "video/mp4", b"", None);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["message"], "No frames extracted from video");

    // The file is gone but the attempt is on record
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    let list = VideoService::new(pool.clone())
        .list_user_videos(login.user.user_id, 10, 0)
        .await
        .unwrap();
    assert_eq!(list.total_count, 1);
    assert_eq!(list.videos[0].class_label, "failed");
    assert_eq!(list.videos[0].processing_status, "failed");
}

#[tokio::test]
#[serial]
async fn test_admin_dashboard() {
    let Some(pool) = test_database().await else {
        return;
    };

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let auth = AuthService::new(pool.clone(), &config.jwt_secret);

    let username = format!("admin_{}", uuid::Uuid::new_v4().simple());
    let admin_email = unique_email("admin");
    auth.seed_admin(&username, &admin_email, "admin1234").await.unwrap();

    // Seeding again resets the password instead of failing
    auth.seed_admin(&username, &admin_email, "admin5678").await.unwrap();

    let user_email = unique_email("stats");
    let user = auth
        .register(zumbafit::auth::RegisterRequest {
            name: "Stats".to_string(),
            email: user_email,
            password: "zumba2024".to_string(),
        })
        .await
        .unwrap()
        .user;

    let videos = VideoService::new(pool.clone());
    let before = AdminService::new(pool.clone()).dashboard_stats().await.unwrap();
    for (label, simulated) in [("Squat_Correct", false), ("Arm_Raise_Incorrect", true)] {
        videos
            .record_video(&NewVideo {
                user_id: user.user_id,
                video_name: "clip.mp4".to_string(),
                file_path: "uploads/clip.mp4".to_string(),
                class_label: label.to_string(),
                confidence: 0.9,
                is_simulated: simulated,
                exercise_type: None,
                status: ProcessingStatus::Processed,
                feedback_text: "feedback".to_string(),
            })
            .await
            .unwrap();
    }

    let app = create_routes(AppState::new(pool.clone(), simulated_analysis(), &config));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/admin/login",
            json!({"username": username, "password": "admin5678"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(get_as("/admin/stats", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;
    assert_eq!(stats["total_videos"].as_i64().unwrap(), before.total_videos + 2);
    assert_eq!(stats["correct_postures"].as_i64().unwrap(), before.correct_postures + 1);
    assert_eq!(stats["incorrect_postures"].as_i64().unwrap(), before.incorrect_postures + 1);
    assert_eq!(stats["simulated_analyses"].as_i64().unwrap(), before.simulated_analyses + 1);

    let response = app
        .clone()
        .oneshot(get_as("/admin/videos", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let recent = body_json(response).await;
    let first = &recent["videos"][0];
    assert!(first["video_id"].as_str().unwrap().starts_with("#VID-"));

    let response = app
        .clone()
        .oneshot(get_as("/admin/users", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let users = body_json(response).await;
    assert!(users["users"].as_array().is_some());

    // Admins may read any user's data
    let response = app
        .oneshot(get_as(&format!("/video/user/{}", user.user_id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Music filter works against an empty or populated catalogue alike
    let music = ReportService::new(pool)
        .music_recommendations(Some("no-such-style"), 10)
        .await
        .unwrap();
    assert!(music.is_empty());
}
