mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::DateTime;
use serde_json::json;

fn gpa_draft() -> serde_json::Value {
    json!({
        "shortName": "gpa",
        "class": "Academic",
        "valueType": "INTEGER",
        "prompt": "What is your GPA?"
    })
}

#[tokio::test]
async fn create_then_list_round_trip() -> Result<()> {
    let app = common::spawn_app();
    let token = app.identity.seed_user("u1", &[]);

    let (status, created) =
        common::send(&app, "POST", "/questions", Some(&token), Some(gpa_draft())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(created["id"].is_string());
    assert_eq!(created["owner"], "u1");
    assert_eq!(created["shortName"], "gpa");
    assert_eq!(created["valueType"], "INTEGER");
    assert_eq!(created["createdAt"], created["updatedAt"]);

    let (status, listed) = common::send(&app, "GET", "/questions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().expect("array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);
    Ok(())
}

#[tokio::test]
async fn owners_never_see_each_others_questions() -> Result<()> {
    let app = common::spawn_app();
    let u1 = app.identity.seed_user("u1", &[]);
    let u2 = app.identity.seed_user("u2", &[]);

    let (status, _) =
        common::send(&app, "POST", "/questions", Some(&u1), Some(gpa_draft())).await;
    assert_eq!(status, StatusCode::CREATED);

    // Same short name under a different owner is not a conflict
    let (status, _) =
        common::send(&app, "POST", "/questions", Some(&u2), Some(gpa_draft())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = common::send(&app, "GET", "/questions", Some(&u2), None).await;
    let listed = listed.as_array().expect("array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["owner"], "u2");
    Ok(())
}

#[tokio::test]
async fn duplicate_short_name_is_a_conflict_for_the_same_owner() -> Result<()> {
    let app = common::spawn_app();
    let token = app.identity.seed_user("u1", &[]);

    let (status, _) =
        common::send(&app, "POST", "/questions", Some(&token), Some(gpa_draft())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        common::send(&app, "POST", "/questions", Some(&token), Some(gpa_draft())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "shortName");

    // Changing the short name lets the create succeed
    let mut renamed = gpa_draft();
    renamed["shortName"] = json!("weighted_gpa");
    let (status, _) =
        common::send(&app, "POST", "/questions", Some(&token), Some(renamed)).await;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_enumerated() -> Result<()> {
    let app = common::spawn_app();
    let token = app.identity.seed_user("u1", &[]);

    let (status, body) = common::send(
        &app,
        "POST",
        "/questions",
        Some(&token),
        Some(json!({ "shortName": "gpa" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");
    assert_eq!(body["missingFields"], json!(["class", "prompt", "valueType"]));
    Ok(())
}

#[tokio::test]
async fn malformed_short_names_are_rejected() -> Result<()> {
    let app = common::spawn_app();
    let token = app.identity.seed_user("u1", &[]);

    let mut draft = gpa_draft();
    draft["shortName"] = json!("my gpa");
    let (status, body) =
        common::send(&app, "POST", "/questions", Some(&token), Some(draft)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "shortName");
    Ok(())
}

#[tokio::test]
async fn updating_another_owners_question_reads_as_not_found() -> Result<()> {
    let app = common::spawn_app();
    let u1 = app.identity.seed_user("u1", &[]);
    let u2 = app.identity.seed_user("u2", &[]);

    let (_, created) =
        common::send(&app, "POST", "/questions", Some(&u1), Some(gpa_draft())).await;
    let id = created["id"].as_str().expect("id").to_string();

    let (status, body) = common::send(
        &app,
        "PUT",
        &format!("/questions/{id}"),
        Some(&u2),
        Some(gpa_draft()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Question not found");

    let (status, _) =
        common::send(&app, "DELETE", &format!("/questions/{id}"), Some(&u2), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The owner's record is untouched
    let (_, listed) = common::send(&app, "GET", "/questions", Some(&u1), None).await;
    assert_eq!(listed.as_array().expect("array").len(), 1);
    Ok(())
}

#[tokio::test]
async fn update_preserves_created_at() -> Result<()> {
    let app = common::spawn_app();
    let token = app.identity.seed_user("u1", &[]);

    let (_, created) =
        common::send(&app, "POST", "/questions", Some(&token), Some(gpa_draft())).await;
    let id = created["id"].as_str().expect("id").to_string();

    let mut draft = gpa_draft();
    draft["prompt"] = json!("What is your GPA at [college_name]?");
    let (status, updated) = common::send(
        &app,
        "PUT",
        &format!("/questions/{id}"),
        Some(&token),
        Some(draft),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_eq!(updated["prompt"], "What is your GPA at [college_name]?");

    let created_at = DateTime::parse_from_rfc3339(updated["createdAt"].as_str().unwrap())?;
    let updated_at = DateTime::parse_from_rfc3339(updated["updatedAt"].as_str().unwrap())?;
    assert!(updated_at >= created_at);
    Ok(())
}

#[tokio::test]
async fn renaming_onto_an_existing_short_name_is_a_conflict() -> Result<()> {
    let app = common::spawn_app();
    let token = app.identity.seed_user("u1", &[]);

    let (_, _) = common::send(&app, "POST", "/questions", Some(&token), Some(gpa_draft())).await;
    let mut second = gpa_draft();
    second["shortName"] = json!("class_rank");
    let (_, created) =
        common::send(&app, "POST", "/questions", Some(&token), Some(second)).await;
    let id = created["id"].as_str().expect("id").to_string();

    let (status, body) = common::send(
        &app,
        "PUT",
        &format!("/questions/{id}"),
        Some(&token),
        Some(gpa_draft()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "shortName");

    // Keeping its own short name is fine
    let mut keep = gpa_draft();
    keep["shortName"] = json!("class_rank");
    let (status, _) = common::send(
        &app,
        "PUT",
        &format!("/questions/{id}"),
        Some(&token),
        Some(keep),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn double_delete_reports_not_found() -> Result<()> {
    let app = common::spawn_app();
    let token = app.identity.seed_user("u1", &[]);

    let (_, created) =
        common::send(&app, "POST", "/questions", Some(&token), Some(gpa_draft())).await;
    let id = created["id"].as_str().expect("id").to_string();

    let (status, body) =
        common::send(&app, "DELETE", &format!("/questions/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Question deleted successfully");

    let (status, body) =
        common::send(&app, "DELETE", &format!("/questions/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Question not found");
    Ok(())
}

#[tokio::test]
async fn an_unparsable_id_reads_as_not_found() -> Result<()> {
    let app = common::spawn_app();
    let token = app.identity.seed_user("u1", &[]);

    let (status, _) = common::send(
        &app,
        "PUT",
        "/questions/definitely-not-an-id",
        Some(&token),
        Some(gpa_draft()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn listing_is_newest_first() -> Result<()> {
    let app = common::spawn_app();
    let token = app.identity.seed_user("u1", &[]);

    let (_, _) = common::send(&app, "POST", "/questions", Some(&token), Some(gpa_draft())).await;
    let mut second = gpa_draft();
    second["shortName"] = json!("essay_topic");
    second["valueType"] = json!("STRING");
    let (_, _) = common::send(&app, "POST", "/questions", Some(&token), Some(second)).await;

    let (_, listed) = common::send(&app, "GET", "/questions", Some(&token), None).await;
    let listed = listed.as_array().expect("array");
    assert_eq!(listed[0]["shortName"], "essay_topic");
    assert_eq!(listed[1]["shortName"], "gpa");
    Ok(())
}
