use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
use shared::{
    domain::{ChoiceId, UserId},
    protocol::{ChoiceDetail, VotePayload},
};
use tokio::net::TcpListener;

use super::*;

async fn presentation_slides(Path(presentation_id): Path<i64>) -> Json<PresentationSlides> {
    Json(PresentationSlides {
        presentation_id: PresentationId(presentation_id),
        host_id: UserId(7),
        code: "483920".to_string(),
        slide_ids: vec![SlideId(1), SlideId(2)],
    })
}

async fn slide_detail(Path(slide_id): Path<i64>) -> Result<Json<SlideDetail>, StatusCode> {
    if slide_id == 404 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(SlideDetail {
        slide_id: SlideId(slide_id),
        question: "Ship it?".to_string(),
        choices: vec![ChoiceDetail {
            choice_id: ChoiceId(11),
            content: "Yes".to_string(),
            votes: vec![VotePayload {
                voter_id: UserId(3),
                cast_at: "2024-01-01T00:00:00Z".parse().expect("timestamp"),
            }],
        }],
    }))
}

async fn spawn_presentation_server() -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route(
            "/presentations/:presentation_id/slides",
            get(presentation_slides),
        )
        .route("/slides/:slide_id/host", get(slide_detail));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn fetches_the_slide_sequence_for_a_presentation() {
    let server_url = spawn_presentation_server().await.expect("spawn server");
    let directory = HttpSlideDirectory::new(server_url);

    let slides = directory
        .fetch_slide_sequence(PresentationId(77))
        .await
        .expect("fetch");

    assert_eq!(slides.presentation_id, PresentationId(77));
    assert_eq!(slides.host_id, UserId(7));
    assert_eq!(slides.code, "483920");
    assert_eq!(slides.slide_ids, vec![SlideId(1), SlideId(2)]);
}

#[tokio::test]
async fn fetches_the_host_detail_with_recorded_votes() {
    let server_url = spawn_presentation_server().await.expect("spawn server");
    let directory = HttpSlideDirectory::new(server_url);

    let detail = directory.fetch_slide_detail(SlideId(2)).await.expect("fetch");

    assert_eq!(detail.slide_id, SlideId(2));
    assert_eq!(detail.question, "Ship it?");
    assert_eq!(detail.choices.len(), 1);
    assert_eq!(detail.choices[0].votes[0].voter_id, UserId(3));
}

#[tokio::test]
async fn missing_slide_surfaces_an_http_error() {
    let server_url = spawn_presentation_server().await.expect("spawn server");
    let directory = HttpSlideDirectory::new(server_url);

    let err = directory
        .fetch_slide_detail(SlideId(404))
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("404"), "unexpected error: {err}");
}

#[tokio::test]
async fn missing_directory_refuses_every_fetch() {
    let directory = MissingSlideDirectory;

    assert!(directory
        .fetch_slide_sequence(PresentationId(1))
        .await
        .is_err());
    assert!(directory.fetch_slide_detail(SlideId(1)).await.is_err());
}
