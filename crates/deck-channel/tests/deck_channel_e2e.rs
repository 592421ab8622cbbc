mod common;

use std::time::Duration;

use common::{TOKEN, connect_viewer, next_event, post_slide, start_server, test_config};
use deck_channel::{DeckRegistry, StreamEvent};

#[tokio::test]
async fn viewer_gets_init_then_live_slides() {
    let addr = start_server(test_config()).await;
    let mut ws = connect_viewer(addr, "keynote").await;

    assert_eq!(next_event(&mut ws).await, StreamEvent::Init { slide: 0 });

    let res = post_slide(addr, "keynote", 3, Some(TOKEN)).await;
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    insta::assert_snapshot!(body.to_string(), @r#"{"slide":3}"#);

    assert_eq!(
        next_event(&mut ws).await,
        StreamEvent::SlideChange { slide: 3 }
    );

    let mut late = connect_viewer(addr, "keynote").await;
    assert_eq!(next_event(&mut late).await, StreamEvent::Init { slide: 3 });

    let _ = ws.close(None).await;
    let _ = late.close(None).await;
}

#[tokio::test]
async fn slide_without_token_is_unauthorized() {
    let addr = start_server(test_config()).await;

    let res = post_slide(addr, "keynote", 1, None).await;
    assert_eq!(res.status(), 401);
    let body: serde_json::Value = res.json().await.unwrap();
    insta::assert_snapshot!(
        body.to_string(),
        @r#"{"error":{"code":"unauthorized","message":"presenter role required"}}"#
    );

    let res = post_slide(addr, "keynote", 1, Some("wrong")).await;
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn out_of_range_and_bad_deck_id_are_rejected() {
    let addr = start_server(test_config()).await;

    let res = post_slide(addr, "keynote", 20, Some(TOKEN)).await;
    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "validation_failed");

    let res = post_slide(addr, "bad.deck", 1, Some(TOKEN)).await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn presenter_stream_requires_token() {
    let addr = start_server(test_config()).await;

    let url = format!("ws://{addr}/decks/keynote/ws?role=presenter");
    assert!(tokio_tungstenite::connect_async(&url).await.is_err());

    let mut req = tokio_tungstenite::tungstenite::client::IntoClientRequest::into_client_request(
        url.as_str(),
    )
    .unwrap();
    req.headers_mut()
        .insert("authorization", format!("Bearer {TOKEN}").parse().unwrap());
    let (mut ws, _) = tokio_tungstenite::connect_async(req).await.unwrap();
    assert_eq!(next_event(&mut ws).await, StreamEvent::Init { slide: 0 });

    let status: serde_json::Value = reqwest::get(format!("http://{addr}/decks/keynote"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["presenters"], 1);
    assert_eq!(status["viewers"], 0);

    let _ = ws.close(None).await;
}

#[tokio::test]
async fn reactions_reach_every_viewer() {
    let addr = start_server(test_config()).await;
    let mut a = connect_viewer(addr, "party").await;
    let mut b = connect_viewer(addr, "party").await;
    next_event(&mut a).await;
    next_event(&mut b).await;

    let res = reqwest::Client::new()
        .post(format!("http://{addr}/decks/party/reactions"))
        .json(&serde_json::json!({ "emoji": "🎉" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 202);
    let reaction: deck_channel::Reaction = res.json().await.unwrap();

    for ws in [&mut a, &mut b] {
        match next_event(ws).await {
            StreamEvent::Reaction { id, emoji, .. } => {
                assert_eq!(id, reaction.id);
                assert_eq!(emoji, "🎉");
            }
            other => panic!("expected reaction, got {other:?}"),
        }
    }

    let res = reqwest::Client::new()
        .post(format!("http://{addr}/decks/party/reactions"))
        .json(&serde_json::json!({ "emoji": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn status_is_not_found_until_deck_is_used() {
    let registry = DeckRegistry::new(8, 20);
    let addr = start_server(test_config().with_registry(registry.clone())).await;

    let res = reqwest::get(format!("http://{addr}/decks/fresh")).await.unwrap();
    assert_eq!(res.status(), 404);

    let res = post_slide(addr, "fresh", 2, Some(TOKEN)).await;
    assert_eq!(res.status(), 200);

    let snapshot = registry
        .snapshot(&deck_channel::DeckId::new("fresh").unwrap())
        .unwrap();
    assert_eq!(snapshot.slide, 2);

    let body = reqwest::get(format!("http://{addr}/decks/fresh"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    insta::assert_snapshot!(
        body,
        @r#"{"deck_id":"fresh","slide":2,"viewers":0,"presenters":0}"#
    );
}

#[tokio::test]
async fn closing_the_socket_unsubscribes() {
    let registry = DeckRegistry::new(8, 20);
    let addr = start_server(test_config().with_registry(registry.clone())).await;
    let deck = deck_channel::DeckId::new("bye").unwrap();

    let mut ws = connect_viewer(addr, "bye").await;
    next_event(&mut ws).await;
    assert_eq!(registry.snapshot(&deck).unwrap().viewers, 1);

    ws.close(None).await.unwrap();
    drop(ws);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while registry.snapshot(&deck).unwrap().viewers != 0 {
        assert!(tokio::time::Instant::now() < deadline, "viewer never left");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn sse_stream_starts_with_init() {
    let addr = start_server(test_config()).await;
    post_slide(addr, "sse", 4, Some(TOKEN)).await;

    let mut res = reqwest::get(format!("http://{addr}/decks/sse/events"))
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let chunk = tokio::time::timeout(common::TIMEOUT, res.chunk())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let text = String::from_utf8_lossy(&chunk);
    assert!(text.contains("event: init"), "{text}");
    assert!(text.contains(r#"data: {"type":"init","slide":4}"#), "{text}");
}
