use std::net::SocketAddr;
use std::time::Duration;

use podium_deck_channel::DeckChannelConfig;
use deck_client::{
    ClientConfig, ConnectionStatus, DeckId, HttpControlEndpoint, HttpReactionEndpoint,
    PresenterPublisher, PublishStatus, ReactionSender, ReconnectPolicy, Role, StreamConsumer,
    StreamEvent, ViewerFollower,
};

const TOKEN: &str = "e2e-token";
const TIMEOUT: Duration = Duration::from_secs(3);

async fn serve(listener: tokio::net::TcpListener) {
    let config = DeckChannelConfig::new(&podium_deck_channel::Env::default()).with_control_token(TOKEN);
    axum::serve(listener, podium_deck_channel::router(config))
        .await
        .unwrap();
}

async fn start_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener));
    addr
}

fn client_config(addr: SocketAddr) -> ClientConfig {
    ClientConfig::new(format!("http://{addr}"), DeckId::new("e2e").unwrap())
        .with_control_token(TOKEN)
        .with_reconnect(ReconnectPolicy::new(
            Duration::from_millis(50),
            Duration::from_millis(200),
        ))
}

async fn poll_first<T>(mut f: impl FnMut() -> Option<T>, timeout: Duration) -> T {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(v) = f() {
            return v;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out within {timeout:?}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn viewer_follows_presenter_and_reactions() {
    let addr = start_server().await;
    let config = client_config(addr);
    let http = reqwest::Client::new();

    let consumer = StreamConsumer::connect(
        config.stream_target(Role::Viewer).unwrap(),
        config.reconnect,
    );
    let log = consumer.events().clone();

    poll_first(|| (!log.is_empty()).then_some(()), TIMEOUT).await;
    assert_eq!(log.since(0), vec![StreamEvent::Init { slide: 0 }]);
    assert!(consumer.is_connected());

    let (view, follower) = ViewerFollower::new(10, config.reaction_ttl)
        .run(&consumer, config.sweep_interval);

    let publisher = PresenterPublisher::spawn(
        Role::Presenter,
        HttpControlEndpoint::from_config(http.clone(), &config).unwrap(),
        config.publish_debounce,
    );
    publisher.set_slide(2);
    publisher.set_slide(1);

    poll_first(|| (log.len() >= 2).then_some(()), TIMEOUT).await;
    assert_eq!(log.since(1), vec![StreamEvent::SlideChange { slide: 1 }]);
    poll_first(
        || (publisher.status() == PublishStatus::Published(1)).then_some(()),
        TIMEOUT,
    )
    .await;

    let sender = ReactionSender::new(
        HttpReactionEndpoint::from_config(http, &config).unwrap(),
        config.reaction_window,
    );
    let sent = sender.send("👏").await.unwrap();
    assert!(matches!(
        sender.send("👏").await,
        Err(deck_client::ClientError::RateLimited(_))
    ));

    let shown = poll_first(
        || {
            let view = view.borrow();
            (view.slide == Some(1) && !view.reactions.is_empty()).then(|| view.clone())
        },
        TIMEOUT,
    )
    .await;
    assert!(shown.following);
    assert_eq!(shown.reactions.len(), 1);
    assert_eq!(shown.reactions[0].id, sent.id);

    consumer.teardown().await;
    assert_eq!(consumer.status(), ConnectionStatus::Closed);
    tokio::time::timeout(TIMEOUT, follower).await.unwrap().unwrap();
    assert!(!view.borrow().following);
}

#[tokio::test]
async fn viewer_publisher_is_inert() {
    let addr = start_server().await;
    let config = client_config(addr);

    let publisher = PresenterPublisher::spawn(
        Role::Viewer,
        HttpControlEndpoint::from_config(reqwest::Client::new(), &config).unwrap(),
        config.publish_debounce,
    );
    publisher.set_slide(5);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(publisher.status(), PublishStatus::Idle);
}

#[tokio::test]
async fn wrong_token_surfaces_unauthorized() {
    let addr = start_server().await;
    let mut config = client_config(addr);
    config.control_token = Some("wrong".to_string());

    let publisher = PresenterPublisher::spawn(
        Role::Presenter,
        HttpControlEndpoint::from_config(reqwest::Client::new(), &config).unwrap(),
        config.publish_debounce,
    );
    publisher.set_slide(1);

    poll_first(
        || (publisher.status() == PublishStatus::Unauthorized).then_some(()),
        TIMEOUT,
    )
    .await;
}

#[tokio::test]
async fn consumer_connects_once_server_comes_up() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = client_config(addr);
    let consumer = StreamConsumer::connect(
        config.stream_target(Role::Viewer).unwrap(),
        config.reconnect,
    );

    poll_first(
        || matches!(consumer.status(), ConnectionStatus::Reconnecting { .. }).then_some(()),
        TIMEOUT,
    )
    .await;

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    tokio::spawn(serve(listener));

    poll_first(|| consumer.is_connected().then_some(()), TIMEOUT).await;
    let log = consumer.events().clone();
    poll_first(|| (!log.is_empty()).then_some(()), TIMEOUT).await;
    assert_eq!(log.since(0), vec![StreamEvent::Init { slide: 0 }]);

    consumer.teardown().await;
    consumer.teardown().await;
    assert_eq!(consumer.status(), ConnectionStatus::Closed);
}
