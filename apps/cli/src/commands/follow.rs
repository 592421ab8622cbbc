use podium_deck_client::{ClientConfig, FollowerView, Role, StreamConsumer, ViewerFollower};

pub struct Args {
    pub config: ClientConfig,
    pub total_slides: u32,
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let target = args.config.stream_target(Role::Viewer)?;
    let consumer = StreamConsumer::connect(target, args.config.reconnect);

    let follower = ViewerFollower::new(args.total_slides, args.config.reaction_ttl);
    let (mut view, handle) = follower.run(&consumer, args.config.sweep_interval);
    let mut status = consumer.watch_status();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                print_view(&view.borrow_and_update());
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                eprintln!("connection: {:?}", *status.borrow_and_update());
            }
        }
    }

    consumer.teardown().await;
    let _ = handle.await;
    Ok(())
}

fn print_view(view: &FollowerView) {
    let slide = view
        .slide
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let reactions: String = view.reactions.iter().map(|r| r.emoji.as_str()).collect();
    let marker = if view.following { "" } else { " (offline)" };
    println!("slide {slide}{marker} {reactions}");
}
