use tokio::io::{AsyncBufReadExt, BufReader};

use podium_deck_client::{
    ClientConfig, ClientError, HttpControlEndpoint, HttpReactionEndpoint, PresenterPublisher,
    ReactionSender, Role,
};

pub struct Args {
    pub config: ClientConfig,
    pub start: u32,
    pub total_slides: u32,
}

pub enum Command {
    Next,
    Prev,
    Goto(u32),
    React(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        match line {
            "n" | "next" => Some(Self::Next),
            "p" | "prev" => Some(Self::Prev),
            _ => {
                if let Some(emoji) = line.strip_prefix("r ") {
                    return Some(Self::React(emoji.trim().to_string()));
                }
                line.parse().ok().map(Self::Goto)
            }
        }
    }
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let control = HttpControlEndpoint::from_config(client.clone(), &args.config)?;
    let reactions = ReactionSender::new(
        HttpReactionEndpoint::from_config(client, &args.config)?,
        args.config.reaction_window,
    );

    let publisher = PresenterPublisher::spawn(Role::Presenter, control, args.config.publish_debounce);
    let mut status = publisher.watch_status();

    let last = args.total_slides.saturating_sub(1);
    let mut slide = args.start.min(last);
    publisher.set_slide(slide);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                eprintln!("publish: {:?}", *status.borrow_and_update());
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Some(Command::Next) => slide = (slide + 1).min(last),
                    Some(Command::Prev) => slide = slide.saturating_sub(1),
                    Some(Command::Goto(n)) => slide = n.min(last),
                    Some(Command::React(emoji)) => {
                        match reactions.send(&emoji).await {
                            Ok(_) => {}
                            Err(ClientError::RateLimited(wait)) => {
                                eprintln!("slow down, retry in {}ms", wait.as_millis());
                            }
                            Err(e) => eprintln!("reaction failed: {e}"),
                        }
                        continue;
                    }
                    None => {
                        eprintln!("unknown command: {line}");
                        continue;
                    }
                }
                println!("slide {slide}");
                publisher.set_slide(slide);
            }
        }
    }

    publisher.shutdown().await;
    Ok(())
}
