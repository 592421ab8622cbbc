use podium_deck_client::{ClientConfig, ClientError, HttpReactionEndpoint, ReactionSender};

pub struct Args {
    pub config: ClientConfig,
    pub emoji: Vec<String>,
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let endpoint = HttpReactionEndpoint::from_config(reqwest::Client::new(), &args.config)?;
    let sender = ReactionSender::new(endpoint, args.config.reaction_window);

    for emoji in &args.emoji {
        let reaction = match sender.send(emoji).await {
            Err(ClientError::RateLimited(wait)) => {
                tokio::time::sleep(wait).await;
                sender.send(emoji).await?
            }
            other => other?,
        };
        println!("{} {}", reaction.emoji, reaction.id);
    }

    Ok(())
}
