use clap::Parser;
use miette::Result;

use critic_core::{CriticConfig, TriggerEvent};
use critic_review::git::GitCli;
use critic_review::github::GitHubClient;
use critic_review::llm::LlmClient;
use critic_review::runner::{self, Outcome};

#[derive(Parser)]
#[command(
    name = "critic",
    version,
    about = "Review a pull request's diff with a language model and post the result",
    long_about = "Review a pull request's diff with a language model and post the result.\n\n\
                   Meant to run as a CI step on pull_request events. Takes no arguments;\n\
                   everything comes from the environment:\n  \
                     GITHUB_EVENT_PATH  event payload (set by GitHub Actions)\n  \
                     GEMINI_API_KEY     backend credential (OPENAI_API_KEY for provider = \"openai\")\n  \
                     GITHUB_TOKEN       token allowed to comment on the pull request\n  \
                     GITHUB_API_URL     API base for GitHub Enterprise (optional)\n  \
                     CRITIC_CONFIG      config file (default: .critic.toml if present)\n  \
                     CRITIC_LOG         log filter (default: info)"
)]
struct Cli {}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))?;
    human_panic::setup_panic!();
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("CRITIC_LOG", "info"))
        .format_timestamp(None)
        .init();

    let _cli = Cli::parse();

    let event = TriggerEvent::from_env()?;
    log::info!(
        "reviewing {}#{} ({}...{})",
        event.repo_full_name,
        event.number,
        event.base_sha,
        event.head_sha
    );
    let config = CriticConfig::load()?;

    let git = GitCli::new(".", config.review.on_diff_failure);
    let outcome = runner::run(&event, &git, &config.review.banner, || {
        let llm = LlmClient::new(&config.llm)?;
        log::info!("requesting review from {} ({})", llm.provider(), llm.model());
        let github = GitHubClient::new(&config.github)?;
        Ok((llm, github))
    })
    .await?;

    match outcome {
        Outcome::NoDiff => println!("No diff to review."),
        Outcome::Posted(_) => println!("Review posted."),
    }
    Ok(())
}
