//! # Referral Board CLI
//!
//! Terminal front end for the referral board.
//!
//! ## Local State
//!
//! - Votes cast from this machine live in `<data dir>/refr-votes.json`
//! - Deleting that file lets this machine vote again, nothing else tracks it
//!
//! ## Remote State
//!
//! - Every referral lives in the store service (`refr` binary)
//! - Each command fetches the full list first, there is no cache
use std::{future::Future, path::Path, time::Duration};

use anyhow::Context;
use board::{Board, FileStorage, ReferralDraft, VoteDirection};
use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};

pub mod remote;
pub mod render;

use remote::HttpStore;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Browse referral codes
    List {
        /// Only show codes for this app
        #[arg(long)]
        app: Option<String>,

        /// Include codes flagged by the community
        #[arg(long)]
        show_hidden: bool,
    },

    /// Apps that have at least one code
    Apps,

    /// Share a referral code
    Submit {
        #[arg(long)]
        app: String,

        #[arg(long)]
        code: String,

        #[arg(long)]
        link: Option<String>,

        /// Short note, up to 200 characters
        #[arg(long)]
        description: Option<String>,
    },

    /// Say whether a code worked
    Vote {
        id: String,

        /// `up` or `down`
        direction: VoteDirection,
    },
}

pub async fn run(store_url: &str, data_dir: &Path, command: Command) -> anyhow::Result<()> {
    let store = HttpStore::new(store_url).context("Invalid store url")?;
    let board = Board::new(store, FileStorage::new(data_dir));

    match command {
        Command::List { app, show_hidden } => {
            with_spinner("Fetching referrals", board.initialize()).await?;

            let visibility = board.get_visible(app.as_deref(), show_hidden);
            print!(
                "{}",
                render::listing(&visibility, show_hidden, app.is_some(), |id| {
                    board.user_vote_for(id)
                })
            );
            println!("{} codes shared", board.total_codes());
        }
        Command::Apps => {
            with_spinner("Fetching referrals", board.initialize()).await?;

            print!("{}", render::apps(&board.referrals()));
        }
        Command::Submit {
            app,
            code,
            link,
            description,
        } => {
            let draft = ReferralDraft {
                app_name: app,
                code,
                referral_link: link,
                description,
            };
            let referral = with_spinner("Adding referral", board.submit(draft)).await?;

            println!("Referral code added!\n");
            print!("{}", render::card(&referral, None));
        }
        Command::Vote { id, direction } => {
            with_spinner("Fetching referrals", board.initialize()).await?;
            with_spinner("Recording vote", board.vote(&id, direction)).await?;

            println!("{}\n", render::vote_thanks(direction));
            if let Some(referral) = board.referral(&id) {
                print!("{}", render::card(&referral, board.user_vote_for(&id)));
            }
        }
    }

    Ok(())
}

async fn with_spinner<T, E>(
    message: &'static str,
    task: impl Future<Output = Result<T, E>>,
) -> anyhow::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));

    let result = task.await;
    pb.finish_and_clear();

    Ok(result?)
}
