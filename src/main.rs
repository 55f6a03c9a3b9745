use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{anyhow, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use futures::executor::block_on;
use quotes_client::{
    app::{get_app_data, AppState},
    auth,
    config::Config,
    error::StoreError,
    filters::QuoteFilters,
    schema::{api::Quote, filters::SortBy},
    stats,
    store::LoadState,
    utils::preview,
};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "quotes", about = "Browse, write and vote on quotes", version = VERSION)]
struct Cli {
    /// Base URL of the quotes service
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the login session is kept
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List quotes, optionally filtered and sorted
    List {
        #[arg(long, default_value = "")]
        author: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Earliest creation date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest creation date, whole day included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// newest, oldest, mostVotes, leastVotes, authorAZ or authorZA
        #[arg(long, default_value_t = SortBy::Newest)]
        sort: SortBy,
    },
    Create {
        #[arg(long)]
        content: String,
        #[arg(long)]
        author: String,
    },
    /// Edit a quote that has no votes yet
    Edit {
        id: i32,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        author: Option<String>,
    },
    /// Delete a quote that has no votes yet
    Delete { id: i32 },
    /// Cast your one vote
    Vote {
        id: i32,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the service's vote count for a quote
    Count { id: i32 },
    Stats,
    Login {
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    Register {
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    Whoami,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(cli.api_url, cli.session_file);
    let app = get_app_data(config)?;
    block_on(run(&app, cli.command))
}

async fn run(app: &AppState, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List {
            author,
            content,
            from,
            to,
            sort,
        } => {
            load(app).await?;
            let mut filters = QuoteFilters::new();
            filters.set_author(author);
            filters.set_content(content);
            filters.set_dates(from, to);
            filters.set_sort_by(sort);
            let voted = app.store.user_voted_quote_id();
            let view = filters.view(&app.store);
            if view.is_empty() {
                println!("No quotes found.");
            }
            for quote in view {
                print_quote(quote, voted == Some(quote.id));
            }
            print_summary(&stats::summary(view));
        }
        Command::Create { content, author } => {
            let created = finish(app, app.store.create_quote(&content, &author).await)?;
            print_quote(&created, false);
        }
        Command::Edit {
            id,
            content,
            author,
        } => {
            load(app).await?;
            let mut quote = app
                .store
                .quote(id)
                .ok_or_else(|| anyhow!("No quote #{id}"))?;
            if let Some(content) = content {
                quote.content = content;
            }
            if let Some(author) = author {
                quote.author = author;
            }
            let updated = finish(app, app.store.update_quote(&quote).await)?;
            print_quote(&updated, false);
        }
        Command::Delete { id } => {
            load(app).await?;
            finish(app, app.store.delete_quote(id).await)?;
        }
        Command::Vote { id, yes } => {
            load(app).await?;
            let quote = app
                .store
                .quote(id)
                .ok_or_else(|| anyhow!("No quote #{id}"))?;
            finish(app, app.store.request_vote(id))?;
            let question = format!(
                "Vote for #{} \"{}\"? You only get one vote.",
                id,
                preview(&quote.content, stats::PREVIEW_CHARS)
            );
            if yes || confirm(&question)? {
                finish(app, app.store.confirm_vote().await)?;
                if let Some(quote) = app.store.quote(id) {
                    print_quote(&quote, true);
                }
            } else {
                app.store.cancel_vote();
                println!("Vote cancelled.");
            }
        }
        Command::Count { id } => {
            let count = finish(app, app.store.refresh_vote_count(id).await)?;
            println!("#{id}: {count} vote{}", plural(count.into()));
        }
        Command::Stats => {
            load(app).await?;
            let quotes = app.store.quotes();
            println!("Votes by author:");
            for row in stats::votes_by_author(&quotes) {
                println!("  {:<30} {}", row.author, row.votes);
            }
            println!("Quotes by author:");
            for row in stats::quotes_by_author(&quotes) {
                println!("  {:<30} {}", row.author, row.quotes);
            }
            println!("Votes by quote:");
            for row in stats::voted_quotes(&quotes) {
                println!("  #{:<5} {:<25} {}", row.id, row.label, row.votes);
            }
            println!("Total votes: {}", stats::total_votes(&quotes));
        }
        Command::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            let user = auth::login(app.gateway.as_ref(), &app.session, &username, &password).await?;
            println!("Logged in as {}.", user.username);
        }
        Command::Register { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            auth::register(app.gateway.as_ref(), &username, &password).await?;
            println!("Registered {username}. Log in with: quotes login {username}");
        }
        Command::Logout => {
            app.store.logout()?;
            println!("Logged out.");
        }
        Command::Whoami => match app.session.user() {
            Some(user) if app.session.is_authenticated() => println!("{}", user.username),
            _ => println!("Not logged in."),
        },
    }
    Ok(())
}

async fn load(app: &AppState) -> anyhow::Result<()> {
    if let Err(e) = app.store.load().await {
        if app.store.take_login_redirect() || app.store.load_state() == LoadState::LoginRequired {
            bail!("Please log in: quotes login <username>");
        }
        return Err(e.into());
    }
    Ok(())
}

/// Reports the store's feedback for an action and converts its outcome.
fn finish<T>(app: &AppState, result: Result<T, StoreError>) -> anyhow::Result<T> {
    if app.store.take_login_redirect() {
        bail!("Please log in: quotes login <username>");
    }
    if let Some(notice) = app.store.notification() {
        if !notice.is_error() {
            println!("{}", notice.text);
        }
        app.store.dismiss_notification();
    }
    Ok(result?)
}

fn print_quote(quote: &Quote, voted: bool) {
    let date = quote
        .created_at_utc()
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| quote.created_at.clone());
    println!(
        "#{:<5} \"{}\"\n       - {} ({}) [{} vote{}]{}",
        quote.id,
        quote.content,
        quote.author,
        date,
        quote.vote_count,
        plural(quote.vote_count.into()),
        if voted { " <- your vote" } else { "" }
    );
}

fn print_summary(summary: &stats::QuoteSummary) {
    if summary.total == 0 {
        return;
    }
    print!(
        "{} quote{} from {} author{}",
        summary.total,
        plural(summary.total as u64),
        summary.unique_authors,
        plural(summary.unique_authors as u64)
    );
    match &summary.most_quoted {
        Some(top) => println!("; most quoted: {} ({})", top.author, top.quotes),
        None => println!(),
    }
}

fn plural(n: u64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

fn confirm(question: &str) -> io::Result<bool> {
    let answer = prompt(&format!("{question} [y/N] "))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
