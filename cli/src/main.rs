use std::process::ExitCode;
use std::sync::Arc;

use bookshare::{
    ApiError, BookDraft, BookId, BookshareClient, ClientConfig, ErrorCode, FavouriteId, Navigator, View,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("invalid JSON output: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("book {0} is not a favourite")]
    NotFavourite(BookId),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::Api(e) => e.error_code(),
            Self::InvalidJson(_) => "E_CLI_JSON",
            Self::NotFavourite(_) => "E_CLI_NOT_FAVOURITE",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "bookshare", about = "Bookshare API client")]
struct Cli {
    #[arg(long, env = "BOOKSHARE_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "BOOKSHARE_SESSION_FILE")]
    session_file: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        username: String,
        #[arg(long, env = "BOOKSHARE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        username: String,
        email: String,
        #[arg(long, env = "BOOKSHARE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    Books(BooksCommand),
    Favourites(FavouritesCommand),
}

#[derive(Args, Debug)]
struct BooksCommand {
    #[command(subcommand)]
    command: BooksSubcommand,
}

#[derive(Subcommand, Debug)]
enum BooksSubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Create {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Update {
        id: u64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
    Delete {
        id: u64,
    },
}

#[derive(Args, Debug)]
struct FavouritesCommand {
    #[command(subcommand)]
    command: FavouritesSubcommand,
}

#[derive(Subcommand, Debug)]
enum FavouritesSubcommand {
    List,
    Add {
        book_id: u64,
    },
    Remove {
        book_id: Option<u64>,
        #[arg(long, conflicts_with = "book_id", required_unless_present = "book_id")]
        record: Option<u64>,
    },
}

/// Prints where the user would be sent. A one-shot process cannot navigate,
/// so the redirect becomes a hint on stderr.
struct TerminalNavigator {
    login_path: String,
}

impl Navigator for TerminalNavigator {
    fn redirect_to(&self, path: &str) {
        if path == self.login_path {
            eprintln!("signed out; run `bookshare login <username>` to continue");
        } else {
            eprintln!("next: {path}");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {e}", e.code());
            ExitCode::FAILURE
        }
    }
}

fn build_client(cli: &Cli) -> Result<BookshareClient, CliError> {
    let mut config = ClientConfig::from_env();
    if let Some(base_url) = &cli.base_url {
        config = config.with_api_base_url(base_url);
    }
    if let Some(path) = &cli.session_file {
        config = config.with_session_file(path);
    }
    let navigator = Arc::new(TerminalNavigator { login_path: config.login_path.clone() });
    Ok(BookshareClient::from_config(config, navigator)?)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let client = build_client(&cli)?;
    match cli.command {
        Command::Login { username, password } => {
            let next = client.auth().login(&username, &password).await?;
            print_json(&json!({ "logged_in": username, "next": view_path(&client, next) }))
        }
        Command::Register { username, email, password } => {
            let next = client.auth().register(&username, &email, &password).await?;
            print_json(&json!({ "registered": username, "next": view_path(&client, next) }))
        }
        Command::Logout => {
            client.auth().logout()?;
            print_json(&json!({ "logged_out": true }))
        }
        Command::Whoami => print_json(&client.auth().current_user().await?),
        Command::Books(books) => run_books(&client, books).await,
        Command::Favourites(favourites) => run_favourites(&client, favourites).await,
    }
}

async fn run_books(client: &BookshareClient, books: BooksCommand) -> Result<(), CliError> {
    match books.command {
        BooksSubcommand::List { search } => print_json(&client.books().list(search.as_deref()).await?),
        BooksSubcommand::Create { title, description } => {
            let book = client.books().create(&BookDraft::new(title, description)).await?;
            print_json(&book)
        }
        BooksSubcommand::Update { id, title, description } => {
            let book = client
                .books()
                .update(BookId(id), &BookDraft::new(title, description))
                .await?;
            print_json(&book)
        }
        BooksSubcommand::Delete { id } => {
            client.books().delete(BookId(id)).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

async fn run_favourites(client: &BookshareClient, favourites: FavouritesCommand) -> Result<(), CliError> {
    let favs = client.favourites();
    match favourites.command {
        FavouritesSubcommand::List => print_json(&favs.refresh().await?),
        FavouritesSubcommand::Add { book_id } => {
            favs.refresh().await?;
            let record = favs.add(BookId(book_id)).await?;
            print_json(&json!({ "book": book_id, "favourite": record }))
        }
        FavouritesSubcommand::Remove { record: Some(record), .. } => {
            favs.remove_record(FavouriteId(record)).await?;
            print_json(&json!({ "removed_favourite": record }))
        }
        FavouritesSubcommand::Remove { book_id, record: None } => {
            let book_id = BookId(book_id.unwrap_or_default());
            favs.refresh().await?;
            if !favs.remove(book_id).await? {
                return Err(CliError::NotFavourite(book_id));
            }
            print_json(&json!({ "removed_book": book_id }))
        }
    }
}

fn view_path(client: &BookshareClient, view: View) -> String {
    view.path(client.config()).to_owned()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
