use clap::{Parser, Subcommand};
use form3::{Account, Client, ListOptions, NewAccountAttributes};
use std::error::Error;

#[derive(Debug, Parser)]
#[command(name = "form3-accounts", about = "CLI wrapper for the Form3 accounts API")]
struct Cli {
    /// API root, e.g. http://localhost:8080/v1
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create an account; a random id is generated when none is given
    Create {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        organisation_id: String,
        #[arg(long)]
        bank_id: String,
        #[arg(long)]
        bank_id_code: String,
        #[arg(long)]
        bic: String,
        /// ISO 3166-1 country code
        #[arg(long)]
        country: String,
        /// Account holder name; repeat for multiple lines
        #[arg(long)]
        name: Vec<String>,
        #[arg(long)]
        account_number: Option<String>,
        #[arg(long)]
        iban: Option<String>,
    },
    /// Fetch a single account
    Fetch {
        #[arg(long)]
        id: String,
    },
    /// Delete an account at the given version
    Delete {
        #[arg(long)]
        id: String,
        #[arg(long, default_value_t = 0)]
        version: u64,
    },
    /// List accounts, following next links
    List {
        #[arg(long)]
        page_size: Option<u64>,
        /// Stop after this many pages
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let mut client = Client::new()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        client = client.with_base_url(base_url)?;
    }
    let accounts = client.accounts();

    match cli.command {
        Commands::Create {
            id,
            organisation_id,
            bank_id,
            bank_id_code,
            bic,
            country,
            name,
            account_number,
            iban,
        } => {
            let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let attributes = NewAccountAttributes {
                bank_id,
                bank_id_code,
                bic,
                country,
                name,
                account_number,
                iban,
                ..Default::default()
            };
            let created = accounts.create(&id, &organisation_id, attributes).await?;
            print_account(&created.data);
        }
        Commands::Fetch { id } => {
            let fetched = accounts.fetch(&id).await?;
            print_account(&fetched.data);
        }
        Commands::Delete { id, version } => {
            accounts.delete(&id, version).await?;
            println!("Deleted account {id} at version {version}");
        }
        Commands::List { page_size, pages } => {
            let mut page = accounts
                .list(ListOptions {
                    page_number: Some(0),
                    page_size,
                })
                .await?;
            let mut remaining = pages;
            loop {
                for account in &page.data {
                    print_account(account);
                }
                remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    break;
                }
                match accounts.next_page(&page.links).await? {
                    Some(next) => page = next,
                    None => break,
                }
            }
        }
    }

    Ok(())
}

fn print_account(account: &Account) {
    let version = account
        .version
        .map_or_else(|| "-".to_string(), |v| v.to_string());
    let country = account
        .attributes
        .as_ref()
        .and_then(|a| a.country.as_deref())
        .unwrap_or("-");
    println!(
        "{} | org {} | {} | version {}",
        account.id, account.organisation_id, country, version
    );
}
