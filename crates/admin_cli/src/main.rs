use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Currency, Engine, TransferCmd};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "minibank_admin")]
#[command(about = "Admin utilities for Minibank (accounts and manual transfers)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./minibank.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Account(Account),
    Transfer(TransferArgs),
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
    Show(AccountShowArgs),
    List(AccountListArgs),
    /// Overwrite a balance without writing ledger entries.
    SetBalance(AccountSetBalanceArgs),
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long, default_value = "EUR")]
    currency: String,
}

#[derive(Args, Debug)]
struct AccountShowArgs {
    id: i64,
}

#[derive(Args, Debug)]
struct AccountListArgs {
    #[arg(long, default_value_t = 0)]
    offset: u64,
    #[arg(long, default_value_t = 20)]
    limit: u64,
}

#[derive(Args, Debug)]
struct AccountSetBalanceArgs {
    id: i64,
    balance: i64,
}

#[derive(Args, Debug)]
struct TransferArgs {
    #[arg(long)]
    from: i64,
    #[arg(long)]
    to: i64,
    /// Amount in minor units.
    #[arg(long)]
    amount: i64,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_account(account: &engine::Account) {
    println!(
        "#{} {} {} {}",
        account.id, account.owner, account.balance, account.currency
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Account(Account { command }) => match command {
            AccountCommand::Create(args) => {
                let currency = match Currency::try_from(args.currency.as_str()) {
                    Ok(v) => v,
                    Err(err) => {
                        eprintln!("{err}");
                        std::process::exit(2);
                    }
                };
                let account = engine.create_account(&args.owner, currency).await?;
                println!("created account: {}", account.id);
            }
            AccountCommand::Show(args) => {
                print_account(&engine.account(args.id).await?);
            }
            AccountCommand::List(args) => {
                for account in engine.list_accounts(args.offset, args.limit).await? {
                    print_account(&account);
                }
            }
            AccountCommand::SetBalance(args) => {
                print_account(&engine.update_account(args.id, args.balance).await?);
            }
        },
        Command::Transfer(args) => {
            let result = engine
                .transfer(TransferCmd::new(args.from, args.to, args.amount))
                .await?;
            println!("created transfer: {}", result.transfer.id);
            print_account(&result.from_account);
            print_account(&result.to_account);
        }
    }

    Ok(())
}
