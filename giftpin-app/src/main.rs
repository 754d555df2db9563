//! giftpin
//!
//! Command-line client for PIN-protected gifts.
//!
//! Configuration comes from `GIFTPIN_*` environment variables (and `.env`);
//! see [`AppConfig`].

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use ethers::signers::{LocalWallet, Signer};
use serde::Serialize;
use tracing::info;

use giftpin_app::{
    cancel_gift, AdminDashboard, AppConfig, ClaimFlow, ClaimPhase, ClaimStep, CodeRegistry,
    CreateFlow, GiftCodeBook, GiftDetails, GiftDraft, UserActivity, WalletSession,
};
use giftpin_contract::{EvmTransport, GiftContractClient};
use giftpin_core::{
    decode_gift_id, encode_gift_id, format_ether_amount, parse_address, truncate_address,
    GiftId, GiftRecord,
};

#[derive(Parser)]
#[command(name = "giftpin", about = "Create and claim PIN-protected on-chain gifts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode or decode deterministic gift codes (no network access).
    #[command(subcommand)]
    Code(CodeCommand),
    /// Sign the consent message with the configured wallet.
    SignIn,
    /// Fund a new gift and print its share code and link.
    Create(CreateArgs),
    /// Show a gift by code, link or id.
    Show(ShowArgs),
    /// Claim a gift with its PIN.
    Claim(ClaimArgs),
    /// Gifts created and claimed by an account.
    Mine(MineArgs),
    /// Cancel an unclaimed gift you created.
    Cancel {
        /// Numeric gift id.
        id: u64,
    },
    /// Admin dashboard.
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand)]
enum CodeCommand {
    /// Render a gift id as a six-character code.
    Encode { id: u64 },
    /// Recover the gift id from a six-character code.
    Decode { code: String },
}

#[derive(Args)]
struct CreateArgs {
    /// Amount in ether, e.g. 0.1
    #[arg(long)]
    amount: String,
    /// PIN the recipient will need (at least 4 characters).
    #[arg(long)]
    pin: String,
    /// Optional message for the recipient.
    #[arg(long, default_value = "")]
    message: String,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ShowArgs {
    /// Gift code or claim link.
    #[arg(required_unless_present = "id")]
    code: Option<String>,
    /// Look up by numeric id instead.
    #[arg(long, conflicts_with = "code")]
    id: Option<u64>,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ClaimArgs {
    /// Gift code or claim link; read from stdin when omitted.
    code: Option<String>,
    #[arg(long)]
    pin: String,
}

#[derive(Args)]
struct MineArgs {
    /// Account to inspect; defaults to the configured wallet.
    #[arg(long)]
    account: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Admin address, platform statistics, balance and pause state.
    Overview {
        #[arg(long)]
        json: bool,
    },
    /// Toggle the emergency pause.
    Pause,
    /// Withdraw the contract balance.
    Withdraw { recipient: String },
    /// Transfer the admin role.
    ChangeAdmin { new_admin: String },
    /// Privileged view of one gift.
    Gift {
        id: u64,
        #[arg(long)]
        json: bool,
    },
    /// Privileged view of a range of gifts.
    Batch {
        #[arg(long)]
        start: u64,
        #[arg(long, default_value_t = 10)]
        count: u64,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "giftpin_app=info,giftpin_contract=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Codec utilities work offline.
    if let Commands::Code(command) = &cli.command {
        return run_code(command);
    }

    let config = AppConfig::from_env()?;
    info!(
        rpc = %config.rpc_url,
        contract = ?config.contract_address,
        scheme = %config.code_scheme,
        "Loaded configuration"
    );
    let client = config.connect()?;

    match cli.command {
        Commands::Code(_) => Ok(()),
        Commands::SignIn => sign_in(&config).await.map(|session| {
            if let Some(signature) = session.signature() {
                println!("Signed in as {:?}", session.address().unwrap_or_default());
                println!("Signature: 0x{}", signature);
            }
        }),
        Commands::Create(args) => create(&config, &client, args).await,
        Commands::Show(args) => show(&config, &client, args).await,
        Commands::Claim(args) => claim(&config, &client, args).await,
        Commands::Mine(args) => mine(&client, args).await,
        Commands::Cancel { id } => {
            let tx_hash = cancel_gift(&client, GiftId(id)).await?;
            println!("Gift {} cancelled in {:?}", id, tx_hash);
            Ok(())
        }
        Commands::Admin(command) => admin(&client, command).await,
    }
}

fn run_code(command: &CodeCommand) -> Result<()> {
    match command {
        CodeCommand::Encode { id } => println!("{}", encode_gift_id(GiftId(*id))),
        CodeCommand::Decode { code } => match decode_gift_id(code) {
            Some(id) => println!("{}", id),
            None => bail!("Invalid gift code: {}", code.trim()),
        },
    }
    Ok(())
}

fn open_book(config: &AppConfig) -> Result<GiftCodeBook> {
    let registry = CodeRegistry::open(&config.registry_path).with_context(|| {
        format!(
            "failed to open code registry {}",
            config.registry_path.display()
        )
    })?;
    Ok(GiftCodeBook::new(config.code_scheme, registry))
}

fn wallet(config: &AppConfig) -> Result<LocalWallet> {
    let key = config
        .private_key
        .as_deref()
        .context("GIFTPIN_PRIVATE_KEY must be set to use a wallet")?;
    let wallet = key
        .trim()
        .parse::<LocalWallet>()
        .context("Invalid private key")?;
    Ok(wallet.with_chain_id(config.chain_id))
}

async fn sign_in(config: &AppConfig) -> Result<WalletSession> {
    let wallet = wallet(config)?;
    let mut session = WalletSession::connected(wallet.address());
    session.sign_in(&wallet).await?;
    Ok(session)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn short(address: &giftpin_core::Address) -> String {
    truncate_address(&format!("{:?}", address), 6, 4)
}

fn print_gift(gift: &GiftRecord) {
    println!("Gift #{}", gift.id);
    println!("  Amount:  {} ETH", format_ether_amount(gift.amount));
    println!("  Creator: {}", short(&gift.creator));
    println!("  Created: {}", format_timestamp(gift.created_at));
    if !gift.message.is_empty() {
        println!("  Message: {}", gift.message);
    }
    match gift.claim {
        Some(claim) => println!(
            "  Claimed: by {} at {}",
            short(&claim.claimed_by),
            format_timestamp(claim.claimed_at)
        ),
        None => println!("  Status:  unclaimed"),
    }
}

async fn create(
    config: &AppConfig,
    client: &GiftContractClient<EvmTransport>,
    args: CreateArgs,
) -> Result<()> {
    let draft = GiftDraft::new(args.amount, args.pin, args.message);
    // Validate before asking the wallet for anything.
    draft.validate()?;

    let session = sign_in(config).await?;
    let mut book = open_book(config)?;
    let mut flow = CreateFlow::new(client, &mut book, &session, config.share_base_url.clone());

    let tx_hash = flow.submit(&draft).await?;
    println!("Transaction submitted: {:?}", tx_hash);
    println!("Waiting for confirmation...");
    let created = flow.confirm().await?;

    if args.json {
        return print_json(&created);
    }
    println!("Gift created!");
    println!("  Gift ID: {}", created.id);
    println!("  Amount:  {} ETH", created.amount_ether());
    println!("  Code:    {}", created.code);
    println!("  Link:    {}", created.link);
    println!("Share the code or link, and send the PIN separately.");
    Ok(())
}

async fn show(
    config: &AppConfig,
    client: &GiftContractClient<EvmTransport>,
    args: ShowArgs,
) -> Result<()> {
    let book = open_book(config)?;
    let id = match (args.id, args.code) {
        (Some(id), _) => GiftId(id),
        (None, Some(input)) => {
            let code = book.parse_code(&input)?;
            book.resolve(&code).with_context(|| {
                format!("Gift code {} is not known to the {} scheme", code, book.scheme())
            })?
        }
        (None, None) => bail!("Provide a gift code, link or --id"),
    };

    let details = GiftDetails::load(client, &book, &config.share_base_url, id).await?;
    if args.json {
        return print_json(&details);
    }
    print_gift(&details.gift);
    match (&details.code, &details.link) {
        (Some(code), Some(link)) => {
            println!("  Code:    {}", code);
            println!("  Link:    {}", link);
        }
        _ => println!("  No share code for this gift in the local registry"),
    }
    Ok(())
}

fn read_code_from_stdin() -> Result<String> {
    print!("Gift code or link: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn claim(
    config: &AppConfig,
    client: &GiftContractClient<EvmTransport>,
    args: ClaimArgs,
) -> Result<()> {
    let book = open_book(config)?;
    let mut flow = match args.code {
        Some(input) => ClaimFlow::open(client, &book, &input).await,
        None => {
            let mut flow = ClaimFlow::new(client, &book);
            let input = read_code_from_stdin()?;
            let _ = flow.submit_code(&input).await;
            flow
        }
    };
    if let Some(err) = flow.error() {
        bail!("{}", err);
    }

    if let ClaimStep::Claim {
        gift,
        phase: ClaimPhase::Claimed { .. },
        ..
    } = flow.step()
    {
        print_gift(gift);
        println!("This gift has already been claimed.");
        return Ok(());
    }

    if let Some(gift) = flow.gift() {
        println!(
            "Found gift #{} worth {} ETH",
            gift.id,
            format_ether_amount(gift.amount)
        );
    }
    flow.verify_pin(&args.pin).await?;
    println!("PIN verified.");

    let tx_hash = flow.submit_claim().await?;
    println!("Transaction submitted: {:?}", tx_hash);
    println!("Waiting for confirmation...");
    flow.confirm_claim().await?;

    if let Some(gift) = flow.gift() {
        println!(
            "Gift claimed! {} ETH is on its way to your wallet.",
            format_ether_amount(gift.amount)
        );
    }
    Ok(())
}

async fn mine(client: &GiftContractClient<EvmTransport>, args: MineArgs) -> Result<()> {
    let account = match args.account {
        Some(account) => parse_address(account.trim())?,
        None => client
            .account()
            .context("Pass --account or set GIFTPIN_PRIVATE_KEY")?,
    };
    let activity = UserActivity::load(client, account).await?;
    if args.json {
        return print_json(&activity);
    }

    println!("Account {}", short(&activity.account));
    println!("  Gifts created: {}", activity.created_count);
    for id in &activity.created {
        println!("    #{}", id);
    }
    println!("  Gifts claimed: {}", activity.claimed.len());
    for id in &activity.claimed {
        println!("    #{}", id);
    }
    Ok(())
}

async fn admin(client: &GiftContractClient<EvmTransport>, command: AdminCommand) -> Result<()> {
    let session = WalletSession::for_account(client.account());
    let dashboard = AdminDashboard::open(client, &session).await?;

    match command {
        AdminCommand::Overview { json } => {
            let overview = dashboard.overview().await?;
            if json {
                return print_json(&overview);
            }
            let stats = &overview.stats;
            println!("Admin:            {}", short(&overview.admin));
            println!("Paused:           {}", overview.paused);
            println!("Contract balance: {} ETH", format_ether_amount(overview.balance));
            println!("Gifts created:    {}", stats.total_gifts_created);
            println!("Gifts claimed:    {}", stats.total_gifts_claimed);
            println!("Unclaimed gifts:  {}", stats.unclaimed_gifts);
            println!("Value locked:     {} ETH", format_ether_amount(stats.total_value_locked));
            println!("Value claimed:    {} ETH", format_ether_amount(stats.total_value_claimed));
            println!("Creators:         {}", stats.total_creators);
            println!("Claimers:         {}", stats.total_claimers);
        }
        AdminCommand::Pause => {
            let paused = dashboard.toggle_pause().await?;
            println!(
                "Emergency pause {}",
                if paused { "enabled" } else { "disabled" }
            );
        }
        AdminCommand::Withdraw { recipient } => {
            let tx_hash = dashboard.emergency_withdraw(&recipient).await?;
            println!("Emergency withdraw confirmed: {:?}", tx_hash);
        }
        AdminCommand::ChangeAdmin { new_admin } => {
            let tx_hash = dashboard.change_admin(&new_admin).await?;
            println!("Admin changed: {:?}", tx_hash);
        }
        AdminCommand::Gift { id, json } => {
            let record = dashboard.gift(GiftId(id)).await?;
            if json {
                return print_json(&record);
            }
            print_gift(&record.record);
            println!("  PIN hash: {}", record.pin_hash);
        }
        AdminCommand::Batch { start, count, json } => {
            let records = dashboard.batch(GiftId(start), count).await?;
            if json {
                return print_json(&records);
            }
            if records.is_empty() {
                println!("No gifts in range");
            }
            for record in &records {
                print_gift(&record.record);
            }
        }
    }
    Ok(())
}
