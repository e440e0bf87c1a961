use anyhow::{bail, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use mintix_imagegen::{ImageGenClient, ImageGenConfig, ImageGenError};
use mintix_indexer::{IndexerClient, IndexerConfig, PinningClient, PinningConfig, DEFAULT_IPFS_GATEWAY};
use mintix_market::{
    mint_nft, reconcile_unit, ListingStatus, MarketConfig, Marketplace, MarketplaceValidator,
    MintRequest,
};
use mintix_primitives::{format_ada, parse_ada, Address, Network, TxHash, Unit};
use mintix_wallet::{FileSessionStore, SoftwareWallet, WalletRegistry, WalletSession};

/// Demo project id for the public preprod indexer.
const DEFAULT_PREPROD_PROJECT_ID: &str = "preprodKdtH4a7FVm5TDPfxWQBXqDquliI6mFlk";

// Slot number = unix time minus the network's Shelley start.
const PREPROD_SLOT_UNIX_OFFSET: u64 = 1_655_683_200;
const MAINNET_SLOT_UNIX_OFFSET: u64 = 1_591_566_291;

#[derive(Parser)]
#[command(name = "mintix")]
#[command(about = "Mintix NFT marketplace client")]
struct Cli {
    /// State directory (keystore and session)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Use mainnet instead of the preprod testnet
    #[arg(long)]
    mainnet: bool,

    /// Indexer project id
    #[arg(long, env = "MINTIX_PROJECT_ID")]
    project_id: Option<String>,

    /// Marketplace fee address (defaults to the preprod deployment)
    #[arg(long)]
    fee_address: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the software wallet's payment key
    Init,

    /// List registered wallet backends
    Wallets,

    /// Connect a wallet and persist the session
    Connect {
        /// Wallet id (defaults to the software wallet)
        wallet: Option<String>,
    },

    /// Disconnect the active wallet and forget the session
    Disconnect,

    /// Show session and marketplace info
    Status,

    /// List the connected wallet's NFTs with metadata
    Nfts,

    /// Browse current marketplace listings
    Market,

    /// Show one asset: metadata, ownership and listing status
    Show {
        /// Asset unit (policy id + asset name, hex)
        unit: String,
    },

    /// List an owned NFT for sale
    Sell {
        /// Asset unit (policy id + asset name, hex)
        unit: String,

        /// Price in ADA
        #[arg(short, long)]
        price: String,
    },

    /// Buy a listed NFT
    Buy {
        /// Asset unit (policy id + asset name, hex)
        unit: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Cancel one of your listings
    Cancel {
        /// Asset unit (policy id + asset name, hex)
        unit: String,
    },

    /// Mint an NFT under a fresh single-issuer policy
    Mint {
        /// Token name
        #[arg(short, long)]
        name: String,

        /// Description stored in the token metadata
        #[arg(short, long)]
        description: Option<String>,

        /// Image URI (ipfs:// or https://)
        #[arg(long)]
        image_uri: Option<String>,

        /// Image file to pin to IPFS first (needs PINATA_API_KEY/SECRET)
        #[arg(long, conflicts_with = "image_uri")]
        image_file: Option<PathBuf>,

        /// Number of tokens to mint
        #[arg(short, long, default_value = "1")]
        quantity: u64,

        /// Policy expiry slot (defaults to two hours from now)
        #[arg(long)]
        expiry_slot: Option<u64>,
    },

    /// Generate an NFT image from a prompt
    GenerateImage {
        prompt: String,

        /// Start on the cheaper fallback model
        #[arg(long)]
        fallback: bool,

        /// Where to save the image
        #[arg(short, long, default_value = "generated.jpg")]
        output: PathBuf,
    },
}

struct App {
    network: Network,
    indexer: Arc<IndexerClient>,
    session: WalletSession,
    software: Arc<SoftwareWallet>,
    market: Marketplace,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let cli = Cli::parse();
    let mut app = build_app(&cli).await?;

    match cli.command {
        Commands::Init => init_wallet(&app)?,
        Commands::Wallets => list_wallets(&app),
        Commands::Connect { wallet } => connect(&mut app, wallet.as_deref()).await?,
        Commands::Disconnect => disconnect(&mut app)?,
        Commands::Status => status(&app).await?,
        Commands::Nfts => show_nfts(&app).await?,
        Commands::Market => browse_market(&app).await?,
        Commands::Show { unit } => show_asset(&app, &unit).await?,
        Commands::Sell { unit, price } => sell(&app, &unit, &price).await?,
        Commands::Buy { unit, yes } => buy(&app, &unit, yes).await?,
        Commands::Cancel { unit } => cancel(&app, &unit).await?,
        Commands::Mint {
            name,
            description,
            image_uri,
            image_file,
            quantity,
            expiry_slot,
        } => {
            mint(
                &app,
                MintArgs {
                    name,
                    description,
                    image_uri,
                    image_file,
                    quantity,
                    expiry_slot,
                },
            )
            .await?
        }
        Commands::GenerateImage {
            prompt,
            fallback,
            output,
        } => generate_image(&prompt, fallback, &output).await?,
    }

    Ok(())
}

async fn build_app(cli: &Cli) -> Result<App> {
    let network = if cli.mainnet {
        Network::Mainnet
    } else {
        Network::Testnet
    };

    let state_dir = match &cli.state_dir {
        Some(dir) => dir.clone(),
        None => {
            let mut dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
            dir.push(".mintix");
            dir
        }
    };

    let project_id = cli
        .project_id
        .clone()
        .unwrap_or_else(|| DEFAULT_PREPROD_PROJECT_ID.to_string());
    let indexer_config = if cli.mainnet {
        IndexerConfig::mainnet(project_id)
    } else {
        IndexerConfig::preprod(project_id)
    };
    let indexer = Arc::new(IndexerClient::new(indexer_config));

    let software = Arc::new(SoftwareWallet::open(
        network,
        state_dir.join("keystore.json"),
    )?);
    let mut registry = WalletRegistry::new();
    registry.register(Arc::clone(&software) as Arc<dyn mintix_wallet::WalletProvider>);

    let mut session = WalletSession::new(
        network,
        registry,
        Box::new(FileSessionStore::new(state_dir.join("session.json"))),
    );
    session.restore().await;

    let market_config = match &cli.fee_address {
        Some(fee_address) => MarketConfig::new(network, Address::from_bech32(fee_address)?),
        None if cli.mainnet => {
            bail!("no mainnet fee address configured; pass --fee-address")
        }
        None => MarketConfig::preprod()?,
    };

    let market = Marketplace::new(
        MarketplaceValidator::bundled()?,
        market_config,
        indexer.clone(),
        indexer.clone(),
    );

    Ok(App {
        network,
        indexer,
        session,
        software,
        market,
    })
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn explorer_link(network: Network, tx_hash: &TxHash) -> String {
    match network {
        Network::Mainnet => format!("https://cardanoscan.io/transaction/{tx_hash}"),
        Network::Testnet => format!("https://preprod.cardanoscan.io/transaction/{tx_hash}"),
    }
}

fn current_slot(network: Network) -> u64 {
    let unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    let offset = match network {
        Network::Mainnet => MAINNET_SLOT_UNIX_OFFSET,
        Network::Testnet => PREPROD_SLOT_UNIX_OFFSET,
    };
    unix.saturating_sub(offset)
}

fn init_wallet(app: &App) -> Result<()> {
    if app.software.has_keys()? {
        println!("{}", "A wallet key already exists.".yellow());
        return Ok(());
    }

    println!("{}", "Creating wallet key...".bright_cyan());
    let password = Password::new()
        .with_prompt("Enter password for the new wallet")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    let key_hash = app.software.generate_key(&password, None)?;
    let address = Address::from_key_hash(app.network, key_hash);

    println!("{}", "✓ Wallet created!".green());
    println!("  Address: {address}");
    println!("  Connect it with 'mintix connect'");
    Ok(())
}

fn list_wallets(app: &App) {
    println!("{}", "Wallet backends:".bright_cyan());
    for id in app.session.registry().ids() {
        let marker = if app.session.wallet_id() == Some(id) {
            " (connected)".green().to_string()
        } else {
            String::new()
        };
        println!("  {id}{marker}");
    }
}

async fn connect(app: &mut App, wallet: Option<&str>) -> Result<()> {
    let wallet_id = wallet.unwrap_or(SoftwareWallet::DEFAULT_ID);
    let address = app.session.connect(wallet_id).await?;

    println!("{}", "✓ Wallet connected!".green());
    println!("  Address: {address}");
    Ok(())
}

fn disconnect(app: &mut App) -> Result<()> {
    app.session.disconnect()?;
    println!("{}", "Wallet disconnected".yellow());
    Ok(())
}

async fn status(app: &App) -> Result<()> {
    println!("{}", "Session:".bright_cyan());
    println!("  Network:  {}", app.network);
    match app.session.address() {
        Some(address) => {
            println!("  Wallet:   {}", app.session.wallet_id().unwrap_or("?"));
            println!("  Address:  {address}");
        }
        None => println!("  Wallet:   {}", "not connected".yellow()),
    }
    println!("  Contract: {}", app.market.contract_address());

    let pb = spinner("Counting listings...")?;
    let listings = app.market.query().listings().await?;
    pb.finish_and_clear();
    println!("  Listings: {}", listings.len());
    Ok(())
}

fn connected_address(app: &App) -> Result<Address> {
    match app.session.address() {
        Some(address) => Ok(address.clone()),
        None => bail!("No wallet connected. Run 'mintix connect' first."),
    }
}

/// Prompt for the wallet password when signing needs the keystore open.
fn unlock_for_signing(app: &App) -> Result<()> {
    if !app.software.is_locked()? {
        return Ok(());
    }
    let password = Password::new()
        .with_prompt("Enter wallet password to sign")
        .interact()?;
    app.software.unlock(&password)?;
    Ok(())
}

async fn show_nfts(app: &App) -> Result<()> {
    let address = connected_address(app)?;

    let pb = spinner("Fetching NFTs...")?;
    let nfts = app
        .indexer
        .nfts_for_address(&address, DEFAULT_IPFS_GATEWAY)
        .await?;
    pb.finish_and_clear();

    if nfts.is_empty() {
        println!("{}", "No NFTs in this wallet.".yellow());
        return Ok(());
    }

    println!("{}", "Your NFTs:".bright_cyan());
    println!("{}", "─".repeat(80));
    for nft in nfts {
        let name = nft.name.as_deref().unwrap_or("Unnamed NFT");
        println!("  {} x{}", name.bright_yellow(), nft.quantity);
        println!("      Unit:  {}", nft.unit);
        if let Some(image) = &nft.image_url {
            println!("      Image: {image}");
        }
        println!();
    }
    Ok(())
}

async fn browse_market(app: &App) -> Result<()> {
    let pb = spinner("Fetching listings...")?;
    let listings = app.market.query().listings().await?;
    pb.finish_and_clear();

    if listings.is_empty() {
        println!("{}", "Nothing is listed right now.".yellow());
        return Ok(());
    }

    println!("{}", "Marketplace listings:".bright_cyan());
    println!("{}", "─".repeat(80));
    for listing in &listings {
        let unit = listing.datum.unit();
        let name = match app.indexer.asset(&unit).await {
            Ok(details) => details
                .onchain_metadata
                .and_then(|metadata| metadata.name)
                .unwrap_or_else(|| "Unnamed NFT".to_string()),
            Err(_) => "Unnamed NFT".to_string(),
        };

        println!(
            "  {} — {} ADA",
            name.bright_yellow(),
            format_ada(listing.datum.price).bright_green()
        );
        println!("      Unit:   {unit}");
        println!("      Seller: {}", listing.datum.seller);
        println!();
    }
    Ok(())
}

async fn asset_status(app: &App, unit: &Unit) -> Result<ListingStatus> {
    let wallet_utxos = match app.session.address() {
        Some(address) => app.indexer.address_utxos(address).await?,
        None => Vec::new(),
    };
    let listings = app.market.query().listings().await?;
    Ok(reconcile_unit(unit, &wallet_utxos, &listings))
}

async fn show_asset(app: &App, unit_text: &str) -> Result<()> {
    let unit: Unit = unit_text.parse()?;

    let pb = spinner("Fetching asset...")?;
    let details = app.indexer.asset(&unit).await?;
    let status = asset_status(app, &unit).await?;
    pb.finish_and_clear();

    let metadata = details.onchain_metadata.as_ref();
    let name = metadata
        .and_then(|m| m.name.as_deref())
        .unwrap_or("Unnamed NFT");

    println!("{}", name.bright_cyan().bold());
    if let Some(description) = metadata.and_then(|m| m.description.as_deref()) {
        println!("  {description}");
    }
    if let Some(image) = metadata.and_then(|m| m.image.as_deref()) {
        println!("  Image:  {}", mintix_indexer::normalize_image_uri(image, DEFAULT_IPFS_GATEWAY));
    }
    println!("  Policy: {}", unit.policy_id);
    println!("  Name:   {}", unit.asset_name);
    println!(
        "  Owner:  {}",
        if status.is_owner { "you" } else { "someone else" }
    );
    match status.price {
        Some(price) => println!("  Status: {} at {} ADA", "Listed".green(), format_ada(price)),
        None => println!("  Status: {}", "Not listed".yellow()),
    }
    Ok(())
}

async fn sell(app: &App, unit_text: &str, price_text: &str) -> Result<()> {
    let unit: Unit = unit_text.parse()?;
    let price = parse_ada(price_text)?;
    let address = connected_address(app)?;

    let pb = spinner("Checking ownership...")?;
    let status = app.market.status_for(&address, &unit).await?;
    pb.finish_and_clear();

    if !status.is_owner {
        bail!("You don't own this NFT");
    }
    if status.is_listed {
        bail!("This NFT is already listed");
    }

    println!("{}", "Listing summary:".bright_cyan());
    println!("  Price:           {} ADA", format_ada(price));
    println!(
        "  Marketplace fee: {} ADA (1%)",
        format_ada(mintix_market::marketplace_fee(price))
    );

    if !Confirm::new()
        .with_prompt("List for sale?")
        .default(false)
        .interact()?
    {
        println!("{}", "Cancelled".yellow());
        return Ok(());
    }

    unlock_for_signing(app)?;
    let signer = app.session.signer()?;

    let pb = spinner("Submitting listing...")?;
    let tx_hash = app.market.list_for_sale(signer.as_ref(), &unit, price).await?;
    pb.finish_and_clear();

    println!("{}", "✓ NFT listed!".green());
    println!("  {}", explorer_link(app.network, &tx_hash));
    Ok(())
}

async fn buy(app: &App, unit_text: &str, yes: bool) -> Result<()> {
    let unit: Unit = unit_text.parse()?;
    let address = connected_address(app)?;

    let pb = spinner("Fetching listing...")?;
    let status = app.market.status_for(&address, &unit).await?;
    pb.finish_and_clear();

    let Some(listing) = status.listing else {
        bail!("This NFT is not listed");
    };
    if status.is_owner {
        println!("{}", "Note: you already own this NFT.".yellow());
    }

    let fee = mintix_market::marketplace_fee(listing.datum.price);
    println!("{}", "Purchase summary:".bright_cyan());
    println!("  Price:           {} ADA", format_ada(listing.datum.price));
    println!("  Marketplace fee: {} ADA", format_ada(fee));

    if !yes
        && !Confirm::new()
            .with_prompt("Buy now?")
            .default(false)
            .interact()?
    {
        println!("{}", "Cancelled".yellow());
        return Ok(());
    }

    unlock_for_signing(app)?;
    let signer = app.session.signer()?;

    let pb = spinner("Submitting purchase...")?;
    let tx_hash = app.market.purchase(signer.as_ref(), &listing).await?;
    pb.finish_and_clear();

    println!("{}", "✓ Purchase submitted!".green());
    println!("  {}", explorer_link(app.network, &tx_hash));
    Ok(())
}

async fn cancel(app: &App, unit_text: &str) -> Result<()> {
    let unit: Unit = unit_text.parse()?;
    let address = connected_address(app)?;

    let pb = spinner("Fetching listing...")?;
    let status = app.market.status_for(&address, &unit).await?;
    pb.finish_and_clear();

    let Some(listing) = status.listing else {
        bail!("This NFT is not listed");
    };

    unlock_for_signing(app)?;
    let signer = app.session.signer()?;

    let pb = spinner("Cancelling listing...")?;
    let tx_hash = app.market.cancel(signer.as_ref(), &listing).await?;
    pb.finish_and_clear();

    println!("{}", "✓ Listing cancelled!".green());
    println!("  {}", explorer_link(app.network, &tx_hash));
    Ok(())
}

struct MintArgs {
    name: String,
    description: Option<String>,
    image_uri: Option<String>,
    image_file: Option<PathBuf>,
    quantity: u64,
    expiry_slot: Option<u64>,
}

async fn mint(app: &App, args: MintArgs) -> Result<()> {
    connected_address(app)?;

    let image_uri = match (&args.image_uri, &args.image_file) {
        (Some(uri), _) => Some(uri.clone()),
        (None, Some(path)) => {
            let api_key = std::env::var("PINATA_API_KEY")
                .map_err(|_| anyhow::anyhow!("PINATA_API_KEY is not set"))?;
            let api_secret = std::env::var("PINATA_API_SECRET")
                .map_err(|_| anyhow::anyhow!("PINATA_API_SECRET is not set"))?;

            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("image")
                .to_string();
            let bytes = std::fs::read(path)?;

            let pb = spinner("Uploading image to IPFS...")?;
            let pinning = PinningClient::new(PinningConfig::pinata(api_key, api_secret));
            let uri = pinning.pin_file(&file_name, bytes).await?;
            pb.finish_and_clear();
            println!("  Pinned: {uri}");
            Some(uri)
        }
        (None, None) => None,
    };

    let expiry_slot = args
        .expiry_slot
        .unwrap_or_else(|| current_slot(app.network) + 7_200);

    unlock_for_signing(app)?;
    let signer = app.session.signer()?;

    let pb = spinner("Minting...")?;
    let (tx_hash, unit) = mint_nft(
        signer.as_ref(),
        app.indexer.as_ref(),
        app.network,
        MintRequest {
            name: args.name,
            description: args.description,
            image_uri,
            quantity: args.quantity,
        },
        expiry_slot,
    )
    .await?;
    pb.finish_and_clear();

    println!("{}", "✓ Mint submitted!".green());
    println!("  Unit: {unit}");
    println!("  {}", explorer_link(app.network, &tx_hash));
    Ok(())
}

async fn generate_image(prompt: &str, fallback: bool, output: &PathBuf) -> Result<()> {
    let api_key = std::env::var("HUGGINGFACE_API_KEY")
        .map_err(|_| anyhow::anyhow!("HUGGINGFACE_API_KEY is not set"))?;
    let client = ImageGenClient::new(ImageGenConfig::hosted(api_key));

    let pb = spinner("Generating image (this can take a while)...")?;
    let mut result = client.generate(prompt, fallback).await;
    pb.finish_and_clear();

    // A primary-model timeout leaves the cheaper model as an option.
    if let Err(ImageGenError::Timeout {
        seconds,
        can_use_fallback: true,
    }) = &result
    {
        println!(
            "{}",
            format!("Timed out after {seconds}s on the primary model.").yellow()
        );
        if Confirm::new()
            .with_prompt("Retry with the faster fallback model?")
            .default(true)
            .interact()?
        {
            let pb = spinner("Generating image on the fallback model...")?;
            result = client.generate(prompt, true).await;
            pb.finish_and_clear();
        }
    }

    let image = result?;

    match image.data_uri.strip_prefix("data:image/jpeg;base64,") {
        Some(encoded) => {
            let bytes = BASE64.decode(encoded)?;
            std::fs::write(output, bytes)?;
            println!("{}", "✓ Image generated!".green());
            println!("  Model: {}", image.model);
            println!("  Saved: {}", output.display());
        }
        None => {
            println!("{}", "✓ Image generated!".green());
            println!("  Model: {}", image.model);
            println!("  URL:   {}", image.data_uri);
        }
    }
    Ok(())
}
