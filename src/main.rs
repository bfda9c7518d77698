//! famshop command-line client

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error};

use famshop::{
    checkout::{CheckoutError, CheckoutForm, CheckoutSession, PaymentMethod},
    client::{ApiError, HttpStoreClient, PaymentDirective, StoreServices},
    config::{Config, ConfigError},
    fixtures::{CartFixture, FixtureError},
    items::ProductId,
    observability,
    pricing::compute_breakdown,
    promotions::{DiscountType, PromotionCode, PromotionError},
    receipt::{BreakdownReceipt, ReceiptError},
    store::{CartRepository, CartStoreError},
};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Promotion(#[from] PromotionError),

    #[error(transparent)]
    Store(#[from] CartStoreError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Cart pricing and checkout for the family archive store
#[derive(Debug, Parser)]
#[command(name = "famshop", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Price a cart fixture or the persisted cart
    Quote(QuoteArgs),

    /// Manage the persisted cart
    #[command(subcommand)]
    Cart(CartCommand),

    /// Submit the persisted cart as an order
    Checkout(CheckoutArgs),
}

#[derive(Debug, Args)]
struct QuoteArgs {
    /// YAML cart fixture; the persisted cart is priced when omitted
    #[arg(short, long)]
    fixture: Option<PathBuf>,

    /// Promotion type, overriding the fixture's promotion
    #[arg(long, value_enum, requires = "promo_value")]
    promo_type: Option<PromoType>,

    /// Percent points or minor units, depending on the type
    #[arg(long, requires = "promo_type")]
    promo_value: Option<Decimal>,

    /// Code shown on the receipt for a command-line promotion
    #[arg(long, default_value = "MANUAL")]
    promo_code: String,

    /// Bonuses to redeem, in minor units
    #[arg(long)]
    bonuses: Option<u64>,

    /// Bonus balance, in minor units
    #[arg(long)]
    balance: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PromoType {
    Percent,
    Fixed,
}

impl From<PromoType> for DiscountType {
    fn from(value: PromoType) -> Self {
        match value {
            PromoType::Percent => DiscountType::Percent,
            PromoType::Fixed => DiscountType::Fixed,
        }
    }
}

#[derive(Debug, Subcommand)]
enum CartCommand {
    /// Show the cart
    List,

    /// Look up a product in the catalog and add it
    Add {
        /// Product id
        product_id: u64,
    },

    /// Remove a product
    Remove {
        /// Product id
        product_id: u64,
    },

    /// Set a product's quantity
    Quantity {
        /// Product id
        product_id: u64,

        /// New quantity
        quantity: u32,
    },

    /// Empty the cart
    Clear,
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    /// Promotion code to validate and apply
    #[arg(long)]
    promo_code: Option<String>,

    /// Bonuses to redeem, in minor units
    #[arg(long, default_value_t = 0)]
    bonuses: u64,

    /// Bonus balance, in minor units
    #[arg(long, default_value_t = 0)]
    balance: u64,

    /// Payment method
    #[arg(long, value_enum)]
    payment_method: Option<PaymentMethod>,

    /// Contact email for the receipt
    #[arg(long)]
    email: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    Config::load_dotenv();

    let cli = Cli::parse();

    if let Err(source) = observability::init(&cli.config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln for setup errors"
        )]
        {
            eprintln!("Observability error: {source}");
        }

        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(source) => {
            error!(error = %source, "command failed");

            #[expect(
                clippy::print_stderr,
                reason = "command errors are user-facing and must reach stderr"
            )]
            {
                eprintln!("Error: {source}");
            }

            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { config, command } = cli;

    match command {
        Command::Quote(args) => quote(&config, &args),
        Command::Cart(command) => cart(&config, command).await,
        Command::Checkout(args) => checkout(&config, args).await,
    }
}

fn quote(config: &Config, args: &QuoteArgs) -> Result<(), CliError> {
    let (cart, fixture_promotion, requested, available) = match &args.fixture {
        Some(path) => {
            let fixture = CartFixture::from_path(path)?;

            debug!(path = %path.display(), "pricing fixture");

            (
                fixture.cart()?,
                fixture.promotion()?,
                fixture.bonuses_requested(),
                fixture.bonuses_available(),
            )
        }
        None => (config.cart_repository()?.load()?, None, 0, 0),
    };

    let promotion = match (args.promo_type, args.promo_value) {
        (Some(promo_type), Some(value)) => Some(PromotionCode::try_new(
            args.promo_code.clone(),
            promo_type.into(),
            value,
        )?),
        _ => fixture_promotion,
    };

    let requested = args.bonuses.unwrap_or(requested);
    let available = args.balance.unwrap_or(available);

    let breakdown = compute_breakdown(&cart, promotion.as_ref(), requested, available);

    BreakdownReceipt::new(&cart, &breakdown, promotion.as_ref()).write_to(io::stdout().lock())?;

    Ok(())
}

async fn cart(config: &Config, command: CartCommand) -> Result<(), CliError> {
    let mut repository = config.cart_repository()?;

    let cart = match command {
        CartCommand::List => repository.load()?,
        CartCommand::Add { product_id } => {
            let client = HttpStoreClient::new(&config.api()?)?;
            let mut session = CheckoutSession::new(repository, StoreServices::http(client));

            session.add_product(ProductId::new(product_id)).await?
        }
        CartCommand::Remove { product_id } => repository.remove(ProductId::new(product_id))?,
        CartCommand::Quantity {
            product_id,
            quantity,
        } => repository.update_quantity(ProductId::new(product_id), quantity)?,
        CartCommand::Clear => repository.clear()?,
    };

    let breakdown = compute_breakdown(&cart, None, 0, 0);

    BreakdownReceipt::new(&cart, &breakdown, None).write_to(io::stdout().lock())?;

    Ok(())
}

async fn checkout(config: &Config, args: CheckoutArgs) -> Result<(), CliError> {
    let client = HttpStoreClient::new(&config.api()?)?;

    let mut session = CheckoutSession::new(config.cart_repository()?, StoreServices::http(client))
        .with_bonus_balance(args.balance);

    if let Some(code) = &args.promo_code {
        session.apply_promotion(code).await?;
    }

    session.set_bonuses_requested(args.bonuses);

    let cart = session.cart()?;
    let breakdown = session.breakdown()?;

    BreakdownReceipt::new(&cart, &breakdown, session.promotion()).write_to(io::stdout().lock())?;

    let form = CheckoutForm {
        payment_method: args.payment_method,
        email: args.email,
    };

    let directive = session.submit(&form).await?;
    let mut out = io::stdout().lock();

    match directive {
        PaymentDirective::Redirect(url) => writeln!(out, "Continue to payment: {url}")?,
        PaymentDirective::Settled => writeln!(out, "Order paid in full.")?,
    }

    Ok(())
}
