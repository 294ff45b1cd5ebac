use autocare_pay::application::flow::PaymentFlow;
use autocare_pay::application::poller::PollOutcome;
use autocare_pay::config::{DEFAULT_API_URL, GatewayConfig, PollSchedule};
use autocare_pay::domain::payment::{DEFAULT_SERVICE_TYPE, PaymentForm};
use autocare_pay::domain::ports::{PaymentGateway, PaymentGatewayRef};
use autocare_pay::infrastructure::http::HttpGateway;
use autocare_pay::infrastructure::in_memory::{ScriptedGateway, StatusReply};
use autocare_pay::interfaces::console::reporter::ConsoleReporter;
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    gateway: GatewayArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GatewayArgs {
    /// Base URL of the AutoCare backend API
    #[arg(
        long,
        env = "AUTOCARE_API_URL",
        default_value = DEFAULT_API_URL,
        global = true
    )]
    api_url: String,

    /// Bearer token sent with every request
    #[arg(long, env = "AUTOCARE_API_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = 15, global = true)]
    http_timeout_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Start an M-Pesa payment and wait for its confirmation
    Pay(PayArgs),
    /// Query the status of an existing checkout once
    Status {
        /// Checkout request id returned when the payment was initiated
        checkout_request_id: String,
    },
}

#[derive(Args)]
struct PayArgs {
    /// Amount in KES
    #[arg(long)]
    amount: String,

    /// Kenyan mobile number (07XX XXX XXX, 2547..., +2547...)
    #[arg(long)]
    phone: String,

    /// Payment description shown on the M-Pesa prompt
    #[arg(long)]
    description: Option<String>,

    /// Service being paid for; used for the default description
    #[arg(long, default_value = DEFAULT_SERVICE_TYPE)]
    service_type: String,

    /// Seconds to wait before the first status check
    #[arg(long, default_value_t = 10)]
    initial_delay_secs: u64,

    /// Seconds between status checks
    #[arg(long, default_value_t = 10)]
    poll_interval_secs: u64,

    /// Status checks before giving up
    #[arg(long, default_value_t = 30)]
    max_attempts: u32,

    /// Use an in-process backend that confirms after a few checks instead of
    /// calling the API
    #[arg(long)]
    simulate: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn http_gateway(args: &GatewayArgs) -> Result<PaymentGatewayRef> {
    let mut config = GatewayConfig::new(args.api_url.clone())
        .with_timeout(Duration::from_secs(args.http_timeout_secs));
    if let Some(token) = &args.token {
        config = config.with_auth_token(token.clone());
    }
    let gateway = HttpGateway::new(config).into_diagnostic()?;
    Ok(Arc::new(gateway))
}

async fn simulated_gateway() -> PaymentGatewayRef {
    let gateway = ScriptedGateway::new();
    gateway
        .push_statuses([
            StatusReply::pending(),
            StatusReply::pending(),
            StatusReply::completed(),
        ])
        .await;
    Arc::new(gateway)
}

async fn pay(gateway_args: &GatewayArgs, args: PayArgs) -> Result<ExitCode> {
    let schedule = PollSchedule {
        initial_delay: Duration::from_secs(args.initial_delay_secs),
        interval: Duration::from_secs(args.poll_interval_secs),
        max_attempts: args.max_attempts,
    };
    schedule.validate().into_diagnostic()?;

    let gateway = if args.simulate {
        tracing::warn!("simulated payment: no request is sent to the backend");
        simulated_gateway().await
    } else {
        http_gateway(gateway_args)?
    };

    let mut form = PaymentForm::new(args.amount, args.phone).with_service_type(args.service_type);
    if let Some(description) = args.description {
        form = form.with_description(description);
    }

    let flow = PaymentFlow::new(gateway, schedule, Arc::new(ConsoleReporter::stdout()));
    if let Err(e) = flow.pay(&form).await {
        eprintln!("Error: {}", e.user_message());
        return Ok(ExitCode::FAILURE);
    }

    let report = tokio::select! {
        report = flow.wait() => report.into_diagnostic()?,
        _ = tokio::signal::ctrl_c() => {
            flow.cancel().await;
            eprintln!("Payment tracking cancelled");
            return Ok(ExitCode::from(130));
        }
    };

    match report.map(|report| report.outcome) {
        Some(PollOutcome::Completed(_)) => Ok(ExitCode::SUCCESS),
        Some(PollOutcome::TimedOut { .. }) => Ok(ExitCode::from(2)),
        _ => Ok(ExitCode::FAILURE),
    }
}

async fn status(gateway_args: &GatewayArgs, checkout_request_id: &str) -> Result<ExitCode> {
    let gateway = http_gateway(gateway_args)?;
    let response = gateway
        .payment_status(checkout_request_id)
        .await
        .into_diagnostic()?;

    if !response.success {
        return Err(miette!(
            "status check rejected: {}",
            response.message.unwrap_or_default()
        ));
    }
    let data = response
        .data
        .ok_or_else(|| miette!("status response without data"))?;
    println!("{}", serde_json::to_string_pretty(&data).into_diagnostic()?);
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Pay(args) => pay(&cli.gateway, args).await,
        Command::Status {
            checkout_request_id,
        } => status(&cli.gateway, &checkout_request_id).await,
    }
}
