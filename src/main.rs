use clap::Parser;

use wayfarer::banner::{BannerInfo, print_banner};
use wayfarer::cancel::CancelToken;
use wayfarer::consts::{DEFAULT_BASE_DELAY, DEFAULT_DEADLINE, DEFAULT_MAX_ATTEMPTS};
use wayfarer::endpoint::{Endpoint, Mode};
use wayfarer::job::{JobClient, JobConfig, Phase};
use wayfarer::ratelimit::RateLimiter;
use wayfarer::sanitize::TripRequest;
use wayfarer::spinner::Spinner;
use wayfarer::transport::client::ReqwestHttp;
use wayfarer::transport::{Transport, TransportConfig};

#[derive(Parser)]
#[command(name = "wayfarer", version, about = "Ask an AI backend for a trip itinerary.")]
struct Cli {
    /// Where to go
    destination: String,

    /// Trip start date (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,

    /// Trip end date (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,

    /// Trip length in days (used when no end date is given)
    #[arg(short, long)]
    days: Option<u32>,

    /// Number of travelers
    #[arg(short, long, default_value_t = 1)]
    travelers: u32,

    /// Comma-separated interests (e.g. "museums,food,hiking")
    #[arg(short, long)]
    interests: Option<String>,

    /// Daily budget cap
    #[arg(short, long)]
    budget: Option<f64>,

    /// Preferred currency code (e.g. EUR)
    #[arg(short, long)]
    currency: Option<String>,

    /// Backend base URL (falls back to WAYFARER_API_BASE)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Force development mode (local backend allowed without config)
    #[arg(long, default_value_t = false)]
    dev: bool,

    /// Give up after this many seconds
    #[arg(long, default_value_t = DEFAULT_DEADLINE.as_secs())]
    deadline: u64,

    /// HTTP attempts per request before failing
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mode = if cli.dev {
        Mode::Development
    } else {
        Mode::from_env()
    };
    let endpoint = Endpoint::resolve(cli.endpoint.as_deref(), mode)?;
    if let Some(advisory) = &endpoint.advisory {
        eprintln!("warning: {}", advisory);
    }

    print_banner(&BannerInfo {
        endpoint: endpoint.base(),
        mode: match mode {
            Mode::Development => "development",
            Mode::Production => "production",
        },
        destination: &cli.destination,
        deadline_secs: cli.deadline,
    });

    let request = TripRequest {
        destination: cli.destination,
        start_date: cli.start_date,
        end_date: cli.end_date,
        duration_days: cli.days,
        travelers_count: cli.travelers,
        interests: cli
            .interests
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|i| !i.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        max_daily_budget: cli.budget,
        currency: cli.currency,
    };

    let transport = Transport::new(
        Box::new(ReqwestHttp::new()),
        TransportConfig {
            max_attempts: cli.max_attempts,
            base_delay: DEFAULT_BASE_DELAY,
            ..TransportConfig::default()
        },
    );
    let client = JobClient::new(
        endpoint,
        transport,
        RateLimiter::default(),
        JobConfig {
            deadline: std::time::Duration::from_secs(cli.deadline),
            ..JobConfig::default()
        },
    );

    // Ctrl+C cancels the flow cooperatively; the in-flight request and
    // any pending sleep are abandoned through the token.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let spinner = Spinner::start("submitting");
    let result = client
        .submit_and_await(
            request,
            "cli",
            |phase| {
                let label = match phase {
                    Phase::Queued => "queued",
                    Phase::Running => "generating itinerary",
                    Phase::Done => "done",
                    Phase::Error => "failed",
                };
                spinner.update(label);
            },
            |step| spinner.update(step),
            &cancel,
        )
        .await;
    spinner.stop().await;

    match result {
        Ok(itinerary) => {
            println!("{}", serde_json::to_string_pretty(&itinerary)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("error: {}", e);
            Err(e.into())
        }
    }
}
