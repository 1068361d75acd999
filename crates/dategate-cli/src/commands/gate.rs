use chrono::{DateTime, Datelike, Local};
use clap::Args;
use dategate_core::runtime;
use dategate_core::{
    Clock, Config, Database, Enforcer, Gate, GateSettings, Location, ManualClock, OptInFlag,
    Scheduler, StaticOptIn, StoredOptIn, SystemClock, Window,
};
use serde_json::json;

#[derive(Args)]
pub struct WindowArgs {
    /// Year (defaults to the current local year)
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Document path of the current page
    #[arg(default_value = "/")]
    pub path: String,
    /// Evaluate at this RFC 3339 instant instead of now (read in local time)
    #[arg(long)]
    pub at: Option<String>,
    /// Override the stored opt-in flag
    #[arg(long)]
    pub accepted: Option<bool>,
}

#[derive(Args)]
pub struct NextArgs {
    /// Compute from this RFC 3339 instant instead of now (read in local time)
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Document path of the page being shown
    #[arg(default_value = "/")]
    pub path: String,
}

/// Parse `--at` and move it into the host's zone, where windows are computed.
fn parse_at(at: &str) -> Result<DateTime<Local>, Box<dyn std::error::Error>> {
    DateTime::parse_from_rfc3339(at)
        .map(|instant| instant.with_timezone(&Local))
        .map_err(|e| format!("invalid --at '{at}': {e}").into())
}

fn stored_flag(config: &Config) -> Result<StoredOptIn, Box<dyn std::error::Error>> {
    Ok(StoredOptIn::new(Database::open()?, config.optin.key.clone()))
}

pub fn window(args: WindowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let year = args.year.unwrap_or_else(|| Local::now().year());
    let window = Window::for_year(year, config.target_date(), &Local);
    let out = json!({
        "year": year,
        "start": window.start,
        "end": window.end,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn check_with<C: Clock, F: OptInFlag>(
    clock: C,
    flag: F,
    config: &Config,
    path: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let enforcer = Enforcer::new(clock, flag, config.pages.clone(), config.target_date());
    let mut location = Location::new(path);
    let event = enforcer.enforce(&mut location);
    let out = json!({
        "event": event,
        "path": location.path(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub fn check(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let fixed;
    let stored;
    let flag: &dyn OptInFlag = match args.accepted {
        Some(accepted) => {
            fixed = StaticOptIn(accepted);
            &fixed
        }
        None => {
            stored = stored_flag(&config)?;
            &stored
        }
    };

    match args.at {
        Some(at) => check_with(ManualClock::new(parse_at(&at)?), flag, &config, args.path),
        None => check_with(SystemClock, flag, &config, args.path),
    }
}

fn next_with<C: Clock>(clock: C, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut scheduler = Scheduler::new(config.target_date(), config.safety_margin());
    let event = scheduler.arm(&clock.now());
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}

pub fn next(args: NextArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    match args.at {
        Some(at) => next_with(ManualClock::new(parse_at(&at)?), &config),
        None => next_with(SystemClock, &config),
    }
}

pub fn watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let gate = Gate::new(
        SystemClock,
        stored_flag(&config)?,
        Location::new(args.path),
        GateSettings::from(&config),
    )?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let gate = rt.block_on(runtime::run(
        gate,
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for Ctrl-C, stopping");
            }
        },
        |event| match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "cannot serialize event"),
        },
    ));

    tracing::info!(path = %gate.navigator().path(), redirects = gate.navigator().replacements().len(), "watch stopped");
    Ok(())
}
