use intuis_netatmo::client::IntuisClient;
use intuis_netatmo::config::Config;
use intuis_netatmo::models::home::Home;
use intuis_netatmo::services::poll;
use log::{error, info, warn};
use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    secrets: Option<PathBuf>,
    once: bool,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = std::env::args_os();
    args.next(); // skip program name

    let mut parsed = CliArgs::default();
    while let Some(arg) = args.next() {
        match arg.to_str() {
            Some("--secrets") => {
                if parsed.secrets.is_some() {
                    return Err("`--secrets` provided more than once".to_string());
                }
                let value = args.next().ok_or_else(|| "`--secrets` requires a path argument".to_string())?;
                parsed.secrets = Some(PathBuf::from(value));
            }
            Some(s) if s.starts_with("--secrets=") => {
                if parsed.secrets.is_some() {
                    return Err("`--secrets` provided more than once".to_string());
                }
                let path_str = &s["--secrets=".len()..];
                if path_str.is_empty() {
                    return Err("`--secrets` requires a path argument".to_string());
                }
                parsed.secrets = Some(PathBuf::from(path_str));
            }
            Some("--once") => parsed.once = true,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        }
    }
    Ok(parsed)
}

fn log_tick(home: &Home) {
    for room in home.rooms.values() {
        info!(
            "{}: {}°C -> {}°C ({}), power {}%",
            room.name,
            room.current_temperature.map(|t| t.to_string()).unwrap_or_else(|| "-".into()),
            room.target_temperature.map(|t| t.to_string()).unwrap_or_else(|| "-".into()),
            room.mode.map(|m| m.as_str()).unwrap_or("-"),
            room.heating_power_request.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
        );
    }
    for heater in home.water_heaters.values() {
        info!(
            "{} water heater: boiler {}, mode {}",
            heater.name,
            match heater.boiler_on {
                Some(true) => "on",
                Some(false) => "off",
                None => "-",
            },
            heater.contactor_mode.map(|m| m.as_str()).unwrap_or("-"),
        );
    }
}

fn run(args: CliArgs) -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env(args.secrets.as_deref())?;
    info!(
        "Config loaded (user={}, base_url={}, poll_enabled={}, poll_interval={}s)",
        cfg.credentials.username,
        cfg.base_url,
        cfg.poll_enabled,
        cfg.poll_interval.as_secs()
    );

    // 2) Init client; the token is fetched on first use
    let mut client = IntuisClient::with_base_url(cfg.credentials.clone(), cfg.base_url.clone())
        .map_err(|e| format!("client setup failed: {}", e))?;

    // 3) Topology + first status
    client.pull_data().map_err(|e| format!("initial pull failed: {}", e))?;
    if let Some(home) = client.home() {
        println!("{}", home);
    }
    if let Some(report) = client.last_sync_report() {
        if report.has_warnings() {
            warn!(
                "Entities without status: rooms={:?}, water_heaters={:?}",
                report.unmatched_rooms, report.unmatched_water_heaters
            );
        }
    }

    // 4) Last day of energy measurements, passed through as-is
    match client.home_measure(&cfg.measure_scale) {
        Ok(measures) => info!("Fetched {} scale measurements ({} bytes)", cfg.measure_scale, measures.to_string().len()),
        Err(e) => warn!("Measurement pull failed: {}", e),
    }

    // 5) Status polling
    if args.once || !cfg.poll_enabled {
        info!("Polling disabled; exiting after initial pull");
        return Ok(());
    }
    poll::run_loop(&mut client, cfg.poll_interval, None, log_tick).map_err(|e| format!("status refresh failed: {}", e))
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    info!(
        "intuis-netatmo {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run(args) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
