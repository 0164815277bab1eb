use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use film_meter::exposure::settings::{validate_aperture, validate_iso};
use film_meter::meter::{MeteringSession, SnapshotCapability};
use film_meter::state::{KeyValueSlot, LogStore, SaveStatus, ShotLog, ShotLogPatch, SqliteSlot};
use film_meter::{Ev, LightMeter, MeterConfig, ShutterSpeed};

/// Command-line arguments for film-meter
#[derive(Parser, Debug)]
#[command(name = "film-meter")]
#[command(about = "Light meter and film shot log")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "FILM_METER_CONFIG")]
    config: Option<PathBuf>,

    /// Shot log database (overrides the configuration)
    #[arg(long, global = true, env = "FILM_METER_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shutter speed for a given EV
    Calc {
        /// Exposure value (0-20)
        #[arg(long)]
        ev: f64,
        #[command(flatten)]
        exposure: ExposureArgs,
    },
    /// Meter a still image
    Sample {
        image: PathBuf,
        #[command(flatten)]
        exposure: ExposureArgs,
    },
    /// Meter an image file that is being overwritten by a camera
    Watch {
        image: PathBuf,
        /// How long to keep measuring
        #[arg(long, default_value = "10")]
        seconds: u64,
        #[command(flatten)]
        exposure: ExposureArgs,
    },
    /// Shot log
    #[command(subcommand)]
    Log(LogCommand),
}

#[derive(Args, Debug, Clone, Copy)]
struct ExposureArgs {
    /// Film/sensor speed
    #[arg(long)]
    iso: Option<u32>,
    /// f-number
    #[arg(long)]
    aperture: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum LogCommand {
    /// Log a shot with the current meter settings
    ///
    /// The EV comes from --from-image (measured), else --ev (manual),
    /// else the default EV 13.
    Add {
        /// EV at capture time (manual entry)
        #[arg(long)]
        ev: Option<f64>,
        /// Meter this image and log the measured EV
        #[arg(long, value_name = "IMAGE", conflicts_with = "ev")]
        from_image: Option<PathBuf>,
        /// Override the recommended shutter speed
        #[arg(long)]
        shutter: Option<String>,
        #[command(flatten)]
        exposure: ExposureArgs,
        #[command(flatten)]
        details: DetailArgs,
    },
    /// List logged shots, newest first
    List,
    /// Change fields of a logged shot
    Edit {
        id: i64,
        #[arg(long)]
        iso: Option<u32>,
        #[arg(long)]
        aperture: Option<f64>,
        #[arg(long)]
        shutter: Option<String>,
        #[arg(long)]
        ev: Option<f64>,
        #[command(flatten)]
        details: DetailArgs,
    },
    /// Delete a logged shot
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone, Default)]
struct DetailArgs {
    #[arg(long)]
    camera: Option<String>,
    #[arg(long)]
    lens: Option<String>,
    /// Film stock
    #[arg(long)]
    film: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "film_meter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = MeterConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!(?config, "configuration");

    match cli.command {
        Command::Calc { ev, exposure } => {
            let mut meter = build_meter(&config, exposure)?;
            meter.set_manual_ev(ev);
            print_reading(&meter);
        }
        Command::Sample { image, exposure } => {
            let mut meter = build_meter(&config, exposure)?;
            let luminance = meter
                .meter_still(&image)
                .with_context(|| format!("Failed to meter {}", image.display()))?;
            println!("Average luminance: {:.3}", luminance);
            print_reading(&meter);
        }
        Command::Watch {
            image,
            seconds,
            exposure,
        } => {
            let meter = build_meter(&config, exposure)?;
            watch(&config, meter, &image, Duration::from_secs(seconds)).await?;
        }
        Command::Log(command) => {
            let mut store = open_store(&config, cli.db.as_deref())?;
            run_log_command(&config, &mut store, command)?;
        }
    }

    Ok(())
}

/// Meter with the configured defaults, overridden by command-line values
fn build_meter(config: &MeterConfig, exposure: ExposureArgs) -> Result<LightMeter> {
    let mut meter = LightMeter::new(config.calculator());
    meter.set_iso(validate_iso(exposure.iso.unwrap_or(config.default_iso))?)?;
    meter.set_aperture(validate_aperture(
        exposure.aperture.unwrap_or(config.default_aperture),
    )?)?;
    Ok(meter)
}

fn print_reading(meter: &LightMeter) {
    println!("{}: {}", meter.ev_label(), meter.current_ev());
    println!("{}", meter.settings().summary());
}

/// Sample the snapshot file until the deadline, printing each reading
async fn watch(config: &MeterConfig, mut meter: LightMeter, image: &Path, run_for: Duration) -> Result<()> {
    let mut session =
        MeteringSession::with_interval(SnapshotCapability::new(image), config.sample_interval());

    if let Err(e) = session.start().await {
        anyhow::bail!("{} ({})", e.user_message(), e);
    }
    println!("📷 Measuring {} for {}s...", image.display(), run_for.as_secs());

    let mut updates = session.subscribe();
    let deadline = tokio::time::sleep(run_for);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let reading = *updates.borrow_and_update();
                meter.record_measurement(reading);
                println!(
                    "EV {} -> {}s",
                    meter.current_ev(),
                    meter.recommended_shutter()
                );
            }
        }
    }

    session.stop();
    info!("watch finished");
    print_reading(&meter);
    Ok(())
}

fn open_store(config: &MeterConfig, db_override: Option<&Path>) -> Result<LogStore<SqliteSlot>> {
    let slot = match db_override.or(config.database_path.as_deref()) {
        Some(path) => SqliteSlot::open(path),
        None => SqliteSlot::open_default(),
    }
    .context("Failed to open the shot log database")?;
    Ok(LogStore::open(slot))
}

fn report(status: SaveStatus, done: &str) {
    match status {
        SaveStatus::Saved => println!("✅ {}", done),
        SaveStatus::Unchanged => println!("Nothing to change."),
        SaveStatus::Failed(e) => {
            eprintln!("⚠️  {} in this session, but saving failed: {}", done, e)
        }
    }
}

/// Apply an edit; `None` when there is no log with `id`
fn edit_log<S: KeyValueSlot>(
    store: &mut LogStore<S>,
    id: i64,
    patch: &ShotLogPatch,
) -> Option<SaveStatus> {
    store.get(id)?;
    Some(store.update(id, patch))
}

fn run_log_command<S: KeyValueSlot>(
    config: &MeterConfig,
    store: &mut LogStore<S>,
    command: LogCommand,
) -> Result<()> {
    match command {
        LogCommand::Add {
            ev,
            from_image,
            shutter,
            exposure,
            details,
        } => {
            let mut meter = build_meter(config, exposure)?;
            if let Some(ev) = ev {
                meter.set_manual_ev(ev);
            }
            if let Some(image) = from_image {
                meter
                    .meter_still(&image)
                    .with_context(|| format!("Failed to meter {}", image.display()))?;
            }

            let mut draft = meter.draft_for_shot();
            if let Some(token) = shutter {
                draft.shutter = ShutterSpeed::parse(&token)?;
            }
            draft.camera = details.camera.unwrap_or_default();
            draft.lens = details.lens.unwrap_or_default();
            draft.film = details.film.unwrap_or_default();
            draft.location = details.location.unwrap_or_default();
            draft.notes = details.notes.unwrap_or_default();

            let (log, status) = store.log_shot(draft, meter.current_ev());
            report(status, &format!("Logged shot {}", log.id));
            print_log(&log);
        }
        LogCommand::List => {
            println!("Film Logs ({})", store.len());
            if store.is_empty() {
                println!("No logs yet. Start shooting!");
            }
            for log in store.list() {
                println!();
                print_log(log);
            }
        }
        LogCommand::Edit {
            id,
            iso,
            aperture,
            shutter,
            ev,
            details,
        } => {
            let patch = ShotLogPatch {
                camera: details.camera,
                lens: details.lens,
                film: details.film,
                location: details.location,
                notes: details.notes,
                iso: iso.map(validate_iso).transpose()?,
                aperture: aperture.map(validate_aperture).transpose()?,
                shutter: shutter.as_deref().map(ShutterSpeed::parse).transpose()?,
                ev: ev.map(Ev::new),
            };
            match edit_log(store, id, &patch) {
                Some(status) => report(status, &format!("Updated shot {}", id)),
                None => println!("No shot log with id {}.", id),
            }
        }
        LogCommand::Delete { id } => {
            report(store.remove(id), &format!("Deleted shot {}", id));
        }
    }
    Ok(())
}

fn print_log(log: &ShotLog) {
    let taken = log.timestamp.with_timezone(&Local);
    println!("#{}  {}  {}", log.id, taken.format("%Y-%m-%d %H:%M:%S"), log.title());
    if !log.lens.is_empty() {
        println!("    Lens: {}", log.lens);
    }
    if !log.film.is_empty() {
        println!("    Film: {}", log.film);
    }
    if !log.location.is_empty() {
        println!("    Location: {}", log.location);
    }
    println!("    {}", log.summary());
    if !log.notes.is_empty() {
        println!("    {}", log.notes);
    }
}
