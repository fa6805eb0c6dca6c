mod command;
mod timed_presenter;

use std::time::Duration;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use common::config::{ConfigManager, FileContentConfigProvider};
use common::games::SessionRng;
use common::games::match_three::{BoardSettings, PointerTracker, ResolutionEngine, SwapOutcome, SwapRequest};
use common::logger::{self, LogLevel};
use common::{log, log_debug};
use command::{Command, HELP, parse_command};
use timed_presenter::{MAX_TIME_SCALE, Settled, TimedPresenter};

type Board = ResolutionEngine<TimedPresenter, SessionRng>;

#[derive(Parser)]
#[command(name = "match_three", about = "Match-three board resolved in the terminal")]
struct Args {
    /// Board settings file (YAML). Defaults apply when it does not exist.
    #[arg(long, default_value = "match_three.yaml")]
    config: String,

    /// Seed for gem draws; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Play this many hinted swaps and exit instead of reading stdin.
    #[arg(long)]
    autoplay: Option<u32>,

    #[arg(long)]
    use_log_prefix: bool,

    #[arg(long)]
    debug: bool,

    /// Animation speed multiplier; 0 settles every move at once.
    #[arg(long, default_value_t = 1.0)]
    time_scale: f32,

    /// Write the default settings to `--config` and exit.
    #[arg(long)]
    write_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let prefix = if args.use_log_prefix {
        Some("MatchThree".to_string())
    } else {
        None
    };
    let level = if args.debug { LogLevel::Debug } else { LogLevel::Info };
    logger::init_logger(prefix, level);

    let config_manager =
        ConfigManager::<FileContentConfigProvider, BoardSettings>::from_yaml_file(&args.config);
    if args.write_default_config {
        config_manager.set_config(&BoardSettings::default())?;
        log!("Default settings written to {}", args.config);
        return Ok(());
    }
    let settings = config_manager.get_config()?;

    if !(0.0..=MAX_TIME_SCALE).contains(&args.time_scale) {
        return Err(format!(
            "--time-scale must be between 0 and {}, got {}",
            MAX_TIME_SCALE, args.time_scale
        )
        .into());
    }

    let rng = args.seed.map(SessionRng::new).unwrap_or_else(SessionRng::from_random);
    log!(
        "Starting {}x{} board with seed {}",
        settings.width,
        settings.height,
        rng.seed()
    );

    let (settle_tx, mut settle_rx) = mpsc::unbounded_channel();
    let presenter = TimedPresenter::new(settle_tx, args.time_scale);
    let mut engine = ResolutionEngine::new(&settings, presenter, rng)?;
    let settle_timeout = engine.timing().settle_timeout();
    log_debug!("Drawing from {:?}", engine.palette().types());

    wait_until_idle(&mut engine, &mut settle_rx, settle_timeout).await;
    if engine.resolve_existing_matches() {
        wait_until_idle(&mut engine, &mut settle_rx, settle_timeout).await;
    }
    println!("{}", engine.grid());

    match args.autoplay {
        Some(turns) => run_autoplay(&mut engine, &mut settle_rx, settle_timeout, turns).await,
        None => run_interactive(&mut engine, &mut settle_rx, settle_timeout).await?,
    }

    let stats = engine.stats();
    log!(
        "Done: {} swaps committed, {} reverted, {} waves, {} gems cleared",
        stats.swaps_committed,
        stats.swaps_reverted,
        stats.waves,
        stats.gems_cleared
    );
    Ok(())
}

async fn wait_until_idle(
    engine: &mut Board,
    settle_rx: &mut mpsc::UnboundedReceiver<Settled>,
    settle_timeout: Option<Duration>,
) {
    while !engine.is_idle() {
        let next = match settle_timeout {
            Some(limit) => match tokio::time::timeout(limit, settle_rx.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    log!("No settle signal within {:?}, forcing the board on", limit);
                    engine.force_settle();
                    continue;
                }
            },
            None => settle_rx.recv().await,
        };

        match next {
            Some(settled) => {
                engine.on_settled(settled.id, settled.x, settled.y);
            }
            None => {
                engine.force_settle();
            }
        }
    }
}

async fn run_autoplay(
    engine: &mut Board,
    settle_rx: &mut mpsc::UnboundedReceiver<Settled>,
    settle_timeout: Option<Duration>,
    turns: u32,
) {
    for turn in 1..=turns {
        let Some(swap) = engine.find_valid_swap() else {
            log!("No valid swap left after {} turns", turn - 1);
            return;
        };
        println!("Turn {}: swap {} <-> {}", turn, swap.from, swap.to);
        engine.attempt_swap(swap.from, swap.to);
        wait_until_idle(engine, settle_rx, settle_timeout).await;
        println!("{}", engine.grid());
    }
}

fn submit_swap(engine: &mut Board, request: SwapRequest) {
    match engine.attempt_swap(request.from, request.to) {
        SwapOutcome::Started => println!("Swapping {} <-> {}", request.from, request.to),
        SwapOutcome::Ignored(reason) => println!("Swap ignored: {:?}", reason),
    }
}

async fn run_interactive(
    engine: &mut Board,
    settle_rx: &mut mpsc::UnboundedReceiver<Settled>,
    settle_timeout: Option<Duration>,
) -> std::io::Result<()> {
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let mut tracker = PointerTracker::new();
    let mut last_progress = Instant::now();
    println!("{}", HELP);

    loop {
        let deadline = last_progress + settle_timeout.unwrap_or(Duration::ZERO);
        tokio::select! {
            Some(settled) = settle_rx.recv() => {
                if engine.on_settled(settled.id, settled.x, settled.y) {
                    last_progress = Instant::now();
                    if engine.is_idle() {
                        println!("{}", engine.grid());
                    }
                }
            }
            _ = tokio::time::sleep_until(deadline), if settle_timeout.is_some() && !engine.is_idle() => {
                log!("No settle signal within {:?}, forcing the board on", settle_timeout.unwrap_or_default());
                engine.force_settle();
                last_progress = Instant::now();
                if engine.is_idle() {
                    println!("{}", engine.grid());
                }
            }
            line = lines.next() => {
                let Some(line) = line else {
                    break;
                };
                match parse_command(&line?) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Board) => println!("{}", engine.grid()),
                    Ok(Command::Hint) => match engine.find_valid_swap() {
                        Some(swap) => println!("Try {} <-> {}", swap.from, swap.to),
                        None => println!("No valid swap on this board"),
                    },
                    Ok(Command::Input(event)) => {
                        if let Some(request) = tracker.apply(event) {
                            last_progress = Instant::now();
                            submit_swap(engine, request);
                        }
                    }
                    Err(message) => println!("{}", message),
                }
            }
        }
    }

    Ok(())
}
