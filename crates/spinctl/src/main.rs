use clap::{Parser, Subcommand};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use swipespin::carousel::gesture::{PointerId, PointerKind};
use swipespin::carousel::{Carousel, Point};
use swipespin::config::{self, Config};
use swipespin::embed::{CssLength, FrameHeight};
use swipespin::sys::server::{Command, SOCKET_PATH};

const FRAME_MS: f64 = 1000.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "spinctl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Show the carousel window
    Show,
    /// Hide the carousel window
    Hide,
    /// Reload the configuration and remount the carousel
    Reload,
    /// Follow content height reports like an embedding page would
    Follow {
        /// Height used until the first report arrives
        #[arg(long, default_value = "700px")]
        fallback: CssLength,
    },
    /// Print the card layout for a viewport width
    Layout {
        #[arg(short, long)]
        width: f64,
        /// Rotation in degrees
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        rotation: f64,
        #[arg(long)]
        json: bool,
    },
    /// Print the dashed arc backdrop for a container
    Arcs {
        #[arg(short, long)]
        width: f64,
        /// Container height; 0 uses the breakpoint's stable height
        #[arg(long, default_value_t = 0.0)]
        height: f64,
        #[arg(short, long, default_value_t = 1.0)]
        scale: f64,
        #[arg(long)]
        json: bool,
    },
    /// Simulate a horizontal drag and print the rotation until it settles
    Fling {
        #[arg(short, long)]
        width: f64,
        /// Drag distance in pixels
        #[arg(short, long, allow_negative_numbers = true)]
        distance: f64,
        /// Drag duration in milliseconds
        #[arg(long, default_value_t = 120.0)]
        duration: f64,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Show => send_command(Command::Show),
        Commands::Hide => send_command(Command::Hide),
        Commands::Reload => send_command(Command::Reload),
        Commands::Follow { fallback } => follow(fallback),
        Commands::Layout {
            width,
            rotation,
            json,
        } => layout(&config::load_or_setup(), width, rotation, json),
        Commands::Arcs {
            width,
            height,
            scale,
            json,
        } => arcs(&config::load_or_setup(), width, height, scale, json),
        Commands::Fling {
            width,
            distance,
            duration,
        } => fling(&config::load_or_setup(), width, distance, duration),
    }
}

fn connect() -> anyhow::Result<UnixStream> {
    UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to swipespin at {}: {}. Is swipespin running?",
            SOCKET_PATH,
            e
        )
    })
}

fn send_command(cmd: Command) -> anyhow::Result<()> {
    let mut stream = connect()?;
    writeln!(stream, "{}", cmd)?;
    Ok(())
}

fn follow(fallback: CssLength) -> anyhow::Result<()> {
    let mut stream = connect()?;
    writeln!(stream, "{}", Command::Follow)?;

    let mut frame = FrameHeight::new(fallback);
    println!("height: {} (fallback)", frame.height());
    for line in BufReader::new(stream).lines() {
        match frame.apply_raw(&line?) {
            Ok(true) => println!("height: {}", frame.height()),
            Ok(false) => {}
            Err(e) => log::warn!("Ignoring message: {}", e),
        }
    }
    Ok(())
}

fn layout(config: &Config, width: f64, rotation: f64, json: bool) -> anyhow::Result<()> {
    let carousel = &config.carousel;
    let snapshot = swipespin::carousel::geometry::snapshot(
        rotation,
        carousel.cards.len(),
        width,
        &carousel.breakpoints,
        &carousel.layout_options(),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!(
        "{} breakpoint, card {}x{}, ring r={:.1} at ({:.1}, {:.1}), content height {:.1}",
        snapshot.breakpoint,
        snapshot.card_width,
        snapshot.card_height,
        snapshot.arc.radius,
        snapshot.arc.center_x,
        snapshot.arc.center_y,
        snapshot.content_height()
    );
    println!(
        "{:>3}  {:<24} {:>8} {:>9} {:>9} {:>7} {:>6} {:>7} {:>5}",
        "#", "title", "angle", "x", "y", "tilt", "scale", "opacity", "z"
    );
    for t in &snapshot.cards {
        let title = carousel.card(t.index).map_or("", |c| c.title.as_str());
        println!(
            "{:>3}  {:<24} {:>8.2} {:>9.1} {:>9.1} {:>7.2} {:>6.2} {:>7.2} {:>5}",
            t.index, title, t.angle, t.x, t.y, t.tilt, t.scale, t.opacity, t.stack_order
        );
    }
    Ok(())
}

fn arcs(config: &Config, width: f64, height: f64, scale: f64, json: bool) -> anyhow::Result<()> {
    let carousel = Carousel::new(config.carousel.clone(), width);
    let decoration = carousel.decoration(height, scale);

    if json {
        println!("{}", serde_json::to_string_pretty(&decoration)?);
        return Ok(());
    }

    println!(
        "{}x{} surface ({}x{} px), offset {}, center ({:.1}, {:.1})",
        decoration.width,
        decoration.height,
        decoration.raster.width,
        decoration.raster.height,
        decoration.offset_top,
        decoration.center_x,
        decoration.center_y
    );
    for arc in decoration.visible_arcs() {
        println!("r={:>8.1}  opacity={:.2}", arc.radius, arc.opacity);
    }
    Ok(())
}

fn fling(config: &Config, width: f64, distance: f64, duration: f64) -> anyhow::Result<()> {
    let mut carousel = Carousel::new(config.carousel.clone(), width);
    let pointer = PointerId(1);
    let steps = (duration / FRAME_MS).ceil().max(1.0) as usize;
    let start = Point::new(width / 2.0, 0.0);

    let mut now = 0.0;
    carousel.pointer_down(pointer, start, PointerKind::Mouse, true, now);
    for i in 1..=steps {
        now += FRAME_MS;
        let x = start.x + distance * i as f64 / steps as f64;
        carousel.pointer_move(pointer, Point::new(x, start.y), now);
    }
    println!("{:>8.1} ms  released at {:.3}°", now, carousel.rotation());
    carousel.pointer_up(pointer, now);

    let mut frames = 0;
    while let Some(ticket) = carousel.take_frame_request() {
        now += FRAME_MS;
        frames += 1;
        let outcome = carousel.frame(ticket, now);
        if outcome.relayout {
            println!("{:>8.1} ms  {:.3}°", now, carousel.rotation());
        }
        if frames > 10_000 {
            anyhow::bail!("animation did not settle");
        }
    }

    let front = carousel
        .snapshot()
        .front_card()
        .and_then(|t| carousel.config().card(t.index))
        .map_or("-".to_string(), |c| c.title.clone());
    println!("settled at {:.1}° after {} frames, front card: {}", carousel.rotation(), frames, front);
    Ok(())
}
