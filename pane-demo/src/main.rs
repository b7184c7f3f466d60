//! Pane demo - headless windows driven by timers and synthetic input.

mod pointer;
mod views;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use pane_kernel::api::Geometry;
use pane_kernel::{Display, DisplayConfig, WidgetAttributes};
use tracing_subscriber::EnvFilter;

use crate::pointer::SyntheticPointer;
use crate::views::{ButtonView, FrameView, PanelView};

#[derive(Debug, Parser)]
#[command(name = "pane-demo", about = "Run headless pane windows for a while")]
struct Args {
    /// Number of frame windows to open
    #[arg(long, default_value_t = 2)]
    frames: usize,

    /// Redraw timer interval in milliseconds
    #[arg(long, default_value_t = 33)]
    interval_ms: u64,

    /// How long to run before shutting down
    #[arg(long, default_value_t = 1000)]
    duration_ms: u64,

    /// JSON display config
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => DisplayConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DisplayConfig::default(),
    };
    tracing::info!(frames = args.frames, duration_ms = args.duration_ms, "starting pane demo");

    let mut display = Display::open(config)?;
    let interval = Duration::from_millis(args.interval_ms.max(1));

    let mut frames = Vec::with_capacity(args.frames);
    for index in 0..args.frames {
        let x = index as i32 * 340;
        let frame = display.create_frame_window(
            &format!("frame-{index}"),
            Geometry::new(x, 0, 320, 240),
            FrameView::new(interval),
        )?;

        let panel = frame.create_sheet("panel", PanelView::default())?;
        for (slot, label) in ["ok", "cancel"].iter().enumerate() {
            let button = panel.create_widget(
                label,
                WidgetAttributes::PUSH_ACTION | WidgetAttributes::FOCUS_ON_HOVER,
                Geometry::new(20 + slot as i32 * 120, 180, 100, 40),
                ButtonView,
            )?;
            button.set_action(slot as u32 + 1)?;
        }
        frames.push(frame);
    }

    display.register_source(SyntheticPointer::new());

    let deadline = Instant::now() + Duration::from_millis(args.duration_ms);
    let poll = display.config().poll_interval();
    while Instant::now() < deadline && display.dispatch(poll) {}

    for frame in &frames {
        if let Err(e) = frame.destroy() {
            tracing::warn!(frame = %frame.id(), "destroy failed: {}", e);
        }
        let stats = frame.stats();
        tracing::info!(
            frame = %frame.id(),
            dispatched = stats.dispatched,
            presented = stats.frames_presented,
            stale = stats.stale_dropped,
            "frame finished"
        );
    }
    display.shutdown();
    Ok(())
}
