/*! Wireworld client binary: connects to a simulator server, seeds it
from an image, and writes each received frame out as a PNG.

Issuing `R_FRAME` credits and consuming decoded frames run as two
independent loops (see `main`) so `--max-credit` actually bounds how
many requests can be outstanding on the wire at once, rather than
collapsing to a request/response ping-pong.
*/
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tokio::io::split;
use tokio::net::TcpStream;
use tokio::time::interval;

use wireworld::adapters::display::{FrameSink, PngFrameSink};
use wireworld::adapters::image::load_grid;
use wireworld::config::ClientConfig;
use wireworld::frame_buffer::{FrameBuffer, Mode};
use wireworld::grid::Grid;
use wireworld::proto::{client, server};

#[derive(clap::Parser, Debug)]
#[command(version, about = "Wireworld simulator client")]
struct Opt {
    /// Simulator server host.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Simulator server port.
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Initial-map image path.
    #[arg(long)]
    map: std::path::PathBuf,

    /// Integer downsampling factor from image pixels to grid cells.
    #[arg(long, default_value = "1")]
    cell_size: u32,

    /// Minimum interval between display updates, in milliseconds. 0 means
    /// free-run: display every frame as soon as it's decoded.
    #[arg(long, default_value = "0")]
    update_rate_ms: u64,

    /// Generations computed per emitted frame.
    #[arg(long, default_value = "1")]
    sampling: u32,

    /// Flow-control window size, in frames.
    #[arg(long, default_value_t = wireworld::config::DEFAULT_MAX_CREDIT)]
    max_credit: usize,

    /// Where to write each received frame, as a PNG.
    #[arg(long, default_value = "frame.png")]
    out: std::path::PathBuf,

    /// Write the resolved configuration as JSON to this path before
    /// connecting, as a sidecar for scripts that want to inspect or
    /// replay the effective settings.
    #[arg(long)]
    dump_config: Option<std::path::PathBuf>,

    /// Verbosity (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        log::error!("{e}");
        std::process::exit(exit_code_for(&e));
    }
}

/// `1` for a bind/connect/I/O/setup failure, `2` for a protocol error
/// (e.g. the server violating the credit window, or a malformed frame)
/// surfaced all the way up to the top level.
fn exit_code_for(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<wireworld::Error>() {
        Some(wireworld::Error::Protocol(_)) => 2,
        _ => 1,
    }
}

async fn run() -> Result<()> {
    let opt = Opt::parse();
    stderrlog::new()
        .module(module_path!())
        .module("wireworld")
        .quiet(false)
        .verbosity(opt.verbose as usize)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    if let Some(path) = &opt.dump_config {
        let cfg = ClientConfig {
            host: opt.host.clone(),
            port: opt.port,
            map: opt.map.clone(),
            cell_size: opt.cell_size,
            sampling: opt.sampling,
            update_interval_ms: (opt.update_rate_ms != 0).then_some(opt.update_rate_ms),
            max_credit: opt.max_credit,
        };
        let json = serde_json::to_string_pretty(&cfg).context("serializing client config")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing config sidecar to {}", path.display()))?;
        info!("wrote config sidecar to {}", path.display());
    }

    let initial = load_grid(&opt.map, opt.cell_size)
        .with_context(|| format!("loading initial map from {}", opt.map.display()))?;
    let (width, height) = (initial.width(), initial.height());

    let mut stream = TcpStream::connect((opt.host.as_str(), opt.port))
        .await
        .with_context(|| format!("connecting to {}:{}", opt.host, opt.port))?;
    info!("connected to {}:{}, map {width}x{height}", opt.host, opt.port);

    let init_frame = wireworld::codec::pack(&initial.iter_row_major().collect::<Vec<_>>());
    client::Message::Init {
        width,
        height,
        sampling: opt.sampling,
        frame: init_frame,
    }
    .write(&mut stream)
    .await?;

    let mode = if opt.update_rate_ms == 0 {
        Mode::FreeRun
    } else {
        Mode::Paced
    };
    let buf = Arc::new(Mutex::new(FrameBuffer::new(mode, opt.max_credit)));
    let mut sink = PngFrameSink::new(&opt.out);

    let (tx, mut shutdown) = tokio::sync::watch::channel(false);
    ctrlc::set_handler(move || {
        log::warn!("got Ctrl-C, stopping session");
        let _ = tx.send(true);
    })?;

    let (mut read_half, write_half) = split(stream);

    // The writer keeps spending credits and issuing R_FRAME independent of
    // how fast frames get decoded and displayed below, so `max_credit`
    // bounds the number of requests actually in flight on the wire.
    let writer = tokio::spawn(request_loop(write_half, Arc::clone(&buf), shutdown.clone()));

    let mut mirror = Grid::new(width, height);
    let mut timer = interval(Duration::from_millis(opt.update_rate_ms.max(1)));

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("shutdown requested, draining and closing");
                break;
            }
            msg = server::Message::read(&mut read_half, width, height) => {
                match msg? {
                    None => {
                        info!("server closed the connection");
                        break;
                    }
                    Some(server::Message::RectUpdate { x1, y1, x2, y2, frame }) => {
                        apply_rect(&mut mirror, x1, y1, x2, y2, &frame)?;
                    }
                    Some(server::Message::FrameEnd) => {
                        buf.lock().unwrap().enqueue(mirror.clone())?;
                        if mode == Mode::FreeRun {
                            while let Some(frame) = pop_and(&buf) {
                                sink.display(&frame).await?;
                            }
                        }
                    }
                }
            }
            _ = timer.tick(), if mode == Mode::Paced => {
                if let Some(frame) = pop_and(&buf) {
                    sink.display(&frame).await?;
                }
            }
        }
    }

    // Give the writer a brief window to flush R_STOP (if shutdown caused
    // the break) before dropping the socket out from under it.
    let _ = tokio::time::timeout(Duration::from_millis(200), writer).await;
    drop(read_half);
    Ok(())
}

/// Spends credits from `buf` and issues `R_FRAME` for as long as the
/// session is alive, independent of when frames get decoded or
/// displayed. Returns once `shutdown` fires, after sending `R_STOP`.
async fn request_loop(
    mut write_half: tokio::io::WriteHalf<TcpStream>,
    buf: Arc<Mutex<FrameBuffer>>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> Result<()> {
    loop {
        if *shutdown.borrow() {
            client::Message::Stop.write(&mut write_half).await?;
            return Ok(());
        }
        let spent = buf.lock().unwrap().spend_credit();
        if !spent {
            tokio::select! {
                _ = shutdown.changed() => continue,
                () = tokio::time::sleep(Duration::from_millis(10)) => continue,
            }
        }
        if let Err(e) = client::Message::Frame.write(&mut write_half).await {
            warn!("failed to send R_FRAME: {e}");
            return Err(e.into());
        }
    }
}

fn pop_and(buf: &Arc<Mutex<FrameBuffer>>) -> Option<Grid> {
    let mut out = None;
    buf.lock().unwrap().deliver_one(&mut |g: &Grid| out = Some(g.clone()));
    out
}

fn apply_rect(
    mirror: &mut Grid,
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    frame: &[u32],
) -> Result<()> {
    let cells = wireworld::codec::unpack(frame, ((x2 - x1) * (y2 - y1)) as usize)
        .context("unpacking A_RECT_UPDATE")?;
    let w = x2 - x1;
    for (i, cell) in cells.into_iter().enumerate() {
        let x = x1 + (i as u32 % w);
        let y = y1 + (i as u32 / w);
        mirror.set(x, y, cell);
    }
    Ok(())
}
