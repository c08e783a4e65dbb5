use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use colored::*;
use dialoguer::{Input, Select};
use murmur_core::utils::{DEFAULT_MAX_SOUND_DISTANCE, DEFAULT_ROOM};
use murmur_core::{Avatar, PeerId, Position, RoomId};
use murmur_mesh::{
    IceCandidatePolicy, MeshContext, MeshHandle, MeshObserver, MeshSession, Microphone,
    SessionConfig,
};
use std::collections::HashMap;
use std::io::IsTerminal;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "murmur")]
#[command(about = "Join a spatial voice room from the terminal")]
#[command(
    long_about = "Join a spatial voice room from the terminal.\n\nNo audio device is captured: without --tone the participant is silent and reports volume 0."
)]
struct Args {
    /// Websocket address of the signaling relay.
    #[arg(long, default_value = "ws://127.0.0.1:3000/ws")]
    relay: String,

    #[arg(long, default_value = DEFAULT_ROOM)]
    room: String,

    #[arg(long)]
    nickname: Option<String>,

    /// 0 Horse, 1 Bear, 2 Pig, 3 Rabbit.
    #[arg(long)]
    avatar: Option<u32>,

    /// Frames per second driving movement and state sync.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    #[arg(long, default_value_t = DEFAULT_MAX_SOUND_DISTANCE)]
    max_sound_distance: f64,

    /// Keep ICE candidates that arrive before their session description.
    #[arg(long)]
    buffer_candidates: bool,

    /// Walk in circles instead of standing still.
    #[arg(long)]
    wander: bool,

    /// Feed a test tone to the level meter so peers see a non-zero volume.
    #[arg(long)]
    tone: bool,

    /// Never prompt for missing profile fields.
    #[arg(long)]
    no_prompt: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if args.fps == 0 {
        anyhow::bail!("--fps must be at least 1");
    }

    let (nickname, avatar) = resolve_profile(&args)?;
    let config = SessionConfig {
        room: RoomId::from_optional(Some(&args.room)),
        nickname,
        avatar: avatar.index(),
        max_sound_distance: args.max_sound_distance,
        candidate_policy: if args.buffer_candidates {
            IceCandidatePolicy::Buffer
        } else {
            IceCandidatePolicy::Drop
        },
        ..Default::default()
    };

    println!(
        "{} {} {} {}",
        "🎙️  Joining".green().bold(),
        config.room.to_string().cyan(),
        "as".green(),
        config.nickname.yellow()
    );

    let handle = MeshSession::connect(
        config,
        &args.relay,
        Microphone::new(),
        Box::new(ConsoleObserver::default()),
    )
    .await
    .context("Failed to start mesh session")?;

    run_frames(&handle, args.fps, args.wander, args.tone).await?;

    println!("{}", "👋 Leaving room...".cyan());
    handle.shutdown().await;
    Ok(())
}

/// Fills in nickname and avatar, asking on a terminal when they are missing.
fn resolve_profile(args: &Args) -> Result<(String, Avatar)> {
    let interactive = !args.no_prompt && std::io::stdin().is_terminal();

    let avatar = match args.avatar {
        Some(idx) => Avatar::from_index(idx),
        None if interactive => {
            let names: Vec<&str> = Avatar::ALL.iter().map(|a| a.name()).collect();
            let idx = Select::new()
                .with_prompt("Pick an avatar")
                .items(&names)
                .default(0)
                .interact()
                .context("Avatar prompt failed")?;
            Avatar::from_index(idx as u32)
        }
        None => Avatar::Horse,
    };

    let nickname = match &args.nickname {
        Some(n) => n.clone(),
        None if interactive => Input::<String>::new()
            .with_prompt("Nickname (empty for anonymous)")
            .allow_empty(true)
            .interact_text()
            .context("Nickname prompt failed")?,
        None => String::new(),
    };

    Ok((avatar.resolve_nickname(&nickname), avatar))
}

/// Drives ticks at `fps` until ctrl-c, printing the room every few seconds.
async fn run_frames(handle: &MeshHandle, fps: u32, wander: bool, tone: bool) -> Result<()> {
    let mut frames = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
    let mut status = tokio::time::interval(Duration::from_secs(5));
    let mut walker = wander.then(Walker::default);
    let mut tone = tone.then(Tone::default);
    let mut last = Instant::now();

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let now = Instant::now();
                let elapsed_ms = now.duration_since(last).as_secs_f64() * 1000.0;
                last = now;

                if let Some(t) = tone.as_mut() {
                    handle.microphone().push_pcm(&t.next_frame(elapsed_ms));
                }
                if let Some(w) = walker.as_mut() {
                    w.step(handle, elapsed_ms).await?;
                }
                handle.tick(elapsed_ms).await?;
            }
            _ = status.tick() => print_room(handle.context()),
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn print_room(ctx: &MeshContext) {
    let local = ctx.local_state();
    let peers = ctx.list_peers();

    println!(
        "{} {} at ({:.0}, {:.0}), {} peer(s)",
        "📍".bold(),
        local.nickname.yellow(),
        local.position.x,
        local.position.y,
        peers.len()
    );
    for id in peers {
        let Some(view) = ctx.peer(&id) else { continue };
        println!(
            "   {} {:<20} {:<22} gain {:.2}",
            "•".cyan(),
            view.state.nickname,
            view.handshake.to_string().dimmed(),
            view.gain
        );
    }
}

/// Simulated drag that keeps turning, so the avatar walks in a circle.
#[derive(Default)]
struct Walker {
    angle: f64,
    started: bool,
}

impl Walker {
    /// Radians per millisecond.
    const TURN_RATE: f64 = 0.0005;

    async fn step(&mut self, handle: &MeshHandle, elapsed_ms: f64) -> Result<()> {
        if !self.started {
            handle.pointer_down(Position::new(0.0, 0.0)).await?;
            self.started = true;
        }
        self.angle += Self::TURN_RATE * elapsed_ms;
        let at = Position::new(self.angle.sin(), self.angle.cos());
        handle.pointer_move(at).await?;
        Ok(())
    }
}

/// 440 Hz sine at 48 kHz, continuous across frames.
#[derive(Default)]
struct Tone {
    phase: f64,
}

impl Tone {
    const SAMPLE_RATE: f64 = 48_000.0;
    const FREQUENCY: f64 = 440.0;
    const AMPLITUDE: f64 = 0.3;

    fn next_frame(&mut self, elapsed_ms: f64) -> Vec<f32> {
        let len = (Self::SAMPLE_RATE * elapsed_ms / 1000.0).round() as usize;
        let step = 2.0 * std::f64::consts::PI * Self::FREQUENCY / Self::SAMPLE_RATE;
        (0..len)
            .map(|_| {
                let s = (Self::AMPLITUDE * self.phase.sin()) as f32;
                self.phase = (self.phase + step) % (2.0 * std::f64::consts::PI);
                s
            })
            .collect()
    }
}

/// Prints membership changes and renames.
#[derive(Default)]
struct ConsoleObserver {
    nicknames: Mutex<HashMap<PeerId, String>>,
}

#[async_trait]
impl MeshObserver for ConsoleObserver {
    async fn on_peer_created(&self, _ctx: &MeshContext, peer_id: PeerId) {
        println!("{} {}", "🤝 Connecting to".green(), peer_id.to_string().cyan());
    }

    async fn on_peer_updated(&self, ctx: &MeshContext, peer_id: PeerId) {
        let Some(nickname) = ctx.nickname(&peer_id) else {
            return;
        };
        let mut known = self.nicknames.lock().await;
        if known.get(&peer_id) == Some(&nickname) {
            return;
        }
        println!(
            "{} {} {}",
            peer_id.to_string().cyan(),
            "is".green(),
            nickname.yellow()
        );
        known.insert(peer_id, nickname);
    }

    async fn on_peer_removed(&self, _ctx: &MeshContext, peer_id: PeerId) {
        let name = self
            .nicknames
            .lock()
            .await
            .remove(&peer_id)
            .unwrap_or_else(|| peer_id.to_string());
        println!("{} {}", "🚪 Left:".red(), name.yellow());
    }
}
