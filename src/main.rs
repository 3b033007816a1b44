//! Shared Space Demo
//!
//! Runs two clients against an in-memory channel on a virtual clock.
//! One drags its joystick across the space, the other watches it arrive,
//! then taps it.
//!
//! Usage: `shared-space-demo [config.json]`

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use shared_space::{
    config::ClientConfig,
    core::{Clock, ManualClock, Vec2},
    game::{tick, ClientState, GestureOutcome},
    network::{ChannelEvent, LoopbackChannel, LoopbackHub, ParticipantId, PresenceChannel},
    FRAME_RATE, VERSION,
};

/// Frame period on the virtual clock.
const FRAME_MS: u64 = 16;

/// Demo length in frames.
const DEMO_FRAMES: u32 = 3 * FRAME_RATE;

struct DemoClient {
    state: ClientState,
    channel: LoopbackChannel,
    inbound: tokio::sync::mpsc::UnboundedReceiver<ChannelEvent>,
}

impl DemoClient {
    fn join(hub: &LoopbackHub, config: &ClientConfig, name: &str) -> anyhow::Result<Self> {
        let id = ParticipantId::new(name);
        let (mut channel, inbound) = hub.connect(id.clone());
        channel.subscribe()?;
        Ok(Self {
            state: ClientState::new(config.clone(), id),
            channel,
            inbound,
        })
    }

    fn pump(&mut self, now: u64) {
        while let Ok(event) = self.inbound.try_recv() {
            self.state.apply_channel_event(event, &mut self.channel, now);
        }
    }

    fn frame(&mut self, now: u64) -> Vec<GestureOutcome> {
        self.pump(now);
        tick(&mut self.state, &mut self.channel, now).outcomes
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::load(&path)?,
        None => ClientConfig::default(),
    };

    info!("Shared Space Client v{}", VERSION);
    info!(
        "Publish interval: {} ms, sync window: {} s",
        config.network.publish_interval_ms, config.network.remote_sync_window_seconds
    );

    demo_session(&config)
}

/// Drive two clients through a drag and a tap.
fn demo_session(config: &ClientConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Session ===");

    let clock = ManualClock::new(0);
    let hub = LoopbackHub::new();
    let mut alice = DemoClient::join(&hub, config, "alice")?;
    let mut bob = DemoClient::join(&hub, config, "bob")?;

    let center = config.camera.viewport() / 2.0;
    let mut published = 0;

    for frame in 0..DEMO_FRAMES {
        clock.advance(FRAME_MS);
        let now = clock.now_ms();

        match frame {
            10 => alice.state.pointer_down(center, now),
            11 => alice.state.pointer_move(center + Vec2::new(120.0, -40.0)),
            120 => alice.state.pointer_up(now),
            _ => {}
        }

        alice.pump(now);
        let result = tick(&mut alice.state, &mut alice.channel, now);
        if result.published() {
            published += 1;
        }
        bob.frame(now);

        if frame % 30 == 0 {
            let seen = bob
                .state
                .remotes()
                .get(&alice.state.local_id)
                .map(|remote| remote.drawn);
            info!(
                "Frame {}: alice at {}, bob draws alice at {:?}",
                frame,
                alice.state.local_position(),
                seen
            );
        }
    }

    info!("Alice published {} times", published);

    // Bob taps where he draws Alice.
    let Some(target) = bob.state.remotes().get(&alice.state.local_id).map(|r| r.drawn) else {
        info!("Bob never saw Alice");
        return Ok(());
    };
    let screen = bob.state.camera().world_to_screen(target);

    let now = clock.now_ms();
    bob.state.pointer_down(screen, now);
    clock.advance(FRAME_MS);
    bob.state.pointer_up(clock.now_ms());
    clock.advance(FRAME_MS);

    for outcome in bob.frame(clock.now_ms()) {
        match outcome {
            GestureOutcome::EntitySelected { id, position } => {
                info!("Bob selected {} at {}", id, position);
            }
            other => info!("Bob's tap resolved to {:?}", other),
        }
    }

    info!("=== Demo Complete ===");
    Ok(())
}
