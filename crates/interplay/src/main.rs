mod scenario_file;
mod viewer;

use std::path::PathBuf;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use clap::Parser;
use interplay_macros::interaction_listener;

use interplay_client::ClientPlugin;
use interplay_client::events::InteractionEvent;
use interplay_protocol::transport::create_local_transport;
use interplay_server::ServerPlugin;

use scenario_file::{Overrides, load_scenario};
use viewer::{ScriptedViewer, drive_viewer, log_prompt};

const FRAME: Duration = Duration::from_nanos(16_666_667);

#[derive(Parser)]
#[command(name = "interplay")]
#[command(about = "Interplay - headless focus and interaction demo")]
struct Args {
    /// Scenario file (JSON); the built-in corridor is used when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override the focus check interval, in seconds
    #[arg(long)]
    check_interval: Option<f32>,

    /// How long the scripted viewer holds the interact key, in seconds
    #[arg(long, default_value_t = 2.0)]
    hold: f32,

    /// Number of simulated frames (60 per second)
    #[arg(long, default_value_t = 1500)]
    frames: u32,

    /// Player name
    #[arg(long, default_value = "Player")]
    player_name: String,
}

struct LogListener;

#[interaction_listener]
impl LogListener {
    #[Event::FocusBegun]
    fn on_focus(&self, event: &InteractionEvent) {
        info!(
            "Entity {} focused object {}",
            event.entity.0, event.interactable.index
        );
    }

    #[Event::InteractBegun]
    fn on_begin(&self, event: &InteractionEvent) {
        info!(
            "Entity {} started interacting with object {}",
            event.entity.0, event.interactable.index
        );
    }

    #[Event::InteractEnded]
    fn on_end(&self, event: &InteractionEvent) {
        info!(
            "Entity {} stopped interacting with object {}",
            event.entity.0, event.interactable.index
        );
    }

    #[Event::Interacted]
    fn on_interacted(&self, event: &InteractionEvent) {
        info!(
            "Entity {} completed interaction with object {}",
            event.entity.0, event.interactable.index
        );
    }
}

fn main() -> AppExit {
    let args = Args::parse();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
        .add_plugins(LogPlugin::default())
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));

    let overrides = Overrides {
        check_interval: args.check_interval,
    };
    let scenario = match load_scenario(args.scenario.as_deref(), overrides) {
        Ok(scenario) => scenario,
        Err(e) => {
            error!("{}", e);
            return AppExit::error();
        }
    };
    info!(
        "Scenario with {} prop(s), walk of {:.1}s",
        scenario.props.len(),
        scenario.walk.duration
    );

    // Solo mode: embedded server + local transport
    let (client_transport, server_transport) = create_local_transport();
    app.add_plugins(ServerPlugin::new(server_transport, &scenario))
        .add_plugins(
            ClientPlugin::new(Box::new(client_transport), &scenario, args.player_name)
                .with_listener(LogListener),
        )
        .insert_resource(ScriptedViewer::new(scenario.walk, args.hold, args.frames))
        .add_systems(Update, drive_viewer)
        .add_systems(PostUpdate, log_prompt);

    app.run()
}
