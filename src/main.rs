/*
 * Logo Morph
 *
 * A particle cloud that morphs between two logos. Every particle is pulled
 * toward a point of the current logo; clicking morphs the cloud into the
 * other logo with staggered, eased timing. Flocking layers separation,
 * alignment and cohesion on top, and the pointer pushes particles away.
 *
 * Configuration is read from logomorph.toml or the file named by
 * LOGOMORPH_CONFIG; logos are decoded before the window opens.
 */

use std::process::ExitCode;

use logomorph::{app, Simulation, SimulationParams};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let simulation = match SimulationParams::load().and_then(Simulation::load) {
        Ok(simulation) => simulation,
        Err(err) => {
            tracing::error!(error = %err, "failed to start simulation");
            return ExitCode::FAILURE;
        }
    };

    app::preload(simulation);
    nannou::app(app::model).update(app::update).run();
    ExitCode::SUCCESS
}
