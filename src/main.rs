//! A cannon barrel that swings up, squashes, stretches and swings back down,
//! hinged on its mount.
//!
//! Run from a directory containing `image/cannon.png` and
//! `image/cannon_mount.png`. Set `RUST_LOG=debug` to watch stage changes.

use std::process::ExitCode;

use env_logger::Env;
use swivel::{AppConfig, AppError, CannonConfig, CannonScene, Color, run_with_config};

fn main() -> ExitCode {
    let env = Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), AppError> {
    let mut scene = CannonScene::load(CannonConfig::default())?;

    let config = AppConfig::new()
        .title("Rotate and scale around a pivot")
        .size(400, 300)
        .target_fps(60)
        .background(Color::from_srgb8(192, 192, 192));

    run_with_config(config, move |ctx| {
        let mount = ctx.sprite(scene.mount(), "Cannon Mount");

        move |frame| {
            let anchor = CannonScene::anchor(frame.size());

            match scene.cannon_placement(anchor) {
                Ok(placement) => frame.placement(&placement),
                Err(e) => {
                    frame.fail(e);
                    return;
                }
            }

            let mount_pos = scene.mount_position(anchor);
            frame.sprite(mount, mount_pos.x, mount_pos.y);

            scene.advance();
        }
    })
}
