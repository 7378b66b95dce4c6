use std::sync::Arc;
use std::time::Duration;

use waniboard::core::{Bounds, DrawableId, DrawableShape, EntityId, Frame, Target};
use waniboard::hal::mock::{FixedStepClock, SimulatedAudioGraph, SimulatedCamera, StaticRenderer};
use waniboard::hal::Host;
use waniboard::observability::SensingMonitor;
use waniboard::{BlockOpcode, SensingConfig, WaniBoard};

fn textured(shift: u32) -> Frame {
    Frame::from_luma_fn(480, 360, |x, y| {
        let x = x as f64 - shift as f64;
        (128.0 + 50.0 * (0.4 * x).sin() + 50.0 * (0.4 * y as f64).sin()) as u8
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("WaniBoard - Sensing Demo");
    println!("========================\n");

    let camera = Arc::new(SimulatedCamera::new());
    for shift in 0..8 {
        camera.push_frame(textured(shift));
    }
    camera.set_constant_frame(Some(Frame::filled(480, 360, [20, 20, 20, 255])));

    let renderer = Arc::new(StaticRenderer::new());
    renderer.insert(DrawableId(1), DrawableShape::new(Bounds::new(-120.0, 120.0, -90.0, 90.0)));

    let audio = SimulatedAudioGraph::new();
    let host = Host::new(renderer, Arc::new(FixedStepClock::new(Duration::from_millis(16))))
        .with_video(camera.clone())
        .with_audio(Arc::new(audio.clone()));

    let mut board = WaniBoard::new(host, SensingConfig::default());
    let sprite = Target::new(EntityId(1))
        .with_drawable(DrawableId(1))
        .with_sound_bank();

    // Let a couple of moving frames arrive
    tokio::time::sleep(Duration::from_millis(150)).await;
    let moving = board.execute(BlockOpcode::WhenMotionGreaterThan, &sprite).await;
    println!("motion detected: {:?}", moving);

    // Wait for the scripted frames to run out and the dark frame to take over
    tokio::time::sleep(Duration::from_millis(600)).await;
    let dark = board.execute(BlockOpcode::WhenBrightLessThan, &sprite).await;
    println!("dark: {:?}", dark);

    board.execute(BlockOpcode::SwitchOn, &sprite).await;
    println!("output: {:?}", board.output_state());
    board.execute(BlockOpcode::SwitchOff, &sprite).await;
    println!("output: {:?}", board.output_state());

    board.shutdown().await?;

    println!("\n{}", SensingMonitor::new(board.metrics()).generate_report());
    println!("audio events: {:?}", audio.events());

    Ok(())
}
