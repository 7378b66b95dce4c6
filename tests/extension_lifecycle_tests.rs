use std::sync::Arc;
use tokio::time::{sleep, Duration};
use waniboard::core::{Bounds, DrawableId, DrawableShape, EntityId, Frame, Target};
use waniboard::hal::mock::{FixedStepClock, SimulatedAudioGraph, SimulatedCamera, StaticRenderer};
use waniboard::hal::{Host, StepClock};
use waniboard::{BlockOpcode, BlockValue, SensingConfig, WaniBoard};

fn textured(shift: u32) -> Frame {
    Frame::from_luma_fn(480, 360, |x, y| {
        let x = x as f64 - shift as f64;
        (128.0 + 50.0 * (0.4 * x).sin() + 50.0 * (0.4 * y as f64).sin()) as u8
    })
}

fn host(camera: Arc<SimulatedCamera>, audio: &SimulatedAudioGraph) -> Host {
    let renderer = Arc::new(StaticRenderer::new());
    renderer.insert(DrawableId(1), DrawableShape::new(Bounds::new(-120.0, 120.0, -90.0, 90.0)));

    Host::new(renderer, Arc::new(FixedStepClock::new(Duration::from_millis(16))))
        .with_video(camera)
        .with_audio(Arc::new(audio.clone()))
}

fn sprite() -> Target {
    Target::new(EntityId(1))
        .with_drawable(DrawableId(1))
        .with_sound_bank()
}

#[tokio::test(start_paused = true)]
async fn test_no_video_device_stays_inactive() {
    let camera = Arc::new(SimulatedCamera::unavailable());
    let audio = SimulatedAudioGraph::new();
    let mut board = WaniBoard::new(host(camera.clone(), &audio), SensingConfig::default());

    sleep(Duration::from_millis(500)).await;

    assert!(!board.is_sensing());
    assert!(!camera.is_enabled());
    assert_eq!(camera.request_count(), 0);
    assert_eq!(board.metrics().wakeups(), 0);
    assert!(!board.brightness_below_threshold());
    assert!(!board.motion_above_threshold(&sprite()));
}

#[tokio::test(start_paused = true)]
async fn test_video_enabled_with_preview_ghost() {
    let camera = Arc::new(SimulatedCamera::new());
    let audio = SimulatedAudioGraph::new();
    let mut board = WaniBoard::new(host(camera.clone(), &audio), SensingConfig::default());

    assert!(board.is_sensing());
    assert!(camera.is_enabled());
    assert_eq!(camera.ghost_level(), Some(89));

    board.shutdown().await.unwrap();
    assert!(!board.is_sensing());
}

#[tokio::test(start_paused = true)]
async fn test_dark_scene_reads_below_threshold() {
    let camera = Arc::new(SimulatedCamera::new());
    camera.set_constant_frame(Some(Frame::filled(480, 360, [20, 20, 20, 255])));
    let audio = SimulatedAudioGraph::new();
    let mut board = WaniBoard::new(host(camera, &audio), SensingConfig::default());

    assert!(!board.brightness_below_threshold());
    sleep(Duration::from_millis(200)).await;

    assert!(board.frames_ingested() > 0);
    assert_eq!(
        board.execute(BlockOpcode::WhenBrightLessThan, &sprite()).await,
        BlockValue::Bool(true)
    );
    board.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_bright_scene_reads_above_threshold() {
    let camera = Arc::new(SimulatedCamera::new());
    camera.set_constant_frame(Some(Frame::filled(480, 360, [200, 200, 200, 255])));
    let audio = SimulatedAudioGraph::new();
    let mut board = WaniBoard::new(host(camera, &audio), SensingConfig::default());

    sleep(Duration::from_millis(200)).await;
    assert!(!board.brightness_below_threshold());
    board.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_moving_scene_detected_in_sprite_region() {
    let camera = Arc::new(SimulatedCamera::new());
    for shift in 0..20 {
        camera.push_frame(textured(shift));
    }
    let audio = SimulatedAudioGraph::new();
    let mut board = WaniBoard::new(host(camera, &audio), SensingConfig::default());

    sleep(Duration::from_millis(200)).await;
    assert!(board.frames_ingested() >= 2);

    assert_eq!(
        board.execute(BlockOpcode::WhenMotionGreaterThan, &sprite()).await,
        BlockValue::Bool(true)
    );
    let state = board.motion_state(EntityId(1)).unwrap();
    assert_eq!(state.last_analyzed_frame_number, board.frames_ingested());
    assert!(state.motion_amount > 10.0);

    board.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_still_scene_not_detected() {
    let camera = Arc::new(SimulatedCamera::new());
    camera.set_constant_frame(Some(textured(0)));
    let audio = SimulatedAudioGraph::new();
    let mut board = WaniBoard::new(host(camera, &audio), SensingConfig::default());

    sleep(Duration::from_millis(200)).await;
    assert!(!board.motion_above_threshold(&sprite()));
    assert_eq!(board.motion_state(EntityId(1)).unwrap().motion_amount, 0.0);

    board.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_output_commands_through_dispatch() {
    let camera = Arc::new(SimulatedCamera::new());
    let audio = SimulatedAudioGraph::new();
    let mut board = WaniBoard::new(host(camera, &audio), SensingConfig::default());

    let value = board.execute(BlockOpcode::SwitchOn, &sprite()).await;
    assert_eq!(value, BlockValue::Unit);
    assert!(board.output_state().is_active());
    assert_eq!(board.output_frequency(), Some(17000.0));

    board.execute(BlockOpcode::SwitchOn, &sprite()).await;
    assert_eq!(audio.live_oscillators(), 1);

    board.execute(BlockOpcode::SwitchOff, &Target::new(EntityId(2))).await;
    assert!(!board.output_state().is_active());
    assert_eq!(audio.live_oscillators(), 0);

    board.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_silences_output() {
    let camera = Arc::new(SimulatedCamera::new());
    let audio = SimulatedAudioGraph::new();
    let mut board = WaniBoard::new(host(camera.clone(), &audio), SensingConfig::default());

    board.switch_on(&sprite()).await;
    board.shutdown().await.unwrap();

    assert!(!board.output_state().is_active());
    assert_eq!(audio.live_oscillators(), 0);

    let requests = camera.request_count();
    sleep(Duration::from_millis(300)).await;
    assert_eq!(camera.request_count(), requests);
}

#[test]
fn test_construction_outside_runtime_stays_inactive() {
    let camera = Arc::new(SimulatedCamera::new());
    let audio = SimulatedAudioGraph::new();
    let board = WaniBoard::new(host(camera.clone(), &audio), SensingConfig::default());

    assert!(!board.is_sensing());
    assert!(!camera.is_enabled());
}

#[test]
fn test_explicit_runtime_starts_loop_outside_runtime() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let camera = Arc::new(SimulatedCamera::new());
    let audio = SimulatedAudioGraph::new();
    let host = host(camera.clone(), &audio).with_runtime(runtime.handle().clone());
    let mut board = WaniBoard::new(host, SensingConfig::default());

    assert!(board.is_sensing());
    assert!(camera.is_enabled());

    runtime.block_on(async {
        sleep(Duration::from_millis(100)).await;
        board.shutdown().await.unwrap();
    });
    assert!(camera.request_count() > 0);
    assert!(!board.is_sensing());
}

/// Step clock that takes the acquisition task down with it
struct BrokenClock;

impl StepClock for BrokenClock {
    fn current_step_interval(&self) -> Duration {
        panic!("step timer gone")
    }
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_silences_output_after_loop_failure() {
    let camera = Arc::new(SimulatedCamera::new());
    let audio = SimulatedAudioGraph::new();
    let host = Host::new(Arc::new(StaticRenderer::new()), Arc::new(BrokenClock))
        .with_video(camera)
        .with_audio(Arc::new(audio.clone()));
    let mut board = WaniBoard::new(host, SensingConfig::default());

    board.switch_on(&sprite()).await;
    sleep(Duration::from_millis(50)).await;
    assert!(!board.is_sensing());

    assert!(board.shutdown().await.is_err());
    assert!(!board.output_state().is_active());
    assert_eq!(audio.live_oscillators(), 0);
}
