//! Scenelink CLI
//!
//! Headless bridge driver: runs the full bridge against the in-memory scene
//! and exercises the remote-control surface — camera listing, playback
//! mirroring, keyframe writes and a short capture stream. Useful as a smoke
//! test without a DCC host.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use scenelink::{
    CaptureConfig, CaptureMode, FramePayload, MemoryScene, SceneBridge, Transform,
};

#[derive(Parser, Debug)]
#[command(name = "scenelink-cli", about = "Headless scenelink bridge driver")]
struct Args {
    /// Number of capture frames to pull
    #[arg(long, default_value_t = 3)]
    frames: u32,

    /// Capture mode: region | buffer | pointer
    #[arg(long, default_value = "buffer")]
    mode: String,

    /// Capture width in pixels
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Capture height in pixels
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Emit a JSON summary instead of log lines
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    scenelink::init_logging();
    let args = Args::parse();

    let mode = match args.mode.as_str() {
        "region" => CaptureMode::ScreenshotRegion,
        "buffer" => CaptureMode::Buffer,
        "pointer" => CaptureMode::BufferPointer,
        other => anyhow::bail!("unknown capture mode '{other}'"),
    };

    let scene = MemoryScene::new()
        .with_camera("Camera")
        .with_camera("ShotCam")
        .with_capture(CaptureConfig::new(mode, args.width, args.height))
        .with_capture_origin(100.0, 60.0)
        .with_script("Reset Camera", true);

    let (bridge, worker) = SceneBridge::spawn(scene);

    bridge.notify_client_connected("127.0.0.1", 23354)?;

    let cameras = bridge.list_cameras()?;
    let state = bridge.playback_state()?;
    let fps = bridge.playback_fps()?;
    info!(?cameras, ?state, fps, "scene synchronized");

    let current = cameras.first().cloned().unwrap_or_default();
    bridge.look_through(&current)?;
    bridge.set_transform_keys(
        &current,
        vec![state.range_start, state.range_end],
        vec![Transform::IDENTITY, Transform::IDENTITY],
    )?;

    let negotiated = bridge.start_capture()?;
    info!(
        mode = ?negotiated.mode,
        width = negotiated.resolution.width,
        height = negotiated.resolution.height,
        vertical_flip = negotiated.vertical_flip,
        "capture negotiated"
    );
    let mut frame_log = Vec::new();
    for index in 0..args.frames {
        let frame = bridge.request_frame(&current)?;
        let payload = match frame.payload {
            FramePayload::Region { x, y } => format!("region origin ({x}, {y})"),
            FramePayload::Snapshot(data) => format!("snapshot of {} bytes", data.len()),
            FramePayload::Pointer { addr, len } => format!("pointer {addr:#x} ({len} bytes)"),
        };
        info!(
            index,
            width = frame.resolution.width,
            height = frame.resolution.height,
            resized = frame.resized,
            %payload,
            "frame delivered"
        );
        frame_log.push(payload);
    }
    bridge.stop_capture()?;
    bridge.remove_keys(&current)?;

    bridge.notify_client_disconnected()?;
    bridge.shutdown();
    let _ = worker.join();

    if args.json {
        let summary = serde_json::json!({
            "cameras": cameras,
            "fps": fps,
            "frames": frame_log,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
