use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::*;

use rusty_track::args::Args;
use rusty_track::camera::{CameraSource, FrameSource};
use rusty_track::channel::DataChannel;
use rusty_track::config::AppConfig;
use rusty_track::pipeline::{ColorPipeline, Pipeline};
use rusty_track::publish::{ConsoleSink, ErrorSink};
use rusty_track::selector::{PipelineKind, PipelineSelector};
use rusty_track::worker::{VisionWorker, WorkerOptions};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.list {
        let cameras = nokhwa::query(nokhwa::utils::ApiBackend::Auto)?;
        println!("Available Cameras:");
        println!("{:<5} | {:<30} | {:<10}", "Index", "Name", "Misc");
        println!("{}", "-".repeat(60));
        for cam in cameras {
            println!(
                "{:<5} | {:<30} | {:?}",
                cam.index(),
                cam.human_name(),
                cam.misc()
            );
        }
        return Ok(());
    }

    // 0. Load config, apply CLI overrides.
    let mut config = AppConfig::load()?;
    if args.verbose {
        config.worker.verbose = true;
    }
    let cam_index = args.cam_index.unwrap_or(config.camera.index);

    // 1. Zero error is the horizontal center of the configured resolution.
    let target_position = config.camera.width as f64 / 2.0;

    // 2. Variant registry and initial selection.
    let initial = match args.pipeline.as_deref() {
        None => Some(PipelineKind::Cube),
        Some("none") => None,
        Some(name) => Some(name.parse()?),
    };
    let registry: Vec<(PipelineKind, Box<dyn Pipeline>)> = vec![
        (
            PipelineKind::Cube,
            Box::new(
                ColorPipeline::new("cube", &config.cube, target_position)
                    .with_verbose(config.worker.verbose),
            ),
        ),
        (
            PipelineKind::Tape,
            Box::new(
                ColorPipeline::new("tape", &config.tape, target_position)
                    .with_verbose(config.worker.verbose),
            ),
        ),
    ];
    let selector = Arc::new(PipelineSelector::new(registry, initial));

    // 3. Channels and worker thread.
    let data = Arc::new(DataChannel::new(config.worker.data_depth));
    let feed = args
        .feed
        .then(|| Arc::new(DataChannel::<Vec<u8>>::new(config.worker.feed_depth)));
    let options = WorkerOptions {
        cadence: Duration::from_millis(config.worker.cadence_ms),
        jpeg_quality: config.worker.jpeg_quality,
    };
    let (cam_width, cam_height) = (config.camera.width, config.camera.height);
    let worker = VisionWorker::start(
        move || {
            let camera = CameraSource::new(cam_index, cam_width, cam_height)?;
            Ok(Box::new(camera) as Box<dyn FrameSource>)
        },
        Arc::clone(&selector),
        Arc::clone(&data),
        feed.clone(),
        options,
    );

    worker.enable();
    match selector.active() {
        Some(kind) => println!("{}", format!("Tracking enabled: {kind}").green()),
        None => println!("{}", "Tracking enabled, no active pipeline".yellow()),
    }

    // 4. Consumer loop: poll the data channel, forward to the publisher.
    let mut sink = ConsoleSink;
    let poll = Duration::from_millis(config.worker.poll_ms);
    let mut stall_reported = false;
    loop {
        if let Some(error) = data.get() {
            sink.publish(error)?;
        }

        if let Some(feed) = &feed {
            // Latest preview only; stale frames are worthless.
            if let Some(jpeg) = feed.get_latest() {
                std::fs::write("preview.jpg", jpeg)?;
            }
        }

        let stalled = worker.since_heartbeat() > Duration::from_secs(2);
        if stalled && !stall_reported {
            eprintln!("{}", "Vision worker heartbeat stalled".red());
        }
        stall_reported = stalled;

        std::thread::sleep(poll);
    }
}
