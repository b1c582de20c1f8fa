// src/video.rs - Webcam capture and paced blank frames
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use image::{DynamicImage, ImageBuffer};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;
use tracing::{debug, info, warn};

use crate::config::CameraConfig;

pub enum VideoSource {
    Camera(Camera),
    /// Black frames at the configured rate, for detectors that need no camera.
    Blank(BlankFeed),
}

pub struct BlankFeed {
    width: u32,
    height: u32,
    interval: Duration,
    next_due: Instant,
}

#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub label: String,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

/// Human-readable names of the cameras the OS reports.
pub fn list_cameras() -> Result<Vec<String>> {
    let cameras = nokhwa::query(ApiBackend::Auto).context("failed to query cameras")?;
    Ok(cameras
        .iter()
        .map(|camera| format!("[{}] {}", camera.index(), camera.human_name()))
        .collect())
}

impl VideoSource {
    /// Open the camera and start streaming. Failing here is terminal for the
    /// session: there is no retry.
    pub fn open_camera(config: &CameraConfig) -> Result<Self> {
        info!(
            "opening camera {} at {}x{}@{}",
            config.index, config.width, config.height, config.fps
        );

        let format = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::MJPEG,
            config.fps,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera = Camera::new(CameraIndex::Index(config.index), requested)
            .map_err(|e| anyhow::anyhow!("failed to open camera {}: {}", config.index, e))?;
        camera
            .open_stream()
            .map_err(|e| anyhow::anyhow!("failed to start camera stream: {}", e))?;

        let resolution = camera.resolution();
        info!(
            "camera streaming at {}x{}@{}",
            resolution.width(),
            resolution.height(),
            camera.frame_rate()
        );
        Ok(VideoSource::Camera(camera))
    }

    pub fn blank(config: &CameraConfig) -> Self {
        let interval = Duration::from_secs_f64(1.0 / config.fps.max(1) as f64);
        VideoSource::Blank(BlankFeed {
            width: config.width,
            height: config.height,
            interval,
            next_due: Instant::now(),
        })
    }

    /// Next frame, unmirrored. Blocks until one is available.
    pub fn read_frame(&mut self) -> Result<DynamicImage> {
        match self {
            VideoSource::Camera(camera) => {
                let frame = camera
                    .frame()
                    .map_err(|e| anyhow::anyhow!("failed to capture frame: {}", e))?;
                let decoded = frame
                    .decode_image::<RgbFormat>()
                    .map_err(|e| anyhow::anyhow!("failed to decode frame: {}", e))?;

                let (width, height) = (decoded.width(), decoded.height());
                let img = ImageBuffer::from_raw(width, height, decoded.into_raw())
                    .context("frame buffer size does not match its dimensions")?;
                Ok(DynamicImage::ImageRgb8(img))
            }
            VideoSource::Blank(feed) => {
                let now = Instant::now();
                if feed.next_due > now {
                    std::thread::sleep(feed.next_due - now);
                }
                feed.next_due = feed.next_due.max(now) + feed.interval;
                Ok(DynamicImage::new_rgb8(feed.width, feed.height))
            }
        }
    }

    pub fn info(&self) -> VideoInfo {
        match self {
            VideoSource::Camera(camera) => {
                let resolution = camera.resolution();
                VideoInfo {
                    label: camera.info().human_name(),
                    fps: camera.frame_rate(),
                    width: resolution.width(),
                    height: resolution.height(),
                }
            }
            VideoSource::Blank(feed) => VideoInfo {
                label: "blank".to_string(),
                fps: (1.0 / feed.interval.as_secs_f64()).round() as u32,
                width: feed.width,
                height: feed.height,
            },
        }
    }

    pub fn is_camera(&self) -> bool {
        matches!(self, VideoSource::Camera(_))
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        if let VideoSource::Camera(camera) = self {
            debug!("stopping camera stream");
            if let Err(e) = camera.stop_stream() {
                warn!("failed to stop camera stream: {}", e);
            }
        }
    }
}
