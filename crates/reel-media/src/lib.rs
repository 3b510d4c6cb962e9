//! FFmpeg CLI wrapper for narration rendering.
//!
//! This crate provides:
//! - A process runner seam (`CommandRunner`) with timeout and kill
//! - Type-safe multi-input FFmpeg command building
//! - Duration probing via ffprobe
//! - The narration mix + watermark render (`VideoRenderer`)
//! - Staging directory helpers

pub mod command;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod process;
pub mod render;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{move_file, remove_if_exists, reset_dir};
pub use probe::probe_duration;
pub use process::{CommandRunner, ProcessOutput, SystemRunner};
pub use render::{
    build_filter_graph, FfmpegRenderer, RenderConfig, RenderRequest, VideoRenderer,
    DEFAULT_WATERMARK_FONT, DEFAULT_WATERMARK_TEXT,
};
