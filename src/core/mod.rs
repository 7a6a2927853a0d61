//! Core redaction building blocks: configuration, the decoded canvas, and the
//! processing stages (sizing, region estimation, pixelation, boundary smoothing,
//! detection downsampling) tied together by the redaction pipeline.
pub mod canvas;
pub mod config;
pub mod processing;
