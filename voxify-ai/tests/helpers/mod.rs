//! Test Helper Utilities
//!
//! Shared utilities for testing voxify-ai

#![allow(dead_code)]

pub mod audio_generator;
pub mod stub_models;

pub use audio_generator::{generate_breathing_wav, generate_test_wav, AudioConfig, Signal};
pub use stub_models::{test_service, CountingFusion, SoftmaxFusion, SpreadGate};
