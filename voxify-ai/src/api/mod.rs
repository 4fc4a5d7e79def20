//! HTTP API handlers for voxify-ai
//!
//! - `GET /health`
//! - `POST /filter`: respiratory-sound screening
//! - `POST /predict`: disease diagnosis

pub mod access;
pub mod health;
pub mod inference;

pub use access::AudioRoot;
pub use health::health_routes;
pub use inference::inference_routes;
