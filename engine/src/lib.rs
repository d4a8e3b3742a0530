//! Dashboard core for a robotic hand.
//!
//! Talks to the hand controller over HTTP, keeps the last known readings
//! for display and poses a skeletal hand model from finger controls.

pub mod client;
pub mod config;
pub mod drive;
pub mod fps_counter;
pub mod grasp;
pub mod model;
pub mod panel;
pub mod poller;
pub mod protocol;
pub mod visualizer;

pub use self::{
    client::{Backend, ClientError, HttpBackend},
    config::{Config, ConfigError},
    drive::{DriveBinding, LiveDrive},
    grasp::GraspCycle,
    model::{load_skeleton, ModelError},
    panel::Panel,
    poller::{Endpoint, Poller, Update},
    protocol::{GraspCommand, GraspState, StatusReport},
    visualizer::Visualizer,
};
