#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::ignored_unit_patterns
)]

pub mod config;
pub mod console;
pub mod daemon;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod link;
pub mod model;
pub mod notifier;
pub mod poller;
pub mod push;
pub mod render;
pub mod transport;
