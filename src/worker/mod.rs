//! Publish attempts and the loop that triggers them

pub mod publish;
pub mod scheduler;

pub use publish::{PublishSettings, Publisher, compose_caption, prepare_message};
pub use scheduler::{PublishJob, run_scheduler};
