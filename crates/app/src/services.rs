//! Application services.
//!
//! Each service is generic over the ports it drives, so the binaries pick the
//! `reqwest`/`rumqttc` adapters and the tests pick in-memory doubles.

pub mod assignment;
pub mod command_responder;
pub mod telemetry_publisher;
