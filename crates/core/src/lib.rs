//! Core model for infractl: environment configuration and stack composition.

pub mod config;
pub mod stack;

pub use config::{ConfigError, DeployConfig, EnvConfig, PolicyOverrides};
pub use stack::{merge, Module, Output, Stack, StackError};
