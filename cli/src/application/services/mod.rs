//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod agent_install;
pub mod cleanup;
pub mod guard;
pub mod legacy;
pub mod orchestrator;
pub mod preconditions;
pub mod runtime;
pub mod stager;
