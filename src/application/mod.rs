//! Application layer - Use cases and the game state machine
//!
//! This layer contains:
//! - DTOs: the session-scoped `GameState` and structured subsystem results
//! - Ports: interfaces to the world store, narrator, LLM and random source
//! - Services: the game subsystems and the orchestrator that drives them

pub mod dto;
pub mod ports;
pub mod services;
