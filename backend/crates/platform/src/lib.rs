//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Deployment environment configuration
//! - Cryptographic utilities (random secrets, constant-time comparison)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Cookie management

pub mod config;
pub mod cookie;
pub mod crypto;
pub mod password;
