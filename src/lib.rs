//! # Tahadi Challenge Library
//!
//! This library provides the core logic for the Tahadi multiplayer
//! challenge system. It handles the challenge catalog, lobby sessions and
//! their lifecycle, presence and status broadcasts, the per-participant
//! play loop, and result submission with ranking.
//!
//! The library is pure logic: networking, persistence, and timers live
//! behind the [`channel::Channel`], [`store::SessionStore`],
//! [`results::ResultStore`], and [`question::QuestionSource`] seams, and
//! the embedding event loop drives the countdown by calling
//! [`play::PlayLoop::tick`] once per second.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::doc_markdown)]

pub mod constants;

pub mod catalog;
pub mod channel;
pub mod lobby;
pub mod play;
pub mod question;
pub mod results;
pub mod store;
