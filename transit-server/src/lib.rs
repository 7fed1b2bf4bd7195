//! Multi-mode transit journey planner.
//!
//! Answers: "what is the earliest way from stop A to stop B departing at
//! time T on date D, using public transport?" Static GTFS bundles for
//! several modes merge into one catalogue; a connection-scan planner finds
//! earliest-arrival journeys per mode; an optional GTFS-realtime overlay
//! adjusts the result by live delays.

pub mod cache;
pub mod calendar;
pub mod config;
pub mod domain;
pub mod feed;
pub mod planner;
pub mod realtime;
pub mod stops;
pub mod web;
