#![doc = "shuttle-routes-core: extraction, validation and publishing engine for shuttle-routes."]

//! This crate turns free-form shuttle notices (crawled fragments or OCR text) into a
//! canonical, geocoded and quality-scored route catalog.
//! It performs no network access, no OCR and no geocoding of its own; coordinates come
//! from an implementor of [`contract::Geocoder`].
//!
//! # Usage
//! Build a [`config::CatalogConfig`] once, then call [`catalog::build_catalog`] or drive
//! [`catalog::CatalogEngine`] stage by stage.

pub mod artifact;
pub mod assemble;
pub mod attach;
pub mod catalog;
pub mod catalog_model;
pub mod config;
pub mod contract;
pub mod emit;
pub mod error;
pub mod input;
pub mod quality;
pub mod repair;
pub mod schedule;
pub mod segment;
pub mod stops;
pub mod validate;
