//! MapFE — an interactive administrative-map widget.
//!
//! The core pipeline: a region config document maps flat canvas colors to
//! named regions ([`registry`]), the loaded raster is cached pristine
//! ([`raster`]), borders are extracted once per load ([`borders`]), clicks
//! resolve to regions by exact color ([`hittest`]), and the displayed frame
//! is rebuilt from the caches plus the current selection ([`selection`],
//! [`compositor`]). [`session`] bundles all per-map state; [`maps`] finds
//! and loads map config/image pairs; [`app`] is the egui shell.

pub mod logger;

pub mod borders;
pub mod compositor;
pub mod hittest;
pub mod maps;
pub mod raster;
pub mod registry;
pub mod selection;
pub mod session;

pub mod app;
pub mod components;
