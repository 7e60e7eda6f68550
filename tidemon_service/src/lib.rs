pub mod analysis;
pub mod collect;
pub mod config;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod parse;
pub mod ports;
