pub mod config;
pub mod dag;
pub mod files;
pub mod format;
pub mod generator;
pub mod noise;
pub mod storage;
pub mod submit;
pub mod workspace;
