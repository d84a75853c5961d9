pub mod audit;
pub mod config;
pub mod global_index;
pub mod index_writer;
pub mod link_fill;
pub mod local_index;
pub mod paths;
pub mod prune;
pub mod render;
pub mod tag_map;
pub mod tag_parser;
pub mod util;
pub mod walk;
pub mod warn;
