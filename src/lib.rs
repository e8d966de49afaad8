#![warn(missing_docs)]
#![deny(unsafe_code)]
#![doc = include_str!("../README.md")]

mod config;
mod error;
mod paths;
mod resolved;
mod source;
mod template;
mod value;
mod view;

pub use config::Configuration;
pub use error::{ConfigError, ReadError};
pub use paths::{config_dirs, SearchPaths, CONFIG_FILENAME};
pub use resolved::Resolved;
pub use source::Source;
pub use template::{as_template, Shorthand, Template};
pub use value::{Kind, Map, Value};
pub use view::{Candidates, Key, RootView, View};
