pub mod api;
pub mod config;
pub mod error;
pub mod lexer;
pub mod machine;
pub mod parser;
pub mod scope;
pub mod serialization;

pub use api::{parse, parse_bytes, parse_file, parse_with_base};
pub use config::{Config, Value};
pub use error::{ConfigError, GlpsError, MachineError, ParseError};
pub use machine::{logger_name, set_log_threshold, Machine};
pub use serialization::{print_config, print_elements};
