//! CLI command implementations.
//!
//! | Module   | Commands handled                 |
//! |----------|----------------------------------|
//! | `run`    | `Run`                            |
//! | `config` | `Config` (`show`, `validate`, `init`) |

pub mod config;
pub mod run;

pub use config::cmd_config;
pub use run::cmd_run;
