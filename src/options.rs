// Copyright 2017 The Australian National University
// 
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// 
//     http://www.apache.org/licenses/LICENSE-2.0
// 
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use docopt::Docopt;

use std;
use std::default::Default;

const USAGE: &'static str = "
tiger backend (register allocation for x86-64). Pass arguments as a string to init it.

Usage:
  init_backend [options]

Logging:
  --log-level=<level>                   logging level: none, error, warn, info, debug, trace, env [default: env]

Register allocation:
  --disable-coalescing                  do not coalesce move-related temporaries
  --disable-regalloc-validate           disable register allocation validation
  --regalloc-max-rounds=<n>             bound on color/spill rounds, 0 derives it from the function [default: 0]
";

#[derive(Debug, Clone, Deserialize)]
pub struct BackendOptions {
    // logging
    pub flag_log_level: LogLevel,

    // register allocation
    pub flag_disable_coalescing: bool,
    pub flag_disable_regalloc_validate: bool,
    pub flag_regalloc_max_rounds: usize
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub enum LogLevel {
    None, Error, Warn, Info, Debug, Trace, Env
}

impl LogLevel {
    pub fn from_string(s: String) -> LogLevel {
        match s.to_lowercase().as_str() {
            "none"  => LogLevel::None,
            "error" => LogLevel::Error,
            "warn"  => LogLevel::Warn,
            "info"  => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            "env"   => LogLevel::Env,
            _ => panic!("Unrecognised log level {}", s),
        }
    }
}

impl BackendOptions {
    /// parses a whitespace separated option string, e.g. "--log-level=debug --disable-coalescing".
    /// Malformed options print the usage and exit the process
    pub fn init(str: &str) -> BackendOptions {
        info!("init backend options with: {:?}", str);

        let args = std::iter::once("init_backend").chain(str.split_whitespace());

        let ret : BackendOptions = Docopt::new(USAGE)
            .and_then(|d| d.argv(args).deserialize())
            .unwrap_or_else(|e| e.exit());

        info!("parsed as {:?}", ret);

        ret
    }
}

impl Default for BackendOptions {
    fn default() -> BackendOptions {
        BackendOptions::init("")
    }
}

/// the environment variable consulted when the log level is `env`
pub const LOG_LEVEL_ENV: &'static str = "TIGER_LOG_LEVEL";

pub fn start_logging(level: LogLevel) {
    use std::env;
    match level {
        LogLevel::None  => {},
        LogLevel::Error => start_logging_internal(0),
        LogLevel::Warn  => start_logging_internal(1),
        LogLevel::Info  => start_logging_internal(2),
        LogLevel::Debug => start_logging_internal(3),
        LogLevel::Trace => start_logging_internal(4),
        LogLevel::Env => {
            match env::var(LOG_LEVEL_ENV) {
                Ok(ref s) if s.to_lowercase() != "env" => start_logging(LogLevel::from_string(s.clone())),
                _ => {} // Don't log
            }
        }
    }
}

pub fn start_logging_trace() {
    start_logging(LogLevel::Trace)
}

pub fn start_logging_env() {
    start_logging(LogLevel::Env)
}

fn start_logging_internal(verbose: usize) {
    use stderrlog;

    match stderrlog::new().verbosity(verbose).init() {
        Ok(()) => info!("logger initialized"),
        Err(e) => error!("failed to init logger, probably already initialized: {:?}", e)
    }
}
