use std::path::Path;

use crate::EtlResult;
use crate::config::Config;
use crate::envelope::{SuccessEnvelope, success};
use crate::pipeline::{self, RunOptions};
use crate::runlog::RunLog;

#[derive(Debug, Clone, Default)]
pub struct EtlRunOptions<'a> {
    pub config: Option<Config>,
    pub base_dir_override: Option<&'a Path>,
    pub page_override: Option<String>,
    pub quiet: bool,
}

pub fn run(config: Option<Config>) -> EtlResult<SuccessEnvelope> {
    run_with_options(EtlRunOptions {
        config,
        base_dir_override: None,
        page_override: None,
        quiet: false,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: EtlRunOptions<'_>) -> EtlResult<SuccessEnvelope> {
    let config = match (options.config, options.base_dir_override) {
        (Some(config), _) => config,
        (None, Some(base_dir)) => Config::with_base_dir(base_dir),
        (None, None) => Config::default(),
    };

    let log = if options.quiet {
        RunLog::silent(&config.log_path)
    } else {
        RunLog::new(&config.log_path)
    };

    let report = pipeline::run_with_options(
        &config,
        &log,
        RunOptions {
            page_override: options.page_override,
        },
    )?;

    success("run", report)
}
