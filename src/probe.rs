//! One-off oracle queries for the `vlist options` and `vlist lookup` commands.
//!
//! Unlike the walker these surface failures: a non-success status or a
//! malformed body makes the command exit non-zero, which is what you want
//! when checking a single branch by hand.

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::lookup::LinkLookup;
use crate::models::{Level, LevelOption, SelectionPath};
use crate::oracle::HttpOracle;
use crate::resolver::OptionResolver;
use crate::traits::Oracle;

/// Codes given on the command line, shallowest first.
#[derive(Debug, Clone, Default)]
pub struct PathArgs {
    pub state: String,
    pub district: Option<String>,
    pub vdc: Option<String>,
    pub ward: Option<String>,
    pub reg_centre: Option<String>,
}

impl PathArgs {
    /// Build the selection path, rejecting a deeper code given without
    /// the shallower ones.
    pub fn to_path(&self) -> Result<SelectionPath> {
        let codes = [
            self.district.as_deref(),
            self.vdc.as_deref(),
            self.ward.as_deref(),
            self.reg_centre.as_deref(),
        ];
        if let Some(gap) = codes.iter().position(Option::is_none) {
            if let Some(extra) = codes[gap..].iter().position(Option::is_some) {
                bail!(
                    "--{} given without --{}",
                    flag_name(Level::ALL[gap + extra]),
                    flag_name(Level::ALL[gap])
                );
            }
        }
        Ok(SelectionPath::from_codes(&self.state, &codes))
    }
}

fn flag_name(level: Level) -> &'static str {
    match level {
        Level::District => "district",
        Level::Village => "vdc",
        Level::Ward => "ward",
        Level::RegCentre => "reg-centre",
    }
}

pub async fn run_options(config: &Config, level: Level, args: &PathArgs) -> Result<()> {
    let oracle = Arc::new(HttpOracle::new(&config.oracle)?);
    let options = list_options(oracle, level, args).await?;

    println!("{:<12} LABEL", "CODE");
    for option in &options {
        println!("{:<12} {}", option.code, option.label);
    }
    eprintln!("{} {} option(s)", options.len(), level);
    Ok(())
}

/// Resolve `level` under the path in `args`, failing on any oracle error.
pub async fn list_options(
    oracle: Arc<dyn Oracle>,
    level: Level,
    args: &PathArgs,
) -> Result<Vec<LevelOption>> {
    let path = args.to_path()?;
    let resolver = OptionResolver::new(oracle);
    match resolver.try_resolve(level, &path).await {
        Ok(options) => Ok(options),
        Err(e) => bail!("Failed to get {} options for {}: {}", level, path, e),
    }
}

pub async fn run_lookup(config: &Config, args: &PathArgs) -> Result<()> {
    let oracle = Arc::new(HttpOracle::new(&config.oracle)?);
    match find_link(oracle, args).await? {
        Some(link) => println!("{}", link),
        None => println!("Link not found"),
    }
    Ok(())
}

/// Run the voter-list lookup for the complete path in `args`.
pub async fn find_link(oracle: Arc<dyn Oracle>, args: &PathArgs) -> Result<Option<String>> {
    let path = args.to_path()?;
    let lookup = LinkLookup::new(oracle);
    match lookup.try_lookup(&path).await {
        Ok(link) => Ok(link),
        Err(e) => bail!("Failed to get final response for {}: {}", path, e),
    }
}
