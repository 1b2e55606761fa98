// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Aide gateway - tool-calling chat gateway for OpenAI-compatible providers
#[derive(Parser, Debug)]
#[command(name = "aide-gateway")]
#[command(version, about = "Tool-calling chat gateway for OpenAI-compatible providers")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file path (defaults to ~/.aide/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP gateway (default when no command given)
    Serve(ServeArgs),

    /// Print the enabled tool declarations as JSON
    Tools,
}

/// Arguments for the serve subcommand
#[derive(clap::Args, Debug, Default)]
pub struct ServeArgs {
    /// Listen address, overriding server.bind
    #[arg(long)]
    pub bind: Option<String>,

    /// Keep documents in memory instead of the data directory
    #[arg(long)]
    pub ephemeral: bool,
}
