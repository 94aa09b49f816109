mod cli;
mod config;
mod desktop_entry;
mod install;
mod layout;
mod list;
mod logger;
mod pattern;
mod privileges;
mod prompt;
mod uninstall;

#[cfg(test)]
mod testing;

use clap::Parser;
use std::fmt::Display;
use std::io;
use std::process::ExitCode;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::layout::InstallLayout;
use crate::privileges::SudoExecutor;
use crate::prompt::{AssumeYes, Confirm, TerminalConfirm};

fn main() -> ExitCode {
    let command = match Cli::parse().into_command() {
        Ok(command) => command,
        Err(err) => return fail(err),
    };

    if let Command::Help = command {
        if let Err(err) = Cli::print_help() {
            return fail(err);
        }
        return ExitCode::SUCCESS;
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => return fail(err),
    };

    if let Err(err) = logger::init_logger(&config) {
        eprintln!("⚠️ {}", err);
    }

    let layout = match InstallLayout::from_config(&config) {
        Ok(layout) => layout,
        Err(err) => return fail(err),
    };

    let executor = SudoExecutor::from_config(&config);
    let mut stdout = io::stdout().lock();

    match command {
        Command::Help => ExitCode::SUCCESS,
        Command::Install(request) => report(install::run_install(
            &layout,
            &executor,
            &config.commands,
            &request,
            &mut stdout,
        )),
        Command::List(options) => report(list::run_list(&layout, options, &mut stdout)),
        Command::Uninstall {
            request,
            assume_yes,
        } => {
            let terminal = TerminalConfirm::new();
            let confirm: &dyn Confirm = if assume_yes { &AssumeYes } else { &terminal };
            report(uninstall::run_uninstall(
                &layout,
                &executor,
                &config.commands,
                confirm,
                &request,
                &mut stdout,
            ))
        }
    }
}

fn report<T, E: Display>(result: Result<T, E>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => fail(err),
    }
}

fn fail(err: impl Display) -> ExitCode {
    eprintln!("❌ {}", err);
    ExitCode::FAILURE
}
