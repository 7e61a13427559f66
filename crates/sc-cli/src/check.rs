use std::fs;

use sc_core::Command;
use sc_parser::parse_tag_document_with;
use serde::Serialize;
use tracing::info;

use crate::{map_cli_output, map_cli_source_read, map_tag_parse, read_limits, CheckArgs, CliError};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckReport {
    pub(crate) file: String,
    pub(crate) commands: Vec<Command>,
}

pub(crate) fn check_document(args: &CheckArgs) -> Result<CheckReport, CliError> {
    let limits = read_limits(args.limits.as_deref())?;
    let source = fs::read_to_string(&args.file).map_err(map_cli_source_read)?;
    let commands =
        parse_tag_document_with(&source, &limits).map_err(|error| map_tag_parse(&args.file, error))?;
    info!(file = %args.file, commands = commands.len(), "tag document parsed");

    Ok(CheckReport {
        file: args.file.clone(),
        commands,
    })
}

pub(crate) fn render_check_report(report: &CheckReport, json: bool) -> Result<Vec<String>, CliError> {
    let mut lines = vec![
        "RESULT:OK".to_string(),
        format!("COMMANDS:{}", report.commands.len()),
    ];
    if json {
        lines.push(format!(
            "COMMANDS_JSON:{}",
            serde_json::to_string(&report.commands).map_err(map_cli_output)?
        ));
    } else {
        lines.extend(
            report
                .commands
                .iter()
                .map(|command| format!("TAG:{}:{}", command.line, command.tag_name)),
        );
    }
    Ok(lines)
}

pub(crate) fn run_check(args: CheckArgs) -> Result<i32, CliError> {
    let report = check_document(&args)?;
    for line in render_check_report(&report, args.json)? {
        println!("{}", line);
    }
    Ok(0)
}
