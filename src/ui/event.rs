//! 行命令解析
//!
//! `plan München Hamburg Nürnberg,Kassel` 形式：前两个词为起终点，其余拼接后按逗号拆成途经点。
//! 起终点不能含空格；逗号分隔的途经点可以。

use crate::core::Command;
use crate::service::PlanRequest;

fn parse_route(args: &[&str]) -> Result<(String, String, Vec<String>), String> {
    match args {
        [start, end, rest @ ..] => Ok((
            start.to_string(),
            end.to_string(),
            PlanRequest::parse_stops(&rest.join(" ")),
        )),
        _ => Err("usage: plan <start> <end> [stop,stop,...]".to_string()),
    }
}

/// 解析一行输入为 Command
pub fn parse_command(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((head, args)) = words.split_first() else {
        return Err("empty command".to_string());
    };
    match (head.to_lowercase().as_str(), args) {
        ("load", []) => Ok(Command::Load),
        ("recompute", []) => Ok(Command::Recompute),
        ("plan", args) => parse_route(args).map(|(start, end, stops)| Command::Plan { start, end, stops }),
        ("reverse", args) => {
            parse_route(args).map(|(start, end, stops)| Command::Reverse { start, end, stops })
        }
        ("select", [index]) => index
            .parse::<usize>()
            .map(Command::Select)
            .map_err(|_| format!("invalid stage index: {}", index)),
        ("click", [lat, lon]) => match (lat.parse::<f64>(), lon.parse::<f64>()) {
            (Ok(lat), Ok(lon)) => Ok(Command::ClickMap([lat, lon])),
            _ => Err("usage: click <lat> <lon>".to_string()),
        },
        ("clear", []) => Ok(Command::ClearSelection),
        ("save", []) => Ok(Command::Save),
        ("delete", []) => Ok(Command::Delete),
        ("quit" | "exit", []) => Ok(Command::Quit),
        (other, _) => Err(format!("unknown command: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command("load"), Ok(Command::Load));
        assert_eq!(parse_command("  Recompute "), Ok(Command::Recompute));
        assert_eq!(parse_command("select 2"), Ok(Command::Select(2)));
        assert_eq!(parse_command("click 48.13 11.58"), Ok(Command::ClickMap([48.13, 11.58])));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
    }

    #[test]
    fn test_plan_with_stops() {
        assert_eq!(
            parse_command("plan München Hamburg Nürnberg, Bad Hersfeld,,Kassel"),
            Ok(Command::Plan {
                start: "München".into(),
                end: "Hamburg".into(),
                stops: vec!["Nürnberg".into(), "Bad Hersfeld".into(), "Kassel".into()],
            })
        );
        assert_eq!(
            parse_command("reverse München Zürich"),
            Ok(Command::Reverse {
                start: "München".into(),
                end: "Zürich".into(),
                stops: vec![],
            })
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse_command("").is_err());
        assert!(parse_command("plan München").is_err());
        assert!(parse_command("select -1").is_err());
        assert!(parse_command("fly away").is_err());
    }
}
