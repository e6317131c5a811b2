//! Command keywords, the registry resolving them, and per-command argument
//! validation.
//!
//! Planning is pure: the same keyword, arguments and configuration always
//! produce the same [`Action`]. Running the resulting command line is left to
//! the router.

use std::collections::HashMap;
use std::path::{Component, Path};

use crate::error::CommandError;
use crate::executor::CommandLine;
use crate::reply::Reply;
use crate::services::{TorrentAction, TorrentControl, VpnControl, VpnVerb};

pub const UNKNOWN_COMMAND: &str = "Unknown command";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Add,
    Remove,
    Start,
    Stop,
    List,
    SpeedLimit,
    Vpn,
    Unknown,
}

impl Command {
    /// Every recognised command with its keyword.
    pub const KEYWORDS: [(&'static str, Command); 7] = [
        ("/add", Command::Add),
        ("/remove", Command::Remove),
        ("/start", Command::Start),
        ("/stop", Command::Stop),
        ("/list", Command::List),
        ("/speed_limit", Command::SpeedLimit),
        ("/vpn", Command::Vpn),
    ];
}

/// What a validated command asks the router to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Execute(CommandLine),
    Reply(Reply),
}

/// Builders the handlers delegate to.
#[derive(Debug, Clone)]
pub struct Services {
    pub torrent: TorrentControl,
    pub vpn: VpnControl,
}

/// Keyword to command lookup, built once at startup.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Command>,
    /// Our own username; `/cmd@<name>` only resolves when `<name>` is us.
    bot_username: Option<String>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CommandRegistry {
    pub fn new(bot_username: Option<String>) -> Self {
        Self {
            commands: Command::KEYWORDS.into_iter().collect(),
            bot_username,
        }
    }

    /// Resolves a keyword. Commands addressed to another bot are unknown.
    pub fn resolve(&self, keyword: &str) -> Command {
        let keyword = match keyword.split_once('@') {
            None => keyword,
            Some((command, target)) => match &self.bot_username {
                Some(own) if own.eq_ignore_ascii_case(target) => command,
                _ => return Command::Unknown,
            },
        };
        self.commands
            .get(keyword)
            .copied()
            .unwrap_or(Command::Unknown)
    }
}

impl Command {
    pub fn plan(self, args: &[&str], services: &Services) -> Result<Action, CommandError> {
        match self {
            Command::Add => plan_add(args, &services.torrent),
            Command::Start => plan_manage(args, "/start", TorrentAction::Start, &services.torrent),
            Command::Stop => plan_manage(args, "/stop", TorrentAction::Stop, &services.torrent),
            Command::Remove => {
                plan_manage(args, "/remove", TorrentAction::Remove, &services.torrent)
            }
            Command::List => Ok(Action::Execute(services.torrent.list())),
            Command::SpeedLimit => plan_speed_limit(args, &services.torrent),
            Command::Vpn => plan_vpn(args, &services.vpn),
            Command::Unknown => Ok(Action::Reply(Reply::plain(UNKNOWN_COMMAND))),
        }
    }
}

fn plan_add(args: &[&str], torrent: &TorrentControl) -> Result<Action, CommandError> {
    let cmd = match args {
        [magnet] => torrent.add(magnet, torrent.default_folder()),
        [_, folder] if !is_relative_folder(folder) => {
            return Err(CommandError::usage(
                "Folder must be a name inside the download path, use: /add <magnet> [folder]",
            ))
        }
        [magnet, folder] => torrent.add(magnet, folder),
        _ => {
            return Err(CommandError::usage(
                "Incorrect number of arguments, use: /add <magnet> [folder]",
            ))
        }
    };
    Ok(Action::Execute(cmd))
}

/// A relative path made of plain names only: no root, no `..`, no `.`.
fn is_relative_folder(folder: &str) -> bool {
    !folder.is_empty()
        && Path::new(folder)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn plan_manage(
    args: &[&str],
    keyword: &str,
    action: TorrentAction,
    torrent: &TorrentControl,
) -> Result<Action, CommandError> {
    let torrents = match args {
        [] => "all",
        [torrents] => *torrents,
        _ => {
            return Err(CommandError::usage(format!(
                "Incorrect number of arguments, use: {} [torrents]",
                keyword
            )))
        }
    };
    Ok(Action::Execute(torrent.manage(action, torrents)))
}

const SPEED_LIMIT_OPTIONS: [&str; 2] = ["/speed_limit on", "/speed_limit off"];

fn plan_speed_limit(args: &[&str], torrent: &TorrentControl) -> Result<Action, CommandError> {
    let enabled = match args {
        ["on"] => true,
        ["off"] => false,
        [_] => {
            return Err(CommandError::usage_with(
                "Wrong argument, use: /speed_limit <on|off>",
                SPEED_LIMIT_OPTIONS,
            ))
        }
        _ => {
            return Err(CommandError::usage_with(
                "Incorrect number of arguments, use: /speed_limit <on|off>",
                SPEED_LIMIT_OPTIONS,
            ))
        }
    };
    Ok(Action::Execute(torrent.speed_limit(enabled)))
}

fn plan_vpn(args: &[&str], vpn: &VpnControl) -> Result<Action, CommandError> {
    match args {
        [verb] if verb.parse::<VpnVerb>().is_ok() => Ok(Action::Execute(vpn.command(verb)?)),
        _ => Err(CommandError::usage_with(
            "Incorrect number of arguments, use: /vpn <status|start|restart|stop>",
            VpnVerb::ALL.map(|verb| format!("/vpn {}", verb)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::{TransmissionConfig, VpnConfig};

    fn services() -> Services {
        let transmission = TransmissionConfig {
            program: "transmission-remote".to_string(),
            host: None,
            username: "osmc".to_string(),
            password: "secret".to_string(),
            download_path: PathBuf::from("/media/downloads"),
            default_folder: "Incoming".to_string(),
        };
        Services {
            torrent: TorrentControl::new(&transmission),
            vpn: VpnControl::new(&VpnConfig::default()),
        }
    }

    fn executed(action: Action) -> CommandLine {
        match action {
            Action::Execute(cmd) => cmd,
            Action::Reply(reply) => panic!("expected a command line, got {:?}", reply),
        }
    }

    fn usage_reply(result: Result<Action, CommandError>) -> Reply {
        match result {
            Err(err @ CommandError::Usage { .. }) => err.into_reply(),
            other => panic!("expected a usage error, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_resolves_keywords() {
        let registry = CommandRegistry::new(Some("seedbox_bot".to_string()));
        for (keyword, command) in Command::KEYWORDS {
            assert_eq!(registry.resolve(keyword), command);
        }
        assert_eq!(registry.resolve("/speed_limit@seedbox_bot"), Command::SpeedLimit);
        assert_eq!(registry.resolve("/list@SeedBox_Bot"), Command::List);
        assert_eq!(registry.resolve("/delete"), Command::Unknown);
        assert_eq!(registry.resolve("add"), Command::Unknown);
    }

    #[test]
    fn test_registry_ignores_commands_for_other_bots() {
        let registry = CommandRegistry::new(Some("seedbox_bot".to_string()));
        assert_eq!(registry.resolve("/add@otherbot"), Command::Unknown);
        assert_eq!(registry.resolve("/start@other_bot"), Command::Unknown);
        assert_eq!(registry.resolve("/start@"), Command::Unknown);

        let anonymous = CommandRegistry::default();
        assert_eq!(anonymous.resolve("/start@seedbox_bot"), Command::Unknown);
        assert_eq!(anonymous.resolve("/start"), Command::Start);
    }

    #[test]
    fn test_unknown_command_reply() {
        let action = Command::Unknown.plan(&["x"], &services()).unwrap();
        assert_eq!(action, Action::Reply(Reply::plain("Unknown command")));
    }

    #[test]
    fn test_add_arity() {
        let services = services();
        let none = usage_reply(Command::Add.plan(&[], &services));
        assert!(none.text().contains("/add"));
        assert!(none.options().is_empty());

        let three = usage_reply(Command::Add.plan(&["m", "f", "x"], &services));
        assert_eq!(three, none);
    }

    #[test]
    fn test_add_uses_default_folder() {
        let services = services();
        let cmd = executed(Command::Add.plan(&["magnet1"], &services).unwrap());
        assert_eq!(cmd, services.torrent.add("magnet1", "Incoming"));
        assert!(!cmd.args.iter().any(|a| a == "--download-dir"));
    }

    #[test]
    fn test_add_with_folder() {
        let cmd = executed(Command::Add.plan(&["magnet1", "folder2"], &services()).unwrap());
        let pos = cmd.args.iter().position(|a| a == "--download-dir").unwrap();
        assert_eq!(cmd.args[pos + 1], "/media/downloads/folder2");
    }

    #[test]
    fn test_add_rejects_folders_outside_download_path() {
        let services = services();
        for folder in ["/etc", "../../root", "Movies/../../etc", "./", "."] {
            let reply = usage_reply(Command::Add.plan(&["magnet1", folder], &services));
            assert!(reply.text().contains("/add"), "folder {:?}", folder);
        }

        let cmd = executed(Command::Add.plan(&["magnet1", "Series/2024"], &services).unwrap());
        assert_eq!(
            cmd.args.last().map(String::as_str),
            Some("/media/downloads/Series/2024")
        );
    }

    #[test]
    fn test_manage_defaults_to_all() {
        let services = services();
        for (command, flag) in [
            (Command::Start, "--start"),
            (Command::Stop, "--stop"),
            (Command::Remove, "--remove"),
        ] {
            let cmd = executed(command.plan(&[], &services).unwrap());
            assert_eq!(cmd.args[2..], ["-t", "all", flag]);

            let cmd = executed(command.plan(&["4"], &services).unwrap());
            assert_eq!(cmd.args[2..], ["-t", "4", flag]);
        }
    }

    #[test]
    fn test_manage_too_many_arguments() {
        let reply = usage_reply(Command::Remove.plan(&["1", "2"], &services()));
        assert_eq!(
            reply,
            Reply::plain("Incorrect number of arguments, use: /remove [torrents]")
        );
    }

    #[test]
    fn test_list_ignores_arguments() {
        let services = services();
        let plain = Command::List.plan(&[], &services).unwrap();
        let noisy = Command::List.plan(&["foo", "bar"], &services).unwrap();
        assert_eq!(plain, noisy);
        assert_eq!(executed(plain).args.last().map(String::as_str), Some("--list"));
    }

    #[test]
    fn test_speed_limit_valid() {
        let services = services();
        let on = executed(Command::SpeedLimit.plan(&["on"], &services).unwrap());
        let off = executed(Command::SpeedLimit.plan(&["off"], &services).unwrap());
        assert_eq!(on.args.last().map(String::as_str), Some("-as"));
        assert_eq!(off.args.last().map(String::as_str), Some("-AS"));
    }

    #[test]
    fn test_speed_limit_suggests_options() {
        let services = services();
        for args in [&[][..], &["maybe"][..], &["on", "off"][..]] {
            let reply = usage_reply(Command::SpeedLimit.plan(args, &services));
            assert_eq!(reply.options(), ["/speed_limit on", "/speed_limit off"]);
        }
    }

    #[test]
    fn test_vpn_valid_verb() {
        let cmd = executed(Command::Vpn.plan(&["status"], &services()).unwrap());
        assert_eq!(cmd.program, "ipsec");
        assert_eq!(cmd.args, vec!["status"]);
    }

    #[test]
    fn test_vpn_suggests_verbs() {
        let services = services();
        for args in [&[][..], &["teleport"][..], &["start", "now"][..]] {
            let reply = usage_reply(Command::Vpn.plan(args, &services));
            assert_eq!(
                reply.options(),
                ["/vpn status", "/vpn start", "/vpn restart", "/vpn stop"]
            );
        }
    }

    #[test]
    fn test_planning_is_deterministic() {
        let services = services();
        let args = ["magnet:?xt=urn:btih:abc", "Series"];
        assert_eq!(
            Command::Add.plan(&args, &services).unwrap(),
            Command::Add.plan(&args, &services).unwrap()
        );
    }
}
