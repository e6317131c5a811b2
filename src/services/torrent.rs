use std::path::PathBuf;

use crate::config::TransmissionConfig;
use crate::executor::CommandLine;

/// Management operations applied to a torrent selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorrentAction {
    Start,
    Stop,
    Remove,
}

impl TorrentAction {
    pub fn flag(self) -> &'static str {
        match self {
            TorrentAction::Start => "--start",
            TorrentAction::Stop => "--stop",
            TorrentAction::Remove => "--remove",
        }
    }
}

/// Command lines for `transmission-remote`.
#[derive(Debug, Clone)]
pub struct TorrentControl {
    program: String,
    host: Option<String>,
    credentials: Option<String>,
    download_path: PathBuf,
    default_folder: String,
}

impl TorrentControl {
    pub fn new(config: &TransmissionConfig) -> Self {
        let credentials = if config.username.is_empty() {
            None
        } else {
            Some(format!("{}:{}", config.username, config.password))
        };

        Self {
            program: config.program.clone(),
            host: config.host.clone(),
            credentials,
            download_path: config.download_path.clone(),
            default_folder: config.default_folder.clone(),
        }
    }

    pub fn default_folder(&self) -> &str {
        &self.default_folder
    }

    /// Connection prefix shared by every invocation.
    fn base(&self) -> CommandLine {
        let mut cmd = CommandLine::new(&self.program);
        if let Some(host) = &self.host {
            cmd = cmd.arg(host);
        }
        if let Some(credentials) = &self.credentials {
            cmd = cmd.arg("-n").secret_arg(credentials);
        }
        cmd
    }

    /// `--add <magnet>`, plus `--download-dir` when `folder` is not the default.
    pub fn add(&self, magnet: &str, folder: &str) -> CommandLine {
        let cmd = self.base().arg("--add").arg(magnet);
        if folder == self.default_folder {
            return cmd;
        }
        let download_dir = self.download_path.join(folder);
        cmd.arg("--download-dir")
            .arg(download_dir.to_string_lossy())
    }

    pub fn manage(&self, action: TorrentAction, torrents: &str) -> CommandLine {
        self.base().arg("-t").arg(torrents).arg(action.flag())
    }

    pub fn list(&self) -> CommandLine {
        self.base().arg("--list")
    }

    /// `-as` turns the alternative speed limits on, `-AS` turns them off.
    pub fn speed_limit(&self, enabled: bool) -> CommandLine {
        self.base().arg(if enabled { "-as" } else { "-AS" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TransmissionConfig {
        TransmissionConfig {
            program: "transmission-remote".to_string(),
            host: None,
            username: "osmc".to_string(),
            password: "secret".to_string(),
            download_path: PathBuf::from("/media/downloads"),
            default_folder: "Incoming".to_string(),
        }
    }

    #[test]
    fn test_add_default_folder() {
        let control = TorrentControl::new(&config());
        let cmd = control.add("magnet:?xt=urn:btih:abc", "Incoming");
        assert_eq!(cmd.program, "transmission-remote");
        assert_eq!(
            cmd.args,
            vec!["-n", "osmc:secret", "--add", "magnet:?xt=urn:btih:abc"]
        );
    }

    #[test]
    fn test_add_custom_folder() {
        let control = TorrentControl::new(&config());
        let cmd = control.add("magnet1", "Movies");
        assert_eq!(
            cmd.args,
            vec![
                "-n",
                "osmc:secret",
                "--add",
                "magnet1",
                "--download-dir",
                "/media/downloads/Movies"
            ]
        );
    }

    #[test]
    fn test_magnet_with_shell_characters_stays_one_argument() {
        let control = TorrentControl::new(&config());
        let magnet = "magnet:?xt=urn:btih:abc&dn=it's; rm -rf ~";
        let cmd = control.add(magnet, "Incoming");
        assert_eq!(cmd.args.last().map(String::as_str), Some(magnet));
    }

    #[test]
    fn test_manage_joins_selector_and_flag() {
        let control = TorrentControl::new(&config());
        let cmd = control.manage(TorrentAction::Remove, "3,5");
        assert_eq!(cmd.args, vec!["-n", "osmc:secret", "-t", "3,5", "--remove"]);
    }

    #[test]
    fn test_host_and_no_credentials() {
        let mut cfg = config();
        cfg.host = Some("nas:9091".to_string());
        cfg.username = String::new();
        let control = TorrentControl::new(&cfg);
        assert_eq!(control.list().args, vec!["nas:9091", "--list"]);
        assert_eq!(control.speed_limit(true).args, vec!["nas:9091", "-as"]);
        assert_eq!(control.speed_limit(false).args, vec!["nas:9091", "-AS"]);
    }

    #[test]
    fn test_credentials_hidden_in_display() {
        let control = TorrentControl::new(&config());
        assert!(!control.list().to_string().contains("secret"));
    }
}
