use std::fmt;
use std::str::FromStr;

use crate::config::VpnConfig;
use crate::error::CommandError;
use crate::executor::CommandLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VpnVerb {
    Status,
    Start,
    Restart,
    Stop,
}

impl VpnVerb {
    /// In the order offered as quick replies.
    pub const ALL: [VpnVerb; 4] = [
        VpnVerb::Status,
        VpnVerb::Start,
        VpnVerb::Restart,
        VpnVerb::Stop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VpnVerb::Status => "status",
            VpnVerb::Start => "start",
            VpnVerb::Restart => "restart",
            VpnVerb::Stop => "stop",
        }
    }
}

impl fmt::Display for VpnVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VpnVerb {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VpnVerb::ALL
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| CommandError::IncorrectVerb(s.to_string()))
    }
}

/// Command lines for the tunnel service (`ipsec <verb>`).
#[derive(Debug, Clone)]
pub struct VpnControl {
    program: String,
}

impl VpnControl {
    pub fn new(config: &VpnConfig) -> Self {
        Self {
            program: config.program.clone(),
        }
    }

    /// Rejects anything outside [`VpnVerb::ALL`] even if a caller skipped
    /// validation.
    pub fn command(&self, verb: &str) -> Result<CommandLine, CommandError> {
        let verb: VpnVerb = verb.parse()?;
        Ok(CommandLine::new(&self.program).arg(verb.as_str()))
    }
}
