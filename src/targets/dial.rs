use crate::GlobalSettings;

/// Transport options applied to every target connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialOption {
    /// Wait for the connection to be established before reporting the target ready
    Block,
    /// Cap on the size of a single received message, in bytes
    MaxRecvMsgSize(usize),
    /// Connect directly, ignoring proxy settings from the environment
    NoProxy,
}

/// Builds the ordered dial option list from static settings.
///
/// Always starts with [`DialOption::Block`]; the receive size cap is only
/// present for a positive `max_msg_size`, and [`DialOption::NoProxy`] unless
/// `proxy_from_env` is requested.
pub fn build_dial_options(settings: &GlobalSettings) -> Vec<DialOption> {
    let mut opts = vec![DialOption::Block];
    if settings.max_msg_size > 0 {
        opts.push(DialOption::MaxRecvMsgSize(settings.max_msg_size));
    }
    if !settings.proxy_from_env {
        opts.push(DialOption::NoProxy);
    }
    opts
}

/// Dial options folded into the values the endpoint builder consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialSettings {
    pub block: bool,
    /// Handed out with every [`TargetChannel`](super::TargetChannel)
    pub max_recv_msg_size: Option<usize>,
    pub proxy_from_env: bool,
}

impl Default for DialSettings {
    fn default() -> Self {
        Self {
            block: false,
            max_recv_msg_size: None,
            proxy_from_env: true,
        }
    }
}

impl DialSettings {
    pub fn from_options(opts: &[DialOption]) -> Self {
        opts.iter().fold(Self::default(), |mut settings, opt| {
            match *opt {
                DialOption::Block => settings.block = true,
                DialOption::MaxRecvMsgSize(size) => settings.max_recv_msg_size = Some(size),
                DialOption::NoProxy => settings.proxy_from_env = false,
            }
            settings
        })
    }
}

impl From<&GlobalSettings> for DialSettings {
    fn from(settings: &GlobalSettings) -> Self {
        Self::from_options(&build_dial_options(settings))
    }
}
