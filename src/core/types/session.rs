//! Logon session model and active-console-session selection

/// Numeric identifier of a logon session
pub type SessionId = u32;

/// Sentinel returned when no matching session exists
pub const INVALID_SESSION_ID: SessionId = u32::MAX;

/// Connect state of a logon session (WTS_CONNECTSTATE_CLASS)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectState {
    Active,
    Connected,
    ConnectQuery,
    Shadow,
    Disconnected,
    Idle,
    Listen,
    Reset,
    Down,
    Init,
}

impl From<u32> for ConnectState {
    fn from(value: u32) -> Self {
        match value {
            0 => ConnectState::Active,
            1 => ConnectState::Connected,
            2 => ConnectState::ConnectQuery,
            3 => ConnectState::Shadow,
            4 => ConnectState::Disconnected,
            5 => ConnectState::Idle,
            6 => ConnectState::Listen,
            7 => ConnectState::Reset,
            8 => ConnectState::Down,
            _ => ConnectState::Init,
        }
    }
}

/// Client protocol type of a logon session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionProtocol {
    /// Local console session (protocol type 0)
    Console,
    /// Legacy ICA and anything else the OS reports besides console/RDP
    Legacy,
    /// Remote desktop session (protocol type 2)
    Rdp,
}

impl From<u16> for SessionProtocol {
    fn from(value: u16) -> Self {
        match value {
            0 => SessionProtocol::Console,
            2 => SessionProtocol::Rdp,
            _ => SessionProtocol::Legacy,
        }
    }
}

/// One enumerated logon session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: SessionId,
    pub state: ConnectState,
    pub protocol: SessionProtocol,
}

impl SessionInfo {
    pub fn new(id: SessionId, state: ConnectState, protocol: SessionProtocol) -> Self {
        SessionInfo {
            id,
            state,
            protocol,
        }
    }
}

/// Selects the active console session (local console or RDP) from an
/// enumerated session table.
///
/// Returns [`INVALID_SESSION_ID`] when no session is both active and
/// reachable through a console or remote-desktop protocol.
pub fn find_active_console_session(sessions: &[SessionInfo]) -> SessionId {
    sessions
        .iter()
        .find(|session| {
            session.state == ConnectState::Active
                && matches!(
                    session.protocol,
                    SessionProtocol::Console | SessionProtocol::Rdp
                )
        })
        .map(|session| session.id)
        .unwrap_or(INVALID_SESSION_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_state_from_raw() {
        assert_eq!(ConnectState::from(0), ConnectState::Active);
        assert_eq!(ConnectState::from(4), ConnectState::Disconnected);
        assert_eq!(ConnectState::from(5), ConnectState::Idle);
        // Out-of-range values collapse into the initialization state
        assert_eq!(ConnectState::from(99), ConnectState::Init);
    }

    #[test]
    fn test_protocol_from_raw() {
        assert_eq!(SessionProtocol::from(0), SessionProtocol::Console);
        assert_eq!(SessionProtocol::from(2), SessionProtocol::Rdp);
        assert_eq!(SessionProtocol::from(1), SessionProtocol::Legacy);
        assert_eq!(SessionProtocol::from(7), SessionProtocol::Legacy);
    }

    #[test]
    fn test_active_console_session_selected() {
        let sessions = [
            SessionInfo::new(1, ConnectState::Disconnected, SessionProtocol::Rdp),
            SessionInfo::new(2, ConnectState::Active, SessionProtocol::Console),
            SessionInfo::new(3, ConnectState::Active, SessionProtocol::Legacy),
        ];
        assert_eq!(find_active_console_session(&sessions), 2);
    }

    #[test]
    fn test_active_rdp_session_selected() {
        let sessions = [
            SessionInfo::new(0, ConnectState::Disconnected, SessionProtocol::Console),
            SessionInfo::new(4, ConnectState::Active, SessionProtocol::Rdp),
        ];
        assert_eq!(find_active_console_session(&sessions), 4);
    }

    #[test]
    fn test_no_active_session_yields_sentinel() {
        let sessions = [
            SessionInfo::new(1, ConnectState::Disconnected, SessionProtocol::Rdp),
            SessionInfo::new(2, ConnectState::Idle, SessionProtocol::Console),
        ];
        assert_eq!(find_active_console_session(&sessions), INVALID_SESSION_ID);
    }

    #[test]
    fn test_active_legacy_session_is_not_console() {
        let sessions = [SessionInfo::new(3, ConnectState::Active, SessionProtocol::Legacy)];
        assert_eq!(find_active_console_session(&sessions), INVALID_SESSION_ID);
    }

    #[test]
    fn test_empty_table_yields_sentinel() {
        assert_eq!(find_active_console_session(&[]), INVALID_SESSION_ID);
    }
}
