//! Backend RPC method names and shared constants

/// User agent sent by the HTTP transport
pub const USER_AGENT: &str = concat!("steamlord-taskman/", env!("CARGO_PKG_VERSION"));

/// Fallback message when a response says `success: false` without an error
pub const GENERIC_FAILURE: &str = "Request failed";

/// Method names exposed by the plugin backend
pub mod methods {
    pub const ACTIVE_DOWNLOADS: &str = "GetActiveDownloads";
    pub const IS_RESTART_REQUIRED: &str = "IsRestartRequired";
    pub const SET_RESTART_REQUIRED: &str = "SetRestartRequired";
    pub const RESTART_STEAM: &str = "RestartSteam";

    pub const GAME_FOUND: &str = "SteamLordFound";
    pub const FIX_FOUND: &str = "FixFound";
    pub const BYPASS_FOUND: &str = "BypassFound";

    pub const GAME_INSTALL_PATH: &str = "GetGameInstallPath";
    pub const DELETE_GAME: &str = "SteamLordDelete";

    pub const ADD_GAME: &str = "SteamLordAdd";
    pub const ADD_GAME_STATUS: &str = "SteamLordAddStatus";
    pub const APPLY_FIX: &str = "ApplyGameFix";
    pub const APPLY_FIX_STATUS: &str = "GetApplyFixStatus";
    pub const REMOVE_FIX: &str = "UnFixGame";
    pub const REMOVE_FIX_STATUS: &str = "GetUnfixStatus";
    pub const APPLY_BYPASS: &str = "ApplyBypass";
    pub const APPLY_BYPASS_STATUS: &str = "GetApplyBypassStatus";
    pub const REMOVE_BYPASS: &str = "RemoveBypass";
    pub const REMOVE_BYPASS_STATUS: &str = "GetRemoveBypassStatus";

    pub const SESSION_INFO: &str = "GetSessionInfo";
    pub const VERIFY_LICENSE: &str = "VerifyLicense";
}

/// Values the fix endpoint expects for fields the client does not choose
pub mod fix {
    pub const DOWNLOAD_URL: &str = "ignored";
    pub const FIX_TYPE: &str = "LordFix";
}
