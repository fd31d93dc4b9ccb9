//! Return code definitions
//!
//! Every reply carries a three-digit return code. Codes are grouped by
//! their first digit:
//! - 2xx: positive replies (command completed)
//! - 3xx: positive replies that carry no data / negative lookups
//! - 4xx, 5xx: client-side errors
//! - 6xx: server errors (601 and 602 are transient availability codes)
//!
//! Three extra codes never appear on the wire. They are produced locally
//! when a request resolves without a reply.

/// Inclusive bounds of the server-error band
pub const SERVER_ERROR_BAND: std::ops::RangeInclusive<u16> = 600..=699;

/// Reply classification code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ReturnCode {
    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------
    LoginAccepted = 200,
    LoginAcceptedNewVersion = 201,
    LoggedOut = 203,
    Resource = 205,
    Stats = 206,
    Top = 207,
    Uptime = 208,
    EncryptionEnabled = 209,

    // -------------------------------------------------------------------------
    // Data replies
    // -------------------------------------------------------------------------
    MylistEntryAdded = 210,
    MylistEntryDeleted = 211,
    AddedFile = 212,
    AddedStream = 213,
    EncodingChanged = 219,
    File = 220,
    Mylist = 221,
    MylistStats = 222,
    Anime = 230,
    AnimeBestMatch = 231,
    RandomAnime = 232,
    AnimeDescription = 233,
    Character = 235,
    Episode = 240,
    Group = 250,
    BuddyList = 253,
    Voted = 260,
    VoteFound = 261,
    VoteUpdated = 262,
    VoteRevoked = 263,
    NotificationEnabled = 270,
    NotifyList = 291,
    UserId = 297,
    Calendar = 298,

    // -------------------------------------------------------------------------
    // Keep-alive / empty results
    // -------------------------------------------------------------------------
    Pong = 300,
    AuthPong = 301,
    NoSuchResource = 305,
    ApiPasswordNotDefined = 309,
    FileAlreadyInMylist = 310,
    MylistEntryEdited = 311,
    MultipleMylistEntries = 312,
    NoSuchFile = 320,
    NoSuchEntry = 321,
    MultipleFilesFound = 322,
    NoSuchAnime = 330,
    NoSuchEpisode = 340,
    NoSuchGroup = 350,
    NoSuchVote = 360,
    NotificationDisabled = 370,
    NoSuchUser = 394,
    NoChanges = 399,

    // -------------------------------------------------------------------------
    // Client errors
    // -------------------------------------------------------------------------
    NotLoggedIn = 403,
    NoSuchMylistFile = 410,
    NoSuchMylistEntry = 411,
    LoginFailed = 500,
    LoginFirst = 501,
    AccessDenied = 502,
    ClientVersionOutdated = 503,
    ClientBanned = 504,
    IllegalInputOrAccessDenied = 505,
    InvalidSession = 506,
    NoSuchEncryptionType = 509,
    EncodingNotSupported = 519,
    Banned = 555,
    UnknownCommand = 598,

    // -------------------------------------------------------------------------
    // Server errors
    // -------------------------------------------------------------------------
    InternalServerError = 600,
    OutOfService = 601,
    ServerBusy = 602,
    NoData = 603,
    Timeout = 604,
    ApiViolation = 666,

    // -------------------------------------------------------------------------
    // Local (never on the wire)
    // -------------------------------------------------------------------------
    RequestTimedOut = 901,
    ConnectionClosed = 902,
    RequestDeclined = 903,
}

impl ReturnCode {
    /// Map a wire code to a return code
    ///
    /// Unnamed codes inside the server-error band fold into
    /// `InternalServerError`. Local codes are never produced here.
    pub fn from_code(code: u16) -> Option<Self> {
        use ReturnCode::*;
        let rc = match code {
            200 => LoginAccepted,
            201 => LoginAcceptedNewVersion,
            203 => LoggedOut,
            205 => Resource,
            206 => Stats,
            207 => Top,
            208 => Uptime,
            209 => EncryptionEnabled,
            210 => MylistEntryAdded,
            211 => MylistEntryDeleted,
            212 => AddedFile,
            213 => AddedStream,
            219 => EncodingChanged,
            220 => File,
            221 => Mylist,
            222 => MylistStats,
            230 => Anime,
            231 => AnimeBestMatch,
            232 => RandomAnime,
            233 => AnimeDescription,
            235 => Character,
            240 => Episode,
            250 => Group,
            253 => BuddyList,
            260 => Voted,
            261 => VoteFound,
            262 => VoteUpdated,
            263 => VoteRevoked,
            270 => NotificationEnabled,
            291 => NotifyList,
            297 => UserId,
            298 => Calendar,
            300 => Pong,
            301 => AuthPong,
            305 => NoSuchResource,
            309 => ApiPasswordNotDefined,
            310 => FileAlreadyInMylist,
            311 => MylistEntryEdited,
            312 => MultipleMylistEntries,
            320 => NoSuchFile,
            321 => NoSuchEntry,
            322 => MultipleFilesFound,
            330 => NoSuchAnime,
            340 => NoSuchEpisode,
            350 => NoSuchGroup,
            360 => NoSuchVote,
            370 => NotificationDisabled,
            394 => NoSuchUser,
            399 => NoChanges,
            403 => NotLoggedIn,
            410 => NoSuchMylistFile,
            411 => NoSuchMylistEntry,
            500 => LoginFailed,
            501 => LoginFirst,
            502 => AccessDenied,
            503 => ClientVersionOutdated,
            504 => ClientBanned,
            505 => IllegalInputOrAccessDenied,
            506 => InvalidSession,
            509 => NoSuchEncryptionType,
            519 => EncodingNotSupported,
            555 => Banned,
            598 => UnknownCommand,
            601 => OutOfService,
            602 => ServerBusy,
            603 => NoData,
            604 => Timeout,
            666 => ApiViolation,
            c if SERVER_ERROR_BAND.contains(&c) => InternalServerError,
            _ => return None,
        };
        Some(rc)
    }

    /// Numeric value of this code
    pub fn code(self) -> u16 {
        self as u16
    }

    /// True if this code never comes from the server
    pub fn is_local(self) -> bool {
        matches!(
            self,
            ReturnCode::RequestTimedOut | ReturnCode::ConnectionClosed | ReturnCode::RequestDeclined
        )
    }

    /// Codes that always resolve to a generic result, whatever the request
    /// declared: busy, out of service and the whole reportable error band
    pub fn forces_generic(self) -> bool {
        matches!(self, ReturnCode::ServerBusy | ReturnCode::OutOfService)
            || is_reportable_server_error(self.code())
    }

    /// Replies that mean the server no longer holds our session
    pub fn ends_session(self) -> bool {
        matches!(
            self,
            ReturnCode::LoggedOut
                | ReturnCode::NotLoggedIn
                | ReturnCode::LoginFirst
                | ReturnCode::InvalidSession
        )
    }
}

/// True if `code` belongs to the server-error band and should be reported
///
/// 601 (out of service) and 602 (busy) are availability signals handled as
/// ordinary results.
pub fn is_reportable_server_error(code: u16) -> bool {
    SERVER_ERROR_BAND.contains(&code) && code != 601 && code != 602
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?})", self.code(), self)
    }
}

