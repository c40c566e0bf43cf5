// Subset of the A-REX accounting schema read by this crate.
// The database is owned by A-REX; these statements only describe the
// columns we depend on and are used to build fixtures.
pub const ACCOUNTING_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS Queues (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS Users (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS WLCGVOs (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS Status (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS Endpoints (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    Interface TEXT NOT NULL,
    URL TEXT NOT NULL,
    UNIQUE(Interface, URL)
);

CREATE TABLE IF NOT EXISTS AAR (
    RecordID INTEGER PRIMARY KEY AUTOINCREMENT,
    JobID TEXT NOT NULL UNIQUE,
    LocalJobID TEXT,
    EndpointID INTEGER NOT NULL,
    QueueID INTEGER NOT NULL,
    UserID INTEGER NOT NULL,
    VOID INTEGER NOT NULL,
    StatusID INTEGER NOT NULL,
    ExitCode INTEGER NOT NULL DEFAULT 0,
    SubmitTime INTEGER NOT NULL,
    EndTime INTEGER NOT NULL,
    NodeCount INTEGER NOT NULL DEFAULT 1,
    CPUCount INTEGER NOT NULL DEFAULT 1,
    UsedMemory INTEGER NOT NULL DEFAULT 0,
    UsedVirtMem INTEGER NOT NULL DEFAULT 0,
    UsedWalltime INTEGER NOT NULL DEFAULT 0,
    UsedCPUUserTime INTEGER NOT NULL DEFAULT 0,
    UsedCPUKernelTime INTEGER NOT NULL DEFAULT 0,
    UsedScratch INTEGER NOT NULL DEFAULT 0,
    StageInVolume INTEGER NOT NULL DEFAULT 0,
    StageOutVolume INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_aar_submittime ON AAR(SubmitTime);
CREATE INDEX IF NOT EXISTS idx_aar_endtime ON AAR(EndTime);
CREATE INDEX IF NOT EXISTS idx_aar_queueid ON AAR(QueueID);
CREATE INDEX IF NOT EXISTS idx_aar_userid ON AAR(UserID);
CREATE INDEX IF NOT EXISTS idx_aar_void ON AAR(VOID);
CREATE INDEX IF NOT EXISTS idx_aar_statusid ON AAR(StatusID);
CREATE INDEX IF NOT EXISTS idx_aar_endpointid ON AAR(EndpointID);
"#;

pub const STATS_QUERY: &str = "SELECT COUNT(RecordID), SUM(UsedWalltime), SUM(UsedCPUUserTime), \
    SUM(UsedCPUKernelTime), SUM(StageInVolume), SUM(StageOutVolume), \
    MIN(SubmitTime), MAX(EndTime) FROM AAR WHERE 1=1";

pub const ENDPOINTS_QUERY: &str = "SELECT ID, Interface, URL FROM Endpoints";
