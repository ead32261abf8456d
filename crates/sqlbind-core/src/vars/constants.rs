use super::*;

pub(super) const AUTOCOMMIT: VarDef = VarDef {
    name: "autocommit",
    scope: SystemVariableScope::Both,
    dynamic: true,
    default: StaticValue::Boolean(true),
};

pub(super) const AUTO_INCREMENT_INCREMENT: VarDef = VarDef {
    name: "auto_increment_increment",
    scope: SystemVariableScope::Both,
    dynamic: true,
    default: StaticValue::Int64(1),
};

pub(super) const SQL_SELECT_LIMIT: VarDef = VarDef {
    name: "sql_select_limit",
    scope: SystemVariableScope::Both,
    dynamic: true,
    default: StaticValue::UInt64(u64::MAX),
};

pub(super) const MAX_ALLOWED_PACKET: VarDef = VarDef {
    name: "max_allowed_packet",
    scope: SystemVariableScope::Both,
    dynamic: true,
    default: StaticValue::Int64(67_108_864),
};

pub(super) const SQL_MODE: VarDef = VarDef {
    name: "sql_mode",
    scope: SystemVariableScope::Both,
    dynamic: true,
    default: StaticValue::Text(
        "ONLY_FULL_GROUP_BY,STRICT_TRANS_TABLES,NO_ENGINE_SUBSTITUTION",
    ),
};

pub(super) const TIME_ZONE: VarDef = VarDef {
    name: "time_zone",
    scope: SystemVariableScope::Both,
    dynamic: true,
    default: StaticValue::Text("SYSTEM"),
};

pub(super) const CHARACTER_SET_CLIENT: VarDef = VarDef {
    name: "character_set_client",
    scope: SystemVariableScope::Both,
    dynamic: true,
    default: StaticValue::Text("utf8mb4"),
};

pub(super) const COLLATION_CONNECTION: VarDef = VarDef {
    name: "collation_connection",
    scope: SystemVariableScope::Both,
    dynamic: true,
    default: StaticValue::Text("utf8mb4_0900_bin"),
};

// Session reads of these two are derived from the current database.
pub(super) const CHARACTER_SET_DATABASE: VarDef = VarDef {
    name: "character_set_database",
    scope: SystemVariableScope::Both,
    dynamic: true,
    default: StaticValue::Text("utf8mb4"),
};

pub(super) const COLLATION_DATABASE: VarDef = VarDef {
    name: "collation_database",
    scope: SystemVariableScope::Both,
    dynamic: true,
    default: StaticValue::Text("utf8mb4_0900_bin"),
};

pub(super) const VERSION: VarDef = VarDef {
    name: "version",
    scope: SystemVariableScope::Global,
    dynamic: false,
    default: StaticValue::Text(concat!("8.0.31-sqlbind-", env!("CARGO_PKG_VERSION"))),
};

pub(super) const MAX_CONNECTIONS: VarDef = VarDef {
    name: "max_connections",
    scope: SystemVariableScope::Global,
    dynamic: true,
    default: StaticValue::Int64(151),
};

pub(super) const WAIT_TIMEOUT: VarDef = VarDef {
    name: "wait_timeout",
    scope: SystemVariableScope::Both,
    dynamic: true,
    default: StaticValue::Int64(28_800),
};

pub(super) const TRANSACTION_ISOLATION: VarDef = VarDef {
    name: "transaction_isolation",
    scope: SystemVariableScope::Both,
    dynamic: true,
    default: StaticValue::Text("REPEATABLE-READ"),
};

pub(super) const LAST_INSERT_ID: VarDef = VarDef {
    name: "last_insert_id",
    scope: SystemVariableScope::Session,
    dynamic: true,
    default: StaticValue::Int64(0),
};

pub(super) const BUILTIN_VARIABLES: &[VarDef] = &[
    AUTOCOMMIT,
    AUTO_INCREMENT_INCREMENT,
    SQL_SELECT_LIMIT,
    MAX_ALLOWED_PACKET,
    SQL_MODE,
    TIME_ZONE,
    CHARACTER_SET_CLIENT,
    COLLATION_CONNECTION,
    CHARACTER_SET_DATABASE,
    COLLATION_DATABASE,
    VERSION,
    MAX_CONNECTIONS,
    WAIT_TIMEOUT,
    TRANSACTION_ISOLATION,
    LAST_INSERT_ID,
];
