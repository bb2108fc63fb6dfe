//! Common test data and builders

use chrono::{NaiveDate, NaiveDateTime};
use maintainer::config::MapEnv;
use maintainer::constants::env_keys;

/// Local wall-clock instant
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Connection parameters only; no enable flags set
pub fn postgres_env() -> MapEnv {
    MapEnv::new()
        .with(env_keys::POSTGRES_USER, "misskey")
        .with(env_keys::POSTGRES_PASSWORD, "secret")
        .with(env_keys::POSTGRES_DB, "mk1")
        .with(env_keys::POSTGRES_HOST, "db")
        .with(env_keys::POSTGRES_PORT, "5432")
}

/// Connection parameters plus every enable flag set to `True`
pub fn enabled_env() -> MapEnv {
    postgres_env()
        .with(env_keys::PG_REPACK, "True")
        .with(env_keys::PG_PGROONGA_REINDEX, "True")
        .with(env_keys::PG_BACKUP_DAILY, "True")
        .with(env_keys::PG_BACKUP_WEEKLY, "True")
        .with(env_keys::PG_BACKUP_MONTHLY, "True")
        .with(env_keys::MAINTENANCE_REPORT, "True")
        .with(env_keys::MAINTENANCE_ANNOUNCEMENT, "True")
}
