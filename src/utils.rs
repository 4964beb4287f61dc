use crate::Frame;

use chrono::{DateTime, Utc};

pub fn resp_ok() -> Frame {
    Frame::Simple("OK".to_string())
}

pub fn resp_err(msg: &str) -> Frame {
    Frame::Error(msg.to_string())
}

pub fn resp_syntax_err() -> Frame {
    Frame::Error("ERR syntax error".to_string())
}

pub fn resp_wrong_type_err() -> Frame {
    Frame::Error("WRONGTYPE Operation against a key holding the wrong kind of value".to_string())
}

pub fn resp_invalid_expire_err() -> Frame {
    Frame::Error("ERR invalid expire time".to_string())
}

/// Shared sentinel written when the database layer produced no reply at all.
pub fn resp_unknown() -> Frame {
    Frame::Error("ERR unknown".to_string())
}

pub fn now_timestamp_in_seconds() -> i64 {
    Utc::now().timestamp()
}

pub fn timestamp_from_seconds(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
