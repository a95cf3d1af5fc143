//! Request Routing
//!
//! Maps a request URI onto one of the five report routes or the 404 body.
//! Matching is an exact string comparison against a fixed table, so
//! `/raminfo?x=1` and `/raminfo/` are both unknown.
//!
//! | URI          | Route                  |
//! |--------------|------------------------|
//! | `/raminfo`   | [`Route::RamInfo`]     |
//! | `/sysinfo`   | [`Route::SysInfo`]     |
//! | `/loadavg`   | [`Route::LoadAvg`]     |
//! | `/time`      | [`Route::Time`]        |
//! | `/diskusage` | [`Route::DiskUsage`]   |

pub mod router;

pub use router::{route, Route};
