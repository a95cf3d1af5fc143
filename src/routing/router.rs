//! The route table and dispatch.

use crate::http::{RequestLine, Response};
use crate::probes::BodySource;
use std::fmt;

/// One of the known report routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    RamInfo,
    SysInfo,
    LoadAvg,
    Time,
    DiskUsage,
}

impl Route {
    /// Every route, in table order.
    pub const ALL: [Route; 5] = [
        Route::RamInfo,
        Route::SysInfo,
        Route::LoadAvg,
        Route::Time,
        Route::DiskUsage,
    ];

    /// Looks up a URI. Only exact matches count.
    pub fn from_uri(uri: &str) -> Option<Route> {
        Route::ALL.into_iter().find(|r| r.path() == uri)
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::RamInfo => "/raminfo",
            Route::SysInfo => "/sysinfo",
            Route::LoadAvg => "/loadavg",
            Route::Time => "/time",
            Route::DiskUsage => "/diskusage",
        }
    }

    /// Short name used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            Route::RamInfo => "RAM",
            Route::SysInfo => "SYS",
            Route::LoadAvg => "LOADAVG",
            Route::Time => "TIME",
            Route::DiskUsage => "DISKUSAGE",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Builds the response for a parsed request line.
///
/// Known URIs produce a 200 whose body comes from `source`; everything else
/// produces the 404 body echoing the URI. The method is never looked at.
/// `source.fetch` may block, so async callers should run this on the
/// blocking pool.
pub fn route<S>(request: &RequestLine, source: &S) -> Response
where
    S: BodySource + ?Sized,
{
    match Route::from_uri(&request.uri) {
        Some(r) => Response::ok(source.fetch(r)),
        None => Response::not_found(&request.uri),
    }
}
